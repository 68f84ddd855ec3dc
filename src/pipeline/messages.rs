//! Per-step labels, progress windows and the structured logging helpers used
//! by the step executor, so every step reports retries the same way.

use anyhow::Error;
use std::fmt;
use std::time::Duration;

/// Ordered steps of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionStep {
    FeePayment,
    ImageUpload,
    MetadataUpload,
    MintCreation,
    MetadataAttachment,
    AuthorityRevocation,
}

impl SubmissionStep {
    #[cfg(test)]
    pub const ALL: [SubmissionStep; 6] = [
        SubmissionStep::FeePayment,
        SubmissionStep::ImageUpload,
        SubmissionStep::MetadataUpload,
        SubmissionStep::MintCreation,
        SubmissionStep::MetadataAttachment,
        SubmissionStep::AuthorityRevocation,
    ];

    pub fn messages(self) -> &'static StepMessages {
        match self {
            SubmissionStep::FeePayment => &FEE_PAYMENT,
            SubmissionStep::ImageUpload => &IMAGE_UPLOAD,
            SubmissionStep::MetadataUpload => &METADATA_UPLOAD,
            SubmissionStep::MintCreation => &MINT_CREATION,
            SubmissionStep::MetadataAttachment => &METADATA_ATTACHMENT,
            SubmissionStep::AuthorityRevocation => &AUTHORITY_REVOCATION,
        }
    }

    pub fn name(self) -> &'static str {
        self.messages().name
    }

    /// Progress interval `[start, end]` owned by the step.
    pub fn window(self) -> (u8, u8) {
        let messages = self.messages();
        (messages.progress_start, messages.progress_end)
    }
}

impl fmt::Display for SubmissionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug)]
pub struct StepMessages {
    pub name: &'static str,
    pub started: &'static str,
    pub failure: &'static str,
    pub progress_start: u8,
    pub progress_end: u8,
}

pub const FEE_PAYMENT: StepMessages = StepMessages {
    name: "fee_payment",
    started: "Processing fee payment...",
    failure: "Error processing fee payment",
    progress_start: 0,
    progress_end: 20,
};

pub const IMAGE_UPLOAD: StepMessages = StepMessages {
    name: "image_upload",
    started: "Uploading image...",
    failure: "Error uploading image",
    progress_start: 20,
    progress_end: 40,
};

pub const METADATA_UPLOAD: StepMessages = StepMessages {
    name: "metadata_upload",
    started: "Creating metadata...",
    failure: "Error uploading metadata",
    progress_start: 40,
    progress_end: 60,
};

pub const MINT_CREATION: StepMessages = StepMessages {
    name: "mint_creation",
    started: "Creating mint and token account...",
    failure: "Error creating token",
    progress_start: 60,
    progress_end: 80,
};

pub const METADATA_ATTACHMENT: StepMessages = StepMessages {
    name: "metadata_attachment",
    started: "Creating token metadata...",
    failure: "Error creating token metadata",
    progress_start: 80,
    progress_end: 100,
};

// Runs after the 0-100 scale is complete.
pub const AUTHORITY_REVOCATION: StepMessages = StepMessages {
    name: "authority_revocation",
    started: "Revoking authorities...",
    failure: "Error revoking authorities",
    progress_start: 100,
    progress_end: 100,
};

pub const INITIALIZING: &str = "Initializing upload...";
pub const COMPLETED: &str = "Token created and minted successfully!";

pub fn retrying_message(
    step: SubmissionStep,
    delay: Duration,
    next_attempt: u32,
    max_attempts: u32,
) -> String {
    format!(
        "{} - Retrying in {}s (Attempt {}/{})",
        step.messages().failure,
        format_seconds(delay),
        next_attempt,
        max_attempts
    )
}

pub fn exhausted_message(step: SubmissionStep, attempts: u32) -> String {
    format!("{} ({} failed attempts)", step.messages().failure, attempts)
}

fn format_seconds(delay: Duration) -> String {
    let millis = delay.as_millis();
    if millis % 1_000 == 0 {
        (millis / 1_000).to_string()
    } else {
        format!("{:.1}", delay.as_secs_f64())
    }
}

/// Structured log helpers bound to one step.
#[derive(Clone, Copy)]
pub(crate) struct StepLogContext {
    step: SubmissionStep,
}

impl StepLogContext {
    pub(crate) fn new(step: SubmissionStep) -> Self {
        Self { step }
    }

    pub(crate) fn log_started(&self) {
        tracing::info!(step = self.step.name(), "{}", self.step.messages().started);
    }

    pub(crate) fn log_attempt(&self, attempt: u32) {
        tracing::debug!(step = self.step.name(), attempt, "step attempt started");
    }

    pub(crate) fn log_retry(&self, attempt: u32, backoff: Duration, err: &Error) {
        tracing::warn!(
            step = self.step.name(),
            attempt,
            backoff_ms = duration_to_millis(backoff),
            error = %err,
            "step failed; retrying"
        );
    }

    pub(crate) fn log_exhausted(&self, attempts: u32, err: &Error) {
        tracing::error!(
            step = self.step.name(),
            attempts,
            error = %err,
            "step exhausted retries"
        );
    }

    pub(crate) fn log_completed(&self, attempts: u32) {
        tracing::info!(step = self.step.name(), attempts, "step completed");
    }

    pub(crate) fn step(&self) -> SubmissionStep {
        self.step
    }
}

fn duration_to_millis(duration: Duration) -> u64 {
    duration.as_millis().min(u128::from(u64::MAX)) as u64
}
