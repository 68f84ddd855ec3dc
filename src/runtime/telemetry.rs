use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Installs a basic tracing subscriber (if one is not already active).
///
/// The subscriber honours `RUST_LOG` if it is present, otherwise it falls back to `info`.
/// Calling this function multiple times is harmless.
pub fn init_tracing() {
    if TRACING_INIT.get().is_some() {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();

    let _ = TRACING_INIT.set(());
}

/// Counters describing how submissions and their steps behaved.
#[derive(Default, Debug)]
pub struct Telemetry {
    submissions_started: AtomicU64,
    submissions_succeeded: AtomicU64,
    submissions_failed: AtomicU64,
    step_attempts: AtomicU64,
    step_retries: AtomicU64,
    steps_exhausted: AtomicU64,
}

impl Telemetry {
    pub fn record_submission_started(&self) {
        self.submissions_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_submission_succeeded(&self) {
        self.submissions_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_submission_failed(&self) {
        self.submissions_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_step_attempt(&self) {
        self.step_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_step_retry(&self) {
        self.step_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_step_exhausted(&self) {
        self.steps_exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            submissions_started: self.submissions_started.load(Ordering::Relaxed),
            submissions_succeeded: self.submissions_succeeded.load(Ordering::Relaxed),
            submissions_failed: self.submissions_failed.load(Ordering::Relaxed),
            step_attempts: self.step_attempts.load(Ordering::Relaxed),
            step_retries: self.step_retries.load(Ordering::Relaxed),
            steps_exhausted: self.steps_exhausted.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct TelemetrySnapshot {
    pub submissions_started: u64,
    pub submissions_succeeded: u64,
    pub submissions_failed: u64,
    pub step_attempts: u64,
    pub step_retries: u64,
    pub steps_exhausted: u64,
}
