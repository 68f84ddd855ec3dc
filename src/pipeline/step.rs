use super::backoff::{retry_with_backoff, RetryExhausted, RetryPolicy};
use super::messages::{exhausted_message, retrying_message, StepLogContext, SubmissionStep};
use crate::runtime::progress::ProgressTracker;
use crate::runtime::telemetry::Telemetry;
use anyhow::Error;
use std::fmt;
use std::future::Future;

/// A step that gave up, either after exhausting its retries or, for the
/// single-shot revocation step, after its only attempt.
#[derive(Debug)]
pub struct StepError {
    pub step: SubmissionStep,
    pub attempts: u32,
    pub source: Error,
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed after {} attempt(s): {:#}",
            self.step, self.attempts, self.source
        )
    }
}

impl std::error::Error for StepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Runs one step inside its progress window, retrying with the configured
/// policy and publishing `Retrying`/`Error` states as it goes.
pub struct StepExecutor<'a> {
    policy: RetryPolicy,
    progress: &'a ProgressTracker,
    telemetry: &'a Telemetry,
}

impl<'a> StepExecutor<'a> {
    pub fn new(
        policy: RetryPolicy,
        progress: &'a ProgressTracker,
        telemetry: &'a Telemetry,
    ) -> Self {
        Self {
            policy,
            progress,
            telemetry,
        }
    }

    pub async fn run<T, F, Fut>(
        &self,
        step: SubmissionStep,
        mut operation: F,
    ) -> Result<T, StepError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let log = StepLogContext::new(step);
        let started = step.messages().started;
        let (window_start, window_end) = step.window();
        let max_attempts = self.policy.max_attempts;
        let mut attempts = 0;

        log.log_started();
        self.progress.uploading(started, window_start);

        let outcome = retry_with_backoff(
            self.policy,
            |attempt| {
                attempts = attempt;
                if attempt > 1 {
                    self.progress.uploading(started, window_start);
                }
                self.telemetry.record_step_attempt();
                log.log_attempt(attempt);
                operation(attempt)
            },
            |attempt, delay, err| {
                self.telemetry.record_step_retry();
                log.log_retry(attempt, delay, err);
                self.progress.retrying(
                    retrying_message(step, delay, attempt + 1, max_attempts),
                    window_start,
                    attempt,
                );
            },
        )
        .await;

        match outcome {
            Ok(value) => {
                log.log_completed(attempts);
                self.progress.uploading(started, window_end);
                Ok(value)
            }
            Err(RetryExhausted { attempts, source }) => Err(self.give_up(log, attempts, source)),
        }
    }

    /// Single attempt, no backoff. Failure is terminal.
    pub async fn run_once<T, Fut>(
        &self,
        step: SubmissionStep,
        operation: Fut,
    ) -> Result<T, StepError>
    where
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let log = StepLogContext::new(step);
        let started = step.messages().started;
        let (window_start, window_end) = step.window();

        log.log_started();
        self.progress.uploading(started, window_start);
        self.telemetry.record_step_attempt();
        log.log_attempt(1);

        match operation.await {
            Ok(value) => {
                log.log_completed(1);
                self.progress.uploading(started, window_end);
                Ok(value)
            }
            Err(source) => Err(self.give_up(log, 1, source)),
        }
    }

    fn give_up(&self, log: StepLogContext, attempts: u32, source: Error) -> StepError {
        let step = log.step();
        self.telemetry.record_step_exhausted();
        log.log_exhausted(attempts, &source);
        self.progress.fail(exhausted_message(step, attempts), format!("{source:#}"));
        StepError {
            step,
            attempts,
            source,
        }
    }
}
