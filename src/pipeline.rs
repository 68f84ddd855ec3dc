//! The submission pipeline: backoff policy, per-step labels, the retrying
//! step executor, and the sequencer that chains the steps together.

pub mod backoff;
pub mod messages;
pub mod sequencer;
pub mod step;

pub use backoff::{retry_with_backoff, RetryExhausted, RetryPolicy};
pub use messages::SubmissionStep;
pub use sequencer::{SubmissionError, SubmissionSequencer, TokenResult};
pub use step::{StepError, StepExecutor};
