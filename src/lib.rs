pub mod chain;
pub mod pipeline;
pub mod runtime;
pub mod storage;
pub mod submission;

pub use chain::{LedgerRpc, MintPlan, MintSession, RevocationPlan, SolanaRpc, WalletSigner};
pub use pipeline::{
    RetryPolicy, StepError, SubmissionError, SubmissionSequencer, SubmissionStep, TokenResult,
};
pub use runtime::config::{MinterConfig, MinterConfigBuilder, MinterConfigParams};
pub use runtime::progress::{ProgressStatus, ProgressTracker, UploadProgress};
pub use runtime::telemetry::{init_tracing, Telemetry, TelemetrySnapshot};
pub use storage::{HttpUploader, StorageUploader};
pub use submission::{
    format_sol, AuthorityRevocation, FeeSchedule, ImageFile, SocialLinks, SubmissionForm,
    SubmissionRequest, SubmissionRequestParams, TokenMetadataDocument, ValidationError,
};
