//! Submission inputs: raw form parsing, the validated immutable request, fee
//! schedule, and the off-chain metadata document uploaded to storage.

pub mod fees;
pub mod form;
pub mod metadata;
pub mod request;

pub use fees::{format_sol, FeeSchedule};
pub use form::SubmissionForm;
pub use metadata::TokenMetadataDocument;
pub use request::{
    AuthorityRevocation, ImageFile, SocialLinks, SubmissionRequest, SubmissionRequestParams,
    ValidationError,
};
