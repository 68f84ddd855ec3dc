//! Drives one submission end to end: fee, image, metadata document, mint,
//! on-chain metadata, then the optional authority revocation.

use super::messages::{SubmissionStep, COMPLETED, INITIALIZING};
use super::step::{StepError, StepExecutor};
use crate::chain::instructions::{
    create_fungible_metadata, create_mint_with_associated_token, fee_transfer, metadata_address,
    revoke_authorities, MintPlan, RevocationPlan, MINT_ACCOUNT_LEN,
};
use crate::chain::session::{MintSession, WalletSigner};
use crate::runtime::config::MinterConfig;
use crate::runtime::progress::{ProgressTracker, UploadProgress};
use crate::runtime::telemetry::{Telemetry, TelemetrySnapshot};
use crate::submission::{SubmissionForm, SubmissionRequest, TokenMetadataDocument, ValidationError};
use anyhow::Context;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Everything the caller needs to locate the new token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenResult {
    pub mint: Pubkey,
    pub token_account: Pubkey,
    pub metadata_account: Pubkey,
    pub image_uri: String,
    pub metadata_uri: String,
    pub fee_signature: Signature,
    pub mint_signature: Signature,
    pub metadata_signature: Signature,
    pub revocation_signature: Option<Signature>,
}

#[derive(Debug)]
pub enum SubmissionError {
    WalletNotConnected,
    AlreadyRunning,
    Validation(ValidationError),
    Step(StepError),
    /// The token exists but revoking its authorities failed.
    Revocation {
        token: Box<TokenResult>,
        source: StepError,
    },
}

impl fmt::Display for SubmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionError::WalletNotConnected => {
                write!(f, "Please connect your wallet to continue")
            }
            SubmissionError::AlreadyRunning => write!(f, "a submission is already in progress"),
            SubmissionError::Validation(err) => write!(f, "{err}"),
            SubmissionError::Step(err) => write!(f, "{err}"),
            SubmissionError::Revocation { token, source } => write!(
                f,
                "token {} was created but authority revocation failed: {source}",
                token.mint
            ),
        }
    }
}

impl std::error::Error for SubmissionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SubmissionError::Validation(err) => Some(err),
            SubmissionError::Step(err) => Some(err),
            SubmissionError::Revocation { source, .. } => Some(source),
            SubmissionError::WalletNotConnected | SubmissionError::AlreadyRunning => None,
        }
    }
}

impl From<ValidationError> for SubmissionError {
    fn from(err: ValidationError) -> Self {
        SubmissionError::Validation(err)
    }
}

impl From<StepError> for SubmissionError {
    fn from(err: StepError) -> Self {
        SubmissionError::Step(err)
    }
}

/// Clears the in-flight flag however the submission ends.
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SubmissionSequencer {
    session: MintSession,
    config: MinterConfig,
    progress: Arc<ProgressTracker>,
    telemetry: Arc<Telemetry>,
    in_flight: AtomicBool,
}

impl SubmissionSequencer {
    pub fn new(session: MintSession, config: MinterConfig) -> Self {
        Self {
            session,
            config,
            progress: Arc::new(ProgressTracker::new()),
            telemetry: Arc::new(Telemetry::default()),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn session(&self) -> &MintSession {
        &self.session
    }

    pub fn config(&self) -> &MinterConfig {
        &self.config
    }

    pub fn progress(&self) -> UploadProgress {
        self.progress.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadProgress> {
        self.progress.subscribe()
    }

    pub fn telemetry(&self) -> TelemetrySnapshot {
        self.telemetry.snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Validates the raw form against the configured image limit, then submits.
    pub async fn submit_form(&self, form: &SubmissionForm) -> Result<TokenResult, SubmissionError> {
        let request = form.validate(self.config.max_image_bytes())?;
        self.submit(&request).await
    }

    /// Runs the whole pipeline. Calling it again after a failure starts over
    /// from the fee payment.
    pub async fn submit(
        &self,
        request: &SubmissionRequest,
    ) -> Result<TokenResult, SubmissionError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("submission rejected; another one is in flight");
            return Err(SubmissionError::AlreadyRunning);
        }
        let _guard = FlightGuard(&self.in_flight);

        let wallet = self
            .session
            .wallet()
            .ok_or(SubmissionError::WalletNotConnected)?;

        self.progress.reset(INITIALIZING);
        self.telemetry.record_submission_started();
        tracing::info!(
            wallet = %wallet.pubkey(),
            name = request.name(),
            symbol = request.symbol(),
            decimals = request.decimals(),
            initial_supply = request.initial_supply(),
            "submission started"
        );

        match self.execute(request, wallet).await {
            Ok(token) => {
                self.progress.done(COMPLETED);
                self.telemetry.record_submission_succeeded();
                tracing::info!(mint = %token.mint, uri = %token.metadata_uri, "token created");
                Ok(token)
            }
            Err(err) => {
                self.telemetry.record_submission_failed();
                tracing::error!(error = %err, "submission failed");
                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        request: &SubmissionRequest,
        wallet: WalletSigner,
    ) -> Result<TokenResult, SubmissionError> {
        let session = &self.session;
        let executor = StepExecutor::new(
            self.config.retry_policy(),
            &self.progress,
            &self.telemetry,
        );
        let payer = wallet.pubkey();
        let signer: &(dyn Signer + Send + Sync) = &*wallet;

        let fee_address = self.config.fee_address();
        let fee_lamports = self.config.fees().total(request.revocation());
        let fee_signature = executor
            .run(SubmissionStep::FeePayment, |_| async move {
                let transfer = fee_transfer(&payer, &fee_address, fee_lamports);
                session
                    .send_instructions(&payer, &[transfer], &[signer])
                    .await
            })
            .await?;
        tracing::info!(%fee_signature, lamports = fee_lamports, "fee paid");

        let image_uri = executor
            .run(SubmissionStep::ImageUpload, |_| session.uploader().upload(request.image()))
            .await?;

        let document = TokenMetadataDocument::from_request(request, &image_uri);
        let metadata_uri = executor
            .run(SubmissionStep::MetadataUpload, |_| {
                let document = &document;
                async move {
                    let json = document
                        .to_json()
                        .context("failed to serialize metadata document")?;
                    session.uploader().upload_json(&json).await
                }
            })
            .await?;

        // One mint keypair per submission; retries must target the same address.
        let mint = Keypair::new();
        let plan = MintPlan::for_request(mint.pubkey(), payer, request);
        let mint_signer: &(dyn Signer + Send + Sync) = &mint;
        let mint_signature = executor
            .run(SubmissionStep::MintCreation, |_| {
                let plan = &plan;
                async move {
                    let rent = session
                        .rpc()
                        .minimum_balance_for_rent_exemption(MINT_ACCOUNT_LEN)
                        .await?;
                    let instructions = create_mint_with_associated_token(plan, rent)?;
                    session
                        .send_instructions(&payer, &instructions, &[signer, mint_signer])
                        .await
                }
            })
            .await?;

        let metadata_signature = executor
            .run(SubmissionStep::MetadataAttachment, |_| {
                let metadata_uri = &metadata_uri;
                async move {
                    let instruction = create_fungible_metadata(
                        &plan.mint,
                        &payer,
                        request.name(),
                        request.symbol(),
                        metadata_uri,
                    );
                    session
                        .send_instructions(&payer, &[instruction], &[signer])
                        .await
                }
            })
            .await?;

        let mut token = TokenResult {
            mint: plan.mint,
            token_account: plan.token_account(),
            metadata_account: metadata_address(&plan.mint),
            image_uri,
            metadata_uri,
            fee_signature,
            mint_signature,
            metadata_signature,
            revocation_signature: None,
        };

        let requested = request.revocation();
        if !requested.any() {
            return Ok(token);
        }

        let revocation = RevocationPlan::after_creation(requested, &plan);
        if revocation.is_empty() {
            tracing::info!(mint = %plan.mint, "no authority left to revoke");
            return Ok(token);
        }

        let outcome = executor
            .run_once(SubmissionStep::AuthorityRevocation, async {
                let instructions = revoke_authorities(&plan.mint, &payer, revocation)?;
                session
                    .send_instructions(&payer, &instructions, &[signer])
                    .await
            })
            .await;

        match outcome {
            Ok(signature) => {
                token.revocation_signature = Some(signature);
                Ok(token)
            }
            Err(source) => Err(SubmissionError::Revocation {
                token: Box::new(token),
                source,
            }),
        }
    }
}
