use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use token_forge::pipeline::backoff::{DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY};
use token_forge::{
    AuthorityRevocation, ImageFile, MintSession, MinterConfig, RetryPolicy, SubmissionForm,
    SubmissionRequest, SubmissionRequestParams, SubmissionSequencer,
};
use tracing_subscriber::EnvFilter;

use super::mock_ledger::MockLedger;
use super::mock_storage::MockStorage;

static TRACING_SUBSCRIBER: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn init_tracing() {
    Lazy::force(&TRACING_SUBSCRIBER);
}

pub const TEST_IMAGE_LIMIT: usize = 1024;

pub fn sample_image() -> ImageFile {
    ImageFile::new("logo.png", "image/png", vec![0x89, 0x50, 0x4e, 0x47, 1, 2, 3])
}

pub fn sample_request(
    supply: u64,
    decimals: u8,
    revocation: AuthorityRevocation,
) -> SubmissionRequest {
    SubmissionRequest::new(
        SubmissionRequestParams {
            name: "Forge Token".into(),
            symbol: "FRG".into(),
            initial_supply: supply,
            decimals,
            description: "minted from the integration suite".into(),
            image: Some(sample_image()),
            socials: None,
            revocation,
        },
        TEST_IMAGE_LIMIT,
    )
    .expect("sample request should validate")
}

pub fn sample_form() -> SubmissionForm {
    SubmissionForm {
        name: "Forge Token".into(),
        symbol: "FRG".into(),
        initial_supply: "1000".into(),
        decimals: "6".into(),
        description: "minted from a form".into(),
        image: Some(sample_image()),
        ..SubmissionForm::default()
    }
}

/// Production backoff timings; use with `start_paused` tests.
pub fn production_config(fee_address: Pubkey) -> MinterConfig {
    MinterConfig::builder()
        .rpc_url("http://127.0.0.1:8899")
        .fee_address(fee_address)
        .max_image_bytes(TEST_IMAGE_LIMIT)
        .retry_policy(RetryPolicy::new(3, DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY))
        .build()
        .expect("test config should validate")
}

/// Millisecond backoff for tests that run on the real clock.
pub fn fast_config(fee_address: Pubkey) -> MinterConfig {
    MinterConfig::builder()
        .rpc_url("http://127.0.0.1:8899")
        .fee_address(fee_address)
        .max_image_bytes(TEST_IMAGE_LIMIT)
        .retry_policy(RetryPolicy::new(
            3,
            Duration::from_millis(1),
            Duration::from_millis(5),
        ))
        .build()
        .expect("test config should validate")
}

pub struct Harness {
    pub ledger: Arc<MockLedger>,
    pub storage: Arc<MockStorage>,
    pub wallet: Arc<Keypair>,
    pub fee_address: Pubkey,
    pub sequencer: SubmissionSequencer,
}

impl Harness {
    pub fn new(build_config: fn(Pubkey) -> MinterConfig) -> Self {
        init_tracing();
        let ledger = Arc::new(MockLedger::default());
        let storage = Arc::new(MockStorage::default());
        let wallet = Arc::new(Keypair::new());
        let fee_address = Pubkey::new_unique();

        let session = MintSession::new(ledger.clone(), storage.clone());
        session.connect_wallet(wallet.clone());
        let sequencer = SubmissionSequencer::new(session, build_config(fee_address));

        Self {
            ledger,
            storage,
            wallet,
            fee_address,
            sequencer,
        }
    }

    pub fn fast() -> Self {
        Self::new(fast_config)
    }

    pub fn production() -> Self {
        Self::new(production_config)
    }
}
