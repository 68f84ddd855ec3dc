use crate::pipeline::backoff::RetryPolicy;
use crate::submission::fees::FeeSchedule;
use crate::submission::request::DEFAULT_MAX_IMAGE_BYTES;
use anyhow::{bail, Context, Result};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";
pub const DEFAULT_FEE_ADDRESS: &str = "11111111111111111111111111111111";
pub const DEFAULT_UPLOAD_URL: &str = "https://node1.irys.xyz/upload";
pub const DEFAULT_GATEWAY_URL: &str = "https://gateway.irys.xyz";
pub const DEFAULT_COMMITMENT: &str = "confirmed";
const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;

pub const ENV_RPC_URL: &str = "TOKEN_FORGE_RPC_URL";
pub const ENV_FEE_ADDRESS: &str = "TOKEN_FORGE_FEE_ADDRESS";
pub const ENV_UPLOAD_URL: &str = "TOKEN_FORGE_UPLOAD_URL";
pub const ENV_GATEWAY_URL: &str = "TOKEN_FORGE_GATEWAY_URL";
pub const ENV_COMMITMENT: &str = "TOKEN_FORGE_COMMITMENT";

/// Runtime configuration for the minting pipeline.
///
/// All instances must be constructed via [`MinterConfig::builder`], [`MinterConfig::new`]
/// or [`MinterConfig::from_env`] so invariants are validated before any consumer observes
/// the values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinterConfig {
    rpc_url: String,
    fee_address: Pubkey,
    upload_url: String,
    gateway_url: String,
    commitment: CommitmentConfig,
    rpc_timeout: Duration,
    max_image_bytes: usize,
    fees: FeeSchedule,
    retry_policy: RetryPolicy,
}

pub struct MinterConfigParams {
    pub rpc_url: String,
    pub fee_address: Pubkey,
    pub upload_url: String,
    pub gateway_url: String,
    pub commitment: CommitmentConfig,
    pub rpc_timeout: Duration,
    pub max_image_bytes: usize,
    pub fees: FeeSchedule,
    pub retry_policy: RetryPolicy,
}

impl MinterConfig {
    /// Returns a builder to incrementally construct and validate a configuration.
    pub fn builder() -> MinterConfigBuilder {
        MinterConfigBuilder::default()
    }

    /// Constructs a configuration directly from the provided values.
    pub fn new(params: MinterConfigParams) -> Result<Self> {
        let MinterConfigParams {
            rpc_url,
            fee_address,
            upload_url,
            gateway_url,
            commitment,
            rpc_timeout,
            max_image_bytes,
            fees,
            retry_policy,
        } = params;

        let config = Self {
            rpc_url: trimmed_string(rpc_url),
            fee_address,
            upload_url: trimmed_string(upload_url),
            gateway_url: trimmed_string(gateway_url),
            commitment,
            rpc_timeout,
            max_image_bytes,
            fees,
            retry_policy,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reads the process environment, falling back to the literal defaults
    /// for anything unset or blank.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`MinterConfig::from_env`] with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str, default: &str| -> String {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_owned())
        };

        let fee_address = read(ENV_FEE_ADDRESS, DEFAULT_FEE_ADDRESS);
        let commitment = read(ENV_COMMITMENT, DEFAULT_COMMITMENT);

        Self::builder()
            .rpc_url(read(ENV_RPC_URL, DEFAULT_RPC_URL))
            .fee_address(
                parse_pubkey(&fee_address)
                    .with_context(|| format!("{ENV_FEE_ADDRESS} is not a valid address"))?,
            )
            .upload_url(read(ENV_UPLOAD_URL, DEFAULT_UPLOAD_URL))
            .gateway_url(read(ENV_GATEWAY_URL, DEFAULT_GATEWAY_URL))
            .commitment(
                parse_commitment(&commitment)
                    .with_context(|| format!("{ENV_COMMITMENT} is invalid"))?,
            )
            .build()
    }

    /// Solana JSON-RPC endpoint.
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Destination of the service fee transfer.
    pub fn fee_address(&self) -> Pubkey {
        self.fee_address
    }

    /// Storage node endpoint receiving uploads.
    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }

    /// Public gateway prefix for uploaded content.
    pub fn gateway_url(&self) -> &str {
        &self.gateway_url
    }

    pub fn commitment(&self) -> CommitmentConfig {
        self.commitment
    }

    /// Per-request timeout for RPC and storage calls.
    pub fn rpc_timeout(&self) -> Duration {
        self.rpc_timeout
    }

    pub fn max_image_bytes(&self) -> usize {
        self.max_image_bytes
    }

    pub fn fees(&self) -> FeeSchedule {
        self.fees
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry_policy
    }

    /// Performs validation on an existing configuration instance.
    pub fn validate(&self) -> Result<()> {
        validate_url(&self.rpc_url, "rpc_url")?;
        validate_url(&self.upload_url, "upload_url")?;
        validate_url(&self.gateway_url, "gateway_url")?;

        if self.rpc_timeout.is_zero() {
            bail!("rpc_timeout must be greater than 0");
        }

        if self.max_image_bytes == 0 {
            bail!("max_image_bytes must be greater than 0");
        }

        self.retry_policy.validate()?;
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct MinterConfigBuilder {
    rpc_url: Option<String>,
    fee_address: Option<Pubkey>,
    upload_url: Option<String>,
    gateway_url: Option<String>,
    commitment: Option<CommitmentConfig>,
    rpc_timeout: Option<Duration>,
    max_image_bytes: Option<usize>,
    fees: Option<FeeSchedule>,
    retry_policy: Option<RetryPolicy>,
}

impl MinterConfigBuilder {
    pub fn rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = Some(url.into());
        self
    }

    pub fn fee_address(mut self, address: Pubkey) -> Self {
        self.fee_address = Some(address);
        self
    }

    pub fn upload_url(mut self, url: impl Into<String>) -> Self {
        self.upload_url = Some(url.into());
        self
    }

    pub fn gateway_url(mut self, url: impl Into<String>) -> Self {
        self.gateway_url = Some(url.into());
        self
    }

    pub fn commitment(mut self, commitment: CommitmentConfig) -> Self {
        self.commitment = Some(commitment);
        self
    }

    pub fn rpc_timeout(mut self, timeout: Duration) -> Self {
        self.rpc_timeout = Some(timeout);
        self
    }

    pub fn max_image_bytes(mut self, bytes: usize) -> Self {
        self.max_image_bytes = Some(bytes);
        self
    }

    pub fn fees(mut self, fees: FeeSchedule) -> Self {
        self.fees = Some(fees);
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    pub fn build(self) -> Result<MinterConfig> {
        let fee_address = match self.fee_address {
            Some(address) => address,
            None => parse_pubkey(DEFAULT_FEE_ADDRESS)?,
        };

        let params = MinterConfigParams {
            rpc_url: self.rpc_url.unwrap_or_else(|| DEFAULT_RPC_URL.to_owned()),
            fee_address,
            upload_url: self
                .upload_url
                .unwrap_or_else(|| DEFAULT_UPLOAD_URL.to_owned()),
            gateway_url: self
                .gateway_url
                .unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_owned()),
            commitment: self.commitment.unwrap_or_else(CommitmentConfig::confirmed),
            rpc_timeout: self
                .rpc_timeout
                .unwrap_or_else(|| Duration::from_secs(DEFAULT_RPC_TIMEOUT_SECS)),
            max_image_bytes: self.max_image_bytes.unwrap_or(DEFAULT_MAX_IMAGE_BYTES),
            fees: self.fees.unwrap_or_default(),
            retry_policy: self.retry_policy.unwrap_or_default(),
        };

        MinterConfig::new(params)
    }
}

pub fn parse_commitment(value: &str) -> Result<CommitmentConfig> {
    match value.trim().to_ascii_lowercase().as_str() {
        "processed" => Ok(CommitmentConfig::processed()),
        "confirmed" => Ok(CommitmentConfig::confirmed()),
        "finalized" => Ok(CommitmentConfig::finalized()),
        other => bail!("commitment must be processed, confirmed or finalized (got '{other}')"),
    }
}

fn parse_pubkey(value: &str) -> Result<Pubkey> {
    Pubkey::from_str(value.trim()).with_context(|| format!("'{value}' is not a base58 public key"))
}

fn trimmed_string(value: String) -> String {
    value.trim().to_owned()
}

fn validate_url(url: &str, field: &str) -> Result<()> {
    let url = url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        bail!("{field} must start with http:// or https://");
    }
    Ok(())
}
