//! Ledger access used by the sequencer. `LedgerRpc` is the seam tests swap
//! out; `SolanaRpc` talks to a real cluster through `solana-client`.

use crate::runtime::config::MinterConfig;
use anyhow::{Context, Result};
use futures::future::BoxFuture;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

pub trait LedgerRpc: Send + Sync {
    fn latest_blockhash(&self) -> BoxFuture<'_, Result<Hash>>;

    fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> BoxFuture<'_, Result<u64>>;

    /// Submits a fully signed transaction and waits until the configured
    /// commitment level confirms it.
    fn send_and_confirm<'a>(
        &'a self,
        transaction: &'a Transaction,
    ) -> BoxFuture<'a, Result<Signature>>;
}

#[derive(Clone)]
pub struct SolanaRpc {
    endpoint: Arc<String>,
    client: Arc<RpcClient>,
}

impl std::fmt::Debug for SolanaRpc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolanaRpc")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl SolanaRpc {
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
        commitment: CommitmentConfig,
    ) -> Self {
        let endpoint = endpoint.into();
        let client =
            RpcClient::new_with_timeout_and_commitment(endpoint.clone(), timeout, commitment);
        Self {
            endpoint: Arc::new(endpoint),
            client: Arc::new(client),
        }
    }

    pub fn from_config(config: &MinterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            config.rpc_url().to_owned(),
            config.rpc_timeout(),
            config.commitment(),
        ))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send_and_confirm_inner(&self, transaction: &Transaction) -> Result<Signature> {
        let start = Instant::now();
        let signature = self
            .client
            .send_and_confirm_transaction(transaction)
            .await
            .context("sendTransaction failed or was not confirmed")?;
        tracing::debug!(
            %signature,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "transaction confirmed"
        );
        Ok(signature)
    }
}

impl LedgerRpc for SolanaRpc {
    fn latest_blockhash(&self) -> BoxFuture<'_, Result<Hash>> {
        Box::pin(async move {
            self.client
                .get_latest_blockhash()
                .await
                .context("getLatestBlockhash failed")
        })
    }

    fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> BoxFuture<'_, Result<u64>> {
        Box::pin(async move {
            self.client
                .get_minimum_balance_for_rent_exemption(data_len)
                .await
                .with_context(|| format!("getMinimumBalanceForRentExemption({data_len}) failed"))
        })
    }

    fn send_and_confirm<'a>(
        &'a self,
        transaction: &'a Transaction,
    ) -> BoxFuture<'a, Result<Signature>> {
        Box::pin(self.send_and_confirm_inner(transaction))
    }
}
