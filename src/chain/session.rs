use crate::chain::rpc::{LedgerRpc, SolanaRpc};
use crate::runtime::config::MinterConfig;
use crate::storage::{HttpUploader, StorageUploader};
use anyhow::{Context, Result};
use solana_sdk::instruction::Instruction;
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Signature, Signer};
use solana_sdk::transaction::Transaction;
use std::sync::{Arc, RwLock};

/// Wallet capability injected once the user connects.
pub type WalletSigner = Arc<dyn Signer + Send + Sync>;

/// Explicit context handed to the sequencer: ledger access, storage, and the
/// (optional) connected wallet. Cloning shares the same wallet slot.
#[derive(Clone)]
pub struct MintSession {
    rpc: Arc<dyn LedgerRpc>,
    uploader: Arc<dyn StorageUploader>,
    wallet: Arc<RwLock<Option<WalletSigner>>>,
}

impl MintSession {
    pub fn new(rpc: Arc<dyn LedgerRpc>, uploader: Arc<dyn StorageUploader>) -> Self {
        Self {
            rpc,
            uploader,
            wallet: Arc::new(RwLock::new(None)),
        }
    }

    pub fn from_config(config: &MinterConfig) -> Result<Self> {
        let rpc = SolanaRpc::from_config(config)?;
        let uploader = HttpUploader::from_config(config)?;
        Ok(Self::new(Arc::new(rpc), Arc::new(uploader)))
    }

    pub fn with_wallet(self, wallet: WalletSigner) -> Self {
        self.connect_wallet(wallet);
        self
    }

    /// Installs `wallet` unless a signer with the same public key is already
    /// connected. Returns whether the identity changed.
    pub fn connect_wallet(&self, wallet: WalletSigner) -> bool {
        let mut slot = self.wallet.write().unwrap_or_else(|err| err.into_inner());
        let unchanged = slot
            .as_ref()
            .map(|current| current.pubkey() == wallet.pubkey())
            .unwrap_or(false);
        if unchanged {
            return false;
        }

        tracing::info!(wallet = %wallet.pubkey(), "wallet connected");
        *slot = Some(wallet);
        true
    }

    pub fn disconnect_wallet(&self) {
        let mut slot = self.wallet.write().unwrap_or_else(|err| err.into_inner());
        if let Some(previous) = slot.take() {
            tracing::info!(wallet = %previous.pubkey(), "wallet disconnected");
        }
    }

    pub fn wallet(&self) -> Option<WalletSigner> {
        self.wallet
            .read()
            .unwrap_or_else(|err| err.into_inner())
            .clone()
    }

    pub fn identity(&self) -> Option<Pubkey> {
        self.wallet().map(|wallet| wallet.pubkey())
    }

    pub fn rpc(&self) -> &dyn LedgerRpc {
        self.rpc.as_ref()
    }

    pub fn uploader(&self) -> &dyn StorageUploader {
        self.uploader.as_ref()
    }

    /// Compiles `instructions` into a fresh transaction paid by `payer`,
    /// signs it with `signers`, and waits for confirmation.
    pub async fn send_instructions(
        &self,
        payer: &Pubkey,
        instructions: &[Instruction],
        signers: &[&(dyn Signer + Send + Sync)],
    ) -> Result<Signature> {
        let blockhash = self.rpc.latest_blockhash().await?;
        let message = Message::new(instructions, Some(payer));
        let mut transaction = Transaction::new_unsigned(message);
        transaction
            .try_sign(signers, blockhash)
            .context("failed to sign transaction")?;
        self.rpc.send_and_confirm(&transaction).await
    }
}
