use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use futures::future::BoxFuture;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::system_program;
use solana_sdk::transaction::Transaction;
use spl_token::instruction::{AuthorityType, TokenInstruction};
use spl_token::solana_program::program_option::COption;
use token_forge::LedgerRpc;

pub const MOCK_RENT_LAMPORTS: u64 = 1_461_600;

/// What a submitted transaction does, judged by the programs it invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxKind {
    FeeTransfer,
    CreateMint,
    CreateMetadata,
    RevokeAuthorities,
    Unknown,
}

impl TxKind {
    pub fn classify(transaction: &Transaction) -> Self {
        let programs = program_ids(transaction);
        if programs.contains(&mpl_token_metadata::ID) {
            TxKind::CreateMetadata
        } else if programs.contains(&spl_associated_token_account::id()) {
            TxKind::CreateMint
        } else if !programs.is_empty() && programs.iter().all(|id| *id == spl_token::id()) {
            TxKind::RevokeAuthorities
        } else if !programs.is_empty() && programs.iter().all(|id| *id == system_program::id()) {
            TxKind::FeeTransfer
        } else {
            TxKind::Unknown
        }
    }
}

#[derive(Default)]
struct LedgerState {
    confirmed: Vec<(TxKind, Transaction)>,
    attempts: HashMap<TxKind, usize>,
    failures: HashMap<TxKind, usize>,
    blockhash_requests: usize,
}

/// In-memory ledger: confirms every well-signed transaction unless a failure
/// has been scripted for its kind.
#[derive(Default)]
pub struct MockLedger {
    state: Mutex<LedgerState>,
}

impl MockLedger {
    /// The next `times` transactions of `kind` are rejected.
    pub fn fail_next(&self, kind: TxKind, times: usize) {
        let mut state = self.state.lock().expect("mock ledger poisoned");
        state.failures.insert(kind, times);
    }

    pub fn fail_always(&self, kind: TxKind) {
        self.fail_next(kind, usize::MAX);
    }

    pub fn confirmed(&self) -> Vec<(TxKind, Transaction)> {
        self.state
            .lock()
            .expect("mock ledger poisoned")
            .confirmed
            .clone()
    }

    pub fn confirmed_kinds(&self) -> Vec<TxKind> {
        self.confirmed().into_iter().map(|(kind, _)| kind).collect()
    }

    pub fn confirmed_of(&self, kind: TxKind) -> Vec<Transaction> {
        self.confirmed()
            .into_iter()
            .filter(|(confirmed, _)| *confirmed == kind)
            .map(|(_, tx)| tx)
            .collect()
    }

    pub fn attempts(&self, kind: TxKind) -> usize {
        self.state
            .lock()
            .expect("mock ledger poisoned")
            .attempts
            .get(&kind)
            .copied()
            .unwrap_or(0)
    }

    pub fn blockhash_requests(&self) -> usize {
        self.state
            .lock()
            .expect("mock ledger poisoned")
            .blockhash_requests
    }

    fn submit(&self, transaction: &Transaction) -> Result<Signature> {
        transaction
            .verify()
            .map_err(|err| anyhow!("signature verification failed: {err}"))?;

        let kind = TxKind::classify(transaction);
        let mut state = self.state.lock().expect("mock ledger poisoned");
        *state.attempts.entry(kind).or_default() += 1;

        if let Some(remaining) = state.failures.get_mut(&kind) {
            if *remaining > 0 {
                if *remaining != usize::MAX {
                    *remaining -= 1;
                }
                return Err(anyhow!("scripted {kind:?} failure"));
            }
        }

        state.confirmed.push((kind, transaction.clone()));
        Ok(transaction.signatures[0])
    }
}

impl LedgerRpc for MockLedger {
    fn latest_blockhash(&self) -> BoxFuture<'_, Result<Hash>> {
        Box::pin(async move {
            self.state
                .lock()
                .expect("mock ledger poisoned")
                .blockhash_requests += 1;
            Ok(Hash::new_unique())
        })
    }

    fn minimum_balance_for_rent_exemption(&self, _data_len: usize) -> BoxFuture<'_, Result<u64>> {
        Box::pin(async { Ok(MOCK_RENT_LAMPORTS) })
    }

    fn send_and_confirm<'a>(
        &'a self,
        transaction: &'a Transaction,
    ) -> BoxFuture<'a, Result<Signature>> {
        Box::pin(async move { self.submit(transaction) })
    }
}

pub fn program_ids(transaction: &Transaction) -> Vec<Pubkey> {
    let keys = &transaction.message.account_keys;
    transaction
        .message
        .instructions
        .iter()
        .map(|ix| keys[usize::from(ix.program_id_index)])
        .collect()
}

/// Lamports moved by a fee transfer (system `Transfer` layout: u32 tag, u64 amount).
pub fn transfer_lamports(transaction: &Transaction) -> (Pubkey, Pubkey, u64) {
    let ix = &transaction.message.instructions[0];
    let keys = &transaction.message.account_keys;
    let data: [u8; 8] = ix.data[4..12].try_into().expect("transfer data is 12 bytes");
    (
        keys[usize::from(ix.accounts[0])],
        keys[usize::from(ix.accounts[1])],
        u64::from_le_bytes(data),
    )
}

pub fn token_instructions(transaction: &Transaction) -> Vec<TokenInstruction<'_>> {
    let keys = &transaction.message.account_keys;
    transaction
        .message
        .instructions
        .iter()
        .filter(|ix| keys[usize::from(ix.program_id_index)] == spl_token::id())
        .map(|ix| TokenInstruction::unpack(&ix.data).expect("valid token instruction"))
        .collect()
}

pub fn minted_amount(transaction: &Transaction) -> Option<u64> {
    token_instructions(transaction).into_iter().find_map(|ix| match ix {
        TokenInstruction::MintTo { amount } => Some(amount),
        _ => None,
    })
}

pub fn initial_freeze_authority(transaction: &Transaction) -> Option<COption<Pubkey>> {
    token_instructions(transaction).into_iter().find_map(|ix| match ix {
        TokenInstruction::InitializeMint2 {
            freeze_authority, ..
        } => Some(freeze_authority),
        _ => None,
    })
}

pub fn revoked_authorities(transaction: &Transaction) -> Vec<AuthorityType> {
    token_instructions(transaction)
        .into_iter()
        .filter_map(|ix| match ix {
            TokenInstruction::SetAuthority {
                authority_type,
                new_authority: COption::None,
            } => Some(authority_type),
            _ => None,
        })
        .collect()
}
