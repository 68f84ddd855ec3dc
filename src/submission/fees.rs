//! Service fee schedule charged before any token account is created.

use super::request::AuthorityRevocation;
use solana_sdk::native_token::LAMPORTS_PER_SOL;

pub const DEFAULT_BASE_FEE_LAMPORTS: u64 = 20_000_000;
pub const DEFAULT_MINT_REVOCATION_FEE_LAMPORTS: u64 = 1_000_000;
pub const DEFAULT_FREEZE_REVOCATION_FEE_LAMPORTS: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    pub base_lamports: u64,
    pub mint_revocation_lamports: u64,
    pub freeze_revocation_lamports: u64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            base_lamports: DEFAULT_BASE_FEE_LAMPORTS,
            mint_revocation_lamports: DEFAULT_MINT_REVOCATION_FEE_LAMPORTS,
            freeze_revocation_lamports: DEFAULT_FREEZE_REVOCATION_FEE_LAMPORTS,
        }
    }
}

impl FeeSchedule {
    /// Base fee plus every enabled revocation fee.
    pub fn total(&self, revocation: AuthorityRevocation) -> u64 {
        self.breakdown(revocation)
            .iter()
            .fold(0u64, |acc, (_, lamports)| acc.saturating_add(*lamports))
    }

    /// Labelled line items making up [`FeeSchedule::total`].
    pub fn breakdown(&self, revocation: AuthorityRevocation) -> Vec<(&'static str, u64)> {
        let mut items = vec![("Base Fee", self.base_lamports)];
        if revocation.mint {
            items.push(("Revoke Mint Authority", self.mint_revocation_lamports));
        }
        if revocation.freeze {
            items.push(("Revoke Freeze Authority", self.freeze_revocation_lamports));
        }
        items
    }
}

/// Renders lamports as SOL with three decimal places, e.g. `0.022`.
pub fn format_sol(lamports: u64) -> String {
    format!("{:.3}", lamports as f64 / LAMPORTS_PER_SOL as f64)
}
