//! Solana plumbing: pure instruction builders, the `LedgerRpc` seam and its
//! `solana-client` implementation, and the session capability that carries
//! the connected wallet.

pub mod instructions;
pub mod rpc;
pub mod session;

pub use instructions::{MintPlan, RevocationPlan};
pub use rpc::{LedgerRpc, SolanaRpc};
pub use session::{MintSession, WalletSigner};
