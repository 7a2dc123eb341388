//! Family Wallet: a shared-custody wallet ledger in Rust
//!
//! This crate provides the state machine for a small group wallet featuring:
//! - Owner/member/viewer roles with soft-delete membership
//! - A pooled balance with per-member contribution tracking
//! - Per-category, per-period spending limits and usage
//! - Multi-approval proposals for withdrawals above a member's limit
//! - JSON snapshot storage and a CLI host
//!
//! The host supplies who is calling and the current block height; the
//! ledger never reads a clock or an ambient identity.
//!
//! # Example
//!
//! ```rust
//! use family_wallet::wallet::{Context, FamilyWallet, Principal, WalletError};
//!
//! let mut wallet = FamilyWallet::with_defaults(Principal::new("owner"), 0).unwrap();
//! wallet.deposit(&Context::new("kid", 1), 500).unwrap();
//!
//! // No limit set yet, so a direct withdrawal needs a proposal
//! let result = wallet.withdraw(&Context::new("kid", 2), 50, "cinema", "fun", 86_400);
//! assert!(matches!(result, Err(WalletError::ApprovalRequired)));
//! ```

pub mod cli;
pub mod storage;
pub mod wallet;

// Re-export commonly used types
pub use storage::{Snapshot, Storage, StorageConfig, StorageError};
pub use wallet::{
    ApprovalOutcome, Category, Context, FamilyWallet, Member, Period, Principal, Proposal,
    ProposalStatus, Role, WalletConfig, WalletError,
};
