//! Shared-custody family wallet
//!
//! One state aggregate, [`FamilyWallet`], covering:
//! - a membership registry with owner/member/viewer roles
//! - a pooled balance ledger with per-member contributions
//! - per-(member, category, period) spending limits and usage
//! - multi-approval proposals for withdrawals above a member's limit
//!
//! Every operation takes the caller and height explicitly through a
//! [`Context`] and either commits fully or returns a [`WalletError`] without
//! touching the state.
//!
//! # Example
//!
//! ```rust
//! use family_wallet::wallet::{ApprovalOutcome, Context, FamilyWallet, Principal};
//!
//! let mut wallet = FamilyWallet::with_defaults(Principal::new("owner"), 0).unwrap();
//!
//! // First deposit registers the caller as a member
//! wallet.deposit(&Context::new("kid", 1), 2000).unwrap();
//! wallet
//!     .set_limit(&Context::new("owner", 2), Principal::new("kid"), "bills", 200, 604_800)
//!     .unwrap();
//!
//! // Above the limit, so it needs a proposal and two approvals
//! let id = wallet
//!     .create_proposal(&Context::new("kid", 3), 300, "bills", "phone", 604_800)
//!     .unwrap();
//! wallet.approve_proposal(&Context::new("owner", 4), id).unwrap();
//! let outcome = wallet.approve_proposal(&Context::new("kid", 5), id).unwrap();
//!
//! assert_eq!(outcome, ApprovalOutcome::Executed { amount: 300 });
//! assert_eq!(wallet.get_total_balance(), 1700);
//! ```

pub mod config;
pub mod error;
pub mod ledger;
pub mod limits;
pub mod proposal;
pub mod types;

pub use config::WalletConfig;
pub use error::WalletError;
pub use ledger::FamilyWallet;
pub use proposal::{ApprovalOutcome, Proposal, ProposalStatus};
pub use types::{
    Amount, Balance, Category, Context, Height, LimitKey, Member, Period, Principal, Role,
    EXECUTION_USAGE_PERIOD, MAX_MEMO_LEN, PROPOSAL_EXPIRY,
};
