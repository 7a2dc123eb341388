//! Wallet error taxonomy

use crate::wallet::types::{Amount, Principal};
use thiserror::Error;

/// Errors returned by wallet operations
///
/// Every variant is a recoverable validation failure: the ledger is left
/// exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("Unauthorized: caller lacks the required role")]
    Unauthorized,
    #[error("Over limit: remaining allowance is insufficient")]
    OverLimit,
    #[error("Insufficient balance: have {available}, need {requested}")]
    InsufficientBalance { available: Amount, requested: Amount },
    #[error("Invalid amount: amount must be greater than 0")]
    InvalidAmount,
    #[error("Invalid category: {0}")]
    InvalidCategory(String),
    #[error("Max members exceeded: wallet is capped at {max} active members")]
    MaxMembersExceeded { max: usize },
    #[error("Member not found: {0}")]
    MemberNotFound(Principal),
    #[error("Invalid role: {0}")]
    InvalidRole(String),
    #[error("Approval required: no direct allowance for this withdrawal")]
    ApprovalRequired,
    #[error("Invalid memo: {len} characters exceeds the limit")]
    InvalidMemo { len: usize },
    #[error("Invalid period: {0}")]
    InvalidPeriod(u64),
    #[error("Wallet is paused")]
    WalletPaused,
    #[error("Already a member: {0}")]
    AlreadyMember(Principal),
    #[error("Proposal not found: {0}")]
    ProposalNotFound(u64),
    #[error("Proposal expired: {0}")]
    ProposalExpired(u64),
    #[error("Proposal already executed: {0}")]
    ProposalExecuted(u64),
    #[error("Proposal {0} already approved by this caller")]
    AlreadyApproved(u64),
    #[error("Arithmetic overflow")]
    Overflow,
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl WalletError {
    /// Stable numeric code for hosts that report errors as integers
    pub fn code(&self) -> u32 {
        match self {
            WalletError::Unauthorized => 100,
            WalletError::OverLimit => 101,
            WalletError::InsufficientBalance { .. } => 102,
            WalletError::InvalidAmount => 103,
            WalletError::InvalidCategory(_) => 104,
            WalletError::MaxMembersExceeded { .. } => 105,
            WalletError::MemberNotFound(_) => 106,
            WalletError::InvalidRole(_) => 107,
            WalletError::ApprovalRequired => 109,
            WalletError::InvalidMemo { .. } => 110,
            WalletError::InvalidPeriod(_) => 111,
            WalletError::WalletPaused => 112,
            WalletError::AlreadyMember(_) => 113,
            WalletError::ProposalNotFound(_) => 114,
            WalletError::ProposalExpired(_) => 115,
            WalletError::ProposalExecuted(_) => 116,
            WalletError::AlreadyApproved(_) => 117,
            WalletError::Overflow => 118,
            WalletError::InvalidConfig(_) => 119,
        }
    }
}
