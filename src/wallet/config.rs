//! Wallet configuration

use crate::wallet::error::WalletError;
use serde::{Deserialize, Serialize};

/// Default cap on active members
pub const DEFAULT_MAX_MEMBERS: usize = 10;

/// Default approvals needed to execute a proposal
pub const DEFAULT_APPROVAL_THRESHOLD: u32 = 2;

/// Parameters fixed when a wallet is created
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Cap on active members; only first-time depositors are checked
    pub max_members: usize,
    /// Approvals needed before a proposal executes
    pub approval_threshold: u32,
    /// Reject repeat approvals of a proposal from the same caller
    pub require_distinct_approvers: bool,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            max_members: DEFAULT_MAX_MEMBERS,
            approval_threshold: DEFAULT_APPROVAL_THRESHOLD,
            require_distinct_approvers: false,
        }
    }
}

impl WalletConfig {
    pub fn validate(&self) -> Result<(), WalletError> {
        if self.max_members == 0 {
            return Err(WalletError::InvalidConfig(
                "max_members must be at least 1".to_string(),
            ));
        }

        if self.approval_threshold == 0 {
            return Err(WalletError::InvalidConfig(
                "approval_threshold must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
