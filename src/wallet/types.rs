//! Core value types shared by the wallet ledger
//!
//! Identities, roles, spending categories and limit periods, plus the
//! structured key used for the limit and usage tables.

use crate::wallet::error::WalletError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Block height supplied by the host
pub type Height = u64;

/// Amount in the smallest currency unit
pub type Amount = u64;

/// Per-member contribution balance (can go negative after proposal payouts)
pub type Balance = i128;

/// Maximum memo length in characters
pub const MAX_MEMO_LEN: usize = 34;

/// Heights a proposal stays approvable after creation
pub const PROPOSAL_EXPIRY: Height = 5040;

/// Period that proposal payouts are booked against
pub const EXECUTION_USAGE_PERIOD: Period = Period::Week;

/// Opaque caller identity
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Principal {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for Principal {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Who is calling, and at what height
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Context {
    pub caller: Principal,
    pub height: Height,
}

impl Context {
    pub fn new(caller: impl Into<Principal>, height: Height) -> Self {
        Self {
            caller: caller.into(),
            height,
        }
    }
}

/// Authority level of a wallet member
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative authority, withdraws without limits
    Owner,
    /// Withdraws within limits, proposes above them
    Member,
    /// Read-only participant, may still propose and approve
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Member => "member",
            Role::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Role::Owner),
            "member" => Ok(Role::Member),
            "viewer" => Ok(Role::Viewer),
            other => Err(WalletError::InvalidRole(other.to_string())),
        }
    }
}

/// Spending category
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Groceries,
    Fun,
    Bills,
    Transport,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Groceries,
        Category::Fun,
        Category::Bills,
        Category::Transport,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Groceries => "groceries",
            Category::Fun => "fun",
            Category::Bills => "bills",
            Category::Transport => "transport",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| WalletError::InvalidCategory(s.to_string()))
    }
}

/// Spending-limit window, in height units
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub enum Period {
    Day,
    Week,
    Month,
}

impl Period {
    pub const ALL: [Period; 3] = [Period::Day, Period::Week, Period::Month];

    /// Window length in seconds-equivalent units
    pub fn seconds(&self) -> u64 {
        match self {
            Period::Day => 86_400,
            Period::Week => 604_800,
            Period::Month => 2_592_000,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.seconds())
    }
}

impl TryFrom<u64> for Period {
    type Error = WalletError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Period::ALL
            .iter()
            .copied()
            .find(|p| p.seconds() == value)
            .ok_or(WalletError::InvalidPeriod(value))
    }
}

impl From<Period> for u64 {
    fn from(period: Period) -> Self {
        period.seconds()
    }
}

/// Registry entry for one identity
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub role: Role,
    /// Height at which the record was created
    pub joined_at: Height,
    pub active: bool,
}

impl Member {
    pub fn new(role: Role, joined_at: Height) -> Self {
        Self {
            role,
            joined_at,
            active: true,
        }
    }

    pub fn is_active_owner(&self) -> bool {
        self.active && self.role == Role::Owner
    }
}

/// Key of the limit and usage tables
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LimitKey {
    pub who: Principal,
    pub category: Category,
    pub period: Period,
}

impl LimitKey {
    pub fn new(who: &Principal, category: Category, period: Period) -> Self {
        Self {
            who: who.clone(),
            category,
            period,
        }
    }
}

/// Validate a memo against the length cap
pub fn check_memo(memo: &str) -> Result<(), WalletError> {
    let len = memo.chars().count();
    if len > MAX_MEMO_LEN {
        return Err(WalletError::InvalidMemo { len });
    }
    Ok(())
}
