//! Multi-approval withdrawal proposals
//!
//! A member whose direct allowance is exhausted proposes a withdrawal; once
//! enough approvals arrive the payout runs in the same call. Proposals expire
//! implicitly when the host height reaches `expires_at`.

use crate::wallet::error::WalletError;
use crate::wallet::ledger::FamilyWallet;
use crate::wallet::types::{
    check_memo, Amount, Category, Context, Height, Period, Principal, EXECUTION_USAGE_PERIOD,
    PROPOSAL_EXPIRY,
};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a proposal, derived from its fields and the height
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProposalStatus {
    /// Still collecting approvals
    Pending,
    /// Threshold reached (funds moved unless the pool was short)
    Executed,
    /// Expiry height passed before the threshold was reached
    Expired,
}

/// A withdrawal request awaiting approvals
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Proposal {
    pub id: u64,
    pub amount: Amount,
    pub category: Category,
    pub memo: String,
    pub proposer: Principal,
    pub approvals: u32,
    /// Every approving caller, in order (repeats included)
    pub approvers: Vec<Principal>,
    pub executed: bool,
    pub created_at: Height,
    pub expires_at: Height,
}

impl Proposal {
    pub fn status(&self, height: Height) -> ProposalStatus {
        if self.executed {
            ProposalStatus::Executed
        } else if height >= self.expires_at {
            ProposalStatus::Expired
        } else {
            ProposalStatus::Pending
        }
    }

    pub fn is_expired(&self, height: Height) -> bool {
        height >= self.expires_at
    }

    pub fn approved_by(&self, who: &Principal) -> bool {
        self.approvers.iter().any(|a| a == who)
    }
}

/// Result of a successful approval
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// Counted; threshold not reached yet
    Pending { approvals: u32 },
    /// Threshold reached and the payout went through
    Executed { amount: Amount },
    /// Threshold reached but the pool could not cover the amount.
    /// The proposal is closed as executed and no funds moved.
    ExecutionSkipped { amount: Amount, available: Amount },
}

impl FamilyWallet {
    /// Open a proposal for an above-limit withdrawal
    ///
    /// Returns the new proposal id. Proposals can be created while the wallet
    /// is paused.
    pub fn create_proposal(
        &mut self,
        ctx: &Context,
        amount: Amount,
        category: &str,
        memo: &str,
        period: u64,
    ) -> Result<u64, WalletError> {
        if amount == 0 {
            return Err(WalletError::InvalidAmount);
        }
        check_memo(memo)?;
        let category: Category = category.parse()?;
        // Validated only; payouts are always booked against the weekly window
        Period::try_from(period)?;
        self.require_active(&ctx.caller)?;

        let expires_at = ctx
            .height
            .checked_add(PROPOSAL_EXPIRY)
            .ok_or(WalletError::Overflow)?;
        let id = self.next_proposal_id;
        let next_id = id.checked_add(1).ok_or(WalletError::Overflow)?;

        let proposal = Proposal {
            id,
            amount,
            category,
            memo: memo.to_string(),
            proposer: ctx.caller.clone(),
            approvals: 0,
            approvers: Vec::new(),
            executed: false,
            created_at: ctx.height,
            expires_at,
        };
        self.proposals.insert(id, proposal);
        self.next_proposal_id = next_id;

        log::info!(
            "Proposal {} created by {}: {} for {} (expires at {})",
            id,
            ctx.caller,
            amount,
            category,
            expires_at
        );
        Ok(id)
    }

    /// Add one approval to a proposal, executing it at the threshold
    ///
    /// Any active member may approve, including the proposer. Unless the
    /// wallet requires distinct approvers, the same caller may approve more
    /// than once.
    pub fn approve_proposal(
        &mut self,
        ctx: &Context,
        id: u64,
    ) -> Result<ApprovalOutcome, WalletError> {
        let proposal = self
            .proposals
            .get(&id)
            .ok_or(WalletError::ProposalNotFound(id))?;
        self.require_active(&ctx.caller)?;

        if proposal.executed {
            return Err(WalletError::ProposalExecuted(id));
        }

        if proposal.is_expired(ctx.height) {
            return Err(WalletError::ProposalExpired(id));
        }

        if self.config.require_distinct_approvers && proposal.approved_by(&ctx.caller) {
            return Err(WalletError::AlreadyApproved(id));
        }

        let approvals = proposal
            .approvals
            .checked_add(1)
            .ok_or(WalletError::Overflow)?;
        let reached = approvals >= self.config.approval_threshold;
        let (amount, category, proposer) = (
            proposal.amount,
            proposal.category,
            proposal.proposer.clone(),
        );

        if let Some(proposal) = self.proposals.get_mut(&id) {
            proposal.approvals = approvals;
            proposal.approvers.push(ctx.caller.clone());
            proposal.executed = reached;
        }

        log::info!(
            "Proposal {} approved by {} ({}/{})",
            id,
            ctx.caller,
            approvals,
            self.config.approval_threshold
        );

        if !reached {
            return Ok(ApprovalOutcome::Pending { approvals });
        }

        Ok(self.execute_approved_withdrawal(id, amount, category, &proposer))
    }

    fn execute_approved_withdrawal(
        &mut self,
        id: u64,
        amount: Amount,
        category: Category,
        proposer: &Principal,
    ) -> ApprovalOutcome {
        if self.total_balance < amount {
            log::warn!(
                "Proposal {} closed without payout: pool has {}, needs {}",
                id,
                self.total_balance,
                amount
            );
            return ApprovalOutcome::ExecutionSkipped {
                amount,
                available: self.total_balance,
            };
        }

        self.total_balance -= amount;
        self.debit_balance(proposer, amount);
        self.record_usage(proposer, category, EXECUTION_USAGE_PERIOD, amount);

        log::info!("Proposal {} executed: {} paid to {}", id, amount, proposer);
        ApprovalOutcome::Executed { amount }
    }

    /// Get a proposal by id
    pub fn get_proposal(&self, id: u64) -> Option<&Proposal> {
        self.proposals.get(&id)
    }

    /// Derived status of a proposal at `height`
    pub fn proposal_status(&self, id: u64, height: Height) -> Option<ProposalStatus> {
        self.proposals.get(&id).map(|p| p.status(height))
    }

    /// All proposals, ordered by id
    pub fn proposals(&self) -> Vec<&Proposal> {
        self.proposals.values().collect()
    }

    /// Id the next successful proposal will receive
    pub fn next_proposal_id(&self) -> u64 {
        self.next_proposal_id
    }
}
