//! CLI commands for the family wallet
//!
//! Implements all command handlers for the CLI interface. Each handler runs
//! one ledger operation against the snapshot on disk and saves on success.

use crate::storage::{Snapshot, Storage, StorageConfig};
use crate::wallet::{
    ApprovalOutcome, Category, Context, FamilyWallet, Height, Period, Principal, WalletConfig,
};
use std::path::{Path, PathBuf};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Application state
pub struct AppState {
    pub storage: Storage,
    pub snapshot: Snapshot,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Load the wallet snapshot from `data_dir`
    pub fn load(data_dir: PathBuf) -> CliResult<Self> {
        let storage = open_storage(&data_dir)?;
        let snapshot = storage.load()?;
        log::debug!("Loaded wallet at height {}", snapshot.height);

        Ok(Self {
            storage,
            snapshot,
            data_dir,
        })
    }

    /// Build the call context, moving the host height forward if requested
    pub fn context(&mut self, caller: Option<&str>, height: Option<Height>) -> CliResult<Context> {
        let caller = caller.ok_or("this command needs --caller")?;
        let height = self.snapshot.advance(height)?;
        Ok(Context::new(caller, height))
    }

    /// Height reads are evaluated at
    pub fn read_height(&self, height: Option<Height>) -> Height {
        height.unwrap_or(self.snapshot.height).max(self.snapshot.height)
    }

    pub fn wallet(&self) -> &FamilyWallet {
        &self.snapshot.wallet
    }

    pub fn wallet_mut(&mut self) -> &mut FamilyWallet {
        &mut self.snapshot.wallet
    }

    /// Save the current state
    pub fn save(&mut self) -> CliResult<()> {
        self.storage.save(&mut self.snapshot)?;
        Ok(())
    }
}

fn open_storage(data_dir: &Path) -> CliResult<Storage> {
    let config = StorageConfig {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    };
    Ok(Storage::new(config)?)
}

fn parse_category(category: &str) -> CliResult<Category> {
    Ok(category.parse::<Category>()?)
}

fn parse_period(period: u64) -> CliResult<Period> {
    Ok(Period::try_from(period)?)
}

/// Initialize a new wallet
pub fn cmd_init(
    data_dir: &Path,
    owner: &str,
    height: Height,
    config: WalletConfig,
) -> CliResult<()> {
    let storage = open_storage(data_dir)?;
    let wallet = FamilyWallet::new(Principal::new(owner), height, config)?;
    let snapshot = storage.create(wallet, height)?;
    let config = snapshot.wallet.config();

    println!("✅ Family wallet initialized!");
    println!("   📁 Data directory: {:?}", data_dir);
    println!("   👑 Owner: {}", owner);
    println!("   👥 Max members: {}", config.max_members);
    println!("   ✍️  Approval threshold: {}", config.approval_threshold);
    if config.require_distinct_approvers {
        println!("   🔒 Distinct approvers required");
    }

    Ok(())
}

/// Deposit into the pool
pub fn cmd_deposit(state: &mut AppState, ctx: &Context, amount: u64) -> CliResult<()> {
    state.wallet_mut().deposit(ctx, amount)?;
    state.save()?;

    println!("💰 Deposited {} from {}", amount, ctx.caller);
    println!(
        "   Pool: {} | Your balance: {}",
        state.wallet().get_total_balance(),
        state.wallet().get_member_balance(&ctx.caller)
    );
    Ok(())
}

/// Withdraw from the pool
pub fn cmd_withdraw(
    state: &mut AppState,
    ctx: &Context,
    amount: u64,
    memo: &str,
    category: &str,
    period: u64,
) -> CliResult<()> {
    state
        .wallet_mut()
        .withdraw(ctx, amount, memo, category, period)?;
    state.save()?;

    println!("📤 Withdrew {} for {} ({})", amount, category, memo);
    println!("   Pool: {}", state.wallet().get_total_balance());
    Ok(())
}

/// Add a member
pub fn cmd_member_add(state: &mut AppState, ctx: &Context, who: &str, role: &str) -> CliResult<()> {
    state
        .wallet_mut()
        .add_member(ctx, Principal::new(who), role)?;
    state.save()?;

    println!("👤 Added {} as {}", who, role);
    Ok(())
}

/// Deactivate a member
pub fn cmd_member_remove(state: &mut AppState, ctx: &Context, who: &str) -> CliResult<()> {
    state.wallet_mut().remove_member(ctx, &Principal::new(who))?;
    state.save()?;

    println!("🚫 Deactivated {}", who);
    Ok(())
}

/// Reactivate a member
pub fn cmd_member_reactivate(state: &mut AppState, ctx: &Context, who: &str) -> CliResult<()> {
    state
        .wallet_mut()
        .reactivate_member(ctx, &Principal::new(who))?;
    state.save()?;

    println!("♻️  Reactivated {}", who);
    Ok(())
}

/// Show one member
pub fn cmd_member_show(state: &AppState, who: &str) -> CliResult<()> {
    let principal = Principal::new(who);
    let Some(member) = state.wallet().get_member(&principal) else {
        println!("❌ {} is not a member", who);
        return Ok(());
    };

    println!("👤 {}", who);
    println!("   ├─ Role: {}", member.role);
    println!("   ├─ Active: {}", member.active);
    println!("   ├─ Joined at: {}", member.joined_at);
    println!(
        "   └─ Balance: {}",
        state.wallet().get_member_balance(&principal)
    );
    Ok(())
}

/// List all members
pub fn cmd_member_list(state: &AppState) -> CliResult<()> {
    let wallet = state.wallet();

    println!(
        "👥 Members ({} active of max {}):",
        wallet.active_member_count(),
        wallet.config().max_members
    );
    for (who, member) in wallet.members() {
        println!(
            "   {} | {} | {} | balance {}",
            who,
            member.role,
            if member.active { "active" } else { "inactive" },
            wallet.get_member_balance(who)
        );
    }
    Ok(())
}

/// Set a spending limit
pub fn cmd_limit_set(
    state: &mut AppState,
    ctx: &Context,
    who: &str,
    category: &str,
    limit: u64,
    period: u64,
) -> CliResult<()> {
    state
        .wallet_mut()
        .set_limit(ctx, Principal::new(who), category, limit, period)?;
    state.save()?;

    println!("📏 Limit for {}: {} per {} on {}", who, limit, period, category);
    Ok(())
}

/// Reset usage
pub fn cmd_limit_reset(
    state: &mut AppState,
    ctx: &Context,
    who: &str,
    category: &str,
    period: u64,
) -> CliResult<()> {
    state
        .wallet_mut()
        .reset_usage(ctx, &Principal::new(who), category, period)?;
    state.save()?;

    println!("🔄 Usage reset for {} on {}/{}", who, category, period);
    Ok(())
}

/// Show limit and usage for a member
pub fn cmd_limit_show(state: &AppState, who: &str, category: &str, period: u64) -> CliResult<()> {
    let principal = Principal::new(who);
    let category = parse_category(category)?;
    let period = parse_period(period)?;
    let wallet = state.wallet();

    let limit = wallet.get_limit(&principal, category, period);
    let used = wallet.get_usage(&principal, category, period).unwrap_or(0);

    println!("📏 {} on {}/{}", who, category, period);
    match limit {
        Some(limit) => println!("   ├─ Limit: {}", limit),
        None => println!("   ├─ Limit: none (proposal required)"),
    }
    println!("   ├─ Used: {}", used);
    println!(
        "   └─ Remaining: {}",
        wallet.remaining_allowance(&principal, category, period)
    );
    Ok(())
}

/// Create a withdrawal proposal
pub fn cmd_proposal_create(
    state: &mut AppState,
    ctx: &Context,
    amount: u64,
    category: &str,
    memo: &str,
    period: u64,
) -> CliResult<()> {
    let id = state
        .wallet_mut()
        .create_proposal(ctx, amount, category, memo, period)?;
    state.save()?;

    let threshold = state.wallet().config().approval_threshold;
    println!("📝 Proposal {} created", id);
    println!("   ├─ Amount: {}", amount);
    println!("   ├─ Category: {}", category);
    println!("   └─ Needs {} approval(s)", threshold);
    Ok(())
}

/// Approve a proposal
pub fn cmd_proposal_approve(state: &mut AppState, ctx: &Context, id: u64) -> CliResult<()> {
    let outcome = state.wallet_mut().approve_proposal(ctx, id)?;
    state.save()?;

    match outcome {
        ApprovalOutcome::Pending { approvals } => {
            let threshold = state.wallet().config().approval_threshold;
            println!("✍️  Proposal {} approved ({}/{})", id, approvals, threshold);
        }
        ApprovalOutcome::Executed { amount } => {
            println!("✅ Proposal {} executed: {} paid out", id, amount);
            println!("   Pool: {}", state.wallet().get_total_balance());
        }
        ApprovalOutcome::ExecutionSkipped { amount, available } => {
            println!("⚠️  Proposal {} closed without payout", id);
            println!("   Needed {}, pool had {}", amount, available);
        }
    }
    Ok(())
}

/// Show one proposal
pub fn cmd_proposal_show(state: &AppState, id: u64, height: Height) -> CliResult<()> {
    let Some(proposal) = state.wallet().get_proposal(id) else {
        println!("❌ Proposal {} not found", id);
        return Ok(());
    };

    println!("📝 Proposal {}", id);
    println!("   ├─ Proposer: {}", proposal.proposer);
    println!("   ├─ Amount: {}", proposal.amount);
    println!("   ├─ Category: {}", proposal.category);
    println!("   ├─ Memo: {}", proposal.memo);
    println!(
        "   ├─ Approvals: {}/{}",
        proposal.approvals,
        state.wallet().config().approval_threshold
    );
    println!("   ├─ Expires at: {}", proposal.expires_at);
    println!("   └─ Status: {:?}", proposal.status(height));
    Ok(())
}

/// List all proposals
pub fn cmd_proposal_list(state: &AppState, height: Height) -> CliResult<()> {
    let proposals = state.wallet().proposals();

    if proposals.is_empty() {
        println!("📭 No proposals yet");
        return Ok(());
    }

    println!("📋 Proposals:");
    for proposal in proposals {
        println!(
            "   #{} | {} | {} | {} | {} approval(s) | {:?}",
            proposal.id,
            proposal.proposer,
            proposal.amount,
            proposal.category,
            proposal.approvals,
            proposal.status(height)
        );
    }
    Ok(())
}

/// Pause or resume the wallet
pub fn cmd_pause(state: &mut AppState, ctx: &Context, pause: bool) -> CliResult<()> {
    state.wallet_mut().pause_wallet(ctx, pause)?;
    state.save()?;

    if pause {
        println!("⏸️  Wallet paused: deposits and withdrawals are halted");
    } else {
        println!("▶️  Wallet resumed");
    }
    Ok(())
}

/// Display wallet info
pub fn cmd_status(state: &AppState) -> CliResult<()> {
    let wallet = state.wallet();
    let config = wallet.config();

    println!("👛 Family Wallet");
    println!("   ├─ Pool: {}", wallet.get_total_balance());
    println!(
        "   ├─ Members: {} active (max {})",
        wallet.active_member_count(),
        config.max_members
    );
    println!("   ├─ Approval threshold: {}", config.approval_threshold);
    println!("   ├─ Proposals: {}", wallet.proposals().len());
    println!("   ├─ Paused: {}", wallet.is_paused());
    println!("   ├─ Height: {}", state.snapshot.height);
    println!(
        "   └─ Saved at: {}",
        state.snapshot.saved_at.format("%Y-%m-%d %H:%M:%S")
    );
    Ok(())
}
