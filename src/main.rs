//! Family Wallet CLI Application
//!
//! A command-line host for the shared family wallet. The caller identity and
//! block height are supplied per invocation; the ledger lives in a JSON
//! snapshot inside the data directory.

use clap::{Parser, Subcommand};
use family_wallet::cli::{self, AppState};
use family_wallet::wallet::WalletConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "family-wallet")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "A shared family wallet with spending limits and approvals", long_about = None)]
struct Cli {
    /// Data directory for wallet storage
    #[arg(short, long, default_value = ".family_wallet", global = true)]
    data_dir: PathBuf,

    /// Identity invoking the command
    #[arg(short, long, global = true)]
    caller: Option<String>,

    /// Block height for this call (defaults to the last one seen)
    #[arg(long, global = true)]
    height: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new wallet
    Init {
        /// Owner identity
        #[arg(short, long)]
        owner: String,

        /// Cap on active members
        #[arg(long, default_value = "10")]
        max_members: usize,

        /// Approvals needed to execute a proposal
        #[arg(long, default_value = "2")]
        threshold: u32,

        /// Reject repeat approvals from the same member
        #[arg(long)]
        distinct_approvers: bool,
    },

    /// Deposit into the pool
    Deposit {
        /// Amount to deposit
        #[arg(short, long)]
        amount: u64,
    },

    /// Withdraw from the pool
    Withdraw {
        #[arg(short, long)]
        amount: u64,

        /// Spending category (groceries, fun, bills, transport, other)
        #[arg(short = 'k', long)]
        category: String,

        /// Limit period in seconds (86400, 604800, 2592000)
        #[arg(short, long, default_value = "604800")]
        period: u64,

        /// Short note, at most 34 characters
        #[arg(short, long, default_value = "")]
        memo: String,
    },

    /// Membership operations
    Member {
        #[command(subcommand)]
        action: MemberCommands,
    },

    /// Spending limit operations
    Limit {
        #[command(subcommand)]
        action: LimitCommands,
    },

    /// Withdrawal proposal operations
    Proposal {
        #[command(subcommand)]
        action: ProposalCommands,
    },

    /// Halt deposits and withdrawals
    Pause,

    /// Resume deposits and withdrawals
    Unpause,

    /// Display wallet information
    Status,
}

#[derive(Subcommand)]
enum MemberCommands {
    /// Add a member or viewer
    Add {
        #[arg(short, long)]
        who: String,

        /// member or viewer
        #[arg(short, long, default_value = "member")]
        role: String,
    },

    /// Deactivate a member
    Remove {
        #[arg(short, long)]
        who: String,
    },

    /// Reactivate a removed member
    Reactivate {
        #[arg(short, long)]
        who: String,
    },

    /// Show one member
    Show {
        #[arg(short, long)]
        who: String,
    },

    /// List all members
    List,
}

#[derive(Subcommand)]
enum LimitCommands {
    /// Set a spending limit
    Set {
        #[arg(short, long)]
        who: String,

        #[arg(short = 'k', long)]
        category: String,

        #[arg(short, long)]
        limit: u64,

        #[arg(short, long, default_value = "604800")]
        period: u64,
    },

    /// Reset usage to zero
    Reset {
        #[arg(short, long)]
        who: String,

        #[arg(short = 'k', long)]
        category: String,

        #[arg(short, long, default_value = "604800")]
        period: u64,
    },

    /// Show limit, usage and remaining allowance
    Show {
        #[arg(short, long)]
        who: String,

        #[arg(short = 'k', long)]
        category: String,

        #[arg(short, long, default_value = "604800")]
        period: u64,
    },
}

#[derive(Subcommand)]
enum ProposalCommands {
    /// Propose an above-limit withdrawal
    Create {
        #[arg(short, long)]
        amount: u64,

        #[arg(short = 'k', long)]
        category: String,

        #[arg(short, long, default_value = "604800")]
        period: u64,

        #[arg(short, long, default_value = "")]
        memo: String,
    },

    /// Approve a proposal
    Approve {
        #[arg(short, long)]
        id: u64,
    },

    /// Show one proposal
    Show {
        #[arg(short, long)]
        id: u64,
    },

    /// List all proposals
    List,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Handle init command separately (there is no state yet)
    if let Commands::Init {
        owner,
        max_members,
        threshold,
        distinct_approvers,
    } = &cli.command
    {
        let config = WalletConfig {
            max_members: *max_members,
            approval_threshold: *threshold,
            require_distinct_approvers: *distinct_approvers,
        };
        return cli::cmd_init(&cli.data_dir, owner, cli.height.unwrap_or(0), config);
    }

    let mut state = AppState::load(cli.data_dir.clone())?;
    let caller = cli.caller.as_deref();
    let read_height = state.read_height(cli.height);

    match cli.command {
        Commands::Init { .. } => unreachable!(),

        Commands::Deposit { amount } => {
            let ctx = state.context(caller, cli.height)?;
            cli::cmd_deposit(&mut state, &ctx, amount)?;
        }

        Commands::Withdraw {
            amount,
            category,
            period,
            memo,
        } => {
            let ctx = state.context(caller, cli.height)?;
            cli::cmd_withdraw(&mut state, &ctx, amount, &memo, &category, period)?;
        }

        Commands::Member { action } => match action {
            MemberCommands::Add { who, role } => {
                let ctx = state.context(caller, cli.height)?;
                cli::cmd_member_add(&mut state, &ctx, &who, &role)?;
            }
            MemberCommands::Remove { who } => {
                let ctx = state.context(caller, cli.height)?;
                cli::cmd_member_remove(&mut state, &ctx, &who)?;
            }
            MemberCommands::Reactivate { who } => {
                let ctx = state.context(caller, cli.height)?;
                cli::cmd_member_reactivate(&mut state, &ctx, &who)?;
            }
            MemberCommands::Show { who } => {
                cli::cmd_member_show(&state, &who)?;
            }
            MemberCommands::List => {
                cli::cmd_member_list(&state)?;
            }
        },

        Commands::Limit { action } => match action {
            LimitCommands::Set {
                who,
                category,
                limit,
                period,
            } => {
                let ctx = state.context(caller, cli.height)?;
                cli::cmd_limit_set(&mut state, &ctx, &who, &category, limit, period)?;
            }
            LimitCommands::Reset {
                who,
                category,
                period,
            } => {
                let ctx = state.context(caller, cli.height)?;
                cli::cmd_limit_reset(&mut state, &ctx, &who, &category, period)?;
            }
            LimitCommands::Show {
                who,
                category,
                period,
            } => {
                cli::cmd_limit_show(&state, &who, &category, period)?;
            }
        },

        Commands::Proposal { action } => match action {
            ProposalCommands::Create {
                amount,
                category,
                period,
                memo,
            } => {
                let ctx = state.context(caller, cli.height)?;
                cli::cmd_proposal_create(&mut state, &ctx, amount, &category, &memo, period)?;
            }
            ProposalCommands::Approve { id } => {
                let ctx = state.context(caller, cli.height)?;
                cli::cmd_proposal_approve(&mut state, &ctx, id)?;
            }
            ProposalCommands::Show { id } => {
                cli::cmd_proposal_show(&state, id, read_height)?;
            }
            ProposalCommands::List => {
                cli::cmd_proposal_list(&state, read_height)?;
            }
        },

        Commands::Pause => {
            let ctx = state.context(caller, cli.height)?;
            cli::cmd_pause(&mut state, &ctx, true)?;
        }

        Commands::Unpause => {
            let ctx = state.context(caller, cli.height)?;
            cli::cmd_pause(&mut state, &ctx, false)?;
        }

        Commands::Status => {
            cli::cmd_status(&state)?;
        }
    }

    Ok(())
}
