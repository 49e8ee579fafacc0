//! CLI entry and dispatch.

use adminctl_core::api::{JobFilter, PageQuery, UserFilter};
use adminctl_core::config;
use adminctl_core::logging;
use adminctl_types::{KycDecision, ModerationAction};
use anyhow::{Context, Result};
use clap::Parser;

mod commands;

use commands::output::Output;

#[derive(Parser)]
#[command(name = "adminctl")]
#[command(version)]
#[command(about = "Marketplace admin console")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend origin, e.g. https://api.example.com (overrides config)
    #[arg(long, global = true, env = "ADMINCTL_BASE_URL", value_name = "URL")]
    base_url: Option<String>,

    /// Print raw JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Pagination shared by list commands.
#[derive(clap::Args, Debug, Clone, Copy)]
struct PageArgs {
    /// Page number (1-based)
    #[arg(long, default_value_t = 1)]
    page: u32,

    /// Items per page
    #[arg(long, default_value_t = 10)]
    limit: u32,
}

impl From<PageArgs> for PageQuery {
    fn from(args: PageArgs) -> Self {
        PageQuery::new(args.page, args.limit)
    }
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in with admin credentials
    Login {
        /// Email, phone or username
        #[arg(long)]
        identifier: String,

        /// Read the password from stdin even if ADMINCTL_PASSWORD is set
        #[arg(long)]
        password_stdin: bool,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in admin
    Whoami,
    /// Show session state and token expiry
    Status,
    /// Platform counters
    Dashboard,
    /// Platform metrics, optionally for a date range
    Metrics {
        /// Start date (YYYY-MM-DD)
        #[arg(long, requires = "end")]
        start: Option<String>,
        /// End date (YYYY-MM-DD)
        #[arg(long, requires = "start")]
        end: Option<String>,
    },
    /// Manage users
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Browse jobs
    Jobs {
        #[command(subcommand)]
        command: JobCommands,
    },
    /// Review and resolve disputes
    Disputes {
        #[command(subcommand)]
        command: DisputeCommands,
    },
    /// Review KYC submissions
    Kyc {
        #[command(subcommand)]
        command: KycCommands,
    },
    /// Moderate flagged content
    Content {
        #[command(subcommand)]
        command: ContentCommands,
    },
    /// Payment history and reports
    Payments {
        #[command(subcommand)]
        command: PaymentCommands,
    },
    /// Browse reviews
    Reviews {
        #[command(subcommand)]
        command: ReviewCommands,
    },
    /// Manage badges
    Badges {
        #[command(subcommand)]
        command: BadgeCommands,
    },
    /// Send a raw authenticated request
    Request {
        /// HTTP method (GET, POST, PUT, ...)
        #[arg(value_name = "METHOD")]
        method: String,
        /// Path below the API prefix, e.g. /admin/users?limit=5
        #[arg(value_name = "PATH")]
        path: String,
        /// JSON request body
        #[arg(long, value_name = "JSON")]
        data: Option<String>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum UserCommands {
    /// List users
    List {
        #[command(flatten)]
        page: PageArgs,
        /// Filter by role (admin, employer, worker)
        #[arg(long)]
        role: Option<String>,
        /// Filter by status (active, inactive, verified, ...)
        #[arg(long)]
        status: Option<String>,
    },
    /// Show one user
    Show {
        #[arg(value_name = "USER_ID")]
        id: i64,
    },
    /// Mark a user as verified
    Verify {
        #[arg(value_name = "USER_ID")]
        id: i64,
    },
    /// Deactivate a user account
    Deactivate {
        #[arg(value_name = "USER_ID")]
        id: i64,
    },
    /// Suspend a user for a number of days
    Suspend {
        #[arg(value_name = "USER_ID")]
        id: i64,
        /// Suspension length in days
        #[arg(long)]
        days: u32,
        /// Reason shown to the user
        #[arg(long)]
        reason: String,
    },
}

#[derive(clap::Subcommand)]
enum JobCommands {
    /// List jobs
    List {
        #[command(flatten)]
        page: PageArgs,
        /// Filter by status (open, in_progress, completed, cancelled)
        #[arg(long)]
        status: Option<String>,
        /// Only jobs with (true) or without (false) a dispute
        #[arg(long)]
        has_dispute: Option<bool>,
        /// Free-text search
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one job
    Show {
        #[arg(value_name = "JOB_ID")]
        id: i64,
    },
}

#[derive(clap::Subcommand)]
enum DisputeCommands {
    /// List disputes
    List {
        #[command(flatten)]
        page: PageArgs,
        /// Filter by status (open, resolved, ...)
        #[arg(long)]
        status: Option<String>,
    },
    /// Resolve a dispute
    Resolve {
        #[arg(value_name = "DISPUTE_ID")]
        id: i64,
        /// Resolution text
        #[arg(long)]
        resolution: String,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum DecisionArg {
    Approved,
    Rejected,
}

impl From<DecisionArg> for KycDecision {
    fn from(arg: DecisionArg) -> Self {
        match arg {
            DecisionArg::Approved => KycDecision::Approved,
            DecisionArg::Rejected => KycDecision::Rejected,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ModerationArg {
    Approved,
    Removed,
}

impl From<ModerationArg> for ModerationAction {
    fn from(arg: ModerationArg) -> Self {
        match arg {
            ModerationArg::Approved => ModerationAction::Approved,
            ModerationArg::Removed => ModerationAction::Removed,
        }
    }
}

#[derive(clap::Subcommand)]
enum KycCommands {
    /// List pending submissions
    Pending {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Approve or reject a submission
    Verify {
        #[arg(value_name = "SUBMISSION_ID")]
        id: i64,
        #[arg(long, value_enum)]
        decision: DecisionArg,
        /// Reviewer notes
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(clap::Subcommand)]
enum ContentCommands {
    /// List flagged content
    List {
        #[command(flatten)]
        page: PageArgs,
        /// Filter by status (pending, approved, removed)
        #[arg(long)]
        status: Option<String>,
    },
    /// Approve or remove flagged content
    Moderate {
        #[arg(value_name = "CONTENT_ID")]
        id: i64,
        #[arg(long, value_enum)]
        action: ModerationArg,
        /// Reason recorded with the action
        #[arg(long)]
        reason: Option<String>,
    },
}

#[derive(clap::Subcommand)]
enum PaymentCommands {
    /// List payments
    History {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Aggregated payment reports
    Reports,
}

#[derive(clap::Subcommand)]
enum ReviewCommands {
    /// List reviews
    List {
        #[command(flatten)]
        page: PageArgs,
    },
}

#[derive(clap::Subcommand)]
enum BadgeCommands {
    /// List badges
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Create a badge
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        /// How the badge is earned
        #[arg(long)]
        criteria: String,
        #[arg(long, value_name = "URL")]
        image_url: Option<String>,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Save the backend origin to the config file
    SetUrl {
        #[arg(value_name = "URL")]
        url: String,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let mut config = config::Config::load().context("load config")?;
    let _log_guard = logging::init(&config.log, cli.verbose).context("init logging")?;

    let Cli {
        command,
        base_url,
        json,
        verbose: _,
    } = cli;

    // Validated when a client is built, so config commands still work with a
    // bad URL.
    if let Some(url) = base_url.filter(|url| !url.trim().is_empty()) {
        config.base_url = url;
    }
    let out = Output::new(json);

    match command {
        Commands::Login {
            identifier,
            password_stdin,
        } => commands::auth::login(&config, &identifier, password_stdin).await,
        Commands::Logout => commands::auth::logout(&config),
        Commands::Whoami => commands::auth::whoami(&config, &out).await,
        Commands::Status => commands::auth::status(&config, &out).await,

        Commands::Dashboard => commands::dashboard::stats(&config, &out).await,
        Commands::Metrics { start, end } => {
            commands::dashboard::metrics(&config, &out, start.as_deref(), end.as_deref()).await
        }

        Commands::Users { command } => match command {
            UserCommands::List { page, role, status } => {
                let filter = UserFilter { role, status };
                commands::users::list(&config, &out, page.into(), &filter).await
            }
            UserCommands::Show { id } => commands::users::show(&config, &out, id).await,
            UserCommands::Verify { id } => commands::users::verify(&config, &out, id).await,
            UserCommands::Deactivate { id } => {
                commands::users::deactivate(&config, &out, id).await
            }
            UserCommands::Suspend { id, days, reason } => {
                commands::users::suspend(&config, &out, id, days, &reason).await
            }
        },

        Commands::Jobs { command } => match command {
            JobCommands::List {
                page,
                status,
                has_dispute,
                search,
            } => {
                let filter = JobFilter {
                    status,
                    has_dispute,
                    search,
                };
                commands::jobs::list(&config, &out, page.into(), &filter).await
            }
            JobCommands::Show { id } => commands::jobs::show(&config, &out, id).await,
        },

        Commands::Disputes { command } => match command {
            DisputeCommands::List { page, status } => {
                commands::disputes::list(&config, &out, page.into(), status.as_deref()).await
            }
            DisputeCommands::Resolve { id, resolution } => {
                commands::disputes::resolve(&config, &out, id, &resolution).await
            }
        },

        Commands::Kyc { command } => match command {
            KycCommands::Pending { page } => {
                commands::kyc::pending(&config, &out, page.into()).await
            }
            KycCommands::Verify {
                id,
                decision,
                notes,
            } => {
                commands::kyc::verify(&config, &out, id, decision.into(), notes.as_deref()).await
            }
        },

        Commands::Content { command } => match command {
            ContentCommands::List { page, status } => {
                commands::content::list(&config, &out, page.into(), status.as_deref()).await
            }
            ContentCommands::Moderate { id, action, reason } => {
                commands::content::moderate(&config, &out, id, action.into(), reason.as_deref())
                    .await
            }
        },

        Commands::Payments { command } => match command {
            PaymentCommands::History { page } => {
                commands::payments::history(&config, &out, page.into()).await
            }
            PaymentCommands::Reports => commands::payments::reports(&config, &out).await,
        },

        Commands::Reviews { command } => match command {
            ReviewCommands::List { page } => {
                commands::reviews::list(&config, &out, page.into()).await
            }
        },

        Commands::Badges { command } => match command {
            BadgeCommands::List { page } => {
                commands::badges::list(&config, &out, page.into()).await
            }
            BadgeCommands::Create {
                name,
                description,
                criteria,
                image_url,
            } => {
                let badge = adminctl_types::NewBadge {
                    name,
                    description,
                    image_url,
                    criteria,
                };
                commands::badges::create(&config, &out, &badge).await
            }
        },

        Commands::Request { method, path, data } => {
            commands::request::run(&config, &method, &path, data.as_deref()).await
        }

        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::SetUrl { url } => commands::config::set_url(&url),
        },
    }
}
