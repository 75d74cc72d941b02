// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tollgate - metered, budget-aware calls to AI providers.
//!
//! This is the binary entry point.

mod budget;
mod call;
mod sessions;
mod shutdown;
mod watch;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tollgate_config::TollgateConfig;
use tollgate_core::{Scope, TollgateError};
use tollgate_storage::Database;

/// Tollgate - metered, budget-aware calls to AI providers.
#[derive(Parser, Debug)]
#[command(name = "tollgate", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one metered call through a profile.
    Call {
        /// Profile key from `[[profiles]]`.
        profile: String,
        /// File whose contents are sent as the payload.
        #[arg(long)]
        payload: Option<PathBuf>,
        #[arg(long, default_value = "")]
        project: String,
        #[arg(long, default_value = "")]
        branch: String,
        #[arg(long = "task", default_value = "")]
        task_type: String,
        /// Expected cost in USD for the budget pre-flight check.
        #[arg(long, default_value_t = 0.0)]
        planned_usd: f64,
    },
    /// Manage budgets.
    Budget {
        #[command(subcommand)]
        action: BudgetCommand,
    },
    /// List recent sessions.
    Sessions {
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Poll budgets and print new alerts until interrupted.
    Watch {
        /// Seconds between polls.
        #[arg(long, default_value_t = 30)]
        interval: u64,
        /// Print one JSON object per event.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
enum BudgetCommand {
    /// Create a budget for the current period.
    Create {
        /// global, project or profile.
        scope: Scope,
        #[arg(default_value = "")]
        target: String,
        #[arg(long)]
        daily: f64,
        #[arg(long)]
        cap: f64,
    },
    /// Show status of one budget, or all budgets.
    Status {
        scope: Option<Scope>,
        #[arg(default_value = "")]
        target: String,
    },
    /// Ask whether a planned spend fits.
    Check {
        scope: Scope,
        #[arg(default_value = "")]
        target: String,
        #[arg(long)]
        amount: f64,
    },
    /// Change the limits of a budget by id.
    SetLimits {
        id: String,
        #[arg(long)]
        daily: f64,
        #[arg(long)]
        cap: f64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => tollgate_config::load_and_validate_path(path),
        None => tollgate_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            tollgate_config::render_errors(&errors);
            std::process::exit(2);
        }
    };

    init_tracing(&config.agent.log_level);
    tollgate_agent::metrics::register_metrics();

    match run(cli.command, config).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("tollgate: {e}");
            std::process::exit(1);
        }
    }
}

/// Dispatch a subcommand. `Ok(false)` means it ran but reported failure.
async fn run(command: Commands, config: TollgateConfig) -> Result<bool, TollgateError> {
    let db = Database::from_config(&config.storage).await?;

    let outcome = match command {
        Commands::Call {
            profile,
            payload,
            project,
            branch,
            task_type,
            planned_usd,
        } => {
            let args = call::CallArgs {
                profile,
                payload,
                project,
                branch,
                task_type,
                planned_usd,
            };
            call::run_call(&config, db.clone(), args).await?
        }
        Commands::Budget { action } => budget::run_budget(&config, db.clone(), action).await?,
        Commands::Sessions { limit } => {
            sessions::run_sessions(&config, db.clone(), limit).await?;
            true
        }
        Commands::Watch { interval, json } => {
            watch::run_watch(&config, db.clone(), interval, json).await?;
            true
        }
    };

    db.close().await?;
    Ok(outcome)
}

/// Initializes the tracing subscriber with the given log level.
///
/// Logs go to stderr so command output on stdout stays clean.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tollgate={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
