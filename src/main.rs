mod commands;
mod date_range;
mod render;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use devcal_core::bridge::Bridge;
use devcal_core::config::DevcalConfig;
use devcal_core::store::LocalStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::date_range::DateRange;

#[derive(Parser)]
#[command(name = "devcal")]
#[command(about = "Answer device calendar requests from a local directory of calendars")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the bridge protocol: one JSON request per line on stdin,
    /// one JSON response per line on stdout
    Bridge,
    /// Send a single request and print the response
    Call {
        /// Method name, e.g. "retrieveCalendars"
        method: String,

        /// Arguments as a JSON object
        arguments: Option<String>,
    },
    /// List calendars
    Calendars,
    /// List events, recurring ones expanded
    Events {
        /// Only list events of this calendar (by id)
        #[arg(short, long)]
        calendar: Option<String>,

        /// Show events from this date (YYYY-MM-DD, or "start" for all past events)
        #[arg(long)]
        from: Option<String>,

        /// Show events until this date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },
    /// Show or change whether calendar access is granted
    Permission {
        #[command(subcommand)]
        action: PermissionAction,
    },
}

#[derive(Subcommand)]
enum PermissionAction {
    Grant,
    Deny,
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = DevcalConfig::load().context("Could not load devcal configuration")?;

    match cli.command {
        Commands::Bridge => commands::bridge::run(bridge(&config)).await,
        Commands::Call { method, arguments } => {
            commands::call::run(&bridge(&config), &method, arguments.as_deref())
        }
        Commands::Calendars => commands::calendars::run(&config),
        Commands::Events { calendar, from, to } => {
            let range = DateRange::from_args(from.as_deref(), to.as_deref())
                .map_err(|e| anyhow::anyhow!(e))?;
            commands::events::run(&config, calendar.as_deref(), range)
        }
        Commands::Permission { action } => {
            let permissions = config.permissions();
            match action {
                PermissionAction::Grant => commands::permission::grant(&permissions),
                PermissionAction::Deny => commands::permission::deny(&permissions),
                PermissionAction::Status => commands::permission::status(&permissions),
            }
        }
    }
}

/// Logs go to stderr; stdout belongs to the bridge protocol.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "devcal=info,devcal_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn bridge(config: &DevcalConfig) -> Bridge<LocalStore> {
    Bridge::new(
        config.store(),
        config.permissions(),
        &config.local_account_name,
    )
}
