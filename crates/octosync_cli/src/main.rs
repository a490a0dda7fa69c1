//! octosync CLI - scheduled GitHub activity mirroring.

mod commands;
mod config;
mod github;
mod shutdown;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "octosync")]
#[command(version)]
#[command(about = "Mirror GitHub repository activity into a local database")]
#[command(
    long_about = "octosync tracks configured repositories and organizations on a cron schedule, \
mirroring issues, pull requests, assignees and contributors into a relational \
database. Each repository keeps a durable checkpoint, so interrupted runs \
resume where they left off."
)]
#[command(after_long_help = r#"EXAMPLES
    Run the sync loop with the configured schedule:
        $ octosync start

    Run with an explicit token and a five-minute schedule:
        $ octosync start -t ghp_xxx -c "0 */5 * * * *"

    Reinstall settings after editing the config, keeping checkpoints:
        $ octosync restart

    Apply pending migrations:
        $ octosync migrate up

CONFIGURATION
    octosync reads configuration from:
      1. ~/.config/octosync/config.toml (or $XDG_CONFIG_HOME/octosync/config.toml)
      2. ./octosync.toml
      3. Environment variables (OCTOSYNC_* prefix)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    OCTOSYNC_DATABASE_URL     Database connection string (default: ~/.local/state/octosync/octosync.db)
    OCTOSYNC_SOURCE_TOKEN     GitHub personal access token
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by the run commands.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct RunOptions {
    /// GitHub API token (overrides config)
    #[arg(short = 't', long)]
    pub(crate) token: Option<String>,

    /// Cron schedule with seconds granularity (overrides config)
    #[arg(short = 'c', long)]
    pub(crate) cron: Option<String>,

    /// Fetch attempts per repository and cycle (overrides config)
    #[arg(short = 'r', long)]
    pub(crate) retry: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduled sync loop
    Start {
        #[command(flatten)]
        opts: RunOptions,
    },
    /// Reinstall settings and run the loop again, keeping checkpoints
    Restart {
        #[command(flatten)]
        opts: RunOptions,
    },
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Rollback the last migration
    Down,
    /// Show migration status
    Status,
    /// Fresh install - drop all tables and reapply migrations
    Fresh,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("octosync=info,octosync_cli=info"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let config = config::Config::load();
    let cli = Cli::parse();

    let database_url = config
        .database_url()
        .expect("Failed to determine database URL - this should not happen");

    // Ensure the database directory exists for SQLite
    if database_url.starts_with("sqlite://") {
        let db_path = database_url.trim_start_matches("sqlite://");
        // Strip query parameters (e.g., ?mode=rwc) before path operations
        let db_path = db_path.split('?').next().unwrap_or(db_path);
        let db_path = std::path::Path::new(db_path);

        if db_path.is_relative() && !db_path.as_os_str().is_empty() {
            tracing::warn!(
                "Database path '{}' is relative - behavior depends on current directory. \
                 Consider using an absolute path.",
                db_path.display()
            );
        }

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    match cli.command {
        Commands::Start { opts } => {
            commands::run::handle_run(opts, false, &config, &database_url).await?;
        }
        Commands::Restart { opts } => {
            commands::run::handle_run(opts, true, &config, &database_url).await?;
        }
        Commands::Migrate { action } => {
            commands::migrate::handle_migrate(action, &database_url).await?;
        }
    }

    Ok(())
}
