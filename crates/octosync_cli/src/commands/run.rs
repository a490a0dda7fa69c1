//! The `start` and `restart` commands: run the scheduled sync loop.

use std::sync::Arc;

use octosync::sync::{Orchestrator, SyncSettings};

use crate::config::Config;
use crate::github::GitHubClient;
use crate::shutdown;
use crate::RunOptions;

/// Resolve the effective settings: config file values with CLI flags on top.
fn effective_settings(config: &Config, opts: &RunOptions) -> SyncSettings {
    let mut settings = config.sync_settings();
    if let Some(cron) = &opts.cron {
        settings.schedule = cron.clone();
    }
    if let Some(retry) = opts.retry {
        settings.retry_budget = retry;
    }
    settings
}

pub(crate) async fn handle_run(
    opts: RunOptions,
    restart: bool,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let token = opts
        .token
        .clone()
        .or_else(|| config.source_token())
        .ok_or("No source token configured. Set OCTOSYNC_SOURCE_TOKEN or pass --token.")?;

    let settings = effective_settings(config, &opts);
    if settings.repositories.is_empty() && settings.organizations.is_empty() {
        return Err("Nothing to track. Configure at least one group with repositories or organizations.".into());
    }

    let db = octosync::connect_and_migrate(database_url).await?;
    let client = Arc::new(GitHubClient::new(&token)?);

    let cancel = shutdown::install();
    if restart {
        // Reinstall the settings snapshot over whatever ran before; stored
        // checkpoints stay put and repositories resume where they left off.
        let orchestrator = Orchestrator::new(db, client, SyncSettings::default());
        orchestrator.restart(cancel, settings).await?;
    } else {
        let orchestrator = Orchestrator::new(db, client, settings);
        orchestrator.start(cancel).await?;
    }

    Ok(())
}
