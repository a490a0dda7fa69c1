//! Scheduled, concurrent sync over the tracked repository set.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use backon::Retryable;
use chrono::Utc;
use cron::Schedule;
use sea_orm::DatabaseConnection;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::aggregate;
use crate::entity::repository::split_label;
use crate::retry::RetryConfig;
use crate::source::SourceClient;
use crate::store::errors::StoreError;
use crate::store::{group, organization, repository};

use super::engine::sync_repository;
use super::types::{CycleReport, GroupSpec, RepoFailure, SyncSettings};

/// Lifecycle of an orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    /// Constructed, never started.
    Idle,
    /// The schedule loop is active.
    Running,
    /// The schedule loop exited.
    Stopped,
}

/// Errors surfaced by the orchestrator.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The configured cron expression does not parse.
    #[error("Invalid schedule '{schedule}': {message}")]
    InvalidSchedule { schedule: String, message: String },

    /// The orchestrator is already running.
    #[error("Orchestrator is already running")]
    AlreadyRunning,

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A worker task panicked or was aborted.
    #[error("Sync task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Result type alias for orchestrator operations.
pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Drives cycles over the tracked repository set on a cron schedule.
///
/// The orchestrator owns the settings snapshot for the current run. Replacing
/// the snapshot (via [`Orchestrator::restart`]) never touches stored
/// checkpoints, so repositories keep resuming from their committed positions.
pub struct Orchestrator<C: SourceClient + 'static> {
    db: DatabaseConnection,
    client: Arc<C>,
    settings: Mutex<SyncSettings>,
    state: Mutex<OrchestratorState>,
}

impl<C: SourceClient + 'static> Orchestrator<C> {
    pub fn new(db: DatabaseConnection, client: Arc<C>, settings: SyncSettings) -> Self {
        Self {
            db,
            client,
            settings: Mutex::new(settings),
            state: Mutex::new(OrchestratorState::Idle),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> OrchestratorState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, state: OrchestratorState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }

    fn settings_snapshot(&self) -> SyncSettings {
        self.settings.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Run the schedule loop until cancelled.
    ///
    /// Validates the cron expression up front; an invalid one fails without
    /// changing state.
    pub async fn start(&self, cancel: CancellationToken) -> Result<()> {
        let settings = self.settings_snapshot();
        let schedule =
            Schedule::from_str(&settings.schedule).map_err(|e| OrchestratorError::InvalidSchedule {
                schedule: settings.schedule.clone(),
                message: e.to_string(),
            })?;

        {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if *state == OrchestratorState::Running {
                return Err(OrchestratorError::AlreadyRunning);
            }
            *state = OrchestratorState::Running;
        }
        info!(schedule = %settings.schedule, "sync loop started");

        loop {
            let Some(next) = schedule.upcoming(Utc).next() else {
                warn!("schedule has no upcoming occurrence, stopping");
                break;
            };
            let wait = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }

            match self.run_cycle(&cancel).await {
                Ok(report) => {
                    info!(
                        synced = report.synced.len(),
                        failed = report.failures.len(),
                        "cycle finished"
                    );
                }
                Err(e) => error!(error = %e, "cycle failed"),
            }
        }

        self.set_state(OrchestratorState::Stopped);
        info!("sync loop stopped");
        Ok(())
    }

    /// Install a new settings snapshot and run the schedule loop again.
    ///
    /// Stored checkpoints are untouched, so repositories resume where they
    /// left off.
    pub async fn restart(&self, cancel: CancellationToken, settings: SyncSettings) -> Result<()> {
        *self.settings.lock().unwrap_or_else(|e| e.into_inner()) = settings;
        self.start(cancel).await
    }

    /// Run one cycle over the tracked repository set.
    ///
    /// Repositories are synced concurrently up to the configured limit. Each
    /// repository gets its configured attempt budget; one repository
    /// exhausting it never blocks the others.
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> Result<CycleReport> {
        let settings = self.settings_snapshot();
        let repos = self.tracked_repositories(&settings).await?;
        info!(repos = repos.len(), "cycle started");

        let mut report = CycleReport {
            started_at: Some(Utc::now()),
            ..CycleReport::default()
        };

        let semaphore = Arc::new(Semaphore::new(settings.concurrency.max(1)));
        let retry = RetryConfig::with_budget(settings.retry_budget);
        let mut handles = Vec::with_capacity(repos.len());

        for repo_label in repos {
            let permit = Arc::clone(&semaphore);
            let db = self.db.clone();
            let client = Arc::clone(&self.client);
            let cancel = cancel.clone();
            let retry = retry.clone();

            handles.push(tokio::spawn(async move {
                let _permit = permit.acquire_owned().await.ok();
                let attempts = AtomicU32::new(0);

                let outcome = (|| {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    sync_repository(&db, client.as_ref(), &repo_label, &cancel)
                })
                .retry(retry.into_backoff())
                .when(|e| e.is_retryable())
                .notify(|e, dur| {
                    warn!(repo = %repo_label, error = %e, "retrying in {:?}", dur);
                })
                .await;

                (repo_label, attempts.load(Ordering::SeqCst), outcome)
            }));
        }

        for handle in handles {
            let (repo_label, attempts, outcome) = handle.await?;
            match outcome {
                Ok(stats) => report.synced.push(stats),
                Err(e) => {
                    error!(repo = %repo_label, attempts, error = %e, "repository failed");
                    report.failures.push(RepoFailure {
                        repo_label,
                        attempts,
                        error: e.to_string(),
                    });
                }
            }
        }

        self.update_groups(&settings.groups).await;

        report.finished_at = Some(Utc::now());
        Ok(report)
    }

    /// Maintain group memberships and recompute rollups from the freshly
    /// synced mirror. One group failing its upkeep never blocks the others.
    async fn update_groups(&self, groups: &[GroupSpec]) {
        for spec in groups {
            if let Err(e) = self.update_group(spec).await {
                error!(group = %spec.name, error = %e, "group upkeep failed");
            }
        }
    }

    /// Attach a group's configured members and recompute its rollups.
    /// Repositories and organizations not mirrored yet are skipped; they
    /// attach once a later cycle has synced them.
    async fn update_group(&self, spec: &GroupSpec) -> Result<()> {
        group::ensure(&self.db, &spec.name).await?;

        for label in &spec.repositories {
            let Some((owner, name)) = split_label(label) else {
                warn!(group = %spec.name, repo = %label, "skipping malformed label");
                continue;
            };
            if let Some(node_id) = repository::node_id_by_owner_name(&self.db, owner, name).await? {
                group::add_repository(&self.db, &spec.name, &node_id).await?;
            }
        }

        for org_name in &spec.organizations {
            if let Some(org) = organization::find_by_name(&self.db, org_name).await? {
                group::add_organization(&self.db, &spec.name, &org.node_id).await?;
                aggregate::refresh_organization(&self.db, &org.node_id).await?;
            }
        }

        aggregate::refresh_group(&self.db, &spec.name).await?;
        Ok(())
    }

    /// Resolve the tracked repository set: explicitly configured labels plus
    /// every mirrored repository under a configured organization, deduplicated
    /// in configuration order.
    async fn tracked_repositories(&self, settings: &SyncSettings) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let mut repos = Vec::new();

        for label in &settings.repositories {
            if seen.insert(label.clone()) {
                repos.push(label.clone());
            }
        }
        for owner in &settings.organizations {
            for label in repository::labels_by_owner(&self.db, owner).await? {
                if seen.insert(label.clone()) {
                    repos.push(label);
                }
            }
        }
        Ok(repos)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use chrono::DateTime;

    use crate::db::connect_and_migrate;
    use crate::source::{SourceError, SourcePage};
    use crate::store::checkpoint::{self, Checkpoint};

    use super::*;

    /// Succeeds or fails per repository label, counting fetches.
    struct ScriptedClient {
        failures: HashMap<String, fn() -> SourceError>,
        calls: Mutex<HashMap<String, usize>>,
    }

    impl ScriptedClient {
        fn new() -> Self {
            Self {
                failures: HashMap::new(),
                calls: Mutex::new(HashMap::new()),
            }
        }

        fn failing(mut self, label: &str, make: fn() -> SourceError) -> Self {
            self.failures.insert(label.to_string(), make);
            self
        }

        fn calls_for(&self, label: &str) -> usize {
            *self
                .calls
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .get(label)
                .unwrap_or(&0)
        }
    }

    #[async_trait]
    impl SourceClient for ScriptedClient {
        async fn fetch_page(
            &self,
            repo_label: &str,
            _cursor: Option<&str>,
        ) -> crate::source::Result<SourcePage> {
            *self
                .calls
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .entry(repo_label.to_string())
                .or_insert(0) += 1;

            if let Some(make) = self.failures.get(repo_label) {
                return Err(make());
            }
            Ok(SourcePage {
                repo_node_id: format!("R_{}", repo_label.replace('/', "_")),
                owner_node_id: None,
                issues: Vec::new(),
                pull_requests: Vec::new(),
                contributors: Vec::new(),
                end_cursor: None,
                has_more: false,
                fetched_at: Utc::now(),
            })
        }
    }

    fn settings(repos: &[&str], budget: u32) -> SyncSettings {
        SyncSettings {
            repositories: repos.iter().map(|s| s.to_string()).collect(),
            retry_budget: budget,
            ..SyncSettings::default()
        }
    }

    #[tokio::test]
    async fn invalid_schedule_fails_without_state_change() {
        let db = connect_and_migrate("sqlite::memory:").await.unwrap();
        let orch = Orchestrator::new(
            db,
            Arc::new(ScriptedClient::new()),
            SyncSettings {
                schedule: "not a cron".to_string(),
                ..SyncSettings::default()
            },
        );

        let err = orch
            .start(CancellationToken::new())
            .await
            .expect_err("bad schedule should fail");
        assert!(matches!(err, OrchestratorError::InvalidSchedule { .. }));
        assert_eq!(orch.state(), OrchestratorState::Idle);
    }

    #[tokio::test]
    async fn cancelled_start_stops_without_fetching() {
        let db = connect_and_migrate("sqlite::memory:").await.unwrap();
        let client = Arc::new(ScriptedClient::new());
        let orch = Orchestrator::new(db, Arc::clone(&client), settings(&["acme/widget"], 1));
        assert_eq!(orch.state(), OrchestratorState::Idle);

        let cancel = CancellationToken::new();
        cancel.cancel();
        orch.start(cancel).await.unwrap();

        assert_eq!(orch.state(), OrchestratorState::Stopped);
        assert_eq!(client.calls_for("acme/widget"), 0);
    }

    #[tokio::test]
    async fn exhausted_budget_does_not_block_other_repos() {
        let db = connect_and_migrate("sqlite::memory:").await.unwrap();
        let client = Arc::new(
            ScriptedClient::new().failing("acme/broken", || SourceError::network("reset")),
        );
        let orch = Orchestrator::new(
            db.clone(),
            Arc::clone(&client),
            settings(&["acme/broken", "acme/widget"], 2),
        );

        let report = orch.run_cycle(&CancellationToken::new()).await.unwrap();

        assert_eq!(report.synced.len(), 1);
        assert_eq!(report.synced[0].repo_label, "acme/widget");
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].repo_label, "acme/broken");
        assert_eq!(report.failures[0].attempts, 2);
        assert_eq!(client.calls_for("acme/broken"), 2);

        // The healthy repository committed its checkpoint.
        assert!(checkpoint::find(&db, "R_acme_widget")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn non_retryable_failures_use_a_single_attempt() {
        let db = connect_and_migrate("sqlite::memory:").await.unwrap();
        let client =
            Arc::new(ScriptedClient::new().failing("acme/gone", || SourceError::gone("acme/gone")));
        let orch = Orchestrator::new(db, Arc::clone(&client), settings(&["acme/gone"], 5));

        let report = orch.run_cycle(&CancellationToken::new()).await.unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].attempts, 1);
        assert_eq!(client.calls_for("acme/gone"), 1);
    }

    #[tokio::test]
    async fn restart_installs_settings_and_preserves_checkpoints() {
        let db = connect_and_migrate("sqlite::memory:").await.unwrap();
        let existing = Checkpoint {
            repo_node_id: "R_1".to_string(),
            repo_label: "acme/widget".to_string(),
            last_update: DateTime::UNIX_EPOCH,
            end_cursor: Some("p9".to_string()),
        };
        checkpoint::commit(&db, &existing).await.unwrap();

        let orch = Orchestrator::new(
            db.clone(),
            Arc::new(ScriptedClient::new()),
            settings(&["acme/widget"], 1),
        );

        let cancel = CancellationToken::new();
        cancel.cancel();
        orch.restart(cancel, settings(&["acme/other"], 3))
            .await
            .unwrap();

        assert_eq!(orch.state(), OrchestratorState::Stopped);
        let stored = checkpoint::find(&db, "R_1").await.unwrap().unwrap();
        assert_eq!(stored.end_cursor.as_deref(), Some("p9"));
        assert_eq!(orch.settings_snapshot().retry_budget, 3);
    }

    /// Serves one content-bearing page per repository.
    struct ContentClient;

    #[async_trait]
    impl SourceClient for ContentClient {
        async fn fetch_page(
            &self,
            repo_label: &str,
            _cursor: Option<&str>,
        ) -> crate::source::Result<SourcePage> {
            use crate::entity::issue_state::IssueState;
            use crate::source::{SourceContributor, SourceIssue};

            let (owner, name) = split_label(repo_label).expect("test label");
            let repo_node_id = format!("R_{owner}_{name}");
            Ok(SourcePage {
                issues: vec![SourceIssue {
                    node_id: format!("I_{owner}_{name}"),
                    number: 1,
                    url: format!("https://example.com/{repo_label}/issues/1"),
                    state: IssueState::Open,
                    closed_at: None,
                    assignees: Vec::new(),
                }],
                contributors: vec![SourceContributor {
                    node_id: "U_shared".to_string(),
                    login: "alice".to_string(),
                    company: None,
                    location: None,
                }],
                owner_node_id: Some(format!("O_{owner}")),
                repo_node_id,
                pull_requests: Vec::new(),
                end_cursor: None,
                has_more: false,
                fetched_at: Utc::now(),
            })
        }
    }

    #[tokio::test]
    async fn cycle_maintains_group_memberships_and_rollups() {
        let db = connect_and_migrate("sqlite::memory:").await.unwrap();
        let orch = Orchestrator::new(
            db.clone(),
            Arc::new(ContentClient),
            SyncSettings {
                repositories: vec!["acme/widget".to_string(), "acme/gadget".to_string()],
                groups: vec![GroupSpec {
                    name: "core".to_string(),
                    repositories: vec![
                        "acme/widget".to_string(),
                        "acme/gadget".to_string(),
                        "not/synced-yet".to_string(),
                    ],
                    organizations: Vec::new(),
                }],
                ..SyncSettings::default()
            },
        );

        let report = orch.run_cycle(&CancellationToken::new()).await.unwrap();
        assert!(report.is_clean());

        let stored = group::find(&db, "core").await.unwrap().unwrap();
        assert_eq!(stored.issue_count, 2);
        // The same account contributed to both repositories.
        assert_eq!(stored.contributor_count, 1);

        let mut members = group::repository_node_ids(&db, "core").await.unwrap();
        members.sort();
        assert_eq!(members, vec!["R_acme_gadget", "R_acme_widget"]);
    }

    #[tokio::test]
    async fn one_failing_group_does_not_block_the_others() {
        use sea_orm::{ConnectionTrait, Statement};

        let db = connect_and_migrate("sqlite::memory:").await.unwrap();
        // Organization lookups fail once the table is gone, so the first
        // group's upkeep errors out.
        db.execute(Statement::from_string(
            db.get_database_backend(),
            "DROP TABLE organizations".to_string(),
        ))
        .await
        .unwrap();

        let orch = Orchestrator::new(
            db.clone(),
            Arc::new(ScriptedClient::new()),
            SyncSettings {
                repositories: vec!["acme/widget".to_string()],
                groups: vec![
                    GroupSpec {
                        name: "broken".to_string(),
                        repositories: Vec::new(),
                        organizations: vec!["acme".to_string()],
                    },
                    GroupSpec {
                        name: "healthy".to_string(),
                        repositories: vec!["acme/widget".to_string()],
                        organizations: Vec::new(),
                    },
                ],
                ..SyncSettings::default()
            },
        );

        let report = orch.run_cycle(&CancellationToken::new()).await.unwrap();
        assert!(report.is_clean());

        // The second group was still attached and refreshed.
        assert!(group::find(&db, "healthy").await.unwrap().is_some());
        let members = group::repository_node_ids(&db, "healthy").await.unwrap();
        assert_eq!(members, vec!["R_acme_widget"]);
    }

    #[tokio::test]
    async fn tracked_set_unions_configured_and_org_repos() {
        let db = connect_and_migrate("sqlite::memory:").await.unwrap();
        for (id, owner, name) in [("R_1", "acme", "widget"), ("R_2", "acme", "gadget")] {
            repository::create(
                &db,
                crate::entity::prelude::RepositoryModel {
                    node_id: id.to_string(),
                    owner: owner.to_string(),
                    name: name.to_string(),
                    owner_node_id: None,
                },
            )
            .await
            .unwrap();
        }

        let orch = Orchestrator::new(
            db,
            Arc::new(ScriptedClient::new()),
            SyncSettings {
                repositories: vec!["acme/widget".to_string(), "solo/thing".to_string()],
                organizations: vec!["acme".to_string()],
                ..SyncSettings::default()
            },
        );

        let repos = orch
            .tracked_repositories(&orch.settings_snapshot())
            .await
            .unwrap();
        assert_eq!(
            repos,
            vec!["acme/widget", "solo/thing", "acme/gadget"],
            "configured labels come first, org repos deduplicate against them"
        );
    }
}
