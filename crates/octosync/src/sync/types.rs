//! Shared types for the sync engine and orchestrator.

use chrono::{DateTime, Utc};

use crate::retry::DEFAULT_RETRY_BUDGET;

/// Default cron schedule: top of every hour.
pub const DEFAULT_SCHEDULE: &str = "0 0 * * * *";
/// Default number of repositories synced concurrently.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// A named bundle of repositories and organizations whose counters are
/// rolled up together after each cycle.
#[derive(Debug, Clone, Default)]
pub struct GroupSpec {
    pub name: String,
    /// Repository labels (`owner/name`) in the group.
    pub repositories: Vec<String>,
    /// Organization logins whose repositories all belong to the group.
    pub organizations: Vec<String>,
}

/// Tunable settings for a sync run.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Cron expression (seconds granularity) driving cycle starts.
    pub schedule: String,
    /// Total fetch attempts allowed per repository and cycle.
    pub retry_budget: u32,
    /// Number of repositories synced concurrently within a cycle.
    pub concurrency: usize,
    /// Repository labels (`owner/name`) to track directly.
    pub repositories: Vec<String>,
    /// Organization logins whose repositories are all tracked.
    pub organizations: Vec<String>,
    /// Groups to maintain memberships and counter rollups for.
    pub groups: Vec<GroupSpec>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            schedule: DEFAULT_SCHEDULE.to_string(),
            retry_budget: DEFAULT_RETRY_BUDGET,
            concurrency: DEFAULT_CONCURRENCY,
            repositories: Vec::new(),
            organizations: Vec::new(),
            groups: Vec::new(),
        }
    }
}

/// Per-repository outcome of one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoSyncStats {
    pub repo_label: String,
    pub repo_node_id: String,
    /// Pages fetched and committed.
    pub pages: u32,
    pub issues_inserted: u64,
    pub issues_updated: u64,
    pub pull_requests_inserted: u64,
    pub pull_requests_updated: u64,
    pub contributors_upserted: u64,
    pub assignee_edges_added: u64,
    pub assignee_edges_removed: u64,
}

/// A repository that exhausted its attempt budget in one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoFailure {
    pub repo_label: String,
    /// Attempts actually made, including the first.
    pub attempts: u32,
    pub error: String,
}

/// Summary of one completed cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub synced: Vec<RepoSyncStats>,
    pub failures: Vec<RepoFailure>,
}

impl CycleReport {
    /// Whether every tracked repository synced cleanly.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
