//! Sync engine: per-repository mirroring and the scheduled orchestrator.

mod engine;
mod orchestrator;
mod types;

pub use engine::{sync_repository, untrack_repository, Result as SyncResult, SyncError};
pub use orchestrator::{Orchestrator, OrchestratorError, OrchestratorState};
pub use types::{
    CycleReport, GroupSpec, RepoFailure, RepoSyncStats, SyncSettings, DEFAULT_CONCURRENCY,
    DEFAULT_SCHEDULE,
};
