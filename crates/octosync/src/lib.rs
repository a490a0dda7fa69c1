//! octosync - mirror GitHub repository activity into a local database.
//!
//! octosync tracks a configured set of repositories and organizations,
//! pulling issues, pull requests, assignees and contributors page by page
//! into a relational mirror. Each repository carries a durable checkpoint so
//! interrupted runs resume where they left off, assignment edges are
//! reconciled rather than rewritten, and counter rollups are computed from
//! the mirror itself.
//!
//! The main pieces:
//! - [`entity`]: sea-orm entities for the mirror schema
//! - [`store`]: typed persistence over those entities
//! - [`source`]: the upstream client seam ([`source::SourceClient`])
//! - [`reconcile`]: set reconciliation for assignment edges
//! - [`aggregate`]: counter rollups for organizations and groups
//! - [`sync`]: the per-repository engine and the scheduled orchestrator

pub mod aggregate;
pub mod db;
pub mod entity;
pub mod migration;
pub mod reconcile;
pub mod retry;
pub mod source;
pub mod store;
pub mod sync;

pub use db::{connect, connect_and_migrate};
pub use source::{SourceClient, SourceError, SourcePage};
pub use store::{Checkpoint, StoreError};
pub use sync::{Orchestrator, OrchestratorState, SyncSettings};
