//! Storage layer: typed access to the mirror database.
//!
//! Each submodule owns the persistence of one entity kind. All functions take
//! a `&DatabaseConnection` so callers control pooling and transactions.

pub mod checkpoint;
pub mod contributor;
pub mod errors;
pub mod group;
pub mod issue;
pub mod issue_assignee;
pub mod organization;
pub mod pull_request;
pub mod pull_request_assignee;
pub mod repository;

pub use checkpoint::Checkpoint;
pub use errors::{Result, StoreError};
