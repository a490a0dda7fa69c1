//! SeaORM entity definitions for the octosync mirror schema.

pub mod contributor;
pub mod cursor;
pub mod group_organization;
pub mod group_repository;
pub mod issue;
pub mod issue_assignee;
pub mod issue_state;
pub mod organization;
pub mod prelude;
pub mod pull_request;
pub mod pull_request_assignee;
pub mod pull_request_state;
pub mod repository;
pub mod sync_group;
