//! Pull request entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::entity::pull_request_state::PullRequestState;

/// Pull request model.
///
/// Only `state`, `merged_at` and `closed_at` mutate after creation.
/// `merged_at` and `closed_at` are mutually exclusive in practice.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pull_requests")]
pub struct Model {
    /// Upstream-assigned immutable node identifier.
    #[sea_orm(primary_key, auto_increment = false)]
    pub node_id: String,
    /// Node id of the owning repository.
    pub repo_node_id: String,
    /// Pull request number within the repository.
    pub number: i32,
    /// Upstream URL.
    #[sea_orm(column_type = "Text")]
    pub url: String,
    /// Open/closed/merged state.
    pub state: PullRequestState,
    /// When the pull request was merged, if it was.
    pub merged_at: Option<DateTimeUtc>,
    /// When the pull request was closed without merging, if it was.
    pub closed_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::repository::Entity",
        from = "Column::RepoNodeId",
        to = "super::repository::Column::NodeId"
    )]
    Repository,
}

impl Related<super::repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Repository.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
