//! Issue entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::entity::issue_state::IssueState;

/// Issue model.
///
/// Only `state` and `closed_at` mutate after creation; everything else is
/// identity and is preserved by selective updates.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "issues")]
pub struct Model {
    /// Upstream-assigned immutable node identifier.
    #[sea_orm(primary_key, auto_increment = false)]
    pub node_id: String,
    /// Node id of the owning repository.
    pub repo_node_id: String,
    /// Issue number within the repository.
    pub number: i32,
    /// Upstream URL.
    #[sea_orm(column_type = "Text")]
    pub url: String,
    /// Open/closed state.
    pub state: IssueState,
    /// When the issue was closed, if it has been.
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
