//! Contributor entity.
//!
//! Identity is the composite (node_id, repo_node_id) pair: the same person
//! contributing to two repositories yields two rows. Unlike the other
//! entities, contributors have upsert semantics - the whole record is
//! refreshed from a single source each sync, so there is no partial-field
//! concern.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contributors")]
pub struct Model {
    /// Upstream-assigned node identifier of the user.
    #[sea_orm(primary_key, auto_increment = false)]
    pub node_id: String,
    /// Node id of the repository contributed to.
    #[sea_orm(primary_key, auto_increment = false)]
    pub repo_node_id: String,
    /// User login.
    pub login: String,
    /// Company, enriched post-hoc from the user profile.
    pub company: Option<String>,
    /// Location, enriched post-hoc from the user profile.
    pub location: Option<String>,
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
