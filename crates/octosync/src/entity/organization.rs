//! Organization entity - mirrored upstream organization with rollup counters.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Organization model.
///
/// `node_id` and `name` are identity fields and are never rewritten after
/// creation; the counters are analytics fields refreshed on every sync.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "organizations")]
pub struct Model {
    /// Upstream-assigned immutable node identifier.
    #[sea_orm(primary_key, auto_increment = false)]
    pub node_id: String,
    /// Organization login/name.
    pub name: String,

    // Rollup counters, overwritten on every sync.
    pub issue_count: i32,
    pub pull_request_count: i32,
    pub star_count: i32,
    pub fork_count: i32,
    pub contributor_count: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// An organization owns repositories.
    #[sea_orm(has_many = "super::repository::Entity")]
    Repository,
}

impl Related<super::repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Repository.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
