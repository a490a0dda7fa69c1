//! User-declared reporting group.
//!
//! Groups aggregate organizations and/or repositories for reporting only.
//! Membership comes from configuration (the join tables), not from sync.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sync_groups")]
pub struct Model {
    /// Group name, declared in configuration.
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,

    // Rollup counters, overwritten on every refresh.
    pub issue_count: i32,
    pub pull_request_count: i32,
    pub star_count: i32,
    pub fork_count: i32,
    pub contributor_count: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
