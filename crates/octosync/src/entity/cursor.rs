//! Per-repository sync cursor.
//!
//! One row per tracked repository, created on the first successful fetch.
//! Absence is a valid state meaning "never synced". The pagination token is
//! nullable so that "synced with an empty token" stays distinguishable from
//! "never synced".

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cursors")]
pub struct Model {
    /// Node id of the tracked repository.
    #[sea_orm(primary_key, auto_increment = false)]
    pub repo_node_id: String,
    /// "owner/name" label, the lookup key used by fetch planning.
    pub repo_label: String,
    /// When the last page for this repository was fetched.
    pub last_update: DateTimeUtc,
    /// Opaque upstream pagination token. Only advanced after the page's
    /// entities are durably persisted.
    pub end_cursor: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
