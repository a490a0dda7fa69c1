//! Pull request assignee relation rows.
//!
//! Same reconciliation contract as issue assignees: membership is re-derived
//! by full-set comparison, and the surrogate `id` never participates in it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pull_request_assignees")]
pub struct Model {
    /// Surrogate identifier, used only to address rows for deletion.
    #[sea_orm(primary_key)]
    pub id: i64,
    pub pull_request_node_id: String,
    pub pull_request_number: i32,
    #[sea_orm(column_type = "Text")]
    pub pull_request_url: String,
    /// Denormalized "owner/name" label of the owning repository.
    pub repo_label: String,
    pub assignee_node_id: String,
    pub assignee_login: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
