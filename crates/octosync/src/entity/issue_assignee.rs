//! Issue assignee relation rows.
//!
//! Membership has no upstream delta feed; rows are re-derived by full-set
//! reconciliation each sync (see `crate::reconcile`). The surrogate `id` is
//! excluded from reconciliation comparison.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "issue_assignees")]
pub struct Model {
    /// Surrogate identifier, used only to address rows for deletion.
    #[sea_orm(primary_key)]
    pub id: i64,
    pub issue_node_id: String,
    pub issue_number: i32,
    #[sea_orm(column_type = "Text")]
    pub issue_url: String,
    /// Denormalized "owner/name" label of the owning repository.
    pub repo_label: String,
    pub assignee_node_id: String,
    pub assignee_login: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
