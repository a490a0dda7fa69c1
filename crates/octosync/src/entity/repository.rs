//! Repository entity - mirrored upstream repository.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Repository model.
///
/// Natural identity is the (owner, name) pair; `node_id` becomes derived
/// identity once the row exists. All fields here are identity fields - the
/// mutable per-repository data lives on the child entities.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "repositories")]
pub struct Model {
    /// Upstream-assigned immutable node identifier.
    #[sea_orm(primary_key, auto_increment = false)]
    pub node_id: String,
    /// Owner login (organization or user).
    pub owner: String,
    /// Repository name.
    pub name: String,
    /// Node id of the owning organization, when the owner is one.
    pub owner_node_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organization::Entity",
        from = "Column::OwnerNodeId",
        to = "super::organization::Column::NodeId"
    )]
    Organization,
    #[sea_orm(has_many = "super::issue::Entity")]
    Issue,
    #[sea_orm(has_many = "super::pull_request::Entity")]
    PullRequest,
    #[sea_orm(has_many = "super::contributor::Entity")]
    Contributor,
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Compute the "owner/name" label used by cursors and relation rows.
    pub fn label(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Split an "owner/name" label into its parts.
///
/// Returns `None` when the label is not of the `owner/name` form.
pub fn split_label(label: &str) -> Option<(&str, &str)> {
    let (owner, name) = label.split_once('/')?;
    if owner.is_empty() || name.is_empty() || name.contains('/') {
        return None;
    }
    Some((owner, name))
}
