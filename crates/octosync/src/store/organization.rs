//! Persistence for mirrored organizations.

use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter, Set};

use crate::entity::prelude::{Organization, OrganizationActiveModel, OrganizationColumn, OrganizationModel};

use super::errors::{Result, StoreError};

/// Insert a new organization.
///
/// # Errors
/// Returns `StoreError::Duplicate` if an organization with the same node id
/// already exists.
pub async fn create(db: &DatabaseConnection, model: OrganizationModel) -> Result<OrganizationModel> {
    if find(db, &model.node_id).await?.is_some() {
        return Err(StoreError::duplicate_node_id("organization", &model.node_id));
    }
    let active = model.into_active_model().reset_all();
    Ok(active.insert(db).await?)
}

/// Find an organization by its node id.
pub async fn find(db: &DatabaseConnection, node_id: &str) -> Result<Option<OrganizationModel>> {
    Ok(Organization::find_by_id(node_id).one(db).await?)
}

/// Find an organization by its login name.
pub async fn find_by_name(db: &DatabaseConnection, name: &str) -> Result<Option<OrganizationModel>> {
    Ok(Organization::find()
        .filter(OrganizationColumn::Name.eq(name))
        .one(db)
        .await?)
}

/// Check whether an organization with the given node id exists.
pub async fn exists(db: &DatabaseConnection, node_id: &str) -> Result<bool> {
    Ok(find(db, node_id).await?.is_some())
}

/// Update the denormalized counters of an existing organization.
///
/// Only the counter columns are written; the identity columns of the stored
/// row are left untouched.
///
/// # Errors
/// Returns `StoreError::NotFound` if no organization with the node id exists.
pub async fn update_counters(
    db: &DatabaseConnection,
    node_id: &str,
    issue_count: i32,
    pull_request_count: i32,
    star_count: i32,
    fork_count: i32,
    contributor_count: i32,
) -> Result<OrganizationModel> {
    let current = find(db, node_id)
        .await?
        .ok_or_else(|| StoreError::not_found_by_node_id("organization", node_id))?;

    let mut active: OrganizationActiveModel = current.into_active_model();
    active.issue_count = Set(issue_count);
    active.pull_request_count = Set(pull_request_count);
    active.star_count = Set(star_count);
    active.fork_count = Set(fork_count);
    active.contributor_count = Set(contributor_count);
    Ok(active.update(db).await?)
}

/// Delete an organization by node id.
///
/// Returns the number of rows deleted (0 or 1).
pub async fn delete(db: &DatabaseConnection, node_id: &str) -> Result<u64> {
    let result = Organization::delete_by_id(node_id).exec(db).await?;
    Ok(result.rows_affected)
}
