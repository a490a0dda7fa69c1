//! Persistence for sync groups and their memberships.
//!
//! A group is a named bundle of repositories and organizations whose counters
//! are rolled up together.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QuerySelect, Set,
};

use crate::entity::prelude::{
    GroupOrganization, GroupOrganizationColumn, GroupOrganizationModel, GroupRepository,
    GroupRepositoryColumn, GroupRepositoryModel, SyncGroup, SyncGroupActiveModel, SyncGroupColumn,
    SyncGroupModel,
};

use super::errors::{Result, StoreError};

/// Insert a new group with zeroed counters.
///
/// # Errors
/// Returns `StoreError::Duplicate` if a group with the same name exists.
pub async fn create(db: &DatabaseConnection, name: &str) -> Result<SyncGroupModel> {
    if find(db, name).await?.is_some() {
        return Err(StoreError::Duplicate {
            context: format!("group name={name}"),
        });
    }
    let model = SyncGroupModel {
        name: name.to_string(),
        issue_count: 0,
        pull_request_count: 0,
        star_count: 0,
        fork_count: 0,
        contributor_count: 0,
    };
    Ok(model.into_active_model().reset_all().insert(db).await?)
}

/// Insert a group if it does not exist yet.
pub async fn ensure(db: &DatabaseConnection, name: &str) -> Result<SyncGroupModel> {
    match find(db, name).await? {
        Some(existing) => Ok(existing),
        None => create(db, name).await,
    }
}

/// Find a group by name.
pub async fn find(db: &DatabaseConnection, name: &str) -> Result<Option<SyncGroupModel>> {
    Ok(SyncGroup::find_by_id(name).one(db).await?)
}

/// List the names of all groups.
pub async fn names(db: &DatabaseConnection) -> Result<Vec<String>> {
    Ok(SyncGroup::find()
        .select_only()
        .column(SyncGroupColumn::Name)
        .into_tuple::<String>()
        .all(db)
        .await?)
}

/// Update the denormalized counters of an existing group.
///
/// # Errors
/// Returns `StoreError::NotFound` if the group does not exist.
pub async fn update_counters(
    db: &DatabaseConnection,
    name: &str,
    issue_count: i32,
    pull_request_count: i32,
    star_count: i32,
    fork_count: i32,
    contributor_count: i32,
) -> Result<SyncGroupModel> {
    let current = find(db, name)
        .await?
        .ok_or_else(|| StoreError::not_found_by_name("group", name))?;

    let mut active: SyncGroupActiveModel = current.into_active_model();
    active.issue_count = Set(issue_count);
    active.pull_request_count = Set(pull_request_count);
    active.star_count = Set(star_count);
    active.fork_count = Set(fork_count);
    active.contributor_count = Set(contributor_count);
    Ok(active.update(db).await?)
}

/// Attach a repository to a group. Re-attaching is a no-op.
pub async fn add_repository(
    db: &DatabaseConnection,
    group_name: &str,
    repo_node_id: &str,
) -> Result<()> {
    let key = (group_name.to_string(), repo_node_id.to_string());
    if GroupRepository::find_by_id(key).one(db).await?.is_some() {
        return Ok(());
    }
    let model = GroupRepositoryModel {
        group_name: group_name.to_string(),
        repo_node_id: repo_node_id.to_string(),
    };
    model.into_active_model().reset_all().insert(db).await?;
    Ok(())
}

/// Attach an organization to a group. Re-attaching is a no-op.
pub async fn add_organization(
    db: &DatabaseConnection,
    group_name: &str,
    org_node_id: &str,
) -> Result<()> {
    let key = (group_name.to_string(), org_node_id.to_string());
    if GroupOrganization::find_by_id(key).one(db).await?.is_some() {
        return Ok(());
    }
    let model = GroupOrganizationModel {
        group_name: group_name.to_string(),
        org_node_id: org_node_id.to_string(),
    };
    model.into_active_model().reset_all().insert(db).await?;
    Ok(())
}

/// List node ids of repositories attached directly to a group.
pub async fn repository_node_ids(db: &DatabaseConnection, group_name: &str) -> Result<Vec<String>> {
    Ok(GroupRepository::find()
        .select_only()
        .column(GroupRepositoryColumn::RepoNodeId)
        .filter(GroupRepositoryColumn::GroupName.eq(group_name))
        .into_tuple::<String>()
        .all(db)
        .await?)
}

/// List node ids of organizations attached to a group.
pub async fn organization_node_ids(
    db: &DatabaseConnection,
    group_name: &str,
) -> Result<Vec<String>> {
    Ok(GroupOrganization::find()
        .select_only()
        .column(GroupOrganizationColumn::OrgNodeId)
        .filter(GroupOrganizationColumn::GroupName.eq(group_name))
        .into_tuple::<String>()
        .all(db)
        .await?)
}

/// Delete a group and its membership rows.
pub async fn delete(db: &DatabaseConnection, name: &str) -> Result<u64> {
    GroupRepository::delete_many()
        .filter(GroupRepositoryColumn::GroupName.eq(name))
        .exec(db)
        .await?;
    GroupOrganization::delete_many()
        .filter(GroupOrganizationColumn::GroupName.eq(name))
        .exec(db)
        .await?;
    let result = SyncGroup::delete_by_id(name).exec(db).await?;
    Ok(result.rows_affected)
}
