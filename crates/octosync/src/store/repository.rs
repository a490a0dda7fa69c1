//! Persistence for mirrored repositories.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QuerySelect, Set,
};

use crate::entity::prelude::{Repository, RepositoryColumn, RepositoryModel};

use super::errors::{Result, StoreError};

/// Insert a new repository.
///
/// # Errors
/// Returns `StoreError::Duplicate` if a repository with the same node id
/// already exists.
pub async fn create(db: &DatabaseConnection, model: RepositoryModel) -> Result<RepositoryModel> {
    if find(db, &model.node_id).await?.is_some() {
        return Err(StoreError::duplicate_node_id("repository", &model.node_id));
    }
    let active = model.into_active_model().reset_all();
    Ok(active.insert(db).await?)
}

/// Find a repository by its node id.
pub async fn find(db: &DatabaseConnection, node_id: &str) -> Result<Option<RepositoryModel>> {
    Ok(Repository::find_by_id(node_id).one(db).await?)
}

/// Find a repository by its `owner/name` pair.
pub async fn find_by_owner_name(
    db: &DatabaseConnection,
    owner: &str,
    name: &str,
) -> Result<Option<RepositoryModel>> {
    Ok(Repository::find()
        .filter(RepositoryColumn::Owner.eq(owner))
        .filter(RepositoryColumn::Name.eq(name))
        .one(db)
        .await?)
}

/// Resolve the node id of a repository from its `owner/name` pair.
pub async fn node_id_by_owner_name(
    db: &DatabaseConnection,
    owner: &str,
    name: &str,
) -> Result<Option<String>> {
    Ok(Repository::find()
        .select_only()
        .column(RepositoryColumn::NodeId)
        .filter(RepositoryColumn::Owner.eq(owner))
        .filter(RepositoryColumn::Name.eq(name))
        .into_tuple::<String>()
        .one(db)
        .await?)
}

/// List `owner/name` labels of all repositories under the given owner.
pub async fn labels_by_owner(db: &DatabaseConnection, owner: &str) -> Result<Vec<String>> {
    let repos = Repository::find()
        .filter(RepositoryColumn::Owner.eq(owner))
        .all(db)
        .await?;
    Ok(repos.iter().map(RepositoryModel::label).collect())
}

/// List node ids of all repositories owned by the given organization.
pub async fn node_ids_by_owner_node_id(
    db: &DatabaseConnection,
    owner_node_id: &str,
) -> Result<Vec<String>> {
    Ok(Repository::find()
        .select_only()
        .column(RepositoryColumn::NodeId)
        .filter(RepositoryColumn::OwnerNodeId.eq(owner_node_id))
        .into_tuple::<String>()
        .all(db)
        .await?)
}

/// Attach the owning organization to an existing repository row.
pub async fn set_owner_node_id(
    db: &DatabaseConnection,
    node_id: &str,
    owner_node_id: &str,
) -> Result<RepositoryModel> {
    let current = find(db, node_id)
        .await?
        .ok_or_else(|| StoreError::not_found_by_node_id("repository", node_id))?;

    let mut active = current.into_active_model();
    active.owner_node_id = Set(Some(owner_node_id.to_string()));
    Ok(active.update(db).await?)
}

/// Delete a repository by node id.
///
/// Returns the number of rows deleted (0 or 1).
pub async fn delete(db: &DatabaseConnection, node_id: &str) -> Result<u64> {
    let result = Repository::delete_by_id(node_id).exec(db).await?;
    Ok(result.rows_affected)
}
