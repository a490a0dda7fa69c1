//! Persistence for mirrored issues.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, Set,
};

use crate::entity::issue_state::IssueState;
use crate::entity::prelude::{Issue, IssueColumn, IssueModel};

use super::errors::{Result, StoreError};

/// Insert a batch of issues.
///
/// An empty batch is a no-op.
///
/// # Errors
/// Returns `StoreError::Database` if the insert fails (e.g., duplicate node id
/// within or across batches).
pub async fn insert_many(db: &DatabaseConnection, models: Vec<IssueModel>) -> Result<()> {
    if models.is_empty() {
        return Ok(());
    }
    let actives = models
        .into_iter()
        .map(|m| m.into_active_model().reset_all());
    Issue::insert_many(actives).exec(db).await?;
    Ok(())
}

/// Find an issue by its node id.
pub async fn find(db: &DatabaseConnection, node_id: &str) -> Result<Option<IssueModel>> {
    Ok(Issue::find_by_id(node_id).one(db).await?)
}

/// Check whether an issue with the given node id exists.
pub async fn exists(db: &DatabaseConnection, node_id: &str) -> Result<bool> {
    Ok(find(db, node_id).await?.is_some())
}

/// Update the lifecycle fields of an existing issue.
///
/// Only `state` and `closed_at` are written; identity and placement columns
/// of the stored row are left untouched.
///
/// # Errors
/// Returns `StoreError::NotFound` if no issue with the node id exists.
pub async fn update_state(
    db: &DatabaseConnection,
    node_id: &str,
    state: IssueState,
    closed_at: Option<DateTime<Utc>>,
) -> Result<IssueModel> {
    let current = find(db, node_id)
        .await?
        .ok_or_else(|| StoreError::not_found_by_node_id("issue", node_id))?;

    let mut active = current.into_active_model();
    active.state = Set(state);
    active.closed_at = Set(closed_at);
    Ok(active.update(db).await?)
}

/// List all issues belonging to a repository.
pub async fn find_by_repo(db: &DatabaseConnection, repo_node_id: &str) -> Result<Vec<IssueModel>> {
    Ok(Issue::find()
        .filter(IssueColumn::RepoNodeId.eq(repo_node_id))
        .all(db)
        .await?)
}

/// Count issues across a set of repositories.
pub async fn count_by_repos(db: &DatabaseConnection, repo_node_ids: &[String]) -> Result<u64> {
    if repo_node_ids.is_empty() {
        return Ok(0);
    }
    Ok(Issue::find()
        .filter(IssueColumn::RepoNodeId.is_in(repo_node_ids.iter().map(String::as_str)))
        .count(db)
        .await?)
}

/// Delete all issues belonging to a repository.
///
/// Returns the number of rows deleted.
pub async fn delete_by_repo(db: &DatabaseConnection, repo_node_id: &str) -> Result<u64> {
    let result = Issue::delete_many()
        .filter(IssueColumn::RepoNodeId.eq(repo_node_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
