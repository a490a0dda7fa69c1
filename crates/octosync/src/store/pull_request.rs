//! Persistence for mirrored pull requests.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, Set,
};

use crate::entity::prelude::{PullRequest, PullRequestColumn, PullRequestModel};
use crate::entity::pull_request_state::PullRequestState;

use super::errors::{Result, StoreError};

/// Insert a batch of pull requests.
///
/// An empty batch is a no-op.
pub async fn insert_many(db: &DatabaseConnection, models: Vec<PullRequestModel>) -> Result<()> {
    if models.is_empty() {
        return Ok(());
    }
    let actives = models
        .into_iter()
        .map(|m| m.into_active_model().reset_all());
    PullRequest::insert_many(actives).exec(db).await?;
    Ok(())
}

/// Find a pull request by its node id.
pub async fn find(db: &DatabaseConnection, node_id: &str) -> Result<Option<PullRequestModel>> {
    Ok(PullRequest::find_by_id(node_id).one(db).await?)
}

/// Check whether a pull request with the given node id exists.
pub async fn exists(db: &DatabaseConnection, node_id: &str) -> Result<bool> {
    Ok(find(db, node_id).await?.is_some())
}

/// Update the lifecycle fields of an existing pull request.
///
/// Only `state`, `merged_at` and `closed_at` are written; identity and
/// placement columns of the stored row are left untouched.
///
/// # Errors
/// Returns `StoreError::NotFound` if no pull request with the node id exists.
pub async fn update_state(
    db: &DatabaseConnection,
    node_id: &str,
    state: PullRequestState,
    merged_at: Option<DateTime<Utc>>,
    closed_at: Option<DateTime<Utc>>,
) -> Result<PullRequestModel> {
    let current = find(db, node_id)
        .await?
        .ok_or_else(|| StoreError::not_found_by_node_id("pull request", node_id))?;

    let mut active = current.into_active_model();
    active.state = Set(state);
    active.merged_at = Set(merged_at);
    active.closed_at = Set(closed_at);
    Ok(active.update(db).await?)
}

/// List all pull requests belonging to a repository.
pub async fn find_by_repo(
    db: &DatabaseConnection,
    repo_node_id: &str,
) -> Result<Vec<PullRequestModel>> {
    Ok(PullRequest::find()
        .filter(PullRequestColumn::RepoNodeId.eq(repo_node_id))
        .all(db)
        .await?)
}

/// List the open pull requests of a repository.
pub async fn find_open_by_repo(
    db: &DatabaseConnection,
    repo_node_id: &str,
) -> Result<Vec<PullRequestModel>> {
    Ok(PullRequest::find()
        .filter(PullRequestColumn::RepoNodeId.eq(repo_node_id))
        .filter(PullRequestColumn::State.eq(PullRequestState::Open))
        .all(db)
        .await?)
}

/// Count pull requests across a set of repositories.
pub async fn count_by_repos(db: &DatabaseConnection, repo_node_ids: &[String]) -> Result<u64> {
    if repo_node_ids.is_empty() {
        return Ok(0);
    }
    Ok(PullRequest::find()
        .filter(PullRequestColumn::RepoNodeId.is_in(repo_node_ids.iter().map(String::as_str)))
        .count(db)
        .await?)
}

/// Delete all pull requests belonging to a repository.
///
/// Returns the number of rows deleted.
pub async fn delete_by_repo(db: &DatabaseConnection, repo_node_id: &str) -> Result<u64> {
    let result = PullRequest::delete_many()
        .filter(PullRequestColumn::RepoNodeId.eq(repo_node_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
