//! Persistence for pull request assignment edges.

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entity::prelude::{
    PullRequestAssignee, PullRequestAssigneeActiveModel, PullRequestAssigneeColumn,
    PullRequestAssigneeModel,
};

use super::errors::Result;

/// List the stored assignment edges of one pull request.
pub async fn find_by_parent(
    db: &DatabaseConnection,
    pull_request_node_id: &str,
) -> Result<Vec<PullRequestAssigneeModel>> {
    Ok(PullRequestAssignee::find()
        .filter(PullRequestAssigneeColumn::PullRequestNodeId.eq(pull_request_node_id))
        .all(db)
        .await?)
}

/// Insert a batch of assignment edges. An empty batch is a no-op.
pub async fn insert_many(
    db: &DatabaseConnection,
    models: Vec<PullRequestAssigneeModel>,
) -> Result<()> {
    if models.is_empty() {
        return Ok(());
    }
    let actives = models.into_iter().map(|m| PullRequestAssigneeActiveModel {
        id: sea_orm::ActiveValue::NotSet,
        pull_request_node_id: Set(m.pull_request_node_id),
        pull_request_number: Set(m.pull_request_number),
        pull_request_url: Set(m.pull_request_url),
        repo_label: Set(m.repo_label),
        assignee_node_id: Set(m.assignee_node_id),
        assignee_login: Set(m.assignee_login),
    });
    PullRequestAssignee::insert_many(actives).exec(db).await?;
    Ok(())
}

/// Delete assignment edges by surrogate id. An empty batch is a no-op.
///
/// Returns the number of rows deleted.
pub async fn delete_by_ids(db: &DatabaseConnection, ids: &[i64]) -> Result<u64> {
    if ids.is_empty() {
        return Ok(0);
    }
    let result = PullRequestAssignee::delete_many()
        .filter(PullRequestAssigneeColumn::Id.is_in(ids.iter().copied()))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Delete every assignment edge of one pull request.
pub async fn delete_by_parent(
    db: &DatabaseConnection,
    pull_request_node_id: &str,
) -> Result<u64> {
    let result = PullRequestAssignee::delete_many()
        .filter(PullRequestAssigneeColumn::PullRequestNodeId.eq(pull_request_node_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Delete every assignment edge recorded under a repository label.
pub async fn delete_by_repo_label(db: &DatabaseConnection, repo_label: &str) -> Result<u64> {
    let result = PullRequestAssignee::delete_many()
        .filter(PullRequestAssigneeColumn::RepoLabel.eq(repo_label))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
