//! Persistence for issue assignment edges.

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entity::prelude::{IssueAssignee, IssueAssigneeActiveModel, IssueAssigneeColumn, IssueAssigneeModel};

use super::errors::Result;

/// List the stored assignment edges of one issue.
pub async fn find_by_parent(
    db: &DatabaseConnection,
    issue_node_id: &str,
) -> Result<Vec<IssueAssigneeModel>> {
    Ok(IssueAssignee::find()
        .filter(IssueAssigneeColumn::IssueNodeId.eq(issue_node_id))
        .all(db)
        .await?)
}

/// Insert a batch of assignment edges. An empty batch is a no-op.
pub async fn insert_many(
    db: &DatabaseConnection,
    models: Vec<IssueAssigneeModel>,
) -> Result<()> {
    if models.is_empty() {
        return Ok(());
    }
    let actives = models.into_iter().map(|m| IssueAssigneeActiveModel {
        id: sea_orm::ActiveValue::NotSet,
        issue_node_id: Set(m.issue_node_id),
        issue_number: Set(m.issue_number),
        issue_url: Set(m.issue_url),
        repo_label: Set(m.repo_label),
        assignee_node_id: Set(m.assignee_node_id),
        assignee_login: Set(m.assignee_login),
    });
    IssueAssignee::insert_many(actives).exec(db).await?;
    Ok(())
}

/// Delete assignment edges by surrogate id. An empty batch is a no-op.
///
/// Returns the number of rows deleted.
pub async fn delete_by_ids(db: &DatabaseConnection, ids: &[i64]) -> Result<u64> {
    if ids.is_empty() {
        return Ok(0);
    }
    let result = IssueAssignee::delete_many()
        .filter(IssueAssigneeColumn::Id.is_in(ids.iter().copied()))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Delete every assignment edge of one issue.
pub async fn delete_by_parent(db: &DatabaseConnection, issue_node_id: &str) -> Result<u64> {
    let result = IssueAssignee::delete_many()
        .filter(IssueAssigneeColumn::IssueNodeId.eq(issue_node_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Delete every assignment edge recorded under a repository label.
pub async fn delete_by_repo_label(db: &DatabaseConnection, repo_label: &str) -> Result<u64> {
    let result = IssueAssignee::delete_many()
        .filter(IssueAssigneeColumn::RepoLabel.eq(repo_label))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
