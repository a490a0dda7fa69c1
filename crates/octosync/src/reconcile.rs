//! Set reconciliation for assignment edges.
//!
//! Upstream pages carry the full desired assignee set of each issue or pull
//! request. Reconciliation diffs that set against the stored edges and applies
//! only the difference: missing edges are inserted, stale edges are deleted by
//! surrogate id, and edges present on both sides are left untouched. An empty
//! desired set revokes every stored edge.

use std::collections::HashSet;

use sea_orm::DatabaseConnection;

use crate::entity::prelude::{IssueAssigneeModel, PullRequestAssigneeModel};
use crate::store::errors::Result;
use crate::store::{issue_assignee, pull_request_assignee};

/// One assignment edge, identified by its content rather than a surrogate id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberRecord {
    pub parent_node_id: String,
    pub parent_number: i32,
    pub parent_url: String,
    pub repo_label: String,
    pub assignee_node_id: String,
    pub assignee_login: String,
}

/// The minimal change set turning a stored edge set into the desired one.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemberDiff {
    pub to_add: Vec<MemberRecord>,
    pub to_remove: Vec<i64>,
}

impl MemberDiff {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Compute the difference between desired records and stored rows.
///
/// `current` pairs each stored record with its surrogate id. Duplicate desired
/// records are collapsed before diffing.
pub fn diff(desired: &[MemberRecord], current: &[(i64, MemberRecord)]) -> MemberDiff {
    let mut wanted: HashSet<&MemberRecord> = HashSet::with_capacity(desired.len());
    let mut to_add = Vec::new();
    let stored: HashSet<&MemberRecord> = current.iter().map(|(_, r)| r).collect();

    for record in desired {
        if !wanted.insert(record) {
            continue;
        }
        if !stored.contains(record) {
            to_add.push(record.clone());
        }
    }

    let to_remove = current
        .iter()
        .filter(|(_, record)| !wanted.contains(record))
        .map(|(id, _)| *id)
        .collect();

    MemberDiff { to_add, to_remove }
}

impl From<IssueAssigneeModel> for MemberRecord {
    fn from(model: IssueAssigneeModel) -> Self {
        Self {
            parent_node_id: model.issue_node_id,
            parent_number: model.issue_number,
            parent_url: model.issue_url,
            repo_label: model.repo_label,
            assignee_node_id: model.assignee_node_id,
            assignee_login: model.assignee_login,
        }
    }
}

impl From<PullRequestAssigneeModel> for MemberRecord {
    fn from(model: PullRequestAssigneeModel) -> Self {
        Self {
            parent_node_id: model.pull_request_node_id,
            parent_number: model.pull_request_number,
            parent_url: model.pull_request_url,
            repo_label: model.repo_label,
            assignee_node_id: model.assignee_node_id,
            assignee_login: model.assignee_login,
        }
    }
}

fn issue_row(record: MemberRecord) -> IssueAssigneeModel {
    IssueAssigneeModel {
        id: 0,
        issue_node_id: record.parent_node_id,
        issue_number: record.parent_number,
        issue_url: record.parent_url,
        repo_label: record.repo_label,
        assignee_node_id: record.assignee_node_id,
        assignee_login: record.assignee_login,
    }
}

fn pull_request_row(record: MemberRecord) -> PullRequestAssigneeModel {
    PullRequestAssigneeModel {
        id: 0,
        pull_request_node_id: record.parent_node_id,
        pull_request_number: record.parent_number,
        pull_request_url: record.parent_url,
        repo_label: record.repo_label,
        assignee_node_id: record.assignee_node_id,
        assignee_login: record.assignee_login,
    }
}

/// Reconcile the stored assignee edges of one issue against the desired set.
///
/// Returns the applied diff.
pub async fn reconcile_issue_assignees(
    db: &DatabaseConnection,
    issue_node_id: &str,
    desired: &[MemberRecord],
) -> Result<MemberDiff> {
    let current: Vec<(i64, MemberRecord)> = issue_assignee::find_by_parent(db, issue_node_id)
        .await?
        .into_iter()
        .map(|m| (m.id, MemberRecord::from(m)))
        .collect();

    let changes = diff(desired, &current);
    issue_assignee::insert_many(db, changes.to_add.iter().cloned().map(issue_row).collect())
        .await?;
    issue_assignee::delete_by_ids(db, &changes.to_remove).await?;
    Ok(changes)
}

/// Reconcile the stored assignee edges of one pull request against the
/// desired set.
///
/// Returns the applied diff.
pub async fn reconcile_pull_request_assignees(
    db: &DatabaseConnection,
    pull_request_node_id: &str,
    desired: &[MemberRecord],
) -> Result<MemberDiff> {
    let current: Vec<(i64, MemberRecord)> =
        pull_request_assignee::find_by_parent(db, pull_request_node_id)
            .await?
            .into_iter()
            .map(|m| (m.id, MemberRecord::from(m)))
            .collect();

    let changes = diff(desired, &current);
    pull_request_assignee::insert_many(
        db,
        changes
            .to_add
            .iter()
            .cloned()
            .map(pull_request_row)
            .collect(),
    )
    .await?;
    pull_request_assignee::delete_by_ids(db, &changes.to_remove).await?;
    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_and_migrate;

    fn record(issue: &str, assignee: &str) -> MemberRecord {
        MemberRecord {
            parent_node_id: issue.to_string(),
            parent_number: 1,
            parent_url: "https://example.com/acme/widget/issues/1".to_string(),
            repo_label: "acme/widget".to_string(),
            assignee_node_id: format!("U_{assignee}"),
            assignee_login: assignee.to_string(),
        }
    }

    #[test]
    fn diff_is_minimal_and_dedupes_desired() {
        let desired = vec![record("I_1", "alice"), record("I_1", "alice"), record("I_1", "bob")];
        let current = vec![(10, record("I_1", "alice")), (11, record("I_1", "carol"))];

        let changes = diff(&desired, &current);
        assert_eq!(changes.to_add, vec![record("I_1", "bob")]);
        assert_eq!(changes.to_remove, vec![11]);
    }

    #[test]
    fn diff_of_identical_sets_is_empty() {
        let desired = vec![record("I_1", "alice")];
        let current = vec![(10, record("I_1", "alice"))];
        assert!(diff(&desired, &current).is_empty());
    }

    #[tokio::test]
    async fn first_population_inserts_everything() {
        let db = connect_and_migrate("sqlite::memory:").await.unwrap();
        let desired = vec![record("I_1", "alice"), record("I_1", "bob")];

        let changes = reconcile_issue_assignees(&db, "I_1", &desired).await.unwrap();
        assert_eq!(changes.to_add.len(), 2);
        assert!(changes.to_remove.is_empty());

        let stored = crate::store::issue_assignee::find_by_parent(&db, "I_1")
            .await
            .unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[tokio::test]
    async fn reconcile_is_idempotent() {
        let db = connect_and_migrate("sqlite::memory:").await.unwrap();
        let desired = vec![record("I_1", "alice")];

        reconcile_issue_assignees(&db, "I_1", &desired).await.unwrap();
        let second = reconcile_issue_assignees(&db, "I_1", &desired).await.unwrap();
        assert!(second.is_empty());

        let stored = crate::store::issue_assignee::find_by_parent(&db, "I_1")
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn empty_desired_set_revokes_all_edges() {
        let db = connect_and_migrate("sqlite::memory:").await.unwrap();
        let desired = vec![record("I_1", "alice"), record("I_1", "bob")];
        reconcile_issue_assignees(&db, "I_1", &desired).await.unwrap();

        let changes = reconcile_issue_assignees(&db, "I_1", &[]).await.unwrap();
        assert!(changes.to_add.is_empty());
        assert_eq!(changes.to_remove.len(), 2);

        let stored = crate::store::issue_assignee::find_by_parent(&db, "I_1")
            .await
            .unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn untouched_edges_keep_their_surrogate_ids() {
        let db = connect_and_migrate("sqlite::memory:").await.unwrap();
        reconcile_issue_assignees(&db, "I_1", &[record("I_1", "alice")])
            .await
            .unwrap();
        let before = crate::store::issue_assignee::find_by_parent(&db, "I_1")
            .await
            .unwrap();

        reconcile_issue_assignees(&db, "I_1", &[record("I_1", "alice"), record("I_1", "bob")])
            .await
            .unwrap();
        let after = crate::store::issue_assignee::find_by_parent(&db, "I_1")
            .await
            .unwrap();

        let alice_before = before.iter().find(|m| m.assignee_login == "alice").unwrap();
        let alice_after = after.iter().find(|m| m.assignee_login == "alice").unwrap();
        assert_eq!(alice_before.id, alice_after.id);
    }
}
