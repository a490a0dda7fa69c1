//! End-to-end sync tests over an in-memory database.
//!
//! These exercise the whole pipeline: a scripted upstream serves pages, the
//! engine persists them and advances checkpoints, the orchestrator fans out
//! over repositories, and the rollups are recomputed from the mirror.
//!
//! Key scenarios tested:
//! - A crash mid-repository resumes from the last committed page
//! - Assignee churn across cycles converges via reconciliation
//! - Group counters reflect the union of direct and organization repos

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use octosync::connect_and_migrate;
use octosync::entity::issue_state::IssueState;
use octosync::source::{
    SourceAssignee, SourceClient, SourceContributor, SourceError, SourceIssue, SourcePage,
};
use octosync::store::{checkpoint, group, issue, issue_assignee};
use octosync::sync::{sync_repository, GroupSpec, Orchestrator, SyncSettings};
use tokio_util::sync::CancellationToken;

/// Maximum time any sync operation should take in tests.
/// If exceeded, there's likely a hang/deadlock.
const SYNC_TIMEOUT: Duration = Duration::from_secs(10);

/// Serves scripted pages per repository label, keyed by the cursor asked for.
struct ScriptedSource {
    pages: HashMap<(String, Option<String>), SourcePage>,
    fail_after: Mutex<Option<usize>>,
    calls: Mutex<usize>,
}

impl ScriptedSource {
    fn new() -> Self {
        Self {
            pages: HashMap::new(),
            fail_after: Mutex::new(None),
            calls: Mutex::new(0),
        }
    }

    fn with_page(mut self, label: &str, cursor: Option<&str>, page: SourcePage) -> Self {
        self.pages
            .insert((label.to_string(), cursor.map(str::to_string)), page);
        self
    }

    /// Make every fetch past the nth fail with a network error.
    fn fail_after(self, n: usize) -> Self {
        *self.fail_after.lock().unwrap_or_else(|e| e.into_inner()) = Some(n);
        self
    }
}

#[async_trait]
impl SourceClient for ScriptedSource {
    async fn fetch_page(
        &self,
        repo_label: &str,
        cursor: Option<&str>,
    ) -> octosync::source::Result<SourcePage> {
        {
            let mut calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
            *calls += 1;
            let limit = self.fail_after.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(limit) = *limit {
                if *calls > limit {
                    return Err(SourceError::network("connection reset by script"));
                }
            }
        }

        self.pages
            .get(&(repo_label.to_string(), cursor.map(str::to_string)))
            .cloned()
            .ok_or_else(|| SourceError::gone(format!("{repo_label} at {cursor:?}")))
    }
}

fn page(repo_node_id: &str, end_cursor: Option<&str>, has_more: bool) -> SourcePage {
    SourcePage {
        repo_node_id: repo_node_id.to_string(),
        owner_node_id: None,
        issues: Vec::new(),
        pull_requests: Vec::new(),
        contributors: Vec::new(),
        end_cursor: end_cursor.map(str::to_string),
        has_more,
        fetched_at: Utc::now(),
    }
}

fn open_issue(node_id: &str, number: i32, assignees: &[&str]) -> SourceIssue {
    SourceIssue {
        node_id: node_id.to_string(),
        number,
        url: format!("https://example.com/acme/widget/issues/{number}"),
        state: IssueState::Open,
        closed_at: None,
        assignees: assignees
            .iter()
            .map(|login| SourceAssignee {
                node_id: format!("U_{login}"),
                login: login.to_string(),
            })
            .collect(),
    }
}

fn contributor(login: &str) -> SourceContributor {
    SourceContributor {
        node_id: format!("U_{login}"),
        login: login.to_string(),
        company: None,
        location: None,
    }
}

#[tokio::test]
async fn interrupted_sync_resumes_without_refetching_committed_pages() {
    let db = connect_and_migrate("sqlite::memory:").await.unwrap();
    let cancel = CancellationToken::new();

    let mut first = page("R_1", Some("p2"), true);
    first.issues = vec![open_issue("I_1", 1, &[])];
    let mut second = page("R_1", Some("p3"), true);
    second.issues = vec![open_issue("I_2", 2, &[])];

    // First run: page one commits, page two commits, page three fails.
    let failing = ScriptedSource::new()
        .with_page("acme/widget", None, first)
        .with_page("acme/widget", Some("p2"), second)
        .fail_after(2);

    let err = tokio::time::timeout(
        SYNC_TIMEOUT,
        sync_repository(&db, &failing, "acme/widget", &cancel),
    )
    .await
    .expect("no hang")
    .expect_err("third page fails");
    assert!(err.is_retryable());

    // Both committed pages are durable.
    assert_eq!(issue::find_by_repo(&db, "R_1").await.unwrap().len(), 2);
    let stored = checkpoint::find(&db, "R_1").await.unwrap().unwrap();
    assert_eq!(stored.end_cursor.as_deref(), Some("p3"));

    // Second run: only the missing page is asked for.
    let mut third = page("R_1", None, false);
    third.issues = vec![open_issue("I_3", 3, &[])];
    let resuming = ScriptedSource::new().with_page("acme/widget", Some("p3"), third);

    let stats = tokio::time::timeout(
        SYNC_TIMEOUT,
        sync_repository(&db, &resuming, "acme/widget", &cancel),
    )
    .await
    .expect("no hang")
    .expect("resume succeeds");

    assert_eq!(stats.pages, 1);
    assert_eq!(issue::find_by_repo(&db, "R_1").await.unwrap().len(), 3);
}

#[tokio::test]
async fn assignee_churn_converges_across_cycles() {
    let db = connect_and_migrate("sqlite::memory:").await.unwrap();
    let cancel = CancellationToken::new();

    let mut first = page("R_1", None, false);
    first.issues = vec![open_issue("I_1", 1, &["alice", "bob"])];
    let source = ScriptedSource::new().with_page("acme/widget", None, first);
    sync_repository(&db, &source, "acme/widget", &cancel)
        .await
        .unwrap();

    let edges = issue_assignee::find_by_parent(&db, "I_1").await.unwrap();
    assert_eq!(edges.len(), 2);
    let alice_id = edges
        .iter()
        .find(|e| e.assignee_login == "alice")
        .unwrap()
        .id;

    // Next cycle: bob unassigned, carol assigned, alice untouched.
    let mut second = page("R_1", None, false);
    second.issues = vec![open_issue("I_1", 1, &["alice", "carol"])];
    let source = ScriptedSource::new().with_page("acme/widget", None, second);
    let stats = sync_repository(&db, &source, "acme/widget", &cancel)
        .await
        .unwrap();

    assert_eq!(stats.assignee_edges_added, 1);
    assert_eq!(stats.assignee_edges_removed, 1);

    let edges = issue_assignee::find_by_parent(&db, "I_1").await.unwrap();
    let mut logins: Vec<_> = edges.iter().map(|e| e.assignee_login.clone()).collect();
    logins.sort();
    assert_eq!(logins, vec!["alice", "carol"]);
    // Alice's row survived both cycles untouched.
    assert_eq!(
        edges.iter().find(|e| e.assignee_login == "alice").unwrap().id,
        alice_id
    );
}

#[tokio::test]
async fn full_cycle_rolls_up_group_counters() {
    let db = connect_and_migrate("sqlite::memory:").await.unwrap();

    let mut widget = page("R_widget", None, false);
    widget.owner_node_id = Some("O_acme".to_string());
    widget.issues = vec![open_issue("I_w1", 1, &[]), open_issue("I_w2", 2, &[])];
    widget.contributors = vec![contributor("alice"), contributor("bob")];

    let mut gadget = page("R_gadget", None, false);
    gadget.owner_node_id = Some("O_acme".to_string());
    gadget.issues = vec![open_issue("I_g1", 1, &[])];
    gadget.contributors = vec![contributor("alice")];

    let source = ScriptedSource::new()
        .with_page("acme/widget", None, widget)
        .with_page("acme/gadget", None, gadget);

    let orchestrator = Orchestrator::new(
        db.clone(),
        Arc::new(source),
        SyncSettings {
            repositories: vec!["acme/widget".to_string(), "acme/gadget".to_string()],
            groups: vec![GroupSpec {
                name: "core".to_string(),
                repositories: vec!["acme/widget".to_string()],
                organizations: vec!["acme".to_string()],
            }],
            ..SyncSettings::default()
        },
    );

    let report = tokio::time::timeout(
        SYNC_TIMEOUT,
        orchestrator.run_cycle(&CancellationToken::new()),
    )
    .await
    .expect("no hang")
    .expect("cycle succeeds");
    assert!(report.is_clean());
    assert_eq!(report.synced.len(), 2);

    // Both repos fall in scope (one direct, one via the organization), and
    // alice counts once.
    let stored = group::find(&db, "core").await.unwrap().unwrap();
    assert_eq!(stored.issue_count, 3);
    assert_eq!(stored.contributor_count, 2);

    let org = octosync::store::organization::find(&db, "O_acme")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(org.issue_count, 3);
    assert_eq!(org.contributor_count, 2);
}
