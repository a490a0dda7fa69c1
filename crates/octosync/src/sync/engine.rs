//! Per-repository sync: fetch pages, persist, advance the checkpoint.

use sea_orm::DatabaseConnection;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::entity::prelude::RepositoryModel;
use crate::entity::repository::split_label;
use crate::reconcile::{reconcile_issue_assignees, reconcile_pull_request_assignees};
use crate::source::{SourceClient, SourceError, SourcePage};
use crate::store::errors::StoreError;
use crate::store::{
    checkpoint, contributor, issue, issue_assignee, organization, pull_request,
    pull_request_assignee, repository, Checkpoint,
};

use super::types::RepoSyncStats;

/// Errors surfaced while syncing one repository.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The repository label is not of the `owner/name` form.
    #[error("Invalid repository label: {label}")]
    InvalidLabel { label: String },

    /// The run was cancelled before the repository finished.
    #[error("Sync cancelled")]
    Cancelled,
}

impl SyncError {
    /// Whether another attempt at the same repository can reasonably succeed.
    ///
    /// Database transport failures (a locked SQLite file, a dropped
    /// connection) are transient; `NotFound` and `Duplicate` point at caller
    /// logic and retrying them would just repeat the mistake.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Source(e) => e.is_retryable(),
            Self::Store(StoreError::Database(_)) => true,
            Self::Store(_) | Self::InvalidLabel { .. } | Self::Cancelled => false,
        }
    }
}

/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Sync one repository to completion: fetch pages from its stored checkpoint
/// until the upstream reports no more, persisting each page before advancing
/// the checkpoint.
///
/// A page is durable before its checkpoint commits, so an interrupted run
/// resumes at the last committed page and re-persisting that page is
/// idempotent.
#[instrument(skip(db, client, cancel), fields(repo = %repo_label))]
pub async fn sync_repository<C: SourceClient + ?Sized>(
    db: &DatabaseConnection,
    client: &C,
    repo_label: &str,
    cancel: &CancellationToken,
) -> Result<RepoSyncStats> {
    let (owner, name) = split_label(repo_label).ok_or_else(|| SyncError::InvalidLabel {
        label: repo_label.to_string(),
    })?;

    let mut stats = RepoSyncStats {
        repo_label: repo_label.to_string(),
        ..RepoSyncStats::default()
    };

    // The checkpoint is keyed by node id, which is only known once the
    // repository row exists.
    let mut cursor = match repository::node_id_by_owner_name(db, owner, name).await? {
        Some(node_id) => checkpoint::get(db, &node_id, repo_label).await?.end_cursor,
        None => None,
    };

    loop {
        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        // The fetch itself must observe cancellation: a hung upstream call
        // would otherwise pin the cycle past shutdown.
        let page = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SyncError::Cancelled),
            page = client.fetch_page(repo_label, cursor.as_deref()) => page?,
        };
        persist_page(db, owner, name, repo_label, &page, &mut stats).await?;

        let next = Checkpoint {
            repo_node_id: page.repo_node_id.clone(),
            repo_label: repo_label.to_string(),
            last_update: page.fetched_at,
            end_cursor: page.end_cursor.clone(),
        };
        checkpoint::commit(db, &next).await?;

        stats.repo_node_id = page.repo_node_id.clone();
        stats.pages += 1;
        debug!(
            page = stats.pages,
            has_more = page.has_more,
            "committed page"
        );

        if !page.has_more {
            return Ok(stats);
        }
        cursor = page.end_cursor;
    }
}

/// Remove every trace of a repository from the mirror: its entities, its
/// assignment edges, its checkpoint, and the repository row itself.
///
/// A label that was never synced is a no-op. The next sync of the same label
/// starts from the beginning.
pub async fn untrack_repository(db: &DatabaseConnection, repo_label: &str) -> Result<()> {
    let (owner, name) = split_label(repo_label).ok_or_else(|| SyncError::InvalidLabel {
        label: repo_label.to_string(),
    })?;
    let Some(node_id) = repository::node_id_by_owner_name(db, owner, name).await? else {
        return Ok(());
    };

    issue_assignee::delete_by_repo_label(db, repo_label).await?;
    pull_request_assignee::delete_by_repo_label(db, repo_label).await?;
    issue::delete_by_repo(db, &node_id).await?;
    pull_request::delete_by_repo(db, &node_id).await?;
    contributor::delete_by_repo(db, &node_id).await?;
    checkpoint::delete(db, &node_id).await?;
    repository::delete(db, &node_id).await?;
    debug!(repo = %repo_label, "repository untracked");
    Ok(())
}

/// Persist everything a page carries. Called before the page's checkpoint is
/// committed.
async fn persist_page(
    db: &DatabaseConnection,
    owner: &str,
    name: &str,
    repo_label: &str,
    page: &SourcePage,
    stats: &mut RepoSyncStats,
) -> Result<()> {
    ensure_repository(db, owner, name, page).await?;

    let mut new_issues = Vec::new();
    for src in &page.issues {
        if issue::exists(db, &src.node_id).await? {
            issue::update_state(db, &src.node_id, src.state, src.closed_at).await?;
            stats.issues_updated += 1;
        } else {
            new_issues.push(src.to_model(&page.repo_node_id));
        }
    }
    stats.issues_inserted += new_issues.len() as u64;
    issue::insert_many(db, new_issues).await?;

    for src in &page.issues {
        let desired = src.member_records(repo_label);
        let changes = reconcile_issue_assignees(db, &src.node_id, &desired).await?;
        stats.assignee_edges_added += changes.to_add.len() as u64;
        stats.assignee_edges_removed += changes.to_remove.len() as u64;
    }

    let mut new_pull_requests = Vec::new();
    for src in &page.pull_requests {
        if pull_request::exists(db, &src.node_id).await? {
            pull_request::update_state(db, &src.node_id, src.state, src.merged_at, src.closed_at)
                .await?;
            stats.pull_requests_updated += 1;
        } else {
            new_pull_requests.push(src.to_model(&page.repo_node_id));
        }
    }
    stats.pull_requests_inserted += new_pull_requests.len() as u64;
    pull_request::insert_many(db, new_pull_requests).await?;

    for src in &page.pull_requests {
        let desired = src.member_records(repo_label);
        let changes = reconcile_pull_request_assignees(db, &src.node_id, &desired).await?;
        stats.assignee_edges_added += changes.to_add.len() as u64;
        stats.assignee_edges_removed += changes.to_remove.len() as u64;
    }

    let contributors: Vec<_> = page
        .contributors
        .iter()
        .map(|c| c.to_model(&page.repo_node_id))
        .collect();
    stats.contributors_upserted += contributors.len() as u64;
    contributor::upsert_many(db, contributors).await?;

    Ok(())
}

/// Make sure the repository row (and its owning organization, when known)
/// exists before child rows reference it.
async fn ensure_repository(
    db: &DatabaseConnection,
    owner: &str,
    name: &str,
    page: &SourcePage,
) -> Result<()> {
    if let Some(org_node_id) = &page.owner_node_id {
        if !organization::exists(db, org_node_id).await? {
            organization::create(
                db,
                crate::entity::prelude::OrganizationModel {
                    node_id: org_node_id.clone(),
                    name: owner.to_string(),
                    issue_count: 0,
                    pull_request_count: 0,
                    star_count: 0,
                    fork_count: 0,
                    contributor_count: 0,
                },
            )
            .await?;
        }
    }

    match repository::find(db, &page.repo_node_id).await? {
        Some(existing) => {
            if existing.owner_node_id.is_none() {
                if let Some(org_node_id) = &page.owner_node_id {
                    repository::set_owner_node_id(db, &page.repo_node_id, org_node_id).await?;
                }
            }
        }
        None => {
            repository::create(
                db,
                RepositoryModel {
                    node_id: page.repo_node_id.clone(),
                    owner: owner.to_string(),
                    name: name.to_string(),
                    owner_node_id: page.owner_node_id.clone(),
                },
            )
            .await?;
        }
    }
    Ok(())
}
