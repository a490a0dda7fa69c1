//! Upstream source abstraction.
//!
//! The sync engine talks to the upstream platform through [`SourceClient`], a
//! paged fetch trait. Implementations live with the application; the engine
//! only depends on the page shape and the error taxonomy defined here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::entity::issue_state::IssueState;
use crate::entity::prelude::{ContributorModel, IssueModel, PullRequestModel};
use crate::entity::pull_request_state::PullRequestState;
use crate::reconcile::MemberRecord;

/// Errors surfaced by an upstream source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The upstream throttled the client.
    #[error("Rate limited{}", reset_at.as_ref().map(|t| format!(", resets at {t}")).unwrap_or_default())]
    RateLimited { reset_at: Option<DateTime<Utc>> },

    /// Transport-level failure.
    #[error("Network error: {message}")]
    Network { message: String },

    /// The requested resource no longer exists upstream.
    #[error("Gone: {resource}")]
    Gone { resource: String },

    /// Credentials were rejected.
    #[error("Authentication failed")]
    Auth,

    /// Anything else.
    #[error("Source error: {message}")]
    Internal { message: String },
}

impl SourceError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn gone(resource: impl Into<String>) -> Self {
        Self::Gone {
            resource: resource.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether retrying the same request can reasonably succeed.
    ///
    /// Throttling and transport failures are transient; missing resources and
    /// bad credentials are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Network { .. })
    }
}

/// Result type alias for source operations.
pub type Result<T> = std::result::Result<T, SourceError>;

/// An account referenced as an assignee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAssignee {
    pub node_id: String,
    pub login: String,
}

/// An issue as observed upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceIssue {
    pub node_id: String,
    pub number: i32,
    pub url: String,
    pub state: IssueState,
    pub closed_at: Option<DateTime<Utc>>,
    pub assignees: Vec<SourceAssignee>,
}

/// A pull request as observed upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePullRequest {
    pub node_id: String,
    pub number: i32,
    pub url: String,
    pub state: PullRequestState,
    pub merged_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub assignees: Vec<SourceAssignee>,
}

/// A contributor as observed upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceContributor {
    pub node_id: String,
    pub login: String,
    pub company: Option<String>,
    pub location: Option<String>,
}

/// One page of upstream data for a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePage {
    /// Node id of the repository the page belongs to.
    pub repo_node_id: String,
    /// Node id of the owning organization, when the owner is one.
    pub owner_node_id: Option<String>,
    pub issues: Vec<SourceIssue>,
    pub pull_requests: Vec<SourcePullRequest>,
    pub contributors: Vec<SourceContributor>,
    /// Pagination token to resume from, if the upstream handed one out.
    pub end_cursor: Option<String>,
    /// Whether another page follows this one.
    pub has_more: bool,
    pub fetched_at: DateTime<Utc>,
}

/// Paged access to an upstream platform.
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// Fetch one page of data for `repo_label` (an `owner/name` pair),
    /// resuming from `cursor` when given.
    async fn fetch_page(&self, repo_label: &str, cursor: Option<&str>) -> Result<SourcePage>;
}

impl SourceIssue {
    pub fn to_model(&self, repo_node_id: &str) -> IssueModel {
        IssueModel {
            node_id: self.node_id.clone(),
            repo_node_id: repo_node_id.to_string(),
            number: self.number,
            url: self.url.clone(),
            state: self.state,
            closed_at: self.closed_at,
        }
    }

    pub fn member_records(&self, repo_label: &str) -> Vec<MemberRecord> {
        self.assignees
            .iter()
            .map(|a| MemberRecord {
                parent_node_id: self.node_id.clone(),
                parent_number: self.number,
                parent_url: self.url.clone(),
                repo_label: repo_label.to_string(),
                assignee_node_id: a.node_id.clone(),
                assignee_login: a.login.clone(),
            })
            .collect()
    }
}

impl SourcePullRequest {
    pub fn to_model(&self, repo_node_id: &str) -> PullRequestModel {
        PullRequestModel {
            node_id: self.node_id.clone(),
            repo_node_id: repo_node_id.to_string(),
            number: self.number,
            url: self.url.clone(),
            state: self.state,
            merged_at: self.merged_at,
            closed_at: self.closed_at,
        }
    }

    pub fn member_records(&self, repo_label: &str) -> Vec<MemberRecord> {
        self.assignees
            .iter()
            .map(|a| MemberRecord {
                parent_node_id: self.node_id.clone(),
                parent_number: self.number,
                parent_url: self.url.clone(),
                repo_label: repo_label.to_string(),
                assignee_node_id: a.node_id.clone(),
                assignee_login: a.login.clone(),
            })
            .collect()
    }
}

impl SourceContributor {
    pub fn to_model(&self, repo_node_id: &str) -> ContributorModel {
        ContributorModel {
            node_id: self.node_id.clone(),
            repo_node_id: repo_node_id.to_string(),
            login: self.login.clone(),
            company: self.company.clone(),
            location: self.location.clone(),
        }
    }
}
