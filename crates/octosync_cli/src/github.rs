//! GitHub REST client implementing the octosync source seam.
//!
//! Pagination tokens are page numbers rendered as strings. The issues listing
//! also carries pull requests (rows with a `pull_request` object), so one
//! request feeds both entity kinds. Contributors are fetched alongside the
//! first page only.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use octosync::entity::issue_state::IssueState;
use octosync::entity::pull_request_state::PullRequestState;
use octosync::entity::repository::split_label;
use octosync::source::{
    SourceAssignee, SourceClient, SourceContributor, SourceError, SourceIssue, SourcePage,
    SourcePullRequest,
};
use reqwest::{header, StatusCode};
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://api.github.com";
const PER_PAGE: usize = 100;

pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct RepoDto {
    node_id: String,
    owner: OwnerDto,
}

#[derive(Debug, Deserialize)]
struct OwnerDto {
    node_id: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct IssueDto {
    node_id: String,
    number: i32,
    html_url: String,
    state: String,
    closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    assignees: Vec<AccountDto>,
    /// Present when the row is actually a pull request.
    pull_request: Option<PullRequestMarkerDto>,
}

#[derive(Debug, Deserialize)]
struct PullRequestMarkerDto {
    merged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct AccountDto {
    node_id: String,
    login: String,
}

#[derive(Debug, Deserialize)]
struct UserDto {
    node_id: String,
    login: String,
    company: Option<String>,
    location: Option<String>,
}

impl GitHubClient {
    pub fn new(token: &str) -> Result<Self, SourceError> {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self, SourceError> {
        let mut headers = header::HeaderMap::new();
        let mut auth = header::HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| SourceError::Auth)?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            header::HeaderValue::from_static("2022-11-28"),
        );

        let http = reqwest::Client::builder()
            .user_agent(concat!("octosync/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| SourceError::network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, SourceError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| SourceError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status, response.headers(), path));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SourceError::internal(format!("decoding {path}: {e}")))
    }

    async fn fetch_contributors(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Vec<SourceContributor>, SourceError> {
        let accounts: Vec<AccountDto> = self
            .get_json(
                &format!("/repos/{owner}/{name}/contributors"),
                &[("per_page", PER_PAGE.to_string())],
            )
            .await?;

        let mut contributors = Vec::with_capacity(accounts.len());
        for account in accounts {
            let user: UserDto = self.get_json(&format!("/users/{}", account.login), &[]).await?;
            contributors.push(SourceContributor {
                node_id: user.node_id,
                login: user.login,
                company: user.company,
                location: user.location,
            });
        }
        Ok(contributors)
    }
}

#[async_trait]
impl SourceClient for GitHubClient {
    async fn fetch_page(
        &self,
        repo_label: &str,
        cursor: Option<&str>,
    ) -> octosync::source::Result<SourcePage> {
        let (owner, name) = split_label(repo_label)
            .ok_or_else(|| SourceError::internal(format!("bad repository label: {repo_label}")))?;
        let page: usize = cursor.and_then(|c| c.parse().ok()).unwrap_or(1);

        let repo: RepoDto = self.get_json(&format!("/repos/{owner}/{name}"), &[]).await?;

        let rows: Vec<IssueDto> = self
            .get_json(
                &format!("/repos/{owner}/{name}/issues"),
                &[
                    ("state", "all".to_string()),
                    ("per_page", PER_PAGE.to_string()),
                    ("page", page.to_string()),
                ],
            )
            .await?;
        let has_more = rows.len() == PER_PAGE;

        let mut issues = Vec::new();
        let mut pull_requests = Vec::new();
        for row in rows {
            let assignees = row
                .assignees
                .iter()
                .map(|a| SourceAssignee {
                    node_id: a.node_id.clone(),
                    login: a.login.clone(),
                })
                .collect();

            match &row.pull_request {
                Some(marker) => pull_requests.push(SourcePullRequest {
                    state: pull_request_state(&row.state, marker.merged_at),
                    node_id: row.node_id,
                    number: row.number,
                    url: row.html_url,
                    merged_at: marker.merged_at,
                    closed_at: row.closed_at,
                    assignees,
                }),
                None => issues.push(SourceIssue {
                    state: issue_state(&row.state),
                    node_id: row.node_id,
                    number: row.number,
                    url: row.html_url,
                    closed_at: row.closed_at,
                    assignees,
                }),
            }
        }

        let contributors = if page == 1 {
            self.fetch_contributors(owner, name).await?
        } else {
            Vec::new()
        };

        Ok(SourcePage {
            repo_node_id: repo.node_id,
            owner_node_id: (repo.owner.kind == "Organization").then_some(repo.owner.node_id),
            issues,
            pull_requests,
            contributors,
            end_cursor: has_more.then(|| (page + 1).to_string()),
            has_more,
            fetched_at: Utc::now(),
        })
    }
}

fn issue_state(state: &str) -> IssueState {
    match state {
        "closed" => IssueState::Closed,
        _ => IssueState::Open,
    }
}

fn pull_request_state(state: &str, merged_at: Option<DateTime<Utc>>) -> PullRequestState {
    if merged_at.is_some() {
        PullRequestState::Merged
    } else if state == "closed" {
        PullRequestState::Closed
    } else {
        PullRequestState::Open
    }
}

/// Map an HTTP error status to the source error taxonomy.
fn classify_status(
    status: StatusCode,
    headers: &header::HeaderMap,
    resource: &str,
) -> SourceError {
    match status {
        StatusCode::UNAUTHORIZED => SourceError::Auth,
        StatusCode::NOT_FOUND | StatusCode::GONE => SourceError::gone(resource),
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            // GitHub signals throttling on both statuses; the reset header
            // carries a unix timestamp.
            let remaining = headers
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok());
            if status == StatusCode::TOO_MANY_REQUESTS || remaining == Some("0") {
                let reset_at = headers
                    .get("x-ratelimit-reset")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<i64>().ok())
                    .and_then(|secs| Utc.timestamp_opt(secs, 0).single());
                SourceError::RateLimited { reset_at }
            } else {
                SourceError::internal(format!("{status} on {resource}"))
            }
        }
        _ => SourceError::internal(format!("{status} on {resource}")),
    }
}
