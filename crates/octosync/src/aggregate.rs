//! Counter rollups over the mirror.
//!
//! Aggregates are computed from the mirrored rows, never fetched upstream.
//! Contributor counts are deduplicated by account node id, so one account
//! active in several repositories of a scope counts once.

use std::collections::HashSet;

use sea_orm::DatabaseConnection;

use crate::entity::prelude::{OrganizationModel, SyncGroupModel};
use crate::store::errors::{Result, StoreError};
use crate::store::{contributor, group, issue, organization, pull_request, repository};

/// Count distinct contributors across the repositories owned by an
/// organization.
pub async fn contributor_count_by_org(db: &DatabaseConnection, org_node_id: &str) -> Result<u64> {
    let repos = repository::node_ids_by_owner_node_id(db, org_node_id).await?;
    let ids = contributor::distinct_node_ids_by_repos(db, &repos).await?;
    Ok(ids.len() as u64)
}

/// Resolve the full repository scope of a group: repositories attached
/// directly, plus every repository owned by an attached organization.
pub async fn group_repo_scope(db: &DatabaseConnection, group_name: &str) -> Result<Vec<String>> {
    let mut scope: HashSet<String> = group::repository_node_ids(db, group_name)
        .await?
        .into_iter()
        .collect();
    for org_node_id in group::organization_node_ids(db, group_name).await? {
        scope.extend(repository::node_ids_by_owner_node_id(db, &org_node_id).await?);
    }
    Ok(scope.into_iter().collect())
}

/// Count distinct contributors across a group's full repository scope.
pub async fn contributor_count_by_group(db: &DatabaseConnection, group_name: &str) -> Result<u64> {
    let scope = group_repo_scope(db, group_name).await?;
    let ids = contributor::distinct_node_ids_by_repos(db, &scope).await?;
    Ok(ids.len() as u64)
}

/// Recompute and persist an organization's counters from its mirrored rows.
///
/// Star and fork counts are not derivable from the mirror and are preserved
/// as stored.
pub async fn refresh_organization(
    db: &DatabaseConnection,
    org_node_id: &str,
) -> Result<OrganizationModel> {
    let current = organization::find(db, org_node_id)
        .await?
        .ok_or_else(|| StoreError::not_found_by_node_id("organization", org_node_id))?;

    let repos = repository::node_ids_by_owner_node_id(db, org_node_id).await?;
    let issue_count = issue::count_by_repos(db, &repos).await?;
    let pull_request_count = pull_request::count_by_repos(db, &repos).await?;
    let contributor_count = contributor::distinct_node_ids_by_repos(db, &repos).await?.len();

    organization::update_counters(
        db,
        org_node_id,
        issue_count as i32,
        pull_request_count as i32,
        current.star_count,
        current.fork_count,
        contributor_count as i32,
    )
    .await
}

/// Recompute and persist a group's counters from its full repository scope.
///
/// Star and fork counts are preserved as stored.
pub async fn refresh_group(db: &DatabaseConnection, group_name: &str) -> Result<SyncGroupModel> {
    let current = group::find(db, group_name)
        .await?
        .ok_or_else(|| StoreError::not_found_by_name("group", group_name))?;

    let scope = group_repo_scope(db, group_name).await?;
    let issue_count = issue::count_by_repos(db, &scope).await?;
    let pull_request_count = pull_request::count_by_repos(db, &scope).await?;
    let contributor_count = contributor::distinct_node_ids_by_repos(db, &scope).await?.len();

    group::update_counters(
        db,
        group_name,
        issue_count as i32,
        pull_request_count as i32,
        current.star_count,
        current.fork_count,
        contributor_count as i32,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_and_migrate;
    use crate::entity::issue_state::IssueState;
    use crate::entity::prelude::{ContributorModel, IssueModel, RepositoryModel};

    fn repo(node_id: &str, owner: &str, name: &str, owner_node_id: Option<&str>) -> RepositoryModel {
        RepositoryModel {
            node_id: node_id.to_string(),
            owner: owner.to_string(),
            name: name.to_string(),
            owner_node_id: owner_node_id.map(str::to_string),
        }
    }

    fn contributor_row(node_id: &str, repo: &str) -> ContributorModel {
        ContributorModel {
            node_id: node_id.to_string(),
            repo_node_id: repo.to_string(),
            login: node_id.to_ascii_lowercase(),
            company: None,
            location: None,
        }
    }

    async fn seed_group_scope(db: &DatabaseConnection) {
        // Group "core" holds repo R_1 directly and organization O_1, which
        // owns R_2 and R_3. R_4 stays outside the group.
        organization::create(
            db,
            crate::entity::prelude::OrganizationModel {
                node_id: "O_1".to_string(),
                name: "acme".to_string(),
                issue_count: 0,
                pull_request_count: 0,
                star_count: 0,
                fork_count: 0,
                contributor_count: 0,
            },
        )
        .await
        .unwrap();

        for (id, owner, name, org) in [
            ("R_1", "solo", "widget", None),
            ("R_2", "acme", "gadget", Some("O_1")),
            ("R_3", "acme", "gizmo", Some("O_1")),
            ("R_4", "other", "thing", None),
        ] {
            repository::create(db, repo(id, owner, name, org)).await.unwrap();
        }

        group::create(db, "core").await.unwrap();
        group::add_repository(db, "core", "R_1").await.unwrap();
        group::add_organization(db, "core", "O_1").await.unwrap();
    }

    #[tokio::test]
    async fn group_contributor_count_unions_direct_and_org_repos() {
        let db = connect_and_migrate("sqlite::memory:").await.unwrap();
        seed_group_scope(&db).await;

        contributor::upsert_many(
            &db,
            vec![
                contributor_row("U_1", "R_1"),
                contributor_row("U_1", "R_2"), // same account twice in scope
                contributor_row("U_2", "R_2"),
                contributor_row("U_3", "R_3"),
                contributor_row("U_4", "R_4"), // outside the group
            ],
        )
        .await
        .unwrap();

        let count = contributor_count_by_group(&db, "core").await.unwrap();
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn refresh_group_preserves_star_and_fork_counts() {
        let db = connect_and_migrate("sqlite::memory:").await.unwrap();
        seed_group_scope(&db).await;
        group::update_counters(&db, "core", 0, 0, 42, 7, 0).await.unwrap();

        issue::insert_many(
            &db,
            vec![
                IssueModel {
                    node_id: "I_1".to_string(),
                    repo_node_id: "R_2".to_string(),
                    number: 1,
                    url: "https://example.com/acme/gadget/issues/1".to_string(),
                    state: IssueState::Open,
                    closed_at: None,
                },
                IssueModel {
                    node_id: "I_2".to_string(),
                    repo_node_id: "R_4".to_string(),
                    number: 1,
                    url: "https://example.com/other/thing/issues/1".to_string(),
                    state: IssueState::Open,
                    closed_at: None,
                },
            ],
        )
        .await
        .unwrap();

        let refreshed = refresh_group(&db, "core").await.unwrap();
        assert_eq!(refreshed.issue_count, 1);
        assert_eq!(refreshed.star_count, 42);
        assert_eq!(refreshed.fork_count, 7);
    }

    #[tokio::test]
    async fn org_contributor_count_covers_only_owned_repos() {
        let db = connect_and_migrate("sqlite::memory:").await.unwrap();
        seed_group_scope(&db).await;

        contributor::upsert_many(
            &db,
            vec![
                contributor_row("U_1", "R_1"), // not owned by O_1
                contributor_row("U_2", "R_2"),
                contributor_row("U_2", "R_3"),
            ],
        )
        .await
        .unwrap();

        assert_eq!(contributor_count_by_org(&db, "O_1").await.unwrap(), 1);
    }
}
