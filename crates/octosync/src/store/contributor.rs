//! Persistence for mirrored contributors.
//!
//! Contributors are keyed per repository: the same account contributing to two
//! repositories is stored as two rows sharing a node id.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QuerySelect, Set,
};

use crate::entity::prelude::{Contributor, ContributorColumn, ContributorModel};

use super::errors::Result;

/// Insert a batch of contributors.
///
/// An empty batch is a no-op.
pub async fn insert_many(db: &DatabaseConnection, models: Vec<ContributorModel>) -> Result<()> {
    if models.is_empty() {
        return Ok(());
    }
    let actives = models
        .into_iter()
        .map(|m| m.into_active_model().reset_all());
    Contributor::insert_many(actives).exec(db).await?;
    Ok(())
}

/// Find a contributor row by its (node id, repository) pair.
pub async fn find(
    db: &DatabaseConnection,
    node_id: &str,
    repo_node_id: &str,
) -> Result<Option<ContributorModel>> {
    Ok(
        Contributor::find_by_id((node_id.to_string(), repo_node_id.to_string()))
            .one(db)
            .await?,
    )
}

/// Insert or overwrite a batch of contributors, keyed by (node id, repository).
///
/// Re-observing a known contributor refreshes its login and profile fields
/// rather than creating a second row.
pub async fn upsert_many(db: &DatabaseConnection, models: Vec<ContributorModel>) -> Result<()> {
    for model in models {
        match find(db, &model.node_id, &model.repo_node_id).await? {
            Some(current) => {
                let mut active = current.into_active_model();
                active.login = Set(model.login);
                active.company = Set(model.company);
                active.location = Set(model.location);
                active.update(db).await?;
            }
            None => {
                let active = model.into_active_model().reset_all();
                active.insert(db).await?;
            }
        }
    }
    Ok(())
}

/// List all contributor rows of a repository.
pub async fn find_by_repo(
    db: &DatabaseConnection,
    repo_node_id: &str,
) -> Result<Vec<ContributorModel>> {
    Ok(Contributor::find()
        .filter(ContributorColumn::RepoNodeId.eq(repo_node_id))
        .all(db)
        .await?)
}

/// List distinct contributor node ids across a set of repositories.
pub async fn distinct_node_ids_by_repos(
    db: &DatabaseConnection,
    repo_node_ids: &[String],
) -> Result<Vec<String>> {
    if repo_node_ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(Contributor::find()
        .select_only()
        .column(ContributorColumn::NodeId)
        .distinct()
        .filter(ContributorColumn::RepoNodeId.is_in(repo_node_ids.iter().map(String::as_str)))
        .into_tuple::<String>()
        .all(db)
        .await?)
}

/// Apply a profile rewrite to every stored contributor.
///
/// Rows left unmodified by the rewrite are not written back.
pub async fn normalize_profiles<F>(db: &DatabaseConnection, rewrite: F) -> Result<u64>
where
    F: Fn(&mut ContributorModel),
{
    let all = Contributor::find().all(db).await?;
    let mut rewritten = 0u64;
    for current in all {
        let mut candidate = current.clone();
        rewrite(&mut candidate);
        if candidate == current {
            continue;
        }
        let mut active = current.into_active_model();
        active.login = Set(candidate.login);
        active.company = Set(candidate.company);
        active.location = Set(candidate.location);
        active.update(db).await?;
        rewritten += 1;
    }
    Ok(rewritten)
}

/// Delete all contributor rows of a repository.
///
/// Returns the number of rows deleted.
pub async fn delete_by_repo(db: &DatabaseConnection, repo_node_id: &str) -> Result<u64> {
    let result = Contributor::delete_many()
        .filter(ContributorColumn::RepoNodeId.eq(repo_node_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_and_migrate;

    fn model(node_id: &str, repo: &str, login: &str) -> ContributorModel {
        ContributorModel {
            node_id: node_id.to_string(),
            repo_node_id: repo.to_string(),
            login: login.to_string(),
            company: None,
            location: None,
        }
    }

    #[tokio::test]
    async fn upsert_many_refreshes_instead_of_duplicating() {
        let db = connect_and_migrate("sqlite::memory:").await.unwrap();
        upsert_many(&db, vec![model("U_1", "R_1", "alice")])
            .await
            .unwrap();

        let mut renamed = model("U_1", "R_1", "alice-renamed");
        renamed.company = Some("acme".to_string());
        upsert_many(&db, vec![renamed]).await.unwrap();

        let rows = find_by_repo(&db, "R_1").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].login, "alice-renamed");
        assert_eq!(rows[0].company.as_deref(), Some("acme"));
    }

    #[tokio::test]
    async fn distinct_node_ids_collapse_across_repos() {
        let db = connect_and_migrate("sqlite::memory:").await.unwrap();
        upsert_many(
            &db,
            vec![
                model("U_1", "R_1", "alice"),
                model("U_1", "R_2", "alice"),
                model("U_2", "R_2", "bob"),
            ],
        )
        .await
        .unwrap();

        let mut ids = distinct_node_ids_by_repos(&db, &["R_1".to_string(), "R_2".to_string()])
            .await
            .unwrap();
        ids.sort();
        assert_eq!(ids, vec!["U_1", "U_2"]);
    }

    #[tokio::test]
    async fn normalize_profiles_skips_unchanged_rows() {
        let db = connect_and_migrate("sqlite::memory:").await.unwrap();
        let mut with_at = model("U_1", "R_1", "alice");
        with_at.company = Some("@acme".to_string());
        upsert_many(&db, vec![with_at, model("U_2", "R_1", "bob")])
            .await
            .unwrap();

        let rewritten = normalize_profiles(&db, |c| {
            if let Some(company) = &c.company {
                c.company = Some(company.trim_start_matches('@').to_string());
            }
        })
        .await
        .unwrap();

        assert_eq!(rewritten, 1);
        let alice = find(&db, "U_1", "R_1").await.unwrap().unwrap();
        assert_eq!(alice.company.as_deref(), Some("acme"));
    }
}
