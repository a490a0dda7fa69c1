//! Per-repository sync checkpoints.
//!
//! A checkpoint records how far a repository has been mirrored: the timestamp
//! of the last committed page and the upstream pagination token to resume
//! from. Checkpoints are only committed after the page they describe has been
//! fully persisted, so a crash never advances a repository past durable data.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Set};

use crate::entity::prelude::{Cursor, CursorModel};

use super::errors::Result;

/// A repository's resume position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub repo_node_id: String,
    pub repo_label: String,
    pub last_update: DateTime<Utc>,
    pub end_cursor: Option<String>,
}

impl Checkpoint {
    /// The position of a repository that has never been synced: epoch
    /// timestamp, no pagination token.
    pub fn initial(repo_node_id: &str, repo_label: &str) -> Self {
        Self {
            repo_node_id: repo_node_id.to_string(),
            repo_label: repo_label.to_string(),
            last_update: DateTime::UNIX_EPOCH,
            end_cursor: None,
        }
    }
}

impl From<CursorModel> for Checkpoint {
    fn from(model: CursorModel) -> Self {
        Self {
            repo_node_id: model.repo_node_id,
            repo_label: model.repo_label,
            last_update: model.last_update,
            end_cursor: model.end_cursor,
        }
    }
}

/// Find the stored checkpoint of a repository, if any.
///
/// `None` means the repository has never been synced.
pub async fn find(db: &DatabaseConnection, repo_node_id: &str) -> Result<Option<Checkpoint>> {
    Ok(Cursor::find_by_id(repo_node_id)
        .one(db)
        .await?
        .map(Checkpoint::from))
}

/// Fetch the checkpoint of a repository, falling back to the initial position
/// when none is stored.
pub async fn get(
    db: &DatabaseConnection,
    repo_node_id: &str,
    repo_label: &str,
) -> Result<Checkpoint> {
    Ok(find(db, repo_node_id)
        .await?
        .unwrap_or_else(|| Checkpoint::initial(repo_node_id, repo_label)))
}

/// Persist a checkpoint, inserting or overwriting the repository's row.
pub async fn commit(db: &DatabaseConnection, checkpoint: &Checkpoint) -> Result<()> {
    match Cursor::find_by_id(checkpoint.repo_node_id.as_str())
        .one(db)
        .await?
    {
        Some(current) => {
            let mut active = current.into_active_model();
            active.repo_label = Set(checkpoint.repo_label.clone());
            active.last_update = Set(checkpoint.last_update);
            active.end_cursor = Set(checkpoint.end_cursor.clone());
            active.update(db).await?;
        }
        None => {
            let model = CursorModel {
                repo_node_id: checkpoint.repo_node_id.clone(),
                repo_label: checkpoint.repo_label.clone(),
                last_update: checkpoint.last_update,
                end_cursor: checkpoint.end_cursor.clone(),
            };
            model.into_active_model().reset_all().insert(db).await?;
        }
    }
    Ok(())
}

/// Delete the checkpoint of a repository.
///
/// Returns the number of rows deleted (0 or 1).
pub async fn delete(db: &DatabaseConnection, repo_node_id: &str) -> Result<u64> {
    let result = Cursor::delete_by_id(repo_node_id).exec(db).await?;
    Ok(result.rows_affected)
}
