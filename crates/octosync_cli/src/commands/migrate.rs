//! The `migrate` command: manage the mirror schema.

use octosync::db;
use octosync::migration::{Migrator, MigratorTrait};
use tracing::info;

use crate::MigrateAction;

pub(crate) async fn handle_migrate(
    action: MigrateAction,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = db::connect(database_url).await?;

    match action {
        MigrateAction::Up => {
            let pending = Migrator::get_pending_migrations(&db).await?;
            if pending.is_empty() {
                info!("schema is up to date");
                return Ok(());
            }
            info!(pending = pending.len(), "applying migrations");
            Migrator::up(&db, None).await?;
            info!("schema migrated");
        }
        MigrateAction::Down => {
            info!("rolling back one migration");
            Migrator::down(&db, Some(1)).await?;
        }
        MigrateAction::Status => {
            for migration in Migrator::get_applied_migrations(&db).await? {
                println!("applied  {}", migration.name());
            }
            for migration in Migrator::get_pending_migrations(&db).await? {
                println!("pending  {}", migration.name());
            }
        }
        MigrateAction::Fresh => {
            info!("dropping the mirror schema and rebuilding it");
            Migrator::fresh(&db).await?;
        }
    }

    Ok(())
}
