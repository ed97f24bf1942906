use anyhow::Result;
use serde::Serialize;
use sqlx::PgPool;
use sqlx::migrate::{Migrate, Migrator};
use std::collections::HashSet;

/// Schema for `users` and `friend_connections`, embedded at build time.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// One embedded migration and whether the database has it.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationStatus {
    pub version: i64,
    pub description: String,
    pub applied: bool,
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    let pending = migration_status(pool)
        .await?
        .into_iter()
        .filter(|m| !m.applied)
        .count();

    MIGRATOR.run(pool).await?;
    tracing::info!("Database schema up to date ({} migrations applied now)", pending);
    Ok(())
}

/// Compare the embedded migrations with the database's bookkeeping table.
/// Creates that table if it does not exist yet; touches nothing else.
pub async fn migration_status(pool: &PgPool) -> Result<Vec<MigrationStatus>> {
    let mut conn = pool.acquire().await?;
    conn.ensure_migrations_table().await?;
    let applied: HashSet<i64> = conn
        .list_applied_migrations()
        .await?
        .into_iter()
        .map(|m| m.version)
        .collect();

    Ok(MIGRATOR
        .iter()
        .filter(|m| !m.migration_type.is_down_migration())
        .map(|m| MigrationStatus {
            version: m.version,
            description: m.description.to_string(),
            applied: applied.contains(&m.version),
        })
        .collect())
}
