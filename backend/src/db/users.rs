use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::store::UserDirectory;
use crate::error::StoreResult;
use crate::models::UserProfile;

/// Reads display-name fields from the `users` table.
#[derive(Debug, Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn get_profiles(&self, ids: &[String]) -> StoreResult<Vec<UserProfile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let profiles = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT id, first_name, last_name, full_name
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(profiles)
    }

    async fn list_profiles(&self) -> StoreResult<Vec<UserProfile>> {
        let profiles = sqlx::query_as::<_, UserProfile>(
            "SELECT id, first_name, last_name, full_name FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(profiles)
    }
}
