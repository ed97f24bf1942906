use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::db::store::ConnectionStore;
use crate::error::{StoreError, StoreResult};
use crate::models::{Connection, ConnectionStatus, NewConnection};

const CONNECTION_COLUMNS: &str = "id, requester_id, recipient_id, status, created_at, updated_at";

#[derive(Debug, FromRow)]
struct ConnectionRow {
    id: Uuid,
    requester_id: String,
    recipient_id: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ConnectionRow> for Connection {
    type Error = StoreError;

    fn try_from(row: ConnectionRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<ConnectionStatus>()
            .map_err(|e| StoreError::BrokenRecord(format!("{}: {}", row.id, e)))?;

        Ok(Connection {
            id: row.id,
            requester_id: row.requester_id,
            recipient_id: row.recipient_id,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_connections(rows: Vec<ConnectionRow>) -> StoreResult<Vec<Connection>> {
    rows.into_iter().map(Connection::try_from).collect()
}

/// `friend_connections` table in Postgres.
#[derive(Debug, Clone)]
pub struct PgConnectionStore {
    pool: PgPool,
}

impl PgConnectionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConnectionStore for PgConnectionStore {
    async fn insert(&self, new: NewConnection) -> StoreResult<Connection> {
        // The partial unique index turns a concurrent duplicate into a unique_violation.
        let row = sqlx::query_as::<_, ConnectionRow>(&format!(
            r#"
            INSERT INTO friend_connections (requester_id, recipient_id, status, created_at, updated_at)
            VALUES ($1, $2, 'pending', $3, $3)
            RETURNING {CONNECTION_COLUMNS}
            "#
        ))
        .bind(&new.requester_id)
        .bind(&new.recipient_id)
        .bind(new.created_at)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Connection>> {
        let row = sqlx::query_as::<_, ConnectionRow>(&format!(
            "SELECT {CONNECTION_COLUMNS} FROM friend_connections WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Connection::try_from).transpose()
    }

    async fn update_status(
        &self,
        id: Uuid,
        from: ConnectionStatus,
        to: ConnectionStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Connection>> {
        let row = sqlx::query_as::<_, ConnectionRow>(&format!(
            r#"
            UPDATE friend_connections
            SET status = $3, updated_at = $4
            WHERE id = $1 AND status = $2
            RETURNING {CONNECTION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Connection::try_from).transpose()
    }

    async fn query_by_pair(&self, a: &str, b: &str) -> StoreResult<Vec<Connection>> {
        let rows = sqlx::query_as::<_, ConnectionRow>(&format!(
            r#"
            SELECT {CONNECTION_COLUMNS}
            FROM friend_connections
            WHERE (requester_id = $1 AND recipient_id = $2)
               OR (requester_id = $2 AND recipient_id = $1)
            ORDER BY created_at ASC
            "#
        ))
        .bind(a)
        .bind(b)
        .fetch_all(&self.pool)
        .await?;

        into_connections(rows)
    }

    async fn query_by_recipient_and_status(
        &self,
        recipient_id: &str,
        status: ConnectionStatus,
    ) -> StoreResult<Vec<Connection>> {
        let rows = sqlx::query_as::<_, ConnectionRow>(&format!(
            r#"
            SELECT {CONNECTION_COLUMNS}
            FROM friend_connections
            WHERE recipient_id = $1 AND status = $2
            ORDER BY created_at ASC
            "#
        ))
        .bind(recipient_id)
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        into_connections(rows)
    }

    async fn query_by_requester_and_status(
        &self,
        requester_id: &str,
        status: ConnectionStatus,
    ) -> StoreResult<Vec<Connection>> {
        let rows = sqlx::query_as::<_, ConnectionRow>(&format!(
            r#"
            SELECT {CONNECTION_COLUMNS}
            FROM friend_connections
            WHERE requester_id = $1 AND status = $2
            ORDER BY created_at ASC
            "#
        ))
        .bind(requester_id)
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        into_connections(rows)
    }

    async fn query_by_participant_and_status(
        &self,
        user_id: &str,
        status: ConnectionStatus,
    ) -> StoreResult<Vec<Connection>> {
        let rows = sqlx::query_as::<_, ConnectionRow>(&format!(
            r#"
            SELECT {CONNECTION_COLUMNS}
            FROM friend_connections
            WHERE (requester_id = $1 OR recipient_id = $1) AND status = $2
            ORDER BY created_at ASC
            "#
        ))
        .bind(user_id)
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        into_connections(rows)
    }

    async fn query_by_participant(&self, user_id: &str) -> StoreResult<Vec<Connection>> {
        let rows = sqlx::query_as::<_, ConnectionRow>(&format!(
            r#"
            SELECT {CONNECTION_COLUMNS}
            FROM friend_connections
            WHERE requester_id = $1 OR recipient_id = $1
            ORDER BY created_at ASC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        into_connections(rows)
    }
}
