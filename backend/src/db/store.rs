use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreResult;
use crate::models::{Connection, ConnectionStatus, NewConnection, UserProfile};

/// Persistent home of connection records.
///
/// Implementations must enforce, atomically with `insert`, that at most one
/// non-declined connection exists per unordered pair, reporting a clash as
/// `StoreError::UniqueViolation`.
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// Insert a new `pending` connection. The store assigns the id.
    async fn insert(&self, new: NewConnection) -> StoreResult<Connection>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<Connection>>;

    /// Compare-and-set status change: only applies when the row is currently
    /// `from`. Returns `None` when no row matched.
    async fn update_status(
        &self,
        id: Uuid,
        from: ConnectionStatus,
        to: ConnectionStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Connection>>;

    /// All connections between `a` and `b`, in either direction.
    async fn query_by_pair(&self, a: &str, b: &str) -> StoreResult<Vec<Connection>>;

    async fn query_by_recipient_and_status(
        &self,
        recipient_id: &str,
        status: ConnectionStatus,
    ) -> StoreResult<Vec<Connection>>;

    async fn query_by_requester_and_status(
        &self,
        requester_id: &str,
        status: ConnectionStatus,
    ) -> StoreResult<Vec<Connection>>;

    /// Connections in `status` where the user is requester or recipient.
    async fn query_by_participant_and_status(
        &self,
        user_id: &str,
        status: ConnectionStatus,
    ) -> StoreResult<Vec<Connection>>;

    /// Every connection the user was ever part of, declined ones included.
    async fn query_by_participant(&self, user_id: &str) -> StoreResult<Vec<Connection>>;
}

/// Read-only view of the identity provider's user records.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Profiles for the given ids. Unknown ids are simply absent from the result.
    async fn get_profiles(&self, ids: &[String]) -> StoreResult<Vec<UserProfile>>;

    /// All known users, ordered by id.
    async fn list_profiles(&self) -> StoreResult<Vec<UserProfile>>;
}
