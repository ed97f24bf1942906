use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::store::{ConnectionStore, UserDirectory};
use crate::error::{StoreError, StoreResult};
use crate::models::{Connection, ConnectionStatus, NewConnection, UserProfile};

/// Connection store held in process memory. Used by tests and by the server's
/// demo mode. The write lock makes the uniqueness check and the insert one step.
#[derive(Debug, Default)]
pub struct InMemoryConnectionStore {
    rows: RwLock<Vec<Connection>>,
}

impl InMemoryConnectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    async fn select<F>(&self, predicate: F) -> Vec<Connection>
    where
        F: Fn(&Connection) -> bool,
    {
        let mut matched: Vec<Connection> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|c| predicate(*c))
            .cloned()
            .collect();
        matched.sort_by_key(|c| c.created_at);
        matched
    }
}

#[async_trait]
impl ConnectionStore for InMemoryConnectionStore {
    async fn insert(&self, new: NewConnection) -> StoreResult<Connection> {
        if new.requester_id == new.recipient_id {
            return Err(StoreError::CheckViolation);
        }

        let mut rows = self.rows.write().await;
        let clash = rows.iter().any(|c| {
            c.is_between(&new.requester_id, &new.recipient_id) && c.status.blocks_new_request()
        });
        if clash {
            return Err(StoreError::UniqueViolation);
        }

        let connection = Connection {
            id: Uuid::new_v4(),
            requester_id: new.requester_id,
            recipient_id: new.recipient_id,
            status: ConnectionStatus::Pending,
            created_at: new.created_at,
            updated_at: new.created_at,
        };
        rows.push(connection.clone());
        Ok(connection)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Connection>> {
        Ok(self.rows.read().await.iter().find(|c| c.id == id).cloned())
    }

    async fn update_status(
        &self,
        id: Uuid,
        from: ConnectionStatus,
        to: ConnectionStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Connection>> {
        let mut rows = self.rows.write().await;
        let Some(row) = rows.iter_mut().find(|c| c.id == id && c.status == from) else {
            return Ok(None);
        };

        row.status = to;
        row.updated_at = at;
        Ok(Some(row.clone()))
    }

    async fn query_by_pair(&self, a: &str, b: &str) -> StoreResult<Vec<Connection>> {
        Ok(self.select(|c| c.is_between(a, b)).await)
    }

    async fn query_by_recipient_and_status(
        &self,
        recipient_id: &str,
        status: ConnectionStatus,
    ) -> StoreResult<Vec<Connection>> {
        Ok(self
            .select(|c| c.recipient_id == recipient_id && c.status == status)
            .await)
    }

    async fn query_by_requester_and_status(
        &self,
        requester_id: &str,
        status: ConnectionStatus,
    ) -> StoreResult<Vec<Connection>> {
        Ok(self
            .select(|c| c.requester_id == requester_id && c.status == status)
            .await)
    }

    async fn query_by_participant_and_status(
        &self,
        user_id: &str,
        status: ConnectionStatus,
    ) -> StoreResult<Vec<Connection>> {
        Ok(self.select(|c| c.involves(user_id) && c.status == status).await)
    }

    async fn query_by_participant(&self, user_id: &str) -> StoreResult<Vec<Connection>> {
        Ok(self.select(|c| c.involves(user_id)).await)
    }
}

/// User directory backed by a map. `with_demo_users` seeds the demo cast the
/// frontend ships with.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<String, UserProfile>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_demo_users() -> Self {
        let demo = [
            ("fox_red_user_123", "Fox", "Red"),
            ("fox_blue_user_456", "Fox", "Blue"),
            ("fox_green_user_789", "Fox", "Green"),
            ("whale_deep_user_101", "Whale", "Deep"),
            ("whale_surface_user_202", "Whale", "Surface"),
            ("whale_migrate_user_303", "Whale", "Migrate"),
        ];

        let users = demo
            .into_iter()
            .map(|(id, first, last)| {
                let profile = UserProfile {
                    id: id.to_string(),
                    first_name: Some(first.to_string()),
                    last_name: Some(last.to_string()),
                    full_name: Some(format!("{} {}", first, last)),
                };
                (id.to_string(), profile)
            })
            .collect();

        Self {
            users: RwLock::new(users),
        }
    }

    pub async fn upsert(&self, profile: UserProfile) {
        self.users.write().await.insert(profile.id.clone(), profile);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn get_profiles(&self, ids: &[String]) -> StoreResult<Vec<UserProfile>> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn list_profiles(&self) -> StoreResult<Vec<UserProfile>> {
        let mut profiles: Vec<UserProfile> = self.users.read().await.values().cloned().collect();
        profiles.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_connection(requester: &str, recipient: &str) -> NewConnection {
        NewConnection {
            requester_id: requester.to_string(),
            recipient_id: recipient.to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_rejects_live_pair_in_either_direction() {
        let store = InMemoryConnectionStore::new();
        store.insert(new_connection("a", "b")).await.unwrap();

        assert!(matches!(
            store.insert(new_connection("a", "b")).await,
            Err(StoreError::UniqueViolation)
        ));
        assert!(matches!(
            store.insert(new_connection("b", "a")).await,
            Err(StoreError::UniqueViolation)
        ));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_insert_allowed_after_decline() {
        let store = InMemoryConnectionStore::new();
        let first = store.insert(new_connection("a", "b")).await.unwrap();
        store
            .update_status(first.id, ConnectionStatus::Pending, ConnectionStatus::Declined, Utc::now())
            .await
            .unwrap()
            .unwrap();

        store.insert(new_connection("b", "a")).await.unwrap();
        assert_eq!(store.query_by_pair("a", "b").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_insert_rejects_self() {
        let store = InMemoryConnectionStore::new();
        assert!(matches!(
            store.insert(new_connection("a", "a")).await,
            Err(StoreError::CheckViolation)
        ));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_update_status_is_compare_and_set() {
        let store = InMemoryConnectionStore::new();
        let c = store.insert(new_connection("a", "b")).await.unwrap();

        let accepted = store
            .update_status(c.id, ConnectionStatus::Pending, ConnectionStatus::Accepted, Utc::now())
            .await
            .unwrap();
        assert_eq!(accepted.unwrap().status, ConnectionStatus::Accepted);

        let again = store
            .update_status(c.id, ConnectionStatus::Pending, ConnectionStatus::Declined, Utc::now())
            .await
            .unwrap();
        assert!(again.is_none());
        assert_eq!(store.get(c.id).await.unwrap().unwrap().status, ConnectionStatus::Accepted);
    }

    #[tokio::test]
    async fn test_directory_skips_unknown_ids() {
        let directory = InMemoryUserDirectory::with_demo_users();
        let profiles = directory
            .get_profiles(&["fox_red_user_123".to_string(), "nobody".to_string()])
            .await
            .unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].display_name().as_deref(), Some("Fox Red"));
    }

    #[tokio::test]
    async fn test_directory_lists_everyone_by_id() {
        let directory = InMemoryUserDirectory::with_demo_users();
        let ids: Vec<String> = directory
            .list_profiles()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();

        assert_eq!(ids.len(), 6);
        assert_eq!(ids[0], "fox_blue_user_456");
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_participant_query_keeps_declined_rows() {
        let store = InMemoryConnectionStore::new();
        let first = store.insert(new_connection("a", "b")).await.unwrap();
        store
            .update_status(first.id, ConnectionStatus::Pending, ConnectionStatus::Declined, Utc::now())
            .await
            .unwrap();
        store.insert(new_connection("b", "a")).await.unwrap();
        store.insert(new_connection("c", "b")).await.unwrap();

        assert_eq!(store.query_by_participant("a").await.unwrap().len(), 2);
        assert_eq!(store.query_by_participant("b").await.unwrap().len(), 3);

        let sent_by_b = store
            .query_by_requester_and_status("b", ConnectionStatus::Pending)
            .await
            .unwrap();
        assert_eq!(sent_by_b.len(), 1);
        assert_eq!(sent_by_b[0].recipient_id, "a");
    }
}
