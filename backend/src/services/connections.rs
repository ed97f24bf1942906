//! Friend-connection lifecycle: requests, the `Pending -> Accepted | Declined`
//! state machine, listings and the `/connect` landing flow.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

use crate::constants::FRIEND_SUGGESTION_LIMIT;
use crate::db::{ConnectionStore, UserDirectory};
use crate::error::ConnectionError;
use crate::models::{
    Connection, ConnectionStatus, ConnectionView, NewConnection, UserProfile,
    display_name_or_unknown,
};
use crate::services::links::{ConnectionCode, ConnectionLink, LinkBuilder, parse_connection_link};

pub type Result<T, E = ConnectionError> = std::result::Result<T, E>;

/// Source of "now" for timestamps.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Result of resolving a shared link as the viewer.
#[derive(Debug, Clone, Serialize)]
pub struct LandingOutcome {
    pub connection: Connection,
    pub sharer_id: String,
    pub sharer_name: String,
}

/// Freshly minted link plus the code inside it.
#[derive(Debug, Clone, Serialize)]
pub struct ShareableLink {
    pub link: String,
    pub code: String,
    pub qr_payload: String,
}

/// Someone the user is not connected to in any state.
#[derive(Debug, Clone, Serialize)]
pub struct FriendSuggestion {
    pub user_id: String,
    pub display_name: String,
}

/// Per-user tallies over every connection the user was part of.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConnectionStats {
    pub total_connections: usize,
    pub accepted_connections: usize,
    /// Pending requests addressed to the user.
    pub pending_requests: usize,
    /// Pending requests the user sent.
    pub sent_requests: usize,
    pub declined_connections: usize,
    /// Accepted share of all connections, in percent.
    pub success_rate: f64,
}

impl ConnectionStats {
    fn tally(user_id: &str, connections: &[Connection]) -> Self {
        let mut stats = Self {
            total_connections: connections.len(),
            ..Self::default()
        };

        for connection in connections {
            match connection.status {
                ConnectionStatus::Accepted => stats.accepted_connections += 1,
                ConnectionStatus::Declined => stats.declined_connections += 1,
                ConnectionStatus::Pending if connection.recipient_id == user_id => {
                    stats.pending_requests += 1
                }
                ConnectionStatus::Pending => stats.sent_requests += 1,
            }
        }

        stats.success_rate =
            stats.accepted_connections as f64 / stats.total_connections.max(1) as f64 * 100.0;
        stats
    }
}

/// Trimmed user id, or `MissingUserId(field)` when nothing is left.
fn require_user_id<'a>(value: &'a str, field: &'static str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConnectionError::MissingUserId(field));
    }
    Ok(trimmed)
}

#[derive(Clone)]
pub struct ConnectionService {
    store: Arc<dyn ConnectionStore>,
    users: Arc<dyn UserDirectory>,
    links: LinkBuilder,
    clock: Clock,
}

impl ConnectionService {
    pub fn new(
        store: Arc<dyn ConnectionStore>,
        users: Arc<dyn UserDirectory>,
        links: LinkBuilder,
    ) -> Self {
        Self {
            store,
            users,
            links,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn links(&self) -> &LinkBuilder {
        &self.links
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// New shareable link for `user_id`. The QR payload is the same string.
    pub fn create_shareable_link(
        &self,
        user_id: &str,
        user_name: Option<&str>,
    ) -> Result<ShareableLink> {
        let user_id = require_user_id(user_id, "user_id")?;
        let user_name = user_name.map(str::trim).filter(|n| !n.is_empty());
        let code = ConnectionCode::generate_at(user_id, self.now());
        let link = self.links.link_for_code(&code, user_name);

        Ok(ShareableLink {
            qr_payload: link.clone(),
            link,
            code: code.to_string(),
        })
    }

    pub fn parse_connection_link(&self, link: &str) -> ConnectionLink {
        parse_connection_link(link)
    }

    /// Create a `Pending` connection from `requester_id` to `recipient_id`.
    ///
    /// Fails with `DuplicateConnection` when a pending or accepted connection
    /// already exists between the two users in either direction. The pre-check
    /// only gives a fast answer; the store's uniqueness rule is what holds under
    /// concurrent callers.
    pub async fn send_friend_request(
        &self,
        requester_id: &str,
        recipient_id: &str,
    ) -> Result<Connection> {
        let requester_id = require_user_id(requester_id, "requester_id")?;
        let recipient_id = require_user_id(recipient_id, "recipient_id")?;

        if requester_id == recipient_id {
            tracing::warn!("Rejected self-connection request from {}", requester_id);
            return Err(ConnectionError::SelfConnection);
        }

        let existing = self.store.query_by_pair(requester_id, recipient_id).await?;
        if let Some(live) = existing.iter().find(|c| c.status.blocks_new_request()) {
            tracing::debug!(
                "Connection {} ({}) already links {} and {}",
                live.id,
                live.status,
                requester_id,
                recipient_id
            );
            return Err(ConnectionError::DuplicateConnection);
        }

        let connection = self
            .store
            .insert(NewConnection {
                requester_id: requester_id.to_string(),
                recipient_id: recipient_id.to_string(),
                created_at: self.now(),
            })
            .await?;

        tracing::info!(
            "Friend request {} created: {} -> {}",
            connection.id,
            requester_id,
            recipient_id
        );
        Ok(connection)
    }

    pub async fn accept_friend_request(&self, connection_id: Uuid) -> Result<Connection> {
        self.transition(connection_id, ConnectionStatus::Accepted).await
    }

    pub async fn decline_friend_request(&self, connection_id: Uuid) -> Result<Connection> {
        self.transition(connection_id, ConnectionStatus::Declined).await
    }

    async fn transition(&self, connection_id: Uuid, to: ConnectionStatus) -> Result<Connection> {
        let updated = self
            .store
            .update_status(connection_id, ConnectionStatus::Pending, to, self.now())
            .await?;

        if let Some(connection) = updated {
            tracing::info!("Connection {} is now {}", connection.id, connection.status);
            return Ok(connection);
        }

        // Nothing matched: either the id is unknown or the row already left Pending.
        match self.store.get(connection_id).await? {
            None => Err(ConnectionError::NotFound(connection_id)),
            Some(current) => {
                tracing::warn!(
                    "Refused to move connection {} from {} to {}",
                    connection_id,
                    current.status,
                    to
                );
                Err(ConnectionError::InvalidTransition {
                    id: connection_id,
                    from: current.status,
                    to,
                })
            }
        }
    }

    pub async fn get_connection(&self, connection_id: Uuid) -> Result<Connection> {
        self.store
            .get(connection_id)
            .await?
            .ok_or(ConnectionError::NotFound(connection_id))
    }

    /// Pending requests addressed to `user_id`, oldest first, with requester names.
    pub async fn list_pending_requests(&self, user_id: &str) -> Result<Vec<ConnectionView>> {
        let pending = self
            .store
            .query_by_recipient_and_status(user_id, ConnectionStatus::Pending)
            .await?;

        self.with_counterpart_names(user_id, pending).await
    }

    /// Accepted connections on either side of `user_id`, oldest first.
    pub async fn list_accepted_connections(&self, user_id: &str) -> Result<Vec<ConnectionView>> {
        let accepted = self
            .store
            .query_by_participant_and_status(user_id, ConnectionStatus::Accepted)
            .await?;

        self.with_counterpart_names(user_id, accepted).await
    }

    /// Requests `user_id` sent that are still waiting on the recipient, oldest first.
    pub async fn list_sent_requests(&self, user_id: &str) -> Result<Vec<ConnectionView>> {
        let user_id = require_user_id(user_id, "user_id")?;
        let sent = self
            .store
            .query_by_requester_and_status(user_id, ConnectionStatus::Pending)
            .await?;

        self.with_counterpart_names(user_id, sent).await
    }

    /// Every connection `user_id` was part of in any status, newest first.
    pub async fn list_connection_history(&self, user_id: &str) -> Result<Vec<ConnectionView>> {
        let user_id = require_user_id(user_id, "user_id")?;
        let all = self.store.query_by_participant(user_id).await?;

        let mut history = self.with_counterpart_names(user_id, all).await?;
        history.reverse();
        Ok(history)
    }

    /// Known users with no connection to `user_id` at all, declined ones
    /// included, in directory order.
    pub async fn suggest_friends(&self, user_id: &str) -> Result<Vec<FriendSuggestion>> {
        let user_id = require_user_id(user_id, "user_id")?;
        let connected: HashSet<String> = self
            .store
            .query_by_participant(user_id)
            .await?
            .iter()
            .map(|c| c.counterpart_of(user_id).to_string())
            .collect();

        let suggestions: Vec<FriendSuggestion> = self
            .users
            .list_profiles()
            .await?
            .into_iter()
            .filter(|p| p.id != user_id && !connected.contains(&p.id))
            .take(FRIEND_SUGGESTION_LIMIT)
            .map(|p| FriendSuggestion {
                display_name: display_name_or_unknown(Some(&p)),
                user_id: p.id,
            })
            .collect();

        tracing::debug!("{} friend suggestions for {}", suggestions.len(), user_id);
        Ok(suggestions)
    }

    pub async fn connection_stats(&self, user_id: &str) -> Result<ConnectionStats> {
        let user_id = require_user_id(user_id, "user_id")?;
        let all = self.store.query_by_participant(user_id).await?;
        Ok(ConnectionStats::tally(user_id, &all))
    }

    async fn with_counterpart_names(
        &self,
        user_id: &str,
        mut connections: Vec<Connection>,
    ) -> Result<Vec<ConnectionView>> {
        connections.sort_by_key(|c| c.created_at);

        let mut ids: Vec<String> = connections
            .iter()
            .map(|c| c.counterpart_of(user_id).to_string())
            .collect();
        ids.sort();
        ids.dedup();

        let profiles: HashMap<String, UserProfile> = self
            .users
            .get_profiles(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        Ok(connections
            .into_iter()
            .map(|connection| {
                let counterpart_id = connection.counterpart_of(user_id).to_string();
                let counterpart_name = display_name_or_unknown(profiles.get(&counterpart_id));
                ConnectionView {
                    connection,
                    counterpart_id,
                    counterpart_name,
                }
            })
            .collect())
    }

    async fn display_name(&self, user_id: &str) -> Result<String> {
        let profiles = self.users.get_profiles(&[user_id.to_string()]).await?;
        Ok(display_name_or_unknown(profiles.first()))
    }

    /// Landing flow for a scanned or opened link: the sharer becomes the
    /// requester and the viewer the recipient.
    pub async fn resolve_connection_link(
        &self,
        link: &str,
        viewer_id: &str,
    ) -> Result<LandingOutcome> {
        let viewer_id = require_user_id(viewer_id, "viewer_id")?;
        let parsed = parse_connection_link(link);
        let sharer_id = parsed
            .user_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        let (Some(sharer_id), Some(code)) = (sharer_id, parsed.code) else {
            tracing::debug!("Ignoring connection link without user or code");
            return Err(ConnectionError::MalformedLink);
        };

        // Codes are not stored; the only check is that a well-formed code names the same user.
        if let Some(decoded) = ConnectionCode::decode(&code) {
            if !decoded.is_issued_by(&sharer_id) {
                tracing::warn!(
                    "Connection code issued for {} presented as {}",
                    decoded.user_id,
                    sharer_id
                );
                return Err(ConnectionError::MalformedLink);
            }
        }

        if sharer_id == viewer_id {
            return Err(ConnectionError::SelfConnection);
        }

        let sharer_name = match parsed.user_name {
            Some(name) => name,
            None => self.display_name(&sharer_id).await?,
        };

        let connection = self.send_friend_request(&sharer_id, viewer_id).await?;

        Ok(LandingOutcome {
            connection,
            sharer_id,
            sharer_name,
        })
    }
}
