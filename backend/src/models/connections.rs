use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle state of a friend connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Pending,
    Accepted,
    Declined,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Pending => "pending",
            ConnectionStatus::Accepted => "accepted",
            ConnectionStatus::Declined => "declined",
        }
    }

    /// Whether a connection in this state blocks a new request between the same pair.
    /// Declined connections never block a retry.
    pub fn blocks_new_request(&self) -> bool {
        !matches!(self, ConnectionStatus::Declined)
    }

    /// Only `Pending` may move, and only to `Accepted` or `Declined`.
    pub fn can_transition_to(&self, next: ConnectionStatus) -> bool {
        matches!(
            (self, next),
            (ConnectionStatus::Pending, ConnectionStatus::Accepted)
                | (ConnectionStatus::Pending, ConnectionStatus::Declined)
        )
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ConnectionStatus::Pending),
            "accepted" => Ok(ConnectionStatus::Accepted),
            "declined" => Ok(ConnectionStatus::Declined),
            other => Err(anyhow::anyhow!("Unknown connection status: {}", other)),
        }
    }
}

/// A directed friend request / relationship between two users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: Uuid,
    pub requester_id: String,
    pub recipient_id: String,
    pub status: ConnectionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Connection {
    pub fn involves(&self, user_id: &str) -> bool {
        self.requester_id == user_id || self.recipient_id == user_id
    }

    /// True when this connection is between `a` and `b`, in either direction.
    pub fn is_between(&self, a: &str, b: &str) -> bool {
        (self.requester_id == a && self.recipient_id == b)
            || (self.requester_id == b && self.recipient_id == a)
    }

    /// The other participant, seen from `user_id`.
    pub fn counterpart_of(&self, user_id: &str) -> &str {
        if self.requester_id == user_id {
            &self.recipient_id
        } else {
            &self.requester_id
        }
    }
}

/// Insert payload. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewConnection {
    pub requester_id: String,
    pub recipient_id: String,
    pub created_at: DateTime<Utc>,
}

/// A connection enriched with the display name of the other participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionView {
    #[serde(flatten)]
    pub connection: Connection,
    pub counterpart_id: String,
    pub counterpart_name: String,
}
