use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::constants::{PG_CHECK_VIOLATION, PG_UNIQUE_VIOLATION};
use crate::models::ConnectionStatus;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failures reported by a connection store or user directory.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The pair already has a non-declined connection (unique index hit).
    #[error("unique constraint violated")]
    UniqueViolation,

    /// A row check failed at the store (e.g. requester equals recipient).
    #[error("check constraint violated")]
    CheckViolation,

    #[error("broken connection record: {0}")]
    BrokenRecord(String),

    #[error(transparent)]
    Database(sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        let code = error
            .as_database_error()
            .and_then(|db_error| db_error.code().map(|code| code.into_owned()));

        match code.as_deref() {
            Some(PG_UNIQUE_VIOLATION) => StoreError::UniqueViolation,
            Some(PG_CHECK_VIOLATION) => StoreError::CheckViolation,
            _ => StoreError::Database(error),
        }
    }
}

/// Everything a connection operation can fail with. Every variant is local
/// to a single user action.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("You cannot connect with yourself")]
    SelfConnection,

    #[error("Connection already exists")]
    DuplicateConnection,

    #[error("Connection {id} is {from} and cannot become {to}")]
    InvalidTransition {
        id: Uuid,
        from: ConnectionStatus,
        to: ConnectionStatus,
    },

    #[error("Connection {0} not found")]
    NotFound(Uuid),

    #[error("Invalid connection link")]
    MalformedLink,

    /// Empty or blank user id; carries the name of the offending field.
    #[error("{0} is required")]
    MissingUserId(&'static str),

    #[error("Connection store unavailable")]
    StoreUnavailable(#[source] StoreError),
}

impl From<StoreError> for ConnectionError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::UniqueViolation => ConnectionError::DuplicateConnection,
            StoreError::CheckViolation => ConnectionError::SelfConnection,
            other => ConnectionError::StoreUnavailable(other),
        }
    }
}

impl ConnectionError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ConnectionError::SelfConnection
            | ConnectionError::MalformedLink
            | ConnectionError::MissingUserId(_) => StatusCode::BAD_REQUEST,
            ConnectionError::NotFound(_) => StatusCode::NOT_FOUND,
            ConnectionError::DuplicateConnection | ConnectionError::InvalidTransition { .. } => {
                StatusCode::CONFLICT
            }
            ConnectionError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ConnectionError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let ConnectionError::StoreUnavailable(source) = &self {
            tracing::error!("Connection store failure: {}", source);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
