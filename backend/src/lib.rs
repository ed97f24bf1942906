pub mod constants;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

pub use utils::config::Config;
pub use error::{ConnectionError, StoreError};
pub use services::{ConnectionService, build_connection_service};

// Re-export common types
pub use anyhow::Result;
pub use uuid::Uuid;
pub use chrono::{DateTime, Utc};
