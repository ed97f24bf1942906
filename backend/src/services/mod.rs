pub mod connections;
pub mod links;

use anyhow::Result;
use std::sync::Arc;

use crate::db::{
    self, DatabaseConfig, InMemoryConnectionStore, InMemoryUserDirectory, PgConnectionStore,
    PgUserDirectory,
};
use crate::utils::{Config, StoreBackend};

pub use connections::{
    ConnectionService, ConnectionStats, FriendSuggestion, LandingOutcome, ShareableLink,
};
pub use links::{ConnectionCode, ConnectionLink, LinkBuilder, generate_connection_code, parse_connection_link};

/// Wire a `ConnectionService` to the store selected in `config`. Postgres
/// connections run pending migrations first.
pub async fn build_connection_service(config: &Config) -> Result<ConnectionService> {
    let links = LinkBuilder::new(&config.public_origin)?;

    let service = match config.store {
        StoreBackend::Postgres => {
            let db_config = DatabaseConfig::from_env()?;
            let pool = db::get_db_pool(&db_config).await?;
            db::migrations::run_migrations(&pool).await?;

            ConnectionService::new(
                Arc::new(PgConnectionStore::new(pool.clone())),
                Arc::new(PgUserDirectory::new(pool)),
                links,
            )
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory connection store; data is lost on restart");
            ConnectionService::new(
                Arc::new(InMemoryConnectionStore::new()),
                Arc::new(InMemoryUserDirectory::with_demo_users()),
                links,
            )
        }
    };

    Ok(service)
}
