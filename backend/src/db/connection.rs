use anyhow::{Context, Result};
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::env;
use std::time::Duration;
use url::Url;

use crate::constants::{DEFAULT_DB_ACQUIRE_TIMEOUT_MS, DEFAULT_DB_MAX_CONNECTIONS};

/// Pool settings for the Postgres-backed store.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// How long a request waits for a free pooled connection before the
    /// store reports itself unavailable.
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|u| !u.trim().is_empty())
            .context("DATABASE_URL must be set when BRIDGER_STORE=postgres")?;

        Ok(Self {
            database_url,
            max_connections: lookup("DB_MAX_CONNECTIONS")
                .and_then(|n| n.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS),
            acquire_timeout: Duration::from_millis(
                lookup("DB_ACQUIRE_TIMEOUT_MS")
                    .and_then(|ms| ms.parse().ok())
                    .unwrap_or(DEFAULT_DB_ACQUIRE_TIMEOUT_MS),
            ),
        })
    }

    /// `database_url` with the password blanked, safe to log.
    pub fn redacted_url(&self) -> String {
        match Url::parse(&self.database_url) {
            Ok(mut url) => {
                if url.password().is_some() {
                    let _ = url.set_password(Some("***"));
                }
                url.to_string()
            }
            Err(_) => "<unparseable DATABASE_URL>".to_string(),
        }
    }
}

pub async fn get_db_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.database_url)
        .await
        .with_context(|| format!("connecting to {}", config.redacted_url()))?;

    tracing::info!(
        "Connected to {} (max {} connections, {:?} acquire timeout)",
        config.redacted_url(),
        config.max_connections,
        config.acquire_timeout
    );
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn db_config_from(pairs: &[(&str, &str)]) -> Result<DatabaseConfig> {
        let vars: HashMap<&str, &str> = pairs.iter().copied().collect();
        DatabaseConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_database_url_is_required() {
        assert!(db_config_from(&[]).is_err());
        assert!(db_config_from(&[("DATABASE_URL", "  ")]).is_err());
    }

    #[test]
    fn test_pool_defaults_and_overrides() {
        let url = ("DATABASE_URL", "postgres://bridger@localhost/bridger");

        let config = db_config_from(&[url]).unwrap();
        assert_eq!(config.max_connections, DEFAULT_DB_MAX_CONNECTIONS);
        assert_eq!(config.acquire_timeout, Duration::from_millis(DEFAULT_DB_ACQUIRE_TIMEOUT_MS));

        let config = db_config_from(&[
            url,
            ("DB_MAX_CONNECTIONS", "25"),
            ("DB_ACQUIRE_TIMEOUT_MS", "750"),
        ])
        .unwrap();
        assert_eq!(config.max_connections, 25);
        assert_eq!(config.acquire_timeout, Duration::from_millis(750));

        let config = db_config_from(&[url, ("DB_MAX_CONNECTIONS", "0")]).unwrap();
        assert_eq!(config.max_connections, DEFAULT_DB_MAX_CONNECTIONS);
    }

    #[test]
    fn test_redacted_url_hides_password() {
        let config =
            db_config_from(&[("DATABASE_URL", "postgres://bridger:s3cret@db:5432/bridger")]).unwrap();
        let redacted = config.redacted_url();
        assert!(!redacted.contains("s3cret"));
        assert!(redacted.contains("bridger:***@db:5432/bridger"));

        let config = db_config_from(&[("DATABASE_URL", "postgres://db/bridger")]).unwrap();
        assert_eq!(config.redacted_url(), "postgres://db/bridger");
    }
}
