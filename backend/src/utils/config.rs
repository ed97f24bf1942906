use anyhow::Result;
use std::env;
use std::str::FromStr;

use crate::constants::{DEFAULT_PUBLIC_ORIGIN, DEFAULT_SERVER_PORT};

/// Where connection records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    /// Process memory seeded with the demo users. Nothing survives a restart.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(StoreBackend::Postgres),
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            other => Err(anyhow::anyhow!("Unknown BRIDGER_STORE value: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub public_origin: String,
    pub allowed_origins: Vec<String>,
    pub store: StoreBackend,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store = match lookup("BRIDGER_STORE") {
            Some(value) => value.parse()?,
            None => StoreBackend::Postgres,
        };

        Ok(Self {
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SERVER_PORT),
            public_origin: lookup("PUBLIC_ORIGIN")
                .filter(|o| !o.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PUBLIC_ORIGIN.to_string()),
            allowed_origins: lookup("ALLOWED_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            store,
        })
    }
}
