use std::env;
use std::str::FromStr;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Targets that follow `LOG_LEVEL`. The three binaries log under their own names.
const LOG_TARGETS: &[&str] = &["bridger", "server", "connections", "migrate"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines, for terminals and the operator CLI.
    Pretty,
    /// One JSON object per event, for log shippers.
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow::anyhow!("Unknown LOG_FORMAT value: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: String,
}

impl LoggingConfig {
    /// Reads `LOG_FORMAT` and `LOG_LEVEL`. Bad values fall back to pretty/info
    /// since logging comes up before anything can report the mistake.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            format: lookup("LOG_FORMAT")
                .and_then(|f| f.parse().ok())
                .unwrap_or(LogFormat::Pretty),
            level: lookup("LOG_LEVEL")
                .map(|l| l.trim().to_ascii_lowercase())
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| "info".to_string()),
        }
    }

    /// Filter directives used when `RUST_LOG` is not set. Request spans from
    /// `TraceLayer` are emitted at debug, so `tower_http` stays there.
    pub fn directives(&self) -> String {
        let mut directives: Vec<String> = LOG_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, self.level))
            .collect();
        directives.push("tower_http=debug".to_string());
        directives.join(",")
    }
}

/// Install the global subscriber from the environment. `RUST_LOG` wins over
/// `LOG_LEVEL` when both are set.
pub fn init_logging() {
    init_logging_with(&LoggingConfig::from_env());
}

pub fn init_logging_with(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.directives()));
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }
}
