use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Which backend holds profile sections and user records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    /// Process-local maps; data is lost on restart.
    Memory,
}

impl StoreBackend {
    fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => bail!("PROFILE_STORE must be 'postgres' or 'memory', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreBackend,
    /// Set whenever `store` is `Postgres`.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub port: u16,
    pub rust_log: String,
    /// Workflow sessions untouched for this long are dropped.
    pub session_idle_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let store = StoreBackend::parse(
            &std::env::var("PROFILE_STORE").unwrap_or_else(|_| "postgres".to_string()),
        )?;
        let database_url = match store {
            StoreBackend::Postgres => Some(require_env("DATABASE_URL")?),
            StoreBackend::Memory => std::env::var("DATABASE_URL").ok(),
        };

        Ok(Config {
            store,
            database_url,
            database_max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse::<u32>()
                .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            session_idle_timeout: Duration::from_secs(
                std::env::var("SESSION_IDLE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "1800".to_string())
                    .parse::<u64>()
                    .context("SESSION_IDLE_TIMEOUT_SECS must be a number of seconds")?,
            ),
        })
    }

    /// In-memory configuration for tests.
    #[cfg(test)]
    pub fn for_memory() -> Self {
        Config {
            store: StoreBackend::Memory,
            database_url: None,
            database_max_connections: 1,
            port: 0,
            rust_log: "debug".to_string(),
            session_idle_timeout: Duration::from_secs(60),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
