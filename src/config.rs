use anyhow::{Context, Result};
use std::env;

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The URL of the PostgreSQL database.
    pub database_url: String,
    /// The URL of the Redis server.
    pub redis_url: String,
    /// The stats-probe endpoint used to verify the admin password.
    pub admin_stats_url: String,
    /// The sliding session window in minutes.
    pub session_ttl_minutes: i64,
    /// The TTL assigned to session records at insert, in days.
    pub session_record_ttl_days: i64,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            admin_stats_url: env::var("ADMIN_STATS_URL")
                .context("ADMIN_STATS_URL must be set (admin password stats-probe endpoint)")?,
            session_ttl_minutes: env::var("SESSION_TTL_MINUTES")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("Invalid SESSION_TTL_MINUTES")?,
            session_record_ttl_days: env::var("SESSION_RECORD_TTL_DAYS")
                .unwrap_or_else(|_| "7".to_string())
                .parse()
                .context("Invalid SESSION_RECORD_TTL_DAYS")?,
        })
    }
}
