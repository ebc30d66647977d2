//! Engine configuration
//!
//! All settings can be overridden through environment variables:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | DATABASE_PATH | promo-engine.db | SQLite database file |
//! | BUSINESS_TIMEZONE | UTC | Time zone defining daily-cap day boundaries |
//! | MAX_RESERVE_RETRIES | 3 | Budget reservation attempts before giving up |

use chrono_tz::Tz;

/// Engine configuration loaded from the environment
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// SQLite database file path
    pub database_path: String,
    /// Business time zone for calendar-day boundaries
    pub timezone: Tz,
    /// Bounded retry count for budget reservation races
    pub max_reserve_retries: u32,
}

impl EngineConfig {
    /// Load configuration from environment variables, using defaults for
    /// anything unset. A `.env` file in the working directory is honored.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self {
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "promo-engine.db".into()),
            timezone: std::env::var("BUSINESS_TIMEZONE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(Tz::UTC),
            max_reserve_retries: std::env::var("MAX_RESERVE_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
        }
    }

    /// Override the database path; used by tests and embedders
    pub fn with_database_path(mut self, path: impl Into<String>) -> Self {
        self.database_path = path.into();
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
