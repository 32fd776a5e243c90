//! Configuration management for Wired.
//!
//! Loads configuration from environment variables (with `.env` support via
//! dotenvy) into a process-wide instance.

use std::env;
use std::sync::OnceLock;

use crate::error::{Error, Result};

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration
pub fn config() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Initialize configuration (call once at startup)
pub fn init() -> &'static Config {
    config()
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub retention: RetentionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// Token that allows registering an admin account.
    pub bootstrap_token: Option<String>,
}

/// Upper bound for `RETENTION_MAX_AGE_DAYS`.
pub const MAX_RETENTION_DAYS: i64 = 36_500;

/// Background purge of resolved requests.
#[derive(Debug, Clone)]
pub struct RetentionConfig {
    pub enabled: bool,
    pub max_age_days: i64,
    pub interval_secs: u64,
}

impl RetentionConfig {
    /// Age after which resolved requests are swept.
    ///
    /// Must be between one day and `MAX_RETENTION_DAYS`.
    pub fn max_age(&self) -> Result<chrono::Duration> {
        if !(1..=MAX_RETENTION_DAYS).contains(&self.max_age_days) {
            return Err(Error::Validation(format!(
                "RETENTION_MAX_AGE_DAYS must be between 1 and {}, got {}",
                MAX_RETENTION_DAYS, self.max_age_days
            )));
        }
        chrono::Duration::try_days(self.max_age_days).ok_or_else(|| {
            Error::Validation(format!(
                "RETENTION_MAX_AGE_DAYS out of range: {}",
                self.max_age_days
            ))
        })
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_age_days: 90,
            interval_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let retention_defaults = RetentionConfig::default();

        Self {
            server: ServerConfig {
                host: env_or("HOST", "0.0.0.0"),
                port: env_or("PORT", "5000").parse().unwrap_or(5000),
            },
            database: DatabaseConfig {
                path: env_or("DATABASE_PATH", "./data/wired.db"),
            },
            auth: AuthConfig {
                bootstrap_token: env::var("ADMIN_BOOTSTRAP_TOKEN")
                    .ok()
                    .filter(|t| !t.is_empty()),
            },
            retention: RetentionConfig {
                enabled: parse_bool(&env_or("RETENTION_ENABLED", "false")),
                max_age_days: env_or("RETENTION_MAX_AGE_DAYS", "90")
                    .parse()
                    .unwrap_or(retention_defaults.max_age_days),
                interval_secs: env_or("RETENTION_INTERVAL_SECS", "3600")
                    .parse()
                    .unwrap_or(retention_defaults.interval_secs),
            },
            logging: LoggingConfig {
                format: match env_or("LOG_FORMAT", "pretty").to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    _ => LogFormat::Pretty,
                },
            },
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
