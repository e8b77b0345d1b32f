//! Application settings loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use super::constants::{
    DEFAULT_BACKOFF_BASE_MS, DEFAULT_BACKOFF_CEILING_MS, DEFAULT_COMMAND_TIMEOUT_MS,
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_DATABASE_URL, DEFAULT_MAX_RETRIES_PER_REQUEST,
    DEFAULT_OFFLINE_QUEUE_CAPACITY, DEFAULT_REDIS_URL, DISABLED_FLAG_VALUES,
};

/// Application configuration, populated once at startup and shared by
/// reference with the database lifecycle and the cache manager.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
}

/// Relational store configuration.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection string
    pub url: String,
    /// Apply pending migrations before resetting
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            run_migrations: true,
        }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"[REDACTED]")
            .field("run_migrations", &self.run_migrations)
            .finish()
    }
}

/// Cache connection configuration.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Redis address
    pub url: String,
    /// Caching toggle; the rest of the system works without it
    pub enabled: bool,
    /// Reconnection attempts a queued command survives before it fails
    pub max_retries_per_request: u32,
    /// Reconnect delay unit: attempt `n` waits `n * backoff_base_ms`
    pub backoff_base_ms: u64,
    /// Upper bound for the reconnect delay
    pub backoff_ceiling_ms: u64,
    /// Buffer commands issued before the connection is ready
    pub offline_queue: bool,
    /// Maximum number of buffered commands
    pub offline_queue_capacity: usize,
    /// Require a successful PING before the connection is usable
    pub ready_check: bool,
    /// Reconnect after connection-level errors instead of giving up
    pub reconnect_on_error: bool,
    pub connect_timeout_ms: u64,
    pub command_timeout_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_REDIS_URL.to_string(),
            enabled: true,
            max_retries_per_request: DEFAULT_MAX_RETRIES_PER_REQUEST,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
            backoff_ceiling_ms: DEFAULT_BACKOFF_CEILING_MS,
            offline_queue: true,
            offline_queue_capacity: DEFAULT_OFFLINE_QUEUE_CAPACITY,
            ready_check: true,
            reconnect_on_error: true,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            command_timeout_ms: DEFAULT_COMMAND_TIMEOUT_MS,
        }
    }
}

impl std::fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheConfig")
            .field("url", &"[REDACTED]")
            .field("enabled", &self.enabled)
            .field("max_retries_per_request", &self.max_retries_per_request)
            .field("backoff_base_ms", &self.backoff_base_ms)
            .field("backoff_ceiling_ms", &self.backoff_ceiling_ms)
            .field("offline_queue", &self.offline_queue)
            .field("offline_queue_capacity", &self.offline_queue_capacity)
            .field("ready_check", &self.ready_check)
            .field("reconnect_on_error", &self.reconnect_on_error)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("command_timeout_ms", &self.command_timeout_ms)
            .finish()
    }
}

impl CacheConfig {
    /// Reconnect delay before attempt `attempt` (1-based).
    ///
    /// Grows linearly with the attempt number and never exceeds the ceiling.
    pub fn reconnect_delay(&self, attempt: u32) -> Duration {
        let delay = u64::from(attempt).saturating_mul(self.backoff_base_ms);
        Duration::from_millis(delay.min(self.backoff_ceiling_ms))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    /// Longest time a ping may wait behind an in-progress reconnect.
    ///
    /// Covers every reconnect delay a queued command can survive plus one
    /// command round-trip.
    pub fn ping_window(&self) -> Duration {
        let backoff: Duration = (1..=self.max_retries_per_request.saturating_add(1))
            .map(|attempt| self.reconnect_delay(attempt) + self.connect_timeout())
            .sum();
        backoff + self.command_timeout()
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env`).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Unparseable numeric values fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let database_defaults = DatabaseConfig::default();
        let cache_defaults = CacheConfig::default();

        let flag = |key: &str, default: bool| match lookup(key) {
            Some(value) => parse_enabled_flag(Some(value.as_str())),
            None => default,
        };

        Self {
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").unwrap_or(database_defaults.url),
                run_migrations: flag(
                    "DATABASE_RUN_MIGRATIONS",
                    database_defaults.run_migrations,
                ),
            },
            cache: CacheConfig {
                url: lookup("REDIS_URL").unwrap_or(cache_defaults.url),
                enabled: parse_enabled_flag(lookup("REDIS_ENABLED").as_deref()),
                max_retries_per_request: parse_or(
                    &lookup,
                    "REDIS_MAX_RETRIES_PER_REQUEST",
                    cache_defaults.max_retries_per_request,
                ),
                backoff_base_ms: parse_or(
                    &lookup,
                    "REDIS_BACKOFF_BASE_MS",
                    cache_defaults.backoff_base_ms,
                ),
                backoff_ceiling_ms: parse_or(
                    &lookup,
                    "REDIS_BACKOFF_CEILING_MS",
                    cache_defaults.backoff_ceiling_ms,
                ),
                offline_queue: flag("REDIS_OFFLINE_QUEUE", cache_defaults.offline_queue),
                offline_queue_capacity: parse_or(
                    &lookup,
                    "REDIS_OFFLINE_QUEUE_CAPACITY",
                    cache_defaults.offline_queue_capacity,
                ),
                ready_check: flag("REDIS_READY_CHECK", cache_defaults.ready_check),
                reconnect_on_error: flag(
                    "REDIS_RECONNECT_ON_ERROR",
                    cache_defaults.reconnect_on_error,
                ),
                connect_timeout_ms: parse_or(
                    &lookup,
                    "REDIS_CONNECT_TIMEOUT_MS",
                    cache_defaults.connect_timeout_ms,
                ),
                command_timeout_ms: parse_or(
                    &lookup,
                    "REDIS_COMMAND_TIMEOUT_MS",
                    cache_defaults.command_timeout_ms,
                ),
            },
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

/// Interpret an on/off flag. Only `"false"` and `"0"` disable; anything else,
/// including absence, enables.
pub fn parse_enabled_flag(value: Option<&str>) -> bool {
    match value {
        Some(v) => !DISABLED_FLAG_VALUES.contains(&v.trim()),
        None => true,
    }
}
