//! Cache client errors.
//!
//! Connection-level failures are recoverable: they trigger a reconnect and
//! only reach callers as a failed command once the retry budget is spent.

use redis::RedisError;
use thiserror::Error;

/// Cache error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Socket-level failure (refused, dropped, I/O)
    #[error("Connection error: {0}")]
    Connection(String),

    /// The server rejected the command
    #[error("Command error: {0}")]
    Command(String),

    #[error("Operation timed out")]
    Timeout,

    /// The connection is not ready and the offline queue is disabled
    #[error("Connection is not ready")]
    NotReady,

    #[error("Offline queue is full ({0} pending)")]
    QueueFull(usize),

    /// The command outlived its reconnection budget
    #[error("Gave up after {0} reconnection attempts")]
    RetriesExhausted(u32),

    #[error("Connection closed")]
    Closed,

    #[error("Unexpected reply: {0}")]
    Decode(String),

    #[error("Invalid cache configuration: {0}")]
    Config(String),
}

impl CacheError {
    /// Whether the error means the connection itself is unusable.
    ///
    /// A timeout only fails the command that hit it.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, CacheError::Connection(_))
    }
}

impl From<RedisError> for CacheError {
    fn from(err: RedisError) -> Self {
        if err.is_timeout() {
            CacheError::Timeout
        } else if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
            CacheError::Connection(err.to_string())
        } else {
            CacheError::Command(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Decode(err.to_string())
    }
}

/// Result type alias for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
