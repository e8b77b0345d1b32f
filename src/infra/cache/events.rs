//! Connection status and transition events of the cache client.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::infra::observer::Listener;

/// Tracked connection status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Uninitialized,
    Connecting,
    Ready,
    Reconnecting,
    Closed,
    Error,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionStatus::Uninitialized => "uninitialized",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Ready => "ready",
            ConnectionStatus::Reconnecting => "reconnecting",
            ConnectionStatus::Closed => "closed",
            ConnectionStatus::Error => "error",
        };
        f.write_str(name)
    }
}

/// Transitions published by a cache client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// Socket established, readiness not yet confirmed
    Connect,
    /// Readiness check passed; commands flow
    Ready,
    /// A connection-level error occurred
    Error { message: String },
    /// The connection was lost or shut down
    Close,
    /// A reconnect is scheduled after `delay`
    Reconnecting { attempt: u32, delay: Duration },
    /// The client stopped for good and will not reconnect
    End,
}

impl CacheEvent {
    /// Status the client is in after this event.
    pub fn status(&self) -> ConnectionStatus {
        match self {
            CacheEvent::Connect => ConnectionStatus::Connecting,
            CacheEvent::Ready => ConnectionStatus::Ready,
            CacheEvent::Error { .. } => ConnectionStatus::Error,
            CacheEvent::Close | CacheEvent::End => ConnectionStatus::Closed,
            CacheEvent::Reconnecting { .. } => ConnectionStatus::Reconnecting,
        }
    }
}

/// Emits one structured log line per cache transition.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingCacheListener;

impl Listener<CacheEvent> for TracingCacheListener {
    fn on_event(&self, event: &CacheEvent) {
        match event {
            CacheEvent::Connect => tracing::info!("Redis connection established"),
            CacheEvent::Ready => tracing::info!("Redis client ready"),
            CacheEvent::Error { message } => {
                tracing::error!(error = %message, "Redis connection error")
            }
            CacheEvent::Close => tracing::warn!("Redis connection closed"),
            CacheEvent::Reconnecting { attempt, delay } => tracing::info!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Redis reconnecting"
            ),
            CacheEvent::End => tracing::info!("Redis client stopped"),
        }
    }
}
