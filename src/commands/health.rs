//! Health command - probe both backends concurrently.

use serde::Serialize;

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::cache::{CacheManager, CacheService};
use crate::infra::db::Database;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum Probe {
    Up,
    Down,
    Disabled,
}

#[derive(Debug, Serialize)]
struct HealthReport {
    database: Probe,
    cache: Probe,
}

/// Execute the health command.
///
/// An unreachable database fails the check; an unreachable cache only
/// degrades it.
pub async fn execute(config: Config) -> AppResult<i32> {
    let (database, cache) = tokio::join!(probe_database(&config), probe_cache(&config));
    let report = HealthReport { database, cache };

    let output =
        serde_json::to_string_pretty(&report).map_err(|e| AppError::internal(e.to_string()))?;
    println!("{}", output);

    Ok(if report.database == Probe::Up { 0 } else { 1 })
}

async fn probe_database(config: &Config) -> Probe {
    let db = match Database::connect_without_migrations(&config.database.url).await {
        Ok(db) => db,
        Err(e) => {
            tracing::warn!(error = %e, "Database unreachable");
            return Probe::Down;
        }
    };

    let probe = match db.ping().await {
        Ok(()) => Probe::Up,
        Err(e) => {
            tracing::warn!(error = %e, "Database ping failed");
            Probe::Down
        }
    };
    if let Err(e) = db.close().await {
        tracing::debug!(error = %e, "Closing health-check connection");
    }
    probe
}

async fn probe_cache(config: &Config) -> Probe {
    if !config.cache.enabled {
        return Probe::Disabled;
    }

    let manager = match CacheManager::from_config(&config.cache) {
        Ok(manager) => manager,
        Err(e) => {
            tracing::warn!(error = %e, "Cache misconfigured");
            return Probe::Down;
        }
    };

    let probe = if manager.ping().await {
        Probe::Up
    } else {
        Probe::Down
    };
    manager.close_connection().await;
    probe
}
