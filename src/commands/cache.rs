//! Cache command - connectivity checks against the configured cache.

use crate::cli::args::{CacheAction, CacheArgs};
use crate::config::{Config, CACHE_HEALTH_KEY, CACHE_HEALTH_TTL_SECONDS};
use crate::errors::AppResult;
use crate::infra::cache::{CacheClient, CacheError, CacheManager, CacheResult, CacheService};

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: Config) -> AppResult<i32> {
    let manager = CacheManager::from_config(&config.cache)?;
    if !manager.is_enabled() {
        tracing::warn!("Caching is disabled by configuration; probing anyway");
    }

    let code = match args.action {
        CacheAction::Ping => {
            if manager.ping().await {
                println!("PONG");
                0
            } else {
                println!("unreachable");
                1
            }
        }
        CacheAction::Status => {
            let reachable = manager.ping().await;
            let client = manager.get_client().await;
            let round_trip = if reachable {
                match round_trip(&client).await {
                    Ok(()) => "ok".to_string(),
                    Err(e) => e.to_string(),
                }
            } else {
                "skipped".to_string()
            };
            println!("enabled:    {}", manager.is_enabled());
            println!("reachable:  {}", reachable);
            println!("round-trip: {}", round_trip);
            println!("status:     {}", client.status());
            println!("retries:    {}", client.retry_count());
            0
        }
    };

    manager.close_connection().await;
    Ok(code)
}

/// Write, read back and delete the probe key.
async fn round_trip(client: &CacheClient) -> CacheResult<()> {
    let stamp = chrono::Utc::now().timestamp_millis();
    client
        .set_json(CACHE_HEALTH_KEY, &stamp, CACHE_HEALTH_TTL_SECONDS)
        .await?;
    let read: Option<i64> = client.get_json(CACHE_HEALTH_KEY).await?;
    client.delete(CACHE_HEALTH_KEY).await?;

    match read {
        Some(value) if value == stamp => Ok(()),
        other => Err(CacheError::Decode(format!(
            "probe key read back as {:?}",
            other
        ))),
    }
}
