//! Periodic removal of expired category cache entries

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::repositories::CategoryCacheRepository;

/// Run `cleanup_expired` every `interval` until the handle is aborted.
/// The first sweep happens one full interval after spawning.
pub fn spawn_cache_sweeper(cache: Arc<dyn CategoryCacheRepository>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // interval fires immediately; skip that tick
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match cache.cleanup_expired().await {
                Ok(0) => debug!("Cache sweep: nothing expired"),
                Ok(deleted) => info!("Cache sweep removed {} expired entries", deleted),
                Err(e) => warn!("Cache sweep failed: {}", e),
            }
        }
    })
}
