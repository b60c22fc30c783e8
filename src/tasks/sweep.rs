//! Sweep Scheduler Task
//!
//! Background task that periodically removes expired cache entries,
//! re-enforces the capacity limits and refreshes derived statistics.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Spawns the background sweep task.
///
/// Each cycle the task sleeps for the configured interval, then takes the
/// write lock just long enough to drop expired entries, re-run the eviction
/// policy (normally a no-op, limits are already enforced on every set) and
/// stamp the cleanup time. Shutdown is cooperative: flipping the watch
/// channel stops the loop at the start of its next wait, so stop latency is
/// bounded by one interval.
///
/// # Arguments
/// * `cache` - shared reference to the entry store
/// * `interval_secs` - seconds between sweep cycles
/// * `shutdown` - receiver flipped to `true` when the cache is closing
pub fn spawn_sweep_task(
    cache: Arc<RwLock<CacheStore>>,
    interval_secs: u64,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!("Starting sweep task with interval of {} seconds", interval_secs);

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.changed() => {
                    info!("Sweep task received shutdown signal");
                    break;
                }
            }

            let (expired, evicted) = {
                let mut guard = cache.write().await;
                let expired = guard.cleanup_expired();
                let evicted = guard.enforce_limits(None);
                guard.refresh_cleanup_timestamp();
                (expired, evicted)
            };

            if expired > 0 || evicted > 0 {
                info!(
                    "Sweep cycle: removed {} expired entries, evicted {}",
                    expired, evicted
                );
            } else {
                debug!("Sweep cycle: nothing to remove");
            }
        }
    })
}
