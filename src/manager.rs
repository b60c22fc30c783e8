//! Cache Manager Module
//!
//! The public handle over the caching engine. One instance is constructed at
//! application startup and passed by reference to every consumer; there is
//! no process-wide singleton, so tests get isolated instances.
//!
//! The handle owns the single lock guarding the entry store, tag index and
//! statistics; the background sweep task; and, when persistence is enabled,
//! the channel feeding the durable mirror writer.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{mpsc, watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cache::{CacheEntry, CacheStore, StatsSnapshot};
use crate::config::Config;
use crate::error::Result;
use crate::persist::{spawn_mirror_writer, PersistedRow, SqliteMirror};
use crate::tasks::spawn_sweep_task;

// == Cache Manager ==
/// Handle to one caching engine instance.
#[derive(Debug)]
pub struct CacheManager {
    store: Arc<RwLock<CacheStore>>,
    shutdown_tx: watch::Sender<bool>,
    sweep_handle: JoinHandle<()>,
    writer_handle: Option<JoinHandle<()>>,
}

impl CacheManager {
    // == Constructor ==
    /// Builds the cache, rehydrates it from the durable mirror when
    /// persistence is enabled, and spawns the background tasks.
    ///
    /// Must be called within a tokio runtime. Fails fast on malformed
    /// configuration or an unopenable mirror database; everything after
    /// construction degrades gracefully instead of erroring.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let mut store = CacheStore::new(config.max_entries, config.max_memory_bytes);
        let mut writer_handle = None;

        if config.enable_persistence {
            let mirror = SqliteMirror::open(&config.persistence_path)?;

            // Reload the previous snapshot, dropping rows already past TTL
            // and replaying the rest oldest-accessed first so the recency
            // order survives the restart.
            let mut restored: Vec<(String, CacheEntry)> = mirror
                .load()?
                .into_iter()
                .map(PersistedRow::into_entry)
                .filter(|(_, entry)| !entry.is_expired())
                .collect();
            restored.sort_by_key(|(_, entry)| entry.accessed_at);

            let loaded = restored.len();
            store.restore(restored);
            info!("Restored {} entries from the durable mirror", loaded);

            let (tx, rx) = mpsc::unbounded_channel();
            store.attach_mirror(tx);
            writer_handle = Some(spawn_mirror_writer(mirror, rx));
        }

        let store = Arc::new(RwLock::new(store));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let sweep_handle =
            spawn_sweep_task(store.clone(), config.cleanup_interval_secs, shutdown_rx);

        Ok(Self {
            store,
            shutdown_tx,
            sweep_handle,
            writer_handle,
        })
    }

    // == Get ==
    /// Retrieves a value; None on absent or expired keys.
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.store.write().await.get(key)
    }

    // == Set ==
    /// Stores a value with optional TTL and tags. Returns false when the
    /// value alone exceeds the memory budget; state is untouched in that
    /// case. May evict other entries to stay within limits.
    pub async fn set(
        &self,
        key: impl Into<String>,
        value: impl Into<Vec<u8>>,
        ttl_seconds: Option<u64>,
        tags: Vec<String>,
    ) -> bool {
        let tags: HashSet<String> = tags.into_iter().collect();
        self.store
            .write()
            .await
            .set(key.into(), value.into(), ttl_seconds, tags)
    }

    // == Delete ==
    /// Removes an entry; false if the key was absent. Never an error.
    pub async fn delete(&self, key: &str) -> bool {
        self.store.write().await.delete(key)
    }

    // == Exists ==
    /// Read-only presence probe; does not affect recency.
    pub async fn exists(&self, key: &str) -> bool {
        self.store.read().await.exists(key)
    }

    // == Touch ==
    /// Refreshes recency and access count without returning the value.
    pub async fn touch(&self, key: &str) -> bool {
        self.store.write().await.touch(key)
    }

    // == Get With Tags ==
    /// Returns all live entries carrying any of the given tags.
    pub async fn get_with_tags(&self, tags: &[String]) -> HashMap<String, Vec<u8>> {
        self.store.read().await.get_with_tags(tags)
    }

    // == Clear ==
    /// With tags: removes the tagged subset. Without: removes everything,
    /// tag index and statistics counters included.
    pub async fn clear(&self, tags: Option<&[String]>) {
        self.store.write().await.clear(tags)
    }

    // == Set TTL ==
    /// Replaces the TTL of an existing entry.
    pub async fn set_ttl(&self, key: &str, ttl_seconds: u64) -> bool {
        self.store.write().await.set_ttl(key, ttl_seconds)
    }

    // == TTL Remaining ==
    /// Remaining TTL in seconds, None if the key is absent or never expires.
    pub async fn ttl_remaining(&self, key: &str) -> Option<u64> {
        self.store.read().await.ttl_remaining(key)
    }

    // == Keys ==
    /// Returns all currently stored keys.
    pub async fn keys(&self) -> Vec<String> {
        self.store.read().await.keys()
    }

    // == Stats ==
    /// Returns a point-in-time statistics snapshot.
    pub async fn stats(&self) -> StatsSnapshot {
        self.store.read().await.stats()
    }

    // == Flush ==
    /// Queues a full snapshot to the durable mirror, replacing its prior
    /// contents. A no-op when persistence is disabled.
    pub async fn flush(&self) {
        self.store.read().await.flush()
    }

    // == Close ==
    /// Shuts the cache down: stops the sweep task cooperatively, writes a
    /// final snapshot, then drains and stops the mirror writer.
    pub async fn close(self) {
        if self.shutdown_tx.send(true).is_err() {
            warn!("Sweep task already gone at close");
        }
        if let Err(e) = self.sweep_handle.await {
            warn!("Sweep task ended abnormally: {}", e);
        }

        {
            let mut guard = self.store.write().await;
            guard.flush();
            guard.detach_mirror();
        }

        if let Some(handle) = self.writer_handle {
            if let Err(e) = handle.await {
                warn!("Mirror writer ended abnormally: {}", e);
            }
        }

        info!("Cache closed");
    }
}
