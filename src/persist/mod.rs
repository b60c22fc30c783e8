//! Persistence Adapter Module
//!
//! Best-effort SQLite mirror of the entry store. The in-memory cache is
//! always authoritative; the mirror exists only to repopulate the cache
//! after a restart. Mirroring is at-least-once: mutations enqueue ops on an
//! unbounded channel and a dedicated blocking task applies them, so SQLite
//! I/O never runs under the cache lock. A failed write is logged and the
//! cache keeps serving from memory.

use std::path::Path;

use rusqlite::{params, Connection};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::cache::CacheEntry;
use crate::error::Result;

// == Mirror Op ==
/// A single durable-store mutation, queued by the entry store.
#[derive(Debug)]
pub enum MirrorOp {
    /// Insert or fully replace one row
    Upsert(PersistedRow),
    /// Remove one row
    Delete(String),
    /// Remove all rows
    Clear,
    /// Replace the entire table with the given snapshot
    Snapshot(Vec<PersistedRow>),
}

// == Persisted Row ==
/// Wire form of one cache entry, matching the `cache_entries` table layout.
#[derive(Debug, Clone)]
pub struct PersistedRow {
    pub key: String,
    pub value: Vec<u8>,
    pub created_at: u64,
    pub accessed_at: u64,
    pub access_count: u64,
    pub size_bytes: u64,
    pub ttl_seconds: Option<u64>,
    pub tags: Vec<String>,
}

impl PersistedRow {
    /// Builds a row from a live entry.
    pub fn from_entry(key: &str, entry: &CacheEntry) -> Self {
        let mut tags: Vec<String> = entry.tags.iter().cloned().collect();
        tags.sort();
        Self {
            key: key.to_string(),
            value: entry.value.clone(),
            created_at: entry.created_at,
            accessed_at: entry.accessed_at,
            access_count: entry.access_count,
            size_bytes: entry.size_bytes,
            ttl_seconds: entry.ttl_seconds,
            tags,
        }
    }

    /// Reconstructs a live entry, returning it with its key.
    pub fn into_entry(self) -> (String, CacheEntry) {
        let entry = CacheEntry {
            value: self.value,
            created_at: self.created_at,
            accessed_at: self.accessed_at,
            access_count: self.access_count,
            size_bytes: self.size_bytes,
            ttl_seconds: self.ttl_seconds,
            tags: self.tags.into_iter().collect(),
        };
        (self.key, entry)
    }
}

// == Sqlite Mirror ==
/// Owns the SQLite connection backing the durable mirror.
#[derive(Debug)]
pub struct SqliteMirror {
    conn: Connection,
}

impl SqliteMirror {
    // == Open ==
    /// Opens (or creates) the mirror database and ensures the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS cache_entries (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                created_at INTEGER NOT NULL,
                accessed_at INTEGER NOT NULL,
                access_count INTEGER NOT NULL DEFAULT 0,
                size_bytes INTEGER NOT NULL DEFAULT 0,
                ttl_seconds INTEGER,
                tags TEXT
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_cache_created_at ON cache_entries(created_at)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_cache_accessed_at ON cache_entries(accessed_at)",
            [],
        )?;

        Ok(Self { conn })
    }

    // == Apply ==
    /// Applies one queued mutation.
    pub fn apply(&mut self, op: MirrorOp) -> Result<()> {
        match op {
            MirrorOp::Upsert(row) => self.upsert(&row),
            MirrorOp::Delete(key) => self.delete(&key),
            MirrorOp::Clear => self.clear(),
            MirrorOp::Snapshot(rows) => self.write_snapshot(&rows),
        }
    }

    // == Upsert ==
    /// Inserts or fully replaces one row.
    pub fn upsert(&self, row: &PersistedRow) -> Result<()> {
        let tags_json = if row.tags.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&row.tags)?)
        };

        self.conn.execute(
            "INSERT OR REPLACE INTO cache_entries (
                key, value, created_at, accessed_at, access_count,
                size_bytes, ttl_seconds, tags
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                row.key,
                row.value,
                row.created_at as i64,
                row.accessed_at as i64,
                row.access_count as i64,
                row.size_bytes as i64,
                row.ttl_seconds.map(|t| t as i64),
                tags_json,
            ],
        )?;
        Ok(())
    }

    // == Delete ==
    /// Removes one row; removing an absent key is not an error.
    pub fn delete(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM cache_entries WHERE key = ?1", params![key])?;
        Ok(())
    }

    // == Clear ==
    /// Removes all rows.
    pub fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM cache_entries", [])?;
        Ok(())
    }

    // == Write Snapshot ==
    /// Replaces the full table contents with the given rows, atomically.
    pub fn write_snapshot(&mut self, rows: &[PersistedRow]) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM cache_entries", [])?;

        for row in rows {
            let tags_json = if row.tags.is_empty() {
                None
            } else {
                Some(serde_json::to_string(&row.tags)?)
            };
            tx.execute(
                "INSERT INTO cache_entries (
                    key, value, created_at, accessed_at, access_count,
                    size_bytes, ttl_seconds, tags
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    row.key,
                    row.value,
                    row.created_at as i64,
                    row.accessed_at as i64,
                    row.access_count as i64,
                    row.size_bytes as i64,
                    row.ttl_seconds.map(|t| t as i64),
                    tags_json,
                ],
            )?;
        }

        tx.commit()?;
        debug!("Mirror snapshot written: {} rows", rows.len());
        Ok(())
    }

    // == Load ==
    /// Reads the full table. Rows that fail to decode are skipped with a
    /// warning rather than aborting the whole load.
    pub fn load(&self) -> Result<Vec<PersistedRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT key, value, created_at, accessed_at, access_count,
                    size_bytes, ttl_seconds, tags
             FROM cache_entries",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Vec<u8>>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, Option<i64>>(6)?,
                row.get::<_, Option<String>>(7)?,
            ))
        })?;

        let mut loaded = Vec::new();
        for row in rows {
            let (key, value, created_at, accessed_at, access_count, size_bytes, ttl, tags_json) =
                match row {
                    Ok(fields) => fields,
                    Err(e) => {
                        tracing::warn!("Skipping unreadable mirror row: {}", e);
                        continue;
                    }
                };

            let tags = match tags_json {
                Some(json) => match serde_json::from_str::<Vec<String>>(&json) {
                    Ok(tags) => tags,
                    Err(e) => {
                        tracing::warn!("Skipping mirror row '{}' with bad tags: {}", key, e);
                        continue;
                    }
                },
                None => Vec::new(),
            };

            loaded.push(PersistedRow {
                key,
                value,
                created_at: created_at as u64,
                accessed_at: accessed_at as u64,
                access_count: access_count as u64,
                size_bytes: size_bytes as u64,
                ttl_seconds: ttl.map(|t| t as u64),
                tags,
            });
        }

        Ok(loaded)
    }
}

// == Mirror Writer Task ==
/// Spawns the blocking task that drains queued mirror ops.
///
/// The task exits when every sender is dropped. Failures are logged and the
/// loop continues; the in-memory cache never observes them.
pub fn spawn_mirror_writer(
    mut mirror: SqliteMirror,
    mut rx: UnboundedReceiver<MirrorOp>,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        info!("Mirror writer task started");

        while let Some(op) = rx.blocking_recv() {
            if let Err(e) = mirror.apply(op) {
                error!("Mirror write failed: {}", e);
            }
        }

        info!("Mirror writer task stopped");
    })
}
