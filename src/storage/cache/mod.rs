//! Time-to-live cache stored in two places: a `{data, timestamp, expiry}`
//! envelope under `cache_{key}` in the key-value store, mirrored into a
//! SQLite table that survives a cleared key-value store.

use super::{Storage, keys::CACHE_PREFIX};
use crate::utils::now_millis;
use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEnvelope {
    pub data: Value,
    /// Write time, epoch milliseconds.
    pub timestamp: i64,
    /// Expiry time, epoch milliseconds.
    pub expiry: i64,
}

impl CacheEnvelope {
    pub fn is_fresh(&self, now_ms: i64) -> bool {
        now_ms < self.expiry
    }
}

/// Indexed cache store backed by SQLite.
pub struct CacheIndex {
    conn: Mutex<Connection>,
}

impl CacheIndex {
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create cache directory: {}", parent.display())
            })?;
        }
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open cache database at: {}", db_path.display()))?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA busy_timeout=3000;",
        )?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS cache_entries (
                key TEXT PRIMARY KEY,
                data TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                expiry INTEGER NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_cache_expiry ON cache_entries(expiry)",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| anyhow::anyhow!("cache DB lock poisoned: {}", e))
    }

    pub fn put(&self, key: &str, envelope: &CacheEnvelope) -> Result<()> {
        let data = serde_json::to_string(&envelope.data)?;
        self.conn()?.execute(
            "INSERT INTO cache_entries (key, data, timestamp, expiry) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(key) DO UPDATE SET data = excluded.data,
                timestamp = excluded.timestamp, expiry = excluded.expiry",
            params![key, data, envelope.timestamp, envelope.expiry],
        )?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<CacheEnvelope>> {
        let conn = self.conn()?;
        let row: Option<(String, i64, i64)> = conn
            .query_row(
                "SELECT data, timestamp, expiry FROM cache_entries WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        match row {
            Some((data, timestamp, expiry)) => Ok(Some(CacheEnvelope {
                data: serde_json::from_str(&data)?,
                timestamp,
                expiry,
            })),
            None => Ok(None),
        }
    }

    /// Delete rows whose expiry is at or before `now_ms`. Returns rows removed.
    pub fn purge_expired(&self, now_ms: i64) -> Result<usize> {
        let removed = self.conn()?.execute(
            "DELETE FROM cache_entries WHERE expiry <= ?1",
            params![now_ms],
        )?;
        Ok(removed)
    }

    pub fn clear(&self) -> Result<usize> {
        Ok(self.conn()?.execute("DELETE FROM cache_entries", [])?)
    }
}

pub struct MessageCache {
    storage: Storage,
    index: Option<CacheIndex>,
    ttl: Duration,
}

impl MessageCache {
    pub fn new(storage: Storage, index: Option<CacheIndex>) -> Self {
        Self {
            storage,
            index,
            ttl: DEFAULT_TTL,
        }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn storage_key(key: &str) -> String {
        format!("{}{}", CACHE_PREFIX, key)
    }

    pub fn set_cache<T: Serialize + ?Sized>(&self, key: &str, data: &T) -> bool {
        self.set_cache_at(key, data, now_millis())
    }

    pub fn set_cache_at<T: Serialize + ?Sized>(&self, key: &str, data: &T, now_ms: i64) -> bool {
        let data = match serde_json::to_value(data) {
            Ok(v) => v,
            Err(e) => {
                warn!("failed to encode cache entry '{}': {}", key, e);
                return false;
            }
        };
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        let envelope = CacheEnvelope {
            data,
            timestamp: now_ms,
            expiry: now_ms.saturating_add(ttl_ms),
        };
        let storage_key = Self::storage_key(key);
        let stored = self.storage.set(&storage_key, &envelope);
        if let Some(index) = &self.index
            && let Err(e) = index.put(&storage_key, &envelope)
        {
            warn!("failed to mirror cache entry '{}': {:#}", key, e);
        }
        stored
    }

    pub fn get_cache<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_cache_at(key, now_millis())
    }

    /// Key-value copy if fresh, else the indexed copy if fresh.
    pub fn get_cache_at<T: DeserializeOwned>(&self, key: &str, now_ms: i64) -> Option<T> {
        let storage_key = Self::storage_key(key);
        let envelope = self
            .storage
            .get::<Option<CacheEnvelope>>(&storage_key, None)
            .filter(|env| env.is_fresh(now_ms))
            .or_else(|| {
                let index = self.index.as_ref()?;
                match index.get(&storage_key) {
                    Ok(found) => found.filter(|env| env.is_fresh(now_ms)),
                    Err(e) => {
                        warn!("failed to read indexed cache entry '{}': {:#}", key, e);
                        None
                    }
                }
            })?;
        match serde_json::from_value(envelope.data) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("cache entry '{}' has unexpected shape: {}", key, e);
                None
            }
        }
    }

    pub fn clear_expired_cache(&self) -> usize {
        self.clear_expired_cache_at(now_millis())
    }

    /// Remove expired or unparsable `cache_*` entries from both stores.
    /// Returns how many key-value entries were removed.
    pub fn clear_expired_cache_at(&self, now_ms: i64) -> usize {
        let mut removed = 0;
        for key in self.storage.keys() {
            if !key.starts_with(CACHE_PREFIX) {
                continue;
            }
            let fresh = self
                .storage
                .get_raw(&key)
                .and_then(|raw| serde_json::from_str::<CacheEnvelope>(&raw).ok())
                .is_some_and(|env| env.is_fresh(now_ms));
            if !fresh && self.storage.remove(&key) {
                removed += 1;
            }
        }
        if let Some(index) = &self.index {
            match index.purge_expired(now_ms) {
                Ok(n) if n > 0 => debug!("purged {} expired indexed cache rows", n),
                Ok(_) => {}
                Err(e) => warn!("failed to purge indexed cache: {:#}", e),
            }
        }
        removed
    }

    /// Drop every cache entry regardless of expiry.
    pub fn clear_all(&self) -> usize {
        let mut removed = 0;
        for key in self.storage.keys() {
            if key.starts_with(CACHE_PREFIX) && self.storage.remove(&key) {
                removed += 1;
            }
        }
        if let Some(index) = &self.index
            && let Err(e) = index.clear()
        {
            warn!("failed to clear indexed cache: {:#}", e);
        }
        removed
    }
}
