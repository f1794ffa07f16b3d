//! Local key-value persistence.
//!
//! Values are stored as JSON-encoded strings under string keys, the way a
//! browser's `localStorage` holds them. [`Storage`] is the typed accessor
//! layer: every read takes a default and every failure is logged and
//! swallowed, so callers never see a persistence error.

pub mod cache;
pub mod export;

use crate::utils::{atomic_write, ensure_dir};
use anyhow::{Context, Result};
use fs2::FileExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

pub use cache::{CacheEnvelope, CacheIndex, MessageCache};
pub use export::export_snapshot;

/// Keys written by the application.
pub mod keys {
    pub const SETTINGS: &str = "settings";
    pub const FAVORITES: &str = "favorites";
    pub const HISTORY: &str = "messageHistory";
    pub const MESSAGE_STATS: &str = "messageStats";
    pub const USER_REACTIONS: &str = "userReactions";
    pub const JOURNAL: &str = "dailyJournal";
    pub const HABITS: &str = "habitTracker";
    pub const GOALS: &str = "userGoals";
    pub const USER_MESSAGES: &str = "userMessages";
    pub const COMMUNITY_MESSAGES: &str = "communityMessages";
    pub const RECENT_MESSAGES: &str = "recentMessages";
    pub const STREAK: &str = "streakData";
    pub const CACHE_PREFIX: &str = "cache_";
}

/// Raw string store. Implementations report errors; [`Storage`] decides
/// what to do with them.
pub trait KvBackend: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
    fn keys(&self) -> Result<Vec<String>>;
    fn clear(&self) -> Result<()>;
}

/// Approximate byte footprint of a map, counted the way quota is charged.
fn footprint(map: &BTreeMap<String, String>) -> usize {
    map.iter().map(|(k, v)| k.len() + v.len()).sum()
}

/// In-process store, used by tests and when no storage directory is usable.
pub struct MemoryBackend {
    items: Mutex<BTreeMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(BTreeMap::new()),
            quota_bytes: None,
        }
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            items: Mutex::new(BTreeMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.items
            .lock()
            .map_err(|e| anyhow::anyhow!("storage lock poisoned: {}", e))
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl KvBackend for MemoryBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.lock()?;
        if let Some(quota) = self.quota_bytes {
            let current = footprint(&items) - items.get(key).map_or(0, |v| key.len() + v.len());
            if current + key.len() + value.len() > quota {
                anyhow::bail!("storage quota of {} bytes exceeded", quota);
            }
        }
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }

    fn clear(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }
}

/// JSON file holding the whole map, rewritten atomically on every change.
///
/// The map is re-read under a shared lock before each operation so that two
/// processes sharing a directory see each other's writes; concurrent writers
/// still race last-write-wins.
pub struct FileBackend {
    path: PathBuf,
    quota_bytes: usize,
    guard: Mutex<()>,
}

impl FileBackend {
    pub fn open(path: impl AsRef<Path>, quota_bytes: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        ensure_dir(path.parent().context("storage path has no parent")?)?;
        let backend = Self {
            path,
            quota_bytes,
            guard: Mutex::new(()),
        };
        // Quarantines a corrupt file now instead of on the first write
        backend.read_map()?;
        debug!("opened storage at {}", backend.path.display());
        Ok(backend)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("json.lock")
    }

    /// Where an unparsable storage file is moved.
    pub fn corrupt_path(&self) -> PathBuf {
        self.path.with_extension("json.corrupt")
    }

    /// Current map. A file that does not parse is moved aside and the store
    /// starts over empty.
    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let file = fs::File::open(&self.path)
            .with_context(|| format!("Failed to open storage at {}", self.path.display()))?;
        file.lock_shared()
            .with_context(|| "Failed to acquire shared lock on storage file")?;
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read storage from {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        match serde_json::from_str(&content) {
            Ok(map) => Ok(map),
            Err(e) => {
                drop(file);
                let aside = self.corrupt_path();
                fs::rename(&self.path, &aside).with_context(|| {
                    format!("Failed to move corrupt storage to {}", aside.display())
                })?;
                warn!(
                    "storage at {} is not valid JSON ({}), moved to {} and starting empty",
                    self.path.display(),
                    e,
                    aside.display()
                );
                Ok(BTreeMap::new())
            }
        }
    }

    /// Apply `change` to the stored map and write it back under an exclusive lock.
    fn update(&self, change: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let _guard = self
            .guard
            .lock()
            .map_err(|e| anyhow::anyhow!("storage lock poisoned: {}", e))?;

        let lock_path = self.lock_path();
        let lock_file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&lock_path)
            .with_context(|| format!("Failed to create lock file at {}", lock_path.display()))?;
        lock_file
            .lock_exclusive()
            .with_context(|| "Failed to acquire exclusive lock on storage lock file")?;

        let mut map = self.read_map()?;
        change(&mut map);
        if footprint(&map) > self.quota_bytes {
            anyhow::bail!("storage quota of {} bytes exceeded", self.quota_bytes);
        }
        let content = serde_json::to_string_pretty(&map)?;
        atomic_write(&self.path, &content)
            .with_context(|| format!("Failed to write storage to {}", self.path.display()))
    }
}

impl KvBackend for FileBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_map()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.update(|map| {
            map.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.update(|map| {
            map.remove(key);
        })
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.read_map()?.into_keys().collect())
    }

    fn clear(&self) -> Result<()> {
        self.update(BTreeMap::clear)
    }
}

/// Typed accessors over a [`KvBackend`].
#[derive(Clone)]
pub struct Storage {
    backend: Arc<dyn KvBackend>,
}

impl Storage {
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// File-backed storage at `dir/storage.json`.
    pub fn open_dir(dir: &Path, quota_bytes: usize) -> Result<Self> {
        let backend = FileBackend::open(dir.join("storage.json"), quota_bytes)?;
        Ok(Self::new(Arc::new(backend)))
    }

    /// Decoded value for `key`, or `default` when absent, unreadable or of
    /// the wrong shape.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.backend.get_item(key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    warn!("stored value for '{}' is not valid: {}", key, e);
                    default
                }
            },
            Ok(None) => default,
            Err(e) => {
                warn!("failed to read '{}' from storage: {:#}", key, e);
                default
            }
        }
    }

    /// Raw JSON string for `key`, without decoding.
    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.backend.get_item(key).unwrap_or_else(|e| {
            warn!("failed to read '{}' from storage: {:#}", key, e);
            None
        })
    }

    /// Encode and store. Returns false (after logging) on any failure.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let encoded = match serde_json::to_string(value) {
            Ok(s) => s,
            Err(e) => {
                warn!("failed to encode value for '{}': {}", key, e);
                return false;
            }
        };
        match self.backend.set_item(key, &encoded) {
            Ok(()) => true,
            Err(e) => {
                warn!("failed to write '{}' to storage: {:#}", key, e);
                false
            }
        }
    }

    pub fn remove(&self, key: &str) -> bool {
        match self.backend.remove_item(key) {
            Ok(()) => true,
            Err(e) => {
                warn!("failed to remove '{}' from storage: {:#}", key, e);
                false
            }
        }
    }

    pub fn clear(&self) -> bool {
        match self.backend.clear() {
            Ok(()) => true,
            Err(e) => {
                warn!("failed to clear storage: {:#}", e);
                false
            }
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.backend.keys().unwrap_or_else(|e| {
            warn!("failed to list storage keys: {:#}", e);
            Vec::new()
        })
    }
}
