//! Memoization of successful lookups in a key-value store.
//!
//! The wrapper only needs `get`/`set` by key. Two stores are bundled:
//! [`MemoryStore`] lives as long as the process, [`FileStore`] keeps one JSON
//! file per key on disk. Both take an optional expiry; any other backend can be
//! plugged in through [`CacheStore`].

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

use crate::error::{Result, WhoislyError};
use crate::lookup::{LookupOutcome, WhoisLookup};
use crate::whois::WhoisTransport;

const CACHE_KEY_PREFIX: &str = "whois:";

/// Key-value backend holding serialized lookup outcomes.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Stores `value` with no expiry of its own; eviction is the store's business.
    async fn set(&self, key: &str, value: Value) -> Result<()>;
}

#[async_trait]
impl<S: CacheStore + ?Sized> CacheStore for Arc<S> {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        (**self).set(key, value).await
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    inserted_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Option<Duration>) -> bool {
        ttl.is_some_and(|ttl| self.inserted_at.elapsed() > ttl)
    }
}

/// In-process store; entries live forever unless a TTL is configured.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: Some(ttl),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.read().unwrap_or_else(|poisoned| {
            warn!("Cache read lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.write().unwrap_or_else(|poisoned| {
            warn!("Cache write lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Returns the live value under `key`; expired entries read as missing.
    pub fn get_value(&self, key: &str) -> Option<Value> {
        let entries = self.read();
        let entry = entries.get(key)?;
        if entry.is_expired(self.ttl) {
            debug!(key, age_secs = entry.inserted_at.elapsed().as_secs(), "Cache entry expired");
            return None;
        }
        Some(entry.value.clone())
    }

    /// Inserts `value`, dropping entries that have expired in the meantime.
    pub fn insert(&self, key: impl Into<String>, value: Value) {
        let entry = CacheEntry {
            value,
            inserted_at: Instant::now(),
        };
        let mut entries = self.write();
        if self.ttl.is_some() {
            entries.retain(|_, entry| !entry.is_expired(self.ttl));
        }
        entries.insert(key.into(), entry);
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.write().remove(key).map(|e| e.value)
    }

    /// Drops expired entries.
    pub fn cleanup(&self) {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(self.ttl));
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, remaining = entries.len(), "Cache cleanup complete");
        }
    }

    /// Number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.write().clear();
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.get_value(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.insert(key, value);
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    /// Unix seconds at write time.
    stored_at: i64,
    value: Value,
}

/// Store keeping one JSON file per key under `dir`, so entries outlive the process.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    ttl: Option<Duration>,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ttl: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Keys are hex-encoded so any query maps to a distinct, valid file name.
    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key.bytes().map(|b| format!("{:02x}", b)).collect();
        self.dir.join(format!("{}.json", name))
    }

    fn is_expired(&self, entry: &StoredEntry) -> bool {
        self.ttl.is_some_and(|ttl| {
            let age = Utc::now().timestamp().saturating_sub(entry.stored_at);
            age > i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX)
        })
    }
}

fn io_error(action: &str, path: &Path, e: std::io::Error) -> WhoislyError {
    WhoislyError::CacheError(format!("Failed to {} {}: {}", action, path.display(), e))
}

#[async_trait]
impl CacheStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path_for(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error("read", &path, e)),
        };

        let entry: StoredEntry = serde_json::from_slice(&bytes)?;
        if self.is_expired(&entry) {
            debug!(key, path = %path.display(), "Cache file expired");
            if let Err(e) = tokio::fs::remove_file(&path).await {
                debug!(error = %e, "Failed to remove expired cache file");
            }
            return Ok(None);
        }

        Ok(Some(entry.value))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error("create", &self.dir, e))?;

        let path = self.path_for(key);
        let entry = StoredEntry {
            stored_at: Utc::now().timestamp(),
            value,
        };
        let bytes = serde_json::to_vec(&entry)?;

        // Write then rename so readers never see a partial file
        let tmp = path.with_extension(format!("{}.tmp", std::process::id()));
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| io_error("write", &tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| io_error("rename", &tmp, e))?;

        debug!(key, path = %path.display(), "Cache file written");
        Ok(())
    }
}

/// Store key for a query. Case is kept as given, so `Example.com` and
/// `example.com` are cached separately.
pub fn cache_key(query: &str) -> String {
    format!("{}{}", CACHE_KEY_PREFIX, query)
}

/// A [`WhoisLookup`] whose successful outcomes are memoized in a [`CacheStore`].
pub struct CachedLookup<T: WhoisTransport, S: CacheStore> {
    lookup: WhoisLookup<T>,
    store: S,
}

impl<T: WhoisTransport, S: CacheStore> CachedLookup<T, S> {
    pub fn new(lookup: WhoisLookup<T>, store: S) -> Self {
        Self { lookup, store }
    }

    pub fn inner(&self) -> &WhoisLookup<T> {
        &self.lookup
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Serves from the store when possible, otherwise looks up live.
    ///
    /// Hits come back with `time: 0` and `cached: true`. Misses are written
    /// back only when they succeeded and always return `cached: false`; store
    /// failures are logged and never surface.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn lookup(&self, query: &str) -> LookupOutcome {
        let key = cache_key(query);

        if let Some(mut outcome) = self.read_cached(&key).await {
            debug!(key = %key, "Cache hit");
            outcome.time = 0.0;
            outcome.cached = Some(true);
            return outcome;
        }
        debug!(key = %key, "Cache miss");

        let mut outcome = self.lookup.lookup(query).await;
        if outcome.status {
            self.write_cached(&key, &outcome).await;
        }

        outcome.cached = Some(false);
        outcome
    }

    async fn read_cached(&self, key: &str) -> Option<LookupOutcome> {
        let value = match self.store.get(key).await {
            Ok(value) => value?,
            Err(e) => {
                warn!(key, error = %e, "Cache read failed");
                return None;
            }
        };

        match serde_json::from_value(value) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!(key, error = %e, "Ignoring undecodable cache entry");
                None
            }
        }
    }

    async fn write_cached(&self, key: &str, outcome: &LookupOutcome) {
        let value = match serde_json::to_value(outcome) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize outcome for cache");
                return;
            }
        };

        if let Err(e) = self.store.set(key, value).await {
            warn!(key, error = %e, "Cache write failed");
        }
    }
}
