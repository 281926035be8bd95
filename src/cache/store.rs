use crate::cache::{CacheKey, Clock, SystemClock};
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock, Weak};
use tokio::task::JoinHandle;

/// Hex characters of the content hash kept in a fingerprint
const FINGERPRINT_LEN: usize = 16;

/// Ten years; longer lifetimes are clamped
const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Result of [`Cache::with_cache`]
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    pub value: T,

    /// Quoted content hash, usable as an `ETag`
    pub fingerprint: String,

    /// True when the value came from the cache and the producer did not run
    pub was_hit: bool,
}

/// In-memory TTL cache shared by all sessions
///
/// Individual get, set and remove operations are atomic. No lock is held
/// while a producer runs, so two concurrent misses on the same key may both
/// produce; the later store wins.
#[derive(Debug)]
pub struct Cache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Stored JSON for `key`, if present and unexpired
    pub fn get_value(&self, key: &CacheKey) -> Option<Value> {
        let rendered = key.to_string();
        let now = self.clock.now();

        let entry = self.read().get(&rendered).cloned()?;
        if entry.is_expired(now) {
            self.remove_if_expired(&rendered, now);
            return None;
        }
        Some(entry.value)
    }

    /// Removes `rendered` only if it is still expired under the write lock;
    /// a writer may have refreshed it after the read lock was released.
    fn remove_if_expired(&self, rendered: &str, now: DateTime<Utc>) -> bool {
        let mut entries = self.write();
        if entries.get(rendered).is_some_and(|e| e.is_expired(now)) {
            entries.remove(rendered);
            tracing::trace!("Cache entry {} expired", rendered);
            true
        } else {
            false
        }
    }

    /// Stored value for `key`, if present, unexpired and of type `T`
    pub fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let value = self.get_value(key)?;
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::debug!("Cache entry {} has an unexpected shape: {}", key, e);
                None
            }
        }
    }

    /// Stores `value` under `key` for `ttl_secs` seconds
    pub fn set<T: Serialize>(
        &self,
        key: &CacheKey,
        value: &T,
        ttl_secs: u64,
    ) -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(value)?;
        self.insert(key, value, ttl_secs);
        Ok(())
    }

    fn insert(&self, key: &CacheKey, value: Value, ttl_secs: u64) {
        let ttl = Duration::seconds(ttl_secs.min(MAX_TTL_SECS) as i64);
        let entry = CacheEntry {
            value,
            expires_at: self.clock.now() + ttl,
        };
        self.write().insert(key.to_string(), entry);
        tracing::trace!("Cached {} for {}s", key, ttl_secs);
    }

    pub fn remove(&self, key: &CacheKey) -> bool {
        self.write().remove(&key.to_string()).is_some()
    }

    /// Returns the cached value for `key`, or runs `producer` and caches its
    /// result for `ttl_secs` seconds.
    ///
    /// A failing producer leaves the cache untouched and its error is
    /// returned unchanged.
    ///
    /// # Arguments
    ///
    /// * `key` - Entry to read or fill
    /// * `ttl_secs` - Lifetime of a freshly produced value
    /// * `producer` - Fetches and extracts the value on a miss
    pub async fn with_cache<T, E, F, Fut>(
        &self,
        key: &CacheKey,
        ttl_secs: u64,
        producer: F,
    ) -> Result<Cached<T>, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<serde_json::Error>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(stored) = self.get_value(key) {
            let fingerprint = fingerprint(&stored);
            match serde_json::from_value(stored) {
                Ok(value) => {
                    tracing::debug!("Cache hit: {}", key);
                    return Ok(Cached {
                        value,
                        fingerprint,
                        was_hit: true,
                    });
                }
                Err(e) => tracing::debug!("Discarding cache entry {}: {}", key, e),
            }
        }

        tracing::debug!("Cache miss: {}", key);
        let value = producer().await?;
        let stored = serde_json::to_value(&value)?;
        let fingerprint = fingerprint(&stored);
        self.insert(key, stored, ttl_secs);

        Ok(Cached {
            value,
            fingerprint,
            was_hit: false,
        })
    }

    /// Removes every entry belonging to one session namespace, per-course
    /// and per-activity entries included. Returns how many were removed.
    pub fn clear_session(&self, namespace: &str) -> usize {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|key, _| key.split(':').nth(1) != Some(namespace));
        let removed = before - entries.len();
        tracing::debug!("Cleared {} cache entries for session {}", removed, namespace);
        removed
    }

    /// Purges expired entries. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

/// Quoted, truncated SHA-256 of the value's JSON serialization
pub fn fingerprint(value: &Value) -> String {
    let digest = Sha256::digest(value.to_string().as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(FINGERPRINT_LEN);
    format!("\"{}\"", hex)
}

/// A store whose entries expire and can be purged in bulk
pub trait Expiring: Send + Sync + 'static {
    /// Removes every expired entry and returns how many were removed
    fn purge_expired(&self) -> usize;
}

impl Expiring for Cache {
    fn purge_expired(&self) -> usize {
        self.sweep()
    }
}

/// Starts the periodic sweep of `store` on the current tokio runtime.
///
/// The task holds only a weak reference and ends once the store is dropped.
pub fn spawn_sweeper<S: Expiring>(store: &Arc<S>, every: std::time::Duration) -> JoinHandle<()> {
    let store: Weak<S> = Arc::downgrade(store);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let Some(store) = store.upgrade() else {
                tracing::debug!("Store dropped, stopping sweeper");
                break;
            };
            let purged = store.purge_expired();
            if purged > 0 {
                tracing::debug!("Swept {} expired entries", purged);
            }
        }
    })
}
