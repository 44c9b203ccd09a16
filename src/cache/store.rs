//! Backing key/value stores for the resource cache.
//!
//! [`ResourceCache`](super::ResourceCache) talks to its store only through
//! [`CacheStore`], so a networked store can be slotted in without touching
//! the caching logic. Values are JSON so any serializable result can be
//! stored, and expiry is per entry: `None` means the entry never expires.
//!
//! [`MemoryStore`] is the in-process implementation, backed by moka. Moka
//! evicts expired entries lazily; [`CacheStore::prune`] forces pending
//! evictions to run, which the resource cache does on a timer.

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::Result;

use super::settings::DEFAULT_MAX_ENTRIES;

/// A key/value store with per-entry expiry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Store name for logging/debugging.
    fn name(&self) -> &str;

    /// Whether entries live in this process (and so need local pruning).
    fn is_in_memory(&self) -> bool;

    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Insert or overwrite `key`. `ttl = None` stores without expiry.
    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Live keys, optionally filtered by a `*` wildcard pattern.
    async fn keys(&self, pattern: Option<&str>) -> Result<Vec<String>>;

    /// Drop every entry.
    async fn reset(&self) -> Result<()>;

    /// Evict expired entries now. Stores that expire on their own may
    /// leave this as a no-op.
    async fn prune(&self) -> Result<()> {
        Ok(())
    }
}

/// Get `key` or compute it with `producer` and store the result.
///
/// Returns the value together with whether it came from the store.
pub async fn wrap<T, F, Fut>(
    store: &dyn CacheStore,
    key: &str,
    ttl: Option<Duration>,
    producer: F,
) -> Result<(T, bool)>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if let Some(cached) = store.get(key).await? {
        match serde_json::from_value(cached) {
            Ok(value) => return Ok((value, true)),
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding undecodable cache entry");
            }
        }
    }
    let value = producer().await?;
    store.set(key, serde_json::to_value(&value)?, ttl).await?;
    Ok((value, false))
}

/// Match `key` against a pattern where `*` stands for any run of characters.
pub fn glob_match(pattern: &str, key: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == key;
    }

    let mut rest = key;
    let first = parts[0];
    if !rest.starts_with(first) {
        return false;
    }
    rest = &rest[first.len()..];

    let last = parts[parts.len() - 1];
    for middle in &parts[1..parts.len() - 1] {
        match rest.find(middle) {
            Some(idx) => rest = &rest[idx + middle.len()..],
            None => return false,
        }
    }
    rest.len() >= last.len() && rest.ends_with(last)
}

#[derive(Clone, Debug)]
struct StoredEntry {
    value: Value,
    ttl: Option<Duration>,
}

/// Per-entry expiry: each entry carries its own TTL.
struct EntryExpiry;

impl Expiry<String, StoredEntry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl
    }
}

/// In-process store backed by moka.
///
/// Thread-safe (moka handles concurrent access internally). Bounded by
/// `max_entries`; least recently used entries are evicted first.
pub struct MemoryStore {
    cache: Cache<String, StoredEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }

    pub fn with_max_entries(max: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max)
            .expire_after(EntryExpiry)
            .build();
        Self { cache }
    }

    /// Approximate number of live entries.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn is_in_memory(&self) -> bool {
        true
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.cache.get(key).await.map(|entry| entry.value))
    }

    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()> {
        self.cache
            .insert(key.to_string(), StoredEntry { value, ttl })
            .await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn keys(&self, pattern: Option<&str>) -> Result<Vec<String>> {
        Ok(self
            .cache
            .iter()
            .map(|(k, _)| k.as_ref().clone())
            .filter(|k| pattern.is_none_or(|p| glob_match(p, k)))
            .collect())
    }

    async fn reset(&self) -> Result<()> {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        Ok(())
    }

    async fn prune(&self) -> Result<()> {
        self.cache.run_pending_tasks().await;
        Ok(())
    }
}
