// Key-value cache port and the in-memory TTL backend
// Values are opaque strings; JSON encoding happens in `get_json` / `set_json`

use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use tracing::trace;

use crate::{config::CacheConfig, error::CacheError};

#[async_trait]
pub trait KeyValueCache: Send + Sync + 'static {
    // Absent and expired keys both come back as `Ok(None)`
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    // `None` uses the backend's configured default TTL
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    // Liveness check; connectivity failures are reported as `false`
    async fn ping(&self) -> bool;
}

pub async fn get_json<T: DeserializeOwned>(
    cache: &dyn KeyValueCache,
    key: &str,
) -> Result<Option<T>, CacheError> {
    match cache.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub async fn set_json<T: Serialize + ?Sized>(
    cache: &dyn KeyValueCache,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) -> Result<(), CacheError> {
    let raw = serde_json::to_string(value)?;
    cache.set(key, raw, ttl).await
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub items_count: usize,
    pub hit_count: usize,
    pub miss_count: usize,
    pub expired_count: usize,
}

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// In-process cache with per-entry expiry.
///
/// Entries live in a sharded `DashMap`; a `BTreeMap` keyed by expiry instant
/// lets each access sweep everything that has lapsed without scanning the map.
/// No size bound, an entry only leaves on expiry or `delete`.
pub struct TtlCache {
    store: DashMap<String, CacheEntry>,
    config: CacheConfig,
    cache_stats: Arc<RwLock<CacheStats>>,
    expiry_index: Arc<RwLock<BTreeMap<Instant, HashSet<String>>>>,
}

impl TtlCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            store: DashMap::new(),
            config,
            cache_stats: Arc::new(RwLock::new(CacheStats::default())),
            expiry_index: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = self.cache_stats.read().clone();
        stats.items_count = self.store.len();
        stats
    }

    // Pops the earliest bucket only if it has lapsed by `now`
    fn remove_oldest(&self, now: Instant) -> bool {
        let keys = {
            let mut index = self.expiry_index.write();
            match index.first_key_value() {
                Some((expires_at, _)) if *expires_at <= now => {}
                _ => return false,
            }
            match index.pop_first() {
                Some((_, keys)) => keys,
                None => return false,
            }
        };

        for key in keys {
            // a key overwritten since it was indexed carries a later expiry
            if self
                .store
                .remove_if(&key, |_, entry| entry.expires_at <= now)
                .is_some()
            {
                self.cache_stats.write().expired_count += 1;
                trace!(%key, "cache entry expired");
            }
        }
        true
    }

    fn cleanup_cache(&self) {
        let now = Instant::now();
        while self.remove_oldest(now) {}
    }
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[async_trait]
impl KeyValueCache for TtlCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.cleanup_cache();

        let now = Instant::now();
        let found = self
            .store
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value.clone());

        let mut stats = self.cache_stats.write();
        if found.is_some() {
            stats.hit_count += 1;
        } else {
            stats.miss_count += 1;
        }

        Ok(found)
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), CacheError> {
        let expires_at = Instant::now() + ttl.unwrap_or_else(|| self.config.default_ttl());

        self.store.insert(
            key.to_string(),
            CacheEntry { value, expires_at },
        );
        self.expiry_index
            .write()
            .entry(expires_at)
            .or_default()
            .insert(key.to_string());

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.store.remove(key);
        Ok(())
    }

    async fn ping(&self) -> bool {
        true
    }
}
