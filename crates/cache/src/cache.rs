//! Cache facade: JSON values, read-through, invalidation, statistics.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use beatstore_core::cache_keys::InvalidationEvent;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CacheError;
use crate::l1::BoundedCache;
use crate::memory::MemoryStore;
use crate::store::CacheStore;

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
}

impl Counters {
    fn reset(&self) {
        for counter in [&self.hits, &self.misses, &self.sets, &self.deletes] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Snapshot of cache activity since start-up or the last reset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub backend: &'static str,
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    /// `hits / (hits + misses)`, or 0 before the first read.
    pub hit_rate: f64,
    pub keys: u64,
    pub l1_entries: usize,
    pub l1_capacity: usize,
}

pub struct Cache {
    store: Arc<dyn CacheStore>,
    l1: BoundedCache,
    counters: Counters,
}

impl Cache {
    pub fn new(store: Arc<dyn CacheStore>, l1_capacity: usize) -> Self {
        Self {
            store,
            l1: BoundedCache::new(l1_capacity),
            counters: Counters::default(),
        }
    }

    /// A cache backed by a fresh [`MemoryStore`].
    pub fn in_memory(l1_capacity: usize) -> Self {
        Self::new(Arc::new(MemoryStore::new()), l1_capacity)
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    // -----------------------------------------------------------------------
    // Reads and writes
    // -----------------------------------------------------------------------

    /// Read and decode a value. A value that no longer decodes as `T` is
    /// dropped and reported as a miss.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let raw = match self.l1.get(key) {
            Some(raw) => Some(raw),
            None => self.store.get(key).await?,
        };

        let Some(raw) = raw else {
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(value))
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "Discarding undecodable cache entry");
                self.l1.remove(key);
                self.store.delete(key).await?;
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    pub async fn set_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let raw = serde_json::to_string(value)?;
        self.store.set(key, raw.clone(), ttl).await?;
        self.l1.insert(key, raw, ttl);
        self.counters.sets.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        self.l1.remove(key);
        let existed = self.store.delete(key).await?;
        if existed {
            self.counters.deletes.fetch_add(1, Ordering::Relaxed);
        }
        Ok(existed)
    }

    /// Read-through: return the cached value for `key`, or run `compute`,
    /// cache its result for `ttl`, and return it.
    ///
    /// Cache failures never fail the read; they are logged and the value is
    /// computed directly. Errors from `compute` are returned and nothing is
    /// cached.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.get_or_compute_with_ttl(key, move || async move {
            compute().await.map(|value| (value, ttl))
        })
        .await
    }

    /// Read-through where `compute` also decides the entry's lifetime.
    pub async fn get_or_compute_with_ttl<T, E, F, Fut>(&self, key: &str, compute: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(T, Duration), E>>,
    {
        match self.get_json::<T>(key).await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(e) => tracing::warn!(key, error = %e, "Cache read failed, computing directly"),
        }

        let (value, ttl) = compute().await?;
        if let Err(e) = self.set_json(key, &value, ttl).await {
            tracing::warn!(key, error = %e, "Cache write failed");
        }
        Ok(value)
    }

    // -----------------------------------------------------------------------
    // Invalidation
    // -----------------------------------------------------------------------

    /// Delete every key under `prefix`, returning the number of store keys
    /// removed.
    pub async fn invalidate_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        self.l1.remove_prefix(prefix);
        let removed = self.store.delete_matching(prefix).await?;
        self.counters.deletes.fetch_add(removed, Ordering::Relaxed);
        tracing::debug!(prefix, removed, "Cache prefix invalidated");
        Ok(removed)
    }

    /// Apply the invalidation for a write-side event.
    pub async fn try_invalidate(&self, event: &InvalidationEvent) -> Result<u64, CacheError> {
        let mut removed = 0;
        for prefix in event.prefixes() {
            removed += self.invalidate_prefix(&prefix).await?;
        }
        Ok(removed)
    }

    /// Like [`Cache::try_invalidate`], but a failure is logged instead of
    /// returned. Used after writes that have already been committed.
    pub async fn invalidate(&self, event: &InvalidationEvent) {
        if let Err(e) = self.try_invalidate(event).await {
            tracing::warn!(?event, error = %e, "Cache invalidation failed");
        }
    }

    // -----------------------------------------------------------------------
    // Maintenance
    // -----------------------------------------------------------------------

    pub async fn clear_all(&self) -> Result<u64, CacheError> {
        self.l1.clear();
        let removed = self.store.clear_all().await?;
        self.counters.deletes.fetch_add(removed, Ordering::Relaxed);
        Ok(removed)
    }

    /// Drop expired entries from the L1 buffer and the store.
    pub async fn purge_expired(&self) -> Result<u64, CacheError> {
        let local = self.l1.purge_expired() as u64;
        let stored = self.store.purge_expired().await?;
        Ok(local.max(stored))
    }

    /// Clear every key and zero the counters.
    pub async fn reset(&self) -> Result<u64, CacheError> {
        let removed = self.clear_all().await?;
        self.counters.reset();
        Ok(removed)
    }

    pub async fn stats(&self) -> Result<CacheStats, CacheError> {
        let hits = self.counters.hits.load(Ordering::Relaxed);
        let misses = self.counters.misses.load(Ordering::Relaxed);
        let reads = hits + misses;
        Ok(CacheStats {
            backend: self.backend(),
            hits,
            misses,
            sets: self.counters.sets.load(Ordering::Relaxed),
            deletes: self.counters.deletes.load(Ordering::Relaxed),
            hit_rate: if reads == 0 {
                0.0
            } else {
                hits as f64 / reads as f64
            },
            keys: self.store.len().await?,
            l1_entries: self.l1.len(),
            l1_capacity: self.l1.capacity(),
        })
    }
}
