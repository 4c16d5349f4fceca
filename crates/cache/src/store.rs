//! Backend-agnostic cache store interface.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::CacheError;

/// A key-value store with per-entry TTLs and prefix deletion.
///
/// Values are opaque strings; the [`Cache`](crate::Cache) facade handles
/// JSON encoding. A read after an entry's TTL has elapsed is a miss.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Short backend name reported by cache statistics.
    fn backend(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Returns `true` if the key existed.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;

    /// Delete every key starting with `prefix`, returning the number removed.
    async fn delete_matching(&self, prefix: &str) -> Result<u64, CacheError>;

    /// Delete every key owned by this store.
    async fn clear_all(&self) -> Result<u64, CacheError>;

    /// Drop entries whose TTL has elapsed. Backends that expire natively
    /// return zero.
    async fn purge_expired(&self) -> Result<u64, CacheError>;

    /// Number of live keys.
    async fn len(&self) -> Result<u64, CacheError>;
}
