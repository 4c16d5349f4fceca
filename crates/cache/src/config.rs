use std::sync::Arc;

use crate::cache::Cache;
use crate::error::CacheError;
use crate::memory::MemoryStore;
use crate::redis_store::RedisStore;
use crate::store::CacheStore;

/// Default namespace prepended to every Redis key.
pub const DEFAULT_KEY_PREFIX: &str = "beatstore";

/// Default number of entries held in the in-process L1 buffer.
pub const DEFAULT_L1_CAPACITY: usize = 64;

/// Cache backend configuration loaded from environment variables.
///
/// | Variable            | Default     |
/// |---------------------|-------------|
/// | `REDIS_URL`         | (memory)    |
/// | `CACHE_KEY_PREFIX`  | `beatstore` |
/// | `CACHE_L1_CAPACITY` | `64`        |
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// When absent the in-memory store is used.
    pub redis_url: Option<String>,
    pub key_prefix: String,
    pub l1_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            l1_capacity: DEFAULT_L1_CAPACITY,
        }
    }
}

impl CacheConfig {
    pub fn from_env() -> Self {
        let redis_url = std::env::var("REDIS_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let key_prefix =
            std::env::var("CACHE_KEY_PREFIX").unwrap_or_else(|_| DEFAULT_KEY_PREFIX.into());

        let l1_capacity: usize = std::env::var("CACHE_L1_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_L1_CAPACITY);

        Self {
            redis_url,
            key_prefix,
            l1_capacity,
        }
    }

    /// Build the configured store and wrap it in a [`Cache`].
    pub async fn connect(&self) -> Result<Cache, CacheError> {
        let store: Arc<dyn CacheStore> = match &self.redis_url {
            Some(url) => Arc::new(RedisStore::connect(url, &self.key_prefix).await?),
            None => Arc::new(MemoryStore::new()),
        };
        tracing::info!(backend = store.backend(), l1_capacity = self.l1_capacity, "Cache ready");
        Ok(Cache::new(store, self.l1_capacity))
    }
}
