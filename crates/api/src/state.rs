use std::sync::Arc;

use beatstore_cache::Cache;
use beatstore_cloud::{DeliveryResolver, MediaCdn, ObjectStorage};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind an `Arc` or is a pool handle.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: beatstore_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Read-path cache with write-side invalidation.
    pub cache: Arc<Cache>,
    /// Private object storage for masters and stems.
    pub storage: Arc<dyn ObjectStorage>,
    /// Media CDN for previews, artwork, and legacy masters.
    pub media: Arc<dyn MediaCdn>,
    pub delivery: DeliveryResolver,
}

impl AppState {
    pub fn new(
        pool: beatstore_db::DbPool,
        config: ServerConfig,
        cache: Cache,
        storage: Arc<dyn ObjectStorage>,
        media: Arc<dyn MediaCdn>,
    ) -> Self {
        let delivery = DeliveryResolver::new(Arc::clone(&storage), Arc::clone(&media));
        Self {
            pool,
            config: Arc::new(config),
            cache: Arc::new(cache),
            storage,
            media,
            delivery,
        }
    }
}
