//! TTL cache for the beat store's read paths.
//!
//! - [`store`] -- the [`CacheStore`] trait implemented by each backend.
//! - [`memory`] -- in-process store, the default.
//! - [`redis_store`] -- shared store backed by Redis.
//! - [`l1`] -- small bounded buffer kept in front of the store.
//! - [`cache`] -- the [`Cache`] facade used by request handlers.

pub mod cache;
pub mod config;
pub mod error;
pub mod l1;
pub mod memory;
pub mod redis_store;
pub mod store;

pub use cache::{Cache, CacheStats};
pub use config::CacheConfig;
pub use error::CacheError;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use store::CacheStore;
