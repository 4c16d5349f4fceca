//! Private object storage.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::CloudError;

pub mod s3;

pub use s3::{S3Config, S3Storage};

/// Bucket-style storage for paid assets. Objects are never public; reads go
/// through presigned URLs.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<(), CloudError>;

    async fn delete(&self, key: &str) -> Result<(), CloudError>;

    /// Presign a GET for `key` valid for `ttl`. The response served from the
    /// URL carries the given `Content-Disposition` and `Content-Type`.
    async fn presign_get(
        &self,
        key: &str,
        ttl: Duration,
        content_disposition: &str,
        content_type: &str,
    ) -> Result<String, CloudError>;
}
