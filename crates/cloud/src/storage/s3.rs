//! S3 (or S3-compatible) object storage via the AWS SDK.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use crate::error::CloudError;
use crate::storage::ObjectStorage;

/// Object storage configuration loaded from environment variables.
///
/// | Variable               | Required | Default     |
/// |------------------------|----------|-------------|
/// | `S3_BUCKET`            | yes      | --          |
/// | `S3_REGION`            | no       | `us-east-1` |
/// | `S3_ENDPOINT`          | no       | AWS         |
/// | `S3_ACCESS_KEY_ID`     | no       | AWS chain   |
/// | `S3_SECRET_ACCESS_KEY` | no       | AWS chain   |
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible services; enables path-style URLs.
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl S3Config {
    pub fn from_env() -> Result<Self, CloudError> {
        let bucket = std::env::var("S3_BUCKET")
            .map_err(|_| CloudError::Config("S3_BUCKET must be set".into()))?;
        let region = std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".into());
        let non_empty = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        Ok(Self {
            bucket,
            region,
            endpoint: non_empty("S3_ENDPOINT"),
            access_key_id: non_empty("S3_ACCESS_KEY_ID"),
            secret_access_key: non_empty("S3_SECRET_ACCESS_KEY"),
        })
    }
}

pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    pub async fn new(config: &S3Config) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let (Some(access_key), Some(secret_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            let credentials =
                Credentials::new(access_key, secret_key, None, None, "beatstore-env");
            loader = loader.credentials_provider(credentials);
        }

        let shared = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        tracing::info!(
            bucket = %config.bucket,
            region = %config.region,
            custom_endpoint = config.endpoint.is_some(),
            "S3 storage configured",
        );

        Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
        }
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<(), CloudError> {
        let size = data.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                CloudError::Storage(format!("Failed to upload '{key}': {}", DisplayErrorContext(&e)))
            })?;
        tracing::debug!(key, size, "Uploaded object");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CloudError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                CloudError::Storage(format!("Failed to delete '{key}': {}", DisplayErrorContext(&e)))
            })?;
        tracing::debug!(key, "Deleted object");
        Ok(())
    }

    async fn presign_get(
        &self,
        key: &str,
        ttl: Duration,
        content_disposition: &str,
        content_type: &str,
    ) -> Result<String, CloudError> {
        let presigning = PresigningConfig::expires_in(ttl)
            .map_err(|e| CloudError::Storage(format!("Invalid presign expiry: {e}")))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .response_content_disposition(content_disposition)
            .response_content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| {
                CloudError::Storage(format!("Failed to presign '{key}': {}", DisplayErrorContext(&e)))
            })?;

        tracing::debug!(key, expires_in_secs = ttl.as_secs(), "Presigned object download");
        Ok(request.uri().to_string())
    }
}
