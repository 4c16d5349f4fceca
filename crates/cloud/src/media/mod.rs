//! Media CDN for previews, artwork, and legacy masters.

use std::time::Duration;

use async_trait::async_trait;
use beatstore_core::delivery::MediaRef;
use serde::{Deserialize, Serialize};

use crate::error::CloudError;

pub mod cloudinary;

pub use cloudinary::{CloudinaryClient, CloudinaryConfig};

/// Resource type under which audio is stored on the CDN.
pub const AUDIO_RESOURCE_TYPE: &str = "video";
pub const IMAGE_RESOURCE_TYPE: &str = "image";

/// A file to push to the CDN.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub folder: String,
    pub filename: String,
    /// `image`, `video`, or `raw`.
    pub resource_type: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// What the CDN reports after an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedMedia {
    pub public_id: String,
    pub resource_type: String,
    pub secure_url: String,
    #[serde(default)]
    pub format: Option<String>,
}

#[async_trait]
pub trait MediaCdn: Send + Sync {
    /// Sign a time-limited download URL for `media`. With `attachment` the
    /// CDN serves the file as a download rather than inline.
    fn signed_download_url(
        &self,
        media: &MediaRef,
        ttl: Duration,
        attachment: bool,
    ) -> Result<String, CloudError>;

    async fn upload(&self, upload: MediaUpload) -> Result<UploadedMedia, CloudError>;

    async fn destroy(&self, public_id: &str, resource_type: &str) -> Result<(), CloudError>;
}
