//! Download resolution: picks the backend for an asset, signs a short-lived
//! URL, and builds the download headers.
//!
//! - Previews are signed on the media CDN.
//! - Masters are presigned on object storage, falling back to the media CDN
//!   copy referenced by `master_legacy_url` when object storage fails.
//! - Stems are presigned on object storage only, and customers need a tier
//!   that includes them.

use std::sync::Arc;
use std::time::Duration;

use beatstore_core::delivery::{
    extension_of, parse_media_url, AssetType, DownloadName, MediaRef, DOWNLOAD_URL_TTL,
    PREVIEW_URL_TTL,
};
use beatstore_core::error::CoreError;
use beatstore_core::license::{ensure_stems_allowed, LicenseTier};
use beatstore_db::models::beat::Beat;
use serde::Serialize;

use crate::error::CloudError;
use crate::media::{MediaCdn, AUDIO_RESOURCE_TYPE};
use crate::storage::ObjectStorage;

/// Who is asking for the file. Purchase verification happens before the
/// resolver is called; a `Customer` has already proven their order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Anonymous visitor; previews only.
    Public,
    Customer { tier: LicenseTier },
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliverySource {
    ObjectStorage,
    MediaCdn,
}

/// A signed link together with the headers to send alongside the redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDownload {
    pub url: String,
    pub expires_in: Duration,
    pub source: DeliverySource,
    pub content_type: String,
    pub content_disposition: String,
    pub filename: String,
}

impl ResolvedDownload {
    fn new(url: String, ttl: Duration, source: DeliverySource, name: &DownloadName) -> Self {
        Self {
            url,
            expires_in: ttl,
            source,
            content_type: name.content_type().to_string(),
            content_disposition: name.content_disposition(),
            filename: name.filename.clone(),
        }
    }
}

#[derive(Clone)]
pub struct DeliveryResolver {
    storage: Arc<dyn ObjectStorage>,
    media: Arc<dyn MediaCdn>,
}

impl DeliveryResolver {
    pub fn new(storage: Arc<dyn ObjectStorage>, media: Arc<dyn MediaCdn>) -> Self {
        Self { storage, media }
    }

    pub async fn resolve(
        &self,
        beat: &Beat,
        asset: AssetType,
        access: Access,
    ) -> Result<ResolvedDownload, CloudError> {
        if asset.is_paid() && access == Access::Public {
            return Err(CoreError::Unauthorized(format!(
                "A purchase is required to download the {}",
                asset.name()
            ))
            .into());
        }

        match asset {
            AssetType::Preview => self.preview(beat),
            AssetType::Master => self.master(beat).await,
            AssetType::Stems => self.stems(beat, access).await,
        }
    }

    fn preview(&self, beat: &Beat) -> Result<ResolvedDownload, CloudError> {
        let public_id = beat.preview_public_id.as_deref().ok_or(CoreError::NotFound {
            entity: "preview",
            id: beat.id,
        })?;

        let name = DownloadName::new(&beat.title, AssetType::Preview, None);
        let media = MediaRef {
            resource_type: AUDIO_RESOURCE_TYPE.to_string(),
            delivery_type: "upload".to_string(),
            public_id: public_id.to_string(),
            format: Some(name.extension.clone()),
        };
        let url = self.media.signed_download_url(&media, PREVIEW_URL_TTL, false)?;
        Ok(ResolvedDownload::new(url, PREVIEW_URL_TTL, DeliverySource::MediaCdn, &name))
    }

    async fn master(&self, beat: &Beat) -> Result<ResolvedDownload, CloudError> {
        if let Some(key) = beat.master_key.as_deref() {
            let name = DownloadName::new(&beat.title, AssetType::Master, extension_of(key));
            match self.presign(key, &name).await {
                Ok(url) => {
                    return Ok(ResolvedDownload::new(
                        url,
                        DOWNLOAD_URL_TTL,
                        DeliverySource::ObjectStorage,
                        &name,
                    ))
                }
                Err(e) if beat.master_legacy_url.is_some() => {
                    tracing::warn!(
                        beat_id = beat.id,
                        key,
                        error = %e,
                        "Object storage presign failed, falling back to media CDN"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        let legacy_url = beat.master_legacy_url.as_deref().ok_or(CoreError::NotFound {
            entity: "master file",
            id: beat.id,
        })?;
        let media = parse_media_url(legacy_url)
            .map_err(|e| CloudError::Media(format!("Beat {} has an unusable master URL: {e}", beat.id)))?;

        let name = DownloadName::new(&beat.title, AssetType::Master, media.format.as_deref());
        let url = self.media.signed_download_url(&media, DOWNLOAD_URL_TTL, true)?;
        Ok(ResolvedDownload::new(url, DOWNLOAD_URL_TTL, DeliverySource::MediaCdn, &name))
    }

    async fn stems(&self, beat: &Beat, access: Access) -> Result<ResolvedDownload, CloudError> {
        if let Access::Customer { tier } = access {
            ensure_stems_allowed(tier)?;
        }

        let key = beat.stems_key.as_deref().ok_or(CoreError::NotFound {
            entity: "stems archive",
            id: beat.id,
        })?;
        let name = DownloadName::new(&beat.title, AssetType::Stems, extension_of(key));
        let url = self.presign(key, &name).await?;
        Ok(ResolvedDownload::new(url, DOWNLOAD_URL_TTL, DeliverySource::ObjectStorage, &name))
    }

    async fn presign(&self, key: &str, name: &DownloadName) -> Result<String, CloudError> {
        self.storage
            .presign_get(
                key,
                DOWNLOAD_URL_TTL,
                &name.content_disposition(),
                name.content_type(),
            )
            .await
    }
}
