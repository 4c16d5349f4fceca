//! Cloudinary client: signed download URLs, signed uploads, and deletes.
//!
//! Request signatures are the hex SHA-256 of the alphabetically sorted
//! `key=value` parameters joined with `&`, followed by the API secret. The
//! `file`, `api_key`, `cloud_name`, and `resource_type` parameters are never
//! signed. The account must be configured for SHA-256 signatures.

use std::time::Duration;

use async_trait::async_trait;
use beatstore_core::delivery::MediaRef;
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::CloudError;
use crate::media::{MediaCdn, MediaUpload, UploadedMedia};

pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Media CDN configuration loaded from environment variables.
///
/// | Variable                | Required |
/// |-------------------------|----------|
/// | `CLOUDINARY_CLOUD_NAME` | yes      |
/// | `CLOUDINARY_API_KEY`    | yes      |
/// | `CLOUDINARY_API_SECRET` | yes      |
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub api_base: String,
}

impl CloudinaryConfig {
    pub fn from_env() -> Result<Self, CloudError> {
        let required = |name: &str| {
            std::env::var(name).map_err(|_| CloudError::Config(format!("{name} must be set")))
        };
        Ok(Self {
            cloud_name: required("CLOUDINARY_CLOUD_NAME")?,
            api_key: required("CLOUDINARY_API_KEY")?,
            api_secret: required("CLOUDINARY_API_SECRET")?,
            api_base: DEFAULT_API_BASE.to_string(),
        })
    }
}

/// Sign a parameter set. Empty values are skipped, as Cloudinary does.
pub fn sign_params(params: &[(&str, String)], api_secret: &str) -> String {
    let mut signed: Vec<&(&str, String)> = params
        .iter()
        .filter(|(key, value)| !value.is_empty() && !UNSIGNED_PARAMS.contains(key))
        .collect();
    signed.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = signed
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

const UNSIGNED_PARAMS: &[&str] = &["file", "api_key", "cloud_name", "resource_type"];

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

pub struct CloudinaryClient {
    config: CloudinaryConfig,
    http: reqwest::Client,
}

impl CloudinaryClient {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, resource_type: &str, action: &str) -> String {
        format!(
            "{}/{}/{resource_type}/{action}",
            self.config.api_base, self.config.cloud_name
        )
    }

    /// Build the private download URL for `media` as of `timestamp`.
    pub fn download_url_at(
        &self,
        media: &MediaRef,
        ttl: Duration,
        attachment: bool,
        timestamp: i64,
    ) -> Result<String, CloudError> {
        let expires_at = timestamp + ttl.as_secs() as i64;
        let mut params: Vec<(&str, String)> = vec![
            ("public_id", media.public_id.clone()),
            ("format", media.format.clone().unwrap_or_default()),
            ("type", media.delivery_type.clone()),
            ("attachment", attachment.to_string()),
            ("expires_at", expires_at.to_string()),
            ("timestamp", timestamp.to_string()),
        ];
        let signature = sign_params(&params, &self.config.api_secret);
        params.push(("signature", signature));
        params.push(("api_key", self.config.api_key.clone()));
        params.retain(|(_, value)| !value.is_empty());

        let url = Url::parse_with_params(
            &self.endpoint(&media.resource_type, "download"),
            &params,
        )
        .map_err(|e| CloudError::Config(format!("Invalid media CDN URL: {e}")))?;
        Ok(url.to_string())
    }
}

#[async_trait]
impl MediaCdn for CloudinaryClient {
    fn signed_download_url(
        &self,
        media: &MediaRef,
        ttl: Duration,
        attachment: bool,
    ) -> Result<String, CloudError> {
        self.download_url_at(media, ttl, attachment, chrono::Utc::now().timestamp())
    }

    async fn upload(&self, upload: MediaUpload) -> Result<UploadedMedia, CloudError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let params = [
            ("folder", upload.folder.clone()),
            ("timestamp", timestamp.clone()),
        ];
        let signature = sign_params(&params, &self.config.api_secret);

        let size = upload.data.len();
        let file = Part::bytes(upload.data)
            .file_name(upload.filename.clone())
            .mime_str(&upload.content_type)?;
        let form = Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", upload.folder.clone())
            .text("signature", signature)
            .part("file", file);

        let response = self
            .http
            .post(self.endpoint(&upload.resource_type, "upload"))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CloudError::Media(format!(
                "Upload of '{}' failed with {status}: {body}",
                upload.filename
            )));
        }

        let uploaded: UploadedMedia = response.json().await?;
        tracing::info!(
            public_id = %uploaded.public_id,
            resource_type = %uploaded.resource_type,
            size,
            "Uploaded media",
        );
        Ok(uploaded)
    }

    async fn destroy(&self, public_id: &str, resource_type: &str) -> Result<(), CloudError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let params = [
            ("public_id", public_id.to_string()),
            ("timestamp", timestamp.clone()),
        ];
        let signature = sign_params(&params, &self.config.api_secret);

        let response = self
            .http
            .post(self.endpoint(resource_type, "destroy"))
            .form(&[
                ("public_id", public_id),
                ("timestamp", timestamp.as_str()),
                ("api_key", self.config.api_key.as_str()),
                ("signature", signature.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: DestroyResponse = response.json().await?;
        match body.result.as_str() {
            "ok" | "not found" => {
                tracing::debug!(public_id, result = %body.result, "Destroyed media");
                Ok(())
            }
            other => Err(CloudError::Media(format!(
                "Destroy of '{public_id}' returned '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> CloudinaryClient {
        CloudinaryClient::new(CloudinaryConfig {
            cloud_name: "demo".into(),
            api_key: "key123".into(),
            api_secret: "secret".into(),
            api_base: DEFAULT_API_BASE.into(),
        })
    }

    #[test]
    fn signature_is_sorted_sha256_with_secret() {
        let params = [
            ("timestamp", "1315060510".to_string()),
            ("public_id", "sample".to_string()),
        ];
        assert_eq!(
            sign_params(&params, "abcd"),
            "0d4fe14b2b4a3f68a97ccc5097c43908b623d24293c296826a9390c14d891509"
        );
    }

    #[test]
    fn unsigned_and_empty_params_are_skipped() {
        let with_extras = [
            ("public_id", "sample".to_string()),
            ("timestamp", "1315060510".to_string()),
            ("api_key", "key123".to_string()),
            ("resource_type", "video".to_string()),
            ("format", String::new()),
        ];
        let plain = [
            ("public_id", "sample".to_string()),
            ("timestamp", "1315060510".to_string()),
        ];
        assert_eq!(sign_params(&with_extras, "abcd"), sign_params(&plain, "abcd"));
    }

    #[test]
    fn download_url_carries_expiry_and_signature() {
        let media = MediaRef {
            resource_type: "video".into(),
            delivery_type: "upload".into(),
            public_id: "beats/masters/night drive".into(),
            format: Some("wav".into()),
        };
        let url = client()
            .download_url_at(&media, Duration::from_secs(30), true, 1_700_000_000)
            .unwrap();

        let parsed = Url::parse(&url).unwrap();
        assert_eq!(parsed.path(), "/v1_1/demo/video/download");
        let query: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();
        assert_eq!(query["expires_at"], "1700000030");
        assert_eq!(query["public_id"], "beats/masters/night drive");
        assert_eq!(query["api_key"], "key123");
        assert_eq!(
            query["signature"],
            "1314015db99b83f72d497de6a583500c6db72df0ad999787457635dddd594271"
        );
    }

    #[test]
    fn download_url_omits_missing_format() {
        let media = MediaRef {
            resource_type: "raw".into(),
            delivery_type: "upload".into(),
            public_id: "beats/masters/take.wav".into(),
            format: None,
        };
        let url = client()
            .download_url_at(&media, Duration::from_secs(60), false, 1_700_000_000)
            .unwrap();
        assert!(!url.contains("format="));
        assert!(url.contains("attachment=false"));
    }
}
