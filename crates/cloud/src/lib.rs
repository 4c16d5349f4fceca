//! Remote asset backends and the download resolver.
//!
//! - [`storage`] -- private object storage (S3) holding masters and stems.
//! - [`media`] -- media CDN (Cloudinary) holding previews, artwork, and
//!   masters uploaded before object storage existed.
//! - [`delivery`] -- turns a download request into a short-lived URL.

pub mod delivery;
pub mod error;
pub mod media;
pub mod storage;

pub use delivery::{Access, DeliveryResolver, DeliverySource, ResolvedDownload};
pub use error::CloudError;
pub use media::{MediaCdn, MediaUpload, UploadedMedia};
pub use storage::ObjectStorage;
