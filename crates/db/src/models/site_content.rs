//! Editable site content (FAQ, legal pages, license descriptions).

use beatstore_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `site_content` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct SiteContent {
    pub slug: String,
    pub title: String,
    pub body: String,
    pub updated_at: Timestamp,
}

/// DTO for creating or replacing a content page.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertSiteContent {
    pub title: String,
    pub body: String,
}
