//! Beat entity model and DTOs.

use beatstore_core::license::LicenseTier;
use beatstore_core::types::{Cents, DbId, Timestamp};
use beatstore_core::visibility::{is_publicly_visible, ReleaseState};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `beats` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Beat {
    pub id: DbId,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub bpm: Option<i32>,
    pub musical_key: Option<String>,
    pub tags: Vec<String>,
    pub price_basic_cents: Cents,
    pub price_trackout_cents: Cents,
    pub price_unlimited_cents: Cents,
    /// Media-CDN public id of the streaming preview.
    pub preview_public_id: Option<String>,
    pub artwork_url: Option<String>,
    /// Object-storage key of the master file.
    pub master_key: Option<String>,
    /// Media-CDN delivery URL of the master, from before object storage.
    pub master_legacy_url: Option<String>,
    /// Object-storage key of the stems archive.
    pub stems_key: Option<String>,
    pub is_active: bool,
    pub featured: bool,
    pub scheduled_release_at: Option<Timestamp>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Beat {
    pub fn is_visible_at(&self, now: Timestamp) -> bool {
        is_publicly_visible(self.is_active, self.scheduled_release_at, now)
    }

    pub fn release_state(&self, now: Timestamp) -> ReleaseState {
        ReleaseState::classify(self.is_active, self.scheduled_release_at, now)
    }

    pub fn price_for(&self, tier: LicenseTier) -> Cents {
        tier.price_of(
            self.price_basic_cents,
            self.price_trackout_cents,
            self.price_unlimited_cents,
        )
    }
}

/// Storefront view of a beat. Storage keys and legacy URLs are withheld.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicBeat {
    pub id: DbId,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub bpm: Option<i32>,
    pub musical_key: Option<String>,
    pub tags: Vec<String>,
    pub price_basic_cents: Cents,
    pub price_trackout_cents: Cents,
    pub price_unlimited_cents: Cents,
    pub artwork_url: Option<String>,
    pub has_preview: bool,
    pub has_stems: bool,
    pub featured: bool,
    pub created_at: Timestamp,
}

impl From<&Beat> for PublicBeat {
    fn from(beat: &Beat) -> Self {
        Self {
            id: beat.id,
            title: beat.title.clone(),
            slug: beat.slug.clone(),
            description: beat.description.clone(),
            genre: beat.genre.clone(),
            bpm: beat.bpm,
            musical_key: beat.musical_key.clone(),
            tags: beat.tags.clone(),
            price_basic_cents: beat.price_basic_cents,
            price_trackout_cents: beat.price_trackout_cents,
            price_unlimited_cents: beat.price_unlimited_cents,
            artwork_url: beat.artwork_url.clone(),
            has_preview: beat.preview_public_id.is_some(),
            has_stems: beat.stems_key.is_some(),
            featured: beat.featured,
            created_at: beat.created_at,
        }
    }
}

/// One page of catalog results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeatPage {
    pub items: Vec<PublicBeat>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Admin view: the full row plus its release diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct AdminBeat {
    #[serde(flatten)]
    pub beat: Beat,
    pub release_state: ReleaseState,
    pub visible_now: bool,
}

impl AdminBeat {
    pub fn at(beat: Beat, now: Timestamp) -> Self {
        Self {
            release_state: beat.release_state(now),
            visible_now: beat.is_visible_at(now),
            beat,
        }
    }
}

/// DTO for creating a new beat.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBeat {
    pub title: String,
    /// Derived from the title when blank.
    #[serde(default)]
    pub slug: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub bpm: Option<i32>,
    pub musical_key: Option<String>,
    pub tags: Option<Vec<String>>,
    pub price_basic_cents: Cents,
    pub price_trackout_cents: Cents,
    pub price_unlimited_cents: Cents,
    pub preview_public_id: Option<String>,
    pub artwork_url: Option<String>,
    pub master_key: Option<String>,
    pub master_legacy_url: Option<String>,
    pub stems_key: Option<String>,
    pub is_active: Option<bool>,
    pub featured: Option<bool>,
    pub scheduled_release_at: Option<Timestamp>,
    /// Set from the authenticated admin, never from the request body.
    #[serde(skip_deserializing)]
    pub created_by: Option<DbId>,
}

/// DTO for updating an existing beat. All fields optional.
///
/// Set `clear_schedule` to remove `scheduled_release_at`; a `None`
/// `scheduled_release_at` alone leaves it unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBeat {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub bpm: Option<i32>,
    pub musical_key: Option<String>,
    pub tags: Option<Vec<String>>,
    pub price_basic_cents: Option<Cents>,
    pub price_trackout_cents: Option<Cents>,
    pub price_unlimited_cents: Option<Cents>,
    pub preview_public_id: Option<String>,
    pub artwork_url: Option<String>,
    pub master_key: Option<String>,
    pub master_legacy_url: Option<String>,
    pub stems_key: Option<String>,
    pub is_active: Option<bool>,
    pub featured: Option<bool>,
    pub scheduled_release_at: Option<Timestamp>,
    #[serde(default)]
    pub clear_schedule: bool,
}
