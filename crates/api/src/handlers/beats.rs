//! Public catalog handlers.
//!
//! Every read is served through the cache; misses fall through to the
//! visibility-filtered repository queries.

use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::Json;
use beatstore_core::cache_keys::{self, TTL_BEAT_DETAIL, TTL_BEAT_LIST};
use beatstore_core::catalog::CatalogParams;
use beatstore_core::error::CoreError;
use beatstore_core::types::{DbId, Timestamp};
use beatstore_core::visibility;
use beatstore_db::models::beat::{BeatPage, PublicBeat};
use beatstore_db::repositories::BeatRepo;
use chrono::Utc;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Number of beats in the featured strip.
pub const FEATURED_LIMIT: i64 = 12;

// ---------------------------------------------------------------------------
// Shared loaders (also used by cache warmup)
// ---------------------------------------------------------------------------

/// Listing TTL, cut short by the next scheduled release of an active beat.
async fn listing_ttl(pool: &PgPool, now: Timestamp) -> AppResult<Duration> {
    let next = BeatRepo::next_scheduled_release(pool, now).await?;
    Ok(visibility::listing_ttl(TTL_BEAT_LIST, next, now))
}

pub(crate) async fn featured_beats(state: &AppState) -> AppResult<Vec<PublicBeat>> {
    let pool = &state.pool;
    state
        .cache
        .get_or_compute_with_ttl(&cache_keys::beats_featured(), move || async move {
            let now = Utc::now();
            let beats = BeatRepo::list_featured(pool, now, FEATURED_LIMIT).await?;
            let ttl = listing_ttl(pool, now).await?;
            Ok::<_, AppError>((beats.iter().map(PublicBeat::from).collect::<Vec<_>>(), ttl))
        })
        .await
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/beats
///
/// Visible beats matching the query, one page at a time.
pub async fn list_beats(
    State(state): State<AppState>,
    Query(params): Query<CatalogParams>,
) -> AppResult<Json<DataResponse<BeatPage>>> {
    let filter = params.into_filter()?;
    let key = cache_keys::beat_list(&filter.cache_key());

    let pool = &state.pool;
    let filter_ref = &filter;
    let page = state
        .cache
        .get_or_compute_with_ttl(&key, move || async move {
            let now = Utc::now();
            let (beats, total) = BeatRepo::list_visible(pool, filter_ref, now).await?;
            let page = BeatPage {
                items: beats.iter().map(PublicBeat::from).collect(),
                total,
                limit: filter_ref.limit,
                offset: filter_ref.offset,
            };
            Ok::<_, AppError>((page, listing_ttl(pool, now).await?))
        })
        .await?;

    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/beats/featured
pub async fn list_featured(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<PublicBeat>>>> {
    let beats = featured_beats(&state).await?;
    Ok(Json(DataResponse { data: beats }))
}

/// GET /api/v1/beats/{id}
///
/// Hidden beats are indistinguishable from missing ones. Misses are not
/// cached, so a beat appears as soon as it is released.
pub async fn get_beat(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PublicBeat>>> {
    let pool = &state.pool;
    let beat = state
        .cache
        .get_or_compute(&cache_keys::beat_detail(id), TTL_BEAT_DETAIL, move || async move {
            let beat = BeatRepo::find_visible(pool, id, Utc::now())
                .await?
                .ok_or(AppError::Core(CoreError::NotFound { entity: "Beat", id }))?;
            Ok::<_, AppError>(PublicBeat::from(&beat))
        })
        .await?;

    Ok(Json(DataResponse { data: beat }))
}
