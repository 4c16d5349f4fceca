//! File delivery: turns a download request into a redirect to a
//! short-lived signed URL.
//!
//! Three access modes:
//! - anonymous, previews only, for visible beats;
//! - customer, proving a purchase with `order_id` + `email`;
//! - admin, with `admin=true` and an admin bearer token.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use beatstore_cloud::{Access, ResolvedDownload};
use beatstore_core::delivery::AssetType;
use beatstore_core::error::CoreError;
use beatstore_core::types::DbId;
use beatstore_db::models::beat::Beat;
use beatstore_db::repositories::{BeatRepo, OrderRepo};
use chrono::Utc;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::authenticate;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub asset: String,
    pub order_id: Option<DbId>,
    pub email: Option<String>,
    #[serde(default)]
    pub admin: bool,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn ensure_beat_exists(pool: &sqlx::PgPool, id: DbId) -> AppResult<Beat> {
    BeatRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Beat", id }))
}

/// Check the purchase and return the beat with the tier it was bought at.
///
/// A missing order, an email mismatch, and an order without this beat are
/// all reported as the same 404. An unsettled order is a 403.
async fn verify_purchase(
    state: &AppState,
    beat_id: DbId,
    order_id: DbId,
    email: &str,
) -> AppResult<(Beat, Access)> {
    let purchase = OrderRepo::find_purchase(&state.pool, order_id, email, beat_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No purchase of beat {beat_id} found on order {order_id} for this email"
            ))
        })?;

    let status = purchase.status()?;
    if !status.grants_downloads() {
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "Order {order_id} is {status}; files are available once payment completes"
        ))));
    }

    let tier = purchase.tier()?;
    let beat = ensure_beat_exists(&state.pool, beat_id).await?;
    Ok((beat, Access::Customer { tier }))
}

fn redirect(resolved: &ResolvedDownload) -> Response {
    let cache_control = format!("private, max-age={}", resolved.expires_in.as_secs());
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, resolved.url.clone()),
            (header::CONTENT_DISPOSITION, resolved.content_disposition.clone()),
            (header::CONTENT_TYPE, resolved.content_type.clone()),
            (header::CACHE_CONTROL, cache_control),
        ],
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// GET /downloads/{beat_id}
// ---------------------------------------------------------------------------

/// GET /api/v1/downloads/{beat_id}?asset=&order_id=&email=
pub async fn download(
    State(state): State<AppState>,
    Path(beat_id): Path<DbId>,
    Query(params): Query<DownloadQuery>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let asset = AssetType::from_name(&params.asset)?;

    let (beat, access) = if params.admin {
        let user = authenticate(&headers, &state.config.jwt)?;
        if !user.is_admin() {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin role required".into(),
            )));
        }
        (ensure_beat_exists(&state.pool, beat_id).await?, Access::Admin)
    } else if !asset.is_paid() {
        let beat = BeatRepo::find_visible(&state.pool, beat_id, Utc::now())
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "Beat",
                id: beat_id,
            }))?;
        (beat, Access::Public)
    } else {
        let (order_id, email) = match (params.order_id, params.email.as_deref()) {
            (Some(order_id), Some(email)) if !email.trim().is_empty() => (order_id, email),
            _ => {
                return Err(AppError::BadRequest(
                    "order_id and email are required to download purchased files".into(),
                ))
            }
        };
        verify_purchase(&state, beat_id, order_id, email).await?
    };

    let resolved = state.delivery.resolve(&beat, asset, access).await?;

    tracing::info!(
        beat_id,
        asset = asset.name(),
        source = ?resolved.source,
        admin = params.admin,
        "Download link issued"
    );

    Ok(redirect(&resolved))
}
