//! Scheduled jobs triggered by an external scheduler.

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::Json;
use beatstore_core::cache_keys::InvalidationEvent;
use beatstore_core::cron::verify_bearer_secret;
use beatstore_db::repositories::BeatRepo;
use chrono::Utc;
use serde::Serialize;

use crate::error::AppResult;
use crate::state::AppState;

/// Body returned to the scheduler.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationResponse {
    pub success: bool,
    pub activated_count: u64,
    pub message: String,
}

/// GET /api/v1/cron/activate-scheduled
///
/// Activate every inactive beat whose scheduled release has passed.
/// Rejected with 401 before touching the database unless the bearer
/// secret matches `CRON_SECRET`.
pub async fn activate_scheduled(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<ActivationResponse>> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if let Err(e) = verify_bearer_secret(authorization, state.config.cron_secret.as_deref()) {
        tracing::warn!(error = %e, "Rejected scheduled activation call");
        return Err(e.into());
    }

    let now = Utc::now();
    let activated = BeatRepo::activate_scheduled(&state.pool, now).await?;

    if activated > 0 {
        state.cache.invalidate(&InvalidationEvent::BeatChanged).await;
    }

    tracing::info!(activated, at = %now, "Scheduled release activation ran");

    Ok(Json(ActivationResponse {
        success: true,
        activated_count: activated,
        message: format!("Activated {activated} scheduled beat(s)"),
    }))
}
