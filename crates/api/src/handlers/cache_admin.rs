//! Admin cache management: stats, bulk actions, and raw key access.

use std::time::Duration;

use axum::extract::{Path, State};
use axum::Json;
use beatstore_cache::CacheStats;
use beatstore_core::cache_keys::{InvalidationEvent, NS_CONTENT, NS_LICENSES, NS_ORDERS};
use beatstore_core::content::PAGE_SLUGS;
use beatstore_core::error::CoreError;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::{beats, content};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Longest TTL accepted for a manually written key.
pub const MAX_MANUAL_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheAction {
    InvalidateBeats,
    InvalidateContent,
    InvalidateLicenses,
    InvalidateOrders,
    InvalidateAll,
    Warmup,
    Cleanup,
    Reset,
}

impl CacheAction {
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "invalidate_beats" => Ok(Self::InvalidateBeats),
            "invalidate_content" => Ok(Self::InvalidateContent),
            "invalidate_licenses" => Ok(Self::InvalidateLicenses),
            "invalidate_orders" => Ok(Self::InvalidateOrders),
            "invalidate_all" => Ok(Self::InvalidateAll),
            "warmup" => Ok(Self::Warmup),
            "cleanup" => Ok(Self::Cleanup),
            "reset" => Ok(Self::Reset),
            other => Err(CoreError::Validation(format!(
                "Unknown cache action '{other}'. Must be one of: invalidate_beats, \
                 invalidate_content, invalidate_licenses, invalidate_orders, \
                 invalidate_all, warmup, cleanup, reset"
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CacheActionRequest {
    pub action: String,
}

#[derive(Debug, Serialize)]
pub struct CacheActionResponse {
    pub action: String,
    /// Keys removed, or entries loaded for `warmup`.
    pub affected: u64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct PutKeyRequest {
    pub value: serde_json::Value,
    pub ttl_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct CacheKeyResponse {
    pub key: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct DeleteKeyResponse {
    pub key: String,
    pub deleted: bool,
}

/// Load the content pages, license descriptions, and the featured strip.
async fn warmup(state: &AppState) -> AppResult<u64> {
    let mut loaded = 0;
    for slug in PAGE_SLUGS {
        content::load_page(state, slug).await?;
        loaded += 1;
    }
    content::load_licenses(state).await?;
    beats::featured_beats(state).await?;
    Ok(loaded + 2)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/cache/stats
pub async fn stats(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<CacheStats>>> {
    let stats = state.cache.stats().await?;
    Ok(Json(DataResponse { data: stats }))
}

/// POST /api/v1/admin/cache/actions
pub async fn run_action(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CacheActionRequest>,
) -> AppResult<Json<DataResponse<CacheActionResponse>>> {
    let action = CacheAction::from_name(&input.action)?;
    let cache = &state.cache;

    let (affected, message) = match action {
        CacheAction::InvalidateBeats => {
            let n = cache.try_invalidate(&InvalidationEvent::BeatChanged).await?;
            (n, format!("Removed {n} catalog entries"))
        }
        CacheAction::InvalidateContent => {
            let n = cache.invalidate_prefix(NS_CONTENT).await?;
            (n, format!("Removed {n} content entries"))
        }
        CacheAction::InvalidateLicenses => {
            let n = cache.invalidate_prefix(NS_LICENSES).await?;
            (n, format!("Removed {n} license entries"))
        }
        CacheAction::InvalidateOrders => {
            let n = cache.invalidate_prefix(NS_ORDERS).await?;
            (n, format!("Removed {n} order entries"))
        }
        CacheAction::InvalidateAll => {
            let n = cache.clear_all().await?;
            (n, format!("Removed {n} entries"))
        }
        CacheAction::Warmup => {
            let n = warmup(&state).await?;
            (n, format!("Loaded {n} entries"))
        }
        CacheAction::Cleanup => {
            let n = cache.purge_expired().await?;
            (n, format!("Purged {n} expired entries"))
        }
        CacheAction::Reset => {
            let n = cache.reset().await?;
            (n, format!("Cleared {n} entries and reset counters"))
        }
    };

    tracing::info!(action = %input.action, affected, user_id = admin.user_id, "Cache action run");

    Ok(Json(DataResponse {
        data: CacheActionResponse {
            action: input.action,
            affected,
            message,
        },
    }))
}

/// GET /api/v1/admin/cache/keys/{key}
pub async fn get_key(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<DataResponse<CacheKeyResponse>>> {
    let value = state
        .cache
        .get_json::<serde_json::Value>(&key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Cache key '{key}' not found")))?;
    Ok(Json(DataResponse {
        data: CacheKeyResponse { key, value },
    }))
}

/// PUT /api/v1/admin/cache/keys/{key}
pub async fn put_key(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(input): Json<PutKeyRequest>,
) -> AppResult<Json<DataResponse<CacheKeyResponse>>> {
    let ttl = Duration::from_secs(input.ttl_secs);
    if ttl.is_zero() || ttl > MAX_MANUAL_TTL {
        return Err(AppError::Core(CoreError::Validation(format!(
            "ttl_secs must be between 1 and {}",
            MAX_MANUAL_TTL.as_secs()
        ))));
    }

    state.cache.set_json(&key, &input.value, ttl).await?;
    tracing::info!(key = %key, ttl_secs = input.ttl_secs, user_id = admin.user_id, "Cache key written");

    Ok(Json(DataResponse {
        data: CacheKeyResponse {
            key,
            value: input.value,
        },
    }))
}

/// DELETE /api/v1/admin/cache/keys/{key}
pub async fn delete_key(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<DataResponse<DeleteKeyResponse>>> {
    let deleted = state.cache.delete(&key).await?;
    Ok(Json(DataResponse {
        data: DeleteKeyResponse { key, deleted },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_documented_action_parses() {
        for name in [
            "invalidate_beats",
            "invalidate_content",
            "invalidate_licenses",
            "invalidate_orders",
            "invalidate_all",
            "warmup",
            "cleanup",
            "reset",
        ] {
            assert!(CacheAction::from_name(name).is_ok(), "{name} should parse");
        }
        assert!(CacheAction::from_name("flush").is_err());
    }
}
