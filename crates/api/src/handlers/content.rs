//! Content pages and license descriptions.

use axum::extract::{Path, State};
use axum::Json;
use beatstore_core::cache_keys::{self, InvalidationEvent, TTL_CONTENT, TTL_LICENSES};
use beatstore_core::content::{self, is_page_slug, validate_slug};
use beatstore_core::error::CoreError;
use beatstore_core::license::LicenseTier;
use beatstore_core::types::Timestamp;
use beatstore_db::models::site_content::{SiteContent, UpsertSiteContent};
use beatstore_db::repositories::SiteContentRepo;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// A content page. Pages that were never written have an empty body and no
/// `updated_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentPage {
    pub slug: String,
    pub title: String,
    pub body: String,
    pub updated_at: Option<Timestamp>,
}

impl From<SiteContent> for ContentPage {
    fn from(row: SiteContent) -> Self {
        Self {
            slug: row.slug,
            title: row.title,
            body: row.body,
            updated_at: Some(row.updated_at),
        }
    }
}

/// One license tier as shown on the pricing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseInfo {
    pub tier: LicenseTier,
    pub name: String,
    /// Beat field holding this tier's price.
    pub price_field: String,
    pub includes_master: bool,
    pub includes_stems: bool,
    pub description: String,
}

// ---------------------------------------------------------------------------
// Shared loaders (also used by cache warmup)
// ---------------------------------------------------------------------------

pub(crate) async fn load_page(state: &AppState, slug: &str) -> AppResult<ContentPage> {
    let pool = &state.pool;
    state
        .cache
        .get_or_compute(&cache_keys::content_page(slug), TTL_CONTENT, move || async move {
            let page = match SiteContentRepo::find(pool, slug).await? {
                Some(row) => ContentPage::from(row),
                None => ContentPage {
                    slug: slug.to_string(),
                    title: content::default_title(slug).to_string(),
                    body: String::new(),
                    updated_at: None,
                },
            };
            Ok::<_, AppError>(page)
        })
        .await
}

pub(crate) async fn load_licenses(state: &AppState) -> AppResult<Vec<LicenseInfo>> {
    let pool = &state.pool;
    state
        .cache
        .get_or_compute(&cache_keys::licenses_all(), TTL_LICENSES, move || async move {
            let slugs: Vec<&str> = LicenseTier::ALL.iter().map(|t| t.content_slug()).collect();
            let rows = SiteContentRepo::find_many(pool, &slugs).await?;
            Ok::<_, AppError>(license_infos(&rows))
        })
        .await
}

/// Combine the built-in tier rules with any edited descriptions.
fn license_infos(rows: &[SiteContent]) -> Vec<LicenseInfo> {
    LicenseTier::ALL
        .iter()
        .map(|&tier| {
            let description = rows
                .iter()
                .find(|r| r.slug == tier.content_slug())
                .map(|r| r.body.clone())
                .filter(|b| !b.trim().is_empty())
                .unwrap_or_else(|| tier.default_description().to_string());
            LicenseInfo {
                tier,
                name: tier.label().to_string(),
                price_field: format!("price_{}_cents", tier.name()),
                includes_master: true,
                includes_stems: tier.includes_stems(),
                description,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Public handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/content/{slug}
pub async fn get_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<DataResponse<ContentPage>>> {
    if !is_page_slug(&slug) {
        return Err(AppError::NotFound(format!("Content page '{slug}' not found")));
    }
    let page = load_page(&state, &slug).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/licenses
pub async fn list_licenses(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<LicenseInfo>>>> {
    let licenses = load_licenses(&state).await?;
    Ok(Json(DataResponse { data: licenses }))
}

// ---------------------------------------------------------------------------
// Admin handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/content
///
/// Every stored page and license description, uncached.
pub async fn list_all(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<SiteContent>>>> {
    let mut slugs: Vec<&str> = content::PAGE_SLUGS.to_vec();
    slugs.extend(LicenseTier::ALL.iter().map(|t| t.content_slug()));
    let rows = SiteContentRepo::find_many(&state.pool, &slugs).await?;
    Ok(Json(DataResponse { data: rows }))
}

/// PUT /api/v1/admin/content/{slug}
pub async fn upsert_page(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(input): Json<UpsertSiteContent>,
) -> AppResult<Json<DataResponse<SiteContent>>> {
    validate_slug(&slug)?;
    if input.title.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Title must not be empty".into(),
        )));
    }

    let row = SiteContentRepo::upsert(&state.pool, &slug, &input).await?;
    state
        .cache
        .invalidate(&InvalidationEvent::ContentChanged(slug.clone()))
        .await;

    tracing::info!(slug = %slug, user_id = admin.user_id, "Content page updated");
    Ok(Json(DataResponse { data: row }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn row(slug: &str, body: &str) -> SiteContent {
        SiteContent {
            slug: slug.into(),
            title: "License".into(),
            body: body.into(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn licenses_fall_back_to_default_descriptions() {
        let infos = license_infos(&[row("license-trackout", "Custom trackout terms")]);
        assert_eq!(infos.len(), 3);
        assert_eq!(infos[0].description, LicenseTier::Basic.default_description());
        assert_eq!(infos[1].description, "Custom trackout terms");
        assert!(!infos[0].includes_stems);
        assert!(infos[2].includes_stems);
        assert_eq!(infos[2].price_field, "price_unlimited_cents");
    }

    #[test]
    fn blank_stored_description_uses_default() {
        let infos = license_infos(&[row("license-basic", "   ")]);
        assert_eq!(infos[0].description, LicenseTier::Basic.default_description());
    }
}
