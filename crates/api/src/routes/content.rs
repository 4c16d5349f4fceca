//! Route definitions for public content pages and license descriptions.

use axum::routing::get;
use axum::Router;

use crate::handlers::content;
use crate::state::AppState;

/// Routes merged at the `/api/v1` root.
///
/// ```text
/// GET /content/{slug}  -> get_page
/// GET /licenses        -> list_licenses
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/content/{slug}", get(content::get_page))
        .route("/licenses", get(content::list_licenses))
}
