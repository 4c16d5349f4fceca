//! Route definitions for the `/admin` back-office.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{admin_beats, admin_orders, cache_admin, content};
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// All routes require the `admin` role (enforced by handler extractors).
///
/// ```text
/// GET    /beats                  -> list_beats
/// POST   /beats                  -> create_beat
/// POST   /beats/upload           -> upload_beat (multipart)
/// GET    /beats/scheduled        -> list_scheduled
/// GET    /beats/{id}             -> get_beat
/// PUT    /beats/{id}             -> update_beat
/// DELETE /beats/{id}             -> delete_beat
///
/// GET    /orders                 -> list_orders
/// POST   /orders                 -> create_order
/// GET    /orders/stats           -> order_stats
/// GET    /orders/{id}            -> get_order
/// PUT    /orders/{id}/status     -> update_status
///
/// GET    /content                -> list_all
/// PUT    /content/{slug}         -> upsert_page
///
/// GET    /cache/stats            -> stats
/// POST   /cache/actions          -> run_action
/// GET    /cache/keys/{key}       -> get_key
/// PUT    /cache/keys/{key}       -> put_key
/// DELETE /cache/keys/{key}       -> delete_key
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        // Beats
        .route(
            "/beats",
            get(admin_beats::list_beats).post(admin_beats::create_beat),
        )
        .route(
            "/beats/upload",
            post(admin_beats::upload_beat)
                .layer(DefaultBodyLimit::max(admin_beats::MAX_UPLOAD_BYTES)),
        )
        .route("/beats/scheduled", get(admin_beats::list_scheduled))
        .route(
            "/beats/{id}",
            get(admin_beats::get_beat)
                .put(admin_beats::update_beat)
                .delete(admin_beats::delete_beat),
        )
        // Orders
        .route(
            "/orders",
            get(admin_orders::list_orders).post(admin_orders::create_order),
        )
        .route("/orders/stats", get(admin_orders::order_stats))
        .route("/orders/{id}", get(admin_orders::get_order))
        .route("/orders/{id}/status", put(admin_orders::update_status))
        // Content
        .route("/content", get(content::list_all))
        .route("/content/{slug}", put(content::upsert_page))
        // Cache
        .route("/cache/stats", get(cache_admin::stats))
        .route("/cache/actions", post(cache_admin::run_action))
        .route(
            "/cache/keys/{key}",
            get(cache_admin::get_key)
                .put(cache_admin::put_key)
                .delete(cache_admin::delete_key),
        )
}
