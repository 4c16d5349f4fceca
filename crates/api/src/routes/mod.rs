pub mod admin;
pub mod auth;
pub mod beats;
pub mod content;
pub mod cron;
pub mod downloads;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                                      login (public)
/// /auth/me                                         current account (requires auth)
///
/// /beats                                           catalog listing (public)
/// /beats/featured                                  featured strip (public)
/// /beats/{id}                                      visible beat (public)
///
/// /content/{slug}                                  faq, terms, privacy (public)
/// /licenses                                        license tiers (public)
///
/// /downloads/{beat_id}                             signed redirect (purchase, preview, or admin)
///
/// /cron/activate-scheduled                         release activation (bearer secret)
///
/// /admin/beats                                     list, create (admin only)
/// /admin/beats/upload                              multipart create
/// /admin/beats/scheduled                           pending and future releases
/// /admin/beats/{id}                                get, update, delete
/// /admin/orders                                    list, create
/// /admin/orders/{id}                               get with items
/// /admin/orders/{id}/status                        update status (PUT)
/// /admin/content                                   list stored pages
/// /admin/content/{slug}                            upsert (PUT)
/// /admin/cache/stats                               counters and key count
/// /admin/cache/actions                             bulk cache actions (POST)
/// /admin/cache/keys/{key}                          raw get, put, delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/beats", beats::router())
        .merge(content::router())
        .nest("/downloads", downloads::router())
        .nest("/cron", cron::router())
        .nest("/admin", admin::router())
}
