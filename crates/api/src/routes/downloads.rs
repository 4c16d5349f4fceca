use axum::routing::get;
use axum::Router;

use crate::handlers::downloads;
use crate::state::AppState;

/// Routes mounted at `/downloads`.
///
/// ```text
/// GET /{beat_id}?asset=&order_id=&email=  -> download
/// GET /{beat_id}?asset=&admin=true        -> download (admin bearer token)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{beat_id}", get(downloads::download))
}
