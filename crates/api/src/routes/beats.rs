//! Route definitions for the public catalog.

use axum::routing::get;
use axum::Router;

use crate::handlers::beats;
use crate::state::AppState;

/// Routes mounted at `/beats`.
///
/// ```text
/// GET /            -> list_beats
/// GET /featured    -> list_featured
/// GET /{id}        -> get_beat
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(beats::list_beats))
        .route("/featured", get(beats::list_featured))
        .route("/{id}", get(beats::get_beat))
}
