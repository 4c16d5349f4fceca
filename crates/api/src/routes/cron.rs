use axum::routing::get;
use axum::Router;

use crate::handlers::cron;
use crate::state::AppState;

/// Routes mounted at `/cron`. Authenticated by the `CRON_SECRET` bearer
/// token, not by user JWTs.
///
/// ```text
/// GET /activate-scheduled  -> activate_scheduled
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/activate-scheduled", get(cron::activate_scheduled))
}
