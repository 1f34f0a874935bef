//! Route definitions for the `/scheduling` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::scheduling;
use crate::state::AppState;

/// Routes mounted at `/scheduling`.
///
/// ```text
/// POST   /save                 -> save_flight_plan
/// POST   /approve/{fp_id}      -> approve_flight_plan
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/save", post(scheduling::save_flight_plan))
        .route("/approve/{fp_id}", post(scheduling::approve_flight_plan))
}
