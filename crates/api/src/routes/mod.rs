pub mod groundstation;
pub mod health;
pub mod scheduling;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /scheduling/save                  submit a flight plan (POST)
/// /scheduling/approve/{fp_id}       approve or reject (POST, ?approved=)
///
/// /gs/ws                            ground-station WebSocket
/// ```
///
/// Every route requires authentication.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/scheduling", scheduling::router())
        .nest("/gs", groundstation::router())
}
