use axum::routing::get;
use axum::Router;

use crate::groundstation;
use crate::state::AppState;

/// Routes mounted at `/gs`.
pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(groundstation::gs_ws_handler))
}
