use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use uuid::Uuid;

use crate::groundstation::manager::GroundStationGateway;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Query parameters identifying the connecting ground station.
#[derive(Debug, Deserialize)]
pub struct GsConnectParams {
    pub gs_id: Uuid,
    pub name: Option<String>,
}

/// HTTP handler that upgrades an authenticated ground station to WebSocket.
///
/// After the upgrade the station is registered with the gateway under
/// `gs_id` and becomes resolvable for dispatch until the socket closes.
pub async fn gs_ws_handler(
    ws: WebSocketUpgrade,
    auth: AuthUser,
    Query(params): Query<GsConnectParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let name = params.name.unwrap_or_else(|| params.gs_id.to_string());
    tracing::debug!(gs_id = %params.gs_id, user_id = %auth.user_id, "Ground station upgrade requested");
    ws.on_upgrade(move |socket| handle_socket(socket, state.gateway, params.gs_id, name))
}

/// Manage a single ground-station connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the station with the gateway.
///   2. Spawns a sender task that forwards frames from the gateway channel.
///   3. Routes inbound replies to the frames awaiting them.
///   4. Unregisters on disconnect.
async fn handle_socket(
    socket: WebSocket,
    gateway: Arc<GroundStationGateway>,
    gs_id: Uuid,
    name: String,
) {
    tracing::info!(gs_id = %gs_id, name = %name, "Ground station connected");

    let (session, mut rx) = gateway.connect(gs_id, name).await;

    let (mut sink, mut stream) = socket.split();

    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sink.send(msg).await.is_err() || closing {
                tracing::debug!(gs_id = %gs_id, "Ground station sink closed");
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                gateway.handle_message(gs_id, text.as_str()).await;
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(gs_id = %gs_id, "Pong received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(gs_id = %gs_id, error = %e, "Ground station receive error");
                break;
            }
        }
    }

    gateway.disconnect(gs_id, session).await;
    send_task.abort();
    tracing::info!(gs_id = %gs_id, "Ground station disconnected");
}
