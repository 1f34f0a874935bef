use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::ws::Message;
use serde::Deserialize;
use tokio::sync::{mpsc, oneshot, Mutex, RwLock};
use uplink_core::frame::Frame;
use uplink_core::types::Timestamp;
use uplink_pipeline::collaborators::{
    DeliveryAck, GroundStationDirectory, GroundStationHandle, Transport,
};
use uplink_pipeline::error::TransportError;
use uuid::Uuid;

/// Channel sender half for pushing messages to a ground-station socket.
pub type GsSender = mpsc::UnboundedSender<Message>;

/// Metadata for a single connected ground station.
pub struct StationConnection {
    /// Human-readable label supplied when connecting.
    pub name: String,
    /// Channel sender for outbound messages to this station.
    pub sender: GsSender,
    /// When this connection was established.
    pub connected_at: Timestamp,
    /// Distinguishes a reconnect from the socket it replaced.
    session: Uuid,
}

/// A frame waiting for its reply.
struct PendingReply {
    station_id: Uuid,
    reply: oneshot::Sender<serde_json::Value>,
}

/// Reply sent by a ground station for a frame it received.
#[derive(Debug, Deserialize)]
struct StationReply {
    in_response_to: Uuid,
    #[serde(default)]
    data: serde_json::Value,
}

/// Tracks connected ground stations and routes control frames to them.
///
/// Serves as the pipeline's [`GroundStationDirectory`] (who is reachable) and
/// [`Transport`] (deliver a frame and wait for its reply). Thread-safe via
/// interior locks; designed to be wrapped in `Arc` and shared.
pub struct GroundStationGateway {
    stations: RwLock<HashMap<Uuid, StationConnection>>,
    pending: Mutex<HashMap<Uuid, PendingReply>>,
    response_timeout: Duration,
}

impl GroundStationGateway {
    /// Create an empty gateway that waits `response_timeout` for each reply.
    pub fn new(response_timeout: Duration) -> Self {
        Self {
            stations: RwLock::new(HashMap::new()),
            pending: Mutex::new(HashMap::new()),
            response_timeout,
        }
    }

    /// Register a ground station connection.
    ///
    /// A station reconnecting under the same id replaces its previous socket,
    /// which is sent a Close frame. Returns the session token to pass to
    /// [`disconnect`](Self::disconnect) and the receiver half of the outbound
    /// channel.
    pub async fn connect(
        &self,
        station_id: Uuid,
        name: String,
    ) -> (Uuid, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Uuid::new_v4();
        let conn = StationConnection {
            name,
            sender: tx,
            connected_at: chrono::Utc::now(),
            session,
        };

        if let Some(previous) = self.stations.write().await.insert(station_id, conn) {
            tracing::info!(gs_id = %station_id, "Ground station reconnected, closing previous socket");
            let _ = previous.sender.send(Message::Close(None));
        }
        (session, rx)
    }

    /// Remove a station connection, failing any frames still awaiting its reply.
    ///
    /// A stale session (already replaced by a reconnect) is a no-op.
    pub async fn disconnect(&self, station_id: Uuid, session: Uuid) {
        {
            let mut stations = self.stations.write().await;
            match stations.get(&station_id) {
                Some(conn) if conn.session == session => {
                    stations.remove(&station_id);
                }
                _ => return,
            }
        }

        // Dropping the reply senders wakes the waiters with a disconnect.
        self.pending
            .lock()
            .await
            .retain(|_, p| p.station_id != station_id);
    }

    /// Route an inbound text message from `station_id` to the frame it answers.
    ///
    /// Returns `false` when the message is not a reply or answers nothing
    /// outstanding for this station.
    pub async fn handle_message(&self, station_id: Uuid, text: &str) -> bool {
        let reply: StationReply = match serde_json::from_str(text) {
            Ok(reply) => reply,
            Err(e) => {
                tracing::debug!(gs_id = %station_id, error = %e, "Ignoring non-reply message");
                return false;
            }
        };

        let mut pending = self.pending.lock().await;
        match pending.get(&reply.in_response_to) {
            Some(p) if p.station_id == station_id => {}
            _ => {
                tracing::debug!(
                    gs_id = %station_id,
                    request_id = %reply.in_response_to,
                    "Reply does not match an outstanding frame"
                );
                return false;
            }
        }

        let Some(waiter) = pending.remove(&reply.in_response_to) else {
            return false;
        };
        // The waiter may have timed out in the meantime.
        waiter.reply.send(reply.data).is_ok()
    }

    /// Whether a station with this id currently has an open socket.
    pub async fn is_connected(&self, station_id: Uuid) -> bool {
        self.stations.read().await.contains_key(&station_id)
    }

    /// Return the current number of connected ground stations.
    pub async fn connected_count(&self) -> usize {
        self.stations.read().await.len()
    }

    /// Send a Close frame to every station, then clear all state.
    ///
    /// Used during graceful shutdown.
    pub async fn shutdown_all(&self) {
        let mut stations = self.stations.write().await;
        let count = stations.len();
        for conn in stations.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        stations.clear();
        self.pending.lock().await.clear();
        tracing::info!(count, "Closed all ground station connections");
    }

    async fn forget(&self, request_id: Uuid) {
        self.pending.lock().await.remove(&request_id);
    }
}

#[async_trait]
impl GroundStationDirectory for GroundStationGateway {
    async fn resolve(&self, gs_id: &str) -> Option<GroundStationHandle> {
        let id = Uuid::parse_str(gs_id.trim()).ok()?;
        self.stations
            .read()
            .await
            .get(&id)
            .map(|conn| GroundStationHandle {
                id,
                name: conn.name.clone(),
            })
    }
}

#[async_trait]
impl Transport for GroundStationGateway {
    async fn send_control(
        &self,
        station: &GroundStationHandle,
        mut frame: Frame,
    ) -> Result<DeliveryAck, TransportError> {
        let request_id = Uuid::new_v4();
        frame.request_id = Some(request_id);
        let text = serde_json::to_string(&frame)?;

        let (reply_tx, reply_rx) = oneshot::channel();
        self.pending.lock().await.insert(
            request_id,
            PendingReply {
                station_id: station.id,
                reply: reply_tx,
            },
        );

        let sent = match self.stations.read().await.get(&station.id) {
            Some(conn) => conn.sender.send(Message::Text(text.into())).is_ok(),
            None => false,
        };
        if !sent {
            self.forget(request_id).await;
            return Err(TransportError::Disconnected(station.id.to_string()));
        }

        tracing::debug!(gs_id = %station.id, request_id = %request_id, "Frame sent, awaiting reply");

        match tokio::time::timeout(self.response_timeout, reply_rx).await {
            Ok(Ok(response)) => Ok(DeliveryAck {
                request_id,
                response,
            }),
            Ok(Err(_)) => Err(TransportError::Disconnected(station.id.to_string())),
            Err(_) => {
                self.forget(request_id).await;
                Err(TransportError::Timeout(station.id.to_string()))
            }
        }
    }
}
