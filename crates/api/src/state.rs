use std::sync::Arc;

use uplink_events::EventBus;
use uplink_pipeline::{DecisionHandler, SubmissionHandler};

use crate::config::ServerConfig;
use crate::groundstation::GroundStationGateway;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (JWT settings are read by the auth extractor).
    pub config: Arc<ServerConfig>,
    /// Validates and files new flight plans.
    pub submissions: SubmissionHandler,
    /// Applies approve/reject decisions and queues dispatch.
    pub decisions: DecisionHandler,
    /// Connected ground stations.
    pub gateway: Arc<GroundStationGateway>,
    /// Audit event bus.
    pub event_bus: Arc<EventBus>,
}
