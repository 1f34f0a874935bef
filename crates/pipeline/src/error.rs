use uplink_core::error::CoreError;
use uplink_core::types::FpId;

/// Failure reported by an artifact store.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Artifact could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failure reported by a flight-plan compiler.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Compiler rejected the flight plan: {0}")]
    Rejected(String),

    #[error("Compiler unreachable: {0}")]
    Unreachable(String),

    #[error("Compiler returned an unreadable response: {0}")]
    InvalidResponse(String),

    #[error("Compiled plan could not be stored: {0}")]
    Artifact(#[from] ArtifactError),
}

/// Failure reported by a ground-station transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Ground station {0} is not connected")]
    Disconnected(String),

    #[error("Ground station {0} did not respond in time")]
    Timeout(String),

    #[error("Frame could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors surfaced synchronously by the submission and decision handlers.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Validation or lookup failure in domain terms.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Artifact store failed: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("Compilation failed: {0}")]
    Compile(#[from] CompileError),

    /// The dispatch worker is gone; the job could not be queued.
    #[error("Dispatch queue closed")]
    QueueClosed,
}

impl PipelineError {
    pub(crate) fn flight_plan_not_found(id: FpId) -> Self {
        Self::Core(CoreError::NotFound {
            entity: "FlightPlan",
            id: id.to_string(),
        })
    }
}

/// Failures inside the background dispatch path.
///
/// These are logged and recorded as audit events; no caller ever sees them.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Ground station {0} could not be resolved")]
    GroundStationUnresolved(String),

    #[error("Transmission failed: {0}")]
    Transport(#[from] TransportError),
}
