//! Trait seams for everything the pipeline does not own.
//!
//! Implementations are held as `Arc<dyn Trait>` so the binary can pick a
//! concrete backend at startup and tests can substitute recording doubles.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uplink_core::frame::Frame;
use uplink_core::types::Operator;
use uuid::Uuid;

use crate::error::{ArtifactError, CompileError, TransportError};

// ---------------------------------------------------------------------------
// Artifact store
// ---------------------------------------------------------------------------

/// Content-derived reference to a stored document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactRef(pub String);

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of storing an artifact.
///
/// Storing content that is already present is not an error: the store reports
/// the existing reference instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactPut {
    Created(ArtifactRef),
    Existing(ArtifactRef),
}

impl ArtifactPut {
    pub fn into_ref(self) -> ArtifactRef {
        match self {
            Self::Created(r) | Self::Existing(r) => r,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store `bytes` under a content-derived reference.
    async fn put(&self, bytes: Vec<u8>, name: &str) -> Result<ArtifactPut, ArtifactError>;
}

// ---------------------------------------------------------------------------
// Compiler
// ---------------------------------------------------------------------------

/// Result of compiling a flight-plan command body.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPlan {
    pub compiled: serde_json::Value,
    /// Where the compiled representation was stored.
    pub artifact: ArtifactRef,
}

#[async_trait]
pub trait Compiler: Send + Sync {
    async fn compile(
        &self,
        body: &serde_json::Value,
        requester: &Operator,
    ) -> Result<CompiledPlan, CompileError>;
}

// ---------------------------------------------------------------------------
// Ground-station directory and transport
// ---------------------------------------------------------------------------

/// A resolved, currently reachable ground station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundStationHandle {
    pub id: Uuid,
    pub name: String,
}

/// Confirmation that a ground station received a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryAck {
    pub request_id: Uuid,
    /// Whatever the ground station sent back.
    pub response: serde_json::Value,
}

#[async_trait]
pub trait GroundStationDirectory: Send + Sync {
    /// Look up a ground station by the identifier given at submission.
    ///
    /// Returns `None` for unknown, disconnected, or malformed identifiers.
    async fn resolve(&self, gs_id: &str) -> Option<GroundStationHandle>;
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_control(
        &self,
        station: &GroundStationHandle,
        frame: Frame,
    ) -> Result<DeliveryAck, TransportError>;
}
