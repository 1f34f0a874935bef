//! Audit vocabulary: event descriptors, relationship predicates, and entity
//! references.
//!
//! This module lives in `core` so the pipeline, the event bus, and the API can
//! all describe audit records with the same words.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Event descriptors
// ---------------------------------------------------------------------------

pub mod descriptors {
    pub const SUBMISSION: &str = "FlightPlanSubmission";
    pub const APPROVAL: &str = "FlightPlanApproval";
    pub const REJECTION: &str = "FlightPlanRejection";
    pub const TRANSMISSION: &str = "FlightPlanTransmission";
    pub const DISPATCH_FAILURE: &str = "FlightPlanDispatchFailure";
}

// ---------------------------------------------------------------------------
// Relationship predicates
// ---------------------------------------------------------------------------

pub mod predicates {
    pub const STARTED_BY: &str = "startedBy";
    pub const CREATED: &str = "created";
    pub const AWAITS_APPROVAL: &str = "awaitsApproval";
    pub const APPROVED_BY: &str = "approvedBy";
    pub const REJECTED_BY: &str = "rejectedBy";
    pub const SENT_BY: &str = "sentBy";
    pub const USED: &str = "used";
    pub const SENT_TO: &str = "sentTo";
    pub const DISPATCHED: &str = "dispatched";
    pub const DECLINED: &str = "declined";
    pub const SCHEDULED: &str = "scheduled";
    pub const FAILED: &str = "failed";
}

// ---------------------------------------------------------------------------
// Entities and relationships
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Operator,
    Artifact,
    GroundStation,
    FlightPlan,
}

/// A typed reference to something an audit event talks about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityRef {
    pub fn operator(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Operator, id)
    }

    pub fn artifact(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Artifact, id)
    }

    pub fn ground_station(id: impl Into<String>) -> Self {
        Self::new(EntityKind::GroundStation, id)
    }

    pub fn flight_plan(id: impl ToString) -> Self {
        Self::new(EntityKind::FlightPlan, id.to_string())
    }

    fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

/// One edge of an audit event.
///
/// A subject relationship says who or what acted on the event
/// (`startedBy operator`); an object relationship says what the event acted
/// on (`created artifact`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Relationship {
    Subject { predicate: String, entity: EntityRef },
    Object { predicate: String, entity: EntityRef },
}

impl Relationship {
    pub fn subject(predicate: &str, entity: EntityRef) -> Self {
        Self::Subject {
            predicate: predicate.to_string(),
            entity,
        }
    }

    pub fn object(predicate: &str, entity: EntityRef) -> Self {
        Self::Object {
            predicate: predicate.to_string(),
            entity,
        }
    }

    pub fn predicate(&self) -> &str {
        match self {
            Self::Subject { predicate, .. } | Self::Object { predicate, .. } => predicate,
        }
    }

    pub fn entity(&self) -> &EntityRef {
        match self {
            Self::Subject { entity, .. } | Self::Object { entity, .. } => entity,
        }
    }
}
