//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the audit sink for the scheduling pipeline. Publishing is
//! fire-and-forget: a missing or lagging subscriber never blocks the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uplink_core::audit::{EntityRef, Relationship};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// AuditEvent
// ---------------------------------------------------------------------------

/// An audit record.
///
/// Constructed via [`AuditEvent::new`] and enriched with
/// [`subject`](AuditEvent::subject) and [`object`](AuditEvent::object).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,

    /// Event name, e.g. `"FlightPlanSubmission"`.
    pub descriptor: String,

    pub relationships: Vec<Relationship>,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            descriptor: descriptor.into(),
            relationships: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Record who or what acted.
    pub fn subject(mut self, predicate: &str, entity: EntityRef) -> Self {
        self.relationships
            .push(Relationship::subject(predicate, entity));
        self
    }

    /// Record what was acted upon.
    pub fn object(mut self, predicate: &str, entity: EntityRef) -> Self {
        self.relationships.push(Relationship::object(predicate, entity));
        self
    }

    /// Find the entity attached under `predicate`, if any.
    pub fn related(&self, predicate: &str) -> Option<&EntityRef> {
        self.relationships
            .iter()
            .find(|r| r.predicate() == predicate)
            .map(Relationship::entity)
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// # Usage
///
/// ```rust
/// use uplink_events::bus::{AuditEvent, EventBus};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(AuditEvent::new("FlightPlanSubmission"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<AuditEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: AuditEvent) {
        tracing::debug!(
            event_id = %event.id,
            descriptor = %event.descriptor,
            "Audit event published"
        );
        // Ignore the SendError: it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<AuditEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
