//! Uplink audit event bus.
//!
//! - [`EventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`AuditEvent`] -- the audit record envelope (descriptor plus
//!   relationships).
//! - [`EventPersistence`] -- background service that appends every event to a
//!   JSON-lines audit file.

pub mod bus;
pub mod persistence;

pub use bus::{AuditEvent, EventBus};
pub use persistence::EventPersistence;
