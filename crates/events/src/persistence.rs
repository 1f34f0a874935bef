//! Durable audit persistence service.
//!
//! [`EventPersistence`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! broadcast channel and appends every received [`AuditEvent`] as one JSON
//! line to the audit file. It runs as a long-lived background task and shuts
//! down gracefully when the bus sender is dropped.

use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::broadcast;

use crate::bus::AuditEvent;

/// Background service that persists audit events to a JSON-lines file.
pub struct EventPersistence;

impl EventPersistence {
    /// Run the persistence loop.
    ///
    /// The loop exits when the channel is closed (i.e. the
    /// [`EventBus`](crate::bus::EventBus) is dropped). Write failures are
    /// logged and do not stop the loop.
    pub async fn run(path: PathBuf, mut receiver: broadcast::Receiver<AuditEvent>) {
        tracing::info!(path = %path.display(), "Audit persistence started");

        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = Self::persist(&path, &event).await {
                        tracing::error!(
                            error = %e,
                            descriptor = %event.descriptor,
                            "Failed to persist audit event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Audit persistence lagged, some events were not persisted"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, audit persistence shutting down");
                    break;
                }
            }
        }
    }

    /// Append a single event to the audit file.
    async fn persist(path: &Path, event: &AuditEvent) -> std::io::Result<()> {
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await
    }
}
