//! Background dispatch of approved flight plans.
//!
//! The decision handler pushes a [`DispatchJob`] onto the [`DispatchQueue`]
//! and returns immediately. A single [`DispatchWorker`] loop owns the
//! receiving end and runs each job as its own task, bounded by a semaphore.
//! There is no channel back to the approving request: failures are logged and
//! recorded as audit events.

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use uplink_core::audit::{descriptors, predicates, EntityRef};
use uplink_core::frame::Frame;
use uplink_core::types::{FpId, Operator};
use uplink_events::{AuditEvent, EventBus};

use crate::collaborators::{ArtifactRef, DeliveryAck, GroundStationDirectory, Transport};
use crate::error::{DispatchError, PipelineError};
use crate::registry::{PendingEntry, PendingRegistry};

/// Default number of jobs transmitted concurrently.
pub const DEFAULT_DISPATCH_CONCURRENCY: usize = 4;

// ---------------------------------------------------------------------------
// Job and queue
// ---------------------------------------------------------------------------

/// Everything the worker needs to transmit an approved plan, carried by value.
#[derive(Debug, Clone)]
pub struct DispatchJob {
    pub id: FpId,
    pub compiled: serde_json::Value,
    pub compiled_artifact: ArtifactRef,
    pub approved_by: Operator,
}

/// Sending half of the dispatch queue. Cheap to clone.
#[derive(Clone)]
pub struct DispatchQueue {
    sender: mpsc::UnboundedSender<DispatchJob>,
}

impl DispatchQueue {
    /// Create a queue and the receiver to hand to [`DispatchWorker::run`].
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DispatchJob>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Queue a job without waiting for it to run.
    pub fn enqueue(&self, job: DispatchJob) -> Result<(), PipelineError> {
        self.sender
            .send(job)
            .map_err(|_| PipelineError::QueueClosed)
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// What happened to a single job.
#[derive(Debug)]
pub enum DispatchOutcome {
    Sent(DeliveryAck),
    /// Another job for the same id got there first.
    AlreadyTaken,
    Failed(DispatchError),
}

#[derive(Clone)]
pub struct DispatchWorker {
    registry: Arc<PendingRegistry>,
    directory: Arc<dyn GroundStationDirectory>,
    transport: Arc<dyn Transport>,
    event_bus: Arc<EventBus>,
    concurrency: usize,
}

impl DispatchWorker {
    pub fn new(
        registry: Arc<PendingRegistry>,
        directory: Arc<dyn GroundStationDirectory>,
        transport: Arc<dyn Transport>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            registry,
            directory,
            transport,
            event_bus,
            concurrency: DEFAULT_DISPATCH_CONCURRENCY,
        }
    }

    /// Limit how many jobs are transmitted at once (minimum 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Consume jobs until the queue closes or `cancel` fires.
    ///
    /// Jobs already running when the loop stops are awaited before returning;
    /// jobs still sitting in the queue are dropped.
    pub async fn run(self, mut jobs: mpsc::UnboundedReceiver<DispatchJob>, cancel: CancellationToken) {
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut running = JoinSet::new();

        tracing::info!(concurrency = self.concurrency, "Dispatch worker started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Dispatch worker cancelled");
                    break;
                }
                Some(finished) = running.join_next(), if !running.is_empty() => {
                    if let Err(e) = finished {
                        tracing::error!(error = %e, "Dispatch task panicked");
                    }
                }
                job = jobs.recv() => {
                    let Some(job) = job else {
                        tracing::info!("Dispatch queue closed");
                        break;
                    };
                    // A full pool must not hold off cancellation.
                    let permit = tokio::select! {
                        _ = cancel.cancelled() => {
                            tracing::info!(fp_id = %job.id, "Dispatch worker cancelled while waiting for capacity");
                            break;
                        }
                        permit = Arc::clone(&permits).acquire_owned() => permit,
                    };
                    let Ok(permit) = permit else {
                        break;
                    };
                    let worker = self.clone();
                    running.spawn(async move {
                        let _permit = permit;
                        worker.dispatch(job).await;
                    });
                }
            }
        }

        let in_flight = running.len();
        if in_flight > 0 {
            tracing::info!(in_flight, "Waiting for in-flight dispatches");
        }
        while running.join_next().await.is_some() {}
        tracing::info!("Dispatch worker stopped");
    }

    /// Transmit one approved plan.
    ///
    /// Removes the plan from the registry first; if it is already gone the job
    /// is a duplicate and is dropped without touching the transport.
    pub async fn dispatch(&self, job: DispatchJob) -> DispatchOutcome {
        let DispatchJob {
            id,
            compiled,
            compiled_artifact,
            approved_by,
        } = job;

        let Some(entry) = self.registry.take(id).await else {
            tracing::info!(
                fp_id = %id,
                approved_by = %approved_by.id,
                "Flight plan already taken by another dispatch, dropping duplicate"
            );
            return DispatchOutcome::AlreadyTaken;
        };

        match self.transmit(&entry, compiled).await {
            Ok((station_id, ack)) => {
                tracing::info!(
                    fp_id = %id,
                    gs_id = %station_id,
                    request_id = %ack.request_id,
                    satellite = %entry.plan.sat_name,
                    "Flight plan sent to ground station"
                );
                self.event_bus.publish(
                    AuditEvent::new(descriptors::TRANSMISSION)
                        .subject(predicates::SENT_BY, EntityRef::operator(&approved_by.id))
                        .object(predicates::USED, EntityRef::artifact(compiled_artifact.0))
                        .object(predicates::SENT_TO, EntityRef::ground_station(station_id))
                        .object(predicates::DISPATCHED, EntityRef::flight_plan(id)),
                );
                DispatchOutcome::Sent(ack)
            }
            Err(e) => {
                tracing::error!(
                    fp_id = %id,
                    gs_id = %entry.plan.gs_id,
                    error = %e,
                    "Flight plan dispatch failed"
                );
                self.event_bus.publish(
                    AuditEvent::new(descriptors::DISPATCH_FAILURE)
                        .subject(predicates::APPROVED_BY, EntityRef::operator(&approved_by.id))
                        .object(predicates::FAILED, EntityRef::flight_plan(id))
                        .object(
                            predicates::SENT_TO,
                            EntityRef::ground_station(&entry.plan.gs_id),
                        ),
                );
                DispatchOutcome::Failed(e)
            }
        }
    }

    async fn transmit(
        &self,
        entry: &PendingEntry,
        compiled: serde_json::Value,
    ) -> Result<(String, DeliveryAck), DispatchError> {
        let plan = &entry.plan;

        let station = self
            .directory
            .resolve(&plan.gs_id)
            .await
            .ok_or_else(|| DispatchError::GroundStationUnresolved(plan.gs_id.clone()))?;

        let frame = Frame::schedule_transmission(&plan.datetime, &plan.sat_name, compiled);
        let ack = self.transport.send_control(&station, frame).await?;

        Ok((station.id.to_string(), ack))
    }
}
