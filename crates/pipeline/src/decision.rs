//! Applying an operator's approve/reject decision to a pending plan.

use std::sync::Arc;

use uplink_core::audit::{descriptors, predicates, EntityRef};
use uplink_core::types::{FpId, Operator};
use uplink_events::{AuditEvent, EventBus};

use crate::collaborators::Compiler;
use crate::dispatch::{DispatchJob, DispatchQueue};
use crate::error::PipelineError;
use crate::registry::PendingRegistry;

pub const MSG_APPROVED: &str = "Flight plan approved and scheduled for transmission";
pub const MSG_REJECTED: &str = "Flight plan not approved by user";

/// Outcome of a successful decision call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Compiled and queued for transmission.
    Approved,
    /// Removed from the pending set; never transmitted.
    Rejected,
}

impl Decision {
    pub fn message(self) -> &'static str {
        match self {
            Self::Approved => MSG_APPROVED,
            Self::Rejected => MSG_REJECTED,
        }
    }
}

#[derive(Clone)]
pub struct DecisionHandler {
    registry: Arc<PendingRegistry>,
    compiler: Arc<dyn Compiler>,
    queue: DispatchQueue,
    event_bus: Arc<EventBus>,
}

impl DecisionHandler {
    pub fn new(
        registry: Arc<PendingRegistry>,
        compiler: Arc<dyn Compiler>,
        queue: DispatchQueue,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            registry,
            compiler,
            queue,
            event_bus,
        }
    }

    /// Approve or reject the pending plan `id`.
    ///
    /// An unknown id is `NotFound` with no side effects. Rejection removes the
    /// plan. Approval compiles the plan, queues it for the dispatch worker and
    /// returns without waiting for transmission; the plan stays pending until
    /// the worker takes it, so a compile failure leaves it available for
    /// another attempt.
    pub async fn decide(
        &self,
        id: FpId,
        approved: bool,
        operator: &Operator,
    ) -> Result<Decision, PipelineError> {
        let Some(plan) = self.registry.peek(id).await else {
            tracing::debug!(fp_id = %id, "Flight plan not found");
            return Err(PipelineError::flight_plan_not_found(id));
        };

        if !approved {
            return self.reject(id, operator).await;
        }

        tracing::debug!(fp_id = %id, operator = %operator.id, "Flight plan approved, compiling");

        let compiled = self
            .compiler
            .compile(&plan.flight_plan, operator)
            .await
            .inspect_err(|e| {
                tracing::error!(fp_id = %id, error = %e, "Flight plan compilation failed");
            })?;

        let artifact = compiled.artifact.clone();
        self.queue.enqueue(DispatchJob {
            id,
            compiled: compiled.compiled,
            compiled_artifact: compiled.artifact,
            approved_by: operator.clone(),
        })?;

        tracing::info!(
            fp_id = %id,
            operator = %operator.id,
            gs_id = %plan.gs_id,
            "Flight plan approved and scheduled for transmission"
        );

        self.event_bus.publish(
            AuditEvent::new(descriptors::APPROVAL)
                .subject(predicates::APPROVED_BY, EntityRef::operator(&operator.id))
                .object(predicates::CREATED, EntityRef::artifact(artifact.0))
                .object(predicates::SCHEDULED, EntityRef::flight_plan(id)),
        );

        Ok(Decision::Approved)
    }

    async fn reject(&self, id: FpId, operator: &Operator) -> Result<Decision, PipelineError> {
        // A concurrent decision may have taken the plan since the peek.
        if self.registry.take(id).await.is_none() {
            return Err(PipelineError::flight_plan_not_found(id));
        }

        tracing::info!(fp_id = %id, operator = %operator.id, "Flight plan not approved by user");

        self.event_bus.publish(
            AuditEvent::new(descriptors::REJECTION)
                .subject(predicates::REJECTED_BY, EntityRef::operator(&operator.id))
                .object(predicates::DECLINED, EntityRef::flight_plan(id)),
        );

        Ok(Decision::Rejected)
    }
}
