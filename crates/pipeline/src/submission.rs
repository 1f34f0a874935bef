//! Accepting new flight plans.

use std::sync::Arc;

use uplink_core::audit::{descriptors, predicates, EntityRef};
use uplink_core::flight_plan::FlightPlanSubmission;
use uplink_core::types::{FpId, Operator};
use uplink_events::{AuditEvent, EventBus};

use crate::collaborators::ArtifactStore;
use crate::error::{ArtifactError, PipelineError};
use crate::registry::PendingRegistry;

/// Name under which raw submitted plans are stored.
const RAW_ARTIFACT_NAME: &str = "flight_plan.json";

/// Validates submissions and files them as pending.
#[derive(Clone)]
pub struct SubmissionHandler {
    registry: Arc<PendingRegistry>,
    artifacts: Arc<dyn ArtifactStore>,
    event_bus: Arc<EventBus>,
}

impl SubmissionHandler {
    pub fn new(
        registry: Arc<PendingRegistry>,
        artifacts: Arc<dyn ArtifactStore>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            registry,
            artifacts,
            event_bus,
        }
    }

    /// Validate, store, and register a flight plan.
    ///
    /// Missing fields come back as [`CoreError::Validation`] with nothing
    /// stored. On success the submission audit event has been published by
    /// the time the identifier is returned.
    pub async fn submit(
        &self,
        submission: FlightPlanSubmission,
        operator: &Operator,
    ) -> Result<FpId, PipelineError> {
        let plan = submission.validate().inspect_err(|e| {
            tracing::info!(operator = %operator.id, reason = %e, "Flight plan submission rejected");
        })?;

        let bytes = serde_json::to_vec(&plan).map_err(ArtifactError::from)?;
        let put = self.artifacts.put(bytes, RAW_ARTIFACT_NAME).await?;
        if !put.is_new() {
            tracing::debug!("Identical flight plan already stored, reusing artifact");
        }
        let artifact = put.into_ref();

        let sat_name = plan.sat_name.clone();
        let id = self
            .registry
            .insert(plan, operator.clone(), artifact.clone())
            .await;

        tracing::info!(
            fp_id = %id,
            operator = %operator.id,
            satellite = %sat_name,
            artifact = %artifact,
            "Flight plan scheduled for approval"
        );

        self.event_bus.publish(
            AuditEvent::new(descriptors::SUBMISSION)
                .subject(predicates::STARTED_BY, EntityRef::operator(&operator.id))
                .object(predicates::CREATED, EntityRef::artifact(artifact.0))
                .object(predicates::AWAITS_APPROVAL, EntityRef::flight_plan(id)),
        );

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;
    use uplink_core::error::CoreError;
    use uplink_core::flight_plan::{MSG_GROUND_STATION_REQUIRED, MSG_SATELLITE_REQUIRED};

    use super::*;
    use crate::artifacts::MemoryArtifactStore;

    struct Fixture {
        registry: Arc<PendingRegistry>,
        artifacts: Arc<MemoryArtifactStore>,
        bus: Arc<EventBus>,
        handler: SubmissionHandler,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(PendingRegistry::new());
        let artifacts = Arc::new(MemoryArtifactStore::new());
        let bus = Arc::new(EventBus::default());
        let handler =
            SubmissionHandler::new(Arc::clone(&registry), artifacts.clone(), Arc::clone(&bus));
        Fixture {
            registry,
            artifacts,
            bus,
            handler,
        }
    }

    fn operator() -> Operator {
        Operator {
            id: "alice".into(),
            role: "operator".into(),
        }
    }

    fn submission() -> FlightPlanSubmission {
        FlightPlanSubmission {
            flight_plan: json!({"name": "commands", "body": []}),
            datetime: Some("2025-01-01T12:00:00+01:00".into()),
            gs_id: Some("86c8a92b-571a-46cb-b306-e9be71959279".into()),
            sat_name: Some("SAT-1".into()),
        }
    }

    #[tokio::test]
    async fn valid_submission_is_pending_and_audited() {
        let f = fixture();
        let mut events = f.bus.subscribe();

        let id = f.handler.submit(submission(), &operator()).await.unwrap();

        let plan = f.registry.peek(id).await.expect("plan should be pending");
        assert_eq!(plan.sat_name, "SAT-1");
        assert_eq!(f.artifacts.len().await, 1);

        // Published before submit() returned.
        let event = events.try_recv().expect("submission event already published");
        assert_eq!(event.descriptor, descriptors::SUBMISSION);
        assert_eq!(
            event.related(predicates::STARTED_BY),
            Some(&EntityRef::operator("alice"))
        );
        assert_eq!(
            event.related(predicates::AWAITS_APPROVAL),
            Some(&EntityRef::flight_plan(id))
        );
    }

    #[tokio::test]
    async fn identical_resubmission_reuses_artifact_but_gets_new_id() {
        let f = fixture();

        let first = f.handler.submit(submission(), &operator()).await.unwrap();
        let second = f.handler.submit(submission(), &operator()).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(f.artifacts.len().await, 1);
        assert!(f.registry.peek(first).await.is_some());
        assert!(f.registry.peek(second).await.is_some());
    }

    #[tokio::test]
    async fn missing_satellite_is_rejected_without_side_effects() {
        let f = fixture();
        let mut events = f.bus.subscribe();

        let result = f
            .handler
            .submit(
                FlightPlanSubmission {
                    sat_name: None,
                    ..submission()
                },
                &operator(),
            )
            .await;

        assert_matches!(
            result,
            Err(PipelineError::Core(CoreError::Validation(ref msg))) if msg == MSG_SATELLITE_REQUIRED
        );
        assert!(f.artifacts.is_empty().await);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn missing_ground_station_is_rejected() {
        let f = fixture();
        let result = f
            .handler
            .submit(
                FlightPlanSubmission {
                    gs_id: None,
                    ..submission()
                },
                &operator(),
            )
            .await;

        assert_matches!(
            result,
            Err(PipelineError::Core(CoreError::Validation(ref msg))) if msg == MSG_GROUND_STATION_REQUIRED
        );
    }
}
