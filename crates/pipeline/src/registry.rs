//! Volatile store of flight plans awaiting an operator decision.
//!
//! The map itself is never exposed. Entries go in through
//! [`PendingRegistry::insert`] and leave only through
//! [`PendingRegistry::take`], which moves the entry out by value. Nothing is
//! persisted; a restart forgets every pending plan.

use std::collections::HashMap;

use tokio::sync::RwLock;
use uplink_core::flight_plan::FlightPlan;
use uplink_core::types::{FpId, Operator, Timestamp};
use uuid::Uuid;

use crate::collaborators::ArtifactRef;

/// A flight plan awaiting a decision.
#[derive(Debug, Clone)]
pub struct PendingEntry {
    pub id: FpId,
    pub plan: FlightPlan,
    pub submitted_by: Operator,
    /// Reference to the raw plan in the artifact store.
    pub artifact: ArtifactRef,
    pub submitted_at: Timestamp,
}

/// Concurrency-safe registry of pending flight plans.
///
/// Designed to be wrapped in `Arc` and shared between the HTTP handlers and
/// the dispatch worker. `insert` and `take` hold the write lock, so for any
/// id at most one `take` ever returns `Some`.
#[derive(Default)]
pub struct PendingRegistry {
    entries: RwLock<HashMap<FpId, PendingEntry>>,
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a plan under a fresh random identifier and return it.
    pub async fn insert(
        &self,
        plan: FlightPlan,
        submitted_by: Operator,
        artifact: ArtifactRef,
    ) -> FpId {
        let mut entries = self.entries.write().await;

        // A v4 collision is practically impossible; regenerate rather than overwrite.
        let mut id = Uuid::new_v4();
        while entries.contains_key(&id) {
            id = Uuid::new_v4();
        }

        entries.insert(
            id,
            PendingEntry {
                id,
                plan,
                submitted_by,
                artifact,
                submitted_at: chrono::Utc::now(),
            },
        );
        id
    }

    /// Non-destructive read of a pending plan.
    pub async fn peek(&self, id: FpId) -> Option<FlightPlan> {
        self.entries
            .read()
            .await
            .get(&id)
            .map(|entry| entry.plan.clone())
    }

    /// Atomically remove and return the entry, if it is still pending.
    ///
    /// Only the first call for a given id succeeds; later calls get `None`.
    pub async fn take(&self, id: FpId) -> Option<PendingEntry> {
        self.entries.write().await.remove(&id)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use uplink_core::flight_plan::FlightPlanSubmission;

    use super::*;

    fn plan(sat: &str) -> FlightPlan {
        FlightPlanSubmission {
            flight_plan: serde_json::json!({"name": "commands"}),
            datetime: Some("2025-01-01T12:00:00+01:00".into()),
            gs_id: Some("gs-1".into()),
            sat_name: Some(sat.into()),
        }
        .validate()
        .unwrap()
    }

    fn operator() -> Operator {
        Operator {
            id: "alice".into(),
            role: "operator".into(),
        }
    }

    fn artifact() -> ArtifactRef {
        ArtifactRef("raw".into())
    }

    #[tokio::test]
    async fn inserted_plan_is_visible_to_peek() {
        let registry = PendingRegistry::new();
        let id = registry.insert(plan("SAT-1"), operator(), artifact()).await;

        let peeked = registry.peek(id).await.expect("plan should be pending");
        assert_eq!(peeked.sat_name, "SAT-1");

        // Peeking does not remove.
        assert!(registry.peek(id).await.is_some());
    }

    #[tokio::test]
    async fn unknown_id_is_absent() {
        let registry = PendingRegistry::new();
        assert!(registry.peek(Uuid::new_v4()).await.is_none());
        assert!(registry.take(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn take_succeeds_only_once() {
        let registry = PendingRegistry::new();
        let id = registry.insert(plan("SAT-1"), operator(), artifact()).await;

        let entry = registry.take(id).await.expect("first take succeeds");
        assert_eq!(entry.id, id);
        assert_eq!(entry.submitted_by.id, "alice");
        assert_eq!(entry.artifact, artifact());

        assert!(registry.take(id).await.is_none());
        assert!(registry.peek(id).await.is_none());
    }

    #[tokio::test]
    async fn ids_are_unique() {
        let registry = PendingRegistry::new();
        let mut ids = HashSet::new();
        for i in 0..200 {
            let id = registry
                .insert(plan(&format!("SAT-{i}")), operator(), artifact())
                .await;
            assert!(ids.insert(id), "duplicate id handed out");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_takes_on_same_id_have_one_winner() {
        let registry = Arc::new(PendingRegistry::new());
        let id = registry.insert(plan("SAT-1"), operator(), artifact()).await;

        let mut handles = Vec::new();
        for _ in 0..16 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move { registry.take(id).await.is_some() }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_takes_on_disjoint_ids_all_succeed() {
        let registry = Arc::new(PendingRegistry::new());
        let mut ids = Vec::new();
        for i in 0..8 {
            ids.push(
                registry
                    .insert(plan(&format!("SAT-{i}")), operator(), artifact())
                    .await,
            );
        }

        let handles: Vec<_> = ids
            .into_iter()
            .map(|id| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.take(id).await.is_some() })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap());
        }
    }
}
