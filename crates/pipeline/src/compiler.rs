//! Flight-plan compilers.
//!
//! [`HttpCompiler`] delegates to an external compiler service.
//! [`PassthroughCompiler`] is used when no service is configured: the command
//! body is forwarded unchanged and stored as the compiled artifact.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uplink_core::types::Operator;

use crate::collaborators::{ArtifactRef, ArtifactStore, CompiledPlan, Compiler};
use crate::error::CompileError;

/// Name under which compiled plans are stored.
const COMPILED_ARTIFACT_NAME: &str = "compiled_plan.json";

// ---------------------------------------------------------------------------
// Passthrough
// ---------------------------------------------------------------------------

pub struct PassthroughCompiler {
    store: Arc<dyn ArtifactStore>,
}

impl PassthroughCompiler {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Compiler for PassthroughCompiler {
    async fn compile(
        &self,
        body: &serde_json::Value,
        requester: &Operator,
    ) -> Result<CompiledPlan, CompileError> {
        let bytes = serde_json::to_vec(body).map_err(crate::error::ArtifactError::from)?;
        let artifact = self
            .store
            .put(bytes, COMPILED_ARTIFACT_NAME)
            .await?
            .into_ref();

        tracing::debug!(
            artifact = %artifact,
            requested_by = %requester.id,
            "Flight plan passed through compiler"
        );

        Ok(CompiledPlan {
            compiled: body.clone(),
            artifact,
        })
    }
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct CompileRequest<'a> {
    flight_plan: &'a serde_json::Value,
    requested_by: &'a Operator,
}

#[derive(Deserialize)]
struct CompileResponse {
    compiled_plan: serde_json::Value,
    artifact_id: String,
}

/// Compiler backed by a remote service.
///
/// POSTs `{ flight_plan, requested_by }` and expects
/// `{ compiled_plan, artifact_id }` back. The service is responsible for
/// storing the compiled artifact.
pub struct HttpCompiler {
    client: reqwest::Client,
    url: String,
}

impl HttpCompiler {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, CompileError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CompileError::Unreachable(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Compiler for HttpCompiler {
    async fn compile(
        &self,
        body: &serde_json::Value,
        requester: &Operator,
    ) -> Result<CompiledPlan, CompileError> {
        let response = self
            .client
            .post(&self.url)
            .json(&CompileRequest {
                flight_plan: body,
                requested_by: requester,
            })
            .send()
            .await
            .map_err(|e| CompileError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(CompileError::Rejected(format!("{status}: {detail}")));
        }

        let parsed: CompileResponse = response
            .json()
            .await
            .map_err(|e| CompileError::InvalidResponse(e.to_string()))?;

        Ok(CompiledPlan {
            compiled: parsed.compiled_plan,
            artifact: ArtifactRef(parsed.artifact_id),
        })
    }
}
