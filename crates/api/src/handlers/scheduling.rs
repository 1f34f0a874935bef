//! Handlers for flight-plan submission and approval.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use uplink_core::flight_plan::FlightPlanSubmission;
use uplink_core::types::FpId;
use uplink_pipeline::Decision;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub const MSG_SCHEDULED_FOR_APPROVAL: &str = "Flight plan scheduled for approval";

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub message: &'static str,
    pub fp_id: FpId,
}

#[derive(Debug, Serialize)]
pub struct DecisionResponse {
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ApproveParams {
    pub approved: bool,
}

/// POST /api/v1/scheduling/save
///
/// Validate a flight plan and file it for approval. Returns the identifier
/// an operator later approves or rejects.
pub async fn save_flight_plan(
    auth: AuthUser,
    State(state): State<AppState>,
    input: Result<Json<FlightPlanSubmission>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(submission) = input.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let fp_id = state.submissions.submit(submission, &auth.operator()).await?;

    Ok((
        StatusCode::CREATED,
        Json(SaveResponse {
            message: MSG_SCHEDULED_FOR_APPROVAL,
            fp_id,
        }),
    ))
}

/// POST /api/v1/scheduling/approve/{fp_id}?approved=<bool>
///
/// Approval answers 202 once the plan is compiled and queued; transmission
/// happens in the background. Rejection answers 200.
pub async fn approve_flight_plan(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(fp_id): Path<String>,
    params: Result<Query<ApproveParams>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let fp_id: FpId = fp_id
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid flight plan id: {fp_id}")))?;
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let decision = state
        .decisions
        .decide(fp_id, params.approved, &auth.operator())
        .await?;

    let status = match decision {
        Decision::Approved => StatusCode::ACCEPTED,
        Decision::Rejected => StatusCode::OK,
    };

    Ok((
        status,
        Json(DecisionResponse {
            message: decision.message(),
        }),
    ))
}
