use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use uplink_core::error::CoreError;
use uplink_pipeline::PipelineError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`PipelineError`] for domain errors and adds
/// HTTP-specific variants. Implements [`IntoResponse`] to produce consistent
/// JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `uplink_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An error from the submission or decision handlers.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Pipeline(err) => classify_pipeline_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => internal(msg),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, String) {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        CoreError::Internal(msg) => internal(msg),
    }
}

/// Classify a pipeline error into an HTTP status, error code, and message.
///
/// - Domain errors map like [`CoreError`].
/// - Compiler failures map to 502: the plan is fine, the compiler is not.
/// - Artifact store failures map to 500 with a sanitized message.
/// - A closed dispatch queue means the server is shutting down: 503.
fn classify_pipeline_error(err: &PipelineError) -> (StatusCode, &'static str, String) {
    match err {
        PipelineError::Core(core) => classify_core_error(core),
        PipelineError::Compile(e) => {
            tracing::warn!(error = %e, "Flight plan compilation failed");
            (StatusCode::BAD_GATEWAY, "COMPILE_FAILED", e.to_string())
        }
        PipelineError::Artifact(e) => internal(&e.to_string()),
        PipelineError::QueueClosed => (
            StatusCode::SERVICE_UNAVAILABLE,
            "UNAVAILABLE",
            "Dispatch is not accepting new work".to_string(),
        ),
    }
}

fn internal(msg: &str) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %msg, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}
