//! Application-level error type for HTTP handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use loopgen_core::error::CoreError;
use loopgen_pipeline::SubmissionError;
use loopgen_storage::StorageError;
use serde_json::json;

/// Error type for HTTP handlers.
///
/// Wraps the domain and stage errors and implements [`IntoResponse`]
/// to produce consistent JSON error bodies. Internal failure detail
/// is logged, never leaked to the client.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `loopgen_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A submission stage failure.
    #[error(transparent)]
    Submission(#[from] SubmissionError),

    /// A blob storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The requested resource does not exist (yet).
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Submission(err) => match err {
                SubmissionError::Core(core) => classify_core_error(core),
                SubmissionError::Storage(e) => {
                    tracing::error!(error = %e, "Submission storage failure");
                    internal()
                }
                SubmissionError::Queue(e) => {
                    tracing::error!(error = %e, "Submission queue failure");
                    internal()
                }
            },
            AppError::Storage(e) => {
                tracing::error!(error = %e, "Storage failure");
                internal()
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Map a [`CoreError`] to an HTTP status, error code, and message.
fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, String) {
    match err {
        CoreError::Unauthorized(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Image(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            internal()
        }
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}
