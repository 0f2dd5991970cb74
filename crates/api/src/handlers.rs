//! HTTP handlers for the job endpoints.

use axum::extract::{Path, State};
use axum::Json;
use loopgen_core::job::JobId;
use loopgen_core::keys;
use loopgen_pipeline::SubmitRequest;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /jobs
///
/// Accepts `{prompt, image_base64, access_token}` and returns the
/// allocated `{job_id}`.
pub async fn submit(
    State(state): State<AppState>,
    Json(request): Json<SubmitRequest>,
) -> AppResult<Json<Value>> {
    let job_id = state.submission.submit(request).await?;
    Ok(Json(json!({ "job_id": job_id })))
}

/// GET /jobs/{job_id}/animation
///
/// Returns the retrievable URL of the final artifact once assembly
/// has persisted it; 404 until then (retry after generation
/// completes).
pub async fn animation(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<String> {
    let job_id = JobId::parse(&job_id)?;
    let gif_key = keys::animation(&job_id);

    if state.store.exists(&gif_key).await? {
        Ok(state.store.public_url(&gif_key))
    } else {
        Err(AppError::NotFound(format!(
            "Animation for job {job_id} is not ready"
        )))
    }
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
