//! Job submission: validate, normalize, persist, enqueue.

use std::sync::Arc;

use base64::Engine;
use loopgen_core::config::PipelineConfig;
use loopgen_core::error::CoreError;
use loopgen_core::imaging::{self, CONTENT_TYPE_PNG};
use loopgen_core::job::{JobDescriptor, JobId};
use loopgen_core::keys;
use loopgen_queue::{JobQueue, QueueError};
use loopgen_storage::{BlobStore, StorageError};
use serde::Deserialize;

/// Errors from the submission stage.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    /// Authorization or validation failure (user-visible, no retry).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The input blob could not be persisted. Nothing was enqueued.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The job descriptor could not be enqueued. The input blob is
    /// already persisted; re-submitting allocates a fresh job.
    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// One submission request, as received from the HTTP surface.
///
/// Fields default to empty when absent so that a missing field
/// surfaces as a validation failure, not a deserialization error.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub image_base64: String,
    #[serde(default)]
    pub access_token: String,
}

/// Accepts animation requests and feeds the generation queue.
pub struct SubmissionStage {
    store: Arc<dyn BlobStore>,
    queue: Arc<dyn JobQueue>,
    config: Arc<PipelineConfig>,
}

impl SubmissionStage {
    pub fn new(
        store: Arc<dyn BlobStore>,
        queue: Arc<dyn JobQueue>,
        config: Arc<PipelineConfig>,
    ) -> Self {
        Self {
            store,
            queue,
            config,
        }
    }

    /// Process one submission.
    ///
    /// Checks the access token, validates and normalizes the image
    /// (aspect-preserving downsample when a dimension exceeds the
    /// configured maximum), then persists the input blob and — only
    /// after the write succeeded — enqueues the job descriptor.
    ///
    /// Returns the allocated [`JobId`] on success.
    pub async fn submit(&self, request: SubmitRequest) -> Result<JobId, SubmissionError> {
        if request.access_token != self.config.access_token {
            return Err(CoreError::Unauthorized("Invalid access token".into()).into());
        }

        if request.prompt.trim().is_empty() || request.image_base64.is_empty() {
            return Err(CoreError::Validation(
                "Missing prompt or image_base64 in request body".into(),
            )
            .into());
        }

        let image_bytes = base64::engine::general_purpose::STANDARD
            .decode(&request.image_base64)
            .map_err(|e| CoreError::Validation(format!("image_base64 is not valid base64: {e}")))?;

        let image = imaging::decode(&image_bytes)?;
        let normalized = imaging::shrink_to_fit(image, self.config.max_image_dim);
        let png = imaging::encode_png(&normalized.to_rgb8())?;

        let job_id = JobId::new();
        let image_key = keys::input_image(&job_id);

        // Persist before enqueue: a queued job must always find its
        // source blob.
        self.store.put(&image_key, png, CONTENT_TYPE_PNG).await?;

        let descriptor = JobDescriptor {
            job_id,
            prompt: request.prompt,
            image_key,
        };
        self.queue.send(&descriptor).await?;

        tracing::info!(%job_id, "Job submitted");
        Ok(job_id)
    }
}
