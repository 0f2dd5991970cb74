//! Assembly: compose persisted frames into the final looping GIF.

use std::sync::Arc;

use loopgen_core::config::PipelineConfig;
use loopgen_core::error::CoreError;
use loopgen_core::imaging::{self, CONTENT_TYPE_GIF};
use loopgen_core::job::JobId;
use loopgen_core::keys;
use loopgen_storage::{BlobStore, StorageError};

/// Errors from the assembly stage.
#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    /// A frame blob is missing — generation has not finished (or
    /// failed earlier). Retryable once it actually completes.
    #[error("Missing frame blob: {key}")]
    MissingFrame { key: String },

    /// Blob read/write failure other than a missing key.
    #[error(transparent)]
    Storage(StorageError),

    /// A frame could not be decoded, or the GIF could not be encoded.
    #[error(transparent)]
    Image(#[from] CoreError),
}

impl From<StorageError> for AssemblyError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => AssemblyError::MissingFrame { key },
            other => AssemblyError::Storage(other),
        }
    }
}

/// Composes the ordered frame sequence into the final artifact.
pub struct AssemblyStage {
    store: Arc<dyn BlobStore>,
    config: Arc<PipelineConfig>,
}

impl AssemblyStage {
    pub fn new(store: Arc<dyn BlobStore>, config: Arc<PipelineConfig>) -> Self {
        Self { store, config }
    }

    /// Assemble the final GIF for `job_id` and return its URL.
    ///
    /// Reads frame 0 (the original input) plus frames 1..=N in index
    /// order, composes an infinitely-looping GIF with the configured
    /// per-frame duration, and persists it at the documented key.
    /// Idempotent: duplicate invocations overwrite the artifact with
    /// identical bytes.
    pub async fn assemble(&self, job_id: JobId) -> Result<String, AssemblyError> {
        let total = self.config.num_frames;
        let mut frames = Vec::with_capacity(total as usize + 1);

        let input_bytes = self.store.get(&keys::input_image(&job_id)).await?;
        frames.push(imaging::decode(&input_bytes)?.to_rgb8());

        for index in 1..=total {
            let bytes = self.store.get(&keys::frame(&job_id, index)).await?;
            frames.push(imaging::decode(&bytes)?.to_rgb8());
        }

        let gif = imaging::encode_gif(&frames, self.config.frame_duration_ms)?;

        let gif_key = keys::animation(&job_id);
        self.store.put(&gif_key, gif, CONTENT_TYPE_GIF).await?;

        let url = self.store.public_url(&gif_key);
        tracing::info!(%job_id, frame_count = frames.len(), %url, "Animation assembled");
        Ok(url)
    }
}
