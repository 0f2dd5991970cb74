//! Frame generation: the sequential transform loop.
//!
//! One invocation handles one queued job descriptor end to end. The
//! invocation either fully succeeds (all rounds persisted, one
//! completion event emitted) or fails with no partial credit — the
//! queue's redelivery policy re-drives the whole loop from the
//! progress probe. Rounds are strictly sequential: round `i`
//! transforms the canonical persisted bytes of frame `i-1`, never an
//! in-memory value that could diverge across retries.

use std::sync::Arc;

use loopgen_core::config::PipelineConfig;
use loopgen_core::error::CoreError;
use loopgen_core::imaging::{self, CONTENT_TYPE_PNG};
use loopgen_core::job::{JobDescriptor, JobId};
use loopgen_core::keys;
use loopgen_events::{CompletionEvent, EventError, EventSink};
use loopgen_stability::{FrameTransformer, TransformError};
use loopgen_storage::{BlobStore, StorageError};

/// Fixed preamble of every round instruction.
const PROMPT_BASE: &str = "I would like to generate frames of a gif based on the provided image. Focus on making changes on the subject declared in the prompt and leaving the background untouched. Please generate frame";

/// Errors from the generation stage. All of them are fatal to the
/// current invocation and propagate to the queue for redelivery.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Blob read/write/probe failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The external generation API returned a failure.
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// A frame could not be decoded or re-encoded.
    #[error(transparent)]
    Image(#[from] CoreError),

    /// The completion event could not be emitted.
    #[error(transparent)]
    Event(#[from] EventError),
}

/// Terminal outcome of one successful generation invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// All rounds ran and the completion event was emitted.
    Generated,
    /// The progress probe found the job already complete; no rounds
    /// ran and no external-API calls were made.
    AlreadyProcessed,
}

/// Job progress derived from which frame blobs exist.
///
/// The authoritative read is the *last* expected frame: its presence
/// proves the whole chain was persisted, since frames are written
/// strictly in order. Probing only frame 1 would wrongly skip a job
/// that crashed mid-loop on a later frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobProgress {
    NotStarted,
    /// Some frames exist but the last one does not; a prior run
    /// failed partway. The loop re-runs from round 1 (writes are
    /// idempotent).
    InProgress,
    Completed,
}

impl JobProgress {
    /// Probe the blob namespace of `job_id`.
    pub async fn probe(
        store: &dyn BlobStore,
        job_id: &JobId,
        num_frames: u32,
    ) -> Result<Self, StorageError> {
        if store.exists(&keys::frame(job_id, num_frames)).await? {
            return Ok(Self::Completed);
        }
        if store.exists(&keys::frame(job_id, 1)).await? {
            return Ok(Self::InProgress);
        }
        Ok(Self::NotStarted)
    }
}

/// Drives the transform loop for one queued job at a time.
pub struct GenerationStage {
    store: Arc<dyn BlobStore>,
    transformer: Arc<dyn FrameTransformer>,
    events: Arc<dyn EventSink>,
    config: Arc<PipelineConfig>,
}

impl GenerationStage {
    pub fn new(
        store: Arc<dyn BlobStore>,
        transformer: Arc<dyn FrameTransformer>,
        events: Arc<dyn EventSink>,
        config: Arc<PipelineConfig>,
    ) -> Self {
        Self {
            store,
            transformer,
            events,
            config,
        }
    }

    /// Process one job descriptor.
    ///
    /// Safe to invoke repeatedly for the same descriptor: a completed
    /// job short-circuits before any external-API call, and frame
    /// writes are idempotent.
    pub async fn process(
        &self,
        job: &JobDescriptor,
    ) -> Result<GenerationOutcome, GenerationError> {
        let job_id = job.job_id;
        let total = self.config.num_frames;

        match JobProgress::probe(self.store.as_ref(), &job_id, total).await? {
            JobProgress::Completed => {
                tracing::info!(%job_id, "Job already processed, skipping");
                return Ok(GenerationOutcome::AlreadyProcessed);
            }
            JobProgress::InProgress => {
                tracing::info!(%job_id, "Partial frames found, regenerating from round 1");
            }
            JobProgress::NotStarted => {}
        }

        let source = self.store.get(&job.image_key).await?;
        let original = imaging::decode(&source)?;
        // Every frame must match the source dimensions, whatever size
        // the API returns.
        let (width, height) = (original.width(), original.height());

        let mut current = source;
        for round in 1..=total {
            let instruction = round_instruction(round, total, &job.prompt);
            tracing::info!(%job_id, round, total, "Requesting frame transformation");

            let generated = self.transformer.transform(&current, &instruction).await?;

            let decoded = imaging::decode(&generated)?;
            let normalized = imaging::normalize_to(&decoded, width, height);
            let encoded = imaging::encode_png(&normalized)?;

            let frame_key = keys::frame(&job_id, round);
            self.store
                .put(&frame_key, encoded.clone(), CONTENT_TYPE_PNG)
                .await?;

            // Carry forward the canonical persisted bytes, not the raw
            // API response: a replay from storage reproduces the chain.
            current = encoded;
        }

        self.events.emit(CompletionEvent::new(job_id)).await?;
        tracing::info!(%job_id, total, "All frames generated, completion event emitted");
        Ok(GenerationOutcome::Generated)
    }
}

/// Build the instruction string for one round.
fn round_instruction(round: u32, total: u32, prompt: &str) -> String {
    format!("{PROMPT_BASE} {round} of {total} according to the following prompt: {prompt}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_embeds_round_total_and_prompt() {
        let s = round_instruction(2, 5, "a cat waving");
        assert!(s.starts_with(PROMPT_BASE));
        assert!(s.contains(" 2 of 5 "));
        assert!(s.ends_with("according to the following prompt: a cat waving"));
    }
}
