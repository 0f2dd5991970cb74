//! The three stages of the animation pipeline.
//!
//! Submission persists the source image and enqueues a job;
//! generation drives the sequential transform loop and emits a
//! completion event; assembly composes the persisted frames into the
//! final looping GIF. Stages hold their collaborators as
//! constructor-injected `Arc<dyn …>` capabilities and communicate
//! only through durable storage, the queue, and the event channel —
//! each stage tolerates being invoked zero, one, or many times for
//! the same logical event.

pub mod assembly;
pub mod generation;
pub mod submission;

pub use assembly::{AssemblyError, AssemblyStage};
pub use generation::{GenerationError, GenerationOutcome, GenerationStage, JobProgress};
pub use submission::{SubmissionError, SubmissionStage, SubmitRequest};
