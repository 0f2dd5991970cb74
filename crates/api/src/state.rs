//! Shared application state for HTTP handlers.

use std::sync::Arc;

use loopgen_pipeline::SubmissionStage;
use loopgen_storage::BlobStore;

/// State injected into every handler.
#[derive(Clone)]
pub struct AppState {
    /// Submission stage (validates, persists, enqueues).
    pub submission: Arc<SubmissionStage>,
    /// Blob store, used to probe for finished artifacts.
    pub store: Arc<dyn BlobStore>,
}
