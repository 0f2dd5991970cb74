//! Job identity and the queue-borne job descriptor.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Globally unique identifier of one animation job.
///
/// Serialized as the canonical hyphenated UUID string everywhere it
/// appears (queue payloads, events, blob keys, HTTP bodies).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Allocate a fresh random (v4) job id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a job id from its string form.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| CoreError::Validation(format!("Invalid job id '{s}'")))
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The unit of work handed from submission to frame generation.
///
/// JSON-encoded on the wire. Immutable once created: downstream
/// stages reference it but never mutate it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDescriptor {
    /// The job this descriptor drives.
    pub job_id: JobId,
    /// User-supplied animation prompt.
    pub prompt: String,
    /// Blob key of the normalized source image.
    pub image_key: String,
}
