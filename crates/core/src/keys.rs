//! Blob key layout for the job namespace.
//!
//! These strings are an external contract shared with the frontend
//! and any retention tooling; do not change them.

use crate::job::JobId;

/// Key of the normalized source image for a job.
pub fn input_image(job_id: &JobId) -> String {
    format!("inputs/{job_id}/input.png")
}

/// Key of generated frame `index` (1-indexed) for a job.
pub fn frame(job_id: &JobId, index: u32) -> String {
    format!("outputs/{job_id}/frame_{index}.png")
}

/// Key of the final composed animation for a job.
pub fn animation(job_id: &JobId) -> String {
    format!("outputs/{job_id}/final.gif")
}
