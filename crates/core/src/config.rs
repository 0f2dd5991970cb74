//! Pipeline configuration loaded from environment variables.

/// Configuration for the generation pipeline.
///
/// Secrets (`STABILITY_API_KEY`, `ACCESS_TOKEN`) and the bucket name
/// have no defaults and must be set; everything else falls back to a
/// value suitable for local development.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Bearer credential for the Stability image API.
    pub stability_api_key: String,
    /// Number of generated rounds per job (frame indices 1..=N).
    pub num_frames: u32,
    /// Image-to-image transform strength, passed through verbatim.
    pub strength: String,
    /// Model identifier passed to the generation API.
    pub model: String,
    /// Blob store bucket holding inputs, frames, and final artifacts.
    pub bucket: String,
    /// Per-frame display duration of the final animation, in ms.
    pub frame_duration_ms: u32,
    /// Shared secret required on every submission.
    pub access_token: String,
    /// Maximum dimension of a stored input image; larger uploads are
    /// downsampled preserving aspect ratio.
    pub max_image_dim: u32,
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var             | Default              |
    /// |---------------------|----------------------|
    /// | `STABILITY_API_KEY` | *(required)*         |
    /// | `NUM_FRAMES`        | `5`                  |
    /// | `STRENGTH`          | `0.6`                |
    /// | `MODEL`             | `sd3.5-large-turbo`  |
    /// | `S3_BUCKET`         | *(required)*         |
    /// | `FRAME_DURATION_MS` | `100`                |
    /// | `ACCESS_TOKEN`      | *(required)*         |
    /// | `MAX_IMAGE_DIM`     | `1024`               |
    pub fn from_env() -> Self {
        let stability_api_key =
            std::env::var("STABILITY_API_KEY").expect("STABILITY_API_KEY must be set");

        let num_frames: u32 = std::env::var("NUM_FRAMES")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("NUM_FRAMES must be a valid u32");

        let strength = std::env::var("STRENGTH").unwrap_or_else(|_| "0.6".into());

        let model = std::env::var("MODEL").unwrap_or_else(|_| "sd3.5-large-turbo".into());

        let bucket = std::env::var("S3_BUCKET").expect("S3_BUCKET must be set");

        let frame_duration_ms: u32 = std::env::var("FRAME_DURATION_MS")
            .unwrap_or_else(|_| "100".into())
            .parse()
            .expect("FRAME_DURATION_MS must be a valid u32");

        let access_token = std::env::var("ACCESS_TOKEN").expect("ACCESS_TOKEN must be set");

        let max_image_dim: u32 = std::env::var("MAX_IMAGE_DIM")
            .unwrap_or_else(|_| "1024".into())
            .parse()
            .expect("MAX_IMAGE_DIM must be a valid u32");

        Self {
            stability_api_key,
            num_frames,
            strength,
            model,
            bucket,
            frame_duration_ms,
            access_token,
            max_image_dim,
        }
    }
}
