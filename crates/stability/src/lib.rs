//! Client for the Stability image-to-image API.
//!
//! [`FrameTransformer`] is the seam the generation stage depends on;
//! [`StabilityClient`] implements it with a multipart POST against
//! `stable-image/generate/sd3`. Any non-2xx response is a hard
//! failure carrying the status and body for diagnosis.

use std::time::Duration;

use loopgen_core::config::PipelineConfig;

/// Production endpoint of the image-to-image generation API.
pub const DEFAULT_API_URL: &str = "https://api.stability.ai/v2beta/stable-image/generate/sd3";

/// HTTP request timeout for a single transform call. Generation is
/// slow; this bounds a hung connection, not normal latency.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Errors from the generation API layer.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API returned a non-2xx status code.
    #[error("Generation API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

/// Capability for one image-to-image transformation round.
#[async_trait::async_trait]
pub trait FrameTransformer: Send + Sync {
    /// Transform `image_png` according to `instruction`, returning
    /// the generated image bytes.
    async fn transform(&self, image_png: &[u8], instruction: &str)
        -> Result<Vec<u8>, TransformError>;
}

/// HTTP client for the Stability generation endpoint.
pub struct StabilityClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    strength: String,
    model: String,
}

impl StabilityClient {
    /// Create a client from pipeline configuration, targeting the
    /// production endpoint.
    pub fn new(config: &PipelineConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            client,
            api_url: DEFAULT_API_URL.to_string(),
            api_key: config.stability_api_key.clone(),
            strength: config.strength.clone(),
            model: config.model.clone(),
        }
    }

    /// Create a client with an explicit endpoint URL (used by tests
    /// pointing at a local stub server).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

#[async_trait::async_trait]
impl FrameTransformer for StabilityClient {
    async fn transform(
        &self,
        image_png: &[u8],
        instruction: &str,
    ) -> Result<Vec<u8>, TransformError> {
        let image_part = reqwest::multipart::Part::bytes(image_png.to_vec())
            .file_name("input.png")
            .mime_str("image/png")
            .expect("static mime type is valid");

        let form = reqwest::multipart::Form::new()
            .part("image", image_part)
            .text("prompt", instruction.to_string())
            .text("strength", self.strength.clone())
            .text("mode", "image-to-image")
            .text("output_format", "png")
            .text("model", self.model.clone());

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, "image/*")
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(response.bytes().await?.to_vec())
        } else {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), %body, "Image generation failed");
            Err(TransformError::Api {
                status: status.as_u16(),
                body,
            })
        }
    }
}
