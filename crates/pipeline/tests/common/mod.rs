//! Shared fakes and fixtures for the pipeline stage tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use image::{Rgb, RgbImage};
use loopgen_core::config::PipelineConfig;
use loopgen_core::imaging;
use loopgen_core::job::JobDescriptor;
use loopgen_events::{CompletionEvent, EventError, EventSink};
use loopgen_queue::{JobQueue, QueueError};
use loopgen_stability::{FrameTransformer, TransformError};

/// Shared-secret token accepted by [`test_config`].
pub const TEST_TOKEN: &str = "secret-token";

/// Pipeline configuration for tests.
pub fn test_config(num_frames: u32) -> Arc<PipelineConfig> {
    Arc::new(PipelineConfig {
        stability_api_key: "test-key".into(),
        num_frames,
        strength: "0.6".into(),
        model: "sd3.5-large-turbo".into(),
        bucket: "test-bucket".into(),
        frame_duration_ms: 100,
        access_token: TEST_TOKEN.into(),
        max_image_dim: 1024,
    })
}

/// PNG bytes of a solid-color image.
pub fn solid_png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    imaging::encode_png(&RgbImage::from_pixel(width, height, Rgb(rgb))).unwrap()
}

/// Red channel of pixel (0,0) of a PNG.
pub fn red_at_origin(png: &[u8]) -> u8 {
    image::load_from_memory(png).unwrap().to_rgb8().get_pixel(0, 0)[0]
}

/// Pixel dimensions of a PNG.
pub fn png_dimensions(png: &[u8]) -> (u32, u32) {
    let img = image::load_from_memory(png).unwrap();
    (img.width(), img.height())
}

// ---------------------------------------------------------------------------
// RecordingQueue
// ---------------------------------------------------------------------------

/// [`JobQueue`] fake that records every sent descriptor.
#[derive(Default)]
pub struct RecordingQueue {
    sent: Mutex<Vec<JobDescriptor>>,
}

impl RecordingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<JobDescriptor> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl JobQueue for RecordingQueue {
    async fn send(&self, job: &JobDescriptor) -> Result<(), QueueError> {
        self.sent.lock().unwrap().push(job.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RecordingSink
// ---------------------------------------------------------------------------

/// [`EventSink`] fake that records every emitted event.
#[derive(Default)]
pub struct RecordingSink {
    emitted: Mutex<Vec<CompletionEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emitted(&self) -> Vec<CompletionEvent> {
        self.emitted.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl EventSink for RecordingSink {
    async fn emit(&self, event: CompletionEvent) -> Result<(), EventError> {
        self.emitted.lock().unwrap().push(event);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockTransformer
// ---------------------------------------------------------------------------

/// Deterministic [`FrameTransformer`] fake.
///
/// Each call reads the red channel at pixel (0,0) of its input and
/// returns a solid image of `out_size` with that value plus 10 —
/// so a chained sequence of calls is visible in the output pixels
/// (0 → 10 → 20 → …), and `out_size` can deliberately mismatch the
/// source to exercise the dimension invariant.
pub struct MockTransformer {
    out_size: (u32, u32),
    fail_on_call: Option<u32>,
    inputs: Mutex<Vec<Vec<u8>>>,
}

impl MockTransformer {
    pub fn new(out_size: (u32, u32)) -> Self {
        Self {
            out_size,
            fail_on_call: None,
            inputs: Mutex::new(Vec::new()),
        }
    }

    /// Fail the `n`-th call (1-based) with an API error.
    pub fn failing_on_call(mut self, n: u32) -> Self {
        self.fail_on_call = Some(n);
        self
    }

    /// Exact input bytes of every call so far, in call order.
    pub fn inputs(&self) -> Vec<Vec<u8>> {
        self.inputs.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.inputs.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl FrameTransformer for MockTransformer {
    async fn transform(
        &self,
        image_png: &[u8],
        _instruction: &str,
    ) -> Result<Vec<u8>, TransformError> {
        let call = {
            let mut inputs = self.inputs.lock().unwrap();
            inputs.push(image_png.to_vec());
            inputs.len() as u32
        };

        if self.fail_on_call == Some(call) {
            return Err(TransformError::Api {
                status: 500,
                body: "injected failure".into(),
            });
        }

        let red = red_at_origin(image_png);
        Ok(solid_png(
            self.out_size.0,
            self.out_size.1,
            [red.saturating_add(10), 0, 0],
        ))
    }
}
