//! Shared fixtures for the HTTP API tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use image::{Rgb, RgbImage};
use loopgen_api::config::ServerConfig;
use loopgen_api::routes::build_router;
use loopgen_api::state::AppState;
use loopgen_core::config::PipelineConfig;
use loopgen_core::imaging;
use loopgen_core::job::JobDescriptor;
use loopgen_pipeline::SubmissionStage;
use loopgen_queue::{JobQueue, QueueError};
use loopgen_storage::{BlobStore, MemoryBlobStore};
use tower::ServiceExt;

/// Shared-secret token accepted by the test app.
pub const TEST_TOKEN: &str = "secret-token";

/// Origin allowed to fetch assembly results in the test app.
pub const TEST_ORIGIN: &str = "http://localhost:8000";

/// [`JobQueue`] fake that records every sent descriptor.
#[derive(Default)]
pub struct RecordingQueue {
    sent: Mutex<Vec<JobDescriptor>>,
}

impl RecordingQueue {
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

/// The router under test plus handles to its fakes.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryBlobStore>,
    pub queue: Arc<RecordingQueue>,
}

/// Build an app wired to in-memory fakes.
pub fn build_test_app() -> TestApp {
    let store = Arc::new(MemoryBlobStore::new());
    let queue = Arc::new(RecordingQueue::default());

    let pipeline_config = Arc::new(PipelineConfig {
        stability_api_key: "test-key".into(),
        num_frames: 2,
        strength: "0.6".into(),
        model: "sd3.5-large-turbo".into(),
        bucket: "test-bucket".into(),
        frame_duration_ms: 100,
        access_token: TEST_TOKEN.into(),
        max_image_dim: 1024,
    });

    let store_dyn: Arc<dyn BlobStore> = Arc::clone(&store) as Arc<dyn BlobStore>;
    let submission = Arc::new(SubmissionStage::new(
        Arc::clone(&store_dyn),
        Arc::clone(&queue) as Arc<dyn JobQueue>,
        pipeline_config,
    ));

    let server_config = ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        cors_origins: vec![TEST_ORIGIN.into()],
        request_timeout_secs: 30,
    };

    let state = AppState {
        submission,
        store: store_dyn,
    };

    TestApp {
        router: build_router(state, &server_config),
        store,
        queue,
    }
}

/// PNG bytes of a solid-color image.
pub fn solid_png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    imaging::encode_png(&RgbImage::from_pixel(width, height, Rgb(rgb))).unwrap()
}

/// Issue a GET request against the app.
pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Issue a POST request with a JSON body against the app.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Collect a response body as a UTF-8 string.
pub async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Assert a response carries the standard JSON error shape.
pub async fn assert_error_body(response: Response, status: StatusCode, code: &str) {
    assert_eq!(response.status(), status);
    let json = body_json(response).await;
    assert_eq!(json["code"], code);
    assert!(json["error"].is_string());
}
