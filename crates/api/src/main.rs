use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use loopgen_api::config::ServerConfig;
use loopgen_api::routes::build_router;
use loopgen_api::state::AppState;
use loopgen_api::workers;
use loopgen_core::config::PipelineConfig;
use loopgen_events::EventBus;
use loopgen_pipeline::{AssemblyStage, GenerationStage, SubmissionStage};
use loopgen_stability::StabilityClient;
use loopgen_storage::{BlobStore, S3BlobStore};

/// Buffered job descriptors before submission backpressures.
const QUEUE_CAPACITY: usize = 256;

/// Delivery attempts per job before the queue drops it.
const MAX_DELIVERY_ATTEMPTS: u32 = 3;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loopgen=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let server_config = ServerConfig::from_env();
    let pipeline_config = Arc::new(PipelineConfig::from_env());
    tracing::info!(
        host = %server_config.host,
        port = %server_config.port,
        num_frames = pipeline_config.num_frames,
        bucket = %pipeline_config.bucket,
        "Loaded configuration"
    );

    // --- External collaborators ---
    let store: Arc<dyn BlobStore> =
        Arc::new(S3BlobStore::from_env(pipeline_config.bucket.clone()).await);
    let transformer = Arc::new(StabilityClient::new(&pipeline_config));
    let (queue, consumer) = loopgen_queue::channel(QUEUE_CAPACITY, MAX_DELIVERY_ATTEMPTS);
    let event_bus = Arc::new(EventBus::default());

    // --- Stages ---
    let submission = Arc::new(SubmissionStage::new(
        Arc::clone(&store),
        Arc::new(queue),
        Arc::clone(&pipeline_config),
    ));
    let generation = Arc::new(GenerationStage::new(
        Arc::clone(&store),
        transformer,
        Arc::clone(&event_bus) as Arc<dyn loopgen_events::EventSink>,
        Arc::clone(&pipeline_config),
    ));
    let assembly = Arc::new(AssemblyStage::new(
        Arc::clone(&store),
        Arc::clone(&pipeline_config),
    ));

    // --- Background workers ---
    let generation_handle = workers::spawn_generation_worker(consumer, generation);
    let assembly_handle = workers::spawn_assembly_worker(event_bus.subscribe(), assembly);
    tracing::info!("Pipeline workers started (generation, assembly)");

    // --- Router ---
    let state = AppState {
        submission,
        store,
    };
    let app = build_router(state, &server_config);

    // --- Start server ---
    let addr = SocketAddr::new(
        server_config.host.parse().expect("Invalid HOST address"),
        server_config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // Submission is gone, so the queue's producer side is dropped;
    // the generation worker drains outstanding jobs and stops. The
    // event bus closes once its last sender drops, stopping assembly.
    drop(event_bus);
    let _ = generation_handle.await;
    let _ = assembly_handle.await;

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
