//! Background workers hosted next to the HTTP server.
//!
//! One task drains the job queue into the generation stage; one
//! subscribes to the event bus and drives assembly. The platform
//! concurrency unit is the delivery, never anything inside a job:
//! rounds within one generation invocation stay strictly sequential.

use std::sync::Arc;

use loopgen_events::CompletionEvent;
use loopgen_pipeline::{AssemblyStage, GenerationStage};
use loopgen_queue::QueueConsumer;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Spawn the generation worker.
///
/// Each queue delivery becomes one `GenerationStage::process`
/// invocation; a failed invocation propagates to the consumer, which
/// re-delivers up to its attempt bound.
pub fn spawn_generation_worker(
    consumer: QueueConsumer,
    stage: Arc<GenerationStage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        consumer
            .run(move |job| {
                let stage = Arc::clone(&stage);
                async move { stage.process(&job).await.map(|_| ()) }
            })
            .await;
        tracing::info!("Generation worker stopped");
    })
}

/// Spawn the assembly worker.
///
/// A failed assembly (typically a not-yet-generated frame) is logged
/// and left for the next delivery of the event; assembly is
/// idempotent so duplicates are harmless.
pub fn spawn_assembly_worker(
    mut events: broadcast::Receiver<CompletionEvent>,
    stage: Arc<AssemblyStage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match stage.assemble(event.job_id).await {
                    Ok(url) => {
                        tracing::info!(job_id = %event.job_id, %url, "Animation ready");
                    }
                    Err(e) => {
                        tracing::error!(
                            job_id = %event.job_id,
                            error = %e,
                            "Assembly failed, awaiting re-trigger"
                        );
                    }
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Assembly worker lagged behind the event bus");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::info!("Assembly worker stopped");
    })
}
