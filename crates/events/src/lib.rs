//! Completion-event channel between frame generation and assembly.
//!
//! [`EventBus`] is a `tokio::sync::broadcast` hub shared via
//! `Arc<EventBus>`; the generation stage publishes through the
//! [`EventSink`] seam so tests can substitute a recording fake.
//! Delivery is at-least-once from the consumer's point of view:
//! assembly must tolerate duplicates (it does — its output is
//! deterministic and overwrites idempotently).

use chrono::{DateTime, Utc};
use loopgen_core::job::JobId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Event-family tag of completion events.
pub const EVENT_SOURCE: &str = "gif.frames.complete";

/// Detail-type tag of completion events.
pub const EVENT_DETAIL_TYPE: &str = "GIFGeneration";

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// Errors from the event channel.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// The event could not be handed to the channel.
    #[error("Event publish failed: {0}")]
    Publish(String),
}

/// Signal that every frame of a job has been generated and persisted.
///
/// Emitted exactly once per successful generation run; consumed by
/// the assembly stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionEvent {
    /// Event-family tag, always [`EVENT_SOURCE`].
    pub source: String,
    /// Detail-type tag, always [`EVENT_DETAIL_TYPE`].
    pub detail_type: String,
    /// The job whose frames are complete.
    pub job_id: JobId,
    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl CompletionEvent {
    /// Create a completion event for `job_id`.
    pub fn new(job_id: JobId) -> Self {
        Self {
            source: EVENT_SOURCE.to_string(),
            detail_type: EVENT_DETAIL_TYPE.to_string(),
            job_id,
            timestamp: Utc::now(),
        }
    }
}

/// Capability for emitting completion events.
#[async_trait::async_trait]
pub trait EventSink: Send + Sync {
    /// Emit one event to the channel.
    async fn emit(&self, event: CompletionEvent) -> Result<(), EventError>;
}

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers
/// can independently receive every published event.
pub struct EventBus {
    sender: broadcast::Sender<CompletionEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are
    /// dropped and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With zero subscribers the event is silently dropped.
    pub fn publish(&self, event: CompletionEvent) {
        // Ignore the SendError — it only means there are no receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<CompletionEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait::async_trait]
impl EventSink for EventBus {
    async fn emit(&self, event: CompletionEvent) -> Result<(), EventError> {
        self.publish(event);
        Ok(())
    }
}
