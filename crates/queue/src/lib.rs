//! Work queue delivering job descriptors to the generation stage.
//!
//! [`JobQueue`] is the capability the submission stage needs; the
//! broker behind it is an opaque dependency with at-least-once
//! delivery. [`InProcessQueue`] / [`QueueConsumer`] implement it over
//! a `tokio::sync::mpsc` channel, re-delivering a message when its
//! handler fails, up to a bounded number of attempts with
//! exponential backoff.
//!
//! Payloads are JSON-encoded [`JobDescriptor`]s, the same wire format
//! an external broker would carry.

use std::future::Future;
use std::time::Duration;

use loopgen_core::job::JobDescriptor;
use tokio::sync::mpsc;

/// Redelivery backoff per failed attempt (1s, 2s, then 4s for every
/// later attempt).
const REDELIVERY_DELAYS_SECS: [u64; 3] = [1, 2, 4];

/// Errors from the queue layer.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// The message could not be handed to the broker.
    #[error("Queue send failed: {0}")]
    Send(String),
}

/// Capability for enqueuing job descriptors.
#[async_trait::async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue one job descriptor for the generation stage.
    async fn send(&self, job: &JobDescriptor) -> Result<(), QueueError>;
}

/// One queued message plus its delivery attempt counter.
#[derive(Debug)]
struct Delivery {
    body: String,
    attempt: u32,
}

/// Producer half of the in-process queue.
pub struct InProcessQueue {
    tx: mpsc::Sender<Delivery>,
}

/// Consumer half of the in-process queue.
///
/// Failed deliveries are kept in an internal pending buffer rather
/// than pushed back onto the channel, so the consumer still drains
/// and stops cleanly once every producer handle is dropped.
pub struct QueueConsumer {
    rx: mpsc::Receiver<Delivery>,
    pending: std::collections::VecDeque<Delivery>,
    max_attempts: u32,
}

/// Create a connected producer/consumer pair.
///
/// `max_attempts` bounds how often one message is delivered before
/// it is dropped (at-least-once, not forever).
pub fn channel(capacity: usize, max_attempts: u32) -> (InProcessQueue, QueueConsumer) {
    let (tx, rx) = mpsc::channel(capacity);
    let consumer = QueueConsumer {
        rx,
        pending: std::collections::VecDeque::new(),
        max_attempts,
    };
    (InProcessQueue { tx }, consumer)
}

#[async_trait::async_trait]
impl JobQueue for InProcessQueue {
    async fn send(&self, job: &JobDescriptor) -> Result<(), QueueError> {
        let body = serde_json::to_string(job)
            .map_err(|e| QueueError::Send(format!("encode descriptor: {e}")))?;
        self.tx
            .send(Delivery { body, attempt: 1 })
            .await
            .map_err(|e| QueueError::Send(format!("channel closed: {e}")))
    }
}

impl QueueConsumer {
    /// Receive the next well-formed job descriptor.
    ///
    /// Malformed payloads are logged and skipped. Returns `None` once
    /// all producer handles are dropped and the channel drains.
    pub async fn recv_job(&mut self) -> Option<(JobDescriptor, u32)> {
        loop {
            let delivery = match self.pending.pop_front() {
                Some(d) => d,
                None => self.rx.recv().await?,
            };
            match serde_json::from_str::<JobDescriptor>(&delivery.body) {
                Ok(job) => return Some((job, delivery.attempt)),
                Err(e) => {
                    tracing::error!(error = %e, "Dropping undecodable queue message");
                }
            }
        }
    }

    /// Drive `handler` for every delivered descriptor until the
    /// channel closes and all redeliveries are exhausted.
    ///
    /// A handler failure re-delivers the message (after backoff)
    /// until `max_attempts` is reached; the message is then dropped
    /// with an error log. The handler sees each redelivery as a fresh
    /// invocation, exactly like an external broker's retry policy.
    pub async fn run<F, Fut, E>(mut self, handler: F)
    where
        F: Fn(JobDescriptor) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: std::fmt::Display,
    {
        loop {
            let delivery = match self.pending.pop_front() {
                Some(d) => d,
                None => match self.rx.recv().await {
                    Some(d) => d,
                    None => break,
                },
            };

            let job: JobDescriptor = match serde_json::from_str(&delivery.body) {
                Ok(job) => job,
                Err(e) => {
                    tracing::error!(error = %e, "Dropping undecodable queue message");
                    continue;
                }
            };

            let job_id = job.job_id;
            match handler(job).await {
                Ok(()) => {
                    tracing::debug!(%job_id, attempt = delivery.attempt, "Job handled");
                }
                Err(e) if delivery.attempt < self.max_attempts => {
                    let delay_idx =
                        (delivery.attempt as usize - 1).min(REDELIVERY_DELAYS_SECS.len() - 1);
                    let delay = Duration::from_secs(REDELIVERY_DELAYS_SECS[delay_idx]);
                    tracing::warn!(
                        %job_id,
                        attempt = delivery.attempt,
                        error = %e,
                        "Job failed, scheduling redelivery"
                    );
                    tokio::time::sleep(delay).await;
                    self.pending.push_back(Delivery {
                        body: delivery.body,
                        attempt: delivery.attempt + 1,
                    });
                }
                Err(e) => {
                    tracing::error!(
                        %job_id,
                        attempt = delivery.attempt,
                        error = %e,
                        "Job failed on final attempt, dropping"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use loopgen_core::job::JobId;

    fn descriptor() -> JobDescriptor {
        let job_id = JobId::new();
        JobDescriptor {
            job_id,
            prompt: "a cat waving".into(),
            image_key: format!("inputs/{job_id}/input.png"),
        }
    }

    #[tokio::test]
    async fn send_then_recv_roundtrips_descriptor() {
        let (queue, mut consumer) = channel(8, 3);
        let job = descriptor();
        queue.send(&job).await.unwrap();

        let (received, attempt) = consumer.recv_job().await.unwrap();
        assert_eq!(received.job_id, job.job_id);
        assert_eq!(received.prompt, job.prompt);
        assert_eq!(received.image_key, job.image_key);
        assert_eq!(attempt, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_handler_gets_redelivered_until_success() {
        let (queue, consumer) = channel(8, 3);
        queue.send(&descriptor()).await.unwrap();
        drop(queue);

        let calls = Arc::new(AtomicU32::new(0));
        let calls_handler = Arc::clone(&calls);
        consumer
            .run(move |_job| {
                let calls = Arc::clone(&calls_handler);
                async move {
                    // Fail the first delivery, succeed the second.
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err("transient")
                    } else {
                        Ok(())
                    }
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn redelivery_stops_after_max_attempts() {
        let (queue, consumer) = channel(8, 3);
        queue.send(&descriptor()).await.unwrap();
        drop(queue);

        let calls = Arc::new(AtomicU32::new(0));
        let calls_handler = Arc::clone(&calls);
        consumer
            .run(move |_job| {
                let calls = Arc::clone(&calls_handler);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>("always fails")
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
