//! The bounded backpressure buffer: holds `(SensorNetValue, ListenerId)`
//! pairs between the ingress task and the per-query monitor loops,
//! dropping new events with an error log when full rather than
//! suspending ingress.

use crate::observability::PipelineMetrics;
use crate::pipeline::sensor::{ListenerId, SensorNetValue};
use tokio::sync::mpsc;

/// One item traveling through the buffer: a reshaped sensor event
/// alongside the listener identity it should ultimately route decisions
/// back to.
pub type BufferedEvent = (SensorNetValue, ListenerId);

/// Producer half: owned by the ingress task. `try_send` never suspends —
/// a full buffer means the event is dropped and logged, rather than
/// blocking upstream.
#[derive(Clone)]
pub struct BufferProducer {
    tx: mpsc::Sender<BufferedEvent>,
    metrics: PipelineMetrics,
}

/// Consumer half: owned by the pipeline's dispatch task, which pulls
/// events and fans them out to per-query monitors.
pub struct BufferConsumer {
    rx: mpsc::Receiver<BufferedEvent>,
}

/// Builds a bounded buffer of the configured capacity.
pub fn bounded(capacity: usize, metrics: PipelineMetrics) -> (BufferProducer, BufferConsumer) {
    let (tx, rx) = mpsc::channel(capacity);
    (BufferProducer { tx, metrics }, BufferConsumer { rx })
}

impl BufferProducer {
    /// Attempt to enqueue an event without suspending. On overflow, logs
    /// at `error` and increments the `buffer_drops` metric.
    pub fn offer(&self, event: BufferedEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::error!("backpressure buffer full; dropping sensor event");
                self.metrics.record_buffer_drop();
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::error!("backpressure buffer closed; dropping sensor event");
                self.metrics.record_buffer_drop();
            }
        }
    }

    /// Drops the sender half, signaling end-of-stream to the consumer
    /// once any already-buffered events are drained. This is the `Stop`
    /// control signal: no new events are accepted after this point,
    /// buffered ones still deliver.
    pub fn stop(self) {
        drop(self.tx);
    }
}

impl BufferConsumer {
    /// Pulls the next buffered event, or `None` once the producer has
    /// stopped and the buffer has drained.
    pub async fn recv(&mut self) -> Option<BufferedEvent> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::sensor::SensorNetValue;

    #[tokio::test]
    async fn delivers_events_in_order() {
        let metrics = PipelineMetrics::new();
        let (producer, mut consumer) = bounded(4, metrics);
        let listener = ListenerId::new();
        producer.offer((SensorNetValue::default(), listener));
        producer.offer((SensorNetValue::default(), listener));
        assert!(consumer.recv().await.is_some());
        assert!(consumer.recv().await.is_some());
    }

    #[tokio::test]
    async fn drops_and_counts_when_full() {
        let metrics = PipelineMetrics::new();
        let (producer, mut consumer) = bounded(1, metrics.clone());
        let listener = ListenerId::new();
        producer.offer((SensorNetValue::default(), listener));
        producer.offer((SensorNetValue::default(), listener));
        assert_eq!(metrics.snapshot().buffer_drops, 1);
        assert!(consumer.recv().await.is_some());
    }

    #[tokio::test]
    async fn stop_drains_then_ends_stream() {
        let metrics = PipelineMetrics::new();
        let (producer, mut consumer) = bounded(4, metrics);
        let listener = ListenerId::new();
        producer.offer((SensorNetValue::default(), listener));
        producer.stop();
        assert!(consumer.recv().await.is_some());
        assert!(consumer.recv().await.is_none());
    }
}
