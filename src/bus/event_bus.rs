use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tokio::sync::broadcast;

use crate::transport::EventEnvelope;

const BUS_CAPACITY: usize = 1024;

/// An envelope together with its position in the publish order.
#[derive(Debug, Clone, Serialize)]
pub struct PublishedEvent {
    pub seq: u64,
    pub envelope: EventEnvelope,
}

/// Result of a publish: the assigned sequence and how many subscribers saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PublishReceipt {
    pub seq: u64,
    pub receivers: usize,
}

/// In-process fan-out of push envelopes to every connected client.
pub struct EventBus {
    tx: broadcast::Sender<PublishedEvent>,
    /// Next sequence number. Held across `send` so seq order is delivery order.
    next_seq: Mutex<u64>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self {
            tx,
            next_seq: Mutex::new(0),
        }
    }

    /// Publish an envelope onto the bus.
    pub fn publish(&self, envelope: EventEnvelope) -> PublishReceipt {
        let kind = envelope.kind.clone();
        let mut next_seq = self.next_seq.lock().unwrap_or_else(PoisonError::into_inner);
        let seq = *next_seq;
        *next_seq += 1;
        let sent = self.tx.send(PublishedEvent { seq, envelope });
        drop(next_seq);

        match sent {
            Ok(receivers) => {
                tracing::debug!(seq, %kind, receivers, "published push event");
                PublishReceipt { seq, receivers }
            }
            Err(_) => {
                // No push clients connected; the event is simply not delivered.
                tracing::debug!(seq, %kind, "no push clients connected, event not delivered");
                PublishReceipt { seq, receivers: 0 }
            }
        }
    }

    /// Get a new receiver for this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::EventKind;

    #[tokio::test]
    async fn test_publish_without_subscribers_is_not_an_error() {
        let bus = EventBus::new();
        let receipt = bus.publish(EventEnvelope::new(EventKind::Info, "t", "m"));
        assert_eq!(receipt, PublishReceipt { seq: 0, receivers: 0 });
    }

    #[tokio::test]
    async fn test_subscribers_see_events_in_publish_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        for i in 0..3 {
            let receipt = bus.publish(EventEnvelope::new(
                EventKind::ProductionReport,
                format!("report {i}"),
                "",
            ));
            assert_eq!(receipt.receivers, 1);
        }

        for i in 0..3u64 {
            let event = rx.recv().await.unwrap();
            assert_eq!(event.seq, i);
            assert_eq!(event.envelope.title, format!("report {i}"));
        }
    }

    #[test]
    fn test_concurrent_publishers_deliver_in_seq_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        std::thread::scope(|scope| {
            for worker in 0..4 {
                let bus = &bus;
                scope.spawn(move || {
                    for i in 0..100 {
                        bus.publish(EventEnvelope::new(
                            EventKind::InventoryAlert,
                            format!("worker {worker} item {i}"),
                            "",
                        ));
                    }
                });
            }
        });

        let seqs: Vec<u64> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|event| event.seq)
            .collect();
        assert_eq!(seqs, (0..400).collect::<Vec<u64>>());
    }
}
