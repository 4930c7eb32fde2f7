//! # Event Publisher
//!
//! The broadcast side of the bus. Consensus code publishes while holding the
//! chain lock, so publishing never blocks and never reports failure to the
//! caller.

use crate::events::{ChainEvent, EventFilter, EventTopic};
use crate::subscriber::{EventSubscriber, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::broadcast;
use tracing::{debug, error, trace};

/// Publishing port used by the mempool, queue and block service.
pub trait EventPublisher: Send + Sync {
    /// Hands `event` to every live subscription and returns how many
    /// receivers it reached. Zero receivers is not an error.
    fn publish(&self, event: ChainEvent) -> usize;

    /// Events published since the bus was created, on every topic.
    fn events_published(&self) -> u64;
}

/// Process-local bus over `tokio::sync::broadcast`.
///
/// Each subscription gets its own cursor into a ring of `capacity` events;
/// a subscription that falls further behind skips the overwritten ones.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<ChainEvent>,
    published: Mutex<HashMap<EventTopic, u64>>,
    capacity: usize,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            published: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    /// Live subscriptions, whatever their filter.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events published on one topic.
    #[must_use]
    pub fn published_on(&self, topic: EventTopic) -> u64 {
        self.published.lock().get(&topic).copied().unwrap_or(0)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSubscriber for InMemoryEventBus {
    fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(topics = ?filter.topics, sources = ?filter.source_subsystems, "[bus] subscribed");
        Subscription::new(self.sender.subscribe(), filter)
    }
}

impl EventPublisher for InMemoryEventBus {
    fn publish(&self, event: ChainEvent) -> usize {
        let topic = event.topic();
        *self.published.lock().entry(topic).or_insert(0) += 1;

        if let ChainEvent::CriticalError {
            subsystem_id,
            error,
        } = &event
        {
            error!(subsystem_id, %error, "[bus] critical error published");
        }

        // send only fails when nobody listens
        let reached = self.sender.send(event).unwrap_or(0);
        trace!(?topic, reached, "[bus] published");
        reached
    }

    fn events_published(&self) -> u64 {
        self.published.lock().values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rollback_event() -> ChainEvent {
        ChainEvent::ChainRolledBack {
            common_block_height: 4,
            popped_blocks: 2,
        }
    }

    #[test]
    fn test_publish_without_listeners_is_counted() {
        let bus = InMemoryEventBus::new();
        assert_eq!(bus.publish(rollback_event()), 0);
        assert_eq!(bus.events_published(), 1);
        assert_eq!(bus.published_on(EventTopic::Consensus), 1);
        assert_eq!(bus.published_on(EventTopic::Mempool), 0);
    }

    #[test]
    fn test_every_subscription_is_reached() {
        let bus = InMemoryEventBus::new();
        let _all = bus.subscribe(EventFilter::all());
        let _mempool = bus.subscribe(EventFilter::topics(vec![EventTopic::Mempool]));

        // filtering happens on the receiving side
        assert_eq!(bus.publish(rollback_event()), 2);
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn test_per_topic_counts() {
        let bus = InMemoryEventBus::with_capacity(8);
        bus.publish(rollback_event());
        bus.publish(ChainEvent::TransactionsExpired {
            transaction_ids: vec![3, 4],
        });
        bus.publish(ChainEvent::CriticalError {
            subsystem_id: 6,
            error: "ledger write failed".into(),
        });

        assert_eq!(bus.capacity(), 8);
        assert_eq!(bus.events_published(), 3);
        assert_eq!(bus.published_on(EventTopic::DeadLetterQueue), 1);
    }
}
