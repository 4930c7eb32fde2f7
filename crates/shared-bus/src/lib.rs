//! # Shared Bus
//!
//! Typed publish/subscribe channel between the chain core and the network
//! layer. The mempool, the incomplete queue and the block service publish;
//! the runtime's handlers and the network adapter subscribe.
//!
//! ```text
//!  Mempool(3) ──TransactionAdded──────────┐
//!  IncompleteQueue(4) ──RequestBlockTx────┤
//!  BlockService(6) ──BlockPushed/Broadcast┤
//!                                         ▼
//!                                  InMemoryEventBus ──subscribe(filter)──→ handlers
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{ChainEvent, EventFilter, EventTopic};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventSubscriber, Subscription, SubscriptionError};

/// Events buffered per subscription before the slowest one starts missing
/// events.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
