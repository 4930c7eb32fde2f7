//! # Chain Events
//!
//! Strongly typed events exchanged between the consensus core and the
//! (external) network layer. Each variant carries its own payload, so
//! subscribers never cast.

use serde::{Deserialize, Serialize};
use shared_types::entities::{Block, BlockId, PeerId, Transaction, TransactionId};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChainEvent {
    // =========================================================================
    // SUBSYSTEM 3: MEMPOOL
    // =========================================================================
    /// A validated transaction entered the mempool.
    /// Source: Subsystem 3 | Target: Network, Incomplete-Queue
    TransactionAdded(Transaction),

    /// Stale mempool entries were expired and their effects reversed.
    TransactionsExpired {
        /// IDs of the expired transactions.
        transaction_ids: Vec<TransactionId>,
    },

    // =========================================================================
    // SUBSYSTEM 4: BLOCK-INCOMPLETE-QUEUE
    // =========================================================================
    /// Ask a peer for transaction bodies a pending block still needs.
    /// Source: Subsystem 4 | Target: Network
    RequestBlockTransactions {
        /// Block waiting on the transactions.
        block_id: BlockId,
        /// Missing transaction IDs.
        transaction_ids: Vec<TransactionId>,
        /// Peer expected to hold them.
        peer: PeerId,
    },

    // =========================================================================
    // SUBSYSTEM 6: CONSENSUS (BLOCK SERVICE)
    // =========================================================================
    /// A block became canonical.
    BlockPushed(Block),

    /// A block to relay to peers, transaction bodies replaced by IDs.
    /// Source: Subsystem 6 | Target: Network
    BlockBroadcast(Block),

    /// A premature block was quarantined in the block pool.
    BlockPooled {
        /// The pooled block's ID.
        block_id: BlockId,
        /// Height it would occupy.
        block_height: u64,
        /// Producer index in the previous block's ordering.
        blocksmith_index: u32,
    },

    /// The chain tip was popped back to a common block.
    ChainRolledBack {
        /// Height of the retained common block.
        common_block_height: u64,
        /// Number of blocks removed.
        popped_blocks: usize,
    },

    // =========================================================================
    // CRITICAL EVENTS (DLQ)
    // =========================================================================
    /// Critical error requiring operator attention.
    CriticalError {
        /// The subsystem that encountered the error.
        subsystem_id: u8,
        /// Error description.
        error: String,
    },
}

impl ChainEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::TransactionAdded(_) | Self::TransactionsExpired { .. } => EventTopic::Mempool,
            Self::RequestBlockTransactions { .. } | Self::BlockBroadcast(_) => {
                EventTopic::Network
            }
            Self::BlockPushed(_) | Self::BlockPooled { .. } | Self::ChainRolledBack { .. } => {
                EventTopic::Consensus
            }
            Self::CriticalError { .. } => EventTopic::DeadLetterQueue,
        }
    }

    /// Get the originating subsystem ID.
    #[must_use]
    pub fn source_subsystem(&self) -> u8 {
        match self {
            Self::TransactionAdded(_) | Self::TransactionsExpired { .. } => 3,
            Self::RequestBlockTransactions { .. } => 4,
            Self::BlockPushed(_)
            | Self::BlockBroadcast(_)
            | Self::BlockPooled { .. }
            | Self::ChainRolledBack { .. } => 6,
            Self::CriticalError { subsystem_id, .. } => *subsystem_id,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Mempool admissions and expiry.
    Mempool,
    /// Block pushes, pooling and rollbacks.
    Consensus,
    /// Outbound requests for the network layer.
    Network,
    /// Dead Letter Queue for critical errors.
    DeadLetterQueue,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Source subsystems to include. Empty means all sources.
    pub source_subsystems: Vec<u8>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            source_subsystems: Vec::new(),
        }
    }

    /// Create a filter for events from specific subsystems.
    #[must_use]
    pub fn from_subsystems(subsystems: Vec<u8>) -> Self {
        Self {
            topics: Vec::new(),
            source_subsystems: subsystems,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &ChainEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let source_match = self.source_subsystems.is_empty()
            || self.source_subsystems.contains(&event.source_subsystem());

        topic_match && source_match
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pooled() -> ChainEvent {
        ChainEvent::BlockPooled {
            block_id: 7,
            block_height: 3,
            blocksmith_index: 2,
        }
    }

    #[test]
    fn test_event_topic_mapping() {
        assert_eq!(pooled().topic(), EventTopic::Consensus);
        assert_eq!(pooled().source_subsystem(), 6);

        let request = ChainEvent::RequestBlockTransactions {
            block_id: 1,
            transaction_ids: vec![10, 11],
            peer: PeerId::default(),
        };
        assert_eq!(request.topic(), EventTopic::Network);
        assert_eq!(request.source_subsystem(), 4);
    }

    #[test]
    fn test_filter_by_topic() {
        let filter = EventFilter::topics(vec![EventTopic::Mempool]);
        assert!(!filter.matches(&pooled()));
        assert!(filter.matches(&ChainEvent::TransactionsExpired {
            transaction_ids: vec![1]
        }));
        assert!(EventFilter::all().matches(&pooled()));
    }

    #[test]
    fn test_filter_by_subsystem() {
        let filter = EventFilter::from_subsystems(vec![6]);
        assert!(filter.matches(&pooled()));
        assert!(!filter.matches(&ChainEvent::TransactionsExpired {
            transaction_ids: vec![]
        }));
    }
}
