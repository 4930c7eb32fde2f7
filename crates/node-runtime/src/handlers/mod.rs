//! # Event Handlers
//!
//! Subscribers that react to bus events:
//!
//! - `TransactionAdded` fills pending blocks in the incomplete queue and
//!   pushes the ones that became complete.
//! - `BlockPushed` / `ChainRolledBack` keep the chain height gauge current.

use crate::container::ChainService;
use shared_bus::{ChainEvent, Subscription};
use shared_types::Transaction;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Drives the block service from mempool and consensus events.
pub struct ChainEventHandler {
    subscription: Subscription,
    block_service: Arc<ChainService>,
}

impl ChainEventHandler {
    pub fn new(subscription: Subscription, block_service: Arc<ChainService>) -> Self {
        Self {
            subscription,
            block_service,
        }
    }

    /// Handle events until the bus closes.
    pub async fn run(mut self) {
        info!("[runtime] Chain event handler started");
        while let Some(event) = self.subscription.recv().await {
            self.handle(&event);
        }
        info!("[runtime] Event bus closed, chain event handler stopped");
    }

    /// Handle one event. Returns the number of completed blocks accepted.
    pub fn handle(&self, event: &ChainEvent) -> usize {
        match event {
            ChainEvent::TransactionAdded(tx) => self.complete_blocks(tx),
            ChainEvent::BlockPushed(block) => {
                chain_telemetry::set_chain_height(block.height);
                0
            }
            ChainEvent::ChainRolledBack {
                common_block_height,
                ..
            } => {
                chain_telemetry::set_chain_height(*common_block_height);
                0
            }
            _ => 0,
        }
    }

    fn complete_blocks(&self, tx: &Transaction) -> usize {
        let mut accepted = 0;
        for block in self.block_service.incomplete_queue().satisfy(tx) {
            let (block_id, block_height) = (block.id, block.height);
            match self.block_service.process_completed_block(block) {
                Ok(outcome) => {
                    debug!(block_id, block_height, ?outcome, "[runtime] Completed block processed");
                    accepted += 1;
                }
                Err(e) => warn!(
                    block_id,
                    block_height,
                    error = %e,
                    "[runtime] Completed block rejected"
                ),
            }
        }
        accepted
    }
}
