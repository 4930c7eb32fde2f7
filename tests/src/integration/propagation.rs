//! # Block Propagation Flows
//!
//! A block smithed by one node reaches another as an ID list:
//!
//! 1. **Known bodies**: the receiver's mempool already holds every
//!    transaction, the block is pushed at once and a receipt returned.
//! 2. **Missing bodies**: the block waits in the incomplete queue, the
//!    receiver asks the sender for the missing transactions and pushes the
//!    block once they arrive through its mempool.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use node_runtime::ChainEventHandler;
    use sc_06_consensus::{PushOutcome, ReceiveOutcome};
    use shared_bus::{ChainEvent, EventFilter, EventSubscriber, EventTopic};
    use shared_types::{PeerId, ReceiptDatumType};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    const RECIPIENT: [u8; 32] = [0x44; 32];

    #[test]
    fn test_block_with_known_transactions_is_pushed_and_acknowledged() {
        let net = network(2);
        let producer = net.node_at(0, &net.genesis);
        let receiver = 1 - producer;

        let tx = net.user().send_money(net.now(), RECIPIENT, 250, 5).unwrap();
        net.relay_transaction(producer, &tx);
        net.relay_transaction(receiver, &tx);
        let block = net.produce_in_turn(producer);

        let outcome = net.nodes[receiver]
            .block_service
            .receive_block(
                net.nodes[producer].node_public_key(),
                PeerId([1; 32]),
                block.strip_transactions(),
            )
            .unwrap();
        match outcome {
            ReceiveOutcome::Processed {
                outcome: PushOutcome::Pushed(pushed),
                receipt,
            } => {
                assert_eq!(pushed.id, block.id);
                assert_eq!(receipt.datum_type, ReceiptDatumType::Block);
                assert_eq!(receipt.datum_hash, block.block_hash);
                assert_eq!(
                    receipt.recipient_public_key,
                    net.nodes[receiver].node_public_key()
                );
            }
            other => panic!("unexpected outcome {other:?}"),
        }

        for node in [producer, receiver] {
            assert_eq!(net.balance(node, &RECIPIENT), 250);
            assert_eq!(net.balance(node, &net.address(&USER_SEED)), USER_FUNDS - 255);
            assert_eq!(net.nodes[node].mempool.pending_count().unwrap(), 0);
            assert_eq!(
                net.nodes[node].block_service.last_block().unwrap().id,
                block.id
            );
        }
    }

    #[test]
    fn test_missing_transactions_are_requested_then_block_completes() {
        let net = network(2);
        let producer = net.node_at(0, &net.genesis);
        let receiver = 1 - producer;
        let mut requests = net.nodes[receiver]
            .event_bus
            .subscribe(EventFilter::topics(vec![EventTopic::Network]));

        let first = net.user().send_money(net.now(), RECIPIENT, 10, 1).unwrap();
        let second = net.user().send_money(net.now(), RECIPIENT, 20, 2).unwrap();
        net.relay_transaction(producer, &first);
        net.relay_transaction(producer, &second);
        net.relay_transaction(receiver, &first);
        let block = net.produce_in_turn(producer);
        assert_eq!(block.transactions.len(), 2);

        let peer = PeerId([9; 32]);
        let sender = net.nodes[producer].node_public_key();
        let outcome = net.nodes[receiver]
            .block_service
            .receive_block(sender, peer, block.strip_transactions())
            .unwrap();
        assert_eq!(outcome, ReceiveOutcome::Queued);
        assert_eq!(
            net.nodes[receiver]
                .block_service
                .receive_block(sender, peer, block.strip_transactions())
                .unwrap(),
            ReceiveOutcome::AlreadyQueued
        );

        let requested = match requests.try_recv().unwrap() {
            Some(ChainEvent::RequestBlockTransactions {
                block_id,
                transaction_ids,
                peer: asked,
            }) => {
                assert_eq!(block_id, block.id);
                assert_eq!(asked, peer);
                transaction_ids
            }
            other => panic!("unexpected event {other:?}"),
        };
        assert_eq!(requested, vec![second.id]);

        // the producer serves the bodies, the receiver admits them
        let served = net.nodes[producer]
            .block_service
            .get_transactions_by_ids(&requested)
            .unwrap();
        assert_eq!(served.iter().map(|tx| tx.id).collect::<Vec<_>>(), vec![second.id]);

        let handler = ChainEventHandler::new(
            net.nodes[receiver].event_bus.subscribe(EventFilter::all()),
            Arc::clone(&net.nodes[receiver].block_service),
        );
        net.relay_transaction(receiver, &served[0]);
        assert_eq!(handler.handle(&ChainEvent::TransactionAdded(second)), 1);

        let tip = net.nodes[receiver].block_service.last_block().unwrap();
        assert_eq!(tip.id, block.id);
        assert_eq!(
            tip.transactions,
            net.nodes[producer].block_service.last_block().unwrap().transactions
        );
        assert_eq!(net.balance(receiver, &RECIPIENT), 30);
    }

    #[tokio::test]
    async fn test_event_handler_pushes_completed_block() {
        let net = network(2);
        let producer = net.node_at(0, &net.genesis);
        let receiver = 1 - producer;

        let tx = net.user().send_money(net.now(), RECIPIENT, 75, 3).unwrap();
        net.relay_transaction(producer, &tx);
        let block = net.produce_in_turn(producer);

        let node = &net.nodes[receiver];
        let mut pushed = node
            .event_bus
            .subscribe(EventFilter::topics(vec![EventTopic::Consensus]));
        let handler = ChainEventHandler::new(
            node.event_bus
                .subscribe(EventFilter::topics(vec![EventTopic::Mempool])),
            Arc::clone(&node.block_service),
        );
        let task = tokio::spawn(handler.run());

        let outcome = node
            .block_service
            .receive_block(
                net.nodes[producer].node_public_key(),
                PeerId([2; 32]),
                block.strip_transactions(),
            )
            .unwrap();
        assert_eq!(outcome, ReceiveOutcome::Queued);
        net.relay_transaction(receiver, &tx);

        let event = timeout(Duration::from_secs(2), pushed.recv())
            .await
            .expect("timeout waiting for push")
            .expect("bus open");
        match event {
            ChainEvent::BlockPushed(tip) => assert_eq!(tip.id, block.id),
            other => panic!("unexpected event {other:?}"),
        }
        task.abort();
    }
}
