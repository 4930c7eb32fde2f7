//! # Fork Resolution Flows
//!
//! - A late blocksmith's block is pooled until its persist window opens,
//!   then persisted by the pool scan.
//! - A competitor smithed earlier by a higher-ranked blocksmith replaces the
//!   tip through pop-off and re-push; the displaced block is stale afterwards.
//! - Popping blocks off and pushing them back restores storage exactly,
//!   including node registry changes.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use sc_01_ledger_store::LedgerRead;
    use sc_06_consensus::{BlocksmithStrategy, ConsensusError, PushOutcome, ReceiveOutcome};
    use shared_bus::{ChainEvent, EventFilter, EventSubscriber, EventTopic};
    use shared_types::{ErrorKind, PeerId, RegistrationStatus};

    const RECIPIENT: [u8; 32] = [0x44; 32];

    #[test]
    fn test_late_block_pooled_until_window_opens() {
        let net = network(3);
        let receiver = net.node_at(0, &net.genesis);
        let late = net.node_at(1, &net.genesis);

        let smith_time = net.strategy.smith_time(1, &net.genesis);
        net.clock.set(smith_time);
        let block = net.nodes[late]
            .block_service
            .generate_block(&net.genesis, &NODE_SEEDS[late], smith_time)
            .unwrap();

        let outcome = net.nodes[receiver]
            .block_service
            .receive_block(
                net.nodes[late].node_public_key(),
                PeerId([1; 32]),
                block.clone(),
            )
            .unwrap();
        assert!(matches!(
            outcome,
            ReceiveOutcome::Processed {
                outcome: PushOutcome::Pooled { blocksmith_index: 1 },
                ..
            }
        ));
        let service = &net.nodes[receiver].block_service;
        assert_eq!(service.last_block().unwrap().id, net.genesis.id);
        assert!(service.block_pool().get(1).is_some());
        assert_eq!(service.scan_block_pool().unwrap(), None);

        net.clock.advance(1);
        let persisted = service.scan_block_pool().unwrap().unwrap();
        assert_eq!(persisted.id, block.id);
        assert!(service.block_pool().is_empty());

        // the skipped first blocksmith lost score
        let skipped = net.nodes[receiver]
            .ledger
            .skipped_blocksmiths_at(persisted.height)
            .unwrap();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].blocksmith_index, 0);
    }

    #[test]
    fn test_earlier_competitor_wins_fork() {
        let net = network(2);
        let first = net.node_at(0, &net.genesis);
        let second = net.node_at(1, &net.genesis);
        let observer = first;

        let tx = net.user().send_money(net.now(), RECIPIENT, 40, 4).unwrap();
        net.relay_transaction(second, &tx);
        net.relay_transaction(observer, &tx);

        // the second blocksmith's block arrives first
        let late_time = net.strategy.smith_time(1, &net.genesis) + 1;
        net.clock.set(late_time);
        let late = net.nodes[second]
            .block_service
            .generate_block(&net.genesis, &NODE_SEEDS[second], late_time)
            .unwrap();
        assert_eq!(late.transactions.len(), 1);
        let service = &net.nodes[observer].block_service;
        service.process_completed_block(late.clone()).unwrap();
        assert_eq!(service.last_block().unwrap().id, late.id);
        assert_eq!(net.balance(observer, &RECIPIENT), 40);
        assert_eq!(service.mempool().pending_count().unwrap(), 0);

        let mut events = net.nodes[observer]
            .event_bus
            .subscribe(EventFilter::topics(vec![EventTopic::Consensus]));
        let early = net.nodes[first]
            .block_service
            .generate_block(
                &net.genesis,
                &NODE_SEEDS[first],
                net.strategy.smith_time(0, &net.genesis),
            )
            .unwrap();
        assert!(early.transactions.is_empty());
        let outcome = service
            .receive_block(
                net.nodes[first].node_public_key(),
                PeerId([2; 32]),
                early.clone(),
            )
            .unwrap();
        assert!(matches!(
            outcome,
            ReceiveOutcome::Processed {
                outcome: PushOutcome::Pushed(_),
                ..
            }
        ));

        let tip = service.last_block().unwrap();
        assert_eq!(tip.id, early.id);
        assert!(tip.cumulative_difficulty > late.cumulative_difficulty);
        assert_eq!(net.balance(observer, &RECIPIENT), 0);
        assert!(net.nodes[observer].ledger.transaction(tx.id).unwrap().is_none());

        let mut saw_rollback = false;
        while let Ok(Some(event)) = events.try_recv() {
            if let ChainEvent::ChainRolledBack {
                common_block_height,
                popped_blocks,
            } = event
            {
                assert_eq!((common_block_height, popped_blocks), (0, 1));
                saw_rollback = true;
            }
        }
        assert!(saw_rollback);

        let err = service
            .validate_block(&late, &net.genesis, late_time)
            .unwrap_err();
        assert_eq!(err, ConsensusError::StaleChain { height: 1 });
        assert_eq!(err.kind(), ErrorKind::StaleChain);
    }

    #[test]
    fn test_pop_off_and_repush_restores_storage() {
        let net = network(1);
        let user = net.user();
        let new_node = net.address(&[0x55; 32]);

        net.relay_transaction(
            0,
            &user.send_money(net.now(), RECIPIENT, 100, 10).unwrap(),
        );
        let common = net.produce_in_turn(0);

        net.relay_transaction(
            0,
            &user.register_node(net.now(), new_node, 5_000, 10).unwrap(),
        );
        net.produce_in_turn(0);
        net.relay_transaction(
            0,
            &user.send_money(net.now(), RECIPIENT, 300, 30).unwrap(),
        );
        let tip = net.produce_in_turn(0);
        assert_eq!(tip.height, 3);

        let ledger = &net.nodes[0].ledger;
        let admitted = ledger
            .node_registration_by_public_key(&new_node)
            .unwrap()
            .unwrap();
        assert_eq!(admitted.registration_status, RegistrationStatus::Registered);
        let full = ledger.snapshot();

        let service = &net.nodes[0].block_service;
        let popped = service.pop_off_to_block(&common).unwrap();
        assert_eq!(popped.len(), 2);
        assert_eq!(service.last_block().unwrap().id, common.id);
        assert!(ledger
            .node_registration_by_public_key(&new_node)
            .unwrap()
            .is_none());
        assert_eq!(net.balance(0, &RECIPIENT), 100);

        for block in popped.into_iter().rev() {
            let previous = service.last_block().unwrap();
            match service.push_block(&previous, block, false).unwrap() {
                PushOutcome::Pushed(_) => {}
                other => panic!("unexpected outcome {other:?}"),
            }
        }
        assert_eq!(*full, *ledger.snapshot());
    }

    #[test]
    fn test_rollback_within_depth_pops_every_block() {
        let net = network(1);
        for _ in 0..3 {
            net.produce_in_turn(0);
        }
        let service = &net.nodes[0].block_service;
        let depth = service.config().max_rollback_depth;
        assert!(depth >= 3);
        assert_eq!(service.pop_off_to_block(&net.genesis).unwrap().len(), 3);
    }
}
