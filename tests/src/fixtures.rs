//! Networks of in-memory nodes driven by one manual clock.

use node_runtime::{NodeConfig, SubsystemContainer};
use sc_01_ledger_store::{LedgerRead, ManualTimeSource, TimeSource};
use sc_02_transactions::TransactionBuilder;
use sc_03_mempool::MempoolConfig;
use sc_06_consensus::{
    BlocksmithStrategy, ConsensusConfig, GenesisAccount, GenesisConfig, GenesisNode, PushOutcome,
    RegistryBlocksmithStrategy,
};
use shared_crypto::{Ed25519NodeSigner, NodeSigner};
use shared_types::{AccountAddress, Block, PublicKey, Transaction};
use std::sync::Arc;

pub const GENESIS_TIME: u64 = 1_700_000_000;
pub const USER_SEED: [u8; 32] = [0x33; 32];
pub const USER_FUNDS: i64 = 1_000_000;
pub const NODE_SEEDS: [[u8; 32]; 3] = [[0xA1; 32], [0xB2; 32], [0xC3; 32]];

/// Owner account seed of genesis node `i`.
pub fn owner_seed(i: usize) -> [u8; 32] {
    [0x10 + i as u8; 32]
}

pub struct Network {
    pub clock: Arc<ManualTimeSource>,
    pub signer: Ed25519NodeSigner,
    pub nodes: Vec<SubsystemContainer>,
    pub genesis: Block,
    /// Orders blocksmiths exactly as every node does.
    pub strategy: RegistryBlocksmithStrategy,
}

/// `count` nodes, all of them genesis blocksmiths, on the testing
/// configuration.
pub fn network(count: usize) -> Network {
    let signer = Ed25519NodeSigner::new();
    let clock = Arc::new(ManualTimeSource::new(GENESIS_TIME));
    let genesis_config = genesis_config(&signer, count);

    let nodes: Vec<SubsystemContainer> = NODE_SEEDS[..count]
        .iter()
        .map(|seed| {
            let config = NodeConfig {
                node_seed: *seed,
                consensus: ConsensusConfig::for_testing(),
                mempool: MempoolConfig::for_testing(),
                genesis: genesis_config.clone(),
                ..NodeConfig::development(*seed)
            };
            SubsystemContainer::with_time_source(config, clock.clone())
        })
        .collect();

    let mut genesis = None;
    for node in &nodes {
        let tip = node.bootstrap_genesis().expect("genesis bootstraps");
        assert_eq!(genesis.get_or_insert_with(|| tip.clone()).id, tip.id);
    }

    Network {
        clock,
        signer,
        nodes,
        genesis: genesis.expect("at least one node"),
        strategy: RegistryBlocksmithStrategy::new(&ConsensusConfig::for_testing()),
    }
}

fn genesis_config(signer: &Ed25519NodeSigner, count: usize) -> GenesisConfig {
    let mut accounts = vec![GenesisAccount {
        address: signer.public_key_from_seed(&USER_SEED),
        balance: USER_FUNDS,
    }];
    let mut nodes = Vec::new();
    for (i, seed) in NODE_SEEDS[..count].iter().enumerate() {
        let owner = signer.public_key_from_seed(&owner_seed(i));
        accounts.push(GenesisAccount {
            address: owner,
            balance: 100_000,
        });
        nodes.push(GenesisNode {
            account_address: owner,
            node_public_key: signer.public_key_from_seed(seed),
            locked_balance: 10_000,
        });
    }
    GenesisConfig {
        timestamp: GENESIS_TIME,
        block_seed: [7; 32],
        accounts,
        nodes,
    }
}

impl Network {
    pub fn user(&self) -> TransactionBuilder<'_> {
        TransactionBuilder::new(&self.signer, USER_SEED)
    }

    pub fn address(&self, seed: &[u8; 32]) -> PublicKey {
        self.signer.public_key_from_seed(seed)
    }

    /// Index into `nodes` of the blocksmith at `position` in the ordering
    /// on top of `previous`.
    pub fn node_at(&self, position: usize, previous: &Block) -> usize {
        let smiths = self
            .strategy
            .sorted_blocksmiths(&*self.nodes[0].ledger, previous)
            .expect("blocksmiths sort");
        let key = smiths[position].node_public_key;
        self.nodes
            .iter()
            .position(|node| node.node_public_key() == key)
            .expect("blocksmith is one of the nodes")
    }

    /// Delivers `tx` to `node` as if relayed by a peer.
    pub fn relay_transaction(&self, node: usize, tx: &Transaction) {
        let tip = self.nodes[node]
            .block_service
            .last_block()
            .expect("chain has a tip");
        self.nodes[node]
            .mempool
            .receive_from_network([0xEE; 32], &tx.to_bytes().expect("encodes"), &tip)
            .expect("transaction admitted");
    }

    /// Moves the clock to the first smith time on top of `node`'s tip and
    /// lets the first-ordered node produce there.
    pub fn produce_in_turn(&self, node: usize) -> Block {
        let tip = self.nodes[node]
            .block_service
            .last_block()
            .expect("chain has a tip");
        let producer = self.node_at(0, &tip);
        assert_eq!(producer, node, "node {node} is not first in line");
        self.clock.set(self.strategy.smith_time(0, &tip));
        match self.nodes[node]
            .block_service
            .try_produce(&self.nodes[node].config.node_seed)
            .expect("production succeeds")
        {
            Some(PushOutcome::Pushed(block)) => block,
            other => panic!("expected a pushed block, got {other:?}"),
        }
    }

    pub fn balance(&self, node: usize, account: &AccountAddress) -> i64 {
        self.nodes[node]
            .ledger
            .account_balance(account)
            .expect("balance readable")
            .map_or(0, |b| b.balance)
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }
}
