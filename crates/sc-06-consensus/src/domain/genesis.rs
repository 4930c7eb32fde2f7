//! # Genesis Block
//!
//! The genesis block is a pure function of its configuration, so every node
//! configured alike derives the same block and ID.

use primitive_types::U256;
use shared_types::codec::compute_payload;
use shared_types::entities::*;
use shared_types::CodecError;
use sc_02_transactions::TransactionAction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisAccount {
    pub address: AccountAddress,
    pub balance: i64,
}

/// A node registered (and admitted) by the genesis block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisNode {
    pub account_address: AccountAddress,
    pub node_public_key: PublicKey,
    pub locked_balance: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisConfig {
    pub timestamp: Timestamp,
    pub block_seed: Hash,
    pub accounts: Vec<GenesisAccount>,
    pub nodes: Vec<GenesisNode>,
}

fn genesis_transaction(
    timestamp: Timestamp,
    sender: AccountAddress,
    recipient: Option<AccountAddress>,
    body: TransactionBody,
) -> Result<Transaction, CodecError> {
    Transaction::new(timestamp, sender, recipient, 0, body).seal(EMPTY_SIGNATURE)
}

/// Builds the height-0 block: one funding transfer per account, then one
/// registration per node.
pub fn build_genesis_block(config: &GenesisConfig) -> Result<Block, CodecError> {
    let mut transactions = Vec::with_capacity(config.accounts.len() + config.nodes.len());
    for account in &config.accounts {
        transactions.push(genesis_transaction(
            config.timestamp,
            GENESIS_ACCOUNT,
            Some(account.address),
            TransactionBody::SendMoney {
                amount: account.balance,
            },
        )?);
    }
    for node in &config.nodes {
        transactions.push(genesis_transaction(
            config.timestamp,
            node.account_address,
            None,
            TransactionBody::NodeRegistration {
                node_public_key: node.node_public_key,
                locked_balance: node.locked_balance,
            },
        )?);
    }

    let (payload_hash, payload_length) = compute_payload(&transactions, &[])?;
    let mut block = Block {
        id: 0,
        block_hash: [0; 32],
        previous_block_hash: [0; 32],
        height: 0,
        timestamp: config.timestamp,
        block_seed: config.block_seed,
        block_signature: EMPTY_SIGNATURE,
        cumulative_difficulty: U256::zero(),
        blocksmith_public_key: GENESIS_ACCOUNT,
        total_amount: transactions.iter().map(|tx| tx.amount()).sum(),
        total_fee: 0,
        total_coinbase: 0,
        version: 1,
        payload_length,
        payload_hash,
        transactions,
        published_receipts: Vec::new(),
        transaction_ids: Vec::new(),
    };
    block.seal(EMPTY_SIGNATURE)?;
    Ok(block)
}
