//! # Core Domain Entities
//!
//! Defines the chain entities shared by every subsystem.
//!
//! ## Clusters
//!
//! - **Chain**: `Block`, `Transaction`, `TransactionBody`, `PublishedReceipt`
//! - **Mempool**: `MempoolTransaction`
//! - **Ledger**: `AccountBalance`, `NodeRegistration`, `ParticipationScore`,
//!   `SkippedBlocksmith`
//! - **Networking**: `PeerId`

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

// Re-export U256 from primitive-types for cumulative difficulty
pub use primitive_types::U256;

// =============================================================================
// PRIMITIVES
// =============================================================================

/// A 32-byte SHA3-256 digest.
pub type Hash = [u8; 32];

/// A 64-byte Ed25519 signature.
pub type Signature = [u8; 64];

/// A 32-byte Ed25519 public key.
pub type PublicKey = [u8; 32];

/// Accounts are addressed by their Ed25519 public key.
pub type AccountAddress = PublicKey;

/// Transaction identifier: first 8 bytes of the transaction hash.
pub type TransactionId = u64;

/// Block identifier: first 8 bytes of the block hash. Never zero.
pub type BlockId = u64;

/// Node identifier: first 8 bytes of the hash of the node public key.
pub type NodeId = u64;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Unsigned signature placeholder.
pub const EMPTY_SIGNATURE: Signature = [0u8; 64];

/// Account that funds the genesis allocations.
pub const GENESIS_ACCOUNT: AccountAddress = [0u8; 32];

/// Identifier of a network peer, opaque to the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct PeerId(pub [u8; 32]);

// =============================================================================
// CLUSTER A: TRANSACTIONS
// =============================================================================

/// Typed transaction body, one variant per transaction kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionBody {
    /// Transfer `amount` from sender to recipient.
    SendMoney { amount: i64 },
    /// Queue a node for admission, locking `locked_balance` from the sender.
    NodeRegistration {
        node_public_key: PublicKey,
        locked_balance: i64,
    },
    /// Raise the locked balance of an existing registration.
    UpdateNodeRegistration {
        node_public_key: PublicKey,
        locked_balance: i64,
    },
    /// Withdraw a registration and release its locked balance.
    RemoveNodeRegistration { node_public_key: PublicKey },
}

impl TransactionBody {
    /// Numeric type tag, stable across versions.
    pub fn type_tag(&self) -> u32 {
        match self {
            Self::SendMoney { .. } => 1,
            Self::NodeRegistration { .. } => 2,
            Self::UpdateNodeRegistration { .. } => 3,
            Self::RemoveNodeRegistration { .. } => 4,
        }
    }
}

/// An atomic ledger operation.
///
/// `id`, `block_id`, `height` and `transaction_index` are not part of the
/// canonical bytes: the ID is derived from them and the block fields are
/// stamped when the transaction is applied.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub version: u8,
    pub timestamp: Timestamp,
    pub sender: AccountAddress,
    pub recipient: Option<AccountAddress>,
    pub fee: i64,
    pub body: TransactionBody,
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
    /// Set once the transaction is part of a block.
    pub block_id: Option<BlockId>,
    pub height: Option<u64>,
    pub transaction_index: Option<u32>,
}

/// A transaction waiting in the mempool, keyed by transaction ID.
///
/// INVARIANT: at most one entry per ID, and never an ID that is already
/// confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MempoolTransaction {
    pub id: TransactionId,
    /// Fee divided by the serialized size; the primary selection key.
    pub fee_per_byte: i64,
    /// Wall-clock admission time, tie-break and expiry basis.
    pub arrival_timestamp: Timestamp,
    pub transaction_bytes: Vec<u8>,
    pub sender_account_address: AccountAddress,
    pub recipient_account_address: Option<AccountAddress>,
    /// Chain height when the entry was admitted.
    pub block_height: u64,
}

// =============================================================================
// CLUSTER B: RECEIPTS
// =============================================================================

/// What a receipt acknowledges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReceiptDatumType {
    Transaction,
    Block,
}

/// Signed acknowledgment that a node received a datum from a peer.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReceipt {
    pub sender_public_key: PublicKey,
    pub recipient_public_key: PublicKey,
    pub datum_type: ReceiptDatumType,
    pub datum_hash: Hash,
    pub reference_block_height: u64,
    pub reference_block_hash: Hash,
    /// Root linking this receipt to a prior block, when known.
    pub rmr_linked: Option<Hash>,
    #[serde_as(as = "Bytes")]
    pub recipient_signature: Signature,
}

/// A receipt embedded in a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedReceipt {
    pub batch_receipt: BatchReceipt,
    pub intermediate_hashes: Vec<u8>,
    pub block_height: u64,
    pub receipt_index: u32,
    pub published_index: u32,
}

// =============================================================================
// CLUSTER C: BLOCKS
// =============================================================================

/// The unit of consensus.
///
/// Blocks received from peers may carry only `transaction_ids`; the bodies
/// are resolved through the mempool or the incomplete-block queue.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub block_hash: Hash,
    pub previous_block_hash: Hash,
    pub height: u64,
    pub timestamp: Timestamp,
    pub block_seed: Hash,
    #[serde_as(as = "Bytes")]
    pub block_signature: Signature,
    pub cumulative_difficulty: U256,
    pub blocksmith_public_key: PublicKey,
    pub total_amount: i64,
    pub total_fee: i64,
    pub total_coinbase: i64,
    pub version: u32,
    pub payload_length: u32,
    pub payload_hash: Hash,
    pub transactions: Vec<Transaction>,
    pub published_receipts: Vec<PublishedReceipt>,
    pub transaction_ids: Vec<TransactionId>,
}

impl Block {
    /// Returns true for the height-0 block.
    pub fn is_genesis(&self) -> bool {
        self.height == 0
    }
}

// =============================================================================
// CLUSTER D: LEDGER STATE
// =============================================================================

/// Balance of an account at a height.
///
/// `spendable_balance` additionally reflects unconfirmed (mempool) effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub account_address: AccountAddress,
    pub block_height: u64,
    pub balance: i64,
    pub spendable_balance: i64,
    pub pop_revenue: i64,
}

impl AccountBalance {
    /// An empty balance record for `account_address`.
    pub fn empty(account_address: AccountAddress, block_height: u64) -> Self {
        Self {
            account_address,
            block_height,
            balance: 0,
            spendable_balance: 0,
            pop_revenue: 0,
        }
    }
}

/// Registration status of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegistrationStatus {
    Queued,
    Registered,
    Deleted,
}

/// A participant's registration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRegistration {
    pub node_id: NodeId,
    pub node_public_key: PublicKey,
    pub account_address: AccountAddress,
    pub registration_height: u64,
    pub locked_balance: i64,
    pub registration_status: RegistrationStatus,
    /// Height at which this version took effect.
    pub height: u64,
}

/// Participation score of a node at a height, bounded to `[0, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipationScore {
    pub node_id: NodeId,
    pub score: i64,
    pub height: u64,
}

/// A blocksmith that was ordered before the actual producer of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedBlocksmith {
    pub blocksmith_public_key: PublicKey,
    pub pop_change: i64,
    pub block_height: u64,
    pub blocksmith_index: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tags_are_distinct() {
        let bodies = [
            TransactionBody::SendMoney { amount: 1 },
            TransactionBody::NodeRegistration {
                node_public_key: [1; 32],
                locked_balance: 1,
            },
            TransactionBody::UpdateNodeRegistration {
                node_public_key: [1; 32],
                locked_balance: 1,
            },
            TransactionBody::RemoveNodeRegistration {
                node_public_key: [1; 32],
            },
        ];
        let mut tags: Vec<u32> = bodies.iter().map(TransactionBody::type_tag).collect();
        tags.dedup();
        assert_eq!(tags.len(), 4);
    }

    #[test]
    fn test_empty_balance() {
        let balance = AccountBalance::empty([7; 32], 12);
        assert_eq!(balance.balance, 0);
        assert_eq!(balance.spendable_balance, 0);
        assert_eq!(balance.block_height, 12);
    }
}
