//! # Canonical Codec
//!
//! Canonical byte forms, hashes and IDs of chain entities.
//!
//! - Encoding is bincode over a fixed field tuple; the signature (64 bytes)
//!   is appended raw, so the unsigned form is a strict prefix of the signed one.
//! - Hashes are SHA3-256 over the signed bytes.
//! - IDs are the first 8 bytes of the hash, little endian.

use crate::entities::*;
use crate::errors::CodecError;
use sha3::{Digest, Sha3_256};

/// Length of the raw signature trailer.
pub const SIGNATURE_LENGTH: usize = 64;

/// SHA3-256 of `data`.
pub fn sha3_256(data: &[u8]) -> Hash {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// First 8 bytes of `hash`, little endian.
pub fn id_from_hash(hash: &Hash) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash[..8]);
    u64::from_le_bytes(bytes)
}

/// Node ID derived from the node public key.
pub fn node_id(node_public_key: &PublicKey) -> NodeId {
    id_from_hash(&sha3_256(node_public_key))
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    bincode::serialize(value).map_err(|e| CodecError::Encode(e.to_string()))
}

fn split_signature(bytes: &[u8]) -> Result<(&[u8], Signature), CodecError> {
    if bytes.len() <= SIGNATURE_LENGTH {
        return Err(CodecError::Truncated { len: bytes.len() });
    }
    let (body, sig) = bytes.split_at(bytes.len() - SIGNATURE_LENGTH);
    let mut signature = [0u8; SIGNATURE_LENGTH];
    signature.copy_from_slice(sig);
    Ok((body, signature))
}

type TransactionFields = (u8, Timestamp, AccountAddress, Option<AccountAddress>, i64, TransactionBody);

// =============================================================================
// TRANSACTIONS
// =============================================================================

impl Transaction {
    /// Builds an unsigned transaction. The ID is assigned by [`Transaction::seal`].
    pub fn new(
        timestamp: Timestamp,
        sender: AccountAddress,
        recipient: Option<AccountAddress>,
        fee: i64,
        body: TransactionBody,
    ) -> Self {
        Self {
            id: 0,
            version: 1,
            timestamp,
            sender,
            recipient,
            fee,
            body,
            signature: EMPTY_SIGNATURE,
            block_id: None,
            height: None,
            transaction_index: None,
        }
    }

    /// The bytes covered by the signature.
    pub fn unsigned_bytes(&self) -> Result<Vec<u8>, CodecError> {
        encode(&(
            self.version,
            self.timestamp,
            self.sender,
            self.recipient,
            self.fee,
            &self.body,
        ))
    }

    /// Full wire form: unsigned bytes followed by the signature.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let mut bytes = self.unsigned_bytes()?;
        bytes.extend_from_slice(&self.signature);
        Ok(bytes)
    }

    /// Parses the wire form and derives the ID.
    ///
    /// Block placement fields are left unset.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let (body_bytes, signature) = split_signature(bytes)?;
        let (version, timestamp, sender, recipient, fee, body): TransactionFields =
            bincode::deserialize(body_bytes)?;
        let mut tx = Self {
            id: 0,
            version,
            timestamp,
            sender,
            recipient,
            fee,
            body,
            signature,
            block_id: None,
            height: None,
            transaction_index: None,
        };
        let reencoded = tx.unsigned_bytes()?;
        if reencoded.len() != body_bytes.len() {
            return Err(CodecError::TrailingBytes {
                extra: body_bytes.len().saturating_sub(reencoded.len()),
            });
        }
        tx.id = id_from_hash(&sha3_256(bytes));
        Ok(tx)
    }

    /// SHA3-256 of the signed bytes.
    pub fn hash(&self) -> Result<Hash, CodecError> {
        Ok(sha3_256(&self.to_bytes()?))
    }

    /// ID derived from the current content.
    pub fn compute_id(&self) -> Result<TransactionId, CodecError> {
        Ok(id_from_hash(&self.hash()?))
    }

    /// Serialized size in bytes.
    pub fn size(&self) -> Result<usize, CodecError> {
        Ok(self.unsigned_bytes()?.len() + SIGNATURE_LENGTH)
    }

    /// Attaches `signature` and derives the ID.
    pub fn seal(mut self, signature: Signature) -> Result<Self, CodecError> {
        self.signature = signature;
        self.id = self.compute_id()?;
        Ok(self)
    }
}

// =============================================================================
// RECEIPTS
// =============================================================================

impl BatchReceipt {
    /// The bytes covered by the recipient signature.
    pub fn unsigned_bytes(&self) -> Result<Vec<u8>, CodecError> {
        encode(&(
            self.sender_public_key,
            self.recipient_public_key,
            self.datum_type,
            self.datum_hash,
            self.reference_block_height,
            self.reference_block_hash,
            self.rmr_linked,
        ))
    }

    /// Unsigned bytes followed by the signature.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let mut bytes = self.unsigned_bytes()?;
        bytes.extend_from_slice(&self.recipient_signature);
        Ok(bytes)
    }

    pub fn hash(&self) -> Result<Hash, CodecError> {
        Ok(sha3_256(&self.to_bytes()?))
    }
}

impl PublishedReceipt {
    /// Bytes included in the block payload.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let mut bytes = self.batch_receipt.to_bytes()?;
        bytes.extend_from_slice(&encode(&(
            &self.intermediate_hashes,
            self.block_height,
            self.receipt_index,
            self.published_index,
        ))?);
        Ok(bytes)
    }
}

// =============================================================================
// BLOCKS
// =============================================================================

/// Payload hash and length over transactions and receipts, in block order.
pub fn compute_payload(
    transactions: &[Transaction],
    receipts: &[PublishedReceipt],
) -> Result<(Hash, u32), CodecError> {
    let mut payload = Vec::new();
    for tx in transactions {
        payload.extend_from_slice(&tx.to_bytes()?);
    }
    for receipt in receipts {
        payload.extend_from_slice(&receipt.to_bytes()?);
    }
    let length = u32::try_from(payload.len())
        .map_err(|_| CodecError::Encode(format!("payload too large: {}", payload.len())))?;
    Ok((sha3_256(&payload), length))
}

impl Block {
    /// The bytes covered by the blocksmith signature.
    pub fn unsigned_bytes(&self) -> Result<Vec<u8>, CodecError> {
        encode(&(
            self.version,
            self.timestamp,
            self.total_amount,
            self.total_fee,
            self.total_coinbase,
            self.payload_length,
            self.payload_hash,
            self.blocksmith_public_key,
            self.block_seed,
            self.previous_block_hash,
        ))
    }

    /// Unsigned bytes followed by the block signature.
    pub fn signed_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let mut bytes = self.unsigned_bytes()?;
        bytes.extend_from_slice(&self.block_signature);
        Ok(bytes)
    }

    /// SHA3-256 of the signed bytes.
    pub fn compute_hash(&self) -> Result<Hash, CodecError> {
        Ok(sha3_256(&self.signed_bytes()?))
    }

    /// Attaches `signature`, then derives hash and ID.
    pub fn seal(&mut self, signature: Signature) -> Result<(), CodecError> {
        self.block_signature = signature;
        self.block_hash = self.compute_hash()?;
        self.id = id_from_hash(&self.block_hash);
        Ok(())
    }

    /// IDs of the embedded transactions, or the carried ID list when the
    /// bodies are absent.
    pub fn transaction_id_list(&self) -> Vec<TransactionId> {
        if self.transactions.is_empty() {
            self.transaction_ids.clone()
        } else {
            self.transactions.iter().map(|tx| tx.id).collect()
        }
    }

    /// Copy for broadcast: bodies replaced by their ID list.
    pub fn strip_transactions(&self) -> Block {
        let mut stripped = self.clone();
        stripped.transaction_ids = self.transaction_id_list();
        stripped.transactions.clear();
        stripped
    }

    /// Encodes the whole block, bodies included.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        encode(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(bincode::deserialize(bytes)?)
    }
}
