//! # Mempool Backup Blob
//!
//! Transactions backed up during a rollback are stored as one blob: each
//! entry is a 4-byte little-endian length followed by the transaction bytes.

use super::errors::{MempoolError, MempoolResult};
use shared_types::CodecError;

const LENGTH_PREFIX: usize = 4;

pub fn encode_backup<B: AsRef<[u8]>>(entries: &[B]) -> Vec<u8> {
    let total = entries
        .iter()
        .map(|e| LENGTH_PREFIX + e.as_ref().len())
        .sum();
    let mut blob = Vec::with_capacity(total);
    for entry in entries {
        let bytes = entry.as_ref();
        blob.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        blob.extend_from_slice(bytes);
    }
    blob
}

pub fn decode_backup(mut blob: &[u8]) -> MempoolResult<Vec<Vec<u8>>> {
    let mut entries = Vec::new();
    while !blob.is_empty() {
        if blob.len() < LENGTH_PREFIX {
            return Err(MempoolError::Parse(CodecError::Truncated { len: blob.len() }));
        }
        let (prefix, rest) = blob.split_at(LENGTH_PREFIX);
        let mut len_bytes = [0u8; LENGTH_PREFIX];
        len_bytes.copy_from_slice(prefix);
        let len = u32::from_le_bytes(len_bytes) as usize;
        if rest.len() < len {
            return Err(MempoolError::Parse(CodecError::Truncated { len: rest.len() }));
        }
        let (entry, tail) = rest.split_at(len);
        entries.push(entry.to_vec());
        blob = tail;
    }
    Ok(entries)
}
