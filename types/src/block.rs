//! Block, receipt, and transaction payloads.
//!
//! The block store never interprets payload bytes; it only needs the header
//! fields that position a block on its fork (height and previous id).

use serde::{Deserialize, Serialize};

use crate::multihash::Multihash;

/// Height of a block on its fork. Height 0 is reserved for the synthetic
/// "empty" parent; the first real block has height 1.
pub type BlockHeight = u64;

/// The part of a block the store actually reads.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Identifier of the parent block (the zero multihash for height 1).
    pub previous: Multihash,
    pub height: BlockHeight,
    pub timestamp: u64,
}

/// A full block as delivered by the broadcaster: content-addressed by `id`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: Multihash,
    pub header: BlockHeader,
    /// Opaque body bytes (operations, signatures of the payload, ...).
    pub payload: Vec<u8>,
    pub signature: Vec<u8>,
}

/// Execution receipt for a block. Opaque to the store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockReceipt(pub Vec<u8>);

/// A transaction payload. Opaque to the store; keyed externally by its id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction(pub Vec<u8>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_block_has_empty_previous() {
        let block = Block::default();
        assert!(block.id.is_empty());
        assert!(block.header.previous.is_empty());
        assert_eq!(block.header.height, 0);
    }
}
