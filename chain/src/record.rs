//! Stored record types and their deterministic binary codec.
//!
//! Records are the values the backend holds: a block record under its
//! block id, a transaction record under its transaction id, and the highest
//! block topology under the reserved meta key. Consumers treat the encoded
//! form as opaque bytes.

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use kestrel_types::{Block, BlockHeight, BlockReceipt, Multihash, Transaction};

use crate::error::ChainError;

/// A stored block, augmented with its skip list of ancestor ids.
///
/// `previous_block_ids[i]` is the ancestor on this record's fork at height
/// `previous_heights(block_height)[i]`; the two sequences align one-to-one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub block_id: Multihash,
    pub block_height: BlockHeight,
    pub previous_block_ids: Vec<Multihash>,
    pub block: Block,
    pub receipt: BlockReceipt,
}

/// A stored transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction: Transaction,
}

/// Encode a record for storage.
pub fn encode_record<T: Serialize>(value: &T) -> Result<Vec<u8>, ChainError> {
    bincode::options()
        .serialize(value)
        .map_err(|_| ChainError::Deserialize)
}

/// Decode a stored record.
///
/// The codec options reject trailing bytes, so a decode that would consume
/// fewer bytes than present fails like any other malformed input.
pub fn decode_record<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ChainError> {
    bincode::options()
        .deserialize(bytes)
        .map_err(|_| ChainError::Deserialize)
}
