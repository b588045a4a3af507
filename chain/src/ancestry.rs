//! Ancestry traversal over the skip-list index.

use kestrel_store::Backend;
use kestrel_types::{BlockHeight, Multihash};

use kestrel_messages::BlockItem;

use crate::error::ChainError;
use crate::record::{decode_record, BlockRecord};
use crate::skiplist::previous_height_index;

/// Fetch and decode the record stored under `id`.
///
/// An absent key is a missing block; callers that tolerate absence check
/// the raw bytes themselves instead of going through here.
pub fn get_block_record<B: Backend + ?Sized>(
    backend: &B,
    id: &Multihash,
) -> Result<BlockRecord, ChainError> {
    let bytes = backend.get(&id.to_key_bytes())?;
    if bytes.is_empty() {
        return Err(ChainError::BlockNotPresent(id.clone()));
    }
    decode_record(&bytes)
}

/// Height of the block stored under `id`.
pub fn get_block_height<B: Backend + ?Sized>(
    backend: &B,
    id: &Multihash,
) -> Result<BlockHeight, ChainError> {
    Ok(get_block_record(backend, id)?.block_height)
}

/// Identifier of the ancestor of `block_id` at `height`, on the fork that
/// ends at `block_id`.
///
/// Each hop follows the deepest skip-list link that does not overshoot the
/// goal, so the walk takes `O(log(start - height))` fetches. Every fetched
/// record after the first must land on the height the previous link
/// promised; a mismatch means the store is corrupt.
pub fn get_ancestor_id_at_height<B: Backend + ?Sized>(
    backend: &B,
    block_id: &Multihash,
    height: BlockHeight,
) -> Result<Multihash, ChainError> {
    let mut current = block_id.clone();
    let mut expected_height: Option<BlockHeight> = None;

    loop {
        let record = get_block_record(backend, &current)?;

        if let Some(expected) = expected_height {
            if record.block_height != expected {
                tracing::warn!(
                    block_id = %record.block_id,
                    height = record.block_height,
                    expected,
                    "stored record height does not match its link"
                );
                return Err(ChainError::UnexpectedHeight);
            }
        }

        if record.block_height == height {
            return Ok(record.block_id);
        }

        let (index, next_height) = previous_height_index(height, record.block_height)?;
        if index >= record.previous_block_ids.len() {
            return Err(ChainError::UnexpectedHeight);
        }

        // Only the id matters: once the goal height shows up in a previous
        // list there is nothing left to fetch.
        current = record.previous_block_ids[index].clone();
        if next_height == height {
            return Ok(current);
        }
        expected_height = Some(next_height);
    }
}

/// Extract `num_blocks` consecutive blocks ending at `last_id`, oldest
/// first.
///
/// Slots are written back-to-front, following the height-minus-one link
/// (always index 0 of the skip list). A missing record leaves its slot as
/// the default placeholder; running out of chain with slots still unfilled
/// is an error.
pub fn fill_blocks<B: Backend + ?Sized>(
    backend: &B,
    last_id: &Multihash,
    num_blocks: u32,
    return_block: bool,
    return_receipt: bool,
) -> Result<Vec<BlockItem>, ChainError> {
    let n = num_blocks as usize;
    let mut items = vec![BlockItem::default(); n];
    let mut current = last_id.clone();

    for i in 0..n {
        let k = n - 1 - i;

        let bytes = backend.get(&current.to_key_bytes())?;
        if bytes.is_empty() {
            continue;
        }
        let record: BlockRecord = decode_record(&bytes)?;

        if k + 1 < n
            && !items[k + 1].block_id.is_empty()
            && items[k + 1].block_height != record.block_height + 1
        {
            return Err(ChainError::UnexpectedHeight);
        }

        items[k] = BlockItem {
            block_id: record.block_id,
            block_height: record.block_height,
            block: return_block.then_some(record.block),
            receipt: return_receipt.then_some(record.receipt),
        };

        if record.previous_block_ids.is_empty() {
            // Chain ended at a synthetic root.
            if i + 1 < n {
                return Err(ChainError::TraverseBeforeGenesis);
            }
            break;
        }
        current = record.previous_block_ids[0].clone();
    }

    Ok(items)
}
