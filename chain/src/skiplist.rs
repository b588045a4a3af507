//! Skip-list index math.
//!
//! A record at height `h` links to its ancestors at heights
//! `h - 2^0, h - 2^1, ..., h - 2^k` where `k = trailing_zeros(h)`. Following
//! the deepest link that does not overshoot the goal reaches any ancestor in
//! `O(log(h - goal))` hops.

use kestrel_types::BlockHeight;

use crate::error::ChainError;

/// The heights a record at `height` must link to, strictly decreasing.
///
/// Empty for height 0; otherwise has `trailing_zeros(height) + 1` entries.
pub fn previous_heights(height: BlockHeight) -> Vec<BlockHeight> {
    if height == 0 {
        return Vec::new();
    }

    let zeros = height.trailing_zeros();
    let mut heights = Vec::with_capacity(zeros as usize + 1);
    for i in 0..=zeros {
        heights.push(height - (1u64 << i));
    }
    heights
}

/// The link to follow when walking from `current` toward `goal`.
///
/// Returns the largest index `i` into `previous_heights(current)` whose
/// height is still `>= goal`, together with that height. Choosing the
/// largest such index is what keeps the walk logarithmic.
///
/// Runs the same recurrence as [`previous_heights`] without materializing
/// the list. Errors with a height mismatch when `goal >= current`.
pub fn previous_height_index(
    goal: BlockHeight,
    current: BlockHeight,
) -> Result<(usize, BlockHeight), ChainError> {
    if goal >= current {
        return Err(ChainError::HeightMismatch);
    }

    let zeros = current.trailing_zeros();
    let mut index = 0usize;
    let mut height = current - 1;
    for i in 1..=zeros {
        let h = current - (1u64 << i);
        if h < goal {
            break;
        }
        index = i as usize;
        height = h;
    }
    Ok((index, height))
}
