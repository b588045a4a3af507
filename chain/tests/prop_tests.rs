use std::sync::Arc;

use proptest::prelude::*;

use kestrel_chain::{
    get_ancestor_id_at_height, previous_height_index, previous_heights, RequestHandler,
};
use kestrel_messages::AddBlockRequest;
use kestrel_store::MemoryBackend;
use kestrel_types::{Block, BlockHeader, BlockTopology, Multihash, SHA2_256};

fn id_for(n: u64) -> Multihash {
    if n == 0 {
        return Multihash::zero();
    }
    let mut digest = vec![0u8; 32];
    digest[..8].copy_from_slice(&n.to_le_bytes());
    digest[8] = 0xC3;
    Multihash::new(SHA2_256, digest)
}

proptest! {
    /// The skip list is strictly decreasing and exactly
    /// `trailing_zeros + 1` long.
    #[test]
    fn skip_list_shape(height in 1u64..u64::MAX / 2) {
        let heights = previous_heights(height);
        prop_assert_eq!(heights.len() as u32, height.trailing_zeros() + 1);
        for pair in heights.windows(2) {
            prop_assert!(pair[0] > pair[1]);
        }
        for (i, h) in heights.iter().enumerate() {
            prop_assert_eq!(*h, height - (1u64 << i));
        }
    }

    /// The allocation-free index agrees with the materialized list and
    /// picks the largest index not past the goal.
    #[test]
    fn index_is_largest_not_past_goal(current in 1u64..1_000_000, offset in 0u64..1_000_000) {
        let goal = offset % current;
        let heights = previous_heights(current);
        let (index, height) = previous_height_index(goal, current).unwrap();
        prop_assert_eq!(heights[index], height);
        prop_assert!(height >= goal);
        if index + 1 < heights.len() {
            prop_assert!(heights[index + 1] < goal);
        }
    }

    /// After any offer sequence, the stored highest block is the max height
    /// ever offered.
    #[test]
    fn highest_block_is_max_of_offers(heights in prop::collection::vec(0u64..10_000, 1..32)) {
        let handler = RequestHandler::new(Arc::new(MemoryBackend::new()));
        for &height in &heights {
            handler.update_highest_block(&BlockTopology {
                id: id_for(height + 1),
                previous: id_for(height),
                height,
            }).unwrap();
        }
        let stored = handler.get_highest_block().unwrap().topology;
        prop_assert_eq!(stored.height, *heights.iter().max().unwrap());
    }

    /// On a linear chain built through the write path, every ancestor query
    /// lands on the block at the requested height.
    #[test]
    fn ancestor_walks_land_on_the_right_height(len in 1u64..128, seed in any::<u64>()) {
        let handler = RequestHandler::new(Arc::new(MemoryBackend::new()));
        for height in 1..=len {
            handler.add_block(&AddBlockRequest {
                block_to_add: Some(Block {
                    id: id_for(height),
                    header: BlockHeader {
                        previous: id_for(height - 1),
                        height,
                        timestamp: height,
                    },
                    payload: height.to_le_bytes().to_vec(),
                    signature: Vec::new(),
                }),
                receipt_to_add: None,
            }).unwrap();
        }

        let head = 1 + seed % len;
        let goal = 1 + seed % head;
        let ancestor =
            get_ancestor_id_at_height(&**handler.backend(), &id_for(head), goal).unwrap();
        prop_assert_eq!(ancestor, id_for(goal));
    }
}
