//! Block topology — the (id, previous, height) triple that positions a block.

use serde::{Deserialize, Serialize};

use crate::block::BlockHeight;
use crate::multihash::Multihash;

/// Summarizes a block's position on its fork. The store persists one of
/// these under a reserved key to track the highest known block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockTopology {
    pub id: Multihash,
    pub previous: Multihash,
    pub height: BlockHeight,
}
