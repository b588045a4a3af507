//! Ancestry index and query engine for the Kestrel block store.
//!
//! Every stored block carries a skip list of ancestor ids at exponentially
//! spaced heights, which lets the engine fetch the ancestor of any head at
//! any prior height in logarithmically many backend reads. This crate holds
//! the index math, the traversal and range-extraction routines, the block
//! and transaction write paths, the highest-block tracker, and the request
//! dispatcher that exposes them as typed RPCs.

pub mod ancestry;
pub mod error;
pub mod handler;
pub mod record;
pub mod skiplist;

pub use ancestry::{fill_blocks, get_ancestor_id_at_height, get_block_height, get_block_record};
pub use error::ChainError;
pub use handler::{RequestHandler, HIGHEST_BLOCK_KEY};
pub use record::{decode_record, encode_record, BlockRecord, TransactionRecord};
pub use skiplist::{previous_height_index, previous_heights};
