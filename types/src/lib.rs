//! Fundamental types for the Kestrel block store.
//!
//! This crate defines the types shared across every other crate in the
//! workspace: multihash identifiers, block/receipt/transaction payloads,
//! and the block topology triple.

pub mod block;
pub mod multihash;
pub mod topology;

pub use block::{Block, BlockHeader, BlockHeight, BlockReceipt, Transaction};
pub use multihash::{Multihash, SHA2_256, SHA2_256_LEN};
pub use topology::BlockTopology;
