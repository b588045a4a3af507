use thiserror::Error;

use kestrel_store::StoreError;
use kestrel_types::Multihash;

/// Errors of the ancestry engine and request handler.
///
/// The display strings are observable: the dispatcher ships them across the
/// wire inside the error response variant, so they are part of the service
/// contract and must not drift.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Reserved request is not supported")]
    ReservedRequest,

    #[error("Unknown request")]
    UnknownRequest,

    #[error("Internal constraint was violated")]
    InternalConstraint,

    #[error("Block not present - ID: {0}")]
    BlockNotPresent(Multihash),

    #[error("Transaction was not present")]
    TransactionNotPresent,

    #[error("Could not deserialize block")]
    Deserialize,

    #[error("Unexpected height (corrupt block store?)")]
    UnexpectedHeight,

    #[error("Attempt to traverse before genesis")]
    TraverseBeforeGenesis,

    #[error("Block height mismatch")]
    HeightMismatch,

    #[error("Cannot add empty optional block")]
    EmptyBlock,

    #[error("Cannot add empty transaction id")]
    EmptyTransactionId,

    #[error("Cannot add empty transaction")]
    EmptyTransaction,

    #[error("ancestor_start_height must be greater than 0")]
    InvalidStartHeight,

    #[error("num_blocks must be greater than 0")]
    InvalidNumBlocks,

    #[error("expected field '{0}' was nil")]
    NilField(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),
}
