//! RPC message types for the Kestrel block store.
//!
//! Requests and responses are closed sum types; the dispatcher is a total
//! function from request variant to response variant. Adding an endpoint is
//! a type-checked change in both enums.

pub mod codec;

use serde::{Deserialize, Serialize};

use kestrel_types::{Block, BlockHeight, BlockReceipt, BlockTopology, Multihash, Transaction};

/// Every RPC the block store answers.
///
/// Fields the wire schema marks optional are `Option`s; a `None` where a
/// value is required is reported as a missing-field error by the handler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    /// Variant 0 of the wire schema; always answered with an error.
    Reserved,
    GetBlocksById(GetBlocksByIdRequest),
    GetBlocksByHeight(GetBlocksByHeightRequest),
    AddBlock(AddBlockRequest),
    AddTransaction(AddTransactionRequest),
    GetTransactionsById(GetTransactionsByIdRequest),
    GetHighestBlock,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetBlocksByIdRequest {
    pub block_ids: Option<Vec<Multihash>>,
    pub return_block: bool,
    pub return_receipt: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetBlocksByHeightRequest {
    pub head_block_id: Option<Multihash>,
    pub ancestor_start_height: BlockHeight,
    pub num_blocks: u32,
    pub return_block: bool,
    pub return_receipt: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddBlockRequest {
    pub block_to_add: Option<Block>,
    pub receipt_to_add: Option<BlockReceipt>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddTransactionRequest {
    pub transaction_id: Option<Multihash>,
    pub transaction: Option<Transaction>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetTransactionsByIdRequest {
    pub transaction_ids: Option<Vec<Multihash>>,
}

/// Every answer the block store produces.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    Error(ErrorResponse),
    GetBlocksById(GetBlocksByIdResponse),
    GetBlocksByHeight(GetBlocksByHeightResponse),
    AddBlock(AddBlockResponse),
    AddTransaction(AddTransactionResponse),
    GetTransactionsById(GetTransactionsByIdResponse),
    GetHighestBlock(GetHighestBlockResponse),
}

/// Structured error answer; `message` is the observable error text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetBlocksByIdResponse {
    pub block_items: Vec<BlockItem>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetBlocksByHeightResponse {
    pub block_items: Vec<BlockItem>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddBlockResponse {}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddTransactionResponse {}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetTransactionsByIdResponse {
    pub transaction_items: Vec<TransactionItem>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetHighestBlockResponse {
    pub topology: BlockTopology,
}

/// One element of a block range answer.
///
/// A block that does not exist is reported as the default value in its
/// slot: empty `block_id`, zero height, no payloads.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockItem {
    pub block_id: Multihash,
    pub block_height: BlockHeight,
    pub block: Option<Block>,
    pub receipt: Option<BlockReceipt>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionItem {
    pub transaction: Transaction,
}

/// The event broadcast by the chain when a block is accepted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockAccepted {
    pub block: Block,
    pub receipt: BlockReceipt,
}
