//! Request handler — the write path, read endpoints, and dispatcher.

use std::sync::Arc;

use kestrel_messages::{
    AddBlockRequest, AddBlockResponse, AddTransactionRequest, AddTransactionResponse, BlockItem,
    ErrorResponse, GetBlocksByHeightRequest, GetBlocksByHeightResponse, GetBlocksByIdRequest,
    GetBlocksByIdResponse, GetHighestBlockResponse, GetTransactionsByIdRequest,
    GetTransactionsByIdResponse, Request, Response, TransactionItem,
};
use kestrel_store::Backend;
use kestrel_types::BlockTopology;

use crate::ancestry::{fill_blocks, get_ancestor_id_at_height, get_block_height};
use crate::error::ChainError;
use crate::record::{decode_record, encode_record, BlockRecord, TransactionRecord};
use crate::skiplist::previous_heights;

/// Reserved key holding the highest-block topology. Identifier keys always
/// start with their multihash code byte, so `0x01` can never collide.
pub const HIGHEST_BLOCK_KEY: &[u8] = &[0x01];

/// Stateless handler for block store requests; shares one backend handle
/// across the worker pool.
pub struct RequestHandler {
    backend: Arc<dyn Backend>,
}

impl RequestHandler {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Dispatch a request to its operation.
    ///
    /// Total: never propagates an error to the transport. Any failure is
    /// translated into the error response variant carrying the error's
    /// message text.
    pub fn handle(&self, request: &Request) -> Response {
        let result = match request {
            Request::Reserved => Err(ChainError::ReservedRequest),
            Request::GetBlocksById(req) => {
                self.get_blocks_by_id(req).map(Response::GetBlocksById)
            }
            Request::GetBlocksByHeight(req) => self
                .get_blocks_by_height(req)
                .map(Response::GetBlocksByHeight),
            Request::AddBlock(req) => self.add_block(req).map(Response::AddBlock),
            Request::AddTransaction(req) => {
                self.add_transaction(req).map(Response::AddTransaction)
            }
            Request::GetTransactionsById(req) => self
                .get_transactions_by_id(req)
                .map(Response::GetTransactionsById),
            Request::GetHighestBlock => {
                self.get_highest_block().map(Response::GetHighestBlock)
            }
        };

        result.unwrap_or_else(|err| {
            Response::Error(ErrorResponse {
                message: err.to_string(),
            })
        })
    }

    /// Store a block record, materializing its skip list of ancestors.
    ///
    /// The height-minus-one link is the block's own declared previous; every
    /// deeper link is resolved by walking from that previous, which requires
    /// the ancestors to have been stored by earlier adds. Re-adding a block
    /// with identical content is a harmless rewrite.
    pub fn add_block(&self, request: &AddBlockRequest) -> Result<AddBlockResponse, ChainError> {
        let block = request.block_to_add.as_ref().ok_or(ChainError::EmptyBlock)?;

        let height = block.header.height;
        let previous = &block.header.previous;

        let mut previous_block_ids = Vec::new();
        if height > 0 {
            let heights = previous_heights(height);
            previous_block_ids.reserve(heights.len());
            for h in heights {
                if h >= height {
                    return Err(ChainError::InternalConstraint);
                }
                if h == height - 1 {
                    previous_block_ids.push(previous.clone());
                } else {
                    previous_block_ids.push(get_ancestor_id_at_height(
                        &*self.backend,
                        previous,
                        h,
                    )?);
                }
            }
        }

        let record = BlockRecord {
            block_id: block.id.clone(),
            block_height: height,
            previous_block_ids,
            block: block.clone(),
            receipt: request.receipt_to_add.clone().unwrap_or_default(),
        };

        let value = encode_record(&record)?;
        self.backend.put(&record.block_id.to_key_bytes(), &value)?;

        self.update_highest_block(&BlockTopology {
            id: block.id.clone(),
            previous: previous.clone(),
            height,
        })?;

        Ok(AddBlockResponse {})
    }

    /// Store a transaction record under its id.
    pub fn add_transaction(
        &self,
        request: &AddTransactionRequest,
    ) -> Result<AddTransactionResponse, ChainError> {
        let id = request
            .transaction_id
            .as_ref()
            .ok_or(ChainError::NilField("transaction_id"))?;
        let transaction = request
            .transaction
            .as_ref()
            .ok_or(ChainError::NilField("transaction"))?;

        if id.is_empty() {
            return Err(ChainError::EmptyTransactionId);
        }
        if transaction.0.is_empty() {
            return Err(ChainError::EmptyTransaction);
        }

        let record = TransactionRecord {
            transaction: transaction.clone(),
        };
        let value = encode_record(&record)?;
        self.backend.put(&id.to_key_bytes(), &value)?;

        Ok(AddTransactionResponse {})
    }

    /// Advance the highest-block topology, monotonically by height.
    ///
    /// Broadcasts can arrive out of order during catch-up; only a strictly
    /// greater height overwrites. An unreadable stored topology is treated
    /// as absent.
    pub fn update_highest_block(&self, topology: &BlockTopology) -> Result<(), ChainError> {
        let bytes = self.backend.get(HIGHEST_BLOCK_KEY)?;
        if !bytes.is_empty() {
            if let Ok(current) = decode_record::<BlockTopology>(&bytes) {
                if current.height >= topology.height {
                    return Ok(());
                }
            }
        }
        let value = encode_record(topology)?;
        self.backend.put(HIGHEST_BLOCK_KEY, &value)?;
        Ok(())
    }

    /// Look up blocks by id. Tolerant: a missing or undecodable record
    /// leaves the default placeholder in its slot.
    pub fn get_blocks_by_id(
        &self,
        request: &GetBlocksByIdRequest,
    ) -> Result<GetBlocksByIdResponse, ChainError> {
        let ids = request
            .block_ids
            .as_ref()
            .ok_or(ChainError::NilField("block_ids"))?;

        let mut block_items = Vec::with_capacity(ids.len());
        for id in ids {
            let bytes = self.backend.get(&id.to_key_bytes())?;
            if bytes.is_empty() {
                block_items.push(BlockItem::default());
                continue;
            }
            match decode_record::<BlockRecord>(&bytes) {
                Ok(record) => block_items.push(BlockItem {
                    block_id: record.block_id,
                    block_height: record.block_height,
                    block: request.return_block.then_some(record.block),
                    receipt: request.return_receipt.then_some(record.receipt),
                }),
                Err(_) => block_items.push(BlockItem::default()),
            }
        }

        Ok(GetBlocksByIdResponse { block_items })
    }

    /// Return the ancestors of `head_block_id` at heights
    /// `[ancestor_start_height, ancestor_start_height + num_blocks)`,
    /// clamped to the head's own height, oldest first.
    pub fn get_blocks_by_height(
        &self,
        request: &GetBlocksByHeightRequest,
    ) -> Result<GetBlocksByHeightResponse, ChainError> {
        let head_block_id = request
            .head_block_id
            .as_ref()
            .ok_or(ChainError::NilField("head_block_id"))?;
        if request.num_blocks < 1 {
            return Err(ChainError::InvalidNumBlocks);
        }
        if request.ancestor_start_height < 1 {
            return Err(ChainError::InvalidStartHeight);
        }

        let head_height = get_block_height(&*self.backend, head_block_id)?;
        if request.ancestor_start_height > head_height {
            return Err(ChainError::HeightMismatch);
        }

        let end_height = head_height.min(
            request
                .ancestor_start_height
                .saturating_add(request.num_blocks as u64 - 1),
        );
        let num_blocks = (end_height - request.ancestor_start_height + 1) as u32;

        let end_id = get_ancestor_id_at_height(&*self.backend, head_block_id, end_height)?;
        let block_items = fill_blocks(
            &*self.backend,
            &end_id,
            num_blocks,
            request.return_block,
            request.return_receipt,
        )?;

        match block_items.first() {
            Some(first) if first.block_height == request.ancestor_start_height => {}
            _ => return Err(ChainError::UnexpectedHeight),
        }

        Ok(GetBlocksByHeightResponse { block_items })
    }

    /// Look up transactions by id. Unlike block lookups, a missing
    /// transaction is fatal.
    pub fn get_transactions_by_id(
        &self,
        request: &GetTransactionsByIdRequest,
    ) -> Result<GetTransactionsByIdResponse, ChainError> {
        let ids = request
            .transaction_ids
            .as_ref()
            .ok_or(ChainError::NilField("transaction_ids"))?;

        let mut transaction_items = Vec::with_capacity(ids.len());
        for id in ids {
            let bytes = self.backend.get(&id.to_key_bytes())?;
            if bytes.is_empty() {
                return Err(ChainError::TransactionNotPresent);
            }
            let record: TransactionRecord = decode_record(&bytes)?;
            transaction_items.push(TransactionItem {
                transaction: record.transaction,
            });
        }

        Ok(GetTransactionsByIdResponse { transaction_items })
    }

    /// The best-known head, from the reserved meta key.
    pub fn get_highest_block(&self) -> Result<GetHighestBlockResponse, ChainError> {
        let bytes = self.backend.get(HIGHEST_BLOCK_KEY)?;
        if bytes.is_empty() {
            return Err(ChainError::UnexpectedHeight);
        }
        let topology: BlockTopology = decode_record(&bytes)?;
        Ok(GetHighestBlockResponse { topology })
    }
}
