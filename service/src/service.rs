//! The block store service shell.
//!
//! Attaches to the message bus, runs a fixed-size pool of RPC workers as
//! competing consumers on the block store queue, and ingests the
//! block-accept broadcast. Request handling itself is synchronous; workers
//! hop onto the blocking pool for the backend-bound dispatch.

use std::sync::Arc;

use futures::StreamExt;
use lapin::message::Delivery;
use lapin::options::BasicAckOptions;
use lapin::Consumer;

use kestrel_bus::BusConnection;
use kestrel_chain::{ChainError, RequestHandler};
use kestrel_messages::codec::{self, MAX_MESSAGE_SIZE};
use kestrel_messages::{AddBlockRequest, BlockAccepted, ErrorResponse, Request, Response};
use kestrel_store::Backend;

use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::shutdown::ShutdownController;

/// RPC type this service answers; the bus queue name derives from it.
pub const RPC_TYPE: &str = "block_store";

/// Broadcast topic carrying accepted blocks.
pub const BLOCK_ACCEPT_TOPIC: &str = "kestrel.block.accept";

/// The running service: one shared backend handle, one handler, N workers.
pub struct BlockStoreService {
    config: ServiceConfig,
    handler: Arc<RequestHandler>,
    shutdown: Arc<ShutdownController>,
}

impl BlockStoreService {
    pub fn new(
        config: ServiceConfig,
        backend: Arc<dyn Backend>,
        shutdown: Arc<ShutdownController>,
    ) -> Self {
        Self {
            config,
            handler: Arc::new(RequestHandler::new(backend)),
            shutdown,
        }
    }

    /// Serve until shutdown. Reconnects to the broker whenever the
    /// connection drops; in-flight work finishes before a reconnect cycle
    /// starts consuming again.
    pub async fn run(&self) -> Result<(), ServiceError> {
        let mut shutdown_rx = self.shutdown.subscribe();
        let instance = self.config.instance_tag();

        loop {
            let connection = tokio::select! {
                conn = BusConnection::open_with_backoff(&self.config.amqp_url) => Arc::new(conn),
                _ = shutdown_rx.recv() => return Ok(()),
            };

            let consumers = match self.start_consumers(&connection, &instance).await {
                Ok(consumers) => consumers,
                Err(err) => {
                    tracing::warn!(%err, "could not set up bus consumers, reconnecting");
                    connection.close().await;
                    continue;
                }
            };

            let mut tasks = Vec::with_capacity(consumers.rpc.len() + 1);
            for (worker, consumer) in consumers.rpc.into_iter().enumerate() {
                tasks.push(tokio::spawn(rpc_worker_loop(
                    consumer,
                    Arc::clone(&connection),
                    Arc::clone(&self.handler),
                    worker,
                )));
            }
            tasks.push(tokio::spawn(broadcast_loop(
                consumers.broadcast,
                Arc::clone(&self.handler),
            )));

            tracing::info!(
                workers = self.config.worker_count(),
                instance = %instance,
                "block store serving"
            );

            let all_tasks = futures::future::join_all(tasks);
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    // Closing the connection ends every consumer stream;
                    // workers finish their current delivery and exit.
                    connection.close().await;
                    return Ok(());
                }
                _ = all_tasks => {
                    tracing::warn!("bus consumers ended, reconnecting");
                    connection.close().await;
                }
            }
        }
    }

    async fn start_consumers(
        &self,
        connection: &BusConnection,
        instance: &str,
    ) -> Result<ServiceConsumers, ServiceError> {
        let mut rpc = Vec::with_capacity(self.config.worker_count());
        for worker in 0..self.config.worker_count() {
            let tag = format!("{instance}-rpc-{worker}");
            rpc.push(connection.consume_rpc(RPC_TYPE, &tag).await?);
        }
        let broadcast = connection
            .consume_broadcast(BLOCK_ACCEPT_TOPIC, &format!("{instance}-accept"))
            .await?;
        Ok(ServiceConsumers { rpc, broadcast })
    }
}

struct ServiceConsumers {
    rpc: Vec<Consumer>,
    broadcast: Consumer,
}

/// One RPC worker: decode, dispatch, reply, ack — until the stream ends.
async fn rpc_worker_loop(
    mut consumer: Consumer,
    connection: Arc<BusConnection>,
    handler: Arc<RequestHandler>,
    worker: usize,
) {
    tracing::debug!(worker, "rpc worker started");
    while let Some(delivery) = consumer.next().await {
        let delivery = match delivery {
            Ok(delivery) => delivery,
            Err(err) => {
                tracing::warn!(worker, %err, "rpc consumer error");
                break;
            }
        };

        if let Some(reply) = dispatch_blocking(&handler, &delivery).await {
            if let Err(err) = connection.publish_reply(&delivery, &reply).await {
                tracing::warn!(worker, %err, "could not publish rpc reply");
            }
        }
        if let Err(err) = delivery.ack(BasicAckOptions::default()).await {
            tracing::warn!(worker, %err, "could not ack rpc delivery");
        }
    }
    tracing::debug!(worker, "rpc worker stopped");
}

/// Run the backend-bound dispatch on the blocking pool.
async fn dispatch_blocking(handler: &Arc<RequestHandler>, delivery: &Delivery) -> Option<Vec<u8>> {
    let handler = Arc::clone(handler);
    let payload = delivery.data.clone();
    match tokio::task::spawn_blocking(move || process_rpc_payload(&handler, &payload)).await {
        Ok(reply) => reply,
        Err(err) => {
            tracing::error!(%err, "rpc dispatch task failed");
            None
        }
    }
}

/// Decode, dispatch, and encode one RPC exchange.
///
/// An undecodable request is answered like an unknown variant; an oversized
/// response is replaced by the overflow error inside `encode_capped`. `None`
/// means there is nothing sensible to send back.
pub(crate) fn process_rpc_payload(handler: &RequestHandler, payload: &[u8]) -> Option<Vec<u8>> {
    let response = match codec::decode::<Request>(payload) {
        Ok(request) => handler.handle(&request),
        Err(err) => {
            tracing::debug!(%err, "undecodable rpc request");
            Response::Error(ErrorResponse {
                message: ChainError::UnknownRequest.to_string(),
            })
        }
    };

    match codec::encode_capped(&response, MAX_MESSAGE_SIZE) {
        Ok(bytes) => Some(bytes),
        Err(err) => {
            tracing::error!(%err, "could not encode rpc response");
            None
        }
    }
}

/// The broadcast ingester: store every accepted block, log and drop errors.
async fn broadcast_loop(mut consumer: Consumer, handler: Arc<RequestHandler>) {
    tracing::debug!("block accept ingester started");
    while let Some(delivery) = consumer.next().await {
        let delivery = match delivery {
            Ok(delivery) => delivery,
            Err(err) => {
                tracing::warn!(%err, "broadcast consumer error");
                break;
            }
        };

        let handler = Arc::clone(&handler);
        let payload = delivery.data.clone();
        if let Err(err) =
            tokio::task::spawn_blocking(move || handle_block_accepted(&handler, &payload)).await
        {
            tracing::error!(%err, "broadcast ingest task failed");
        }
        if let Err(err) = delivery.ack(BasicAckOptions::default()).await {
            tracing::warn!(%err, "could not ack broadcast delivery");
        }
    }
    tracing::debug!("block accept ingester stopped");
}

/// Store one accepted block and advance the highest-block pointer.
pub(crate) fn handle_block_accepted(handler: &RequestHandler, payload: &[u8]) {
    let event: BlockAccepted = match codec::decode(payload) {
        Ok(event) => event,
        Err(err) => {
            tracing::warn!(%err, "undecodable block accept broadcast");
            return;
        }
    };

    let id = event.block.id.clone();
    let height = event.block.header.height;
    let request = AddBlockRequest {
        block_to_add: Some(event.block),
        receipt_to_add: Some(event.receipt),
    };
    match handler.add_block(&request) {
        Ok(_) => tracing::info!(block = %id, height, "accepted block stored"),
        Err(err) => tracing::warn!(block = %id, height, %err, "could not store accepted block"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_messages::{GetBlocksByIdRequest, GetHighestBlockResponse};
    use kestrel_store::MemoryBackend;
    use kestrel_types::{Block, BlockHeader, BlockReceipt, Multihash, SHA2_256};

    fn test_handler() -> RequestHandler {
        RequestHandler::new(Arc::new(MemoryBackend::new()))
    }

    fn test_block(height: u64) -> Block {
        Block {
            id: Multihash::new(SHA2_256, vec![height as u8; 32]),
            header: BlockHeader {
                previous: if height == 1 {
                    Multihash::zero()
                } else {
                    Multihash::new(SHA2_256, vec![height as u8 - 1; 32])
                },
                height,
                timestamp: height,
            },
            payload: b"payload".to_vec(),
            signature: Vec::new(),
        }
    }

    #[test]
    fn rpc_payload_round_trip() {
        let handler = test_handler();

        let add = codec::encode(&Request::AddBlock(AddBlockRequest {
            block_to_add: Some(test_block(1)),
            receipt_to_add: None,
        }))
        .unwrap();
        let reply = process_rpc_payload(&handler, &add).unwrap();
        assert!(matches!(
            codec::decode::<Response>(&reply).unwrap(),
            Response::AddBlock(_)
        ));

        let query = codec::encode(&Request::GetBlocksById(GetBlocksByIdRequest {
            block_ids: Some(vec![test_block(1).id]),
            return_block: true,
            return_receipt: false,
        }))
        .unwrap();
        let reply = process_rpc_payload(&handler, &query).unwrap();
        match codec::decode::<Response>(&reply).unwrap() {
            Response::GetBlocksById(resp) => {
                assert_eq!(resp.block_items[0].block.as_ref().unwrap(), &test_block(1));
            }
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[test]
    fn undecodable_request_is_answered_with_unknown() {
        let handler = test_handler();
        let reply = process_rpc_payload(&handler, &[0xFF; 8]).unwrap();
        match codec::decode::<Response>(&reply).unwrap() {
            Response::Error(err) => assert_eq!(err.message, "Unknown request"),
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[test]
    fn broadcast_stores_block_and_advances_highest() {
        let handler = test_handler();
        let event = BlockAccepted {
            block: test_block(1),
            receipt: BlockReceipt(b"receipt".to_vec()),
        };
        handle_block_accepted(&handler, &codec::encode(&event).unwrap());

        let reply = process_rpc_payload(
            &handler,
            &codec::encode(&Request::GetHighestBlock).unwrap(),
        )
        .unwrap();
        match codec::decode::<Response>(&reply).unwrap() {
            Response::GetHighestBlock(GetHighestBlockResponse { topology }) => {
                assert_eq!(topology.height, 1);
                assert_eq!(topology.id, test_block(1).id);
            }
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[test]
    fn undecodable_broadcast_is_dropped() {
        let handler = test_handler();
        handle_block_accepted(&handler, &[0xAA; 6]);
        // Nothing stored, nothing panicked.
        let err = handler.get_highest_block().unwrap_err();
        assert_eq!(err.to_string(), "Unexpected height (corrupt block store?)");
    }
}
