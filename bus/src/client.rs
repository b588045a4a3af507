//! AMQP connection handling.
//!
//! The bus carries two kinds of traffic:
//! - RPC: a durable queue per rpc type (`kestrel_rpc_<type>`), shared by
//!   competing consumers across service instances; replies go to the
//!   caller's private queue named in `reply_to`.
//! - Broadcast: a topic exchange (`kestrel_event`); each subscriber binds an
//!   exclusive server-named queue to the topics it wants.

use std::time::Duration;

use lapin::message::Delivery;
use lapin::options::{
    BasicConsumeOptions, BasicPublishOptions, ExchangeDeclareOptions, QueueBindOptions,
    QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, Consumer, ExchangeKind};

use crate::error::BusError;

/// The topic exchange every broadcast flows through.
pub const EVENT_EXCHANGE: &str = "kestrel_event";

/// Queue name for an rpc type.
pub fn rpc_queue_name(rpc_type: &str) -> String {
    format!("kestrel_rpc_{rpc_type}")
}

// Reconnect backoff: linear, capped.
const RETRY_MIN_DELAY_SECS: u64 = 1;
const RETRY_DELAY_PER_RETRY_SECS: u64 = 2;
const RETRY_MAX_DELAY_SECS: u64 = 25;

/// A live connection to the broker with one channel for all consume and
/// publish traffic.
pub struct BusConnection {
    connection: Connection,
    channel: Channel,
}

impl BusConnection {
    /// Dial the broker and declare the event exchange. One attempt; the
    /// caller decides whether to retry.
    pub async fn open(url: &str) -> Result<Self, BusError> {
        tracing::debug!(url, "dialing AMQP broker");
        let connection = Connection::connect(url, ConnectionProperties::default()).await?;
        let channel = connection.create_channel().await?;

        channel
            .exchange_declare(
                EVENT_EXCHANGE,
                ExchangeKind::Topic,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        Ok(Self {
            connection,
            channel,
        })
    }

    /// Dial the broker, retrying with linear backoff until it answers.
    pub async fn open_with_backoff(url: &str) -> Self {
        let mut retries = 0u64;
        loop {
            match Self::open(url).await {
                Ok(conn) => {
                    tracing::info!(url, "connected to AMQP broker");
                    return conn;
                }
                Err(err) => {
                    let delay = (RETRY_MIN_DELAY_SECS + RETRY_DELAY_PER_RETRY_SECS * retries)
                        .min(RETRY_MAX_DELAY_SECS);
                    tracing::warn!(%err, delay_secs = delay, "AMQP connection failed, retrying");
                    tokio::time::sleep(Duration::from_secs(delay)).await;
                    retries += 1;
                }
            }
        }
    }

    /// True while the underlying connection is healthy. Consumers also
    /// observe a broken connection as an ended stream.
    pub fn is_connected(&self) -> bool {
        self.connection.status().connected()
    }

    /// Start one competing consumer on the durable RPC queue for
    /// `rpc_type`. Call once per worker; the broker distributes deliveries
    /// among them.
    pub async fn consume_rpc(
        &self,
        rpc_type: &str,
        consumer_tag: &str,
    ) -> Result<Consumer, BusError> {
        let queue_name = rpc_queue_name(rpc_type);
        self.channel
            .queue_declare(
                &queue_name,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        let consumer = self
            .channel
            .basic_consume(
                &queue_name,
                consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;
        Ok(consumer)
    }

    /// Subscribe to a broadcast topic via an exclusive server-named queue.
    pub async fn consume_broadcast(
        &self,
        topic: &str,
        consumer_tag: &str,
    ) -> Result<Consumer, BusError> {
        let queue = self
            .channel
            .queue_declare(
                "",
                QueueDeclareOptions {
                    exclusive: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        self.channel
            .queue_bind(
                queue.name().as_str(),
                EVENT_EXCHANGE,
                topic,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;

        let consumer = self
            .channel
            .basic_consume(
                queue.name().as_str(),
                consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;
        Ok(consumer)
    }

    /// Publish an RPC reply to the private queue the caller named,
    /// propagating its correlation id.
    pub async fn publish_reply(
        &self,
        request: &Delivery,
        payload: &[u8],
    ) -> Result<(), BusError> {
        let reply_to = request
            .properties
            .reply_to()
            .as_ref()
            .ok_or(BusError::MissingReplyTo)?;

        let mut properties = BasicProperties::default();
        if let Some(correlation_id) = request.properties.correlation_id() {
            properties = properties.with_correlation_id(correlation_id.clone());
        }

        self.channel
            .basic_publish(
                "",
                reply_to.as_str(),
                BasicPublishOptions::default(),
                payload,
                properties,
            )
            .await?;
        Ok(())
    }

    /// Close the connection. Errors are logged, not surfaced; this runs on
    /// shutdown paths where there is nothing left to do about them.
    pub async fn close(&self) {
        if let Err(err) = self.connection.close(0, "shutting down").await {
            tracing::debug!(%err, "error closing AMQP connection");
        }
    }
}
