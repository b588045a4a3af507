//! AMQP message-bus client for Kestrel services.
//!
//! Wraps `lapin` with the queue and exchange topology the chain's
//! microservices share: durable per-rpc-type request queues with competing
//! consumers, and a topic exchange for broadcast events.

pub mod client;
pub mod error;

pub use client::{rpc_queue_name, BusConnection, EVENT_EXCHANGE};
pub use error::BusError;
