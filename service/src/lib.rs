//! Service shell for the Kestrel block store.
//!
//! Wires the request handler to the message bus: configuration, logging,
//! signal-driven shutdown, the RPC worker pool, and the block-accept
//! broadcast ingester.

pub mod config;
pub mod error;
pub mod logging;
pub mod service;
pub mod shutdown;

pub use config::ServiceConfig;
pub use error::ServiceError;
pub use logging::{init_logging, LogFormat};
pub use service::{BlockStoreService, BLOCK_ACCEPT_TOPIC, RPC_TYPE};
pub use shutdown::ShutdownController;
