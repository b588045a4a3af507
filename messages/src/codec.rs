//! Wire codec — serialization of request/response blobs for the message bus.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::{ErrorResponse, Response};

/// Maximum size of an encoded response the bus will carry.
pub const MAX_MESSAGE_SIZE: usize = 512 * 1024 * 1024; // 512 MiB

/// Observable message of the oversized-response error.
pub const MAX_SIZE_EXCEEDED: &str = "Response would exceed maximum MQ message size";

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("could not encode message: {0}")]
    Encode(String),

    #[error("malformed message: {0}")]
    Decode(String),
}

/// Encode a message for transmission.
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, CodecError> {
    bincode::serialize(message).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Decode a message from raw bytes.
pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T, CodecError> {
    bincode::deserialize(data).map_err(|e| CodecError::Decode(e.to_string()))
}

/// Encode a response, replacing it with the overflow error variant when the
/// encoded form exceeds `cap` bytes. The original response is discarded.
pub fn encode_capped(response: &Response, cap: usize) -> Result<Vec<u8>, CodecError> {
    let bytes = encode(response)?;
    if bytes.len() <= cap {
        return Ok(bytes);
    }
    encode(&Response::Error(ErrorResponse {
        message: MAX_SIZE_EXCEEDED.to_string(),
    }))
}
