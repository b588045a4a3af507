//! Content-addressed identifiers for blocks and transactions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Multihash code for sha2-256, the only digest algorithm the chain emits.
pub const SHA2_256: u64 = 0x12;

/// Digest length of a sha2-256 multihash.
pub const SHA2_256_LEN: usize = 32;

/// A self-describing hash: an algorithm code plus a length-prefixed digest.
///
/// Blocks and transactions are identified by the multihash of their
/// serialized content. Equality and hashing are byte-wise; the default value
/// (code 0, empty digest) is the "empty" identifier used as a placeholder in
/// responses for blocks that do not exist.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Multihash {
    code: u64,
    digest: Vec<u8>,
}

impl Multihash {
    pub fn new(code: u64, digest: Vec<u8>) -> Self {
        Self { code, digest }
    }

    /// The all-zero sha2-256 multihash — the synthetic parent of the first
    /// real block.
    pub fn zero() -> Self {
        Self {
            code: SHA2_256,
            digest: vec![0u8; SHA2_256_LEN],
        }
    }

    pub fn code(&self) -> u64 {
        self.code
    }

    pub fn digest(&self) -> &[u8] {
        &self.digest
    }

    /// True for the empty placeholder identifier (no digest at all).
    pub fn is_empty(&self) -> bool {
        self.digest.is_empty()
    }

    /// True when every digest byte is zero.
    pub fn is_zero(&self) -> bool {
        !self.digest.is_empty() && self.digest.iter().all(|&b| b == 0)
    }

    /// Canonical byte form: unsigned-varint code, unsigned-varint digest
    /// length, digest. Used as the raw storage key for the record this
    /// identifier names. The code is always non-zero for a real identifier,
    /// so these bytes can never start with the reserved `0x01` meta byte —
    /// sha2-256 encodes as `0x12`.
    pub fn to_key_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(2 + self.digest.len());
        write_uvarint(&mut bytes, self.code);
        write_uvarint(&mut bytes, self.digest.len() as u64);
        bytes.extend_from_slice(&self.digest);
        bytes
    }
}

/// Append an unsigned LEB128 varint.
fn write_uvarint(buf: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        buf.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

impl fmt::Display for Multihash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(&self.digest).into_string())
    }
}

impl fmt::Debug for Multihash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Multihash({:#x}, ", self.code)?;
        for b in self.digest.iter().take(4) {
            write!(f, "{:02x}", b)?;
        }
        write!(f, "\u{2026})")
    }
}
