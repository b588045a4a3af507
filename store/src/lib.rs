//! Abstract storage backend for the Kestrel block store.
//!
//! Every backend (RocksDB, in-memory for testing) implements the [`Backend`]
//! trait. The rest of the codebase depends only on the trait.

pub mod error;
pub mod memory;

pub use error::StoreError;
pub use memory::MemoryBackend;

/// A narrow key-value store abstraction.
///
/// The one load-bearing convention: [`Backend::get`] returns an **empty byte
/// vector** for an absent key, never an error. Every traversal in the engine
/// relies on it. As a consequence, `put` rejects empty values — an empty
/// value would be indistinguishable from absence on read-back.
pub trait Backend: Send + Sync {
    /// Store `value` under `key`. Rejects an empty key or an empty value.
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    /// Fetch the value stored under `key`, or an empty vector if the key is
    /// absent.
    fn get(&self, key: &[u8]) -> Result<Vec<u8>, StoreError>;

    /// Delete the value under `key`. Deleting an absent key is not an error.
    fn delete(&self, key: &[u8]) -> Result<(), StoreError>;

    /// Wipe every key in the namespace.
    fn reset(&self) -> Result<(), StoreError>;
}
