//! RocksDB storage backend for the Kestrel block store.
//!
//! Implements the [`Backend`] trait from `kestrel-store` on top of a single
//! RocksDB database. The keyspace is flat: records are keyed by raw
//! identifier bytes and the one reserved meta key.

use std::path::Path;

use rocksdb::{IteratorMode, Options, WriteBatch, DB};

use kestrel_store::{Backend, StoreError};

/// Durable LSM-backed implementation of [`Backend`].
pub struct RocksBackend {
    db: DB,
}

impl RocksBackend {
    /// Open or create a RocksDB database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = DB::open(&opts, path.as_ref())
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(Self { db })
    }

    /// Flush all in-memory buffers to disk. Called on graceful shutdown so
    /// the OS has everything before the process exits.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db
            .flush()
            .map_err(|e| StoreError::Backend(e.to_string()))
    }
}

impl Backend for RocksBackend {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        if value.is_empty() {
            return Err(StoreError::EmptyValue);
        }
        self.db
            .put(key, value)
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn get(&self, key: &[u8]) -> Result<Vec<u8>, StoreError> {
        match self
            .db
            .get(key)
            .map_err(|e| StoreError::Backend(e.to_string()))?
        {
            Some(value) => Ok(value),
            None => Ok(Vec::new()),
        }
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        self.db
            .delete(key)
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn reset(&self) -> Result<(), StoreError> {
        let mut batch = WriteBatch::default();
        let mut wiped = 0u64;
        for entry in self.db.iterator(IteratorMode::Start) {
            let (key, _) = entry.map_err(|e| StoreError::Backend(e.to_string()))?;
            batch.delete(key);
            wiped += 1;
        }
        self.db
            .write(batch)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        tracing::info!(keys = wiped, "block store namespace wiped");
        Ok(())
    }
}
