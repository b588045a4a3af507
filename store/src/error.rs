use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot use an empty key")]
    EmptyKey,

    #[error("cannot store an empty value")]
    EmptyValue,

    #[error("storage backend error: {0}")]
    Backend(String),
}
