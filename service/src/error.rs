use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("bus error: {0}")]
    Bus(#[from] kestrel_bus::BusError),

    #[error("store error: {0}")]
    Store(#[from] kestrel_store::StoreError),

    #[error("config error: {0}")]
    Config(String),
}
