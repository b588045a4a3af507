use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("AMQP error: {0}")]
    Amqp(#[from] lapin::Error),

    #[error("delivery has no reply-to address")]
    MissingReplyTo,
}
