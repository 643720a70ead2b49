use thiserror::Error;
use trajpub_api_core::TopicError;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport is not initialized")]
    NotInitialized,
    #[error(transparent)]
    InvalidTopic(#[from] TopicError),
    #[error("publisher on '{0}' has been shut down")]
    Closed(String),
}

pub type TransportResult<T> = Result<T, TransportError>;
