//! Message delivery notifications.
//!
//! Message rows belong to an external repository; this module performs the
//! write through `MessageStore` and pushes the resulting receipts.

mod service;
mod store;

pub use service::{MessageService, SendMessageRequest, MAX_CONTENT_LENGTH};
pub use store::{MemoryMessageStore, MessageStore};

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("storage failure: {0}")]
    Internal(StoreError),
}

impl From<StoreError> for MessagingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => MessagingError::NotFound(msg),
            other => MessagingError::Internal(other),
        }
    }
}

pub type MessagingResult<T> = Result<T, MessagingError>;
