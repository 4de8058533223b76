//! Persistence seams.
//!
//! Storage is owned by external repositories; the hub only sees these traits.
//! The in-memory implementations back the dev server and the tests.

mod conversation;

pub use conversation::{ConversationDirectory, MemoryConversationDirectory, Participants};

use thiserror::Error;

/// Errors raised by a persistence collaborator
#[derive(Debug, Error)]
pub enum StoreError {
    /// A row with this key already exists
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// No row with this key
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backend failure (connection lost, constraint violation, ...)
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
