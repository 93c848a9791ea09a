//! Error types for the conversation store.

use thiserror::Error;

use crate::whatsapp::SendError;

/// Errors raised while reading or writing the message log.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the log file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The log file is not a JSON array of records.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// A stored record carries a timestamp that cannot be parsed.
    #[error("record {id} has invalid created_at {value:?}")]
    InvalidTimestamp {
        /// Offending record id.
        id: String,
        /// Raw stored value.
        value: String,
    },
}

/// Convenience result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by inbox operations.
#[derive(Debug, Error)]
pub enum InboxError {
    /// The provider rejected the message or could not be reached.
    #[error("send failed: {0}")]
    Send(#[from] SendError),
    /// The message log could not be updated.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience result alias for inbox operations.
pub type InboxResult<T> = Result<T, InboxError>;
