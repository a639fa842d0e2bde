//! Protocol error types

use thiserror::Error;

/// Protocol-specific errors
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Unexpected binary frame")]
    UnexpectedBinary,

    #[error("Message too large: {size} > {max}")]
    MessageTooLarge { size: usize, max: usize },

    #[error("Connection closed")]
    Closed,
}

/// Result type for protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;
