//! Error types for SSC Core

use thiserror::Error;

/// Client-wide error taxonomy
///
/// Socket-level failures reach the consumer through the error callback as
/// messages, not through this enum. `CreateConflict` and `PresenceSubmit`
/// are self-healing or logged-only conditions that callers never see.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Credential fetch failed: {0}")]
    CredentialFetch(String),

    #[error("Received invalid credential from server: {0}")]
    InvalidCredential(String),

    #[error("Document already created by another participant: {0}")]
    CreateConflict(String),

    #[error("Presence submit failed: {0}")]
    PresenceSubmit(String),

    #[error("Document has been deleted")]
    DocumentDeleted,

    #[error("Invalid content ID: {0}")]
    InvalidContentId(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Client is closed")]
    Closed,
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Result type alias for SSC operations
pub type Result<T> = std::result::Result<T, Error>;
