//! Transport error types

use thiserror::Error;

/// Transport-specific errors.
///
/// Socket-level failures (handshake, I/O) are reported through
/// `TransportEvent::Error` and retried under backoff rather than returned
/// from any call, so the only errors a caller sees are a closed transport
/// and core errors passing through.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Transport is closed")]
    Closed,

    #[error(transparent)]
    Core(#[from] ssc_core::Error),
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;
