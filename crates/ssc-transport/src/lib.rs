//! SSC Transport Layer
//!
//! Connection plumbing for the shared state client:
//! - Credential fetch and caching against the auth HTTP endpoint
//! - Per-attempt connection-target resolution (token query parameter)
//! - Resilient, auto-reconnecting WebSocket with an observable state machine

pub mod auth;
pub mod error;
pub mod resolver;
pub mod socket;

pub use auth::{CredentialProvider, CredentialSource, HttpCredentialSource};
pub use error::{TransportError, TransportResult};
pub use resolver::{CredentialResolver, TargetResolver};
pub use socket::{ConnectionState, ResilientSocket, SocketConfig, TransportEvent};
