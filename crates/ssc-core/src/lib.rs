//! SSC Core - data model for the shared state client
//!
//! This crate provides the types shared across the client stack:
//! - Content identifiers and server configuration
//! - Session credentials with staleness tracking
//! - The seedable shared-state capability and presence records
//! - Opaque operations forwarded to the synchronization server

pub mod content;
pub mod credential;
pub mod error;
pub mod op;
pub mod state;

pub use content::ContentId;
pub use credential::{AccessLevel, Credential, ServerConfig};
pub use error::{Error, Result};
pub use op::Operation;
pub use state::{PresenceData, PresenceRecord, SharedState};
