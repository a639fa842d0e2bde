//! SSC wire envelope
//!
//! JSON-encoded messages exchanged with the synchronization server over
//! WebSocket text frames. Operations travel inside the envelope as opaque
//! JSON - the merge algorithm that reconciles them is server-owned.
//!
//! ## Message flow
//! ```text
//! client                          server
//!   | -- subscribe -------------->  |
//!   | <-------------- snapshot --   |   (data: null => document absent)
//!   | -- create ----------------->  |
//!   | <-- created | rejected ----   |   (first writer wins)
//!   | -- op --------------------->  |
//!   | <---------------- update --   |   (authoritative state, all peers)
//!   | -- presence --------------->  |
//!   | <-------------- presence --   |   (record: null => participant left)
//! ```

pub mod codec;
pub mod error;
pub mod message;

pub use codec::MAX_FRAME_SIZE;
pub use error::{ProtocolError, ProtocolResult};
pub use message::{ClientMessage, ServerMessage, COLLECTION};
