//! SSC Client - document synchronization engine
//!
//! Keeps a local replica of a server-authoritative document in step with
//! remote replicas and propagates ephemeral presence among participants:
//! - First-writer document creation (racy by design, server picks the winner)
//! - Subscription with optimistic local mutation and server-driven rollback
//! - Error-episode tracking with exactly-once recovery notification
//! - Best-effort presence broadcast and a remote presence map
//!
//! ```no_run
//! use std::sync::Arc;
//! use serde::{Deserialize, Serialize};
//! use ssc_client::{ClientOptions, SharedStateClient, StateCallbacks};
//! use ssc_core::{ContentId, ServerConfig, SharedState};
//!
//! #[derive(Clone, Serialize, Deserialize)]
//! struct Counter { count: i64 }
//!
//! impl SharedState for Counter {
//!     fn seed() -> Self { Counter { count: 0 } }
//! }
//!
//! struct Printer;
//!
//! #[async_trait::async_trait]
//! impl StateCallbacks<Counter> for Printer {
//!     async fn on_refresh(&self, data: Counter) {
//!         println!("count = {}", data.count);
//!     }
//! }
//!
//! # async fn run() -> ssc_core::Result<()> {
//! let config = ServerConfig::new("wss://sync.example", "https://sync.example/auth/");
//! let client: SharedStateClient<Counter> = SharedStateClient::connect(
//!     &config,
//!     ContentId::new("doc-1")?,
//!     Arc::new(Printer),
//!     ClientOptions::default(),
//! )?;
//! # Ok(())
//! # }
//! ```

pub mod callbacks;
pub mod engine;
pub mod presence;
pub mod replica;

pub use callbacks::StateCallbacks;
pub use engine::{ClientOptions, SharedStateClient};
pub use presence::PresenceTracker;
pub use replica::{DocumentReplica, ReplicaPhase};
