//! Consumer callback surface

use async_trait::async_trait;
use ssc_core::{PresenceData, PresenceRecord, SharedState};
use std::collections::HashMap;

/// Callbacks invoked by the synchronization engine.
///
/// `on_refresh` is the one required handler; the rest default to no-ops.
/// All callbacks run sequentially on the client's event loop - a slow
/// handler delays that one event, nothing else.
#[async_trait]
pub trait StateCallbacks<T, P = PresenceRecord>: Send + Sync
where
    T: SharedState,
    P: PresenceData,
{
    /// The replica changed: subscription acknowledgment, an applied op batch
    /// (local or remote), or rollback after a rejected op. Deliveries follow
    /// the server-imposed per-document order; no coalescing.
    async fn on_refresh(&self, data: T);

    /// Fires once for the initial successful subscription of the client's
    /// lifetime, and once more per error-then-recover episode.
    async fn on_connected(&self, _data: T) {}

    /// The document was deleted server-side. Terminal.
    async fn on_deleted(&self) {}

    /// Transport-level failure. The only error condition surfaced to
    /// consumers; everything else is self-healing or logged.
    async fn on_error(&self, _message: &str) {}

    /// Full snapshot of remote participants' presence, replacing any prior
    /// delivery. Only invoked when presence is enabled.
    async fn on_refresh_presences(&self, _presences: HashMap<String, P>) {}
}
