//! Document synchronization engine

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::callbacks::StateCallbacks;
use crate::presence::PresenceTracker;
use crate::replica::{DocumentReplica, ReplicaPhase};
use ssc_core::{
    ContentId, Credential, Error, Operation, PresenceData, PresenceRecord, Result, ServerConfig,
    SharedState,
};
use ssc_protocol::{ClientMessage, ServerMessage};
use ssc_transport::{
    ConnectionState, CredentialProvider, CredentialResolver, ResilientSocket, SocketConfig,
    TargetResolver, TransportError, TransportEvent,
};

/// Per-instantiation options
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Enable the presence sub-protocol for this client
    pub enable_presence: bool,
    /// Reconnect policy for the underlying socket
    pub socket: SocketConfig,
}

/// Client for one shared, server-authoritative document.
///
/// Owns exactly one replica per content id per session. All consumer
/// callbacks run sequentially on a single event-loop task; local mutations
/// go through [`submit_op`](Self::submit_op) and are reconciled by the
/// server - a rejected op simply shows up as the next refresh carrying the
/// corrected state, there is no client-side rollback logic.
pub struct SharedStateClient<T: SharedState, P: PresenceData = PresenceRecord> {
    socket: ResilientSocket,
    content_id: ContentId,
    provider: Option<Arc<CredentialProvider>>,
    seq: Arc<AtomicU64>,
    deleted: Arc<AtomicBool>,
    closed: AtomicBool,
    presence_enabled: bool,
    _marker: PhantomData<fn() -> (T, P)>,
}

impl<T: SharedState, P: PresenceData> SharedStateClient<T, P> {
    /// Connect using the standard credential flow: fetch from the auth
    /// endpoint, cache until stale, append the token to the connection
    /// target. Must be called within a tokio runtime.
    pub fn connect(
        server: &ServerConfig,
        content_id: ContentId,
        callbacks: Arc<dyn StateCallbacks<T, P>>,
        options: ClientOptions,
    ) -> Result<Self> {
        let provider = Arc::new(CredentialProvider::over_http(server, &content_id)?);
        let resolver = Arc::new(CredentialResolver::new(provider.clone(), server));
        Ok(Self::start(resolver, Some(provider), content_id, callbacks, options))
    }

    /// Connect with a custom target resolver (custom auth flows, tests).
    /// [`credential`](Self::credential) returns `None` for such clients.
    pub fn connect_with_resolver(
        resolver: Arc<dyn TargetResolver>,
        content_id: ContentId,
        callbacks: Arc<dyn StateCallbacks<T, P>>,
        options: ClientOptions,
    ) -> Self {
        Self::start(resolver, None, content_id, callbacks, options)
    }

    fn start(
        resolver: Arc<dyn TargetResolver>,
        provider: Option<Arc<CredentialProvider>>,
        content_id: ContentId,
        callbacks: Arc<dyn StateCallbacks<T, P>>,
        options: ClientOptions,
    ) -> Self {
        let (socket, events) = ResilientSocket::connect(resolver, options.socket);
        let seq = Arc::new(AtomicU64::new(1));
        let deleted = Arc::new(AtomicBool::new(false));

        let engine = EngineLoop {
            content_id: content_id.clone(),
            outgoing: socket.sender(),
            callbacks,
            replica: DocumentReplica::new(),
            tracker: options.enable_presence.then(PresenceTracker::new),
            seq: seq.clone(),
            deleted: deleted.clone(),
            initial: true,
            had_error: false,
            pending_create: None,
        };
        tokio::spawn(engine.run(events));

        Self {
            socket,
            content_id,
            provider,
            seq,
            deleted,
            closed: AtomicBool::new(false),
            presence_enabled: options.enable_presence,
            _marker: PhantomData,
        }
    }

    /// Submit an opaque operation. Applied optimistically downstream and
    /// reconciled by the server; if rejected, the corrected state arrives
    /// through the normal refresh path.
    pub async fn submit_op(&self, op: Operation) -> Result<()> {
        if self.deleted.load(Ordering::SeqCst) {
            return Err(Error::DocumentDeleted);
        }
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        self.socket
            .send(ClientMessage::op(&self.content_id, seq, op))
            .await
            .map_err(map_transport)
    }

    /// Broadcast this participant's presence record (`None` clears it).
    /// Best-effort: failures are logged, never surfaced, never retried.
    pub async fn submit_presence(&self, record: Option<P>) {
        if !self.presence_enabled {
            warn!(content = %self.content_id, "Presence is not enabled for this client");
            return;
        }
        if self.deleted.load(Ordering::SeqCst) {
            debug!(content = %self.content_id, "Dropping presence for deleted document");
            return;
        }
        if let Err(e) = self.broadcast_presence(record).await {
            warn!(content = %self.content_id, error = %e, "Presence submit failed");
        }
    }

    async fn broadcast_presence(&self, record: Option<P>) -> Result<()> {
        let raw = record
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| Error::PresenceSubmit(e.to_string()))?;
        self.socket
            .send(ClientMessage::presence(&self.content_id, raw))
            .await
            .map_err(|e| Error::PresenceSubmit(e.to_string()))
    }

    /// Current transport connection state
    pub fn connection_state(&self) -> ConnectionState {
        self.socket.state()
    }

    /// Snapshot of the cached session credential, if this client manages one
    pub async fn credential(&self) -> Option<Credential> {
        match &self.provider {
            Some(provider) => provider.cached().await,
            None => None,
        }
    }

    /// Tear the client down: unsubscribe the document, clear presence if
    /// enabled, and close the transport. Idempotent.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if self.presence_enabled {
            let _ = self
                .socket
                .send(ClientMessage::presence(&self.content_id, None))
                .await;
        }
        let _ = self
            .socket
            .send(ClientMessage::unsubscribe(&self.content_id))
            .await;
        self.socket.close();
    }
}

fn map_transport(e: TransportError) -> Error {
    match e {
        TransportError::Closed => Error::Closed,
        TransportError::Core(e) => e,
    }
}

/// The single-threaded event loop behind a client.
///
/// All transport events - socket open, server messages, socket errors - run
/// through `handle` sequentially, so replica and presence state need no
/// locking; correctness rests on this ordering.
struct EngineLoop<T: SharedState, P: PresenceData> {
    content_id: ContentId,
    outgoing: mpsc::Sender<ClientMessage>,
    callbacks: Arc<dyn StateCallbacks<T, P>>,
    replica: DocumentReplica<T>,
    tracker: Option<PresenceTracker<P>>,
    seq: Arc<AtomicU64>,
    deleted: Arc<AtomicBool>,
    /// Initial-connection milestone not yet consumed
    initial: bool,
    /// An error episode is open; the next successful connect owes the
    /// consumer a recovery notification
    had_error: bool,
    /// In-flight first-writer create: (seq, seeded data)
    pending_create: Option<(u64, T)>,
}

impl<T: SharedState, P: PresenceData> EngineLoop<T, P> {
    async fn run(mut self, mut events: mpsc::Receiver<TransportEvent>) {
        while let Some(event) = events.recv().await {
            if !self.handle(event).await {
                break;
            }
        }
    }

    async fn handle(&mut self, event: TransportEvent) -> bool {
        match event {
            TransportEvent::Open => {
                self.send(ClientMessage::subscribe(&self.content_id)).await;
                if self.tracker.is_some() {
                    // Rejoining the channel is per-connection; the tracker
                    // itself (and its remote map) lives across reconnects.
                    self.send(ClientMessage::presence_subscribe(&self.content_id))
                        .await;
                }
                if self.had_error {
                    self.had_error = false;
                    // Exactly-once recovery notification for this error
                    // episode. With no data yet, the initial-connection
                    // path still owes the consumer its first on_connected.
                    if let Some(data) = self.replica.data().cloned() {
                        self.callbacks.on_connected(data.clone()).await;
                        self.callbacks.on_refresh(data).await;
                    }
                }
                true
            }
            TransportEvent::Error(message) => {
                self.had_error = true;
                self.callbacks.on_error(&message).await;
                true
            }
            TransportEvent::Message(msg) => {
                self.handle_server(msg).await;
                true
            }
            TransportEvent::Closed => false,
        }
    }

    async fn handle_server(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::Snapshot { version, data } => match data {
                None => self.create_if_absent().await,
                Some(raw) => self.refresh(version, raw).await,
            },
            ServerMessage::Update { version, data } => self.refresh(version, data).await,
            ServerMessage::Created { seq } => self.handle_created(seq).await,
            ServerMessage::Rejected { seq, code, message } => {
                self.handle_rejected(seq, &code, &message)
            }
            ServerMessage::Deleted => {
                if self.replica.phase() != ReplicaPhase::Deleted {
                    self.replica.mark_deleted();
                    self.deleted.store(true, Ordering::SeqCst);
                    self.callbacks.on_deleted().await;
                }
            }
            ServerMessage::Presence { participant, record } => {
                let Some(tracker) = self.tracker.as_mut() else {
                    return;
                };
                let Some(decoded) = PresenceTracker::<P>::decode(&participant, record) else {
                    return;
                };
                let snapshot = tracker.apply(&participant, decoded);
                self.callbacks.on_refresh_presences(snapshot).await;
            }
        }
    }

    /// No document exists server-side: seed one and race to create it.
    /// Every client does this speculatively; the server accepts the first
    /// valid create per content id and rejects the rest.
    async fn create_if_absent(&mut self) {
        if self.replica.phase() != ReplicaPhase::Absent || self.pending_create.is_some() {
            return;
        }
        let seeded = T::seed();
        let raw = match serde_json::to_value(&seeded) {
            Ok(raw) => raw,
            Err(e) => {
                error!(error = %e, "Failed to encode seeded document");
                return;
            }
        };
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        debug!(content = %self.content_id, seq, "Document absent, submitting create");
        self.pending_create = Some((seq, seeded));
        self.send(ClientMessage::create(&self.content_id, seq, raw))
            .await;
    }

    async fn refresh(&mut self, version: u64, raw: serde_json::Value) {
        if self.replica.phase() == ReplicaPhase::Deleted {
            return;
        }
        // Authoritative data supersedes any create still in flight; the
        // matching rejection, if it comes, is then a no-op.
        self.pending_create = None;
        match self.replica.install(version, raw) {
            Ok(data) => {
                if self.initial {
                    self.initial = false;
                    self.callbacks.on_connected(data.clone()).await;
                }
                self.callbacks.on_refresh(data).await;
            }
            Err(e) => error!(content = %self.content_id, error = %e, "Failed to decode document data"),
        }
    }

    async fn handle_created(&mut self, seq: u64) {
        let Some((pending_seq, seeded)) = self.pending_create.take() else {
            return;
        };
        if pending_seq != seq {
            self.pending_create = Some((pending_seq, seeded));
            return;
        }
        self.replica.install_seeded(seeded.clone());
        // Winning the create race is the first connection milestone
        self.initial = false;
        self.callbacks.on_connected(seeded.clone()).await;
        self.callbacks.on_refresh(seeded).await;
    }

    fn handle_rejected(&mut self, seq: u64, code: &str, message: &str) {
        if matches!(self.pending_create, Some((s, _)) if s == seq) {
            self.pending_create = None;
            // Lost the first-writer race. The winner's document arrives
            // through the subscription; never surfaced as a consumer error.
            let conflict = Error::CreateConflict(message.to_string());
            debug!(content = %self.content_id, code, error = %conflict, "Create rejected");
        } else {
            debug!(seq, code, message, "Op rejected, awaiting corrective update");
        }
    }

    async fn send(&self, msg: ClientMessage) {
        if self.outgoing.send(msg).await.is_err() {
            warn!(content = %self.content_id, "Transport is gone, dropping outgoing message");
        }
    }
}
