//! Resilient WebSocket transport

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Notify};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::error::{TransportError, TransportResult};
use crate::resolver::TargetResolver;
use ssc_protocol::{ClientMessage, ProtocolError, ServerMessage};

/// Transport-observable connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Errored,
}

/// Events emitted by the resilient socket
#[derive(Debug)]
pub enum TransportEvent {
    /// A connection attempt succeeded; subscriptions must be re-established
    Open,
    /// A decoded server message
    Message(ServerMessage),
    /// Socket-level failure; reconnection continues under backoff
    Error(String),
    /// The socket was closed for good via `close()`
    Closed,
}

/// Reconnect policy
#[derive(Debug, Clone)]
pub struct SocketConfig {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(30),
        }
    }
}

fn next_backoff(current: Duration, config: &SocketConfig) -> Duration {
    (current * 2).min(config.max_backoff)
}

/// Auto-reconnecting WebSocket client.
///
/// The target resolver runs before every attempt, so credentials are always
/// validated (and refetched when stale) ahead of the handshake. Outgoing
/// messages queue in a channel while disconnected and flush once a
/// connection is up. Retries indefinitely until `close()`.
pub struct ResilientSocket {
    outgoing: mpsc::Sender<ClientMessage>,
    state: Arc<parking_lot::RwLock<ConnectionState>>,
    shutdown: Arc<Notify>,
    closed: Arc<AtomicBool>,
}

enum PumpExit {
    Shutdown,
    Error(String),
    Remote,
}

impl ResilientSocket {
    /// Start the reconnect loop and return the socket handle plus the event
    /// stream consumed by the synchronization engine.
    pub fn connect(
        resolver: Arc<dyn TargetResolver>,
        config: SocketConfig,
    ) -> (Self, mpsc::Receiver<TransportEvent>) {
        let (outgoing, out_rx) = mpsc::channel(256);
        let (event_tx, event_rx) = mpsc::channel(256);
        let state = Arc::new(parking_lot::RwLock::new(ConnectionState::Disconnected));
        let shutdown = Arc::new(Notify::new());
        let closed = Arc::new(AtomicBool::new(false));

        tokio::spawn(run_loop(
            resolver,
            config,
            out_rx,
            event_tx,
            state.clone(),
            shutdown.clone(),
            closed.clone(),
        ));

        (
            Self {
                outgoing,
                state,
                shutdown,
                closed,
            },
            event_rx,
        )
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Clone of the outgoing queue, for components that enqueue messages
    /// without holding the socket handle itself
    pub fn sender(&self) -> mpsc::Sender<ClientMessage> {
        self.outgoing.clone()
    }

    /// Queue a message for the server. Queued messages survive reconnects.
    pub async fn send(&self, msg: ClientMessage) -> TransportResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        self.outgoing
            .send(msg)
            .await
            .map_err(|_| TransportError::Closed)
    }

    /// Stop reconnecting and tear the connection down. Idempotent.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.shutdown.notify_waiters();
        }
    }
}

impl Drop for ResilientSocket {
    fn drop(&mut self) {
        self.close();
    }
}

async fn run_loop(
    resolver: Arc<dyn TargetResolver>,
    config: SocketConfig,
    mut out_rx: mpsc::Receiver<ClientMessage>,
    event_tx: mpsc::Sender<TransportEvent>,
    state: Arc<parking_lot::RwLock<ConnectionState>>,
    shutdown: Arc<Notify>,
    closed: Arc<AtomicBool>,
) {
    let mut backoff = config.initial_backoff;

    'reconnect: loop {
        if closed.load(Ordering::SeqCst) {
            break;
        }

        *state.write() = ConnectionState::Connecting;

        // Credential failures abort this attempt only; they are not
        // transport errors and never reach the consumer.
        let target = match resolver.resolve().await {
            Ok(target) => target,
            Err(e) => {
                warn!(error = %e, "Connect target resolution failed");
                if wait_backoff(backoff, &shutdown, &closed).await {
                    break;
                }
                backoff = next_backoff(backoff, &config);
                continue;
            }
        };

        match connect_async(target.as_str()).await {
            Ok((ws, _)) => {
                backoff = config.initial_backoff;
                *state.write() = ConnectionState::Connected;
                info!("WebSocket connected");
                if event_tx.send(TransportEvent::Open).await.is_err() {
                    break;
                }

                match pump(ws, &mut out_rx, &event_tx, &shutdown).await {
                    PumpExit::Shutdown => break 'reconnect,
                    PumpExit::Error(msg) => {
                        *state.write() = ConnectionState::Errored;
                        warn!(error = %msg, "WebSocket error");
                        if event_tx.send(TransportEvent::Error(msg)).await.is_err() {
                            break;
                        }
                    }
                    PumpExit::Remote => {
                        *state.write() = ConnectionState::Disconnected;
                        info!("WebSocket closed by server");
                    }
                }
            }
            Err(e) => {
                *state.write() = ConnectionState::Errored;
                warn!(error = %e, "WebSocket connect failed");
                if event_tx
                    .send(TransportEvent::Error(e.to_string()))
                    .await
                    .is_err()
                {
                    break;
                }
            }
        }

        if wait_backoff(backoff, &shutdown, &closed).await {
            break;
        }
        backoff = next_backoff(backoff, &config);
    }

    *state.write() = ConnectionState::Disconnected;
    let _ = event_tx.send(TransportEvent::Closed).await;
}

/// Sleep out the backoff window; returns true when shutdown was requested.
async fn wait_backoff(backoff: Duration, shutdown: &Notify, closed: &AtomicBool) -> bool {
    if closed.load(Ordering::SeqCst) {
        return true;
    }
    tokio::select! {
        _ = tokio::time::sleep(backoff) => closed.load(Ordering::SeqCst),
        _ = shutdown.notified() => true,
    }
}

/// Drive one live connection until it fails, the server closes it, or
/// shutdown is requested.
async fn pump(
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    out_rx: &mut mpsc::Receiver<ClientMessage>,
    event_tx: &mpsc::Sender<TransportEvent>,
    shutdown: &Notify,
) -> PumpExit {
    let (mut write, mut read) = ws.split();

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                let _ = write.send(Message::Close(None)).await;
                return PumpExit::Shutdown;
            }

            maybe = out_rx.recv() => match maybe {
                Some(msg) => match msg.encode_frame() {
                    Ok(frame) => {
                        if let Err(e) = write.send(frame).await {
                            return PumpExit::Error(e.to_string());
                        }
                    }
                    Err(e) => warn!(error = %e, "Dropping unencodable outgoing message"),
                },
                // All senders gone: the owning client was dropped
                None => return PumpExit::Shutdown,
            },

            frame = read.next() => match frame {
                Some(Ok(Message::Ping(data))) => {
                    let _ = write.send(Message::Pong(data)).await;
                }
                Some(Ok(frame)) => match ServerMessage::decode_frame(&frame) {
                    Ok(Some(msg)) => {
                        debug!(?msg, "Received server message");
                        if event_tx.send(TransportEvent::Message(msg)).await.is_err() {
                            return PumpExit::Shutdown;
                        }
                    }
                    Ok(None) => {}
                    Err(ProtocolError::Closed) => return PumpExit::Remote,
                    Err(e) => warn!(error = %e, "Dropping undecodable frame"),
                },
                None => return PumpExit::Remote,
                Some(Err(e)) => return PumpExit::Error(e.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ssc_core::{ContentId, Result};
    use tokio::net::TcpListener;

    struct FixedTarget(String);

    #[async_trait]
    impl TargetResolver for FixedTarget {
        async fn resolve(&self) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    fn test_config() -> SocketConfig {
        SocketConfig {
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(50),
        }
    }

    #[test]
    fn test_backoff_doubles_up_to_cap() {
        let config = test_config();
        let b1 = next_backoff(config.initial_backoff, &config);
        assert_eq!(b1, Duration::from_millis(20));
        let b2 = next_backoff(b1, &config);
        assert_eq!(b2, Duration::from_millis(40));
        let b3 = next_backoff(b2, &config);
        assert_eq!(b3, Duration::from_millis(50));
        assert_eq!(next_backoff(b3, &config), Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_open_then_message_roundtrip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Echo-ish server: expect a subscribe, answer with a snapshot
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            let frame = ws.next().await.unwrap().unwrap();
            let text = frame.into_text().unwrap();
            assert!(text.contains("\"subscribe\""));
            ws.send(Message::Text(
                r#"{"type":"snapshot","version":1,"data":{"count":5}}"#.into(),
            ))
            .await
            .unwrap();
        });

        let resolver = Arc::new(FixedTarget(format!("ws://{}", addr)));
        let (socket, mut events) = ResilientSocket::connect(resolver, test_config());

        assert!(matches!(events.recv().await, Some(TransportEvent::Open)));
        assert_eq!(socket.state(), ConnectionState::Connected);

        let id = ContentId::new("doc-1").unwrap();
        socket.send(ClientMessage::subscribe(&id)).await.unwrap();

        match events.recv().await {
            Some(TransportEvent::Message(ServerMessage::Snapshot { version, data })) => {
                assert_eq!(version, 1);
                assert_eq!(data, Some(serde_json::json!({"count": 5})));
            }
            other => panic!("expected snapshot, got {:?}", other),
        }

        socket.close();
    }

    #[tokio::test]
    async fn test_binary_frame_is_dropped_connection_survives() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Misbehaving server: a binary frame first, then a valid envelope
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            ws.send(Message::Binary(vec![0xde, 0xad])).await.unwrap();
            ws.send(Message::Text(r#"{"type":"deleted"}"#.into()))
                .await
                .unwrap();
            while ws.next().await.is_some() {}
        });

        let resolver = Arc::new(FixedTarget(format!("ws://{}", addr)));
        let (socket, mut events) = ResilientSocket::connect(resolver, test_config());

        assert!(matches!(events.recv().await, Some(TransportEvent::Open)));

        // The binary frame never surfaces; the next text frame does, on the
        // same connection
        match events.recv().await {
            Some(TransportEvent::Message(ServerMessage::Deleted)) => {}
            other => panic!("expected deleted, got {:?}", other),
        }
        assert_eq!(socket.state(), ConnectionState::Connected);

        socket.close();
    }

    #[tokio::test]
    async fn test_error_then_reconnect_emits_second_open() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            // First connection: accept and drop immediately
            let (stream, _) = listener.accept().await.unwrap();
            let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            drop(ws);

            // Second connection: hold open
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            while ws.next().await.is_some() {}
        });

        let resolver = Arc::new(FixedTarget(format!("ws://{}", addr)));
        let (socket, mut events) = ResilientSocket::connect(resolver, test_config());

        assert!(matches!(events.recv().await, Some(TransportEvent::Open)));

        // Dropped connection surfaces either as a clean remote close (no
        // event) or an error, then the socket reconnects on its own.
        loop {
            match events.recv().await {
                Some(TransportEvent::Open) => break,
                Some(TransportEvent::Error(_)) => continue,
                other => panic!("expected reconnect, got {:?}", other),
            }
        }
        assert_eq!(socket.state(), ConnectionState::Connected);

        socket.close();
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_emits_closed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            while ws.next().await.is_some() {}
        });

        let resolver = Arc::new(FixedTarget(format!("ws://{}", addr)));
        let (socket, mut events) = ResilientSocket::connect(resolver, test_config());
        assert!(matches!(events.recv().await, Some(TransportEvent::Open)));

        socket.close();
        socket.close();

        loop {
            match events.recv().await {
                Some(TransportEvent::Closed) | None => break,
                Some(_) => continue,
            }
        }
        assert!(matches!(
            socket.send(ClientMessage::subscribe(&ContentId::new("d").unwrap())).await,
            Err(TransportError::Closed)
        ));
    }
}
