//! TCP session layer: framed reads per session, fan-in to listeners,
//! targeted and broadcast delivery.
//!
//! Each accepted connection gets an even session id, one reader task and
//! one writer task. Readers consume `header || payload` frames, decode them
//! and hand every message — tagged with the session id — to every
//! registered listener (the engine driver registers one). Writers drain a
//! per-session queue so each outbound frame is fully written before the
//! next; the engine never blocks on a slow socket.

use crate::engine::SessionMessage;
use crate::protocol::{InboundMessage, InboundType, OutboundMessage};
use dashmap::DashMap;
use std::io::ErrorKind;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{error, info, trace, warn};

/// Write side of one connected session.
struct SessionHandle {
    outbound: mpsc::UnboundedSender<Vec<u8>>,
}

/// The session table and listener registry.
///
/// Session ids are even and monotonically increasing; listener ids are odd
/// from the same id space. Neither is ever reused.
pub struct SessionServer {
    sessions: DashMap<u64, SessionHandle>,
    listeners: DashMap<u64, mpsc::UnboundedSender<SessionMessage>>,
    next_session_id: AtomicU64,
    next_listener_id: AtomicU64,
}

impl SessionServer {
    /// Create a server with no sessions.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sessions: DashMap::new(),
            listeners: DashMap::new(),
            next_session_id: AtomicU64::new(0),
            next_listener_id: AtomicU64::new(1),
        })
    }

    /// Register a listener that will receive every decoded inbound message.
    /// Returns the odd listener id.
    pub fn register_listener(&self, sender: mpsc::UnboundedSender<SessionMessage>) -> u64 {
        let listener_id = self.next_listener_id.fetch_add(2, Ordering::Relaxed);
        self.listeners.insert(listener_id, sender);
        info!("added listener {}", listener_id);
        listener_id
    }

    /// Remove a listener registration.
    pub fn deregister_listener(&self, listener_id: u64) {
        self.listeners.remove(&listener_id);
        info!("removed listener {}", listener_id);
    }

    /// Number of connected sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Accept connections forever, spawning the per-session tasks.
    pub async fn serve(self: Arc<Self>, listener: TcpListener) {
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let session_id = self.next_session_id.fetch_add(2, Ordering::Relaxed);
                    info!("session {} connected from {}", session_id, peer);
                    self.clone().start_session(session_id, stream);
                }
                Err(e) => {
                    error!("accept failed: {}", e);
                }
            }
        }
    }

    /// Write a message to the session identified by `session_id`. Silently
    /// dropped when that session is gone.
    pub fn send_targeted(&self, session_id: u64, message: &OutboundMessage) {
        let Some(handle) = self.sessions.get(&session_id) else {
            trace!("session {} gone, targeted message dropped", session_id);
            return;
        };
        let _ = handle.outbound.send(message.encode());
    }

    /// Write a message to every connected session. A dead session never
    /// stops delivery to the others.
    pub fn send_broadcast(&self, message: &OutboundMessage) {
        let frame = message.encode();
        for handle in self.sessions.iter() {
            let _ = handle.outbound.send(frame.clone());
        }
    }

    fn start_session(self: Arc<Self>, session_id: u64, stream: TcpStream) {
        let (read_half, write_half) = stream.into_split();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        self.sessions
            .insert(session_id, SessionHandle { outbound: outbound_tx });

        let server = self.clone();
        tokio::spawn(async move {
            server.read_loop(session_id, read_half).await;
            server.sessions.remove(&session_id);
            info!("session {} closed", session_id);
        });

        tokio::spawn(async move {
            write_loop(session_id, write_half, outbound_rx).await;
            self.sessions.remove(&session_id);
        });
    }

    /// Consume frames until the peer disconnects or sends garbage.
    async fn read_loop(&self, session_id: u64, mut reader: OwnedReadHalf) {
        loop {
            let mut header = [0u8; 1];
            match reader.read_exact(&mut header).await {
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                    info!("session {}: no more messages", session_id);
                    return;
                }
                Err(e) => {
                    error!("session {}: read failed: {}", session_id, e);
                    return;
                }
            }
            let message_type = match InboundType::lookup(header[0]) {
                Ok(message_type) => message_type,
                Err(e) => {
                    error!("session {}: {}; terminating session", session_id, e);
                    return;
                }
            };
            let mut payload = vec![0u8; message_type.payload_size()];
            if let Err(e) = reader.read_exact(&mut payload).await {
                error!(
                    "session {}: connection terminated mid-message: {}",
                    session_id, e
                );
                return;
            }
            let message = match InboundMessage::decode(message_type, &payload) {
                Ok(message) => message,
                Err(e) => {
                    error!("session {}: {}; terminating session", session_id, e);
                    return;
                }
            };
            self.deliver(SessionMessage {
                session: session_id,
                message,
            });
        }
    }

    /// Hand one decoded message to every registered listener.
    fn deliver(&self, message: SessionMessage) {
        for listener in self.listeners.iter() {
            if listener.value().send(message).is_err() {
                warn!("listener {} dropped its receiver", listener.key());
            }
        }
    }
}

/// Drain the session's outbound queue, one fully-flushed frame at a time.
async fn write_loop(
    session_id: u64,
    mut writer: OwnedWriteHalf,
    mut outbound: mpsc::UnboundedReceiver<Vec<u8>>,
) {
    while let Some(frame) = outbound.recv().await {
        if let Err(e) = writer.write_all(&frame).await {
            warn!("session {}: write failed: {}", session_id, e);
            return;
        }
        if let Err(e) = writer.flush().await {
            warn!("session {}: flush failed: {}", session_id, e);
            return;
        }
    }
}
