//! WebSocket Handler
//!
//! This module provides the axum handler for the real-time connection and
//! the per-session [`Connection`] that turns client messages into room,
//! relay and authentication calls.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::{header::AUTHORIZATION, HeaderMap},
    response::IntoResponse,
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use inkboard_core::{
    authenticate, CanvasId, CanvasStore, ClientMessage, CredentialVerifier, ServerMessage,
    SessionId,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::relay::BroadcastRelay;
use crate::rooms::{JoinOutcome, RoomManager};
use crate::service::CanvasService;
use crate::session::SessionRegistry;

/// Connection tuning
#[derive(Debug, Clone)]
pub struct RealtimeSettings {
    /// Largest accepted inbound frame, in bytes
    pub max_message_size: usize,
    /// How often the server pings
    pub heartbeat_interval: Duration,
    /// Silence after which the connection is closed
    pub heartbeat_timeout: Duration,
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            max_message_size: 1024 * 1024,
            heartbeat_interval: Duration::from_secs(30),
            heartbeat_timeout: Duration::from_secs(60),
        }
    }
}

/// Shared state for the real-time handler
pub struct RealtimeState {
    /// Credential verifier used on join
    pub verifier: Arc<dyn CredentialVerifier>,
    /// Room membership registry
    pub rooms: Arc<RoomManager>,
    /// Live session registry
    pub sessions: Arc<SessionRegistry>,
    /// Mutation relay
    pub relay: Arc<BroadcastRelay>,
    /// Canvas operations that signal rooms
    pub service: Arc<CanvasService>,
    /// Connection tuning
    pub settings: RealtimeSettings,
    /// Cancelled when the server shuts down
    pub shutdown: CancellationToken,
}

impl RealtimeState {
    /// Wire the registries, relay and service around one store
    #[must_use]
    pub fn new(
        store: Arc<dyn CanvasStore>,
        verifier: Arc<dyn CredentialVerifier>,
        settings: RealtimeSettings,
    ) -> Self {
        let rooms = Arc::new(RoomManager::new(Arc::clone(&store)));
        let sessions = Arc::new(SessionRegistry::new());
        let relay = Arc::new(BroadcastRelay::new(
            Arc::clone(&rooms),
            Arc::clone(&sessions),
            Arc::clone(&store),
        ));
        let service = Arc::new(CanvasService::new(
            store,
            Arc::clone(&rooms),
            Arc::clone(&sessions),
        ));

        Self {
            verifier,
            rooms,
            sessions,
            relay,
            service,
            settings,
            shutdown: CancellationToken::new(),
        }
    }

    /// Close every connection, drain the rooms and wait for pending writes
    pub async fn shutdown_gracefully(&self) {
        self.shutdown.cancel();
        let evicted = self.rooms.drain().await;
        self.relay.flush().await;
        info!(evicted, "Realtime core shut down");
    }
}

/// Query parameters accepted on upgrade
#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    /// Bearer credential
    pub token: Option<String>,
}

/// WebSocket upgrade handler.
///
/// The credential comes from `?token=` or an `Authorization: Bearer` header.
/// It is only checked when the session joins a canvas.
pub async fn realtime_ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    headers: HeaderMap,
    State(state): State<Arc<RealtimeState>>,
) -> impl IntoResponse {
    let credential = params.token.or_else(|| bearer_token(&headers));
    let max_message_size = state.settings.max_message_size;
    ws.max_message_size(max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, credential, state))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
}

/// One session's view of the real-time core, independent of the socket
pub struct Connection {
    session_id: SessionId,
    credential: Option<String>,
    state: Arc<RealtimeState>,
}

impl Connection {
    /// Register a new session; returns the connection and its outbound queue
    pub fn open(
        state: Arc<RealtimeState>,
        credential: Option<String>,
    ) -> (Self, mpsc::UnboundedReceiver<ServerMessage>) {
        let session_id = Uuid::new_v4();
        let outbound = state.sessions.register(session_id);
        (
            Self {
                session_id,
                credential,
                state,
            },
            outbound,
        )
    }

    /// Session id of this connection
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Handle one text frame; returns the direct reply, if any
    pub async fn handle_text(&self, text: &str) -> Option<ServerMessage> {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => self.dispatch(message).await,
            Err(e) => {
                debug!(session_id = %self.session_id, error = %e, "Malformed client message");
                Some(ServerMessage::error(
                    "invalid_message",
                    format!("Invalid message: {}", e),
                ))
            }
        }
    }

    /// Handle one decoded client message; returns the direct reply, if any
    pub async fn dispatch(&self, message: ClientMessage) -> Option<ServerMessage> {
        match message {
            ClientMessage::Join { canvas_id } => self.join(canvas_id).await,
            ClientMessage::Leave { canvas_id } => {
                self.state.rooms.leave(self.session_id, canvas_id).await;
                None
            }
            ClientMessage::Mutate {
                canvas_id,
                elements,
                kind,
            } => {
                // Non-members are dropped silently; the relay logs them
                let _ = self
                    .state
                    .relay
                    .on_mutation(self.session_id, canvas_id, elements, kind)
                    .await;
                None
            }
            ClientMessage::Ping => Some(ServerMessage::Pong),
        }
    }

    async fn join(&self, canvas_id: CanvasId) -> Option<ServerMessage> {
        let user_id = match authenticate(self.state.verifier.as_ref(), self.credential.as_deref()) {
            Ok(user_id) => user_id,
            Err(e) => {
                warn!(session_id = %self.session_id, canvas_id = %canvas_id, error = %e, "Join rejected");
                return Some(ServerMessage::unauthorized(canvas_id, e.into()));
            }
        };
        self.state.sessions.bind_user(self.session_id, &user_id);

        match self
            .state
            .rooms
            .join(self.session_id, canvas_id, &user_id)
            .await
        {
            Ok(JoinOutcome::Joined { elements }) => Some(ServerMessage::Snapshot {
                canvas_id,
                elements,
            }),
            Ok(JoinOutcome::AlreadyMember) => None,
            Err(err) => match err.unauthorized_reason() {
                Some(reason) => Some(ServerMessage::unauthorized(canvas_id, reason)),
                None => {
                    warn!(session_id = %self.session_id, canvas_id = %canvas_id, error = %err, "Join failed");
                    Some(ServerMessage::error(err.code(), err.to_string()))
                }
            },
        }
    }

    /// Leave every room and unregister the session
    pub async fn close(self) {
        let left = self.state.rooms.disconnect(self.session_id).await;
        self.state.sessions.unregister(self.session_id);
        debug!(session_id = %self.session_id, rooms_left = left, "Connection closed");
    }
}

/// JSON text for an outbound frame; `None` if it cannot be serialized
fn encode<T: Serialize>(message: &T) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(json) => Some(json),
        Err(e) => {
            warn!(error = %e, "Failed to serialize outbound message, dropped");
            None
        }
    }
}

async fn send_message(
    sender: &mut SplitSink<WebSocket, Message>,
    message: &ServerMessage,
) -> Result<(), axum::Error> {
    match encode(message) {
        Some(json) => sender.send(Message::Text(json)).await,
        None => Ok(()),
    }
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, credential: Option<String>, state: Arc<RealtimeState>) {
    let (connection, mut outbound) = Connection::open(Arc::clone(&state), credential);
    let session_id = connection.session_id();
    info!(session_id = %session_id, "WebSocket connected");

    let (mut sender, mut receiver) = socket.split();

    let ping_interval = tokio::time::interval(state.settings.heartbeat_interval);
    tokio::pin!(ping_interval);
    let mut last_recv = tokio::time::Instant::now();

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        last_recv = tokio::time::Instant::now();
                        if let Some(reply) = connection.handle_text(&text).await {
                            if send_message(&mut sender, &reply).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        last_recv = tokio::time::Instant::now();
                        let _ = sender.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Pong(_))) => {
                        last_recv = tokio::time::Instant::now();
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        warn!(session_id = %session_id, error = %e, "WebSocket error");
                        break;
                    }
                    _ => {}
                }
            }
            Some(message) = outbound.recv() => {
                if send_message(&mut sender, &message).await.is_err() {
                    break;
                }
            }
            _ = ping_interval.tick() => {
                if last_recv.elapsed() > state.settings.heartbeat_timeout {
                    info!(session_id = %session_id, "Heartbeat timeout, closing");
                    break;
                }
                if sender.send(Message::Ping(vec![])).await.is_err() {
                    break;
                }
            }
            _ = state.shutdown.cancelled() => {
                let _ = sender.send(Message::Close(None)).await;
                break;
            }
        }
    }

    connection.close().await;
    info!(session_id = %session_id, "WebSocket disconnected");
}
