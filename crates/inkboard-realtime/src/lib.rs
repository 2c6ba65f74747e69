//! Inkboard Realtime - collaborative canvas synchronization
//!
//! This crate provides the server side of the real-time core:
//! - Session: registry of live connections and their outbound queues
//! - Rooms: canvas → sessions membership with per-canvas exclusion
//! - Relay: mutation fan-out plus fire-and-forget persistence
//! - Service: canvas operations that must signal live rooms
//! - WebSocket: axum handler speaking the JSON protocol
//!
//! ## Usage
//!
//! ```ignore
//! use inkboard_realtime::{RealtimeState, realtime_ws_handler};
//! use axum::{Router, routing::get};
//! use std::sync::Arc;
//!
//! let state = Arc::new(RealtimeState::new(store, verifier, Default::default()));
//!
//! let app: Router<()> = Router::new()
//!     .route("/ws", get(realtime_ws_handler))
//!     .with_state(state);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod relay;
pub mod rooms;
pub mod service;
pub mod session;
pub mod websocket;

pub use error::{Error, Result};
pub use relay::BroadcastRelay;
pub use rooms::{JoinOutcome, RoomManager};
pub use service::CanvasService;
pub use session::SessionRegistry;
pub use websocket::{realtime_ws_handler, Connection, RealtimeSettings, RealtimeState};
