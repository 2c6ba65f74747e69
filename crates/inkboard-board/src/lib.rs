//! Inkboard Board - client-side drawing state
//!
//! This crate provides the client half of the real-time core:
//! - Board: the idle/drawing/erasing/writing state machine over the elements
//! - History: undo/redo snapshots
//! - Hit testing for the eraser
//! - Throttle: per-kind trailing-edge rate limiting of live updates
//! - Client: one canvas session over a [`Transport`], with join and teardown
//!
//! ## Usage
//!
//! ```ignore
//! use inkboard_board::{BoardClient, BoardEvent, InputEvent, Tool};
//! use std::time::Instant;
//!
//! let mut client = BoardClient::new(transport);
//! client.open(canvas_id);
//! client.process(Instant::now(), BoardEvent::Input(InputEvent::SelectTool(Tool::Rectangle)));
//! // ... feed pointer input and inbound server messages through `process`
//! client.teardown();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod board;
pub mod client;
pub mod history;
pub mod throttle;

pub use board::{BoardState, Mode, Tool, ToolStyle};
pub use client::{BoardClient, BoardEvent, InputEvent, Transport, EMIT_INTERVAL};
pub use history::{History, HistoryPolicy};
pub use throttle::Throttle;
