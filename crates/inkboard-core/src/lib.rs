//! Inkboard Core - shared domain model
//!
//! This crate holds everything the server and the client agree on:
//! - Element: the closed set of drawable primitives
//! - Canvas: the durable canvas record and its authorization rules
//! - Protocol: real-time client/server message types
//! - Auth: credential verification consumed by the real-time core
//! - Store: the canvas CRUD surface and its SQLite implementation
//! - Error: the error taxonomy shared by every layer
//!
//! ## Usage
//!
//! ```ignore
//! use inkboard_core::{CanvasStore, SqliteCanvasStore};
//! use sqlx::sqlite::SqlitePoolOptions;
//!
//! let pool = SqlitePoolOptions::new().connect("sqlite://inkboard.db").await?;
//! let store = SqliteCanvasStore::new(pool);
//! store.init().await?;
//!
//! let canvas_id = store.create("user-1").await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod canvas;
pub mod element;
pub mod error;
pub mod protocol;
pub mod store;

use uuid::Uuid;

/// Identifier of a durable canvas
pub type CanvasId = Uuid;

/// Identifier of one live real-time connection
pub type SessionId = Uuid;

/// Identifier of an authenticated user
pub type UserId = String;

// Re-export main types
pub use auth::{authenticate, CredentialVerifier, TokenVerifier};
pub use canvas::{
    validate_name, Canvas, CanvasAccess, CanvasSummary, DEFAULT_CANVAS_NAME, MAX_CANVAS_NAME_CHARS,
};
pub use element::{Element, MutationKind, Point, Shape, Stroke, TextBox};
pub use error::{AuthenticationError, Error, Result};
pub use protocol::{ClientMessage, ServerMessage, UnauthorizedReason};
pub use store::{CanvasStore, SqliteCanvasStore, UserDirectory};
