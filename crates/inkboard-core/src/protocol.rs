//! Real-time Protocol Messages
//!
//! This module defines the client/server message types carried as JSON text
//! frames over the real-time connection.

use serde::{Deserialize, Serialize};

use crate::element::{Element, MutationKind};
use crate::error::{AuthenticationError, Error};
use crate::CanvasId;

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join a canvas room
    Join {
        /// Canvas to join
        canvas_id: CanvasId,
    },

    /// Leave a canvas room
    Leave {
        /// Canvas to leave
        canvas_id: CanvasId,
    },

    /// Replace the canvas's elements and relay them to the room
    Mutate {
        /// Target canvas
        canvas_id: CanvasId,
        /// Full element collection after the edit
        elements: Vec<Element>,
        /// What produced the edit
        kind: MutationKind,
    },

    /// Ping to keep connection alive
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Current elements, sent only to the session that just joined
    Snapshot {
        /// Canvas joined
        canvas_id: CanvasId,
        /// Current elements
        elements: Vec<Element>,
    },

    /// Another room member mutated the canvas
    PeerMutate {
        /// Canvas mutated
        canvas_id: CanvasId,
        /// Full element collection
        elements: Vec<Element>,
        /// What produced the edit
        kind: MutationKind,
    },

    /// The owner renamed the canvas
    NameChanged {
        /// Canvas renamed
        canvas_id: CanvasId,
        /// New name
        name: String,
    },

    /// A join was refused
    Unauthorized {
        /// Canvas the refused join named
        canvas_id: CanvasId,
        /// Why
        reason: UnauthorizedReason,
    },

    /// The canvas was deleted; the room no longer exists
    CanvasDeleted {
        /// Canvas deleted
        canvas_id: CanvasId,
    },

    /// Error message
    Error {
        /// Error code
        code: String,
        /// Error message
        message: String,
    },

    /// Pong response to ping
    Pong,
}

impl ServerMessage {
    /// Create an error message
    #[must_use]
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create an unauthorized message
    #[must_use]
    pub fn unauthorized(canvas_id: CanvasId, reason: UnauthorizedReason) -> Self {
        Self::Unauthorized { canvas_id, reason }
    }
}

/// Reason a join was refused, serialized as a fixed human-readable string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnauthorizedReason {
    /// No credential presented
    #[serde(rename = "No Token")]
    NoToken,
    /// Credential unknown or malformed
    #[serde(rename = "Invalid token")]
    InvalidToken,
    /// Credential expired
    #[serde(rename = "Token expired")]
    TokenExpired,
    /// Canvas does not exist
    #[serde(rename = "Canvas not found")]
    CanvasNotFound,
    /// Neither owner nor shared user
    #[serde(rename = "Not authorized")]
    NotAuthorized,
}

impl UnauthorizedReason {
    /// Wire string of this reason
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoToken => "No Token",
            Self::InvalidToken => "Invalid token",
            Self::TokenExpired => "Token expired",
            Self::CanvasNotFound => "Canvas not found",
            Self::NotAuthorized => "Not authorized",
        }
    }

    /// Classify an error as an unauthorized reason, if it is one
    #[must_use]
    pub fn from_error(err: &Error) -> Option<Self> {
        match err {
            Error::Authentication(e) => Some((*e).into()),
            Error::Authorization(_) => Some(Self::NotAuthorized),
            Error::NotFound(_) => Some(Self::CanvasNotFound),
            _ => None,
        }
    }
}

impl From<AuthenticationError> for UnauthorizedReason {
    fn from(err: AuthenticationError) -> Self {
        match err {
            AuthenticationError::MissingCredentials => Self::NoToken,
            AuthenticationError::InvalidCredentials => Self::InvalidToken,
            AuthenticationError::Expired => Self::TokenExpired,
        }
    }
}

impl std::fmt::Display for UnauthorizedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
