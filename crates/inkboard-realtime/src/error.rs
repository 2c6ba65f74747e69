//! Error types for inkboard-realtime

use inkboard_core::{CanvasId, SessionId, UnauthorizedReason};
use thiserror::Error;

/// Realtime error type
#[derive(Debug, Error)]
pub enum Error {
    /// A mutation or leave named a room the session has not joined
    #[error("session {session_id} is not a member of canvas {canvas_id}")]
    NotMember {
        /// Offending session
        session_id: SessionId,
        /// Canvas named
        canvas_id: CanvasId,
    },

    /// The room registry is draining and refuses new joins
    #[error("room registry is shutting down")]
    ShuttingDown,

    /// Store, authorization or authentication failure
    #[error(transparent)]
    Core(#[from] inkboard_core::Error),
}

impl Error {
    /// Reason to report to the session when a join fails, if the failure is
    /// an authorization-class failure
    #[must_use]
    pub fn unauthorized_reason(&self) -> Option<UnauthorizedReason> {
        match self {
            Self::Core(err) => UnauthorizedReason::from_error(err),
            Self::NotMember { .. } | Self::ShuttingDown => None,
        }
    }

    /// Get error code for protocol messages
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotMember { .. } => "not_member",
            Self::ShuttingDown => "shutting_down",
            Self::Core(err) => err.code(),
        }
    }
}

impl From<inkboard_core::AuthenticationError> for Error {
    fn from(err: inkboard_core::AuthenticationError) -> Self {
        Self::Core(err.into())
    }
}

/// Result type alias for realtime operations
pub type Result<T> = std::result::Result<T, Error>;
