//! Error types for inkboard-core
//!
//! One taxonomy is shared by the canvas store, the real-time core and the
//! request/response boundary, so that every layer can classify a failure
//! the same way.

use thiserror::Error;

/// Credential failures reported by a [`crate::CredentialVerifier`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthenticationError {
    /// No credential was presented
    #[error("no credential provided")]
    MissingCredentials,

    /// The credential is unknown or malformed
    #[error("invalid credential")]
    InvalidCredentials,

    /// The credential was valid but has expired
    #[error("credential expired")]
    Expired,
}

/// Inkboard error type
#[derive(Debug, Error)]
pub enum Error {
    /// Missing, invalid or expired credential
    #[error("authentication failed: {0}")]
    Authentication(#[from] AuthenticationError),

    /// Authenticated but not permitted
    #[error("not authorized: {0}")]
    Authorization(String),

    /// Canvas or user absent
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad input (name length, malformed payload, self-share)
    #[error("validation failed: {0}")]
    Validation(String),

    /// Duplicate grant
    #[error("conflict: {0}")]
    Conflict(String),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an authorization error
    #[must_use]
    pub fn authorization(msg: impl Into<String>) -> Self {
        Self::Authorization(msg.into())
    }

    /// Create a not-found error
    #[must_use]
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a validation error
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a conflict error
    #[must_use]
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a database error
    #[must_use]
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Whether the caller caused this error (as opposed to the server)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Authentication(_)
                | Self::Authorization(_)
                | Self::NotFound(_)
                | Self::Validation(_)
                | Self::Conflict(_)
        )
    }

    /// Get error code for protocol messages
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Authentication(_) => "unauthenticated",
            Self::Authorization(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "invalid_input",
            Self::Conflict(_) => "conflict",
            Self::Database(_) => "database_error",
            Self::Serialization(_) => "serialization_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Result type alias for inkboard operations
pub type Result<T> = std::result::Result<T, Error>;
