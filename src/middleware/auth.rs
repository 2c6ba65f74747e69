//! Authentication middleware for Axum
//!
//! Extracts a bearer token from the request and verifies it against the
//! [`CredentialVerifier`] installed as a router extension. Provides the
//! `RequireAuth` extractor for handlers.

use axum::{
    extract::{FromRequestParts, Query},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use inkboard_core::{authenticate, AuthenticationError, CredentialVerifier, UserId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// JSON error response for auth failures
#[derive(Debug, Serialize)]
struct AuthErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl AuthErrorResponse {
    fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            code: code.into(),
        }
    }
}

/// Auth rejection type
#[derive(Debug)]
pub struct AuthRejection {
    status: StatusCode,
    body: AuthErrorResponse,
}

impl AuthRejection {
    fn not_configured() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: AuthErrorResponse::new("Credential verifier not configured", "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<AuthenticationError> for AuthRejection {
    fn from(err: AuthenticationError) -> Self {
        let body = match err {
            AuthenticationError::MissingCredentials => AuthErrorResponse::new(
                "Authentication required. Provide Authorization: Bearer <token>.",
                "UNAUTHORIZED",
            ),
            AuthenticationError::InvalidCredentials => {
                AuthErrorResponse::new("Invalid token", "INVALID_CREDENTIALS")
            }
            AuthenticationError::Expired => {
                AuthErrorResponse::new("Token expired", "TOKEN_EXPIRED")
            }
        };
        AuthRejection {
            status: StatusCode::UNAUTHORIZED,
            body,
        }
    }
}

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: UserId,
}

// ============================================================================
// RequireAuth Extractor
// ============================================================================

/// Axum extractor that requires authentication.
///
/// Extracts the token from:
/// 1. `Authorization: Bearer <token>` header
/// 2. `?token=<token>` query parameter
pub struct RequireAuth(pub AuthUser);

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let verifier = parts
            .extensions
            .get::<Arc<dyn CredentialVerifier>>()
            .ok_or_else(AuthRejection::not_configured)?;

        let token = extract_token(parts);
        let user_id = authenticate(verifier.as_ref(), token.as_deref())?;

        Ok(RequireAuth(AuthUser { user_id }))
    }
}

/// `?token=` query parameter, percent-decoded
#[derive(Debug, Default, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Extract token from request headers or query params
fn extract_token(parts: &Parts) -> Option<String> {
    if let Some(auth_header) = parts.headers.get("authorization") {
        if let Ok(value) = auth_header.to_str() {
            if let Some(token) = value.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }

    Query::<TokenQuery>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(query)| query.token)
}
