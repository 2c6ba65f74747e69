//! Credential Verification
//!
//! The real-time core consumes credential verification; it never issues
//! credentials itself. [`CredentialVerifier`] is the seam, and
//! [`TokenVerifier`] is a bearer-token implementation backed by a table of
//! pre-registered tokens (hashed, compared in constant time).

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::RwLock;
use subtle::ConstantTimeEq;
use tracing::{debug, info};

use crate::error::AuthenticationError;
use crate::UserId;

/// Resolves a presented credential to the user it was issued for
pub trait CredentialVerifier: Send + Sync {
    /// Verify `credential`, returning the authenticated user id
    fn verify(&self, credential: &str) -> Result<UserId, AuthenticationError>;
}

/// Verify an optional credential; absent or blank credentials are "missing"
pub fn authenticate(
    verifier: &dyn CredentialVerifier,
    credential: Option<&str>,
) -> Result<UserId, AuthenticationError> {
    match credential.map(str::trim) {
        None | Some("") => Err(AuthenticationError::MissingCredentials),
        Some(token) => verifier.verify(token),
    }
}

#[derive(Debug, Clone)]
struct IssuedToken {
    token_hash: [u8; 32],
    user_id: UserId,
    expires_at: Option<DateTime<Utc>>,
}

/// Bearer-token verifier over a registry of issued tokens
pub struct TokenVerifier {
    /// token_hash_hex → IssuedToken
    tokens: RwLock<HashMap<String, IssuedToken>>,
}

impl TokenVerifier {
    /// Create an empty verifier
    #[must_use]
    pub fn new() -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
        }
    }

    fn hash_token(token: &str) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        let result = hasher.finalize();
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&result);
        hash
    }

    fn hash_to_hex(hash: &[u8; 32]) -> String {
        hash.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Register a token issued elsewhere for `user_id`
    pub fn register(
        &self,
        token: &str,
        user_id: impl Into<UserId>,
        expires_at: Option<DateTime<Utc>>,
    ) {
        let token_hash = Self::hash_token(token);
        let user_id = user_id.into();
        info!(user_id = %user_id, expires_at = ?expires_at, "Token registered");

        let mut tokens = self.tokens.write().unwrap_or_else(|e| e.into_inner());
        tokens.insert(
            Self::hash_to_hex(&token_hash),
            IssuedToken {
                token_hash,
                user_id,
                expires_at,
            },
        );
    }

    /// Number of registered tokens
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.read().map(|t| t.len()).unwrap_or(0)
    }

    /// Whether no tokens are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TokenVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialVerifier for TokenVerifier {
    fn verify(&self, credential: &str) -> Result<UserId, AuthenticationError> {
        if credential.is_empty() {
            return Err(AuthenticationError::MissingCredentials);
        }

        let hash = Self::hash_token(credential);
        let tokens = self
            .tokens
            .read()
            .map_err(|_| AuthenticationError::InvalidCredentials)?;

        let issued = tokens
            .get(&Self::hash_to_hex(&hash))
            .filter(|issued| bool::from(issued.token_hash.ct_eq(&hash)))
            .ok_or(AuthenticationError::InvalidCredentials)?;

        if issued.expires_at.is_some_and(|at| at <= Utc::now()) {
            debug!(user_id = %issued.user_id, "Rejected expired token");
            return Err(AuthenticationError::Expired);
        }

        Ok(issued.user_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_register_and_verify() {
        let verifier = TokenVerifier::new();
        verifier.register("secret-a", "alice", None);

        assert_eq!(verifier.verify("secret-a").unwrap(), "alice");
        assert_eq!(verifier.len(), 1);
    }

    #[test]
    fn test_unknown_token() {
        let verifier = TokenVerifier::new();
        verifier.register("secret-a", "alice", None);
        assert_eq!(
            verifier.verify("secret-b"),
            Err(AuthenticationError::InvalidCredentials)
        );
    }

    #[test]
    fn test_expired_token() {
        let verifier = TokenVerifier::new();
        verifier.register("old", "alice", Some(Utc::now() - Duration::seconds(5)));
        verifier.register("fresh", "bob", Some(Utc::now() + Duration::hours(1)));

        assert_eq!(verifier.verify("old"), Err(AuthenticationError::Expired));
        assert_eq!(verifier.verify("fresh").unwrap(), "bob");
    }

    #[test]
    fn test_authenticate_missing() {
        let verifier = TokenVerifier::new();
        assert_eq!(
            authenticate(&verifier, None),
            Err(AuthenticationError::MissingCredentials)
        );
        assert_eq!(
            authenticate(&verifier, Some("   ")),
            Err(AuthenticationError::MissingCredentials)
        );
    }

    #[test]
    fn test_authenticate_trims() {
        let verifier = TokenVerifier::new();
        verifier.register("tok", "carol", None);
        assert_eq!(authenticate(&verifier, Some(" tok ")).unwrap(), "carol");
    }
}
