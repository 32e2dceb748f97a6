//! Identity provider contract.
//!
//! # Responsibility
//! - Resolve a request credential to a `UserIdentity` or reject it.
//! - Provide a token-table implementation for tests and embedding hosts.
//!
//! Credential issuance and password handling live outside this crate.

use crate::model::identity::UserIdentity;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

const BEARER_SCHEME: &str = "bearer";

/// Rejection reasons surfaced as `401 Unauthorized`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Request carried no credential.
    MissingCredential,
    /// Credential is unknown, expired or malformed.
    InvalidCredential,
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCredential => write!(f, "not authenticated"),
            Self::InvalidCredential => write!(f, "could not validate credentials"),
        }
    }
}

impl Error for AuthError {}

/// Resolves request credentials to user identities.
pub trait IdentityProvider {
    /// `credential` is the raw `Authorization` value, if any.
    fn authenticate(&self, credential: Option<&str>) -> Result<UserIdentity, AuthError>;
}

/// Fixed token → username table.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenIdentityProvider {
    tokens: HashMap<String, String>,
}

impl StaticTokenIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `token` as a credential for `username`.
    pub fn with_token(mut self, token: impl Into<String>, username: impl Into<String>) -> Self {
        self.tokens.insert(token.into(), username.into());
        self
    }
}

impl IdentityProvider for StaticTokenIdentityProvider {
    fn authenticate(&self, credential: Option<&str>) -> Result<UserIdentity, AuthError> {
        let token = credential
            .map(strip_bearer)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingCredential)?;

        self.tokens
            .get(token)
            .map(UserIdentity::new)
            .ok_or(AuthError::InvalidCredential)
    }
}

/// Accepts either a bare token or `Bearer <token>` (scheme case-insensitive).
fn strip_bearer(credential: &str) -> &str {
    let trimmed = credential.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case(BEARER_SCHEME) => token.trim(),
        _ if trimmed.eq_ignore_ascii_case(BEARER_SCHEME) => "",
        _ => trimmed,
    }
}
