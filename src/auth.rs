//! Access-token gate.
//!
//! Tokens are JWTs signed with HMAC (`HS256`, `HS384` or `HS512`) using a
//! secret shared with whoever issues them. Verification checks structure and
//! signature only; claims are not consumed. An `exp` claim is honoured when
//! present but never required.

use axum::http::HeaderMap;
use jsonwebtoken::{
    decode, encode, get_current_timestamp, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

/// Request header that carries the access token.
pub const ACCESS_TOKEN_HEADER: &str = "access-token";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("access-token header is missing or not valid UTF-8")]
    MissingToken,
    #[error("invalid access token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("failed to sign access token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// Claims written by [`TokenAuthenticator::issue`].
#[derive(Debug, Serialize, Deserialize)]
struct IssuedClaims {
    #[serde(skip_serializing_if = "Option::is_none")]
    sub: Option<String>,
    iat: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    exp: Option<u64>,
}

pub struct TokenAuthenticator {
    secret: SecretString,
    validation: Validation,
}

impl TokenAuthenticator {
    #[must_use]
    pub fn new(secret: SecretString) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.required_spec_claims.clear();
        validation.validate_aud = false;

        Self { secret, validation }
    }

    /// Check the token's structure and signature.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidToken`] if the token is malformed, signed
    /// with another key or algorithm, or carries an `exp` in the past.
    #[instrument(skip_all, name = "token.authenticate")]
    pub fn authenticate(&self, token: &str) -> Result<(), AuthError> {
        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());
        decode::<serde_json::Value>(token, &key, &self.validation)?;

        debug!("Token authentication successful");

        Ok(())
    }

    /// Mint a token signed with the shared secret.
    ///
    /// # Errors
    /// Returns [`AuthError::Signing`] if encoding fails.
    pub fn issue(&self, subject: Option<&str>, ttl: Option<Duration>) -> Result<String, AuthError> {
        let now = get_current_timestamp();
        let claims = IssuedClaims {
            sub: subject.map(ToString::to_string),
            iat: now,
            exp: ttl.map(|ttl| now.saturating_add(ttl.as_secs())),
        };

        let key = EncodingKey::from_secret(self.secret.expose_secret().as_bytes());
        encode(&Header::new(Algorithm::HS256), &claims, &key).map_err(AuthError::Signing)
    }
}

impl std::fmt::Debug for TokenAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthenticator")
            .field("secret", &"***")
            .field("algorithms", &self.validation.algorithms)
            .finish()
    }
}

/// Extract the raw token from the request headers.
///
/// # Errors
/// Returns [`AuthError::MissingToken`] if the header is absent or not UTF-8.
pub fn access_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    headers
        .get(ACCESS_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::MissingToken)
}
