//! HTTP handlers for registration, login and health.
//!
//! Both account operations follow the same order: authenticate the access
//! token, parse the payload, then touch credentials and storage. A failed
//! step ends the request; [`ServiceError`] decides the status code.

pub mod health;
pub use self::health::health;

pub mod register;
pub use self::register::register;

pub mod login;
pub use self::login::login;

mod error;
pub use self::error::{ServiceError, ValidationError};

#[cfg(test)]
pub(crate) mod test_support;

// common functions for the handlers
use crate::auth::{access_token, AuthError, TokenAuthenticator};
use axum::{body::Bytes, extract::rejection::BytesRejection, http::HeaderMap};
use serde::de::DeserializeOwned;
use tracing::info_span;

/// Verify the `access-token` header.
pub(crate) fn authenticate(
    authenticator: &TokenAuthenticator,
    headers: &HeaderMap,
) -> Result<(), AuthError> {
    let token = access_token(headers)?;
    authenticator.authenticate(token)
}

/// Decode a JSON body regardless of the declared content type. A body the
/// extractor refused (too large, broken stream) is a payload failure too.
pub(crate) fn parse_payload<T: DeserializeOwned>(
    body: Result<Bytes, BytesRejection>,
) -> Result<T, ValidationError> {
    let _span = info_span!("request.parse").entered();
    let body = body?;
    Ok(serde_json::from_slice(&body)?)
}

pub(crate) fn required(
    value: Option<String>,
    field: &'static str,
) -> Result<String, ValidationError> {
    value.ok_or(ValidationError::MissingField(field))
}
