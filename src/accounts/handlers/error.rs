use crate::{auth::AuthError, credentials::CredentialError, repository::RepoError};
use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::error::Error as _;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("request body could not be read: {0}")]
    Body(#[from] BytesRejection),
    #[error("request body is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
}

/// Everything that can end an account request early.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error("password task failed: {0}")]
    Task(#[from] JoinError),
}

impl ServiceError {
    /// Status code sent to the client. Only a credential mismatch is told
    /// apart; every other failure is a plain 500.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Credential(CredentialError::Mismatch) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            Self::Credential(CredentialError::Mismatch) => {
                warn!("Invalid credentials, leaving user service");
            }
            Self::Auth(e) => warn!("Token authentication failed: {}", e),
            Self::Validation(e) => warn!("Rejected request payload: {}", e),
            _ => error!("Request failed: {}", chain(&self)),
        }

        // never leak detail to the client
        status.into_response()
    }
}

fn chain(err: &ServiceError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.ends_with(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn only_mismatch_is_unauthorized() {
        assert_eq!(
            ServiceError::from(CredentialError::Mismatch).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServiceError::from(AuthError::MissingToken).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServiceError::from(ValidationError::MissingField("email")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServiceError::from(RepoError::unavailable("down")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn response_body_is_empty() {
        let response =
            ServiceError::from(RepoError::unavailable("password=hunter2")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX).await;
        assert!(body.is_ok_and(|b| b.is_empty()));
    }

    #[test]
    fn chain_includes_sources() {
        let err = ServiceError::from(RepoError::unavailable("connection refused"));
        assert_eq!(chain(&err), "user store unavailable: connection refused");
    }
}
