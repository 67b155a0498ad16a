use super::{authenticate, parse_payload, required, ServiceError};
use crate::{
    auth::TokenAuthenticator,
    credentials::CredentialVerifier,
    repository::{UserId, UserRepository},
};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Extension},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, info_span, instrument, Instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize)]
pub struct RegisterRequest {
    username: Option<String>,
    password: Option<String>,
    email: Option<String>,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("email", &self.email)
            .finish()
    }
}

#[utoipa::path(
    post,
    path= "/register",
    request_body = RegisterRequest,
    params(
        ("access-token" = String, Header, description = "HMAC-signed JWT shared with the gateway")
    ),
    responses (
        (status = 200, description = "User created"),
        (status = 500, description = "Token, payload or storage failure"),
    ),
    tag= "accounts"
)]
// axum handler for register
#[instrument(skip_all)]
pub async fn register(
    Extension(authenticator): Extension<Arc<TokenAuthenticator>>,
    Extension(verifier): Extension<Arc<CredentialVerifier>>,
    Extension(repository): Extension<Arc<UserRepository>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    info!("Entered user service to register");

    match register_user(&authenticator, verifier, &repository, &headers, body).await {
        Ok(user_id) => {
            info!(%user_id, "Leaving user service successfully");

            StatusCode::OK.into_response()
        }
        Err(e) => e.into_response(),
    }
}

async fn register_user(
    authenticator: &TokenAuthenticator,
    verifier: Arc<CredentialVerifier>,
    repository: &UserRepository,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<UserId, ServiceError> {
    authenticate(authenticator, headers)?;

    let request: RegisterRequest = parse_payload(body)?;
    let username = required(request.username, "username")?;
    let password = required(request.password, "password")?;
    let email = required(request.email, "email")?;

    // Argon2 is CPU bound, keep it off the async workers
    let digest = tokio::task::spawn_blocking(move || verifier.hash(&password))
        .instrument(info_span!("password.hash"))
        .await??;

    let user_id = repository
        .create_user(&username, digest, &email)
        .instrument(info_span!("user.create"))
        .await?;

    Ok(user_id)
}
