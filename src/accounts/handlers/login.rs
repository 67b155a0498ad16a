use super::{authenticate, parse_payload, required, ServiceError};
use crate::{
    auth::TokenAuthenticator,
    credentials::{CredentialError, CredentialVerifier},
    repository::{UserId, UserRepository},
};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Extension},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, info_span, instrument, Instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize)]
pub struct LoginRequest {
    username: Option<String>,
    password_candidate: Option<String>,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field(
                "password_candidate",
                &self.password_candidate.as_ref().map(|_| "***"),
            )
            .finish()
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct LoginResponse {
    #[serde(rename = "userId")]
    #[schema(value_type = i64)]
    pub user_id: UserId,
}

#[utoipa::path(
    post,
    path= "/login",
    request_body = LoginRequest,
    params(
        ("access-token" = String, Header, description = "HMAC-signed JWT shared with the gateway")
    ),
    responses (
        (
            status = 200,
            description = "Login successful",
            body = LoginResponse,
            content_type = "application/json"
        ),
        (status = 401, description = "Unknown username or wrong password"),
        (status = 500, description = "Token, payload or storage failure"),
    ),
    tag= "accounts"
)]
// axum handler for login
#[instrument(skip_all)]
pub async fn login(
    Extension(authenticator): Extension<Arc<TokenAuthenticator>>,
    Extension(verifier): Extension<Arc<CredentialVerifier>>,
    Extension(repository): Extension<Arc<UserRepository>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    info!("Entered user service to login");

    match login_user(&authenticator, verifier, &repository, &headers, body).await {
        Ok(user_id) => {
            info!(%user_id, "Leaving user service successfully");

            (StatusCode::OK, Json(LoginResponse { user_id })).into_response()
        }
        Err(e) => e.into_response(),
    }
}

async fn login_user(
    authenticator: &TokenAuthenticator,
    verifier: Arc<CredentialVerifier>,
    repository: &UserRepository,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<UserId, ServiceError> {
    authenticate(authenticator, headers)?;

    let request: LoginRequest = parse_payload(body)?;
    let username = required(request.username, "username")?;
    let candidate = required(request.password_candidate, "password_candidate")?;

    let span = info_span!("user.validate");
    let user = repository
        .find_by_username(&username)
        .instrument(span.clone())
        .await?;

    // unknown users pay the same Argon2 cost so timing does not reveal them
    let user_id = user.as_ref().map(|user| user.id);
    tokio::task::spawn_blocking(move || match user {
        Some(user) => verifier.verify(&candidate, &user.password),
        None => {
            debug!("No user registered under that username");
            verifier.verify_absent(&candidate)
        }
    })
    .instrument(span)
    .await??;

    user_id.ok_or_else(|| CredentialError::Mismatch.into())
}
