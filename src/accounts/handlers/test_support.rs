//! Shared fixtures for handler tests.
#![allow(clippy::unwrap_used)]

use crate::{
    accounts::router,
    auth::{TokenAuthenticator, ACCESS_TOKEN_HEADER},
    credentials::CredentialVerifier,
    repository::{IdRange, MemoryUserStore, RepoError, User, UserRepository, UserStore},
};
use argon2::Params;
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header::CONTENT_TYPE, Request, StatusCode},
    Router,
};
use secrecy::SecretString;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tower::ServiceExt;

pub(crate) const SECRET: &str = "test-signing-secret";

pub(crate) fn authenticator() -> Arc<TokenAuthenticator> {
    Arc::new(TokenAuthenticator::new(SecretString::from(SECRET.to_string())))
}

/// Cheap Argon2 parameters so tests stay fast.
pub(crate) fn verifier() -> Arc<CredentialVerifier> {
    Arc::new(CredentialVerifier::new(Params::new(1024, 1, 1, None).unwrap()))
}

pub(crate) fn app(store: Arc<dyn UserStore>) -> Router {
    router(
        authenticator(),
        verifier(),
        Arc::new(UserRepository::new(store, IdRange::default())),
    )
}

pub(crate) fn token() -> String {
    authenticator().issue(Some("tests"), None).unwrap()
}

pub(crate) fn post(uri: &str, token: Option<&str>, body: &serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(ACCESS_TOKEN_HEADER, token);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub(crate) async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Bytes) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body)
}

/// `fields` plus a `field` holding a string past the default body limit.
pub(crate) fn oversized(mut fields: serde_json::Value, field: &str) -> serde_json::Value {
    fields[field] = serde_json::Value::String("x".repeat(3 * 1024 * 1024));
    fields
}

/// Counts every call before delegating to an in-memory store.
#[derive(Default)]
pub(crate) struct SpyStore {
    inner: MemoryUserStore,
    calls: AtomicUsize,
}

impl SpyStore {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserStore for SpyStore {
    async fn insert(&self, user: &User) -> Result<(), RepoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(user).await
    }

    async fn find_one(&self, username: &str) -> Result<Option<User>, RepoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.find_one(username).await
    }

    async fn ping(&self) -> Result<(), RepoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.ping().await
    }
}

/// A store whose backend is down.
#[derive(Default)]
pub(crate) struct FailingStore {
    inserts: AtomicUsize,
}

impl FailingStore {
    pub(crate) fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserStore for FailingStore {
    async fn insert(&self, _user: &User) -> Result<(), RepoError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Err(RepoError::unavailable("connection reset by peer"))
    }

    async fn find_one(&self, _username: &str) -> Result<Option<User>, RepoError> {
        Err(RepoError::unavailable("connection reset by peer"))
    }

    async fn ping(&self) -> Result<(), RepoError> {
        Err(RepoError::unavailable("connection reset by peer"))
    }
}
