//! # Accounts (registration and login)
//!
//! `accounts` is a small user-account service. Clients register a user with a
//! username, password and email, and later log in with the username and a
//! password candidate to learn the user's numeric id.
//!
//! ## Access tokens
//!
//! Every request must carry a signed access token in the `access-token`
//! header. Tokens are HMAC-signed JWTs keyed by a secret shared with the
//! issuer; only the signature and structure are checked. Requests without a
//! valid token are rejected before any user data is read or written.
//!
//! ## Identifiers
//!
//! User ids are drawn at random from a small bounded range (`1..=1000` by
//! default). An insert that collides with an existing id is retried with a
//! fresh draw until it succeeds. The store's primary key is the only
//! arbiter of uniqueness, so concurrent registrations cannot race. The retry
//! loop has no upper bound: as the range fills up the expected number of
//! draws grows without limit, and a full range never terminates.
//!
//! ## Passwords
//!
//! Passwords are hashed with Argon2id into a self-describing PHC string and
//! verified against it at login. Plaintext passwords are never stored or
//! logged.
//!
//! ## Status codes
//!
//! A wrong password or unknown username at login yields `401`. Every other
//! failure (token, payload, store) yields `500` with an empty body; the
//! detail only goes to the log.

pub mod accounts;
pub mod auth;
pub mod cli;
pub mod credentials;
pub mod repository;
