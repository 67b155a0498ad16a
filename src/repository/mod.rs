//! User records, the store they live in, and identifier allocation.
//!
//! Identifiers are drawn uniformly at random from an [`IdRange`]. The store
//! is the only judge of uniqueness: an insert either lands atomically or
//! reports [`RepoError::Conflict`], in which case [`UserRepository`] draws
//! again. Nothing is checked in-process before inserting, so two concurrent
//! registrations that draw the same id cannot both succeed.
//!
//! The retry loop is unbounded. With `n` of `N` ids taken, the expected
//! number of draws per registration is `N / (N - n)`; once the range is
//! full, registration never returns. A sequence or UUID allocator avoids
//! this and is the right choice at scale.

pub mod memory;
pub mod postgres;

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

use crate::credentials::PasswordDigest;
use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use thiserror::Error;
use tracing::{debug, instrument, warn};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

const DEFAULT_ID_MIN: i64 = 1;
const DEFAULT_ID_MAX: i64 = 1000;
// emit a warning every this many consecutive collisions
const COLLISION_WARN_INTERVAL: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password: PasswordDigest,
    pub email: String,
}

#[derive(Debug, Error)]
pub enum RepoError {
    /// Another user already holds this id. Recovered by [`UserRepository::create_user`].
    #[error("user id {0} is already taken")]
    Conflict(UserId),
    #[error("user store unavailable: {0}")]
    Unavailable(#[source] BoxError),
}

impl RepoError {
    pub fn unavailable(err: impl Into<BoxError>) -> Self {
        Self::Unavailable(err.into())
    }
}

#[derive(Debug, Error)]
#[error("invalid user id range {min}..={max}: bounds must be positive and min <= max")]
pub struct InvalidIdRange {
    min: i64,
    max: i64,
}

/// Inclusive range user ids are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdRange {
    min: i64,
    max: i64,
}

impl IdRange {
    /// # Errors
    /// Returns [`InvalidIdRange`] if `min < 1` or `min > max`.
    pub fn new(min: i64, max: i64) -> Result<Self, InvalidIdRange> {
        if min < 1 || min > max {
            return Err(InvalidIdRange { min, max });
        }
        Ok(Self { min, max })
    }

    #[must_use]
    pub const fn min(&self) -> i64 {
        self.min
    }

    #[must_use]
    pub const fn max(&self) -> i64 {
        self.max
    }

    #[must_use]
    pub fn contains(&self, id: UserId) -> bool {
        (self.min..=self.max).contains(&id.get())
    }

    fn draw(&self) -> UserId {
        UserId(rand::thread_rng().gen_range(self.min..=self.max))
    }
}

impl Default for IdRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_ID_MIN,
            max: DEFAULT_ID_MAX,
        }
    }
}

impl fmt::Display for IdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.min, self.max)
    }
}

/// Backing storage for users.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. Must fail with [`RepoError::Conflict`] if the id is
    /// taken, decided atomically with the insert itself.
    async fn insert(&self, user: &User) -> Result<(), RepoError>;

    /// First user with this exact username, in insertion order.
    async fn find_one(&self, username: &str) -> Result<Option<User>, RepoError>;

    async fn ping(&self) -> Result<(), RepoError>;
}

pub struct UserRepository {
    store: Arc<dyn UserStore>,
    ids: IdRange,
}

impl UserRepository {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>, ids: IdRange) -> Self {
        Self { store, ids }
    }

    #[must_use]
    pub const fn id_range(&self) -> IdRange {
        self.ids
    }

    /// Create a user under a freshly drawn id, redrawing on every id
    /// collision until the insert succeeds.
    ///
    /// # Errors
    /// Returns [`RepoError::Unavailable`] on any store failure other than a
    /// collision. Those are not retried.
    #[instrument(skip(self, password, email), fields(range = %self.ids))]
    pub async fn create_user(
        &self,
        username: &str,
        password: PasswordDigest,
        email: &str,
    ) -> Result<UserId, RepoError> {
        let mut collisions: u64 = 0;

        loop {
            let user = User {
                id: self.ids.draw(),
                username: username.to_string(),
                password: password.clone(),
                email: email.to_string(),
            };

            match self.store.insert(&user).await {
                Ok(()) => {
                    debug!(user_id = %user.id, collisions, "Inserted user");
                    return Ok(user.id);
                }
                Err(RepoError::Conflict(id)) => {
                    collisions += 1;
                    debug!(user_id = %id, "User id already taken, drawing another");

                    if collisions % COLLISION_WARN_INTERVAL == 0 {
                        warn!(
                            collisions,
                            range = %self.ids,
                            "User id range is crowded, registration keeps colliding"
                        );
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// # Errors
    /// Returns [`RepoError::Unavailable`] if the store cannot be queried.
    #[instrument(skip(self))]
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        self.store.find_one(username).await
    }

    /// # Errors
    /// Returns [`RepoError::Unavailable`] if the store is unreachable.
    pub async fn ping(&self) -> Result<(), RepoError> {
        self.store.ping().await
    }
}

impl fmt::Debug for UserRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRepository")
            .field("ids", &self.ids)
            .finish_non_exhaustive()
    }
}
