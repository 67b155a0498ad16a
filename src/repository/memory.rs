//! Process-local user store for development and tests.

use super::{RepoError, User, UserId, UserStore};
use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Users {
    ids: HashSet<UserId>,
    // insertion order
    rows: Vec<User>,
}

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<Users>,
}

impl MemoryUserStore {
    /// Snapshot of all stored users in insertion order.
    pub async fn users(&self) -> Vec<User> {
        self.users.read().await.rows.clone()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: &User) -> Result<(), RepoError> {
        let mut users = self.users.write().await;

        if !users.ids.insert(user.id) {
            return Err(RepoError::Conflict(user.id));
        }
        users.rows.push(user.clone());

        Ok(())
    }

    async fn find_one(&self, username: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .users
            .read()
            .await
            .rows
            .iter()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn ping(&self) -> Result<(), RepoError> {
        Ok(())
    }
}
