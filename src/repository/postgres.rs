use super::{RepoError, User, UserId, UserStore};
use crate::credentials::PasswordDigest;
use async_trait::async_trait;
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    Connection, PgPool, Row,
};
use std::time::Duration;
use tracing::{info_span, Instrument};

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to the database
    /// # Errors
    /// Returns [`RepoError::Unavailable`] if no connection can be established.
    pub async fn connect(dsn: &str) -> Result<Self, RepoError> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await
            .map_err(RepoError::unavailable)?;

        Ok(Self::new(pool))
    }

    /// Create the `users` table and its index if missing.
    /// # Errors
    /// Returns [`RepoError::Unavailable`] if a statement fails.
    pub async fn migrate(&self) -> Result<(), RepoError> {
        for statement in schema_statements(SCHEMA_SQL) {
            let span = info_span!(
                "db.query",
                db.system = "postgresql",
                db.operation = "DDL",
                db.statement = statement.as_str()
            );
            sqlx::query(&statement)
                .execute(&self.pool)
                .instrument(span)
                .await
                .map_err(RepoError::unavailable)?;
        }

        Ok(())
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: &User) -> Result<(), RepoError> {
        // the primary key decides; a skipped row means the id is taken
        let query = "INSERT INTO users (id, username, password, email) VALUES ($1, $2, $3, $4) ON CONFLICT (id) DO NOTHING";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(user.id.get())
            .bind(&user.username)
            .bind(user.password.as_str())
            .bind(&user.email)
            .execute(&self.pool)
            .instrument(span)
            .await
            .map_err(RepoError::unavailable)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::Conflict(user.id));
        }

        Ok(())
    }

    async fn find_one(&self, username: &str) -> Result<Option<User>, RepoError> {
        let query = "SELECT id, username, password, email FROM users WHERE username = $1 ORDER BY created_at, id LIMIT 1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(username)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .map_err(RepoError::unavailable)?;

        row.as_ref()
            .map(user_from_row)
            .transpose()
            .map_err(RepoError::unavailable)
    }

    async fn ping(&self) -> Result<(), RepoError> {
        let acquire_span = info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let mut conn = self
            .pool
            .acquire()
            .instrument(acquire_span)
            .await
            .map_err(RepoError::unavailable)?;

        let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping()
            .instrument(ping_span)
            .await
            .map_err(RepoError::unavailable)
    }
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: UserId::new(row.try_get("id")?),
        username: row.try_get("username")?,
        password: PasswordDigest::from_stored(row.try_get("password")?),
        email: row.try_get("email")?,
    })
}

fn schema_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("--") {
            continue;
        }
        current.push_str(line);
        current.push('\n');

        if trimmed.ends_with(';') {
            statements.push(current.trim().to_string());
            current.clear();
        }
    }

    let leftover = current.trim();
    if !leftover.is_empty() {
        statements.push(leftover.to_string());
    }

    statements
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::repository::{IdRange, UserRepository};
    use std::sync::Arc;

    #[test]
    fn schema_splits_into_statements() {
        let statements = schema_statements(SCHEMA_SQL);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS users"));
        assert!(statements[1].starts_with("CREATE INDEX IF NOT EXISTS"));
        assert!(statements.iter().all(|s| !s.contains("--")));
    }

    // Runs against a real database only when ACCOUNTS_TEST_DSN is set.
    #[tokio::test]
    async fn insert_conflicts_and_lookup_order() -> anyhow::Result<()> {
        let Ok(dsn) = std::env::var("ACCOUNTS_TEST_DSN") else {
            eprintln!("Skipping postgres test: ACCOUNTS_TEST_DSN not set");
            return Ok(());
        };

        let store = PgUserStore::connect(&dsn).await?;
        store.migrate().await?;
        store.ping().await?;

        let username = format!("pg-{}", ulid::Ulid::new());
        let repository = UserRepository::new(
            Arc::new(store.clone()),
            IdRange::new(1, i64::from(i32::MAX))?,
        );
        let digest = PasswordDigest::from_stored("$argon2id$stub".to_string());
        let first = repository
            .create_user(&username, digest.clone(), "a@x.com")
            .await?;
        repository
            .create_user(&username, digest.clone(), "b@x.com")
            .await?;

        let clash = User {
            id: first,
            username: username.clone(),
            password: digest,
            email: "c@x.com".to_string(),
        };
        assert!(matches!(
            store.insert(&clash).await,
            Err(RepoError::Conflict(id)) if id == first
        ));

        let found = store.find_one(&username).await?.unwrap();
        assert_eq!(found.id, first);
        assert_eq!(found.email, "a@x.com");

        Ok(())
    }
}
