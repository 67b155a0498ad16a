use crate::{
    accounts,
    auth::TokenAuthenticator,
    cli::{commands::store::Backend, globals::GlobalArgs},
    credentials::CredentialVerifier,
    repository::{IdRange, MemoryUserStore, PgUserStore, UserRepository, UserStore},
};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub port: u16,
    pub backend: Backend,
    pub id_range: IdRange,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the user store cannot be reached or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let store: Arc<dyn UserStore> = match &args.backend {
        Backend::Postgres { dsn } => {
            let store = PgUserStore::connect(dsn)
                .await
                .context("Failed to connect to the user store")?;
            store
                .migrate()
                .await
                .context("Failed to apply the users schema")?;
            Arc::new(store)
        }
        Backend::Memory => {
            warn!("Using the in-memory user store, users are lost on restart");
            Arc::new(MemoryUserStore::default())
        }
    };

    let authenticator = Arc::new(TokenAuthenticator::new(args.globals.secret));
    let verifier = Arc::new(CredentialVerifier::default());
    let repository = Arc::new(UserRepository::new(store, args.id_range));

    let app = accounts::router(authenticator, verifier, repository);

    accounts::new(args.port, app).await
}

fn log_startup_args(args: &Args) {
    let store = match &args.backend {
        Backend::Postgres { dsn } => redact_dsn(dsn),
        Backend::Memory => "in-memory".to_string(),
    };
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("store", store),
        ("user_ids", args.id_range.to_string()),
        ("commit", accounts::GIT_COMMIT_HASH.to_string()),
    ];

    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!("accounts {}\n\nStartup configuration:", env!("CARGO_PKG_VERSION"));
    for (key, value) in &entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("REDACTED"));
            }
            parsed.to_string()
        }
        Err(_) => "invalid-dsn".to_string(),
    }
}
