use crate::{auth::TokenAuthenticator, cli::globals::GlobalArgs};
use anyhow::{Context, Result};
use std::time::Duration;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub subject: Option<String>,
    pub ttl: Option<u64>,
}

fn issue(args: Args) -> Result<String> {
    let authenticator = TokenAuthenticator::new(args.globals.secret);
    authenticator
        .issue(args.subject.as_deref(), args.ttl.map(Duration::from_secs))
        .context("Failed to sign access token")
}

/// Print a signed access token to stdout.
/// # Errors
/// Returns an error if signing fails.
pub fn execute(args: Args) -> Result<()> {
    let token = issue(args)?;
    println!("{token}");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn args(secret: &str, ttl: Option<u64>) -> Args {
        Args {
            globals: GlobalArgs::new(SecretString::from(secret.to_string())),
            subject: Some("gateway".to_string()),
            ttl,
        }
    }

    #[test]
    fn issued_token_is_accepted_with_same_secret() {
        let token = issue(args("s3cr3t", Some(60))).unwrap();

        let authenticator = TokenAuthenticator::new(SecretString::from("s3cr3t".to_string()));
        assert!(authenticator.authenticate(&token).is_ok());

        let other = TokenAuthenticator::new(SecretString::from("other".to_string()));
        assert!(other.authenticate(&token).is_err());
    }

    #[test]
    fn token_without_ttl_is_accepted() {
        let token = issue(args("s3cr3t", None)).unwrap();

        let authenticator = TokenAuthenticator::new(SecretString::from("s3cr3t".to_string()));
        assert!(authenticator.authenticate(&token).is_ok());
    }
}
