//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to the action the binary should run: serving
//! the API, or minting an access token for operators and tests.

use crate::cli::actions::{server, token, Action};
use crate::cli::commands::{self, store};
use crate::cli::globals::GlobalArgs;
use anyhow::{bail, Result};
use clap::ArgMatches;
use secrecy::SecretString;

fn globals(matches: &ArgMatches) -> Result<GlobalArgs> {
    let secret = matches
        .get_one::<String>(commands::ARG_SECRET)
        .cloned()
        .filter(|v| !v.trim().is_empty());

    let Some(secret) = secret else {
        bail!("missing required argument: --{}", commands::ARG_SECRET);
    };

    Ok(GlobalArgs::new(SecretString::from(secret)))
}

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    if let Some(sub_m) = matches.subcommand_matches(commands::token::NAME) {
        let options = commands::token::Options::parse(sub_m);
        return Ok(Action::Token(token::Args {
            globals: globals(sub_m)?,
            subject: options.subject,
            ttl: options.ttl,
        }));
    }

    let globals = globals(matches)?;
    let port = matches
        .get_one::<u16>(commands::ARG_PORT)
        .copied()
        .unwrap_or(5002);
    let store_opts = store::Options::parse(matches)?;

    Ok(Action::Server(server::Args {
        globals,
        port,
        backend: store_opts.backend,
        id_range: store_opts.id_range,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn dispatch(args: &[&str]) -> Result<Action> {
        temp_env::with_vars(
            [
                ("ACCOUNTS_DSN", None::<&str>),
                ("ACCOUNTS_IN_MEMORY", None),
                ("ACCOUNTS_SECRET", None),
                ("ACCOUNTS_ID_MIN", None),
                ("ACCOUNTS_ID_MAX", None),
                ("ACCOUNTS_PORT", None),
                ("ACCOUNTS_TOKEN_SUBJECT", None),
                ("ACCOUNTS_TOKEN_TTL", None),
            ],
            || {
                let matches = commands::new().try_get_matches_from(args)?;
                handler(&matches)
            },
        )
    }

    #[test]
    fn server_action_with_postgres() {
        let action = dispatch(&[
            "accounts",
            "--dsn",
            "postgres://user:pw@localhost/accounts",
            "--secret",
            "s3cr3t",
            "--port",
            "9000",
        ])
        .unwrap();

        let Action::Server(args) = action else {
            panic!("expected server action");
        };
        assert_eq!(args.port, 9000);
        assert_eq!(
            args.backend,
            store::Backend::Postgres {
                dsn: "postgres://user:pw@localhost/accounts".to_string()
            }
        );
        assert_eq!(args.id_range.min(), 1);
        assert_eq!(args.id_range.max(), 1000);
        assert_eq!(args.globals.secret.expose_secret(), "s3cr3t");
    }

    #[test]
    fn server_action_in_memory() {
        let action = dispatch(&[
            "accounts",
            "--in-memory",
            "--secret",
            "s3cr3t",
            "--id-min",
            "5",
            "--id-max",
            "7",
        ])
        .unwrap();

        let Action::Server(args) = action else {
            panic!("expected server action");
        };
        assert_eq!(args.backend, store::Backend::Memory);
        assert_eq!(args.id_range.min(), 5);
        assert_eq!(args.id_range.max(), 7);
    }

    #[test]
    fn secret_is_required() {
        let err = dispatch(&["accounts", "--in-memory"]).unwrap_err();
        assert!(err.to_string().contains("--secret"));

        assert!(dispatch(&["accounts", "--in-memory", "--secret", "  "]).is_err());
    }

    #[test]
    fn inverted_id_range_is_rejected() {
        let result = dispatch(&[
            "accounts",
            "--in-memory",
            "--secret",
            "s3cr3t",
            "--id-min",
            "10",
            "--id-max",
            "3",
        ]);
        assert!(result.is_err());

        let result = dispatch(&[
            "accounts",
            "--in-memory",
            "--secret",
            "s3cr3t",
            "--id-min",
            "0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn token_action() {
        let action = dispatch(&[
            "accounts",
            "token",
            "--secret",
            "s3cr3t",
            "--subject",
            "gateway",
        ])
        .unwrap();

        let Action::Token(args) = action else {
            panic!("expected token action");
        };
        assert_eq!(args.subject.as_deref(), Some("gateway"));
        assert_eq!(args.ttl, None);
        assert_eq!(args.globals.secret.expose_secret(), "s3cr3t");
    }

    #[test]
    fn secret_before_subcommand_is_propagated() {
        let action = dispatch(&["accounts", "--secret", "s3cr3t", "token", "--ttl", "30"]).unwrap();

        let Action::Token(args) = action else {
            panic!("expected token action");
        };
        assert_eq!(args.ttl, Some(30));
        assert_eq!(args.globals.secret.expose_secret(), "s3cr3t");
    }
}
