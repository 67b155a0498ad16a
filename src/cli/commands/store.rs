use crate::repository::IdRange;
use anyhow::{bail, Context};
use clap::{Arg, ArgAction, ArgMatches, Command};

pub const ARG_DSN: &str = "dsn";
pub const ARG_IN_MEMORY: &str = "in-memory";
pub const ARG_ID_MIN: &str = "id-min";
pub const ARG_ID_MAX: &str = "id-max";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_DSN)
                .short('d')
                .long("dsn")
                .help("Database connection string")
                .long_help(
                    "PostgreSQL connection string. The users table is created on startup.",
                )
                .env("ACCOUNTS_DSN")
                .required_unless_present(ARG_IN_MEMORY),
        )
        .arg(
            Arg::new(ARG_IN_MEMORY)
                .long("in-memory")
                .help("Keep users in process memory instead of PostgreSQL")
                .env("ACCOUNTS_IN_MEMORY")
                .action(ArgAction::SetTrue)
                .conflicts_with(ARG_DSN),
        )
        .arg(
            Arg::new(ARG_ID_MIN)
                .long("id-min")
                .help("Smallest user id handed out")
                .env("ACCOUNTS_ID_MIN")
                .default_value("1")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_ID_MAX)
                .long("id-max")
                .help("Largest user id handed out")
                .env("ACCOUNTS_ID_MAX")
                .default_value("1000")
                .value_parser(clap::value_parser!(i64)),
        )
}

/// Where users are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Postgres { dsn: String },
    Memory,
}

#[derive(Debug)]
pub struct Options {
    pub backend: Backend,
    pub id_range: IdRange,
}

impl Options {
    /// Parse store arguments from matches.
    ///
    /// # Errors
    /// Returns an error if neither backend is selected or the id range is invalid.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let dsn = matches
            .get_one::<String>(ARG_DSN)
            .cloned()
            .filter(|v| !v.trim().is_empty());

        let backend = match dsn {
            Some(dsn) => Backend::Postgres { dsn },
            None if matches.get_flag(ARG_IN_MEMORY) => Backend::Memory,
            None => bail!("missing required argument: --{ARG_DSN} (or --{ARG_IN_MEMORY})"),
        };

        let min = matches.get_one::<i64>(ARG_ID_MIN).copied().unwrap_or(1);
        let max = matches.get_one::<i64>(ARG_ID_MAX).copied().unwrap_or(1000);
        let id_range = IdRange::new(min, max)
            .with_context(|| format!("invalid --{ARG_ID_MIN}/--{ARG_ID_MAX}"))?;

        Ok(Self { backend, id_range })
    }
}
