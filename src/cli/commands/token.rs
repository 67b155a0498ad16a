use clap::{Arg, ArgMatches, Command};

pub const NAME: &str = "token";
pub const ARG_SUBJECT: &str = "subject";
pub const ARG_TTL: &str = "ttl";

/// `token` subcommand: mint an access token signed with the shared secret.
#[must_use]
pub fn subcommand() -> Command {
    Command::new(NAME)
        .about("Print an access token signed with the shared secret")
        .arg(
            Arg::new(ARG_SUBJECT)
                .long("subject")
                .help("Value of the `sub` claim")
                .env("ACCOUNTS_TOKEN_SUBJECT"),
        )
        .arg(
            Arg::new(ARG_TTL)
                .long("ttl")
                .help("Seconds until the token expires (no `exp` claim when omitted)")
                .env("ACCOUNTS_TOKEN_TTL")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}

#[derive(Debug, Default)]
pub struct Options {
    pub subject: Option<String>,
    pub ttl: Option<u64>,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        Self {
            subject: matches
                .get_one::<String>(ARG_SUBJECT)
                .cloned()
                .filter(|v| !v.trim().is_empty()),
            ttl: matches.get_one::<u64>(ARG_TTL).copied(),
        }
    }
}
