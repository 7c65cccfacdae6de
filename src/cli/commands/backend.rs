use crate::config::DEFAULT_ENVIRONMENT;
use clap::{Arg, Command};
use std::path::PathBuf;

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("environment")
                .short('e')
                .long("environment")
                .help("Environment key used to look up the backend address")
                .default_value(DEFAULT_ENVIRONMENT)
                .env("PLACEMENT_CONSOLE_ENVIRONMENT")
                .global(true),
        )
        .arg(
            Arg::new("domain-names")
                .long("domain-names")
                .help("JSON file mapping environment names to backend base URLs")
                .env("PLACEMENT_CONSOLE_DOMAIN_NAMES")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("api-base-url")
                .long("api-base-url")
                .help("Backend base URL, overrides the domain names mapping")
                .env("PLACEMENT_CONSOLE_API_BASE_URL")
                .global(true),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .help("Request timeout in seconds")
                .default_value("10")
                .env("PLACEMENT_CONSOLE_TIMEOUT")
                .value_parser(clap::value_parser!(u64).range(1..))
                .global(true),
        )
}
