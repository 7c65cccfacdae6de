use crate::{
    cli::actions::{
        Action,
        change_password::{self, Passwords},
        profile, routes,
    },
    config::ConfigOverrides,
};
use anyhow::{Result, anyhow};
use clap::ArgMatches;
use secrecy::SecretString;
use std::{path::PathBuf, time::Duration};

fn overrides(matches: &ArgMatches) -> ConfigOverrides {
    ConfigOverrides {
        environment: matches.get_one::<String>("environment").cloned(),
        domain_names: matches.get_one::<PathBuf>("domain-names").cloned(),
        api_base_url: matches.get_one::<String>("api-base-url").cloned(),
        timeout: matches
            .get_one::<u64>("timeout")
            .copied()
            .map(Duration::from_secs),
    }
}

// Missing values become empty secrets so the form reports them as validation errors.
fn secret(matches: &ArgMatches, id: &str) -> SecretString {
    SecretString::from(matches.get_one::<String>(id).cloned().unwrap_or_default())
}

/// # Errors
/// Returns an error if no known subcommand was given.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some(("profile", sub)) => Ok(Action::Profile(profile::Args {
            overrides: overrides(sub),
        })),
        Some(("change-password", sub)) => Ok(Action::ChangePassword(change_password::Args {
            overrides: overrides(sub),
            passwords: Passwords {
                old: secret(sub, "old-password"),
                new: secret(sub, "new-password"),
                confirm: secret(sub, "confirm-new-password"),
            },
        })),
        Some(("routes", sub)) => Ok(Action::Routes(routes::Args {
            width: sub.get_one::<u32>("width").copied(),
        })),
        Some((name, _)) => Err(anyhow!("unknown subcommand: {name}")),
        None => Err(anyhow!("missing subcommand")),
    }
}
