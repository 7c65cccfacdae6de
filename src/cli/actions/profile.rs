use crate::{
    api::{AdminClient, AdminDataSource},
    config::{ConfigOverrides, ConsoleConfig},
};
use anyhow::{Context, Result};
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub overrides: ConfigOverrides,
}

/// Prints the username of the administrator profile.
/// # Errors
/// Returns an error if the configuration is invalid or the profile cannot be fetched.
pub async fn execute(args: Args) -> Result<()> {
    let config = ConsoleConfig::resolve(args.overrides)?;
    info!(
        environment = %config.environment,
        base_url = %config.api_base_url,
        "resolved backend"
    );

    let client = AdminClient::new(&config)?;
    let profile = client
        .fetch_profile()
        .await
        .context("failed to fetch the admin profile")?;

    println!("{}", profile.username);

    Ok(())
}
