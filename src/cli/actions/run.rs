use crate::cli::actions::{Action, change_password, profile, routes};
use anyhow::Result;

/// Execute the provided action.
// Single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Profile(args) => profile::execute(args).await,
        Action::ChangePassword(args) => change_password::execute(args).await,
        Action::Routes(args) => routes::execute(&args),
    }
}
