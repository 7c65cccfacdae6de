pub mod change_password;
pub mod profile;
pub mod routes;

// Internal "interpreter" for `Action`.
mod run;

#[derive(Debug)]
pub enum Action {
    Profile(profile::Args),
    ChangePassword(change_password::Args),
    Routes(routes::Args),
}

impl Action {
    /// Execute the action. Console actions must run inside a `tokio::task::LocalSet`.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
