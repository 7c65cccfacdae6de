use crate::{
    api::{AdminClient, AdminDataSource},
    config::{ConfigOverrides, ConsoleConfig},
    console::credentials::{CredentialWorkflow, PasswordField, SubmitOutcome, WorkflowState},
};
use anyhow::{Context, Result, bail};
use secrecy::{ExposeSecret, SecretString};
use std::rc::Rc;
use tokio::sync::Notify;
use tracing::debug;

/// Password values collected from flags or the environment.
#[derive(Debug, Default)]
pub struct Passwords {
    pub old: SecretString,
    pub new: SecretString,
    pub confirm: SecretString,
}

#[derive(Debug)]
pub struct Args {
    pub overrides: ConfigOverrides,
    pub passwords: Passwords,
}

/// # Errors
/// Returns an error if the configuration is invalid, validation fails, or the backend
/// does not accept the change.
pub async fn execute(args: Args) -> Result<()> {
    let config = ConsoleConfig::resolve(args.overrides)?;
    let client = AdminClient::new(&config)?;

    let message = change_password(client, &args.passwords).await?;
    println!("{message}");

    Ok(())
}

/// Drives the credential workflow end to end and returns the success notice once the
/// form has closed itself.
///
/// Must run inside a `tokio::task::LocalSet`.
///
/// # Errors
/// Returns the validation errors, the server message for a rejection, or the generic
/// failure notice.
pub async fn change_password<S>(source: S, passwords: &Passwords) -> Result<String>
where
    S: AdminDataSource + 'static,
{
    let workflow = CredentialWorkflow::new(source);
    workflow
        .load_profile()
        .await
        .context("failed to load the admin profile")?;

    let closed = Rc::new(Notify::new());
    let _closed_link = {
        let closed = Rc::clone(&closed);
        workflow.subscribe(move |transition| {
            if transition.to == WorkflowState::Idle {
                closed.notify_one();
            }
        })
    };

    workflow.open()?;
    for (field, value) in [
        (PasswordField::OldPassword, &passwords.old),
        (PasswordField::NewPassword, &passwords.new),
        (PasswordField::ConfirmNewPassword, &passwords.confirm),
    ] {
        workflow.input(field, value.expose_secret())?;
    }

    match workflow.submit().await? {
        SubmitOutcome::Succeeded { message } => {
            debug!("waiting for the success notice to close");
            closed.notified().await;
            Ok(message)
        }
        SubmitOutcome::Rejected { message, .. } | SubmitOutcome::Failed { message } => {
            bail!(message)
        }
        SubmitOutcome::Discarded => bail!("the response arrived after the form was closed"),
    }
}
