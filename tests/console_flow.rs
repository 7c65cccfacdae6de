use anyhow::{Result, bail};
use placement_console::{
    api::AdminClient,
    cli::actions::change_password::{Passwords, change_password},
    config::{ConfigOverrides, ConsoleConfig},
    console::{
        AdminConsole, History, MenuTarget, Route, SessionContext, SessionEvent, SubmitOutcome,
        Viewport, WorkflowState,
        credentials::{AUTO_DISMISS_DELAY, PasswordField},
    },
};
use secrecy::SecretString;
use serde_json::json;
use std::{net::TcpListener, time::Duration};
use tokio::task::LocalSet;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn client(server: &MockServer) -> Result<AdminClient> {
    let config = ConsoleConfig::resolve(ConfigOverrides {
        environment: Some("test".to_string()),
        api_base_url: Some(server.uri()),
        timeout: Some(Duration::from_secs(5)),
        ..ConfigOverrides::default()
    })?;
    Ok(AdminClient::new(&config)?)
}

async fn mock_profile(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/admin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"username": "admin"})))
        .mount(server)
        .await;
}

async fn mock_change(server: &MockServer, status: u16, body: serde_json::Value) {
    Mock::given(method("PATCH"))
        .and(path("/api/admin/admin"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

async fn signed_in_console(server: &MockServer) -> Result<AdminConsole<History, AdminClient>> {
    let session = SessionContext::new();
    let viewport = Viewport::new(1280);
    let console = AdminConsole::mount(session, History::new(), &viewport, client(server)?).await;
    console.session().dispatch(SessionEvent::AdminLoggedIn {
        username: "admin".to_string(),
    })?;
    Ok(console)
}

fn fill(console: &AdminConsole<History, AdminClient>, old: &str, new: &str) -> Result<()> {
    let credentials = console.credentials();
    credentials.input(PasswordField::OldPassword, old)?;
    credentials.input(PasswordField::NewPassword, new)?;
    credentials.input(PasswordField::ConfirmNewPassword, new)?;
    Ok(())
}

#[tokio::test]
async fn admin_changes_password_through_the_console() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    mock_profile(&server).await;
    mock_change(&server, 200, json!("Password updated")).await;

    LocalSet::new()
        .run_until(async {
            let console = signed_in_console(&server).await?;
            assert_eq!(console.current_route(), Some(Route::AdminHome));
            assert_eq!(console.credentials().username(), "admin");

            console.select(MenuTarget::ChangePassword)?;
            fill(&console, "OldPass1!", "NewPass1!")?;

            let outcome = console.credentials().submit().await?;
            assert_eq!(
                outcome,
                SubmitOutcome::Succeeded {
                    message: "Password updated".to_string()
                }
            );
            assert_eq!(console.credentials().state(), WorkflowState::Succeeded);

            tokio::time::sleep(AUTO_DISMISS_DELAY + Duration::from_millis(200)).await;
            assert_eq!(console.credentials().state(), WorkflowState::Idle);
            anyhow::Ok(())
        })
        .await
}

#[tokio::test]
async fn rejection_and_server_failure_return_to_editing() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    mock_profile(&server).await;
    Mock::given(method("PATCH"))
        .and(path("/api/admin/admin"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!("Incorrect old password")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mock_change(&server, 500, json!({"error": "boom"})).await;

    LocalSet::new()
        .run_until(async {
            let console = signed_in_console(&server).await?;
            console.select(MenuTarget::ChangePassword)?;
            fill(&console, "wrong", "NewPass1!")?;

            let rejected = console.credentials().submit().await?;
            assert_eq!(
                rejected,
                SubmitOutcome::Rejected {
                    status: 401,
                    message: "Incorrect old password".to_string()
                }
            );
            assert_eq!(console.credentials().state(), WorkflowState::Editing);
            assert!(console.credentials().can_submit());

            let failed = console.credentials().submit().await?;
            assert_eq!(
                failed,
                SubmitOutcome::Failed {
                    message: "Please try again".to_string()
                }
            );
            assert_eq!(console.credentials().state(), WorkflowState::Editing);

            console.select(MenuTarget::Logout)?;
            assert_eq!(console.credentials().state(), WorkflowState::Idle);
            assert_eq!(console.current_route(), Some(Route::SignIn));
            anyhow::Ok(())
        })
        .await
}

#[tokio::test]
async fn cli_flow_reports_server_message() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    mock_profile(&server).await;
    mock_change(&server, 200, json!("Password updated")).await;

    let passwords = Passwords {
        old: SecretString::from("OldPass1!".to_string()),
        new: SecretString::from("NewPass1!".to_string()),
        confirm: SecretString::from("NewPass1!".to_string()),
    };

    let message = LocalSet::new()
        .run_until(change_password(client(&server)?, &passwords))
        .await?;
    assert_eq!(message, "Password updated");
    Ok(())
}

#[tokio::test]
async fn cli_flow_stops_on_mismatch_without_calling_backend() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    mock_profile(&server).await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let passwords = Passwords {
        old: SecretString::from("OldPass1!".to_string()),
        new: SecretString::from("Abc123!".to_string()),
        confirm: SecretString::from("Abc124!".to_string()),
    };

    let result = LocalSet::new()
        .run_until(change_password(client(&server)?, &passwords))
        .await;
    let Err(err) = result else {
        bail!("mismatched passwords must fail");
    };
    assert_eq!(err.to_string(), "The two passwords do not match");
    Ok(())
}
