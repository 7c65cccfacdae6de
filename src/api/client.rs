//! `reqwest` implementation of the admin data source. Every request carries the
//! console user agent and the configured timeout. Error bodies are trimmed and
//! truncated before they reach the UI, and request bodies are never logged.

use super::{
    AdminDataSource,
    errors::{ApiError, map_request_error},
    types::{AdminProfile, PasswordChangeRequest},
};
use crate::{APP_USER_AGENT, config::ConsoleConfig};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{Instrument, debug, info_span};
use url::Url;

/// Maximum number of error body characters surfaced to the UI.
const MAX_ERROR_CHARS: usize = 200;

/// HTTP client for the portal's admin endpoints.
#[derive(Clone, Debug)]
pub struct AdminClient {
    http: Client,
    base_url: Url,
}

impl AdminClient {
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ConsoleConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| ApiError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Config("Base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);

        debug!("endpoint URL: {}", url);

        Ok(url)
    }
}

impl AdminDataSource for AdminClient {
    async fn fetch_profile(&self) -> Result<AdminProfile, ApiError> {
        let url = self.endpoint(&["api", "admin"])?;

        let span = info_span!("admin.fetch_profile", http.method = "GET", url = %url);
        let response = self
            .http
            .get(url)
            .send()
            .instrument(span)
            .await
            .map_err(|err| map_request_error(&err))?;

        let status = response.status();
        if status.is_success() {
            response
                .json::<AdminProfile>()
                .await
                .map_err(|err| ApiError::Parse(format!("Failed to decode response: {err}")))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::Http {
                status: status.as_u16(),
                message: decode_message(&body),
            })
        }
    }

    async fn change_password(&self, request: &PasswordChangeRequest) -> Result<String, ApiError> {
        let url = self.endpoint(&["api", "admin", request.username()])?;

        let span = info_span!("admin.change_password", http.method = "PATCH", url = %url);
        let response = self
            .http
            .patch(url)
            .json(request)
            .send()
            .instrument(span)
            .await
            .map_err(|err| map_request_error(&err))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| map_request_error(&err))?;
        let message = decode_message(&body);

        if status == StatusCode::OK {
            Ok(message)
        } else {
            Err(ApiError::Http {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// Extracts the user-facing message from a response body.
///
/// The portal answers with a bare JSON string; an object with a `message` field is
/// accepted too. Both are returned verbatim. Anything else falls back to the raw
/// text, trimmed and truncated.
fn decode_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::String(message)) => message,
        Ok(Value::Object(mut map)) => match map.remove("message") {
            Some(Value::String(message)) => message,
            _ => sanitize_body(body),
        },
        _ => sanitize_body(body),
    }
}

/// Trims and truncates a message for display.
fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_base_url;
    use anyhow::{Result, anyhow};
    use secrecy::SecretString;
    use serde_json::json;
    use std::{net::TcpListener, time::Duration};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn client_for(uri: &str) -> Result<AdminClient> {
        let config = ConsoleConfig {
            environment: "test".to_string(),
            api_base_url: parse_base_url(uri)?,
            request_timeout: Duration::from_secs(5),
        };
        Ok(AdminClient::new(&config)?)
    }

    fn request(username: &str, old: &str) -> PasswordChangeRequest {
        PasswordChangeRequest::new(
            username.to_string(),
            SecretString::from(old.to_string()),
            SecretString::from("Abc123!".to_string()),
            SecretString::from("Abc123!".to_string()),
        )
    }

    #[test]
    fn decode_message_variants() {
        assert_eq!(decode_message("\"Password updated\""), "Password updated");
        assert_eq!(
            decode_message(r#"{"message": "Admin not found"}"#),
            "Admin not found"
        );
        assert_eq!(decode_message("Internal Server Error"), "Internal Server Error");
        assert_eq!(decode_message("   "), "Request failed.");
        assert_eq!(decode_message(&"x".repeat(500)).len(), MAX_ERROR_CHARS);
        assert_eq!(decode_message(r#"{"error": "boom"}"#), r#"{"error": "boom"}"#);
    }

    #[test]
    fn server_messages_are_kept_verbatim() {
        assert_eq!(
            decode_message("\"  Incorrect old password \""),
            "  Incorrect old password "
        );
        assert_eq!(
            decode_message(r#"{"message": " Admin not found\n"}"#),
            " Admin not found\n"
        );
        assert_eq!(decode_message("\"\""), "");

        let long = "y".repeat(250);
        assert_eq!(decode_message(&json!(long).to_string()), long);
    }

    #[test]
    fn endpoint_keeps_base_path_and_encodes_username() -> Result<()> {
        let client = client_for("https://placements.example.edu/backend/")?;
        let url = client.endpoint(&["api", "admin", "site admin"])?;
        assert_eq!(
            url.as_str(),
            "https://placements.example.edu/backend/api/admin/site%20admin"
        );
        Ok(())
    }

    #[tokio::test]
    async fn fetch_profile_returns_username() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/admin"))
            .and(header("user-agent", APP_USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_id": "65f0c1",
                "username": "admin"
            })))
            .mount(&server)
            .await;

        let profile = client_for(&server.uri())?.fetch_profile().await?;
        assert_eq!(profile.username, "admin");
        Ok(())
    }

    #[tokio::test]
    async fn fetch_profile_errors_on_failure_status() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/admin"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server.uri())?
            .fetch_profile()
            .await
            .err()
            .ok_or_else(|| anyhow!("expected error"))?;
        assert_eq!(err.status(), Some(500));
        Ok(())
    }

    #[tokio::test]
    async fn change_password_sends_form_body() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/api/admin/admin"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "username": "admin",
                "oldpassword": "old-secret",
                "newpassword": "Abc123!",
                "confirmnewpassword": "Abc123!"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!("Password updated")))
            .expect(1)
            .mount(&server)
            .await;

        let message = client_for(&server.uri())?
            .change_password(&request("admin", "old-secret"))
            .await?;
        assert_eq!(message, "Password updated");
        Ok(())
    }

    #[tokio::test]
    async fn change_password_surfaces_rejection_message() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/api/admin/admin"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!("Incorrect old password")),
            )
            .mount(&server)
            .await;

        let err = client_for(&server.uri())?
            .change_password(&request("admin", "wrong"))
            .await
            .err()
            .ok_or_else(|| anyhow!("expected error"))?;
        assert_eq!(
            err,
            ApiError::Http {
                status: 401,
                message: "Incorrect old password".to_string()
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn change_password_maps_unreachable_server_to_network_error() -> Result<()> {
        let port = match TcpListener::bind("127.0.0.1:0") {
            Ok(listener) => listener.local_addr()?.port(),
            Err(_) => {
                eprintln!("Skipping test: cannot bind localhost");
                return Ok(());
            }
        };

        let err = client_for(&format!("http://127.0.0.1:{port}"))?
            .change_password(&request("admin", "old-secret"))
            .await
            .err()
            .ok_or_else(|| anyhow!("expected error"))?;
        assert!(err.is_transport(), "unexpected error: {err}");
        Ok(())
    }
}
