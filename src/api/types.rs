//! Wire types for the admin endpoints. Password fields are secrets: they are
//! zeroized on drop, redacted in `Debug`, and only exposed while serializing the
//! request body.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer, ser::SerializeStruct};
use std::fmt;

/// Admin account data returned by `GET /api/admin`.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct AdminProfile {
    pub username: String,
}

/// Body of `PATCH /api/admin/{username}`.
///
/// Created per submission attempt and dropped as soon as the response settles.
pub struct PasswordChangeRequest {
    username: String,
    old_password: SecretString,
    new_password: SecretString,
    confirm_new_password: SecretString,
}

impl PasswordChangeRequest {
    #[must_use]
    pub fn new(
        username: String,
        old_password: SecretString,
        new_password: SecretString,
        confirm_new_password: SecretString,
    ) -> Self {
        Self {
            username,
            old_password,
            new_password,
            confirm_new_password,
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}

// Field names match the portal form, which posts its values as-is.
impl Serialize for PasswordChangeRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("PasswordChangeRequest", 4)?;
        state.serialize_field("username", &self.username)?;
        state.serialize_field("oldpassword", self.old_password.expose_secret())?;
        state.serialize_field("newpassword", self.new_password.expose_secret())?;
        state.serialize_field(
            "confirmnewpassword",
            self.confirm_new_password.expose_secret(),
        )?;
        state.end()
    }
}

impl fmt::Debug for PasswordChangeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordChangeRequest")
            .field("username", &self.username)
            .field("oldpassword", &"***")
            .field("newpassword", &"***")
            .field("confirmnewpassword", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> PasswordChangeRequest {
        PasswordChangeRequest::new(
            "admin".to_string(),
            SecretString::from("old-secret".to_string()),
            SecretString::from("Abc123!".to_string()),
            SecretString::from("Abc123!".to_string()),
        )
    }

    #[test]
    fn serializes_form_field_names() -> serde_json::Result<()> {
        let body = serde_json::to_value(request())?;
        assert_eq!(
            body,
            json!({
                "username": "admin",
                "oldpassword": "old-secret",
                "newpassword": "Abc123!",
                "confirmnewpassword": "Abc123!"
            })
        );
        Ok(())
    }

    #[test]
    fn debug_redacts_passwords() {
        let debug = format!("{:?}", request());
        assert!(debug.contains("admin"));
        assert!(!debug.contains("old-secret"));
        assert!(!debug.contains("Abc123!"));
    }

    #[test]
    fn profile_ignores_unknown_fields() -> serde_json::Result<()> {
        let profile: AdminProfile =
            serde_json::from_value(json!({"_id": "65f0", "username": "admin", "__v": 0}))?;
        assert_eq!(profile.username, "admin");
        Ok(())
    }
}
