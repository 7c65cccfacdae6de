//! Password-change form with reactive validation.

use crate::api::PasswordChangeRequest;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PasswordField {
    OldPassword,
    NewPassword,
    ConfirmNewPassword,
}

impl PasswordField {
    pub const ALL: [Self; 3] = [
        Self::OldPassword,
        Self::NewPassword,
        Self::ConfirmNewPassword,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::OldPassword => "Old Password",
            Self::NewPassword => "New Password",
            Self::ConfirmNewPassword => "Confirm New Password",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldError {
    Required(PasswordField),
    Mismatch,
    MissingUsername,
}

impl FieldError {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Required(PasswordField::OldPassword) => "Please enter your old password",
            Self::Required(PasswordField::NewPassword) => "Please enter your new password",
            Self::Required(PasswordField::ConfirmNewPassword) => {
                "Please confirm your new password"
            }
            Self::Mismatch => "The two passwords do not match",
            Self::MissingUsername => "Admin profile is not loaded",
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Every problem that blocks a submission.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{}", join_messages(.errors))]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    #[must_use]
    pub fn contains(&self, error: FieldError) -> bool {
        self.errors.contains(&error)
    }
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|error| error.message())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Default)]
struct Entry {
    value: SecretString,
    touched: bool,
}

impl Entry {
    fn is_empty(&self) -> bool {
        self.value.expose_secret().is_empty()
    }
}

/// Form values. The username is read-only and comes from the admin profile.
#[derive(Default)]
pub struct CredentialForm {
    username: String,
    old_password: Entry,
    new_password: Entry,
    confirm_new_password: Entry,
}

impl CredentialForm {
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn set_username(&mut self, username: String) {
        self.username = username;
    }

    pub fn set(&mut self, field: PasswordField, value: SecretString) {
        let entry = self.entry_mut(field);
        entry.value = value;
        entry.touched = true;
    }

    #[must_use]
    pub fn is_empty(&self, field: PasswordField) -> bool {
        self.entry(field).is_empty()
    }

    /// Marks every field as touched so required errors become visible.
    pub fn touch_all(&mut self) {
        for field in PasswordField::ALL {
            self.entry_mut(field).touched = true;
        }
    }

    /// Clears every password field and sets the username.
    pub fn reset(&mut self, username: String) {
        *self = Self::new(username);
    }

    /// Error currently shown next to `field`.
    ///
    /// The mismatch check runs whenever the confirmation holds a value, whichever of
    /// the two password fields changed last; required errors only show once touched.
    #[must_use]
    pub fn field_error(&self, field: PasswordField) -> Option<FieldError> {
        let entry = self.entry(field);
        if entry.is_empty() {
            return entry.touched.then_some(FieldError::Required(field));
        }
        if field == PasswordField::ConfirmNewPassword && !self.passwords_match() {
            return Some(FieldError::Mismatch);
        }
        None
    }

    #[must_use]
    pub fn visible_errors(&self) -> Vec<FieldError> {
        PasswordField::ALL
            .into_iter()
            .filter_map(|field| self.field_error(field))
            .collect()
    }

    /// Full validation, independent of which fields were touched.
    ///
    /// # Errors
    /// Returns every error that blocks a submission.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();

        if self.username.trim().is_empty() {
            errors.push(FieldError::MissingUsername);
        }
        for field in PasswordField::ALL {
            if self.entry(field).is_empty() {
                errors.push(FieldError::Required(field));
            }
        }
        if !self.confirm_new_password.is_empty() && !self.passwords_match() {
            errors.push(FieldError::Mismatch);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors { errors })
        }
    }

    /// Builds the request body from the current values.
    pub(crate) fn to_request(&self) -> PasswordChangeRequest {
        let copy = |entry: &Entry| SecretString::from(entry.value.expose_secret().to_owned());
        PasswordChangeRequest::new(
            self.username.clone(),
            copy(&self.old_password),
            copy(&self.new_password),
            copy(&self.confirm_new_password),
        )
    }

    fn passwords_match(&self) -> bool {
        self.new_password.value.expose_secret() == self.confirm_new_password.value.expose_secret()
    }

    const fn entry(&self, field: PasswordField) -> &Entry {
        match field {
            PasswordField::OldPassword => &self.old_password,
            PasswordField::NewPassword => &self.new_password,
            PasswordField::ConfirmNewPassword => &self.confirm_new_password,
        }
    }

    fn entry_mut(&mut self, field: PasswordField) -> &mut Entry {
        match field {
            PasswordField::OldPassword => &mut self.old_password,
            PasswordField::NewPassword => &mut self.new_password,
            PasswordField::ConfirmNewPassword => &mut self.confirm_new_password,
        }
    }
}

impl fmt::Debug for CredentialForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialForm")
            .field("username", &self.username)
            .field("errors", &self.visible_errors())
            .finish_non_exhaustive()
    }
}
