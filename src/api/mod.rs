//! Backend access for the admin console.
//!
//! The console only needs two endpoints: `GET /api/admin` to prefill the credential
//! form, and `PATCH /api/admin/{username}` to change the password. They sit behind
//! [`AdminDataSource`] so the workflow can be driven by the real [`AdminClient`] or by
//! a scripted source in tests.

pub mod client;
pub mod errors;
pub mod types;

pub use client::AdminClient;
pub use errors::ApiError;
pub use types::{AdminProfile, PasswordChangeRequest};

/// Remote admin data.
pub trait AdminDataSource {
    /// Fetches the admin profile.
    fn fetch_profile(&self) -> impl Future<Output = Result<AdminProfile, ApiError>>;

    /// Submits a password change. Resolves to the server message on `200`; any other
    /// status is returned as [`ApiError::Http`] carrying the decoded body.
    fn change_password(
        &self,
        request: &PasswordChangeRequest,
    ) -> impl Future<Output = Result<String, ApiError>>;
}
