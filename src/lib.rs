//! # Placement Console
//!
//! `placement-console` is the administrator client for the placement-tracking portal.
//! Page rendering lives elsewhere; this crate owns the parts of the client that carry
//! state and talk to the backend.
//!
//! ## Session & Navigation
//!
//! The [`console::session::SessionContext`] holds the identity of whoever is using the
//! console (anonymous, a Google user with or without a student registration, or the
//! portal administrator). Every change goes through a reducer with a fixed transition
//! graph and is pushed synchronously to subscribers. The
//! [`console::navigation::NavigationController`] is one of those subscribers: it maps
//! each identity kind to its landing route and never polls.
//!
//! ## Credential Update
//!
//! The administrator changes their password through the
//! [`console::credentials::CredentialWorkflow`]. Validation runs on every keystroke,
//! only one `PATCH /api/admin/{username}` request may be in flight, and responses
//! that arrive after the form was dismissed are discarded by generation.
//!
//! ## Execution Model
//!
//! Console components are single-threaded (`Rc`/`RefCell`) and must be driven inside
//! a `tokio::task::LocalSet`. Passwords are held as `secrecy::SecretString` and must
//! never be logged.

pub mod api;
pub mod cli;
pub mod config;
pub mod console;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
