//! Password-change workflow for the administrator.
//!
//! ```text
//! Idle ──open──▶ Editing ──submit──▶ Submitting ──200──▶ Succeeded ──1500 ms──▶ Idle
//!   ▲              ▲                     │
//!   └───cancel─────┤                     └──401/404/other──▶ Failed ──▶ Editing
//! ```
//!
//! `Failed` is transient: observers see it, but the workflow settles back in
//! `Editing` with the field values kept so the user can correct and retry.
//!
//! Every cancel or reopen starts a new generation. A response that resolves for an
//! older generation is dropped without touching state or notices, and the
//! auto-dismiss timer checks the generation before closing the form.

mod form;
mod outcome;
mod workflow;


pub use form::{CredentialForm, FieldError, PasswordField, ValidationErrors};
pub use outcome::{GENERIC_FAILURE_MESSAGE, ResponseClass};
pub use workflow::{AUTO_DISMISS_DELAY, CredentialWorkflow};

use std::fmt;
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WorkflowState {
    #[default]
    Idle,
    Editing,
    Submitting,
    Succeeded,
    Failed,
}

impl WorkflowState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Editing => "editing",
            Self::Submitting => "submitting",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    /// Whether the form is on screen.
    #[must_use]
    pub const fn is_open(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub from: WorkflowState,
    pub to: WorkflowState,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Transient message shown to the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

/// Result of a submission that reached the backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Succeeded { message: String },
    Rejected { status: u16, message: String },
    Failed { message: String },
    /// The response arrived after the form was cancelled or reopened.
    Discarded,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: WorkflowState,
    },
    #[error("a password change request is already in flight")]
    RequestInFlight,
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}
