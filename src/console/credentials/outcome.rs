use crate::api::ApiError;

/// Shown for every failure that is not an explicit rejection.
pub const GENERIC_FAILURE_MESSAGE: &str = "Please try again";

/// How a password-change response is presented.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponseClass {
    /// 200, the server message is shown as a success notice.
    Accepted { message: String },
    /// 401 wrong old password or 404 unknown admin, the server message is shown.
    Rejected { status: u16, message: String },
    /// Anything else, including transport failures. `detail` is logged, not shown.
    Failed { detail: String },
}

impl ResponseClass {
    #[must_use]
    pub fn classify(result: Result<String, ApiError>) -> Self {
        match result {
            Ok(message) => Self::Accepted { message },
            Err(ApiError::Http {
                status: status @ (401 | 404),
                message,
            }) => Self::Rejected { status, message },
            Err(err) => Self::Failed {
                detail: err.to_string(),
            },
        }
    }

    /// Text for the notice.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Accepted { message } | Self::Rejected { message, .. } => message,
            Self::Failed { .. } => GENERIC_FAILURE_MESSAGE,
        }
    }
}
