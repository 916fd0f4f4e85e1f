use std::fmt;

use fundboard_client::{ApiError, ErrorClass};
use serde::Serialize;

pub const TRANSFER_FAILED_MESSAGE: &str = "Failed to execute transfer";
pub const FUND_FAILED_MESSAGE: &str = "Failed to create fund";
pub const RESET_FAILED_MESSAGE: &str = "Failed to reset data";
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load data";

/// Top-level error shown above a form or list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBanner {
    pub kind: ErrorClass,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorBanner {
    /// Builds a banner from an API failure. Transport failures carry no server
    /// message, so `fallback` is shown instead.
    #[must_use]
    pub fn from_api(error: &ApiError, fallback: &str) -> Self {
        let message = if error.status == 0 || error.message.trim().is_empty() {
            fallback.to_string()
        } else {
            error.message.clone()
        };
        Self {
            kind: error.class(),
            message,
            request_id: error.request_id().map(str::to_string),
            hint: error.hint().map(str::to_string),
        }
    }

    #[must_use]
    pub fn title(&self) -> &'static str {
        match self.kind {
            ErrorClass::Rejected => "Request rejected",
            ErrorClass::Conflict => "Duplicate request",
            ErrorClass::Unexpected => "Something went wrong",
        }
    }
}

impl fmt::Display for ErrorBanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title(), self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, " ({hint})")?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, " [Request ID: {request_id}]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundboard_client::ErrorCode;

    #[test]
    fn server_message_and_request_id_are_kept() {
        let error = ApiError::new(400, ErrorCode::SelfTransfer, "Cannot transfer units to yourself")
            .with_detail("requestId", "req_1");
        let banner = ErrorBanner::from_api(&error, TRANSFER_FAILED_MESSAGE);
        assert_eq!(banner.kind, ErrorClass::Rejected);
        assert_eq!(banner.message, "Cannot transfer units to yourself");
        assert_eq!(
            banner.to_string(),
            "Request rejected: Cannot transfer units to yourself [Request ID: req_1]"
        );
    }

    #[test]
    fn transport_failure_uses_fallback() {
        let banner = ErrorBanner::from_api(&ApiError::transport("refused"), FUND_FAILED_MESSAGE);
        assert_eq!(banner.kind, ErrorClass::Unexpected);
        assert_eq!(banner.message, FUND_FAILED_MESSAGE);
        assert_eq!(banner.request_id, None);
    }

    #[test]
    fn conflict_has_distinct_title() {
        let error = ApiError::new(409, ErrorCode::DuplicateTransfer, "key reused");
        let banner = ErrorBanner::from_api(&error, TRANSFER_FAILED_MESSAGE);
        assert_eq!(banner.kind, ErrorClass::Conflict);
        assert_eq!(banner.title(), "Duplicate request");
    }
}
