use std::fmt;

use fundboard_domain::Field;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Machine-readable error codes returned by the API, plus `Unknown` for
/// anything that could not be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidRequest,
    InvalidFund,
    FundNotFound,
    OwnerNotFound,
    InsufficientUnits,
    SelfTransfer,
    DuplicateTransfer,
    InternalError,
    #[serde(other)]
    Unknown,
}

impl ErrorCode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::InvalidFund => "INVALID_FUND",
            Self::FundNotFound => "FUND_NOT_FOUND",
            Self::OwnerNotFound => "OWNER_NOT_FOUND",
            Self::InsufficientUnits => "INSUFFICIENT_UNITS",
            Self::SelfTransfer => "SELF_TRANSFER",
            Self::DuplicateTransfer => "DUPLICATE_TRANSFER",
            Self::InternalError => "INTERNAL_ERROR",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// User-facing message used when the server sends none.
    #[must_use]
    pub fn default_message(self) -> &'static str {
        match self {
            Self::InvalidRequest => "The request was invalid. Please check your input.",
            Self::InvalidFund => {
                "Invalid fund data. Name must be non-empty and units must be positive."
            }
            Self::FundNotFound => "The requested fund could not be found.",
            Self::OwnerNotFound => "The specified owner does not exist in this fund.",
            Self::InsufficientUnits => "The sender does not have enough units for this transfer.",
            Self::SelfTransfer => "Cannot transfer units to the same owner.",
            Self::DuplicateTransfer => "This transfer has already been processed.",
            Self::InternalError => "An unexpected error occurred. Please try again.",
            Self::Unknown => GENERIC_ERROR_MESSAGE,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a failure should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// The server refused the request (4xx with a known code).
    Rejected,
    /// Idempotency key reused with a different payload. Never retried.
    Conflict,
    /// Transport failure, unparseable body or server fault.
    Unexpected,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: ErrorCode,
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Option<Map<String, Value>>,
}

/// Normalized API failure. Status 0 means no HTTP response was received.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("{code} ({status}): {message}")]
pub struct ApiError {
    pub status: u16,
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
}

impl ApiError {
    #[must_use]
    pub fn new(status: u16, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }

    #[must_use]
    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value.into());
        self
    }

    /// No response was received: connect, timeout or read failure.
    #[must_use]
    pub fn transport(cause: impl fmt::Display) -> Self {
        Self::new(0, ErrorCode::Unknown, GENERIC_ERROR_MESSAGE).with_detail("cause", cause.to_string())
    }

    /// A success status whose body did not match the expected shape.
    #[must_use]
    pub fn decode(status: StatusCode, cause: impl fmt::Display) -> Self {
        Self::new(status.as_u16(), ErrorCode::Unknown, GENERIC_ERROR_MESSAGE)
            .with_detail("cause", cause.to_string())
    }

    /// Maps a non-success response to the structured shape.
    #[must_use]
    pub fn from_response(status: StatusCode, body: &[u8]) -> Self {
        match serde_json::from_slice::<ErrorBody>(body) {
            Ok(parsed) => {
                let message = if parsed.message.trim().is_empty() {
                    parsed.code.default_message().to_string()
                } else {
                    parsed.message
                };
                Self {
                    status: status.as_u16(),
                    code: parsed.code,
                    message,
                    details: parsed.details,
                }
            }
            Err(_) => {
                let error = Self::new(status.as_u16(), ErrorCode::Unknown, GENERIC_ERROR_MESSAGE);
                match non_empty_body(body) {
                    Some(text) => error.with_detail("body", text),
                    None => error,
                }
            }
        }
    }

    #[must_use]
    pub fn detail_str(&self, key: &str) -> Option<&str> {
        self.details.as_ref()?.get(key)?.as_str()
    }

    /// Server-assigned request identifier for support correlation.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.detail_str("requestId")
    }

    #[must_use]
    pub fn hint(&self) -> Option<&str> {
        self.detail_str("hint")
    }

    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.status == StatusCode::CONFLICT.as_u16() || self.code == ErrorCode::DuplicateTransfer
    }

    #[must_use]
    pub fn class(&self) -> ErrorClass {
        if self.is_conflict() {
            return ErrorClass::Conflict;
        }
        if self.status == 0
            || self.status >= 500
            || matches!(self.code, ErrorCode::Unknown | ErrorCode::InternalError)
        {
            return ErrorClass::Unexpected;
        }
        ErrorClass::Rejected
    }

    /// The form field a server rejection can be attached to, if any.
    #[must_use]
    pub fn field(&self) -> Option<Field> {
        match self.code {
            ErrorCode::SelfTransfer => Some(Field::ToOwner),
            ErrorCode::InsufficientUnits => Some(Field::Units),
            ErrorCode::OwnerNotFound => Some(Field::FromOwner),
            _ => None,
        }
    }
}

fn non_empty_body(body: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(body);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
