use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message shown when an upload yields no usable rows.
pub const NO_VALID_ROWS_MESSAGE: &str =
    "No valid data found in Excel. Please check column names 'Part' and 'Website'.";

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartScoutError {
    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Read error: {message}")]
    Read { message: String },

    #[error("Export error: {message}")]
    Export { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },
}

impl PartScoutError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Parse error raised when no row resolved both a part and a website.
    pub fn no_valid_rows() -> Self {
        Self::parse(NO_VALID_ROWS_MESSAGE)
    }

    pub fn read(message: impl Into<String>) -> Self {
        Self::Read {
            message: message.into(),
        }
    }

    pub fn export(message: impl Into<String>) -> Self {
        Self::Export {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "PARSE_ERROR",
            Self::Read { .. } => "READ_ERROR",
            Self::Export { .. } => "EXPORT_ERROR",
            Self::Conflict { .. } => "CONFLICT",
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Parse { .. } => 422,
            Self::Read { .. } => 400,
            Self::Export { .. } => 500,
            Self::Conflict { .. } => 409,
        }
    }

    /// Message without the variant prefix, suitable for end users.
    pub fn user_message(&self) -> &str {
        match self {
            Self::Parse { message }
            | Self::Read { message }
            | Self::Export { message }
            | Self::Conflict { message } => message,
        }
    }
}

pub type PartScoutResult<T> = Result<T, PartScoutError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub message: String,
}

impl From<PartScoutError> for ErrorResponse {
    fn from(error: PartScoutError) -> Self {
        Self {
            error: error.to_string(),
            code: error.error_code().to_string(),
            message: error.user_message().to_string(),
        }
    }
}

impl From<calamine::Error> for PartScoutError {
    fn from(error: calamine::Error) -> Self {
        Self::read(error.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for PartScoutError {
    fn from(error: rust_xlsxwriter::XlsxError) -> Self {
        Self::export(error.to_string())
    }
}
