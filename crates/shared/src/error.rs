use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Validation,
    Internal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Problems with text a user typed into the dashboard. Both are recoverable
/// and shown inline next to the form that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("no value entered")]
    EmptyInput,
    #[error("not a number: {0:?}")]
    InvalidNumber(String),
    #[error("name contains control characters: {0:?}")]
    InvalidName(String),
}

impl From<InputError> for ApiError {
    fn from(value: InputError) -> Self {
        Self::new(ErrorCode::Validation, value.to_string())
    }
}
