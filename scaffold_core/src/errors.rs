//! # Error Types
//!
//! Structured error types for scaffold_core. Every failure a submission,
//! token exchange or export can hit is a variant here, so front ends can
//! branch on the kind and still show the user a ready-made message via
//! [`CalcError::user_message`].
//!
//! ## Example
//!
//! ```rust
//! use scaffold_core::errors::{CalcError, CalcResult};
//!
//! fn require_token(token: &str) -> CalcResult<&str> {
//!     if token.trim().is_empty() {
//!         return Err(CalcError::MissingToken);
//!     }
//!     Ok(token.trim())
//! }
//!
//! assert_eq!(require_token(" ").unwrap_err().error_code(), "MISSING_TOKEN");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::form::FieldName;

/// Result type alias for scaffold_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Fallback text when the server rejects a request without a message
pub const UNKNOWN_SERVER_ERROR: &str = "Произошла неизвестная ошибка";

/// Structured error type for calculator operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// Location (or inside sub-type) has not been chosen yet
    #[error("Scaffolding location is not fully selected")]
    MissingSelection,

    /// No access token is available for the calculation endpoint
    #[error("Access token is missing")]
    MissingToken,

    /// A field required by the active location is empty
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// An input value is invalid (not a number, not positive, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// The server could not be reached or the transfer broke off
    #[error("Network error: {reason}")]
    Network { reason: String },

    /// The server answered with `success: false`
    #[error("Server rejected the request: {message}")]
    ServerRejected { message: String },

    /// The server answered, but not with a usable envelope
    #[error("Invalid server response: {reason}")]
    InvalidResponse { reason: String },

    /// The payment redirect could not be exchanged for a token
    #[error("Token exchange failed: {message}")]
    TokenExchangeFailed { message: String },

    /// A calculation is already in flight
    #[error("A calculation is already in progress")]
    Busy,

    /// Export was requested before any successful calculation
    #[error("No calculation result to export")]
    NoResult,

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Document rendering failed
    #[error("Export failed: {reason}")]
    ExportFailed { reason: String },

    /// Configuration is unusable (bad base URL, unreadable file)
    #[error("Configuration error: {reason}")]
    Config { reason: String },
}

impl CalcError {
    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        CalcError::MissingField {
            field: field.into(),
        }
    }

    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a Network error
    pub fn network(reason: impl Into<String>) -> Self {
        CalcError::Network {
            reason: reason.into(),
        }
    }

    /// Create a ServerRejected error, falling back to a generic message
    pub fn server_rejected(message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_SERVER_ERROR.to_string());
        CalcError::ServerRejected { message }
    }

    /// Create an InvalidResponse error
    pub fn invalid_response(reason: impl Into<String>) -> Self {
        CalcError::InvalidResponse {
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an ExportFailed error
    pub fn export_failed(reason: impl Into<String>) -> Self {
        CalcError::ExportFailed {
            reason: reason.into(),
        }
    }

    /// True when the server message says the access token is no longer valid.
    pub fn is_token_expiry(&self) -> bool {
        match self {
            CalcError::ServerRejected { message } => signals_token_expiry(message),
            _ => false,
        }
    }

    /// Text shown to the user in place of a calculation result.
    ///
    /// Server-provided messages are passed through verbatim.
    pub fn user_message(&self) -> String {
        match self {
            CalcError::MissingSelection => "Выберите, где будут устанавливаться леса.".to_string(),
            CalcError::MissingToken => "Пожалуйста, введите ваш токен доступа.".to_string(),
            CalcError::MissingField { field } => {
                format!("Заполните поле «{}».", field_label(field))
            }
            CalcError::InvalidInput { field, reason, .. } => {
                format!("Некорректное значение в поле «{}»: {}", field_label(field), reason)
            }
            CalcError::Network { .. } => "Не удалось связаться с сервером.".to_string(),
            CalcError::ServerRejected { message } => message.clone(),
            CalcError::TokenExchangeFailed { message } => message.clone(),
            CalcError::InvalidResponse { .. } => "Сервер вернул некорректный ответ.".to_string(),
            CalcError::Busy => "Расчет уже выполняется.".to_string(),
            CalcError::NoResult => "Нет результата для экспорта.".to_string(),
            other => other.to_string(),
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::MissingSelection => "MISSING_SELECTION",
            CalcError::MissingToken => "MISSING_TOKEN",
            CalcError::MissingField { .. } => "MISSING_FIELD",
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::Network { .. } => "NETWORK",
            CalcError::ServerRejected { .. } => "SERVER_REJECTED",
            CalcError::InvalidResponse { .. } => "INVALID_RESPONSE",
            CalcError::TokenExchangeFailed { .. } => "TOKEN_EXCHANGE_FAILED",
            CalcError::Busy => "BUSY",
            CalcError::NoResult => "NO_RESULT",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::ExportFailed { .. } => "EXPORT_FAILED",
            CalcError::Config { .. } => "CONFIG_ERROR",
        }
    }
}

/// Markers the calculation server uses when a token has expired or was revoked.
const TOKEN_EXPIRY_MARKERS: &[&str] = &[
    "expired",
    "invalid token",
    "token invalid",
    "истек",
    "истёк",
    "недействител",
];

/// Check whether a server message reports an expired or invalid token.
pub fn signals_token_expiry(message: &str) -> bool {
    let lower = message.to_lowercase();
    TOKEN_EXPIRY_MARKERS.iter().any(|marker| lower.contains(marker))
}

fn field_label(key: &str) -> &str {
    FieldName::from_key(key).map(|f| f.label()).unwrap_or(key)
}
