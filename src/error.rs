//! Unified error handling for the techfeed client
//!
//! This module provides:
//! - Stable internal error codes for debugging
//! - Structured error information with context
//! - Convenient constructor methods
//! - Automatic conversions from common error types

use std::fmt;
use thiserror::Error;

/// Unified Result type for all techfeed operations
pub type Result<T> = std::result::Result<T, FeedError>;

/// Error codes for techfeed operations
///
/// Each error has a unique code in the format `FXXX` where:
/// - F1XX: Authentication and session errors
/// - F2XX: Network and API errors
/// - F3XX: Storage and I/O errors
/// - F4XX: Configuration errors
/// - F5XX: Validation and input errors
/// - F9XX: Internal errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Authentication (F1XX)
    /// F101: Authentication failed
    AuthenticationFailed,
    /// F102: Access denied (no session)
    AccessDenied,
    /// F103: Session ended by the server
    SessionExpired,
    /// F104: Refresh token missing locally
    RefreshTokenMissing,
    /// F105: Token refresh call failed
    RefreshFailed,

    // Network (F2XX)
    /// F201: HTTP request failed
    HttpError,
    /// F202: Connection timeout
    ConnectionTimeout,
    /// F204: Connection refused / no route
    ConnectionRefused,
    /// F205: API returned error response
    ApiError,
    /// F206: Invalid API response format
    InvalidResponse,

    // Storage (F3XX)
    /// F301: Storage read error
    StorageReadError,
    /// F302: Storage write error
    StorageWriteError,

    // Configuration (F4XX)
    /// F401: Configuration error
    ConfigError,
    /// F402: Invalid endpoint URL
    InvalidEndpoint,

    // Validation (F5XX)
    /// F501: Invalid input
    InvalidInput,

    // Internal (F9XX)
    /// F901: Internal error
    InternalError,
    /// F902: Serialization error
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code
    pub fn code(&self) -> u16 {
        match self {
            ErrorCode::AuthenticationFailed => 101,
            ErrorCode::AccessDenied => 102,
            ErrorCode::SessionExpired => 103,
            ErrorCode::RefreshTokenMissing => 104,
            ErrorCode::RefreshFailed => 105,

            ErrorCode::HttpError => 201,
            ErrorCode::ConnectionTimeout => 202,
            ErrorCode::ConnectionRefused => 204,
            ErrorCode::ApiError => 205,
            ErrorCode::InvalidResponse => 206,

            ErrorCode::StorageReadError => 301,
            ErrorCode::StorageWriteError => 302,

            ErrorCode::ConfigError => 401,
            ErrorCode::InvalidEndpoint => 402,

            ErrorCode::InvalidInput => 501,

            ErrorCode::InternalError => 901,
            ErrorCode::SerializationError => 902,
        }
    }

    /// Get the string code (e.g., "F101")
    pub fn as_str(&self) -> String {
        format!("F{}", self.code())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F{}", self.code())
    }
}

/// Main error type for all techfeed operations
#[derive(Error, Debug)]
pub enum FeedError {
    // ==================== Authentication Errors (F1XX) ====================
    /// Session could not be established or was ended
    #[error("[{code}] Authentication failed: {message}")]
    Authentication {
        code: ErrorCode,
        message: String,
        /// Backend result code, when the failure came from a response
        server_code: Option<i64>,
    },

    // ==================== Network Errors (F2XX) ====================
    /// Request never reached the server
    #[error("[{code}] Network error: {message}")]
    Network {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Server answered with a failure
    #[error("[{code}] API error ({status}): {message}")]
    Api {
        code: ErrorCode,
        status: u16,
        message: String,
        server_code: Option<i64>,
        description: Option<String>,
    },

    // ==================== Storage Errors (F3XX) ====================
    #[error("[{code}] {context}: {message}")]
    Storage {
        code: ErrorCode,
        context: String,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    // ==================== Configuration Errors (F4XX) ====================
    #[error("[{code}] Configuration error: {message}")]
    Config {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<config::ConfigError>,
    },

    // ==================== Validation Errors (F5XX) ====================
    #[error("[{code}] Invalid input: {message}")]
    InvalidInput { code: ErrorCode, message: String },

    // ==================== Internal Errors (F9XX) ====================
    #[error("[{code}] Internal error: {message}")]
    Internal { code: ErrorCode, message: String },

    #[error("[{code}] Serialization error: {message}")]
    Serialization {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },
}

// ==================== Constructor Methods ====================

impl FeedError {
    // --- Authentication ---

    /// Create authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            code: ErrorCode::AuthenticationFailed,
            message: message.into(),
            server_code: None,
        }
    }

    /// No access token stored for a command that needs one
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::Authentication {
            code: ErrorCode::AccessDenied,
            message: message.into(),
            server_code: None,
        }
    }

    /// Session torn down after a hard auth failure
    pub fn session_expired(message: impl Into<String>, server_code: Option<i64>) -> Self {
        Self::Authentication {
            code: ErrorCode::SessionExpired,
            message: message.into(),
            server_code,
        }
    }

    pub fn refresh_token_missing(message: impl Into<String>) -> Self {
        Self::Authentication {
            code: ErrorCode::RefreshTokenMissing,
            message: message.into(),
            server_code: None,
        }
    }

    pub fn refresh_failed(message: impl Into<String>, server_code: Option<i64>) -> Self {
        Self::Authentication {
            code: ErrorCode::RefreshFailed,
            message: message.into(),
            server_code,
        }
    }

    // --- Network ---

    /// Create connection refused error without a transport source
    pub fn connection_refused(message: impl Into<String>) -> Self {
        Self::Network {
            code: ErrorCode::ConnectionRefused,
            message: message.into(),
            source: None,
        }
    }

    /// Create network error from reqwest error
    pub fn network_from_reqwest(err: reqwest::Error) -> Self {
        let code = if err.is_timeout() {
            ErrorCode::ConnectionTimeout
        } else if err.is_connect() {
            ErrorCode::ConnectionRefused
        } else {
            ErrorCode::HttpError
        };

        Self::Network {
            code,
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create API error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            code: ErrorCode::ApiError,
            status,
            message: message.into(),
            server_code: None,
            description: None,
        }
    }

    /// Create API error carrying the classified backend code and description
    pub fn api_classified(
        status: u16,
        server_code: Option<i64>,
        description: Option<String>,
    ) -> Self {
        let message = description
            .clone()
            .unwrap_or_else(|| format!("Request failed with status {}", status));
        Self::Api {
            code: ErrorCode::ApiError,
            status,
            message,
            server_code,
            description,
        }
    }

    /// Create invalid response error
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::Api {
            code: ErrorCode::InvalidResponse,
            status: 0,
            message: message.into(),
            server_code: None,
            description: None,
        }
    }

    // --- Storage ---

    pub fn storage(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            code: ErrorCode::StorageReadError,
            context: context.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn storage_from_io(context: impl Into<String>, err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::PermissionDenied | std::io::ErrorKind::WriteZero => {
                ErrorCode::StorageWriteError
            }
            _ => ErrorCode::StorageReadError,
        };

        Self::Storage {
            code,
            context: context.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    // --- Configuration ---

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            code: ErrorCode::ConfigError,
            message: message.into(),
            source: None,
        }
    }

    pub fn config_from_error(err: config::ConfigError) -> Self {
        Self::Config {
            code: ErrorCode::ConfigError,
            message: err.to_string(),
            source: Some(err),
        }
    }

    pub fn invalid_endpoint(message: impl Into<String>) -> Self {
        Self::Config {
            code: ErrorCode::InvalidEndpoint,
            message: message.into(),
            source: None,
        }
    }

    // --- Validation ---

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            code: ErrorCode::InvalidInput,
            message: message.into(),
        }
    }

    // --- Internal ---

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            code: ErrorCode::InternalError,
            message: message.into(),
        }
    }

    // --- Utility Methods ---

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Authentication { code, .. } => *code,
            Self::Network { code, .. } => *code,
            Self::Api { code, .. } => *code,
            Self::Storage { code, .. } => *code,
            Self::Config { code, .. } => *code,
            Self::InvalidInput { code, .. } => *code,
            Self::Internal { code, .. } => *code,
            Self::Serialization { code, .. } => *code,
        }
    }

    /// Backend result code, if the error came from a classified response
    pub fn server_code(&self) -> Option<i64> {
        match self {
            Self::Authentication { server_code, .. } | Self::Api { server_code, .. } => {
                *server_code
            }
            _ => None,
        }
    }

    /// Text meant for the end user, when the error carries one
    pub fn user_message(&self) -> Option<&str> {
        match self {
            Self::Authentication { message, .. } => Some(message),
            Self::Api { description, .. } => description.as_deref(),
            _ => None,
        }
    }

    /// Check if this is an authentication error
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// The request never reached the server
    pub fn is_connectivity_error(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

// ==================== From Implementations ====================

impl From<std::io::Error> for FeedError {
    fn from(err: std::io::Error) -> Self {
        Self::storage_from_io("IO operation", err)
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        Self::network_from_reqwest(err)
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            code: ErrorCode::SerializationError,
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<config::ConfigError> for FeedError {
    fn from(err: config::ConfigError) -> Self {
        Self::config_from_error(err)
    }
}

// Manual Clone implementation that drops non-cloneable sources
impl Clone for FeedError {
    fn clone(&self) -> Self {
        match self {
            Self::Authentication {
                code,
                message,
                server_code,
            } => Self::Authentication {
                code: *code,
                message: message.clone(),
                server_code: *server_code,
            },
            Self::Network {
                code,
                message,
                source: _,
            } => Self::Network {
                code: *code,
                message: message.clone(),
                source: None,
            },
            Self::Api {
                code,
                status,
                message,
                server_code,
                description,
            } => Self::Api {
                code: *code,
                status: *status,
                message: message.clone(),
                server_code: *server_code,
                description: description.clone(),
            },
            Self::Storage {
                code,
                context,
                message,
                source: _,
            } => Self::Storage {
                code: *code,
                context: context.clone(),
                message: message.clone(),
                source: None,
            },
            Self::Config {
                code,
                message,
                source: _,
            } => Self::Config {
                code: *code,
                message: message.clone(),
                source: None,
            },
            Self::InvalidInput { code, message } => Self::InvalidInput {
                code: *code,
                message: message.clone(),
            },
            Self::Internal { code, message } => Self::Internal {
                code: *code,
                message: message.clone(),
            },
            Self::Serialization {
                code,
                message,
                source: _,
            } => Self::Serialization {
                code: *code,
                message: message.clone(),
                source: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ErrorCode::AuthenticationFailed.code(), 101);
        assert_eq!(ErrorCode::HttpError.code(), 201);
        assert_eq!(ErrorCode::StorageReadError.code(), 301);
        assert_eq!(ErrorCode::ConfigError.code(), 401);
    }

    #[test]
    fn test_error_code_string() {
        assert_eq!(ErrorCode::RefreshFailed.as_str(), "F105");
        assert_eq!(ErrorCode::ConnectionRefused.as_str(), "F204");
    }

    #[test]
    fn test_error_display() {
        let err = FeedError::refresh_failed("refresh token expired", Some(2001));
        assert!(err.to_string().contains("F105"));
        assert!(err.to_string().contains("refresh token expired"));
    }

    #[test]
    fn test_api_classified_falls_back_to_status() {
        let err = FeedError::api_classified(500, None, None);
        assert!(err.to_string().contains("500"));
        assert_eq!(err.server_code(), None);

        let err = FeedError::api_classified(400, Some(1234), Some("bad keyword".to_string()));
        assert!(err.to_string().contains("bad keyword"));
        assert_eq!(err.server_code(), Some(1234));
    }

    #[test]
    fn test_clone_keeps_classification() {
        let err = FeedError::refresh_failed("expired", Some(2001));
        let cloned = err.clone();
        assert_eq!(cloned.code(), ErrorCode::RefreshFailed);
        assert_eq!(cloned.server_code(), Some(2001));
        assert!(cloned.is_auth_error());
    }

    #[test]
    fn test_connectivity_classification() {
        assert!(FeedError::connection_refused("down").is_connectivity_error());
        assert!(!FeedError::api(502, "bad gateway").is_connectivity_error());
    }

    #[test]
    fn test_json_errors_convert_to_serialization() {
        let err: FeedError = serde_json::from_str::<Vec<i64>>("[1,").unwrap_err().into();
        assert_eq!(err.code(), ErrorCode::SerializationError);
        assert!(!err.is_connectivity_error());
        assert!(err.to_string().contains("F902"));
    }
}
