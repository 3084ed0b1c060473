//! Centralized error types for the zentao command-line tool.
//!
//! This module provides a unified error hierarchy with user-friendly error
//! messages. All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;

/// The main application error type.
///
/// This enum aggregates all error types that can occur in the tool,
/// providing user-friendly error messages while preserving the underlying
/// error context for debugging.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration-related errors.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// API-related errors.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// IO errors (file system, stdout, etc.).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with a message.
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Create a generic error.
    pub fn other(msg: impl Into<String>) -> Self {
        AppError::Other(msg.into())
    }

    /// Get a user-friendly message for display.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(e) => match e {
                ConfigError::NoConfigDir => {
                    "Could not find configuration directory. Please check your system settings."
                        .to_string()
                }
                ConfigError::CreateDirError(_) => {
                    "Could not create configuration directory. Check file permissions.".to_string()
                }
                ConfigError::ReadError(_) => {
                    "Could not read configuration file. Please check the file exists and is readable.".to_string()
                }
                ConfigError::WriteError(_) => {
                    "Could not save configuration. Please check file permissions.".to_string()
                }
                ConfigError::ParseError(_) => {
                    "Configuration file is invalid. Please check the file format.".to_string()
                }
                ConfigError::SerializeError(_) => {
                    "Could not save configuration. Internal error.".to_string()
                }
                ConfigError::ValidationError(msg) => format!("Configuration error: {}", msg),
                ConfigError::ProfileNotFound(name) => format!("Profile '{}' not found.", name),
            },
            AppError::Api(e) => match e {
                ApiError::Translation { method, path } => {
                    format!("'{} {}' is not a known ZenTao call.", method, path)
                }
                ApiError::Unauthorized(_) => {
                    "Authentication failed. Please check your app code and key.".to_string()
                }
                ApiError::Forbidden(_) => {
                    "Access denied. You don't have permission to access this resource.".to_string()
                }
                ApiError::NotFound(_) => "The requested resource was not found.".to_string(),
                ApiError::RateLimited => {
                    "Too many requests. Please wait a moment and try again.".to_string()
                }
                ApiError::ServerError(_) => {
                    "ZenTao server error. Please try again later.".to_string()
                }
                ApiError::UnexpectedStatus { status, .. } => {
                    format!("ZenTao answered with unexpected HTTP status {}.", status)
                }
                ApiError::Network(_) => {
                    "Connection failed. Please check your network and ZenTao URL.".to_string()
                }
                ApiError::Serialize(_) => "The request body could not be encoded.".to_string(),
                ApiError::InvalidUrl(_) => "Invalid ZenTao URL in configuration.".to_string(),
                ApiError::InvalidResponse(_) => {
                    "Unexpected response from ZenTao. Please try again.".to_string()
                }
                ApiError::MissingCredentials(msg) => format!("Missing credentials: {}.", msg),
                ApiError::Keyring(_) => {
                    "Could not access secure storage for the app key.".to_string()
                }
            },
            AppError::Io(_) => "A file operation failed. Please check file permissions.".to_string(),
            AppError::Other(msg) => msg.clone(),
        }
    }

    /// Check if this error is critical and requires user acknowledgment.
    ///
    /// Critical errors stop every request, not just the current one.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            AppError::Config(_)
                | AppError::Api(ApiError::Unauthorized(_))
                | AppError::Api(ApiError::Forbidden(_))
                | AppError::Api(ApiError::InvalidUrl(_))
                | AppError::Api(ApiError::MissingCredentials(_))
        )
    }

    /// Process exit status for this error.
    ///
    /// Critical errors exit with 2 so scripts can tell a broken setup from a
    /// failed request.
    pub fn exit_code(&self) -> u8 {
        if self.is_critical() {
            2
        } else {
            1
        }
    }

    /// Get a suggested action for the user.
    pub fn suggested_action(&self) -> Option<&'static str> {
        match self {
            AppError::Config(ConfigError::NoConfigDir)
            | AppError::Config(ConfigError::ProfileNotFound(_)) => {
                Some("Add a [[profiles]] entry to the configuration file or pass --url.")
            }
            AppError::Api(ApiError::Unauthorized(_))
            | AppError::Api(ApiError::MissingCredentials(_)) => {
                Some("Pass --code and --key, or run 'zentao store-key' for the profile.")
            }
            AppError::Api(ApiError::Translation { .. }) => {
                Some("Run 'zentao translate <METHOD> <PATH>' to check a path.")
            }
            AppError::Api(ApiError::RateLimited) => Some("Wait a few seconds and try again."),
            AppError::Api(ApiError::Network(_)) => {
                Some("Check your internet connection, ZenTao URL and --timeout.")
            }
            _ => None,
        }
    }
}

/// Result type for application operations.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_from_config_error() {
        let app_err: AppError = ConfigError::NoConfigDir.into();
        assert!(matches!(app_err, AppError::Config(ConfigError::NoConfigDir)));
    }

    #[test]
    fn test_app_error_from_api_error() {
        let app_err: AppError = ApiError::RateLimited.into();
        assert!(matches!(app_err, AppError::Api(ApiError::RateLimited)));
    }

    #[test]
    fn test_user_message_translation() {
        let err = AppError::Api(ApiError::Translation {
            method: "GET".to_string(),
            path: "/widgets".to_string(),
        });
        assert_eq!(err.user_message(), "'GET /widgets' is not a known ZenTao call.");
    }

    #[test]
    fn test_user_message_unauthorized() {
        let err = AppError::Api(ApiError::Unauthorized(String::new()));
        let msg = err.user_message();
        assert!(msg.contains("Authentication failed"));
        assert!(msg.contains("app code"));
    }

    #[test]
    fn test_user_message_config_validation() {
        let err = AppError::Config(ConfigError::ValidationError(
            "duplicate profile".to_string(),
        ));
        assert!(err.user_message().contains("duplicate profile"));
    }

    #[test]
    fn test_is_critical() {
        assert!(AppError::Api(ApiError::Unauthorized(String::new())).is_critical());
        assert!(AppError::Config(ConfigError::NoConfigDir).is_critical());
        assert!(!AppError::Api(ApiError::RateLimited).is_critical());
        assert!(!AppError::other("x").is_critical());
    }

    #[test]
    fn test_exit_code() {
        assert_eq!(AppError::Api(ApiError::MissingCredentials(String::new())).exit_code(), 2);
        assert_eq!(AppError::Config(ConfigError::ProfileNotFound("x".to_string())).exit_code(), 2);
        assert_eq!(AppError::Api(ApiError::RateLimited).exit_code(), 1);
        assert_eq!(AppError::other("x").exit_code(), 1);
    }

    #[test]
    fn test_suggested_action_missing_credentials() {
        let err = AppError::Api(ApiError::MissingCredentials("app key".to_string()));
        assert!(err.suggested_action().unwrap().contains("store-key"));
    }

    #[test]
    fn test_suggested_action_translation() {
        let err = AppError::Api(ApiError::Translation {
            method: "GET".to_string(),
            path: "/x".to_string(),
        });
        assert!(err.suggested_action().unwrap().contains("translate"));
    }

    #[test]
    fn test_other_error() {
        let err = AppError::other("something went wrong");
        assert_eq!(err.user_message(), "something went wrong");
        assert!(err.suggested_action().is_none());
    }
}
