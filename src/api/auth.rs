//! Authentication handling for the ZenTao API.
//!
//! ZenTao accepts either an app code/key pair, from which a short-lived
//! token is derived per request, or a session identifier obtained from the
//! `/tokens` login endpoint. App keys can be kept in the OS keyring.

use super::error::{ApiError, Result};

/// The keyring service name for app keys.
const KEYRING_SERVICE: &str = "zentao";

/// Default name of the session query parameter.
pub const DEFAULT_SESSION_NAME: &str = "zentaosid";

/// Credentials a client authenticates with.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// App code and key; a token is derived from them for every request.
    AppCredential {
        /// The app code, sent in clear as `code`.
        code: String,
        /// The app key, only ever used as token input.
        key: String,
    },
    /// A session identifier sent as a query parameter and `Token` header.
    Session {
        /// The query parameter name, usually `zentaosid`.
        name: String,
        /// The session value.
        value: String,
    },
}

impl Credentials {
    /// Create app-credential authentication.
    pub fn app(code: impl Into<String>, key: impl Into<String>) -> Self {
        Credentials::AppCredential {
            code: code.into(),
            key: key.into(),
        }
    }

    /// Create session authentication with the default parameter name.
    pub fn session(value: impl Into<String>) -> Self {
        Credentials::Session {
            name: DEFAULT_SESSION_NAME.to_string(),
            value: value.into(),
        }
    }

    /// The mode of these credentials.
    pub fn mode(&self) -> AuthMode {
        match self {
            Credentials::AppCredential { .. } => AuthMode::App,
            Credentials::Session { .. } => AuthMode::Session,
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::AppCredential { code, .. } => f
                .debug_struct("AppCredential")
                .field("code", code)
                .field("key", &"<redacted>")
                .finish(),
            Credentials::Session { name, .. } => f
                .debug_struct("Session")
                .field("name", name)
                .field("value", &"<redacted>")
                .finish(),
        }
    }
}

/// Authentication mode as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// App code/key token authentication.
    #[default]
    App,
    /// Session authentication via `/tokens` login.
    Session,
}

impl std::fmt::Display for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMode::App => f.write_str("app"),
            AuthMode::Session => f.write_str("session"),
        }
    }
}

/// Store an app key in the OS keyring.
///
/// # Arguments
///
/// * `profile_name` - The profile name to use as the keyring username
/// * `key` - The app key to store
///
/// # Errors
///
/// Returns an error if the key cannot be stored in the keyring.
pub fn store_app_key(profile_name: &str, key: &str) -> Result<()> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, profile_name)
        .map_err(|e| ApiError::Keyring(format!("failed to create keyring entry: {}", e)))?;

    entry
        .set_password(key)
        .map_err(|e| ApiError::Keyring(format!("failed to store app key: {}", e)))?;

    Ok(())
}

/// Retrieve an app key from the OS keyring.
///
/// # Errors
///
/// Returns an error if the key cannot be retrieved from the keyring.
pub fn get_app_key(profile_name: &str) -> Result<String> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, profile_name)
        .map_err(|e| ApiError::Keyring(format!("failed to access keyring: {}", e)))?;

    entry
        .get_password()
        .map_err(|e| ApiError::Keyring(format!("failed to retrieve app key: {}", e)))
}
