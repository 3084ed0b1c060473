//! Application settings configuration.

use serde::{Deserialize, Serialize};

use crate::api::auth::DEFAULT_SESSION_NAME;
use crate::api::DEFAULT_TIMEOUT_SECS;

/// Application-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// The name of the default profile to use.
    pub default_profile: Option<String>,
    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
    /// Query parameter name for session authentication.
    pub session_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_profile: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            session_name: DEFAULT_SESSION_NAME.to_string(),
        }
    }
}
