//! ZenTao profile configuration.

use serde::{Deserialize, Serialize};

use super::{ConfigError, Result};
use crate::api::AuthMode;

/// A ZenTao profile configuration.
///
/// Profiles store connection details for a ZenTao instance.
/// App keys and passwords are never stored here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    /// The name of this profile.
    ///
    /// Must be non-empty and unique across all profiles.
    pub name: String,

    /// The ZenTao API entry point (e.g., "https://zentao.example.com/api.php").
    pub url: String,

    /// How requests are authenticated.
    #[serde(default)]
    pub auth_mode: AuthMode,

    /// The app code, required for `app` mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// The login account, required for `session` mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

impl Profile {
    /// Create a new app-credential profile.
    #[cfg(test)]
    pub fn new(name: String, url: String, code: String) -> Self {
        Self {
            name,
            url,
            auth_mode: AuthMode::App,
            code: Some(code),
            account: None,
        }
    }

    /// Validate this profile.
    ///
    /// Checks that:
    /// - The name is non-empty and has no whitespace
    /// - The URL is non-empty and uses http or https
    /// - The field the auth mode needs (`code` or `account`) is present
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError::ValidationError` with details if validation fails.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ConfigError::ValidationError(
                "profile name cannot be empty".to_string(),
            ));
        }

        if self.name.contains(char::is_whitespace) {
            return Err(ConfigError::ValidationError(format!(
                "profile name '{}' cannot contain whitespace",
                self.name
            )));
        }

        if self.url.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "profile '{}': URL cannot be empty",
                self.name
            )));
        }

        if !self.url.starts_with("https://") && !self.url.starts_with("http://") {
            return Err(ConfigError::ValidationError(format!(
                "profile '{}': URL must start with http:// or https://",
                self.name
            )));
        }

        let (field, value) = match self.auth_mode {
            AuthMode::App => ("code", &self.code),
            AuthMode::Session => ("account", &self.account),
        };
        if value.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::ValidationError(format!(
                "profile '{}': {} is required for {} authentication",
                self.name, field, self.auth_mode
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn work_profile() -> Profile {
        Profile::new(
            "work".to_string(),
            "https://zentao.example.com/api.php".to_string(),
            "myapp".to_string(),
        )
    }

    #[test]
    fn test_profile_creation() {
        let profile = work_profile();

        assert_eq!(profile.name, "work");
        assert_eq!(profile.url, "https://zentao.example.com/api.php");
        assert_eq!(profile.auth_mode, AuthMode::App);
        assert_eq!(profile.code.as_deref(), Some("myapp"));
    }

    #[test]
    fn test_valid_profile() {
        assert!(work_profile().validate().is_ok());
    }

    #[test]
    fn test_empty_name_rejected() {
        let profile = Profile {
            name: String::new(),
            ..work_profile()
        };

        let result = profile.validate();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("name cannot be empty"));
    }

    #[test]
    fn test_whitespace_name_rejected() {
        let profile = Profile {
            name: "my work".to_string(),
            ..work_profile()
        };

        assert!(profile
            .validate()
            .unwrap_err()
            .to_string()
            .contains("cannot contain whitespace"));
    }

    #[test]
    fn test_invalid_url_scheme_rejected() {
        let profile = Profile {
            url: "zentao.example.com".to_string(),
            ..work_profile()
        };

        assert!(profile
            .validate()
            .unwrap_err()
            .to_string()
            .contains("must start with http"));
    }

    #[test]
    fn test_app_mode_requires_code() {
        let profile = Profile {
            code: None,
            ..work_profile()
        };

        assert!(profile
            .validate()
            .unwrap_err()
            .to_string()
            .contains("code is required for app authentication"));
    }

    #[test]
    fn test_session_mode_requires_account() {
        let profile = Profile {
            auth_mode: AuthMode::Session,
            code: None,
            account: None,
            ..work_profile()
        };
        assert!(profile
            .validate()
            .unwrap_err()
            .to_string()
            .contains("account is required for session authentication"));

        let profile = Profile {
            account: Some("admin".to_string()),
            ..profile
        };
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_profile_serialization() {
        let profile = work_profile();

        let toml_str = toml::to_string(&profile).unwrap();
        let parsed: Profile = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed, profile);
        assert!(!toml_str.contains("account"));
    }

    #[test]
    fn test_auth_mode_defaults_to_app() {
        let parsed: Profile = toml::from_str(
            r#"
name = "work"
url = "https://zentao.example.com"
code = "myapp"
"#,
        )
        .unwrap();
        assert_eq!(parsed.auth_mode, AuthMode::App);
    }
}
