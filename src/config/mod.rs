//! Configuration management for the ZenTao client.
//!
//! This module handles loading, saving, and managing user configuration
//! including profiles and application settings. Secrets are never written to
//! the configuration file; app keys live in the OS keyring.

mod profile;
mod settings;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub use profile::Profile;
pub use settings::Settings;

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform configuration directory could not be determined.
    #[error("Could not determine configuration directory")]
    NoConfigDir,

    /// The configuration directory could not be created.
    #[error("Failed to create configuration directory: {0}")]
    CreateDirError(#[source] std::io::Error),

    /// The configuration file could not be read.
    #[error("Failed to read configuration file: {0}")]
    ReadError(#[source] std::io::Error),

    /// The configuration file could not be written.
    #[error("Failed to write configuration file: {0}")]
    WriteError(#[source] std::io::Error),

    /// The configuration file is not valid TOML.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// The configuration could not be serialized.
    #[error("Failed to serialize configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// The configuration is well-formed but invalid.
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// A requested profile does not exist.
    #[error("Profile '{0}' not found")]
    ProfileNotFound(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// The persisted configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Application-wide settings.
    #[serde(default)]
    pub settings: Settings,
    /// Connection profiles.
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

impl Config {
    /// Load the configuration from the default location.
    ///
    /// A missing file yields the default configuration.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Load the configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;

        info!(path = %path.display(), profiles = config.profiles.len(), "Configuration loaded");
        Ok(config)
    }

    /// Save the configuration to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path()?)
    }

    /// Save the configuration to a specific file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::CreateDirError)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents).map_err(ConfigError::WriteError)?;

        info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Validate all profiles and check that profile names are unique.
    pub fn validate(&self) -> Result<()> {
        if self.settings.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for profile in &self.profiles {
            profile.validate()?;
            if !seen.insert(profile.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate profile name '{}'",
                    profile.name
                )));
            }
        }

        if let Some(default) = &self.settings.default_profile {
            if !self.profiles.iter().any(|p| &p.name == default) {
                return Err(ConfigError::ValidationError(format!(
                    "default profile '{}' does not exist",
                    default
                )));
            }
        }

        Ok(())
    }

    /// Look up a profile by name.
    pub fn profile(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ConfigError::ProfileNotFound(name.to_string()))
    }

    /// The profile to use when none is named: the configured default, or
    /// the only profile if there is exactly one.
    pub fn default_profile(&self) -> Option<&Profile> {
        match &self.settings.default_profile {
            Some(name) => self.profiles.iter().find(|p| &p.name == name),
            None if self.profiles.len() == 1 => self.profiles.first(),
            None => None,
        }
    }
}

/// Path of the configuration file.
///
/// - Linux: `~/.config/zentao/config.toml`
/// - macOS: `~/Library/Application Support/zentao/config.toml`
/// - Windows: `C:\Users\<User>\AppData\Roaming\zentao\config.toml`
pub fn config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(base.join("zentao").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AuthMode;

    fn app_profile(name: &str) -> Profile {
        Profile {
            name: name.to_string(),
            url: "https://zentao.example.com/api.php".to_string(),
            auth_mode: AuthMode::App,
            code: Some("myapp".to_string()),
            account: None,
        }
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config {
            settings: Settings {
                default_profile: Some("work".to_string()),
                ..Default::default()
            },
            profiles: vec![app_profile("work")],
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_parses_handwritten_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[settings]
default_profile = "team"
timeout_secs = 10

[[profiles]]
name = "team"
url = "http://localhost:8080/api.php"
auth_mode = "session"
account = "admin"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.settings.timeout_secs, 10);
        assert_eq!(config.settings.session_name, "zentaosid");

        let profile = config.default_profile().unwrap();
        assert_eq!(profile.auth_mode, AuthMode::Session);
        assert_eq!(profile.account.as_deref(), Some("admin"));
    }

    #[test]
    fn test_load_rejects_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is = = not toml").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[settings]\ntimeout_secs = 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_duplicate_profile_names_rejected() {
        let config = Config {
            settings: Settings::default(),
            profiles: vec![app_profile("work"), app_profile("work")],
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate profile"));
    }

    #[test]
    fn test_missing_default_profile_rejected() {
        let config = Config {
            settings: Settings {
                default_profile: Some("ghost".to_string()),
                ..Default::default()
            },
            profiles: vec![app_profile("work")],
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_profile_lookup() {
        let config = Config {
            settings: Settings::default(),
            profiles: vec![app_profile("work"), app_profile("home")],
        };
        assert_eq!(config.profile("home").unwrap().name, "home");
        assert!(matches!(
            config.profile("ghost"),
            Err(ConfigError::ProfileNotFound(_))
        ));
    }

    #[test]
    fn test_single_profile_is_default() {
        let config = Config {
            settings: Settings::default(),
            profiles: vec![app_profile("only")],
        };
        assert_eq!(config.default_profile().unwrap().name, "only");

        let config = Config {
            settings: Settings::default(),
            profiles: vec![app_profile("a"), app_profile("b")],
        };
        assert!(config.default_profile().is_none());
    }

    #[test]
    fn test_config_path_structure() {
        if let Ok(path) = config_path() {
            assert!(path.ends_with("zentao/config.toml"));
        }
    }
}
