//! Command-line interface for the `zentao` binary.
//!
//! Flags override the selected profile, and every flag can also be given as
//! a `ZENTAO_*` environment variable.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use reqwest::Method;
use tracing::{debug, info};

use crate::api::{self, auth, AuthMode, ClientConfig, Credentials, ZentaoClient};
use crate::config::{Config, Profile};
use crate::error::{AppError, Result};
use crate::logging::{LogConfig, DEFAULT_LOG_FILTER};

/// Talk to the ZenTao API from the terminal.
#[derive(Debug, Parser)]
#[command(name = "zentao", version, about)]
pub struct Cli {
    /// Profile from the configuration file.
    #[arg(long, short, env = "ZENTAO_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Configuration file to read instead of the default location.
    #[arg(long, env = "ZENTAO_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// ZenTao API entry point, e.g. https://zentao.example.com/api.php
    #[arg(long, env = "ZENTAO_URL", global = true)]
    pub url: Option<String>,

    /// Authentication mode.
    #[arg(long, value_enum, env = "ZENTAO_AUTH_MODE", global = true)]
    pub auth_mode: Option<AuthMode>,

    /// App code for app authentication.
    #[arg(long, env = "ZENTAO_APP_CODE", global = true)]
    pub code: Option<String>,

    /// App key for app authentication; falls back to the OS keyring.
    #[arg(long, env = "ZENTAO_APP_KEY", hide_env_values = true, global = true)]
    pub key: Option<String>,

    /// Account for session authentication.
    #[arg(long, env = "ZENTAO_ACCOUNT", global = true)]
    pub account: Option<String>,

    /// Password for session authentication.
    #[arg(long, env = "ZENTAO_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, env = "ZENTAO_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Log filter directive.
    #[arg(long, env = "ZENTAO_LOG", default_value = DEFAULT_LOG_FILTER, global = true)]
    pub log_level: String,

    /// Emit logs as JSON.
    #[arg(long, env = "ZENTAO_LOG_JSON", global = true)]
    pub log_json: bool,

    /// Write logs to this file (rotated daily) instead of stderr.
    #[arg(long, env = "ZENTAO_LOG_FILE", global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// GET a resource path and print the response.
    Get {
        /// REST-style path, e.g. /products/1
        path: String,
    },
    /// POST a JSON body to a resource path.
    Post {
        /// REST-style path.
        path: String,
        /// JSON request body.
        #[arg(long, short, default_value = "{}")]
        data: String,
    },
    /// PUT a JSON body to a resource path.
    Put {
        /// REST-style path.
        path: String,
        /// JSON request body.
        #[arg(long, short, default_value = "{}")]
        data: String,
    },
    /// DELETE a resource path.
    Delete {
        /// REST-style path.
        path: String,
    },
    /// Log in with --account/--password and report the result.
    Login,
    /// Store --key in the OS keyring for the selected profile.
    StoreKey,
    /// Show the module/function a path maps to without sending anything.
    Translate {
        /// HTTP method.
        method: String,
        /// REST-style path.
        path: String,
    },
}

impl Cli {
    /// The logging configuration requested on the command line.
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            level: self.log_level.clone(),
            json: self.log_json,
            file: self.log_file.clone(),
        }
    }
}

/// Connection settings after merging flags, profile and keyring.
#[derive(Debug)]
pub struct Connection {
    /// Settings for the client.
    pub client: ClientConfig,
    /// Account and password to log in with in session mode.
    pub login: Option<(String, String)>,
}

/// Merge command-line values with the configuration file.
///
/// `lookup_key` is asked for the app key of the selected profile when no key
/// was given on the command line.
pub fn resolve_connection<F>(cli: &Cli, config: &Config, lookup_key: F) -> Result<Connection>
where
    F: Fn(&str) -> api::Result<String>,
{
    let profile: Option<&Profile> = match &cli.profile {
        Some(name) => Some(config.profile(name)?),
        None => config.default_profile(),
    };

    let url = cli
        .url
        .clone()
        .or_else(|| profile.map(|p| p.url.clone()))
        .ok_or_else(|| AppError::other("No ZenTao URL: pass --url or configure a profile."))?;

    let mode = cli
        .auth_mode
        .or(profile.map(|p| p.auth_mode))
        .unwrap_or_default();

    let timeout = cli.timeout.unwrap_or(config.settings.timeout_secs);
    if timeout == 0 {
        return Err(AppError::other("The request timeout must be at least one second."));
    }

    let mut client = ClientConfig::new(url)
        .with_timeout(Duration::from_secs(timeout))
        .with_session_name(config.settings.session_name.clone());
    let mut login = None;

    match mode {
        AuthMode::App => {
            let code = cli
                .code
                .clone()
                .or_else(|| profile.and_then(|p| p.code.clone()));
            if let Some(code) = code {
                let key = match (&cli.key, profile) {
                    (Some(key), _) => key.clone(),
                    (None, Some(profile)) => lookup_key(&profile.name)?,
                    (None, None) => {
                        return Err(api::ApiError::MissingCredentials(
                            "an app code was given without an app key".to_string(),
                        )
                        .into())
                    }
                };
                client = client.with_credentials(Credentials::app(code, key));
            }
        }
        AuthMode::Session => {
            let account = cli
                .account
                .clone()
                .or_else(|| profile.and_then(|p| p.account.clone()));
            match (account, &cli.password) {
                (Some(account), Some(password)) => login = Some((account, password.clone())),
                _ => {
                    return Err(api::ApiError::MissingCredentials(
                        "session mode needs --account and --password".to_string(),
                    )
                    .into())
                }
            }
        }
    }

    debug!(mode = %mode, profile = ?profile.map(|p| &p.name), "Resolved connection");
    Ok(Connection { client, login })
}

/// Parse a method name given on the command line.
fn parse_method(method: &str) -> Result<Method> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| AppError::other(format!("Invalid HTTP method '{}'", method)))
}

/// Parse a JSON body given on the command line.
fn parse_body(data: &str) -> Result<serde_json::Value> {
    serde_json::from_str(data).map_err(|e| AppError::other(format!("Invalid JSON body: {}", e)))
}

/// Run the selected subcommand, writing response bodies to `out`.
pub async fn run<W: Write>(cli: Cli, out: &mut W) -> Result<()> {
    match &cli.command {
        Command::Translate { method, path } => {
            let call = api::translate(&parse_method(method)?, path)?;
            writeln!(out, "{}", call.query())?;
            for (key, value) in &call.params {
                writeln!(out, "{}={}", key, value)?;
            }
            Ok(())
        }
        Command::StoreKey => {
            let config = load_config(&cli)?;
            let profile = match &cli.profile {
                Some(name) => config.profile(name)?,
                None => config
                    .default_profile()
                    .ok_or_else(|| AppError::other("No profile selected: pass --profile."))?,
            };
            let key = cli
                .key
                .as_deref()
                .ok_or_else(|| AppError::other("Pass the app key with --key or ZENTAO_APP_KEY."))?;
            auth::store_app_key(&profile.name, key)?;
            info!(profile = %profile.name, "App key stored in keyring");
            writeln!(out, "Stored app key for profile '{}'.", profile.name)?;
            Ok(())
        }
        Command::Login => {
            let (_client, logged_in) = connect(&cli).await?;
            if !logged_in {
                return Err(AppError::other("Login needs --auth-mode session."));
            }
            writeln!(out, "Logged in.")?;
            Ok(())
        }
        Command::Get { path } => {
            let (client, _) = connect(&cli).await?;
            write_body(out, &client.get(path).await?)
        }
        Command::Post { path, data } => {
            let body = parse_body(data)?;
            let (client, _) = connect(&cli).await?;
            write_body(out, &client.post(path, &body).await?)
        }
        Command::Put { path, data } => {
            let body = parse_body(data)?;
            let (client, _) = connect(&cli).await?;
            write_body(out, &client.put(path, &body).await?)
        }
        Command::Delete { path } => {
            let (client, _) = connect(&cli).await?;
            write_body(out, &client.delete(path).await?)
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    Ok(match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    })
}

/// Build the client, logging in first in session mode.
///
/// Returns whether a login happened.
async fn connect(cli: &Cli) -> Result<(ZentaoClient, bool)> {
    let config = load_config(cli)?;
    let connection = resolve_connection(cli, &config, auth::get_app_key)?;
    let client = ZentaoClient::new(connection.client)?;

    match &connection.login {
        Some((account, password)) => {
            client.login(account, password).await?;
            Ok((client, true))
        }
        None => Ok((client, false)),
    }
}

fn write_body<W: Write>(out: &mut W, body: &[u8]) -> Result<()> {
    out.write_all(body)?;
    writeln!(out)?;
    Ok(())
}
