//! ZenTao API client implementation.
//!
//! This module provides the client callers use to reach the ZenTao API. It
//! translates REST-style paths into module/function calls, attaches
//! authentication, and recovers from expired tokens with a single retry.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::{header, Client, Method, StatusCode};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use super::auth::{Credentials, DEFAULT_SESSION_NAME};
use super::clock::TimestampSource;
use super::error::{ApiError, Result};
use super::token_cache::TokenCache;
use super::translate::translate;
use super::types::{Inspection, LoginRequest, LoginResponse};
use super::url::build_url;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Header carrying the session value in session mode.
const SESSION_HEADER: &str = "Token";

/// Path of the login endpoint, relative to the base URL.
const LOGIN_PATH: &str = "/tokens";

/// Settings a client is constructed from.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// The ZenTao API entry point, e.g. `https://zentao.example.com/api.php`.
    pub base_url: String,
    /// Initial credentials; `None` for unauthenticated calls.
    pub credentials: Option<Credentials>,
    /// Upper bound for every HTTP call.
    pub timeout: Duration,
    /// Query parameter name used for the session after [`ZentaoClient::login`].
    pub session_name: String,
}

impl ClientConfig {
    /// Create a configuration with no credentials and default settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            credentials: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            session_name: DEFAULT_SESSION_NAME.to_string(),
        }
    }

    /// Set the initial credentials.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the session query parameter name.
    pub fn with_session_name(mut self, name: impl Into<String>) -> Self {
        self.session_name = name.into();
        self
    }
}

/// The ZenTao API client.
///
/// Safe to share between tasks; wrap it in an `Arc` to do so. Credentials can
/// be switched at any time and take effect on the next request.
#[derive(Debug)]
pub struct ZentaoClient {
    /// The HTTP client.
    client: Client,
    /// The base URL, without trailing slashes.
    base_url: String,
    /// Session query parameter name used after login.
    session_name: String,
    /// Current credentials.
    credentials: RwLock<Option<Credentials>>,
    /// Timestamp source shared with the token cache.
    timestamps: Arc<TimestampSource>,
    /// Derived app-credential tokens.
    tokens: TokenCache,
}

impl ZentaoClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The base URL cannot be parsed
    /// - The initial credentials are incomplete
    /// - The HTTP client cannot be built
    #[instrument(skip(config), fields(base_url = %config.base_url))]
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::with_timestamps(config, Arc::new(TimestampSource::new()))
    }

    /// Create a new client drawing timestamps from an existing source.
    pub fn with_timestamps(config: ClientConfig, timestamps: Arc<TimestampSource>) -> Result<Self> {
        let base_url = normalize_base_url(&config.base_url)?;
        if let Some(credentials) = &config.credentials {
            validate_credentials(credentials)?;
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ApiError::Network)?;

        info!(
            mode = ?config.credentials.as_ref().map(Credentials::mode),
            timeout_secs = config.timeout.as_secs(),
            "ZenTao client created"
        );

        Ok(Self {
            client,
            base_url,
            session_name: config.session_name,
            credentials: RwLock::new(config.credentials),
            tokens: TokenCache::new(timestamps.clone()),
            timestamps,
        })
    }

    /// Replace the current credentials.
    ///
    /// Any token derived from the previous credentials is discarded.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::MissingCredentials` if a required field is empty.
    pub fn set_credentials(&self, credentials: Credentials) -> Result<()> {
        validate_credentials(&credentials)?;
        info!(mode = %credentials.mode(), "Switching credentials");
        *self.credentials.write().unwrap_or_else(|e| e.into_inner()) = Some(credentials);
        self.tokens.force_token_refresh();
        Ok(())
    }

    /// Drop the current credentials; later requests are unauthenticated.
    pub fn clear_credentials(&self) {
        *self.credentials.write().unwrap_or_else(|e| e.into_inner()) = None;
        self.tokens.force_token_refresh();
    }

    /// A copy of the current credentials.
    pub fn credentials(&self) -> Option<Credentials> {
        self.credentials
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// The token cache backing app-credential requests.
    pub fn token_cache(&self) -> &TokenCache {
        &self.tokens
    }

    /// The client's monotonic timestamp source.
    pub fn timestamps(&self) -> &TimestampSource {
        &self.timestamps
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Log in with an account and password and switch to session mode.
    ///
    /// Calls `POST {base}/tokens` without authentication.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the server rejects the
    /// credentials, or the response carries no token.
    #[instrument(skip(self, password))]
    pub async fn login(&self, account: &str, password: &str) -> Result<()> {
        let url = build_url(
            &self.base_url,
            LOGIN_PATH,
            &BTreeMap::new(),
            None,
            &self.tokens,
        );
        let body = serde_json::to_vec(&LoginRequest { account, password })?;

        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!("Login request failed: {}", e);
                ApiError::Network(e)
            })?;

        let status = response.status();
        let bytes = response.bytes().await?;
        let bytes = into_result(status, bytes.to_vec())?;

        let token = serde_json::from_slice::<LoginResponse>(&bytes)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse login response: {}", e)))?
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::InvalidResponse("login response has no token".to_string()))?;

        self.set_credentials(Credentials::Session {
            name: self.session_name.clone(),
            value: token,
        })?;

        info!("Logged in");
        Ok(())
    }

    /// Perform a GET request and return the raw response body.
    pub async fn get(&self, path: &str) -> Result<Vec<u8>> {
        self.execute(Method::GET, path, None).await
    }

    /// Perform a GET request and deserialize the response body.
    pub async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let bytes = self.get(path).await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }

    /// Perform a POST request with a JSON body and return the raw response body.
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Vec<u8>> {
        let body = serde_json::to_vec(body)?;
        self.execute(Method::POST, path, Some(body)).await
    }

    /// Perform a PUT request with a JSON body and return the raw response body.
    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Vec<u8>> {
        let body = serde_json::to_vec(body)?;
        self.execute(Method::PUT, path, Some(body)).await
    }

    /// Perform a DELETE request and return the raw response body.
    pub async fn delete(&self, path: &str) -> Result<Vec<u8>> {
        self.execute(Method::DELETE, path, None).await
    }

    /// Translate, send, and retry once if the token was rejected as expired.
    ///
    /// The second outcome is returned as-is, whatever it is.
    #[instrument(skip(self, body), fields(method = %method, path = %path))]
    async fn execute(&self, method: Method, path: &str, body: Option<Vec<u8>>) -> Result<Vec<u8>> {
        let call = translate(&method, path)?;
        let query = call.query();
        debug!(module = call.module, function = call.function, "Translated request");

        let (status, bytes) = self.send(&method, &query, &call.params, body.as_deref()).await?;

        if !Inspection::inspect(&bytes).is_token_expired() {
            return into_result(status, bytes);
        }

        warn!(%status, "Token rejected as expired, refreshing and retrying once");
        self.tokens.force_token_refresh();

        let (status, bytes) = self.send(&method, &query, &call.params, body.as_deref()).await?;
        if Inspection::inspect(&bytes).is_token_expired() {
            warn!(%status, "Token rejected again after refresh");
        }
        into_result(status, bytes)
    }

    /// Build the URL from the current credentials and send a single request.
    async fn send(
        &self,
        method: &Method,
        query: &str,
        params: &BTreeMap<String, String>,
        body: Option<&[u8]>,
    ) -> Result<(StatusCode, Vec<u8>)> {
        let credentials = self.credentials();
        let url = build_url(&self.base_url, query, params, credentials.as_ref(), &self.tokens);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(Credentials::Session { value, .. }) = &credentials {
            request = request.header(SESSION_HEADER, value);
        }
        if let Some(body) = body {
            request = request.body(body.to_vec());
        }

        let response = request.send().await.map_err(|e| {
            error!("Request failed: {}", e);
            ApiError::Network(e)
        })?;

        let status = response.status();
        let bytes = response.bytes().await?;
        debug!(%status, len = bytes.len(), "Received response");
        Ok((status, bytes.to_vec()))
    }
}

/// Map a response to the caller-facing result.
///
/// Success statuses return the body; anything else becomes a status error
/// carrying the body text.
fn into_result(status: StatusCode, bytes: Vec<u8>) -> Result<Vec<u8>> {
    if status.is_success() {
        Ok(bytes)
    } else {
        let body = String::from_utf8_lossy(&bytes);
        debug!("Error response body: {}", body);
        Err(ApiError::from_status(status, &body))
    }
}

fn validate_credentials(credentials: &Credentials) -> Result<()> {
    match credentials {
        Credentials::AppCredential { code, key } if code.is_empty() || key.is_empty() => Err(
            ApiError::MissingCredentials("app code and app key are both required".to_string()),
        ),
        Credentials::Session { name, value } if name.is_empty() || value.is_empty() => Err(
            ApiError::MissingCredentials("session name and value are both required".to_string()),
        ),
        _ => Ok(()),
    }
}

/// Validate the base URL and strip trailing slashes.
fn normalize_base_url(url: &str) -> Result<String> {
    let url = url.trim_end_matches('/');

    reqwest::Url::parse(url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", url, e)))?;

    // Warn if not HTTPS (but don't enforce for localhost/testing)
    if !url.starts_with("https://") && !url.contains("localhost") && !url.contains("127.0.0.1") {
        warn!("URL does not use HTTPS: {}. This is insecure for production use.", url);
    }

    Ok(url.to_string())
}
