//! Final request URL assembly.

use std::collections::BTreeMap;

use tracing::debug;

use super::auth::Credentials;
use super::token_cache::TokenCache;

/// Build the absolute URL for a call.
///
/// With app credentials, `code`, `time` and `token` are appended ahead of
/// `extra`, refreshing the cached token first if it is close to expiry.
/// With a session, the session parameter is appended instead and no token
/// is derived. Without credentials only `extra` is appended, so an empty
/// `extra` yields `base_url + query` untouched.
pub fn build_url(
    base_url: &str,
    query: &str,
    extra: &BTreeMap<String, String>,
    credentials: Option<&Credentials>,
    tokens: &TokenCache,
) -> String {
    let mut url = format!("{}{}", base_url, query);

    match credentials {
        Some(Credentials::AppCredential { code, key }) => {
            if tokens.is_token_close_to_expiry() {
                debug!("Token close to expiry, refreshing before request");
                tokens.force_token_refresh();
            }
            let cached = tokens.get_cached_token(code, key);
            append_param(&mut url, "code", code);
            append_param(&mut url, "time", &cached.timestamp.to_string());
            append_param(&mut url, "token", &cached.token);
        }
        Some(Credentials::Session { name, value }) => {
            append_param(&mut url, name, value);
        }
        None => {}
    }

    for (key, value) in extra {
        append_param(&mut url, key, value);
    }

    url
}

fn append_param(url: &mut String, key: &str, value: &str) {
    url.push(if url.contains('?') { '&' } else { '?' });
    url.push_str(&urlencoding::encode(key));
    url.push('=');
    url.push_str(&urlencoding::encode(value));
}
