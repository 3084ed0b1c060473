//! Signed token derivation for app-credential authentication.
//!
//! ZenTao accepts `code`, `time` and `token` query parameters where `token`
//! is the MD5 digest of the app code, the app key and the timestamp
//! concatenated in that order.

use md5::{Digest, Md5};

/// Derive the hex-encoded token for an app code, app key and timestamp.
///
/// The result is always 32 lowercase hex characters. Empty inputs are not
/// rejected; the server decides whether the credentials are valid.
pub fn generate_token(code: &str, key: &str, timestamp: u64) -> String {
    let mut hasher = Md5::new();
    hasher.update(code.as_bytes());
    hasher.update(key.as_bytes());
    hasher.update(timestamp.to_string().as_bytes());
    hex::encode(hasher.finalize())
}
