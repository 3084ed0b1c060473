//! Short-lived cache for derived app-credential tokens.
//!
//! ZenTao honours a token for 30 seconds. Tokens are reused for half of that
//! so that clock skew and request latency never push a cached token past the
//! server's window.

use std::sync::{Arc, Mutex, MutexGuard};

use md5::{Digest, Md5};
use tracing::{debug, trace};

use super::clock::TimestampSource;
use super::token::generate_token;

/// How long a derived token is reused, in seconds.
pub const CACHE_DURATION_SECS: u64 = 15;

/// Percentage of [`CACHE_DURATION_SECS`] after which a token counts as close to expiry.
const CLOSE_TO_EXPIRY_PERCENT: u64 = 80;

/// A derived token and the timestamp it was derived for.
///
/// An empty token with a zero timestamp means nothing is cached.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CachedToken {
    /// The hex token.
    pub token: String,
    /// The `time` value the token was derived for.
    pub timestamp: u64,
    /// Digest of the code and key the token was derived from.
    owner: Option<[u8; 16]>,
}

impl CachedToken {
    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.token.is_empty()
    }

    fn belongs_to(&self, owner: &[u8; 16]) -> bool {
        self.owner.as_ref() == Some(owner)
    }
}

/// Identify a code/key pair without keeping the key itself.
fn credential_digest(code: &str, key: &str) -> [u8; 16] {
    let mut hasher = Md5::new();
    hasher.update(code.as_bytes());
    hasher.update([0u8]);
    hasher.update(key.as_bytes());
    let mut digest = [0u8; 16];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

impl std::fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedToken")
            .field("token", &if self.is_empty() { "<empty>" } else { "<redacted>" })
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

/// Thread-safe holder of the most recently derived token.
#[derive(Debug)]
pub struct TokenCache {
    timestamps: Arc<TimestampSource>,
    current: Mutex<CachedToken>,
}

impl TokenCache {
    /// Create an empty cache that draws timestamps from `timestamps`.
    pub fn new(timestamps: Arc<TimestampSource>) -> Self {
        Self {
            timestamps,
            current: Mutex::new(CachedToken::default()),
        }
    }

    /// Return the cached token, deriving a fresh one when it is absent, stale,
    /// or was derived from a different code and key.
    ///
    /// Concurrent callers that all observe a stale cache may each derive a
    /// token; every one of them is valid for its own timestamp and the last
    /// writer wins.
    pub fn get_cached_token(&self, code: &str, key: &str) -> CachedToken {
        let owner = credential_digest(code, key);
        {
            let current = self.lock();
            if !current.is_empty()
                && current.belongs_to(&owner)
                && self.age(&current) <= CACHE_DURATION_SECS
            {
                trace!(timestamp = current.timestamp, "Reusing cached token");
                return current.clone();
            }
        }

        let timestamp = self.timestamps.next();
        let fresh = CachedToken {
            token: generate_token(code, key, timestamp),
            timestamp,
            owner: Some(owner),
        };
        debug!(timestamp, "Derived new token");

        *self.lock() = fresh.clone();
        fresh
    }

    /// Whether the cached token is absent or has used up most of its lifetime.
    pub fn is_token_close_to_expiry(&self) -> bool {
        let current = self.lock();
        current.is_empty()
            || self.age(&current) * 100 >= CACHE_DURATION_SECS * CLOSE_TO_EXPIRY_PERCENT
    }

    /// Drop the cached token unconditionally.
    pub fn force_token_refresh(&self) {
        *self.lock() = CachedToken::default();
        debug!("Token cache cleared");
    }

    /// A copy of the current cache contents.
    pub fn snapshot(&self) -> CachedToken {
        self.lock().clone()
    }

    fn age(&self, cached: &CachedToken) -> u64 {
        // Issued timestamps can run ahead of the wall clock after collisions.
        self.timestamps.now().saturating_sub(cached.timestamp)
    }

    fn lock(&self) -> MutexGuard<'_, CachedToken> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::clock::ManualClock;

    fn cache_at(secs: u64) -> (Arc<ManualClock>, TokenCache) {
        let clock = ManualClock::at(secs);
        let timestamps = Arc::new(TimestampSource::with_clock(clock.clone()));
        (clock, TokenCache::new(timestamps))
    }

    #[test]
    fn test_new_cache_is_empty() {
        let (_clock, cache) = cache_at(1_000);
        let snapshot = cache.snapshot();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.timestamp, 0);
    }

    #[test]
    fn test_get_cached_token_populates_cache() {
        let (_clock, cache) = cache_at(1_000);

        let token = cache.get_cached_token("app", "secret");

        assert_eq!(token.timestamp, 1_000);
        assert_eq!(token.token, generate_token("app", "secret", 1_000));
        assert_eq!(cache.snapshot(), token);
    }

    #[test]
    fn test_token_reused_within_cache_duration() {
        let (clock, cache) = cache_at(1_000);

        let first = cache.get_cached_token("app", "secret");
        clock.advance(14);
        let second = cache.get_cached_token("app", "secret");

        assert_eq!(first, second);
    }

    #[test]
    fn test_token_reused_at_exact_cache_duration() {
        let (clock, cache) = cache_at(1_000);

        let first = cache.get_cached_token("app", "secret");
        clock.advance(CACHE_DURATION_SECS);
        let second = cache.get_cached_token("app", "secret");

        assert_eq!(first, second);
    }

    #[test]
    fn test_token_regenerated_after_cache_duration() {
        let (clock, cache) = cache_at(1_000);

        let first = cache.get_cached_token("app", "secret");
        clock.advance(16);
        let second = cache.get_cached_token("app", "secret");

        assert_ne!(first, second);
        assert_eq!(second.timestamp, 1_016);
    }

    #[test]
    fn test_close_to_expiry_when_empty() {
        let (_clock, cache) = cache_at(1_000);
        assert!(cache.is_token_close_to_expiry());
    }

    #[test]
    fn test_not_close_to_expiry_when_fresh() {
        let (_clock, cache) = cache_at(1_000);
        cache.get_cached_token("app", "secret");
        assert!(!cache.is_token_close_to_expiry());
    }

    #[test]
    fn test_close_to_expiry_threshold() {
        let (clock, cache) = cache_at(1_000);
        cache.get_cached_token("app", "secret");

        clock.set(1_011);
        assert!(!cache.is_token_close_to_expiry());

        // 80% of 15 seconds
        clock.set(1_012);
        assert!(cache.is_token_close_to_expiry());

        clock.set(1_013);
        assert!(cache.is_token_close_to_expiry());
    }

    #[test]
    fn test_force_token_refresh_clears_cache() {
        let (_clock, cache) = cache_at(1_000);
        cache.get_cached_token("app", "secret");

        cache.force_token_refresh();

        let snapshot = cache.snapshot();
        assert_eq!(snapshot.token, "");
        assert_eq!(snapshot.timestamp, 0);
        assert!(cache.is_token_close_to_expiry());
    }

    #[test]
    fn test_force_token_refresh_on_empty_cache() {
        let (_clock, cache) = cache_at(1_000);
        cache.force_token_refresh();
        assert_eq!(cache.snapshot(), CachedToken::default());
    }

    #[test]
    fn test_refresh_after_force_uses_new_timestamp() {
        let (_clock, cache) = cache_at(1_000);

        let first = cache.get_cached_token("app", "secret");
        cache.force_token_refresh();
        let second = cache.get_cached_token("app", "secret");

        // Wall clock has not moved, so the source bumps the timestamp
        assert_eq!(second.timestamp, first.timestamp + 1);
        assert_ne!(first.token, second.token);
    }

    #[test]
    fn test_token_not_reused_for_other_credentials() {
        let (_clock, cache) = cache_at(1_000);

        let old = cache.get_cached_token("old", "k1");
        let new = cache.get_cached_token("new", "k2");

        assert_ne!(old.token, new.token);
        assert_eq!(new.token, generate_token("new", "k2", new.timestamp));
        assert_eq!(cache.snapshot(), new);
    }

    #[test]
    fn test_token_not_reused_when_only_key_changes() {
        let (_clock, cache) = cache_at(1_000);

        cache.get_cached_token("app", "k1");
        let rotated = cache.get_cached_token("app", "k2");

        assert_eq!(rotated.token, generate_token("app", "k2", rotated.timestamp));
    }

    #[test]
    fn test_debug_output_redacts_token() {
        let (_clock, cache) = cache_at(1_000);
        let token = cache.get_cached_token("app", "secret");

        let debug_output = format!("{:?}", cache);
        assert!(!debug_output.contains(&token.token));
    }
}
