//! Second-granularity timestamps for token derivation.
//!
//! ZenTao rejects a `time` value it has already seen for the same app code,
//! so every timestamp handed out by a [`TimestampSource`] is strictly greater
//! than the previous one, even when the wall clock has not ticked.

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A source of wall-clock time in whole seconds since the Unix epoch.
pub trait WallClock: Send + Sync {
    /// Current wall-clock time in seconds.
    fn now_secs(&self) -> u64;
}

/// The system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs()
    }
}

/// Strictly increasing timestamp generator.
///
/// The read-compare-write of the last issued value happens under a single
/// lock, so concurrent callers never receive the same value.
pub struct TimestampSource {
    clock: Arc<dyn WallClock>,
    last: Mutex<u64>,
}

impl TimestampSource {
    /// Create a timestamp source backed by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a timestamp source backed by a custom wall clock.
    pub fn with_clock(clock: Arc<dyn WallClock>) -> Self {
        Self {
            clock,
            last: Mutex::new(0),
        }
    }

    /// Issue the next timestamp.
    ///
    /// Returns the wall-clock second, or `last + 1` when the wall clock has
    /// not moved past the previously issued value.
    pub fn next(&self) -> u64 {
        // The guarded value is a plain integer, so a poisoned lock still holds a valid value.
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let candidate = self.clock.now_secs();
        let issued = if candidate > *last { candidate } else { *last + 1 };
        *last = issued;
        issued
    }

    /// Current wall-clock time without issuing a timestamp.
    pub fn now(&self) -> u64 {
        self.clock.now_secs()
    }
}

impl Default for TimestampSource {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TimestampSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let last = *self.last.lock().unwrap_or_else(|e| e.into_inner());
        f.debug_struct("TimestampSource").field("last", &last).finish()
    }
}

/// A wall clock that only moves when told to.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ManualClock {
    now: std::sync::atomic::AtomicU64,
}

#[cfg(test)]
impl ManualClock {
    pub(crate) fn at(secs: u64) -> Arc<Self> {
        Arc::new(Self {
            now: std::sync::atomic::AtomicU64::new(secs),
        })
    }

    pub(crate) fn set(&self, secs: u64) {
        self.now.store(secs, std::sync::atomic::Ordering::SeqCst);
    }

    pub(crate) fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl WallClock for ManualClock {
    fn now_secs(&self) -> u64 {
        self.now.load(std::sync::atomic::Ordering::SeqCst)
    }
}
