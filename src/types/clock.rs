//! Monotonic device time
//!
//! Timestamps are milliseconds since the clock was created so they fit in an
//! `AtomicU64` shared with the radio callback context.

use std::time::Duration;
use tokio::time::Instant;

/// Milliseconds since boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Time elapsed since `earlier`, zero if `earlier` is in the future.
    pub fn saturating_since(self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

/// Source of [`Timestamp`]s. Follows tokio's clock, so paused test time applies.
#[derive(Debug, Clone, Copy)]
pub struct DeviceClock {
    origin: Instant,
}

impl Default for DeviceClock {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }

    pub fn now(&self) -> Timestamp {
        Timestamp(self.origin.elapsed().as_millis() as u64)
    }
}
