//! Time oracle.
//!
//! The engine reads the clock once at the start of every operation and
//! never expects two reads within one operation to agree.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use granary_types::Timestamp;

/// A source of the current time in Unix seconds.
///
/// Implementations must be monotonically non-decreasing.
pub trait Clock {
    /// Current time in Unix seconds.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying time, so a test can keep a handle
/// while the engine owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    /// Move the clock forward by `secs`.
    pub fn advance(&self, secs: u64) {
        let prev = self.now.fetch_add(secs, Ordering::SeqCst);
        tracing::trace!(from = prev, by = secs, "manual clock advanced");
    }

    /// Jump to `time`. Moving backwards is ignored.
    pub fn set(&self, time: Timestamp) {
        self.now.fetch_max(time, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}
