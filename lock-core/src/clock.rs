//! Time source abstraction
//!
//! The release gate compares against an injected clock rather than ambient
//! time, keeping lock/release deterministic under test.

use parking_lot::Mutex;

/// Ambient current time in seconds since the Unix epoch
pub trait Clock: Send + Sync {
    /// Current timestamp (seconds)
    fn now(&self) -> i64;
}

/// Wall-clock time
#[derive(Debug, Default, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Manually advanced clock for tests
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<i64>,
}

impl ManualClock {
    /// Create a clock frozen at `now`
    pub fn new(now: i64) -> Self {
        Self { now: Mutex::new(now) }
    }

    /// Move the clock forward by `seconds`
    pub fn advance(&self, seconds: i64) {
        *self.now.lock() += seconds;
    }

    /// Jump the clock to an absolute timestamp
    pub fn set(&self, now: i64) {
        *self.now.lock() = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        *self.now.lock()
    }
}
