//! Monotonic time adapter.
//!
//! Implements [`ClockPort`] on top of `std::time::Instant`.  The origin is
//! the moment the adapter was created, so readings start near zero.

use std::time::{Duration, Instant};

use crate::app::ports::ClockPort;

/// Host monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Time left until `deadline_ms`, zero if it has already passed.
    pub fn until(&self, deadline_ms: u64) -> Duration {
        Duration::from_millis(deadline_ms.saturating_sub(self.now_ms()))
    }
}

impl ClockPort for MonotonicClock {
    fn now_ms(&self) -> u64 {
        // u64 milliseconds covers far longer than any process lifetime.
        self.start.elapsed().as_millis() as u64
    }
}
