use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Strictly monotonic wall-clock source.
///
/// Returns nanoseconds since the UNIX epoch, guaranteed to increase on
/// every call even when the wall clock stalls or steps backwards: LWW
/// timestamps taken within one execution must never tie accidentally.
pub struct MonotonicClock {
    last_ns: Mutex<u64>,
}

impl MonotonicClock {
    /// Create a clock starting from the current wall time.
    pub fn new() -> Self {
        Self {
            last_ns: Mutex::new(0),
        }
    }

    /// The next timestamp: wall-clock time, nudged forward if needed.
    pub fn now_ns(&self) -> u64 {
        let wall = Self::wall_clock_ns();
        let mut last = self.last_ns.lock().expect("lock poisoned");
        let next = wall.max(*last + 1);
        *last = next;
        next
    }

    fn wall_clock_ns() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}
