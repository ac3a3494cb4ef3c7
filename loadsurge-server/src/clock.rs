//! Time source abstraction
//!
//! Every wall-clock read in the engine goes through [`Clock`] so tests can
//! drive a run through its full duration on tokio's paused timer instead of
//! waiting it out in real time.

use std::time::{SystemTime, UNIX_EPOCH};

/// Source of "now" in Unix milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Production clock backed by [`SystemTime`].
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    }
}

/// Test clock: a fixed epoch plus tokio's (pausable) monotonic time.
///
/// Under `#[tokio::test(start_paused = true)]` the returned milliseconds
/// advance with the virtual timer, so sleeps inside the engine fast-forward
/// deterministically.
#[cfg(test)]
pub struct SimClock {
    epoch_ms: u64,
    origin: tokio::time::Instant,
}

#[cfg(test)]
impl SimClock {
    pub fn new(epoch_ms: u64) -> Self {
        Self {
            epoch_ms,
            origin: tokio::time::Instant::now(),
        }
    }
}

#[cfg(test)]
impl Clock for SimClock {
    fn now_ms(&self) -> u64 {
        self.epoch_ms + self.origin.elapsed().as_millis() as u64
    }
}
