//! Process-wide request-start rate cap
//!
//! A sliding window over the last second of accepted request starts. This is
//! a generator-side protection for downstream targets: no matter how many
//! tests run concurrently, the process as a whole will not start more than
//! [`MAX_STARTS_PER_WINDOW`] requests per rolling second. Workers that are
//! refused admission back off and retry; nothing is ever dropped.

use std::collections::VecDeque;
use std::sync::Mutex;

/// Maximum accepted request starts per rolling window.
pub const MAX_STARTS_PER_WINDOW: usize = 500;

/// Width of the sliding window in milliseconds.
pub const WINDOW_MS: u64 = 1_000;

/// How long a refused worker sleeps before retrying admission.
pub const BACKOFF_MS: u64 = 20;

/// Sliding-window admission gate over request start timestamps.
///
/// Timestamps are injected by the caller, so admission logic is synchronous
/// and deterministic under test.
pub struct SlidingWindowLimiter {
    window: Mutex<VecDeque<u64>>,
}

impl SlidingWindowLimiter {
    pub fn new() -> Self {
        Self {
            window: Mutex::new(VecDeque::with_capacity(MAX_STARTS_PER_WINDOW)),
        }
    }

    /// Try to admit one request start at `now_ms`.
    ///
    /// Evicts timestamps that have fallen out of the window, then admits if
    /// fewer than [`MAX_STARTS_PER_WINDOW`] remain, recording `now_ms` on
    /// admission.
    pub fn try_admit(&self, now_ms: u64) -> bool {
        // A poisoned window still holds valid timestamps.
        let mut window = match self.window.lock() {
            Ok(window) => window,
            Err(poisoned) => poisoned.into_inner(),
        };

        // Only timestamps strictly older than the window go; an entry
        // exactly one window old still counts.
        let cutoff = now_ms.saturating_sub(WINDOW_MS);
        while window.front().is_some_and(|&t| t < cutoff) {
            window.pop_front();
        }

        if window.len() < MAX_STARTS_PER_WINDOW {
            window.push_back(now_ms);
            true
        } else {
            false
        }
    }
}

impl Default for SlidingWindowLimiter {
    fn default() -> Self {
        Self::new()
    }
}
