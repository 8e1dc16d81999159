//! # Controller Clock
//!
//! Millisecond time source for the detector. Timestamps are `u32` and wrap
//! every ~49.7 days, matching the 32-bit `current` field a KCP-style host
//! keeps; every comparison goes through [`time_diff`].

use quanta::Instant;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Signed difference `later - earlier` between two wrapping ms timestamps.
#[inline]
pub fn time_diff(later: u32, earlier: u32) -> i32 {
    later.wrapping_sub(earlier) as i32
}

/// Source of controller-local monotonic milliseconds.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

// ─── MonotonicClock ─────────────────────────────────────────────────────────

/// Millisecond clock backed by `quanta`, counted from construction.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        MonotonicClock {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u32 {
        let elapsed = self.epoch.elapsed();
        // 32-bit timestamp domain wraps.
        (elapsed.as_millis() as u64 & 0xFFFF_FFFF) as u32
    }
}

// ─── ManualClock ────────────────────────────────────────────────────────────

/// Hand-driven clock for tests and simulation.
///
/// Clones share the same counter, so a test can keep one handle while the
/// controller owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU32>,
}

impl ManualClock {
    pub fn new(start_ms: u32) -> Self {
        ManualClock {
            now: Arc::new(AtomicU32::new(start_ms)),
        }
    }

    /// Move time forward by `ms` (wrapping).
    pub fn advance(&self, ms: u32) {
        self.now.fetch_add(ms, Ordering::Relaxed);
    }

    pub fn set(&self, ms: u32) {
        self.now.store(ms, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u32 {
        self.now.load(Ordering::Relaxed)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}
