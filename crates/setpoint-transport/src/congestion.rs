//! # Delay-Gated Congestion Condition Detector
//!
//! Classifies the path on every RTT sample and resizes the sender window on
//! GOOD/BAD edges.
//!
//! ## State Machine
//!
//! ```text
//!                 rtt < setpoint
//!        ┌───────────────────────────────┐
//!        │                               ▼
//!   ┌────┴─────┐   rtt ≥ setpoint   ┌──────────┐
//!   │  NORMAL  │◀───────────────────│   GOOD   │◀──┐ rtt < setpoint
//!   └────┬─────┘  (one-shot, arms   └──────────┘───┘ (cwnd += …)
//!        │         next_check)            ▲
//!   now > next_check                      │ rtt < setpoint
//!        │         ┌──────────┐           │
//!        └────────▶│   BAD    │───────────┘
//!                  │ (cwnd ↓) │◀──┐ now > next_check
//!                  └──────────┘───┘ (interval / √n)
//! ```
//!
//! ## Setpoint
//!
//! `setpoint = ⌊min_rtt × gain⌋ + 1`. `min_rtt` is a running minimum that
//! expires after one second; `gain` is retuned every 500 ms from the mean
//! RTT against the configured target latency.
//!
//! All timestamps are wrapping `u32` milliseconds supplied by the caller;
//! nothing in here reads a clock or performs I/O.

use serde::Serialize;

use crate::clock::time_diff;
use crate::window::{SendWindow, THRESH_MIN};

/// Lower gain bound.
pub const MIN_GAIN: f64 = 1.0;
/// Upper gain bound.
pub const MAX_GAIN: f64 = 10.0;
/// Minimum spacing between gain tuning passes (ms).
pub const GAIN_UPDATE_INTERVAL_MS: i32 = 500;
/// Age after which the stored minimum RTT is replaced by the next sample (ms).
pub const MIN_RTT_EXPIRY_MS: i32 = 1000;

/// Clamp a gain into `[MIN_GAIN, MAX_GAIN]`. NaN maps to `MIN_GAIN`.
pub fn clamp_gain(gain: f64) -> f64 {
    if gain.is_nan() {
        MIN_GAIN
    } else {
        gain.clamp(MIN_GAIN, MAX_GAIN)
    }
}

// ─── Condition ──────────────────────────────────────────────────────────────

/// Path classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    /// RTT below the setpoint; grow the window.
    Good,
    /// Cooldown right after leaving GOOD.
    Normal,
    /// RTT stuck at or above the setpoint; back off.
    Bad,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Good => "good",
            Condition::Normal => "normal",
            Condition::Bad => "bad",
        }
    }
}

/// What a single detection step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    Good,
    Normal,
    Bad,
    /// No transition this tick; window untouched.
    Unchanged,
}

/// Outcome of a completed gain tuning pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GainAdjustment {
    pub previous: f64,
    pub current: f64,
    /// Mean RTT over the tuning period (ms).
    pub avg_rtt: u32,
}

/// Result of [`ControllerState::detect`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Detection {
    pub transition: Transition,
    pub condition: Condition,
    pub rtt: u32,
    pub target: u32,
    pub setpoint: u32,
    pub gain: f64,
    pub min_rtt: u32,
    pub avg_rtt: u32,
    pub gain_adjustment: Option<GainAdjustment>,
}

// ─── Controller State ───────────────────────────────────────────────────────

/// Per-connection detector state.
///
/// Owned by exactly one connection and mutated only from its serialized
/// update path.
#[derive(Debug, Clone)]
pub struct ControllerState {
    enabled: bool,
    /// Controller-local time of the sample being processed.
    now: u32,
    gain: f64,
    target_latency: u32,
    gain_update_time: u32,

    min_rtt: u32,
    min_rtt_update_time: u32,
    rtt_sum: u64,
    rtt_count: u32,

    condition: Condition,
    first_good_seen: bool,
    bad_backoff_counter: u32,
    detection_interval: u32,
    next_check_time: u32,
    setpoint: u32,
}

impl ControllerState {
    /// Create a disabled controller. `now` seeds the tuning timer.
    pub fn new(now: u32) -> Self {
        ControllerState {
            enabled: false,
            now,
            gain: MIN_GAIN,
            target_latency: 0,
            gain_update_time: now,

            min_rtt: 0,
            min_rtt_update_time: 0,
            rtt_sum: 0,
            rtt_count: 0,

            condition: Condition::Normal,
            first_good_seen: false,
            bad_backoff_counter: 0,
            detection_interval: 0,
            next_check_time: 0,
            setpoint: 0,
        }
    }

    // ─── Getters ────────────────────────────────────────────────────────

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn target_latency(&self) -> u32 {
        self.target_latency
    }

    pub fn min_rtt(&self) -> u32 {
        self.min_rtt
    }

    pub fn condition(&self) -> Condition {
        self.condition
    }

    /// Setpoint computed for the most recent sample (0 before any sample).
    pub fn setpoint(&self) -> u32 {
        self.setpoint
    }

    pub fn detection_interval(&self) -> u32 {
        self.detection_interval
    }

    pub fn next_check_time(&self) -> u32 {
        self.next_check_time
    }

    pub fn bad_backoff_counter(&self) -> u32 {
        self.bad_backoff_counter
    }

    pub fn first_good_seen(&self) -> bool {
        self.first_good_seen
    }

    /// Mean of the samples accumulated since the last tuning pass.
    pub fn avg_rtt(&self) -> u32 {
        if self.rtt_count == 0 {
            0
        } else {
            (self.rtt_sum / self.rtt_count as u64) as u32
        }
    }

    // ─── Configuration ──────────────────────────────────────────────────

    /// Enable/disable the detector and retune it. Gain is clamped, never
    /// rejected. The window is not touched.
    pub fn configure(&mut self, enable: bool, gain: f64, target_latency: u32) {
        self.enabled = enable;
        self.gain = clamp_gain(gain);
        self.target_latency = target_latency;
    }

    // ─── Gain Tuner ─────────────────────────────────────────────────────

    /// Accumulate `rtt` and, at most once per 500 ms, move the gain toward
    /// the target latency. Returns the adjustment when a pass completed.
    fn tune_gain(&mut self, rtt: u32) -> Option<GainAdjustment> {
        self.rtt_sum = self.rtt_sum.saturating_add(rtt as u64);
        self.rtt_count = self.rtt_count.saturating_add(1);

        if time_diff(self.now, self.gain_update_time) < GAIN_UPDATE_INTERVAL_MS {
            return None;
        }
        self.gain_update_time = self.now;

        let avg_rtt = self.avg_rtt();
        let target = self.target_latency;
        let previous = self.gain;

        if avg_rtt == 0 {
            // Nothing meaningful to scale against; keep the gain.
        } else if avg_rtt <= target {
            let step = (target - avg_rtt) as f64 / (2.0 * avg_rtt as f64);
            self.gain = clamp_gain(self.gain + step);
        } else if target == 0 {
            self.gain = MIN_GAIN;
        } else {
            let step = 2.0 * (avg_rtt - target) as f64 / target as f64;
            self.gain = clamp_gain(self.gain - step);
        }

        self.rtt_sum = rtt as u64;
        self.rtt_count = 1;

        Some(GainAdjustment {
            previous,
            current: self.gain,
            avg_rtt,
        })
    }

    fn update_min_rtt(&mut self, rtt: u32) {
        if self.min_rtt == 0
            || rtt < self.min_rtt
            || time_diff(self.now, self.min_rtt_update_time) >= MIN_RTT_EXPIRY_MS
        {
            self.min_rtt = rtt;
            self.min_rtt_update_time = self.now;
        }
    }

    fn compute_setpoint(&self) -> u32 {
        // `as u32` saturates on overflow.
        ((self.min_rtt as f64 * self.gain) as u32).saturating_add(1)
    }

    // ─── Condition Detector ─────────────────────────────────────────────

    /// Process one RTT sample taken at `now`.
    ///
    /// Returns `None` while disabled (the condition stays frozen). On GOOD
    /// and BAD transitions the window is updated in place.
    pub fn detect<W: SendWindow + ?Sized>(
        &mut self,
        now: u32,
        rtt: u32,
        window: &mut W,
    ) -> Option<Detection> {
        if !self.enabled {
            return None;
        }

        self.now = now;
        self.update_min_rtt(rtt);
        let gain_adjustment = self.tune_gain(rtt);
        self.setpoint = self.compute_setpoint();

        let transition = if rtt < self.setpoint {
            self.condition = Condition::Good;
            self.detection_interval = self.setpoint;
            self.first_good_seen = true;
            self.bad_backoff_counter = 1;
            self.update_window(rtt, window);
            Transition::Good
        } else if self.first_good_seen {
            self.condition = Condition::Normal;
            self.first_good_seen = false;
            self.next_check_time = now.wrapping_add(self.detection_interval);
            Transition::Normal
        } else if time_diff(now, self.next_check_time) > 0 {
            self.condition = Condition::Bad;
            // Counter is 0 until the first GOOD; floor the divisor at 1.
            let divisor = ((self.bad_backoff_counter as f64).sqrt() as u32).max(1);
            let recheck = (self.detection_interval / divisor).max(1);
            self.next_check_time = now.wrapping_add(recheck);
            self.bad_backoff_counter = self.bad_backoff_counter.saturating_add(1);
            self.update_window(rtt, window);
            Transition::Bad
        } else {
            Transition::Unchanged
        };

        Some(Detection {
            transition,
            condition: self.condition,
            rtt,
            target: self.target_latency,
            setpoint: self.setpoint,
            gain: self.gain,
            min_rtt: self.min_rtt,
            avg_rtt: self.avg_rtt(),
            gain_adjustment,
        })
    }

    // ─── Window Updater ─────────────────────────────────────────────────

    /// Apply the current condition to the host window.
    ///
    /// GOOD grows `incr`/`cwnd` additively (bounded by `rmt_wnd`), BAD cuts
    /// `cwnd` to half the in-flight count, NORMAL is a no-op.
    pub fn update_window<W: SendWindow + ?Sized>(&self, rtt: u32, window: &mut W) {
        match self.condition {
            Condition::Normal => {}
            Condition::Good => {
                let mss = window.mss();
                let mut cwnd = window.cwnd();

                if rtt > 0 {
                    let growth = (mss as u64 * self.setpoint as u64)
                        / (cwnd.max(1) as u64 * rtt as u64);
                    let incr = (window.incr().max(mss) as u64)
                        .saturating_add(growth)
                        .min(u32::MAX as u64);
                    window.set_incr(incr as u32);

                    if (cwnd as u64 + 1) * mss as u64 <= incr {
                        cwnd = if mss > 0 {
                            ((incr + mss as u64 - 1) / mss as u64) as u32
                        } else {
                            (incr as u32).saturating_add(mss).saturating_sub(1)
                        };
                        window.set_cwnd(cwnd);
                    }
                }

                let rmt_wnd = window.rmt_wnd();
                if cwnd > rmt_wnd {
                    window.set_cwnd(rmt_wnd);
                    window.set_incr(rmt_wnd.saturating_mul(mss));
                }
            }
            Condition::Bad => {
                let ssthresh = (window.inflight() / 2).max(THRESH_MIN);
                window.set_ssthresh(ssthresh);
                window.set_cwnd(ssthresh);
                window.set_incr(ssthresh.saturating_mul(window.mss()));
            }
        }
    }
}

impl Default for ControllerState {
    fn default() -> Self {
        Self::new(0)
    }
}
