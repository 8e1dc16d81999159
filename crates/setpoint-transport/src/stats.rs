//! # Controller Statistics
//!
//! Running counters for one connection's detector. Serializable for JSON
//! export alongside the host's own transport stats.

use serde::Serialize;

use crate::congestion::{Condition, Detection, Transition};

/// Aggregate detector statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ControllerStats {
    /// RTT samples classified.
    pub samples: u64,
    /// Samples dropped because the detector was disabled.
    pub samples_ignored: u64,
    /// GOOD transitions (one per sample below the setpoint).
    pub good: u64,
    /// GOOD → NORMAL cooldowns.
    pub normal: u64,
    /// BAD backoffs.
    pub bad: u64,
    /// Samples that changed nothing.
    pub unchanged: u64,
    /// Completed gain tuning passes.
    pub gain_adjustments: u64,
    /// Current condition.
    pub condition: Condition,
    /// Last RTT sample in ms.
    pub last_rtt: u32,
    /// Last setpoint in ms.
    pub last_setpoint: u32,
    /// Last gain.
    pub last_gain: f64,
    /// Last minimum RTT in ms.
    pub last_min_rtt: u32,
}

impl Default for ControllerStats {
    fn default() -> Self {
        ControllerStats {
            samples: 0,
            samples_ignored: 0,
            good: 0,
            normal: 0,
            bad: 0,
            unchanged: 0,
            gain_adjustments: 0,
            condition: Condition::Normal,
            last_rtt: 0,
            last_setpoint: 0,
            last_gain: 0.0,
            last_min_rtt: 0,
        }
    }
}

impl ControllerStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one detection step into the counters.
    pub fn record(&mut self, d: &Detection) {
        self.samples += 1;
        match d.transition {
            Transition::Good => self.good += 1,
            Transition::Normal => self.normal += 1,
            Transition::Bad => self.bad += 1,
            Transition::Unchanged => self.unchanged += 1,
        }
        if d.gain_adjustment.is_some() {
            self.gain_adjustments += 1;
        }
        self.condition = d.condition;
        self.last_rtt = d.rtt;
        self.last_setpoint = d.setpoint;
        self.last_gain = d.gain;
        self.last_min_rtt = d.min_rtt;
    }

    pub fn record_ignored(&mut self) {
        self.samples_ignored += 1;
    }

    /// Fraction of classified samples that were GOOD.
    pub fn good_ratio(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.good as f64 / self.samples as f64
        }
    }

    /// Fraction of classified samples that triggered a BAD backoff.
    pub fn bad_ratio(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.bad as f64 / self.samples as f64
        }
    }
}
