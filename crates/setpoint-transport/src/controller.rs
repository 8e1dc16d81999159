//! # Delay Controller
//!
//! [`ControllerState`] plus the pieces it deliberately does not own: a
//! clock, a diagnostics sink, and running statistics. This is what a host
//! embeds per connection and calls from its ACK path.

use crate::clock::{Clock, MonotonicClock};
use crate::config::ControllerConfig;
use crate::congestion::{Condition, ControllerState, Detection};
use crate::events::{ControllerEvent, EventSink, TracingSink};
use crate::stats::ControllerStats;
use crate::window::SendWindow;

/// Per-connection delay-gated controller.
pub struct DelayController<C = MonotonicClock, S = TracingSink> {
    state: ControllerState,
    clock: C,
    sink: S,
    stats: ControllerStats,
}

impl DelayController {
    /// Controller on a fresh monotonic clock, logging through `tracing`.
    pub fn with_conv(conv: u32) -> Self {
        DelayController::new(MonotonicClock::new(), TracingSink::new(conv))
    }
}

impl<C: Clock, S: EventSink> DelayController<C, S> {
    pub fn new(clock: C, sink: S) -> Self {
        let state = ControllerState::new(clock.now_ms());
        DelayController {
            state,
            clock,
            sink,
            stats: ControllerStats::default(),
        }
    }

    /// Enable/disable and retune; safe to call on a live connection.
    pub fn configure(&mut self, enable: bool, gain: f64, target_latency: u32) {
        self.state.configure(enable, gain, target_latency);
        self.sink.emit(ControllerEvent::Configured {
            enabled: self.state.enabled(),
            gain: self.state.gain(),
            target: self.state.target_latency(),
        });
    }

    pub fn apply_config(&mut self, cfg: &ControllerConfig) {
        self.configure(cfg.enabled, cfg.gain, cfg.target_latency_ms);
    }

    /// Feed one RTT sample (ms). Updates `window` on GOOD/BAD edges and
    /// returns the resulting condition.
    pub fn on_rtt_sample<W: SendWindow + ?Sized>(&mut self, rtt: u32, window: &mut W) -> Condition {
        match self.detect(rtt, window) {
            Some(d) => d.condition,
            None => self.state.condition(),
        }
    }

    /// Like [`on_rtt_sample`](Self::on_rtt_sample) but returns the full
    /// detection record (`None` while disabled).
    pub fn detect<W: SendWindow + ?Sized>(&mut self, rtt: u32, window: &mut W) -> Option<Detection> {
        let now = self.clock.now_ms();
        let Some(d) = self.state.detect(now, rtt, window) else {
            self.stats.record_ignored();
            return None;
        };
        self.stats.record(&d);
        for event in ControllerEvent::from_detection(&d) {
            self.sink.emit(event);
        }
        Some(d)
    }

    pub fn condition(&self) -> Condition {
        self.state.condition()
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn stats(&self) -> &ControllerStats {
        &self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::events::RecordingSink;
    use crate::window::WindowState;

    fn controller() -> (ManualClock, DelayController<ManualClock, RecordingSink>) {
        let clock = ManualClock::new(1_000);
        let cc = DelayController::new(clock.clone(), RecordingSink::new());
        (clock, cc)
    }

    #[test]
    fn disabled_samples_are_counted_but_ignored() {
        let (_clock, mut cc) = controller();
        let mut w = WindowState::default();
        assert_eq!(cc.on_rtt_sample(40, &mut w), Condition::Normal);
        assert_eq!(cc.stats().samples_ignored, 1);
        assert_eq!(cc.stats().samples, 0);
        assert!(cc.sink().events().is_empty());
    }

    #[test]
    fn configure_emits_event_with_clamped_gain() {
        let (_clock, mut cc) = controller();
        cc.configure(true, 25.0, 100);
        assert_eq!(
            cc.sink().events(),
            &[ControllerEvent::Configured {
                enabled: true,
                gain: 10.0,
                target: 100,
            }]
        );
    }

    #[test]
    fn clock_drives_detection() {
        let (clock, mut cc) = controller();
        cc.apply_config(&ControllerConfig {
            enabled: true,
            gain: 2.0,
            target_latency_ms: 100,
        });
        let mut w = WindowState::new(1000, 10, 1024);
        w.snd_nxt = 1000;

        clock.advance(10);
        assert_eq!(cc.on_rtt_sample(50, &mut w), Condition::Good);
        clock.advance(10);
        assert_eq!(cc.on_rtt_sample(150, &mut w), Condition::Normal);
        assert_eq!(cc.state().next_check_time(), 1_020 + 101);

        clock.advance(50);
        assert_eq!(cc.on_rtt_sample(150, &mut w), Condition::Normal);
        clock.advance(60);
        assert_eq!(cc.on_rtt_sample(150, &mut w), Condition::Bad);
        assert_eq!(w.cwnd, 500);

        assert_eq!(
            cc.sink().transitions(),
            vec![Condition::Good, Condition::Normal, Condition::Bad]
        );
        let stats = cc.stats();
        assert_eq!((stats.good, stats.normal, stats.bad, stats.unchanged), (1, 1, 1, 1));
    }

    #[test]
    fn gain_adjustment_reaches_sink() {
        let (clock, mut cc) = controller();
        cc.configure(true, 2.0, 100);
        let mut w = WindowState::default();
        clock.advance(600);
        cc.on_rtt_sample(50, &mut w);
        assert!(cc
            .sink()
            .events()
            .iter()
            .any(|e| matches!(e, ControllerEvent::GainAdjusted(a) if a.current > a.previous)));
        assert_eq!(cc.stats().gain_adjustments, 1);
    }

    #[test]
    fn tracing_controller_classifies_samples() {
        let mut cc = DelayController::with_conv(7);
        cc.configure(true, 2.0, 100);
        let mut w = WindowState::new(1000, 10, 1024);
        w.snd_nxt = 1000;

        assert_eq!(cc.on_rtt_sample(50, &mut w), Condition::Good);
        assert_eq!(cc.on_rtt_sample(150, &mut w), Condition::Normal);
        assert_eq!(cc.stats().good, 1);
        assert_eq!(cc.stats().normal, 1);
        assert_eq!(cc.stats().last_rtt, 150);
    }
}
