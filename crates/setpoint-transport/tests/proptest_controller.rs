//! Property-based tests for the delay controller.
//!
//! Invariants checked across arbitrary configuration values and RTT sample
//! sequences: gain bounds, setpoint floor, min-RTT tracking, debounce, and
//! GOOD growth bounded by the remote window.

use proptest::prelude::*;
use setpoint_transport::congestion::{
    clamp_gain, Condition, ControllerState, GAIN_UPDATE_INTERVAL_MS, MAX_GAIN, MIN_GAIN,
};
use setpoint_transport::window::{WindowState, THRESH_MIN};

fn controller(gain: f64, target: u32) -> ControllerState {
    let mut cc = ControllerState::new(0);
    cc.configure(true, gain, target);
    cc
}

/// Arbitrary gains including non-finite values.
fn any_gain() -> impl Strategy<Value = f64> {
    prop_oneof![
        -1.0e6f64..1.0e6,
        Just(f64::NAN),
        Just(f64::INFINITY),
        Just(f64::NEG_INFINITY),
        Just(0.0),
    ]
}

proptest! {
    #[test]
    fn configured_gain_always_in_bounds(g in any_gain(), target in any::<u32>()) {
        let mut cc = ControllerState::new(0);
        cc.configure(true, g, target);
        prop_assert!(cc.gain() >= MIN_GAIN && cc.gain() <= MAX_GAIN);
        prop_assert_eq!(cc.gain(), clamp_gain(g));
    }

    #[test]
    fn gain_stays_in_bounds_under_tuning(
        g in 1.0f64..10.0,
        target in 0u32..2_000,
        samples in prop::collection::vec((1u32..700, 0u32..5_000), 1..200),
    ) {
        let mut cc = controller(g, target);
        let mut w = WindowState::new(1200, 32, 256);
        let mut now = 0u32;
        for (dt, rtt) in samples {
            now = now.wrapping_add(dt);
            cc.detect(now, rtt, &mut w);
            prop_assert!(cc.gain() >= MIN_GAIN && cc.gain() <= MAX_GAIN);
        }
    }

    #[test]
    fn setpoint_never_below_one(
        g in 1.0f64..10.0,
        rtts in prop::collection::vec(0u32..100_000, 1..50),
    ) {
        let mut cc = controller(g, 100);
        let mut w = WindowState::new(1200, 32, 256);
        for (i, rtt) in rtts.into_iter().enumerate() {
            cc.detect(i as u32 * 7, rtt, &mut w);
            prop_assert!(cc.setpoint() >= 1);
        }
    }

    #[test]
    fn min_rtt_is_window_minimum(
        rtts in prop::collection::vec(1u32..10_000, 1..100),
    ) {
        // All samples land within one second of the first.
        let mut cc = controller(2.0, 100);
        let mut w = WindowState::new(1200, 32, 256);
        let mut running = u32::MAX;
        for (i, rtt) in rtts.iter().enumerate() {
            cc.detect(1 + i as u32 * 5, *rtt, &mut w);
            running = running.min(*rtt);
            prop_assert_eq!(cc.min_rtt(), running);
        }
    }

    #[test]
    fn gain_debounced_inside_interval(
        g in 1.0f64..10.0,
        target in 1u32..1_000,
        first in 1u32..1_000,
        second in 1u32..1_000,
        gap in 0u32..(GAIN_UPDATE_INTERVAL_MS as u32),
    ) {
        let mut cc = controller(g, target);
        let mut w = WindowState::new(1200, 32, 256);
        // First sample completes a tuning pass; the second lands within the debounce.
        cc.detect(GAIN_UPDATE_INTERVAL_MS as u32, first, &mut w);
        let before = cc.gain();
        cc.detect(GAIN_UPDATE_INTERVAL_MS as u32 + gap, second, &mut w);
        prop_assert_eq!(cc.gain(), before);
    }

    #[test]
    fn good_growth_monotonic_and_bounded(
        mss in 1u32..2_000,
        cwnd in 1u32..64,
        extra in 0u32..64,
        rtt in 1u32..200,
        ticks in 1usize..400,
    ) {
        let rmt_wnd = cwnd + extra;
        let mut cc = controller(2.0, 10_000);
        let mut w = WindowState::new(mss, cwnd, rmt_wnd);
        let mut last = w.cwnd;
        for i in 0..ticks {
            // Constant RTT stays below ⌊rtt × gain⌋ + 1 with gain ≥ 1.
            cc.detect(1 + i as u32, rtt, &mut w);
            prop_assert_eq!(cc.condition(), Condition::Good);
            prop_assert!(w.cwnd >= last);
            prop_assert!(w.cwnd <= rmt_wnd);
            last = w.cwnd;
        }
    }

    #[test]
    fn bad_backoff_halves_inflight(
        mss in 1u32..2_000,
        una in any::<u32>(),
        inflight in 0u32..1_000_000,
    ) {
        let mut cc = controller(1.0, 100);
        let mut w = WindowState::new(mss, 64, 1_000_000);
        // GOOD then NORMAL, then BAD once the grace period expires.
        cc.detect(10, 50, &mut w);
        cc.detect(20, 500, &mut w);
        w.snd_una = una;
        w.snd_nxt = una.wrapping_add(inflight);
        cc.detect(200, 500, &mut w);
        prop_assert_eq!(cc.condition(), Condition::Bad);
        let expected = (inflight / 2).max(THRESH_MIN);
        prop_assert_eq!(w.ssthresh, expected);
        prop_assert_eq!(w.cwnd, expected);
        prop_assert_eq!(w.incr, expected.saturating_mul(mss));
    }
}
