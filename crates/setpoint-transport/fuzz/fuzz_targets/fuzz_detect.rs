#![no_main]

use libfuzzer_sys::fuzz_target;
use setpoint_transport::congestion::{ControllerState, MAX_GAIN, MIN_GAIN};
use setpoint_transport::window::WindowState;

/// Fuzz the detector with arbitrary configuration, window and sample streams.
///
/// Layout: 4 bytes gain (f32 bits), 4 bytes target, 4 bytes mss, 2 bytes
/// cwnd, 2 bytes rmt_wnd, then 8-byte records of (dt: u16, rtt: u32,
/// inflight: u16).
///
/// The detector must never panic, and gain/setpoint bounds must hold after
/// every sample.
fuzz_target!(|data: &[u8]| {
    if data.len() < 16 {
        return;
    }
    let u32_at = |i: usize| u32::from_le_bytes([data[i], data[i + 1], data[i + 2], data[i + 3]]);
    let u16_at = |i: usize| u16::from_le_bytes([data[i], data[i + 1]]);

    let gain = f32::from_bits(u32_at(0)) as f64;
    let target = u32_at(4);
    let mss = u32_at(8);
    let cwnd = u16_at(12) as u32;
    let rmt_wnd = u16_at(14) as u32;

    let mut cc = ControllerState::new(0);
    cc.configure(true, gain, target);
    let mut w = WindowState::new(mss, cwnd, rmt_wnd);

    let mut now = 0u32;
    for rec in data[16..].chunks_exact(8) {
        let dt = u16::from_le_bytes([rec[0], rec[1]]) as u32;
        let rtt = u32::from_le_bytes([rec[2], rec[3], rec[4], rec[5]]);
        let inflight = u16::from_le_bytes([rec[6], rec[7]]) as u32;

        now = now.wrapping_add(dt);
        w.snd_nxt = w.snd_una.wrapping_add(inflight);
        cc.detect(now, rtt, &mut w);

        assert!(cc.gain() >= MIN_GAIN && cc.gain() <= MAX_GAIN);
        assert!(cc.setpoint() >= 1);
    }
});
