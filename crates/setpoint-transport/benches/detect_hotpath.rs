//! Per-sample cost of the delay controller.
//!
//! Measures:
//! - ControllerState::detect() on a steady GOOD path
//! - ControllerState::detect() alternating GOOD and BAD (window updates)
//! - DelayController::on_rtt_sample() with clock, stats and a null sink
//! - Connection::on_rtt_sample() including the lock
//!
//! Run with: cargo bench --package setpoint-transport

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use setpoint_transport::clock::ManualClock;
use setpoint_transport::congestion::ControllerState;
use setpoint_transport::events::NullSink;
use setpoint_transport::window::WindowState;
use setpoint_transport::{Connection, DelayController};

/// Benchmark the raw state machine: one detect() per sample.
fn bench_detect(c: &mut Criterion) {
    let mut group = c.benchmark_group("detect");
    group.throughput(Throughput::Elements(1));

    group.bench_function("good_path", |b| {
        let mut cc = ControllerState::new(0);
        cc.configure(true, 2.0, 100);
        let mut w = WindowState::new(1376, 32, 1024);
        let mut now = 0u32;
        b.iter(|| {
            now = now.wrapping_add(1);
            cc.detect(now, black_box(40), &mut w);
        });
    });

    group.bench_function("alternating_good_bad", |b| {
        let mut cc = ControllerState::new(0);
        cc.configure(true, 1.5, 100);
        let mut w = WindowState::new(1376, 32, 1024);
        w.snd_nxt = 400;
        let mut now = 0u32;
        let mut i = 0u32;
        b.iter(|| {
            now = now.wrapping_add(3);
            i = i.wrapping_add(1);
            let rtt = if i % 16 < 8 { 40 } else { 250 };
            cc.detect(now, black_box(rtt), &mut w);
        });
    });

    group.finish();
}

/// Benchmark the host-facing paths: controller with sink + stats, and the
/// locked connection handle.
fn bench_host_paths(c: &mut Criterion) {
    let mut group = c.benchmark_group("host");
    group.throughput(Throughput::Elements(1));

    group.bench_function("delay_controller_sample", |b| {
        let clock = ManualClock::new(0);
        let mut cc = DelayController::new(clock.clone(), NullSink);
        cc.configure(true, 2.0, 100);
        let mut w = WindowState::default();
        b.iter(|| {
            clock.advance(1);
            cc.on_rtt_sample(black_box(45), &mut w);
        });
    });

    group.bench_function("connection_sample", |b| {
        let clock = ManualClock::new(0);
        let conn = Connection::new(1, clock.clone(), NullSink, WindowState::default());
        conn.set_params(true, 2.0, 100);
        b.iter(|| {
            clock.advance(1);
            conn.on_rtt_sample(black_box(45));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_detect, bench_host_paths);
criterion_main!(benches);
