use rand::RngExt as _;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::time::Duration;

use setpoint_transport::clock::ManualClock;
use setpoint_transport::config::{ControllerConfig, WindowConfig};
use setpoint_transport::events::TracingSink;
use setpoint_transport::stats::ControllerStats;
use setpoint_transport::{Condition, Connection, SendWindow, WindowState};

use crate::path::{PathConfig, PathModel};

/// Path parameters that take effect at `at` into the run.
#[derive(Debug, Clone, Serialize)]
pub struct Phase {
    pub at: Duration,
    pub path: PathConfig,
}

/// Configuration for a deterministic controller run.
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    pub seed: u64,
    pub duration: Duration,
    pub step: Duration,
    /// Sorted by `at`; the first phase should start at zero.
    pub phases: Vec<Phase>,
    /// Keep a per-step trace in the report.
    pub record_trace: bool,
}

impl ScenarioConfig {
    /// Stable link, bottleneck drops to a quarter for five seconds, recovers.
    pub fn capacity_drop(seed: u64) -> Self {
        let base = PathConfig::default();
        ScenarioConfig {
            seed,
            duration: Duration::from_secs(15),
            step: Duration::from_millis(10),
            phases: vec![
                Phase {
                    at: Duration::ZERO,
                    path: base,
                },
                Phase {
                    at: Duration::from_secs(5),
                    path: PathConfig {
                        rate_pkts_per_ms: base.rate_pkts_per_ms / 4.0,
                        ..base
                    },
                },
                Phase {
                    at: Duration::from_secs(10),
                    path: base,
                },
            ],
            record_trace: false,
        }
    }

    /// Bottleneck rate random-walks once per second within `[min, max]`.
    pub fn random_walk(seed: u64, duration: Duration, base: PathConfig, min_rate: f64, max_rate: f64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut rate = base.rate_pkts_per_ms.clamp(min_rate, max_rate);
        let max_step = (max_rate - min_rate) * 0.25;
        let secs = duration.as_secs();

        let phases = (0..secs.max(1))
            .map(|s| {
                if s > 0 {
                    rate = (rate + rand_signed(&mut rng, max_step)).clamp(min_rate, max_rate);
                }
                Phase {
                    at: Duration::from_secs(s),
                    path: PathConfig {
                        rate_pkts_per_ms: rate,
                        ..base
                    },
                }
            })
            .collect();

        ScenarioConfig {
            seed,
            duration,
            step: Duration::from_millis(10),
            phases,
            record_trace: false,
        }
    }

    pub fn with_trace(mut self) -> Self {
        self.record_trace = true;
        self
    }
}

fn rand_signed(rng: &mut StdRng, max_step: f64) -> f64 {
    if max_step <= 0.0 {
        return 0.0;
    }
    let mag = rng.random::<f64>() * max_step;
    if rng.random::<bool>() { mag } else { -mag }
}

/// One simulation step.
#[derive(Debug, Clone, Serialize)]
pub struct TracePoint {
    pub t_ms: u64,
    pub rtt: u32,
    pub cwnd: u32,
    pub inflight: u32,
    pub condition: Condition,
    pub gain: f64,
    pub setpoint: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    pub seed: u64,
    pub steps: u64,
    pub final_window: WindowState,
    pub stats: ControllerStats,
    pub peak_cwnd: u32,
    pub mean_rtt_ms: f64,
    pub delivered_pkts: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<TracePoint>,
}

/// Drive one connection through `scenario`.
pub fn run(scenario: &ScenarioConfig, controller: &ControllerConfig, window: &WindowConfig) -> SimReport {
    let clock = ManualClock::new(0);
    let conn = Connection::new(1, clock.clone(), TracingSink::new(1), window.build());
    conn.apply_config(controller);

    let first = scenario.phases.first().map(|p| p.path).unwrap_or_default();
    let mut path = PathModel::new(first, scenario.seed);
    let mut next_phase = 1;

    let step_ms = u32::try_from(scenario.step.as_millis()).unwrap_or(u32::MAX).max(1);
    let steps = scenario.duration.as_millis() as u64 / step_ms as u64;

    let mut peak_cwnd = conn.window().cwnd;
    let mut rtt_total = 0u64;
    let mut delivered_pkts = 0u64;
    let mut trace = Vec::new();

    for i in 0..steps {
        let t = Duration::from_millis(i * step_ms as u64);
        while next_phase < scenario.phases.len() && scenario.phases[next_phase].at <= t {
            path.set_config(scenario.phases[next_phase].path);
            tracing::debug!(t_ms = t.as_millis() as u64, rate = path.config().rate_pkts_per_ms, "path phase change");
            next_phase += 1;
        }

        conn.on_send(conn.window().available());
        clock.advance(step_ms);

        let inflight = conn.window().inflight();
        let rtt = path.sample_rtt(inflight);
        let delivered = path.delivered(step_ms);
        delivered_pkts += conn.on_ack(delivered) as u64;
        let condition = conn.on_rtt_sample(rtt as i32);

        let w = conn.window();
        peak_cwnd = peak_cwnd.max(w.cwnd);
        rtt_total += rtt as u64;

        if scenario.record_trace {
            let stats = conn.stats();
            trace.push(TracePoint {
                t_ms: t.as_millis() as u64 + step_ms as u64,
                rtt,
                cwnd: w.cwnd,
                inflight,
                condition,
                gain: stats.last_gain,
                setpoint: stats.last_setpoint,
            });
        }
    }

    let stats = conn.stats();
    tracing::info!(
        seed = scenario.seed,
        steps,
        good = stats.good,
        normal = stats.normal,
        bad = stats.bad,
        peak_cwnd,
        "simulation finished"
    );

    SimReport {
        seed: scenario.seed,
        steps,
        final_window: conn.window(),
        stats,
        peak_cwnd,
        mean_rtt_ms: if steps == 0 {
            0.0
        } else {
            rtt_total as f64 / steps as f64
        },
        delivered_pkts,
        trace,
    }
}
