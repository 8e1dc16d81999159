//! Single-bottleneck path model.
//!
//! Packets beyond the bandwidth-delay product sit in a FIFO that drains at
//! the bottleneck rate, so RTT = base + queued / rate (+ jitter). Loss is
//! not modelled; the queue delay is simply capped at `queue_limit_pkts`.

use rand::RngExt as _;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

/// Floor for the bottleneck rate to keep the queue-delay division finite.
const MIN_RATE_PKTS_PER_MS: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PathConfig {
    /// Propagation RTT with an empty queue (ms).
    pub base_rtt_ms: u32,
    /// Bottleneck service rate (packets per ms).
    pub rate_pkts_per_ms: f64,
    /// Uniform extra delay in `[0, jitter_ms)` per sample.
    pub jitter_ms: u32,
    /// Maximum standing queue (packets).
    pub queue_limit_pkts: u32,
}

impl Default for PathConfig {
    fn default() -> Self {
        PathConfig {
            base_rtt_ms: 40,
            rate_pkts_per_ms: 2.0,
            jitter_ms: 5,
            queue_limit_pkts: 1_000,
        }
    }
}

#[derive(Debug)]
pub struct PathModel {
    cfg: PathConfig,
    rng: StdRng,
    /// Fractional delivery credit carried between steps.
    credit: f64,
}

impl PathModel {
    pub fn new(cfg: PathConfig, seed: u64) -> Self {
        PathModel {
            cfg,
            rng: StdRng::seed_from_u64(seed),
            credit: 0.0,
        }
    }

    pub fn config(&self) -> &PathConfig {
        &self.cfg
    }

    pub fn set_config(&mut self, cfg: PathConfig) {
        self.cfg = cfg;
    }

    fn rate(&self) -> f64 {
        self.cfg.rate_pkts_per_ms.max(MIN_RATE_PKTS_PER_MS)
    }

    /// Bandwidth-delay product in packets.
    pub fn bdp_pkts(&self) -> f64 {
        self.cfg.base_rtt_ms as f64 * self.rate()
    }

    /// Packets standing in the bottleneck queue for a given in-flight count.
    pub fn queued_pkts(&self, inflight: u32) -> f64 {
        (inflight as f64 - self.bdp_pkts()).clamp(0.0, self.cfg.queue_limit_pkts as f64)
    }

    /// RTT seen by a packet sent with `inflight` packets outstanding.
    pub fn sample_rtt(&mut self, inflight: u32) -> u32 {
        let queue_delay = self.queued_pkts(inflight) / self.rate();
        let jitter = if self.cfg.jitter_ms == 0 {
            0.0
        } else {
            self.rng.random::<f64>() * self.cfg.jitter_ms as f64
        };
        (self.cfg.base_rtt_ms as f64 + queue_delay + jitter) as u32
    }

    /// Packets the bottleneck delivers over `step_ms`.
    pub fn delivered(&mut self, step_ms: u32) -> u32 {
        self.credit += self.cfg.rate_pkts_per_ms.max(0.0) * step_ms as f64;
        let whole = self.credit.floor();
        self.credit -= whole;
        whole as u32
    }
}
