//! # Connection Handle
//!
//! Host-side wrapper that owns one connection's [`DelayController`] and
//! send window behind a mutex, so parameter changes from an application
//! thread and RTT samples from the ACK path serialize on the same lock.
//! The controller itself never locks.

use std::sync::{Mutex, MutexGuard};

use crate::clock::Clock;
use crate::config::ControllerConfig;
use crate::congestion::Condition;
use crate::controller::DelayController;
use crate::events::EventSink;
use crate::stats::ControllerStats;
use crate::window::WindowState;

struct ConnectionInner<C, S> {
    controller: DelayController<C, S>,
    window: WindowState,
}

/// One connection: controller + window under a single lock.
pub struct Connection<C: Clock, S: EventSink> {
    conv: u32,
    inner: Mutex<ConnectionInner<C, S>>,
}

impl<C: Clock, S: EventSink> Connection<C, S> {
    pub fn new(conv: u32, clock: C, sink: S, window: WindowState) -> Self {
        Connection {
            conv,
            inner: Mutex::new(ConnectionInner {
                controller: DelayController::new(clock, sink),
                window,
            }),
        }
    }

    /// Conversation id.
    pub fn conv(&self) -> u32 {
        self.conv
    }

    fn lock(&self) -> MutexGuard<'_, ConnectionInner<C, S>> {
        // Plain data behind the lock; a panic elsewhere leaves nothing half-built.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Enable/disable the detector and retune it.
    pub fn set_params(&self, enable: bool, gain: f64, target_latency: u32) {
        self.lock().controller.configure(enable, gain, target_latency);
    }

    pub fn apply_config(&self, cfg: &ControllerConfig) {
        self.lock().controller.apply_config(cfg);
    }

    /// Feed an RTT measurement from the ACK path. Negative samples (clock
    /// skew on the peer's echo) are clamped to zero.
    pub fn on_rtt_sample(&self, rtt: i32) -> Condition {
        let rtt = rtt.max(0) as u32;
        let mut inner = self.lock();
        let ConnectionInner { controller, window } = &mut *inner;
        controller.on_rtt_sample(rtt, window)
    }

    /// Record `segments` handed to the socket.
    pub fn on_send(&self, segments: u32) {
        self.lock().window.on_send(segments);
    }

    /// Advance the cumulative ACK; returns segments actually acknowledged.
    pub fn on_ack(&self, segments: u32) -> u32 {
        self.lock().window.on_ack(segments)
    }

    /// Update the peer's advertised receive window.
    pub fn set_remote_window(&self, rmt_wnd: u32) {
        self.lock().window.rmt_wnd = rmt_wnd;
    }

    /// Snapshot of the send window.
    pub fn window(&self) -> WindowState {
        self.lock().window
    }

    pub fn condition(&self) -> Condition {
        self.lock().controller.condition()
    }

    pub fn stats(&self) -> ControllerStats {
        self.lock().controller.stats().clone()
    }

    /// Run `f` against the controller while holding the lock.
    pub fn with_controller<R>(&self, f: impl FnOnce(&mut DelayController<C, S>) -> R) -> R {
        f(&mut self.lock().controller)
    }
}
