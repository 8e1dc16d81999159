//! # Send Window Capability
//!
//! The detector does not own the congestion window; the ARQ layer does.
//! [`SendWindow`] is the narrow read/write surface the window updater is
//! granted for the duration of a single update, and [`WindowState`] is a
//! plain implementation usable by hosts that have no window struct of their
//! own (and by tests and the simulator).

use serde::{Deserialize, Serialize};

/// Lower bound for `ssthresh` after a BAD backoff, in segments.
pub const THRESH_MIN: u32 = 2;

/// Default maximum segment size: 1400-byte MTU minus the 24-byte ARQ header.
pub const DEFAULT_MSS: u32 = 1376;

/// Sender-side window fields the controller reads and, on GOOD/BAD
/// transitions, writes back.
pub trait SendWindow {
    fn mss(&self) -> u32;
    fn cwnd(&self) -> u32;
    fn set_cwnd(&mut self, cwnd: u32);
    /// Window advertised by the remote receiver, in segments.
    fn rmt_wnd(&self) -> u32;
    /// Next sequence number to be sent.
    fn snd_nxt(&self) -> u32;
    /// Oldest unacknowledged sequence number.
    fn snd_una(&self) -> u32;
    fn ssthresh(&self) -> u32;
    fn set_ssthresh(&mut self, ssthresh: u32);
    /// Byte-granular growth accumulator (`cwnd ≈ incr / mss`).
    fn incr(&self) -> u32;
    fn set_incr(&mut self, incr: u32);

    /// Segments sent but not yet acknowledged.
    fn inflight(&self) -> u32 {
        self.snd_nxt().wrapping_sub(self.snd_una())
    }
}

impl<W: SendWindow + ?Sized> SendWindow for &mut W {
    fn mss(&self) -> u32 {
        (**self).mss()
    }
    fn cwnd(&self) -> u32 {
        (**self).cwnd()
    }
    fn set_cwnd(&mut self, cwnd: u32) {
        (**self).set_cwnd(cwnd)
    }
    fn rmt_wnd(&self) -> u32 {
        (**self).rmt_wnd()
    }
    fn snd_nxt(&self) -> u32 {
        (**self).snd_nxt()
    }
    fn snd_una(&self) -> u32 {
        (**self).snd_una()
    }
    fn ssthresh(&self) -> u32 {
        (**self).ssthresh()
    }
    fn set_ssthresh(&mut self, ssthresh: u32) {
        (**self).set_ssthresh(ssthresh)
    }
    fn incr(&self) -> u32 {
        (**self).incr()
    }
    fn set_incr(&mut self, incr: u32) {
        (**self).set_incr(incr)
    }
}

// ─── WindowState ────────────────────────────────────────────────────────────

/// Plain sender window with public fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowState {
    pub mss: u32,
    pub cwnd: u32,
    pub rmt_wnd: u32,
    pub snd_nxt: u32,
    pub snd_una: u32,
    pub ssthresh: u32,
    pub incr: u32,
}

impl WindowState {
    /// Fresh window with nothing in flight and `incr` synced to `cwnd`.
    pub fn new(mss: u32, cwnd: u32, rmt_wnd: u32) -> Self {
        WindowState {
            mss,
            cwnd,
            rmt_wnd,
            snd_nxt: 0,
            snd_una: 0,
            ssthresh: THRESH_MIN,
            incr: cwnd.saturating_mul(mss),
        }
    }

    /// Record `segments` newly transmitted.
    pub fn on_send(&mut self, segments: u32) {
        self.snd_nxt = self.snd_nxt.wrapping_add(segments);
    }

    /// Advance the cumulative ACK by up to `segments`, never past `snd_nxt`.
    /// Returns how many segments were actually acknowledged.
    pub fn on_ack(&mut self, segments: u32) -> u32 {
        let acked = segments.min(self.inflight());
        self.snd_una = self.snd_una.wrapping_add(acked);
        acked
    }

    /// Segments the sender may still put on the wire right now.
    pub fn available(&self) -> u32 {
        self.cwnd.min(self.rmt_wnd).saturating_sub(self.inflight())
    }
}

impl Default for WindowState {
    fn default() -> Self {
        WindowState::new(DEFAULT_MSS, 32, 128)
    }
}

impl SendWindow for WindowState {
    fn mss(&self) -> u32 {
        self.mss
    }
    fn cwnd(&self) -> u32 {
        self.cwnd
    }
    fn set_cwnd(&mut self, cwnd: u32) {
        self.cwnd = cwnd;
    }
    fn rmt_wnd(&self) -> u32 {
        self.rmt_wnd
    }
    fn snd_nxt(&self) -> u32 {
        self.snd_nxt
    }
    fn snd_una(&self) -> u32 {
        self.snd_una
    }
    fn ssthresh(&self) -> u32 {
        self.ssthresh
    }
    fn set_ssthresh(&mut self, ssthresh: u32) {
        self.ssthresh = ssthresh;
    }
    fn incr(&self) -> u32 {
        self.incr
    }
    fn set_incr(&mut self, incr: u32) {
        self.incr = incr;
    }
}
