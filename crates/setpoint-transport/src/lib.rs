//! # setpoint-transport
//!
//! Delay-gated congestion condition detector for ARQ-over-datagram
//! transports.
//!
//! Every RTT sample is compared against a setpoint derived from the
//! minimum RTT and a self-tuning gain. The path is classified GOOD, NORMAL
//! or BAD, and the sender's congestion window grows additively on GOOD and
//! drops to half the in-flight count on BAD.
//!
//! ## Crate structure
//!
//! - [`congestion`] — Detector state machine, gain tuner, window updater
//! - [`controller`] — Detector + clock + diagnostics + stats, per connection
//! - [`connection`] — Locked host handle owning controller and window
//! - [`window`] — `SendWindow` host capability and a plain implementation
//! - [`clock`] — Wrapping millisecond clocks (monotonic and manual)
//! - [`events`] — Structured diagnostic events and sinks
//! - [`stats`] — Per-connection detector statistics
//! - [`config`] — TOML configuration

pub mod clock;
pub mod config;
pub mod congestion;
pub mod connection;
pub mod controller;
pub mod events;
pub mod stats;
pub mod window;

pub use congestion::{Condition, ControllerState, MAX_GAIN, MIN_GAIN};
pub use connection::Connection;
pub use controller::DelayController;
pub use window::{SendWindow, WindowState};
