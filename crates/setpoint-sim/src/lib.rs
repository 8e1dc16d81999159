//! Latency-path simulation for the setpoint delay controller.
//!
//! Drives a [`setpoint_transport::Connection`] against a seeded
//! single-bottleneck path model so controller behaviour under capacity
//! changes can be reproduced step for step.

pub mod path;
pub mod scenario;

pub use path::{PathConfig, PathModel};
pub use scenario::{run, Phase, ScenarioConfig, SimReport, TracePoint};
