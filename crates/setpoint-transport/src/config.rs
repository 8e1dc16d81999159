//! # Configuration
//!
//! TOML-facing input types (`*Input`, every field optional) resolve into
//! concrete configs with defaults applied and values clamped. Out-of-range
//! numbers are clamped, never rejected; only malformed TOML or an unknown
//! `version` is an error.
//!
//! ```toml
//! version = 1
//!
//! [controller]
//! enabled = true
//! gain = 2.0
//! target_latency_ms = 100
//!
//! [window]
//! mss = 1376
//! cwnd = 32
//! rmt_wnd = 128
//! ```
//!
//! The controller keys may also appear at the top level.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::congestion::clamp_gain;
use crate::window::{WindowState, DEFAULT_MSS};

pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unsupported config version {0}")]
    Version(u32),
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ─── Input ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SetpointConfigInput {
    pub version: u32,
    pub enabled: Option<bool>,
    pub gain: Option<f64>,
    pub target_latency_ms: Option<u32>,
    pub controller: Option<ControllerConfigInput>,
    pub window: WindowConfigInput,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ControllerConfigInput {
    pub enabled: Option<bool>,
    pub gain: Option<f64>,
    pub target_latency_ms: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WindowConfigInput {
    pub mss: Option<u32>,
    pub cwnd: Option<u32>,
    pub rmt_wnd: Option<u32>,
}

// ─── Resolved ───────────────────────────────────────────────────────────────

/// Detector parameters, as passed to `configure`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControllerConfig {
    pub enabled: bool,
    /// Initial gain, already clamped to `[MIN_GAIN, MAX_GAIN]`.
    pub gain: f64,
    pub target_latency_ms: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            gain: 2.0,
            target_latency_ms: 100,
        }
    }
}

/// Initial sender window for hosts using [`WindowState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowConfig {
    pub mss: u32,
    pub cwnd: u32,
    pub rmt_wnd: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            mss: DEFAULT_MSS,
            cwnd: 32,
            rmt_wnd: 128,
        }
    }
}

impl WindowConfig {
    pub fn build(&self) -> WindowState {
        WindowState::new(self.mss, self.cwnd, self.rmt_wnd)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetpointConfig {
    pub version: u32,
    pub controller: ControllerConfig,
    pub window: WindowConfig,
}

impl Default for SetpointConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            controller: ControllerConfig::default(),
            window: WindowConfig::default(),
        }
    }
}

impl SetpointConfigInput {
    pub fn resolve(self) -> Result<SetpointConfig, ConfigError> {
        let version = if self.version == 0 {
            CONFIG_VERSION
        } else {
            self.version
        };
        if version != CONFIG_VERSION {
            return Err(ConfigError::Version(version));
        }

        // The [controller] table wins over top-level keys.
        let table = self.controller.unwrap_or_default();
        let defaults = ControllerConfig::default();
        let controller = ControllerConfig {
            enabled: table.enabled.or(self.enabled).unwrap_or(defaults.enabled),
            gain: clamp_gain(table.gain.or(self.gain).unwrap_or(defaults.gain)),
            target_latency_ms: table
                .target_latency_ms
                .or(self.target_latency_ms)
                .unwrap_or(defaults.target_latency_ms),
        };

        let wdefaults = WindowConfig::default();
        let window = WindowConfig {
            mss: self.window.mss.unwrap_or(wdefaults.mss),
            cwnd: self.window.cwnd.unwrap_or(wdefaults.cwnd).max(1),
            rmt_wnd: self.window.rmt_wnd.unwrap_or(wdefaults.rmt_wnd).max(1),
        };

        Ok(SetpointConfig {
            version,
            controller,
            window,
        })
    }
}

impl SetpointConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        if input.trim().is_empty() {
            return Ok(SetpointConfig::default());
        }
        let parsed: SetpointConfigInput = toml::from_str(input)?;
        parsed.resolve()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&input)
    }
}

impl ControllerConfig {
    /// Parse just the controller section of a config document.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        SetpointConfig::from_toml_str(input).map(|cfg| cfg.controller)
    }
}
