//! Configuration module.
//!
//! Handles loading, validating, and merging `sizewise.toml`. Stock defaults
//! are serialized to a TOML table and the user's file is merged over it, so a
//! config file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [resize]
//! method = "lanczos3"        # vector, lanczos3, mitchell, catrom, triangle, hqx, builtin-*
//! fit_method = "stretch"     # stretch or contain
//! size_mode = "dimensions"   # dimensions or longest-edge
//! longest_edge = 1000        # 1-9999
//! premultiply_alpha = true   # worker methods only
//! linear_rgb = true          # worker methods only
//!
//! [worker]
//! # max_threads = 4          # omit for auto = CPU cores
//! max_pixels = 100000000     # larger frames fall back to the built-in resampler
//! poll_interval_ms = 10      # how often a waiting caller checks for cancellation
//!
//! [builtin]
//! max_pixels = 250000000     # larger targets are rejected outright
//!
//! [preview]
//! loading_delay_ms = 500     # delay before the busy indicator appears
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::params::{
    FitMethod, MAX_DIMENSION, ResizeConfiguration, ResizeMethod, SizingMode,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `sizewise.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SizewiseConfig {
    /// Defaults for resize requests.
    pub resize: ResizeDefaults,
    /// Off-thread worker settings.
    pub worker: WorkerConfig,
    /// In-process resampler settings.
    pub builtin: BuiltinConfig,
    /// Interactive preview settings.
    pub preview: PreviewConfig,
}

impl SizewiseConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_DIMENSION).contains(&self.resize.longest_edge) {
            return Err(ConfigError::Validation(format!(
                "resize.longest_edge must be 1-{MAX_DIMENSION}"
            )));
        }
        if self.worker.max_pixels == 0 {
            return Err(ConfigError::Validation(
                "worker.max_pixels must be non-zero".into(),
            ));
        }
        if self.worker.poll_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "worker.poll_interval_ms must be non-zero".into(),
            ));
        }
        if self.builtin.max_pixels == 0 {
            return Err(ConfigError::Validation(
                "builtin.max_pixels must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Per-request defaults; width and height always come from the request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeDefaults {
    pub method: ResizeMethod,
    pub fit_method: FitMethod,
    pub size_mode: SizingMode,
    pub longest_edge: u32,
    pub premultiply_alpha: bool,
    pub linear_rgb: bool,
}

impl Default for ResizeDefaults {
    fn default() -> Self {
        let stock = ResizeConfiguration::default();
        Self {
            method: stock.method,
            fit_method: stock.fit_method,
            size_mode: stock.size_mode,
            longest_edge: stock.longest_edge,
            premultiply_alpha: stock.premultiply_alpha,
            linear_rgb: stock.linear_rgb,
        }
    }
}

impl ResizeDefaults {
    pub fn to_configuration(&self, width: u32, height: u32) -> ResizeConfiguration {
        ResizeConfiguration {
            width,
            height,
            longest_edge: self.longest_edge,
            method: self.method,
            fit_method: self.fit_method,
            size_mode: self.size_mode,
            premultiply_alpha: self.premultiply_alpha,
            linear_rgb: self.linear_rgb,
        }
    }
}

/// Off-thread worker settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkerConfig {
    /// Maximum number of resize threads.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_threads: Option<usize>,
    /// Largest frame (in pixels) the worker accepts before reporting out of bounds.
    pub max_pixels: u64,
    pub poll_interval_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_threads: None,
            max_pixels: 100_000_000,
            poll_interval_ms: 10,
        }
    }
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &WorkerConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_threads.map(|n| n.min(cores)).unwrap_or(cores)
}

/// In-process resampler settings.
///
/// The built-in resampler is the last resort for frames the worker rejects,
/// so its ceiling sits above the worker's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuiltinConfig {
    /// Largest target or filter intermediate (in pixels) the resampler allocates.
    pub max_pixels: u64,
}

impl Default for BuiltinConfig {
    fn default() -> Self {
        Self {
            max_pixels: 250_000_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewConfig {
    pub loading_delay_ms: u64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            loading_delay_ms: 500,
        }
    }
}

impl PreviewConfig {
    pub fn loading_delay(&self) -> Duration {
        Duration::from_millis(self.loading_delay_ms)
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SizewiseConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value; `Ok(None)` when it does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SizewiseConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SizewiseConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults if it is missing.
pub fn load_config(path: &Path) -> Result<SizewiseConfig, ConfigError> {
    let overlay = load_raw_config(path)?;
    if overlay.is_some() {
        tracing::debug!(path = %path.display(), "loaded config file");
    }
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `sizewise.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# sizewise configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Resize defaults
# ---------------------------------------------------------------------------
[resize]
# Resize algorithm:
#   vector                 - re-render an SVG source at the target size
#   lanczos3, mitchell, catrom, triangle, hqx
#                          - off-thread convolution worker
#   builtin-pixelated, builtin-low, builtin-medium, builtin-high
#                          - in-process resampler
method = "lanczos3"

# "stretch" maps the whole source onto the target.
# "contain" crops the source to the target aspect ratio first.
fit_method = "stretch"

# "dimensions" uses width and height as given.
# "longest-edge" scales so the longer side equals longest_edge (always stretch).
size_mode = "dimensions"

# Target for the longer side in longest-edge mode (1-9999).
longest_edge = 1000

# Alpha-aware convolution. Worker methods only.
premultiply_alpha = true

# Convolve in linear light instead of sRGB. Worker methods only.
linear_rgb = true

# ---------------------------------------------------------------------------
# Off-thread worker
# ---------------------------------------------------------------------------
[worker]
# Maximum resize threads.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_threads = 4

# Frames larger than this many pixels are rejected by the worker and
# handed to the built-in resampler instead.
max_pixels = 100000000

# How often (ms) a waiting caller checks for cancellation.
poll_interval_ms = 10

# ---------------------------------------------------------------------------
# Built-in resampler
# ---------------------------------------------------------------------------
[builtin]
# Targets (or filter intermediates) larger than this many pixels are
# rejected instead of allocated. This also bounds the worker fallback.
max_pixels = 250000000

# ---------------------------------------------------------------------------
# Preview
# ---------------------------------------------------------------------------
[preview]
# Delay (ms) before a busy indicator is shown. Requests that finish sooner
# never show it.
loading_delay_ms = 500
"##
}
