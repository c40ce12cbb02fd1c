//! Parameter types for resize operations.
//!
//! These types describe *what* to do, not *how* to do it. They are the
//! interface between the [`pipeline`](crate::pipeline) (which resolves user
//! intent into concrete dimensions) and the [`backend`](super::backend)
//! implementations (which do the actual pixel work).
//!
//! ## Types
//!
//! - [`SizingMode`]: explicit width + height, or a single longest edge.
//! - [`FitMethod`]: stretch the whole frame, or crop to the target aspect first.
//! - [`ResizeMethod`]: every user-selectable algorithm. Each one routes to
//!   exactly one backend through [`ResizeMethod::route`].
//! - [`ResizeConfiguration`]: what the option form reports.
//! - [`ResolvedConfiguration`]: a configuration after longest-edge resolution;
//!   width and height are always authoritative.
//! - [`CropRect`]: source-space crop rectangle for the in-process and vector paths.
//! - [`WorkerOptions`]: the subset of a resolved configuration the worker sees.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bound for a longest-edge request (and for form inputs that carry one).
pub const MAX_DIMENSION: u32 = 9999;

/// Which numeric fields of a [`ResizeConfiguration`] are authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SizingMode {
    #[default]
    Dimensions,
    #[serde(alias = "longest-side")]
    LongestEdge,
}

impl SizingMode {
    pub fn name(self) -> &'static str {
        match self {
            SizingMode::Dimensions => "dimensions",
            SizingMode::LongestEdge => "longest-edge",
        }
    }
}

impl fmt::Display for SizingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SizingMode {
    type Err = ParseParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dimensions" => Ok(SizingMode::Dimensions),
            "longest-edge" | "longest-side" => Ok(SizingMode::LongestEdge),
            other => Err(ParseParamError::new("sizing mode", other)),
        }
    }
}

/// Policy for reconciling source and target aspect ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FitMethod {
    /// Map the full source onto the full target; non-uniform scale allowed.
    #[default]
    Stretch,
    /// Crop the source to the target aspect ratio, then scale.
    Contain,
}

impl FitMethod {
    pub fn name(self) -> &'static str {
        match self {
            FitMethod::Stretch => "stretch",
            FitMethod::Contain => "contain",
        }
    }
}

impl fmt::Display for FitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FitMethod {
    type Err = ParseParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stretch" => Ok(FitMethod::Stretch),
            "contain" => Ok(FitMethod::Contain),
            other => Err(ParseParamError::new("fit method", other)),
        }
    }
}

/// Execution strategy a method is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendFamily {
    Vector,
    OffThread,
    InProcess,
}

impl fmt::Display for BackendFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackendFamily::Vector => "vector",
            BackendFamily::OffThread => "worker",
            BackendFamily::InProcess => "builtin",
        })
    }
}

/// Convolution algorithms run by the off-thread worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkerMethod {
    Lanczos3,
    Mitchell,
    CatRom,
    Triangle,
    Hqx,
}

/// Quality tiers of the in-process resampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuiltinQuality {
    Pixelated,
    Low,
    Medium,
    High,
}

/// Where a method executes, carrying the backend-specific algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Vector,
    Worker(WorkerMethod),
    Builtin(BuiltinQuality),
}

impl Route {
    pub fn family(self) -> BackendFamily {
        match self {
            Route::Vector => BackendFamily::Vector,
            Route::Worker(_) => BackendFamily::OffThread,
            Route::Builtin(_) => BackendFamily::InProcess,
        }
    }
}

/// Every user-selectable resize algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResizeMethod {
    #[serde(rename = "vector")]
    Vector,
    #[default]
    #[serde(rename = "lanczos3")]
    Lanczos3,
    #[serde(rename = "mitchell")]
    Mitchell,
    #[serde(rename = "catrom")]
    CatRom,
    #[serde(rename = "triangle")]
    Triangle,
    #[serde(rename = "hqx")]
    Hqx,
    #[serde(rename = "builtin-pixelated", alias = "browser-pixelated")]
    BuiltinPixelated,
    #[serde(rename = "builtin-low", alias = "browser-low")]
    BuiltinLow,
    #[serde(rename = "builtin-medium", alias = "browser-medium")]
    BuiltinMedium,
    #[serde(rename = "builtin-high", alias = "browser-high")]
    BuiltinHigh,
}

impl ResizeMethod {
    /// All methods in menu order.
    pub const ALL: [ResizeMethod; 10] = [
        ResizeMethod::Vector,
        ResizeMethod::Lanczos3,
        ResizeMethod::Mitchell,
        ResizeMethod::CatRom,
        ResizeMethod::Triangle,
        ResizeMethod::Hqx,
        ResizeMethod::BuiltinPixelated,
        ResizeMethod::BuiltinLow,
        ResizeMethod::BuiltinMedium,
        ResizeMethod::BuiltinHigh,
    ];

    /// Static routing table. Adding a variant without a route is a compile error.
    pub fn route(self) -> Route {
        match self {
            ResizeMethod::Vector => Route::Vector,
            ResizeMethod::Lanczos3 => Route::Worker(WorkerMethod::Lanczos3),
            ResizeMethod::Mitchell => Route::Worker(WorkerMethod::Mitchell),
            ResizeMethod::CatRom => Route::Worker(WorkerMethod::CatRom),
            ResizeMethod::Triangle => Route::Worker(WorkerMethod::Triangle),
            ResizeMethod::Hqx => Route::Worker(WorkerMethod::Hqx),
            ResizeMethod::BuiltinPixelated => Route::Builtin(BuiltinQuality::Pixelated),
            ResizeMethod::BuiltinLow => Route::Builtin(BuiltinQuality::Low),
            ResizeMethod::BuiltinMedium => Route::Builtin(BuiltinQuality::Medium),
            ResizeMethod::BuiltinHigh => Route::Builtin(BuiltinQuality::High),
        }
    }

    pub fn family(self) -> BackendFamily {
        self.route().family()
    }

    /// Whether `premultiply_alpha` / `linear_rgb` mean anything for this method.
    pub fn uses_worker_flags(self) -> bool {
        self.family() == BackendFamily::OffThread
    }

    /// Methods a form may offer for a source. Vector is only offered for vector sources.
    pub fn available_for(is_vector: bool) -> impl Iterator<Item = ResizeMethod> {
        Self::ALL
            .into_iter()
            .filter(move |m| is_vector || *m != ResizeMethod::Vector)
    }

    pub fn name(self) -> &'static str {
        match self {
            ResizeMethod::Vector => "vector",
            ResizeMethod::Lanczos3 => "lanczos3",
            ResizeMethod::Mitchell => "mitchell",
            ResizeMethod::CatRom => "catrom",
            ResizeMethod::Triangle => "triangle",
            ResizeMethod::Hqx => "hqx",
            ResizeMethod::BuiltinPixelated => "builtin-pixelated",
            ResizeMethod::BuiltinLow => "builtin-low",
            ResizeMethod::BuiltinMedium => "builtin-medium",
            ResizeMethod::BuiltinHigh => "builtin-high",
        }
    }

    /// Human-readable menu label.
    pub fn label(self) -> &'static str {
        match self {
            ResizeMethod::Vector => "Vector",
            ResizeMethod::Lanczos3 => "Lanczos3",
            ResizeMethod::Mitchell => "Mitchell",
            ResizeMethod::CatRom => "Catmull-Rom",
            ResizeMethod::Triangle => "Triangle (bilinear)",
            ResizeMethod::Hqx => "hqx (pixel art)",
            ResizeMethod::BuiltinPixelated => "Built-in pixelated",
            ResizeMethod::BuiltinLow => "Built-in low quality",
            ResizeMethod::BuiltinMedium => "Built-in medium quality",
            ResizeMethod::BuiltinHigh => "Built-in high quality",
        }
    }
}

impl fmt::Display for ResizeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResizeMethod {
    type Err = ParseParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.strip_prefix("browser-").map(|rest| format!("builtin-{rest}"));
        let wanted = normalized.as_deref().unwrap_or(s);
        Self::ALL
            .into_iter()
            .find(|m| m.name() == wanted)
            .ok_or_else(|| ParseParamError::new("resize method", s))
    }
}

/// Unrecognized name for one of the parameter enums.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseParamError {
    kind: &'static str,
    value: String,
}

impl ParseParamError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Sizing configuration as reported by the option form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeConfiguration {
    pub width: u32,
    pub height: u32,
    pub longest_edge: u32,
    pub method: ResizeMethod,
    pub fit_method: FitMethod,
    pub size_mode: SizingMode,
    /// Only meaningful for worker methods.
    pub premultiply_alpha: bool,
    /// Only meaningful for worker methods.
    pub linear_rgb: bool,
}

impl Default for ResizeConfiguration {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
            longest_edge: 1000,
            method: ResizeMethod::default(),
            fit_method: FitMethod::default(),
            size_mode: SizingMode::default(),
            premultiply_alpha: true,
            linear_rgb: true,
        }
    }
}

/// A configuration whose `width` and `height` are final.
///
/// Produced by [`pipeline::resolve`](crate::pipeline::resolve). In longest-edge
/// mode the fit method is always [`FitMethod::Stretch`]; `size_mode` and
/// `longest_edge` are kept for reporting only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedConfiguration {
    pub width: u32,
    pub height: u32,
    pub longest_edge: u32,
    pub method: ResizeMethod,
    pub fit_method: FitMethod,
    pub size_mode: SizingMode,
    pub premultiply_alpha: bool,
    pub linear_rgb: bool,
}

impl ResolvedConfiguration {
    /// The same target expressed as an explicit-dimensions configuration.
    pub fn to_configuration(&self) -> ResizeConfiguration {
        ResizeConfiguration {
            width: self.width,
            height: self.height,
            longest_edge: self.longest_edge,
            method: self.method,
            fit_method: self.fit_method,
            size_mode: SizingMode::Dimensions,
            premultiply_alpha: self.premultiply_alpha,
            linear_rgb: self.linear_rgb,
        }
    }

    /// Same target size and fit, executed by the highest built-in quality tier.
    pub fn builtin_fallback(&self) -> Self {
        Self {
            method: ResizeMethod::BuiltinHigh,
            ..*self
        }
    }

    pub fn worker_options(&self, method: WorkerMethod) -> WorkerOptions {
        WorkerOptions {
            width: self.width,
            height: self.height,
            method,
            fit_method: self.fit_method,
            size_mode: self.size_mode,
            longest_edge: self.longest_edge,
            premultiply_alpha: self.premultiply_alpha,
            linear_rgb: self.linear_rgb,
        }
    }
}

/// Source-space crop rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    /// True when the rectangle is non-empty and lies inside `bounds`.
    pub fn fits_within(&self, bounds: (u32, u32)) -> bool {
        self.width > 0
            && self.height > 0
            && u64::from(self.x) + u64::from(self.width) <= u64::from(bounds.0)
            && u64::from(self.y) + u64::from(self.height) <= u64::from(bounds.1)
    }
}

/// What the off-thread worker receives: target size and algorithm options, no crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerOptions {
    pub width: u32,
    pub height: u32,
    pub method: WorkerMethod,
    pub fit_method: FitMethod,
    pub size_mode: SizingMode,
    pub longest_edge: u32,
    pub premultiply_alpha: bool,
    pub linear_rgb: bool,
}
