//! Option form controller.
//!
//! Sits between raw user input and the pipeline. Numeric fields are held as
//! the text the user typed; every edit re-validates the whole form and only a
//! fully valid [`ResizeConfiguration`] is reported. An invalid edit leaves the
//! last reported configuration in place until it is corrected.
//!
//! With the aspect lock on (the default), editing one edge recomputes the
//! other from the source's intrinsic aspect ratio.

use crate::imaging::calculations::{
    SIZE_PRESETS, height_for_width, preset_dimensions, width_for_height,
};
use crate::imaging::params::{
    FitMethod, MAX_DIMENSION, ResizeConfiguration, ResizeMethod, SizingMode,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormError {
    #[error("{field} is not a number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },
    #[error("method {0} is not available for this source")]
    MethodUnavailable(ResizeMethod),
    #[error("{0} cannot be changed in the current form state")]
    NotApplicable(&'static str),
    #[error("invalid preset multiplier {0}")]
    InvalidPreset(f64),
}

/// Preset selection: a scale multiplier, or hand-entered dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Preset {
    Scale(f64),
    Custom,
}

#[derive(Debug, Clone)]
struct Fields {
    width: String,
    height: String,
    longest_edge: String,
}

impl Fields {
    fn from_configuration(config: &ResizeConfiguration) -> Self {
        Self {
            width: config.width.to_string(),
            height: config.height.to_string(),
            longest_edge: config.longest_edge.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OptionForm {
    intrinsic: (u32, u32),
    is_vector: bool,
    maintain_aspect: bool,
    fields: Fields,
    method: ResizeMethod,
    fit_method: FitMethod,
    size_mode: SizingMode,
    premultiply_alpha: bool,
    linear_rgb: bool,
    presets: Vec<(f64, (u32, u32))>,
    reported: ResizeConfiguration,
}

impl OptionForm {
    /// Start a form for a source of `intrinsic` size, showing `initial`.
    pub fn new(intrinsic: (u32, u32), is_vector: bool, initial: ResizeConfiguration) -> Self {
        Self {
            intrinsic,
            is_vector,
            maintain_aspect: true,
            fields: Fields::from_configuration(&initial),
            method: initial.method,
            fit_method: initial.fit_method,
            size_mode: initial.size_mode,
            premultiply_alpha: initial.premultiply_alpha,
            linear_rgb: initial.linear_rgb,
            presets: preset_table(intrinsic),
            reported: initial,
        }
    }

    /// The last configuration that passed validation.
    pub fn configuration(&self) -> ResizeConfiguration {
        self.reported
    }

    pub fn maintain_aspect(&self) -> bool {
        self.maintain_aspect
    }

    /// Intrinsic width / height of the source.
    pub fn aspect(&self) -> f64 {
        self.intrinsic.0.max(1) as f64 / self.intrinsic.1.max(1) as f64
    }

    /// Methods the form offers; `vector` only for vector sources.
    pub fn available_methods(&self) -> Vec<ResizeMethod> {
        ResizeMethod::available_for(self.is_vector).collect()
    }

    /// Whether the premultiply / linear-RGB toggles are shown.
    pub fn offers_worker_flags(&self) -> bool {
        self.method.uses_worker_flags()
    }

    /// The fit selector is only shown for unlocked explicit dimensions.
    pub fn fit_method_editable(&self) -> bool {
        self.size_mode == SizingMode::Dimensions && !self.maintain_aspect
    }

    /// The source changed size: presets and the aspect lock follow it.
    pub fn set_intrinsic(&mut self, width: u32, height: u32) {
        if self.intrinsic != (width, height) {
            self.intrinsic = (width, height);
            self.presets = preset_table(self.intrinsic);
        }
    }

    pub fn set_width(&mut self, input: &str) -> Result<ResizeConfiguration, FormError> {
        self.fields.width = input.to_string();
        if self.maintain_aspect {
            if let Ok(width) = input.trim().parse::<u32>() {
                self.fields.height = height_for_width(width, self.aspect()).to_string();
            }
        }
        self.report()
    }

    pub fn set_height(&mut self, input: &str) -> Result<ResizeConfiguration, FormError> {
        self.fields.height = input.to_string();
        if self.maintain_aspect {
            if let Ok(height) = input.trim().parse::<u32>() {
                self.fields.width = width_for_height(height, self.aspect()).to_string();
            }
        }
        self.report()
    }

    pub fn set_longest_edge(&mut self, input: &str) -> Result<ResizeConfiguration, FormError> {
        self.fields.longest_edge = input.to_string();
        self.report()
    }

    pub fn set_method(&mut self, method: ResizeMethod) -> Result<ResizeConfiguration, FormError> {
        if method == ResizeMethod::Vector && !self.is_vector {
            return Err(FormError::MethodUnavailable(method));
        }
        self.method = method;
        self.report()
    }

    pub fn set_fit_method(&mut self, fit: FitMethod) -> Result<ResizeConfiguration, FormError> {
        if !self.fit_method_editable() {
            return Err(FormError::NotApplicable("fit method"));
        }
        self.fit_method = fit;
        self.report()
    }

    pub fn set_size_mode(&mut self, mode: SizingMode) -> Result<ResizeConfiguration, FormError> {
        self.size_mode = mode;
        self.report()
    }

    pub fn set_premultiply_alpha(&mut self, on: bool) -> Result<ResizeConfiguration, FormError> {
        if !self.offers_worker_flags() {
            return Err(FormError::NotApplicable("premultiply alpha"));
        }
        self.premultiply_alpha = on;
        self.report()
    }

    pub fn set_linear_rgb(&mut self, on: bool) -> Result<ResizeConfiguration, FormError> {
        if !self.offers_worker_flags() {
            return Err(FormError::NotApplicable("linear RGB"));
        }
        self.linear_rgb = on;
        self.report()
    }

    /// Toggle the aspect lock. Turning it back on snaps height to the current width.
    ///
    /// Re-locking only takes effect if the snapped fields validate; otherwise
    /// the lock stays off and the fields are unchanged.
    pub fn set_maintain_aspect(&mut self, on: bool) -> Result<ResizeConfiguration, FormError> {
        if self.maintain_aspect || !on {
            self.maintain_aspect = on;
            return Ok(self.reported);
        }
        let width = parse_number("width", &self.fields.width)?;
        let snapped = height_for_width(width, self.aspect()).to_string();
        let previous_height = std::mem::replace(&mut self.fields.height, snapped);
        self.maintain_aspect = true;
        self.report().inspect_err(|_| {
            self.maintain_aspect = false;
            self.fields.height = previous_height;
        })
    }

    /// The preset matching the reported dimensions, or `Custom`.
    pub fn preset(&self) -> Preset {
        if self.reported.size_mode != SizingMode::Dimensions {
            return Preset::Custom;
        }
        let current = (self.reported.width, self.reported.height);
        self.presets
            .iter()
            .find(|(_, dims)| *dims == current)
            .map_or(Preset::Custom, |(m, _)| Preset::Scale(*m))
    }

    /// Preset multipliers with the dimensions each produces for this source.
    pub fn presets(&self) -> &[(f64, (u32, u32))] {
        &self.presets
    }

    /// Apply a preset. `Custom` changes nothing.
    pub fn select_preset(&mut self, preset: Preset) -> Result<ResizeConfiguration, FormError> {
        let multiplier = match preset {
            Preset::Custom => return Ok(self.reported),
            Preset::Scale(m) if m.is_finite() && m > 0.0 => m,
            Preset::Scale(m) => return Err(FormError::InvalidPreset(m)),
        };
        let (width, height) = preset_dimensions(self.intrinsic, multiplier);
        self.fields.width = width.to_string();
        self.fields.height = height.to_string();
        self.report()
    }

    /// Validate every field and, if all pass, record and return the configuration.
    fn report(&mut self) -> Result<ResizeConfiguration, FormError> {
        let (width, height, longest_edge) = match self.size_mode {
            SizingMode::Dimensions => (
                parse_dimension("width", &self.fields.width, u32::MAX)?,
                parse_dimension("height", &self.fields.height, u32::MAX)?,
                parse_number("longest edge", &self.fields.longest_edge)
                    .unwrap_or(self.reported.longest_edge),
            ),
            SizingMode::LongestEdge => (
                parse_number("width", &self.fields.width).unwrap_or(self.reported.width),
                parse_number("height", &self.fields.height).unwrap_or(self.reported.height),
                parse_dimension("longest edge", &self.fields.longest_edge, MAX_DIMENSION)?,
            ),
        };
        let fit_method = match self.size_mode {
            SizingMode::LongestEdge => FitMethod::Stretch,
            SizingMode::Dimensions => self.fit_method,
        };

        self.reported = ResizeConfiguration {
            width,
            height,
            longest_edge,
            method: self.method,
            fit_method,
            size_mode: self.size_mode,
            premultiply_alpha: self.premultiply_alpha,
            linear_rgb: self.linear_rgb,
        };
        tracing::trace!(config = ?self.reported, "form reported configuration");
        Ok(self.reported)
    }
}

fn preset_table(intrinsic: (u32, u32)) -> Vec<(f64, (u32, u32))> {
    SIZE_PRESETS
        .iter()
        .map(|&m| (m, preset_dimensions(intrinsic, m)))
        .collect()
}

fn parse_number(field: &'static str, input: &str) -> Result<u32, FormError> {
    input.trim().parse().map_err(|_| FormError::InvalidNumber {
        field,
        value: input.to_string(),
    })
}

fn parse_dimension(field: &'static str, input: &str, max: u32) -> Result<u32, FormError> {
    let value = parse_number(field, input)?;
    if value == 0 || value > max {
        return Err(FormError::OutOfRange {
            field,
            value,
            min: 1,
            max,
        });
    }
    Ok(value)
}
