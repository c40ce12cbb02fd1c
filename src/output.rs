//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Resize
//!
//! ```text
//! photo.jpg 4000x2000 (raster)
//!     Resolved: 1000x500, stretch, worker
//!     Falling back to builtin: target 1000x500 exceeds the 1000 pixel limit
//!     Completed: 1000x500 via builtin
//! Wrote out.png
//! ```
//!
//! ## Presets
//!
//! ```text
//! photo.jpg 4000x2000 (raster)
//!       25%  1000x500
//!    33.33%  1333x667
//!       50%  2000x1000
//! *    100%  4000x2000
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>` or `String`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::form::Preset;
use crate::pipeline::ResizeEvent;
use crate::source::SourceImage;
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Multiplier as a percentage, without decimals when it is whole.
fn format_percent(multiplier: f64) -> String {
    let percent = multiplier * 100.0;
    if (percent - percent.round()).abs() < 1e-9 {
        format!("{}%", percent.round() as i64)
    } else {
        format!("{percent:.2}%")
    }
}

/// Header line for a source image.
///
/// ```text
/// photo.jpg 4000x2000 (raster)
/// logo.svg 120x80 (vector)
/// ```
pub fn format_source(path: &Path, source: &SourceImage) -> String {
    let name = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let dims = source.dimensions();
    let kind = if source.is_vector() { "vector" } else { "raster" };
    format!("{name} {}x{} ({kind})", dims.width, dims.height)
}

/// Format a single pipeline event as one indented line.
pub fn format_resize_event(event: &ResizeEvent) -> String {
    let body = match event {
        ResizeEvent::Resolved {
            width,
            height,
            fit_method,
            family,
        } => format!("Resolved: {width}x{height}, {fit_method}, {family}"),
        ResizeEvent::FallingBack { reason } => format!("Falling back to builtin: {reason}"),
        ResizeEvent::Completed {
            width,
            height,
            family,
        } => format!("Completed: {width}x{height} via {family}"),
    };
    format!("{}{body}", indent(1))
}

pub fn print_resize_event(event: &ResizeEvent) {
    println!("{}", format_resize_event(event));
}

/// One JSON object per event, for scripts.
///
/// ```text
/// {"event":"resolved","width":1000,"height":500,"fit_method":"stretch","family":"off-thread"}
/// ```
pub fn format_resize_event_json(event: &ResizeEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}

/// Format the preset table, marking the preset that matches the current size.
pub fn format_presets(path: &Path, source: &SourceImage, presets: &[(f64, (u32, u32))], current: Preset) -> Vec<String> {
    let mut lines = vec![format_source(path, source)];
    for &(multiplier, (w, h)) in presets {
        let marker = if current == Preset::Scale(multiplier) { "*" } else { " " };
        lines.push(format!("{marker} {:>7}  {w}x{h}", format_percent(multiplier)));
    }
    lines
}

pub fn print_presets(path: &Path, source: &SourceImage, presets: &[(f64, (u32, u32))], current: Preset) {
    for line in format_presets(path, source, presets, current) {
        println!("{line}");
    }
}
