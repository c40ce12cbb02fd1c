//! Shared test utilities: synthetic rasters and SVG documents.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let raster = gradient_image(64, 48);
//! let svg = VectorImage::from_data(two_tone_svg(200, 100).as_bytes()).unwrap();
//! ```

use image::{Rgba, RgbaImage};

// =========================================================================
// Rasters
// =========================================================================

/// Opaque image whose red channel ramps left to right and green top to bottom.
///
/// Every pixel differs from its neighbours, so crops and flips are visible.
pub fn gradient_image(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(2).saturating_sub(1).max(1)).min(255) as u8;
        let g = (y * 255 / height.max(2).saturating_sub(1).max(1)).min(255) as u8;
        Rgba([r, g, 128, 255])
    })
}

// =========================================================================
// SVG
// =========================================================================

/// SVG whose left half is red and right half blue, drawn without antialiasing.
pub fn two_tone_svg(width: u32, height: u32) -> String {
    let half = width / 2;
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" shape-rendering="crispEdges">
  <rect x="0" y="0" width="{width}" height="{height}" fill="#0000ff"/>
  <rect x="0" y="0" width="{half}" height="{height}" fill="#ff0000"/>
</svg>"##
    )
}
