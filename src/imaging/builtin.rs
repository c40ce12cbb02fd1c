//! In-process resampler and raster file I/O, built on the `image` crate.
//!
//! This backend is also the fallback target of the worker path, so it never
//! touches the worker pool.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` |
//! | Crop | `image::imageops::crop_imm` |
//! | Resample | `image::imageops::resize` |
//! | Encode (JPEG, PNG, TIFF, WebP) | `image::RgbaImage::save_with_format` |
//!
//! | Quality tier | Filter |
//! |---|---|
//! | pixelated | `Nearest` |
//! | low | `Triangle` |
//! | medium | `CatmullRom` |
//! | high | `Lanczos3` |
//!
//! `imageops::resize` allocates its output and, for every filter but
//! `Nearest`, an `Rgba<f32>` intermediate of crop width × target height.
//! Both are checked against `max_pixels` before anything is allocated, so an
//! impossible target is a [`BackendError::InvalidArgument`] rather than an abort.

use super::backend::{BackendError, Resampler};
use super::params::{BuiltinQuality, CropRect};
use crate::config::BuiltinConfig;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, ImageReader, RgbaImage};
use std::path::Path;

/// Extensions whose codecs are compiled in.
const RASTER_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

fn format_for(path: &Path) -> Option<ImageFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    RASTER_CANDIDATES
        .iter()
        .find(|(candidate, _)| *candidate == ext)
        .map(|(_, fmt)| *fmt)
}

/// Load and decode a raster image from disk as RGBA8.
pub fn load_raster(path: &Path) -> Result<RgbaImage, BackendError> {
    let reader = ImageReader::open(path).map_err(|e| {
        BackendError::InvalidArgument(format!("cannot open {}: {e}", path.display()))
    })?;
    let decoded = reader.with_guessed_format().map_err(|e| {
        BackendError::InvalidArgument(format!("cannot read {}: {e}", path.display()))
    })?;
    decoded
        .decode()
        .map(DynamicImage::into_rgba8)
        .map_err(|e| BackendError::ProcessingFailed(format!("failed to decode {}: {e}", path.display())))
}

/// Encode and save a raster, inferring the format from the extension.
///
/// JPEG has no alpha channel, so the image is flattened to RGB first.
pub fn save_raster(image: &RgbaImage, path: &Path) -> Result<(), BackendError> {
    let Some(format) = format_for(path) else {
        return Err(BackendError::UnsupportedMethod(format!(
            "unsupported output format: {}",
            path.display()
        )));
    };
    let result = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgba8(image.clone())
            .to_rgb8()
            .save_with_format(path, format),
        _ => image.save_with_format(path, format),
    };
    result.map_err(|e| BackendError::ProcessingFailed(format!("failed to encode {}: {e}", path.display())))
}

fn filter_for(quality: BuiltinQuality) -> FilterType {
    match quality {
        BuiltinQuality::Pixelated => FilterType::Nearest,
        BuiltinQuality::Low => FilterType::Triangle,
        BuiltinQuality::Medium => FilterType::CatmullRom,
        BuiltinQuality::High => FilterType::Lanczos3,
    }
}

/// Bytes per pixel of the output (`Rgba<u8>`) and the filter intermediate (`Rgba<f32>`).
const OUTPUT_BYTES: u64 = 4;
const INTERMEDIATE_BYTES: u64 = 16;

/// In-process backend using `image::imageops`.
///
/// See the [module docs](self) for the quality-to-filter mapping.
pub struct BuiltinResampler {
    max_pixels: u64,
}

impl BuiltinResampler {
    pub fn new() -> Self {
        Self::from_config(&BuiltinConfig::default())
    }

    pub fn with_max_pixels(max_pixels: u64) -> Self {
        Self { max_pixels }
    }

    pub fn from_config(config: &BuiltinConfig) -> Self {
        Self::with_max_pixels(config.max_pixels)
    }

    /// Reject targets whose buffers would exceed the pixel ceiling or the address space.
    fn check_allocation(&self, crop: CropRect, width: u32, height: u32, filter: FilterType) -> Result<(), BackendError> {
        self.check_frame("target", u64::from(width), u64::from(height), OUTPUT_BYTES)?;
        if filter != FilterType::Nearest {
            self.check_frame(
                "filter intermediate",
                u64::from(crop.width),
                u64::from(height),
                INTERMEDIATE_BYTES,
            )?;
        }
        Ok(())
    }

    fn check_frame(&self, label: &str, width: u64, height: u64, bytes_per_pixel: u64) -> Result<(), BackendError> {
        let pixels = width * height;
        if pixels > self.max_pixels {
            return Err(BackendError::InvalidArgument(format!(
                "{label} {width}x{height} exceeds the {} pixel limit",
                self.max_pixels
            )));
        }
        pixels
            .checked_mul(bytes_per_pixel)
            .and_then(|bytes| usize::try_from(bytes).ok())
            .map(|_| ())
            .ok_or_else(|| BackendError::InvalidArgument(format!("{label} {width}x{height} byte size overflows")))
    }
}

impl Default for BuiltinResampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Resampler for BuiltinResampler {
    fn resample(
        &self,
        image: &RgbaImage,
        crop: CropRect,
        width: u32,
        height: u32,
        quality: BuiltinQuality,
    ) -> Result<RgbaImage, BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::InvalidArgument(format!(
                "empty target {width}x{height}"
            )));
        }
        if !crop.fits_within(image.dimensions()) {
            return Err(BackendError::InvalidArgument(format!(
                "crop {}x{}+{}+{} outside {}x{} source",
                crop.width,
                crop.height,
                crop.x,
                crop.y,
                image.width(),
                image.height()
            )));
        }

        let filter = filter_for(quality);
        self.check_allocation(crop, width, height, filter)?;
        if crop == CropRect::full(image.width(), image.height()) {
            return Ok(imageops::resize(image, width, height, filter));
        }
        let cropped = imageops::crop_imm(image, crop.x, crop.y, crop.width, crop.height).to_image();
        Ok(imageops::resize(&cropped, width, height, filter))
    }
}
