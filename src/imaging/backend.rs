//! Resize backend traits and shared types.
//!
//! Three boundaries, one per backend family:
//!
//! | Trait | Family | Production implementation |
//! |---|---|---|
//! | [`WorkerBackend`] | off-thread | [`ThreadWorker`](super::worker::ThreadWorker) |
//! | [`Resampler`] | in-process | [`BuiltinResampler`](super::builtin::BuiltinResampler) |
//! | [`Rasterizer`] | vector | [`VectorRasterizer`](super::vector::VectorRasterizer) |
//!
//! Failures cross every boundary as a [`BackendError`]. The pipeline decides
//! what to retry by matching on the variant; messages are for humans only.

use super::params::{BuiltinQuality, CropRect, WorkerOptions};
use crate::cancel::CancelToken;
use crate::source::VectorImage;
use image::RgbaImage;
use std::sync::Arc;
use thiserror::Error;

/// Decoded raster shared between the caller and worker threads.
pub type Raster = Arc<RgbaImage>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Offset, size or memory bound exceeded. The in-process path can usually
    /// still handle the request.
    #[error("offset is out of bounds: {0}")]
    OutOfBounds(String),
    #[error("operation cancelled")]
    Cancelled,
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("processing failed: {0}")]
    ProcessingFailed(String),
    /// The worker went away without sending a result.
    #[error("worker disconnected before returning a result")]
    Disconnected,
}

/// Width and height of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn of(image: &RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Off-thread algorithmic resampler.
///
/// Receives the full source frame and the target options; fit handling is the
/// backend's own business. Implementations must observe `cancel` and return
/// [`BackendError::Cancelled`] instead of partial pixels.
pub trait WorkerBackend: Sync {
    fn resize(
        &self,
        cancel: &CancelToken,
        image: &Raster,
        options: &WorkerOptions,
    ) -> Result<RgbaImage, BackendError>;
}

/// Synchronous in-process resampler. Only fails on invalid arguments.
pub trait Resampler: Sync {
    fn resample(
        &self,
        image: &RgbaImage,
        crop: CropRect,
        width: u32,
        height: u32,
        quality: BuiltinQuality,
    ) -> Result<RgbaImage, BackendError>;
}

/// Synchronous vector rasterizer. `crop` is in the drawable's native units.
pub trait Rasterizer: Sync {
    fn rasterize(
        &self,
        drawable: &VectorImage,
        crop: CropRect,
        width: u32,
        height: u32,
    ) -> Result<RgbaImage, BackendError>;
}

// Borrowed backends, so one instance can serve several roles.

impl<T: WorkerBackend + ?Sized> WorkerBackend for &T {
    fn resize(
        &self,
        cancel: &CancelToken,
        image: &Raster,
        options: &WorkerOptions,
    ) -> Result<RgbaImage, BackendError> {
        (**self).resize(cancel, image, options)
    }
}

impl<T: Resampler + ?Sized> Resampler for &T {
    fn resample(
        &self,
        image: &RgbaImage,
        crop: CropRect,
        width: u32,
        height: u32,
        quality: BuiltinQuality,
    ) -> Result<RgbaImage, BackendError> {
        (**self).resample(image, crop, width, height, quality)
    }
}

impl<T: Rasterizer + ?Sized> Rasterizer for &T {
    fn rasterize(
        &self,
        drawable: &VectorImage,
        crop: CropRect,
        width: u32,
        height: u32,
    ) -> Result<RgbaImage, BackendError> {
        (**self).rasterize(drawable, crop, width, height)
    }
}
