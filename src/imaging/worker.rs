//! Off-thread resize backend.
//!
//! Jobs run on a dedicated rayon pool and report back over an mpsc channel.
//! The calling thread waits on the channel in `poll_interval` slices so it can
//! notice cancellation without the job's cooperation; the job itself checks the
//! token between stages and drops its work when cancelled.
//!
//! ## Kernels
//!
//! | Method | `fast_image_resize` algorithm |
//! |---|---|
//! | `lanczos3` | `Convolution(Lanczos3)` |
//! | `mitchell` | `Convolution(Mitchell)` |
//! | `catrom` | `Convolution(CatmullRom)` |
//! | `triangle` | `Convolution(Bilinear)` |
//! | `hqx` | integer `Nearest` pre-scale (×2..×4), then `Convolution(CatmullRom)` |
//!
//! `premultiply_alpha` maps to alpha-aware convolution. `linear_rgb` maps
//! the frame to 16-bit linear light with `fast_image_resize`'s sRGB mapper
//! before convolution and back afterwards.
//! Contain fit becomes a crop box computed by
//! [`contain_crop`](super::calculations::contain_crop).
//!
//! Requests whose source, target or intermediate frame exceed `max_pixels`,
//! or whose byte size overflows, fail with [`BackendError::OutOfBounds`].

use super::backend::{BackendError, Raster, WorkerBackend};
use super::calculations::crop_for_fit;
use super::params::{CropRect, WorkerMethod, WorkerOptions};
use crate::cancel::CancelToken;
use crate::config::{WorkerConfig, effective_threads};
use fast_image_resize::images::Image as FirImage;
use fast_image_resize::{
    FilterType, ImageBufferError, MappingError, PixelComponentMapper, PixelType, ResizeAlg,
    ResizeOptions, Resizer, create_srgb_mapper,
};
use image::RgbaImage;
use std::sync::{Arc, LazyLock};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

type JobResult = Result<RgbaImage, BackendError>;

static SRGB: LazyLock<PixelComponentMapper> = LazyLock::new(create_srgb_mapper);

/// Resizes on a private thread pool; the caller blocks only on the result channel.
pub struct ThreadWorker {
    pool: rayon::ThreadPool,
    max_pixels: u64,
    poll_interval: Duration,
}

impl ThreadWorker {
    pub fn new(threads: usize, max_pixels: u64, poll_interval: Duration) -> Result<Self, BackendError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("sizewise-worker-{i}"))
            .panic_handler(|_| tracing::error!("resize job panicked"))
            .build()
            .map_err(|e| BackendError::ProcessingFailed(format!("failed to start worker pool: {e}")))?;
        Ok(Self {
            pool,
            max_pixels,
            poll_interval,
        })
    }

    pub fn from_config(config: &WorkerConfig) -> Result<Self, BackendError> {
        Self::new(
            effective_threads(config),
            config.max_pixels,
            Duration::from_millis(config.poll_interval_ms),
        )
    }

    fn wait(&self, cancel: &CancelToken, rx: &Receiver<JobResult>) -> JobResult {
        loop {
            match rx.recv_timeout(self.poll_interval) {
                Ok(result) => {
                    // A result that raced with cancellation is discarded.
                    cancel.check()?;
                    return result;
                }
                Err(RecvTimeoutError::Timeout) => cancel.check()?,
                Err(RecvTimeoutError::Disconnected) => return Err(BackendError::Disconnected),
            }
        }
    }
}

impl WorkerBackend for ThreadWorker {
    fn resize(&self, cancel: &CancelToken, image: &Raster, options: &WorkerOptions) -> JobResult {
        cancel.check()?;
        check_bounds(image.dimensions(), options, self.max_pixels)?;

        tracing::debug!(
            width = options.width,
            height = options.height,
            method = ?options.method,
            premultiply = options.premultiply_alpha,
            linear_rgb = options.linear_rgb,
            "dispatching worker resize"
        );

        let (tx, rx) = mpsc::channel();
        let job_cancel = cancel.clone();
        let job_image = Arc::clone(image);
        let job_options = *options;
        let max_pixels = self.max_pixels;
        self.pool.spawn(move || {
            let result = run_job(&job_cancel, &job_image, &job_options, max_pixels);
            // Receiver is gone when the caller stopped waiting.
            tx.send(result).ok();
        });

        self.wait(cancel, &rx)
    }
}

/// Reject requests the pixel buffers cannot hold.
fn check_bounds(source: (u32, u32), options: &WorkerOptions, max_pixels: u64) -> Result<(), BackendError> {
    if source.0 == 0 || source.1 == 0 {
        return Err(BackendError::InvalidArgument(format!(
            "empty source {}x{}",
            source.0, source.1
        )));
    }
    if options.width == 0 || options.height == 0 {
        return Err(BackendError::InvalidArgument(format!(
            "empty target {}x{}",
            options.width, options.height
        )));
    }
    let bytes_per_pixel = bytes_per_pixel(options.linear_rgb);
    check_frame("source", source, max_pixels, bytes_per_pixel)?;
    check_frame("target", (options.width, options.height), max_pixels, bytes_per_pixel)
}

fn check_frame(label: &str, (w, h): (u32, u32), max_pixels: u64, bytes_per_pixel: usize) -> Result<(), BackendError> {
    let pixels = u64::from(w) * u64::from(h);
    if pixels > max_pixels {
        return Err(BackendError::OutOfBounds(format!(
            "{label} {w}x{h} exceeds the {max_pixels} pixel limit"
        )));
    }
    usize::try_from(pixels)
        .ok()
        .and_then(|p| p.checked_mul(bytes_per_pixel))
        .map(|_| ())
        .ok_or_else(|| BackendError::OutOfBounds(format!("{label} {w}x{h} byte size overflows")))
}

fn bytes_per_pixel(linear_rgb: bool) -> usize {
    if linear_rgb { 8 } else { 4 }
}

fn run_job(cancel: &CancelToken, image: &RgbaImage, options: &WorkerOptions, max_pixels: u64) -> JobResult {
    let crop = crop_for_fit(options.fit_method, image.dimensions(), (options.width, options.height));
    cancel.check()?;

    let pixel_type = if options.linear_rgb {
        PixelType::U16x4
    } else {
        PixelType::U8x4
    };
    let src = to_fir(image, options.linear_rgb)?;
    cancel.check()?;

    let dst = match options.method {
        WorkerMethod::Hqx => hqx_resize(cancel, &src, pixel_type, crop, options, max_pixels)?,
        method => resample(
            &src,
            pixel_type,
            crop,
            (options.width, options.height),
            ResizeAlg::Convolution(filter_for(method)),
            options.premultiply_alpha,
        )?,
    };
    cancel.check()?;

    from_fir(dst, options.linear_rgb)
}

fn filter_for(method: WorkerMethod) -> FilterType {
    match method {
        WorkerMethod::Lanczos3 => FilterType::Lanczos3,
        WorkerMethod::Mitchell => FilterType::Mitchell,
        WorkerMethod::CatRom | WorkerMethod::Hqx => FilterType::CatmullRom,
        WorkerMethod::Triangle => FilterType::Bilinear,
    }
}

/// Integer factor for the pixel-art pre-scale: enough to reach the target, at most ×4.
fn hqx_factor(crop: CropRect, target: (u32, u32)) -> u32 {
    let ratio = (target.0 as f64 / crop.width as f64).max(target.1 as f64 / crop.height as f64);
    (ratio.ceil() as u32).clamp(1, 4)
}

fn hqx_resize(
    cancel: &CancelToken,
    src: &FirImage<'_>,
    pixel_type: PixelType,
    crop: CropRect,
    options: &WorkerOptions,
    max_pixels: u64,
) -> Result<FirImage<'static>, BackendError> {
    let target = (options.width, options.height);
    let factor = hqx_factor(crop, target);
    let smooth = ResizeAlg::Convolution(filter_for(WorkerMethod::Hqx));
    if factor == 1 {
        return resample(src, pixel_type, crop, target, smooth, options.premultiply_alpha);
    }

    let scaled = (crop.width.checked_mul(factor), crop.height.checked_mul(factor));
    let (Some(up_w), Some(up_h)) = scaled else {
        return Err(BackendError::OutOfBounds(format!(
            "hqx x{factor} of {}x{} overflows",
            crop.width, crop.height
        )));
    };
    check_frame("hqx intermediate", (up_w, up_h), max_pixels, bytes_per_pixel(options.linear_rgb))?;

    let upscaled = resample(src, pixel_type, crop, (up_w, up_h), ResizeAlg::Nearest, false)?;
    cancel.check()?;
    if (up_w, up_h) == target {
        return Ok(upscaled);
    }
    resample(
        &upscaled,
        pixel_type,
        CropRect::full(up_w, up_h),
        target,
        smooth,
        options.premultiply_alpha,
    )
}

fn resample(
    src: &FirImage<'_>,
    pixel_type: PixelType,
    crop: CropRect,
    (width, height): (u32, u32),
    algorithm: ResizeAlg,
    use_alpha: bool,
) -> Result<FirImage<'static>, BackendError> {
    let mut dst = FirImage::new(width, height, pixel_type);
    let options = ResizeOptions::new()
        .resize_alg(algorithm)
        .use_alpha(use_alpha)
        .crop(
            f64::from(crop.x),
            f64::from(crop.y),
            f64::from(crop.width),
            f64::from(crop.height),
        );
    let mut resizer = Resizer::new();
    resizer
        .resize(src, &mut dst, &options)
        .map_err(|e| BackendError::ProcessingFailed(format!("fir resize error: {e:?}")))?;
    Ok(dst)
}

fn buffer_error(err: ImageBufferError) -> BackendError {
    match err {
        ImageBufferError::InvalidBufferSize => {
            BackendError::OutOfBounds("pixel buffer does not match image dimensions".into())
        }
        other => BackendError::ProcessingFailed(format!("fir image error: {other:?}")),
    }
}

fn mapping_error(err: MappingError) -> BackendError {
    BackendError::ProcessingFailed(format!("sRGB mapping error: {err}"))
}

fn to_fir(image: &RgbaImage, linear_rgb: bool) -> Result<FirImage<'static>, BackendError> {
    let (w, h) = image.dimensions();
    let narrow = FirImage::from_vec_u8(w, h, image.as_raw().clone(), PixelType::U8x4).map_err(buffer_error)?;
    if !linear_rgb {
        return Ok(narrow);
    }

    let mut wide = FirImage::new(w, h, PixelType::U16x4);
    SRGB.forward_map(&narrow, &mut wide).map_err(mapping_error)?;
    Ok(wide)
}

fn from_fir(image: FirImage<'static>, linear_rgb: bool) -> JobResult {
    let (w, h) = (image.width(), image.height());
    let narrow = if linear_rgb {
        let mut narrow = FirImage::new(w, h, PixelType::U8x4);
        SRGB.backward_map(&image, &mut narrow).map_err(mapping_error)?;
        narrow
    } else {
        image
    };
    RgbaImage::from_raw(w, h, narrow.into_vec())
        .ok_or_else(|| BackendError::OutOfBounds(format!("resized buffer too small for {w}x{h}")))
}
