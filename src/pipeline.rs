//! Resize resolution and execution.
//!
//! ```text
//! ResizeConfiguration ─→ resolve ─→ select_backend ─→ execute ─→ RgbaImage
//!                                        │
//!                         ┌──────────────┼──────────────┐
//!                      Vector         Worker         Builtin
//!                                        │ OutOfBounds     ↑
//!                                        └─────────────────┘ (once)
//! ```
//!
//! [`resize`] is the single entry point callers need. It resolves the sizing
//! intent into explicit dimensions, routes the method to its backend family and
//! runs it. An out-of-bounds failure from the worker is retried exactly once on
//! the in-process resampler at the same size and fit; every other failure, and
//! any cancellation, propagates unchanged.

use crate::cancel::CancelToken;
use crate::config::SizewiseConfig;
use crate::imaging::backend::{BackendError, Rasterizer, Resampler, WorkerBackend};
use crate::imaging::builtin::BuiltinResampler;
use crate::imaging::calculations::{clamp_longest_edge, crop_for_fit, longest_edge_dimensions};
use crate::imaging::params::{
    BackendFamily, BuiltinQuality, FitMethod, ResizeConfiguration, ResizeMethod,
    ResolvedConfiguration, Route, SizingMode,
};
use crate::imaging::vector::VectorRasterizer;
use crate::imaging::worker::ThreadWorker;
use crate::source::SourceImage;
use image::RgbaImage;
use serde::Serialize;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResizeError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("vector method selected but the source has no vector image")]
    NoVectorSource,
    #[error("backend out of bounds: {0}")]
    BackendOutOfBounds(String),
    #[error("backend failure: {0}")]
    BackendFailure(#[source] BackendError),
    #[error("resize cancelled")]
    Cancelled,
}

impl From<BackendError> for ResizeError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Cancelled => ResizeError::Cancelled,
            BackendError::OutOfBounds(reason) => ResizeError::BackendOutOfBounds(reason),
            other => ResizeError::BackendFailure(other),
        }
    }
}

/// Progress reported while a request runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ResizeEvent {
    Resolved {
        width: u32,
        height: u32,
        fit_method: FitMethod,
        family: BackendFamily,
    },
    FallingBack {
        reason: String,
    },
    Completed {
        width: u32,
        height: u32,
        family: BackendFamily,
    },
}

/// The three backend handles, one per family.
pub struct Backends<W, B, V> {
    pub worker: W,
    pub builtin: B,
    pub vector: V,
}

impl Backends<ThreadWorker, BuiltinResampler, VectorRasterizer> {
    /// Production backends: a worker pool sized from config plus the in-process paths.
    pub fn from_config(config: &SizewiseConfig) -> Result<Self, BackendError> {
        Ok(Self {
            worker: ThreadWorker::from_config(&config.worker)?,
            builtin: BuiltinResampler::from_config(&config.builtin),
            vector: VectorRasterizer::new(),
        })
    }
}

impl<'a, T> Backends<&'a T, &'a T, &'a T> {
    /// One value serving all three roles.
    pub fn shared(backend: &'a T) -> Self {
        Self {
            worker: backend,
            builtin: backend,
            vector: backend,
        }
    }
}

/// Normalize a configuration into explicit target dimensions.
///
/// Dimensions mode passes width, height and fit through. Longest-edge mode
/// scales the source (the drawable's native size for the vector method, the
/// raster otherwise) so its longer side equals the clamped edge, and forces
/// [`FitMethod::Stretch`].
pub fn resolve(
    source: &SourceImage,
    config: &ResizeConfiguration,
) -> Result<ResolvedConfiguration, ResizeError> {
    let (width, height, fit_method, longest_edge) = match config.size_mode {
        SizingMode::Dimensions => {
            if config.width == 0 || config.height == 0 {
                return Err(ResizeError::InvalidConfiguration(format!(
                    "target {}x{} must be positive",
                    config.width, config.height
                )));
            }
            (config.width, config.height, config.fit_method, config.longest_edge)
        }
        SizingMode::LongestEdge => {
            let base = match (config.method, source.vector()) {
                (ResizeMethod::Vector, Some(vector)) => vector.dimensions(),
                _ => source.dimensions(),
            };
            if base.is_empty() {
                return Err(ResizeError::InvalidConfiguration(format!(
                    "cannot scale a {}x{} source",
                    base.width, base.height
                )));
            }
            let edge = clamp_longest_edge(config.longest_edge);
            let (w, h) = longest_edge_dimensions(base.as_tuple(), edge);
            (w, h, FitMethod::Stretch, edge)
        }
    };

    Ok(ResolvedConfiguration {
        width,
        height,
        longest_edge,
        method: config.method,
        fit_method,
        size_mode: config.size_mode,
        premultiply_alpha: config.premultiply_alpha,
        linear_rgb: config.linear_rgb,
    })
}

/// Route a resolved method to its backend, checking the vector precondition.
pub fn select_backend(
    resolved: &ResolvedConfiguration,
    source: &SourceImage,
) -> Result<Route, ResizeError> {
    let route = resolved.method.route();
    if route == Route::Vector && !source.is_vector() {
        return Err(ResizeError::NoVectorSource);
    }
    Ok(route)
}

fn emit(events: Option<&Sender<ResizeEvent>>, event: ResizeEvent) {
    if let Some(tx) = events {
        // A dropped receiver just means nobody is listening.
        tx.send(event).ok();
    }
}

/// Resize `source` according to `config`.
///
/// The result is exactly the resolved width × height. Cancellation is checked
/// before any backend runs and wins over every other outcome of the worker
/// path, including the fallback.
pub fn resize<W, B, V>(
    cancel: &CancelToken,
    source: &SourceImage,
    config: &ResizeConfiguration,
    backends: &Backends<W, B, V>,
    events: Option<&Sender<ResizeEvent>>,
) -> Result<RgbaImage, ResizeError>
where
    W: WorkerBackend,
    B: Resampler,
    V: Rasterizer,
{
    cancel.check()?;
    if source.dimensions().is_empty() {
        return Err(ResizeError::InvalidConfiguration(
            "source image is empty".to_string(),
        ));
    }

    let resolved = resolve(source, config)?;
    let route = select_backend(&resolved, source)?;
    tracing::debug!(
        width = resolved.width,
        height = resolved.height,
        method = %resolved.method,
        fit = %resolved.fit_method,
        family = %route.family(),
        "resolved resize request"
    );
    emit(
        events,
        ResizeEvent::Resolved {
            width: resolved.width,
            height: resolved.height,
            fit_method: resolved.fit_method,
            family: route.family(),
        },
    );

    let (output, family) = match route {
        Route::Vector => (run_vector(cancel, source, &resolved, &backends.vector)?, BackendFamily::Vector),
        Route::Builtin(quality) => (
            run_builtin(cancel, source, &resolved, quality, &backends.builtin)?,
            BackendFamily::InProcess,
        ),
        Route::Worker(method) => {
            let options = resolved.worker_options(method);
            match backends.worker.resize(cancel, source.raster(), &options) {
                Ok(image) => (image, BackendFamily::OffThread),
                Err(_) if cancel.is_cancelled() => return Err(ResizeError::Cancelled),
                Err(BackendError::OutOfBounds(reason)) => {
                    tracing::warn!(
                        %reason,
                        width = resolved.width,
                        height = resolved.height,
                        "worker out of bounds, retrying with the built-in resampler"
                    );
                    emit(events, ResizeEvent::FallingBack { reason });
                    let fallback = resolved.builtin_fallback();
                    (
                        run_builtin(cancel, source, &fallback, BuiltinQuality::High, &backends.builtin)?,
                        BackendFamily::InProcess,
                    )
                }
                Err(other) => return Err(other.into()),
            }
        }
    };

    if output.dimensions() != (resolved.width, resolved.height) {
        return Err(ResizeError::BackendFailure(BackendError::ProcessingFailed(format!(
            "{family} backend returned {}x{}, expected {}x{}",
            output.width(),
            output.height(),
            resolved.width,
            resolved.height
        ))));
    }

    tracing::info!(
        width = resolved.width,
        height = resolved.height,
        %family,
        "resize complete"
    );
    emit(
        events,
        ResizeEvent::Completed {
            width: resolved.width,
            height: resolved.height,
            family,
        },
    );
    Ok(output)
}

fn run_vector<V: Rasterizer>(
    cancel: &CancelToken,
    source: &SourceImage,
    resolved: &ResolvedConfiguration,
    rasterizer: &V,
) -> Result<RgbaImage, ResizeError> {
    let vector = source.vector().ok_or(ResizeError::NoVectorSource)?;
    cancel.check()?;
    let crop = crop_for_fit(
        resolved.fit_method,
        vector.dimensions().as_tuple(),
        (resolved.width, resolved.height),
    );
    let image = rasterizer.rasterize(vector, crop, resolved.width, resolved.height)?;
    cancel.check()?;
    Ok(image)
}

fn run_builtin<B: Resampler>(
    cancel: &CancelToken,
    source: &SourceImage,
    resolved: &ResolvedConfiguration,
    quality: BuiltinQuality,
    resampler: &B,
) -> Result<RgbaImage, ResizeError> {
    cancel.check()?;
    let raster = source.raster();
    let crop = crop_for_fit(
        resolved.fit_method,
        raster.dimensions(),
        (resolved.width, resolved.height),
    );
    let image = resampler.resample(raster, crop, resolved.width, resolved.height, quality)?;
    // Not preemptible; a token cancelled mid-resample still discards the pixels.
    cancel.check()?;
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{
        BUILTIN_FILL, MockBackend, RecordedOp, VECTOR_FILL, WORKER_FILL,
    };
    use crate::imaging::params::{CropRect, WorkerMethod};
    use crate::source::VectorImage;
    use crate::test_helpers::{gradient_image, two_tone_svg};
    use proptest::prelude::*;
    use std::sync::mpsc;

    fn raster(w: u32, h: u32) -> SourceImage {
        SourceImage::from_raster(RgbaImage::new(w, h))
    }

    fn dims(width: u32, height: u32, method: ResizeMethod, fit: FitMethod) -> ResizeConfiguration {
        ResizeConfiguration {
            width,
            height,
            method,
            fit_method: fit,
            ..ResizeConfiguration::default()
        }
    }

    fn longest(edge: u32, method: ResizeMethod) -> ResizeConfiguration {
        ResizeConfiguration {
            longest_edge: edge,
            method,
            fit_method: FitMethod::Contain,
            size_mode: SizingMode::LongestEdge,
            ..ResizeConfiguration::default()
        }
    }

    // =========================================================================
    // resolve tests
    // =========================================================================

    #[test]
    fn longest_edge_landscape_example() {
        let resolved = resolve(&raster(4000, 2000), &longest(1000, ResizeMethod::Lanczos3)).unwrap();
        assert_eq!((resolved.width, resolved.height), (1000, 500));
        assert_eq!(resolved.fit_method, FitMethod::Stretch);
    }

    #[test]
    fn longest_edge_portrait() {
        let resolved = resolve(&raster(1500, 3000), &longest(600, ResizeMethod::Lanczos3)).unwrap();
        assert_eq!((resolved.width, resolved.height), (300, 600));
    }

    #[test]
    fn longest_edge_is_clamped() {
        let resolved = resolve(&raster(100, 100), &longest(20000, ResizeMethod::Lanczos3)).unwrap();
        assert_eq!((resolved.width, resolved.height), (9999, 9999));
        assert_eq!(resolved.longest_edge, 9999);

        let resolved = resolve(&raster(100, 50), &longest(0, ResizeMethod::Lanczos3)).unwrap();
        assert_eq!((resolved.width, resolved.height), (1, 1));
    }

    #[test]
    fn longest_edge_uses_vector_size_for_vector_method() {
        let vector = VectorImage::from_data(two_tone_svg(100, 400).as_bytes()).unwrap();
        let source = SourceImage::from_vector(vector).unwrap();
        let resolved = resolve(&source, &longest(800, ResizeMethod::Vector)).unwrap();
        assert_eq!((resolved.width, resolved.height), (200, 800));
    }

    #[test]
    fn dimensions_pass_through() {
        let config = dims(800, 800, ResizeMethod::Mitchell, FitMethod::Contain);
        let resolved = resolve(&raster(1920, 1080), &config).unwrap();
        assert_eq!((resolved.width, resolved.height), (800, 800));
        assert_eq!(resolved.fit_method, FitMethod::Contain);
        assert_eq!(resolved.size_mode, SizingMode::Dimensions);
    }

    #[test]
    fn zero_dimensions_are_invalid() {
        let config = dims(0, 10, ResizeMethod::Lanczos3, FitMethod::Stretch);
        assert!(matches!(
            resolve(&raster(10, 10), &config),
            Err(ResizeError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn zero_base_is_invalid() {
        assert!(matches!(
            resolve(&raster(0, 10), &longest(100, ResizeMethod::Lanczos3)),
            Err(ResizeError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn resolving_dimensions_is_idempotent() {
        let source = raster(640, 480);
        let first = resolve(&source, &dims(320, 200, ResizeMethod::Hqx, FitMethod::Contain)).unwrap();
        let second = resolve(&source, &first.to_configuration()).unwrap();
        assert_eq!(first, second);
    }

    proptest! {
        #[test]
        fn longest_edge_hits_edge_and_keeps_aspect(
            w in 1u32..6000,
            h in 1u32..6000,
            edge in 0u32..12000,
        ) {
            let resolved = resolve(&raster(w, h), &longest(edge, ResizeMethod::Lanczos3)).unwrap();
            let clamped = edge.clamp(1, 9999);
            prop_assert_eq!(resolved.width.max(resolved.height), clamped);
            prop_assert_eq!(resolved.fit_method, FitMethod::Stretch);
            if w >= h {
                let exact = clamped as f64 * h as f64 / w as f64;
                prop_assert!((resolved.height as f64 - exact.max(1.0)).abs() <= 1.0);
            } else {
                let exact = clamped as f64 * w as f64 / h as f64;
                prop_assert!((resolved.width as f64 - exact.max(1.0)).abs() <= 1.0);
            }
        }
    }

    // =========================================================================
    // select_backend tests
    // =========================================================================

    #[test]
    fn vector_without_drawable_is_rejected() {
        let source = raster(10, 10);
        let resolved = resolve(&source, &dims(5, 5, ResizeMethod::Vector, FitMethod::Stretch)).unwrap();
        assert_eq!(select_backend(&resolved, &source), Err(ResizeError::NoVectorSource));
    }

    #[test]
    fn every_method_routes_to_its_family() {
        let source = raster(10, 10);
        for method in ResizeMethod::ALL.into_iter().filter(|m| *m != ResizeMethod::Vector) {
            let resolved = resolve(&source, &dims(5, 5, method, FitMethod::Stretch)).unwrap();
            let route = select_backend(&resolved, &source).unwrap();
            assert_eq!(route.family(), method.family());
        }
    }

    // =========================================================================
    // resize tests
    // =========================================================================

    #[test]
    fn worker_path_passes_options_without_crop() {
        let mock = MockBackend::new();
        let mut config = dims(800, 800, ResizeMethod::CatRom, FitMethod::Contain);
        config.linear_rgb = false;
        let out = resize(
            &CancelToken::new(),
            &raster(1920, 1080),
            &config,
            &Backends::shared(&mock),
            None,
        )
        .unwrap();
        assert_eq!(*out.get_pixel(0, 0), WORKER_FILL);
        assert_eq!(
            mock.get_operations(),
            vec![RecordedOp::Worker {
                width: 800,
                height: 800,
                method: WorkerMethod::CatRom,
                fit_method: FitMethod::Contain,
                premultiply_alpha: true,
                linear_rgb: false,
            }]
        );
    }

    #[test]
    fn builtin_path_crops_for_contain() {
        let mock = MockBackend::new();
        let config = dims(800, 800, ResizeMethod::BuiltinMedium, FitMethod::Contain);
        let out = resize(
            &CancelToken::new(),
            &raster(1920, 1080),
            &config,
            &Backends::shared(&mock),
            None,
        )
        .unwrap();
        assert_eq!(*out.get_pixel(0, 0), BUILTIN_FILL);
        assert_eq!(
            mock.get_operations(),
            vec![RecordedOp::Builtin {
                crop: CropRect {
                    x: 420,
                    y: 0,
                    width: 1080,
                    height: 1080
                },
                width: 800,
                height: 800,
                quality: BuiltinQuality::Medium,
            }]
        );
    }

    #[test]
    fn vector_path_crops_against_native_size() {
        let mock = MockBackend::new();
        let vector = VectorImage::from_data(two_tone_svg(200, 100).as_bytes()).unwrap();
        let source = SourceImage::from_vector(vector).unwrap();
        let config = dims(50, 50, ResizeMethod::Vector, FitMethod::Contain);
        let out = resize(&CancelToken::new(), &source, &config, &Backends::shared(&mock), None).unwrap();
        assert_eq!(*out.get_pixel(0, 0), VECTOR_FILL);
        assert_eq!(
            mock.get_operations(),
            vec![RecordedOp::Vector {
                crop: CropRect {
                    x: 50,
                    y: 0,
                    width: 100,
                    height: 100
                },
                width: 50,
                height: 50,
            }]
        );
    }

    #[test]
    fn out_of_bounds_retries_once_in_process() {
        let mock = MockBackend::failing_worker(BackendError::OutOfBounds("too big".into()));
        let config = dims(300, 200, ResizeMethod::Lanczos3, FitMethod::Stretch);
        let out = resize(
            &CancelToken::new(),
            &raster(100, 100),
            &config,
            &Backends::shared(&mock),
            None,
        )
        .unwrap();
        assert_eq!(out.dimensions(), (300, 200));
        assert_eq!(mock.count(|op| matches!(op, RecordedOp::Worker { .. })), 1);
        assert_eq!(
            mock.count(|op| matches!(
                op,
                RecordedOp::Builtin {
                    quality: BuiltinQuality::High,
                    ..
                }
            )),
            1
        );
    }

    #[test]
    fn fallback_matches_builtin_alone() {
        let source = SourceImage::from_raster(gradient_image(64, 40));
        let failing = MockBackend::failing_worker(BackendError::OutOfBounds("forced".into()));
        let real = BuiltinResampler::new();
        let backends = Backends {
            worker: &failing,
            builtin: &real,
            vector: &failing,
        };
        let config = dims(30, 30, ResizeMethod::Mitchell, FitMethod::Contain);
        let via_fallback = resize(&CancelToken::new(), &source, &config, &backends, None).unwrap();

        let direct_config = ResizeConfiguration {
            method: ResizeMethod::BuiltinHigh,
            ..config
        };
        let direct = resize(&CancelToken::new(), &source, &direct_config, &backends, None).unwrap();
        assert_eq!(via_fallback, direct);
    }

    #[test]
    fn other_worker_failures_propagate_without_retry() {
        let err = BackendError::UnsupportedMethod("hqx".into());
        let mock = MockBackend::failing_worker(err.clone());
        let result = resize(
            &CancelToken::new(),
            &raster(100, 100),
            &dims(10, 10, ResizeMethod::Hqx, FitMethod::Stretch),
            &Backends::shared(&mock),
            None,
        );
        assert_eq!(result, Err(ResizeError::BackendFailure(err)));
        assert_eq!(mock.count(|op| matches!(op, RecordedOp::Builtin { .. })), 0);
    }

    #[test]
    fn cancellation_during_worker_skips_fallback() {
        let token = CancelToken::new();
        let mock = MockBackend::cancelling_worker(
            token.clone(),
            BackendError::OutOfBounds("late".into()),
        );
        let result = resize(
            &token,
            &raster(100, 100),
            &dims(10, 10, ResizeMethod::Lanczos3, FitMethod::Stretch),
            &Backends::shared(&mock),
            None,
        );
        assert_eq!(result, Err(ResizeError::Cancelled));
        assert_eq!(mock.count(|op| matches!(op, RecordedOp::Builtin { .. })), 0);
    }

    #[test]
    fn cancellation_during_fallback_discards_pixels() {
        let token = CancelToken::new();
        let mock = MockBackend {
            worker_failure: Some(BackendError::OutOfBounds("too big".into())).into(),
            ..MockBackend::cancelling_in_process(token.clone())
        };
        let result = resize(
            &token,
            &raster(100, 100),
            &dims(10, 10, ResizeMethod::Lanczos3, FitMethod::Stretch),
            &Backends::shared(&mock),
            None,
        );
        assert_eq!(result, Err(ResizeError::Cancelled));
        assert_eq!(mock.count(|op| matches!(op, RecordedOp::Builtin { .. })), 1);
    }

    #[test]
    fn cancellation_during_in_process_paths_discards_pixels() {
        let vector = VectorImage::from_data(two_tone_svg(20, 10).as_bytes()).unwrap();
        let source = SourceImage::from_vector(vector).unwrap();
        for method in [ResizeMethod::BuiltinMedium, ResizeMethod::Vector] {
            let token = CancelToken::new();
            let mock = MockBackend::cancelling_in_process(token.clone());
            let result = resize(
                &token,
                &source,
                &dims(5, 5, method, FitMethod::Stretch),
                &Backends::shared(&mock),
                None,
            );
            assert_eq!(result, Err(ResizeError::Cancelled), "{method}");
            assert_eq!(mock.get_operations().len(), 1);
        }
    }

    #[test]
    fn cancelled_before_start_touches_nothing() {
        let token = CancelToken::new();
        token.cancel();
        let mock = MockBackend::new();
        for method in [ResizeMethod::Lanczos3, ResizeMethod::BuiltinLow] {
            let result = resize(
                &token,
                &raster(10, 10),
                &dims(5, 5, method, FitMethod::Stretch),
                &Backends::shared(&mock),
                None,
            );
            assert_eq!(result, Err(ResizeError::Cancelled));
        }
        assert!(mock.get_operations().is_empty());
    }

    #[test]
    fn empty_source_is_rejected() {
        let mock = MockBackend::new();
        let result = resize(
            &CancelToken::new(),
            &raster(0, 0),
            &dims(5, 5, ResizeMethod::Lanczos3, FitMethod::Stretch),
            &Backends::shared(&mock),
            None,
        );
        assert!(matches!(result, Err(ResizeError::InvalidConfiguration(_))));
        assert!(mock.get_operations().is_empty());
    }

    #[test]
    fn events_describe_fallback() {
        let mock = MockBackend::failing_worker(BackendError::OutOfBounds("too big".into()));
        let (tx, rx) = mpsc::channel();
        resize(
            &CancelToken::new(),
            &raster(40, 20),
            &longest(10, ResizeMethod::Triangle),
            &Backends::shared(&mock),
            Some(&tx),
        )
        .unwrap();
        drop(tx);
        let events: Vec<_> = rx.iter().collect();
        assert_eq!(
            events,
            vec![
                ResizeEvent::Resolved {
                    width: 10,
                    height: 5,
                    fit_method: FitMethod::Stretch,
                    family: BackendFamily::OffThread,
                },
                ResizeEvent::FallingBack {
                    reason: "too big".into()
                },
                ResizeEvent::Completed {
                    width: 10,
                    height: 5,
                    family: BackendFamily::InProcess,
                },
            ]
        );
    }

    #[test]
    fn backend_error_conversion() {
        assert_eq!(ResizeError::from(BackendError::Cancelled), ResizeError::Cancelled);
        assert_eq!(
            ResizeError::from(BackendError::OutOfBounds("x".into())),
            ResizeError::BackendOutOfBounds("x".into())
        );
        assert_eq!(
            ResizeError::from(BackendError::Disconnected),
            ResizeError::BackendFailure(BackendError::Disconnected)
        );
    }
}
