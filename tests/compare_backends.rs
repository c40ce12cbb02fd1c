//! Worker and built-in backends should agree on smooth content.
//!
//! Both run the same family of kernels through different crates
//! (`fast_image_resize` and `image::imageops`), so on a gradient their outputs
//! differ only by rounding and edge handling.
//!
//! Run with: cargo test --test compare_backends -- --nocapture

use image::{Rgba, RgbaImage};
use sizewise::cancel::CancelToken;
use sizewise::imaging::params::{FitMethod, ResizeConfiguration, ResizeMethod};
use sizewise::imaging::{BuiltinResampler, ThreadWorker, VectorRasterizer};
use sizewise::pipeline::{self, Backends};
use sizewise::source::SourceImage;
use std::time::{Duration, Instant};

const SOURCE: (u32, u32) = (256, 192);

fn smooth_gradient(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let r = x * 255 / (width - 1);
        let g = y * 255 / (height - 1);
        let b = (x + y) * 255 / (width + height - 2);
        Rgba([r as u8, g as u8, b as u8, 255])
    })
}

fn backends() -> Backends<ThreadWorker, BuiltinResampler, VectorRasterizer> {
    Backends {
        worker: ThreadWorker::new(2, 100_000_000, Duration::from_millis(5)).unwrap(),
        builtin: BuiltinResampler::new(),
        vector: VectorRasterizer::new(),
    }
}

fn run(
    backends: &Backends<ThreadWorker, BuiltinResampler, VectorRasterizer>,
    source: &SourceImage,
    method: ResizeMethod,
    fit: FitMethod,
    target: (u32, u32),
) -> RgbaImage {
    let config = ResizeConfiguration {
        width: target.0,
        height: target.1,
        method,
        fit_method: fit,
        linear_rgb: false,
        ..ResizeConfiguration::default()
    };
    pipeline::resize(&CancelToken::new(), source, &config, backends, None).unwrap()
}

/// Mean absolute difference over all channels.
fn mean_abs_diff(a: &RgbaImage, b: &RgbaImage) -> f64 {
    assert_eq!(a.dimensions(), b.dimensions());
    let total: u64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(x, y)| u64::from(x.abs_diff(*y)))
        .sum();
    total as f64 / a.as_raw().len() as f64
}

#[test]
fn worker_and_builtin_agree() {
    let backends = backends();
    let source = SourceImage::from_raster(smooth_gradient(SOURCE.0, SOURCE.1));
    let pairs = [
        (ResizeMethod::Lanczos3, ResizeMethod::BuiltinHigh),
        (ResizeMethod::CatRom, ResizeMethod::BuiltinMedium),
        (ResizeMethod::Triangle, ResizeMethod::BuiltinLow),
    ];

    for (worker_method, builtin_method) in pairs {
        for (fit, target) in [
            (FitMethod::Stretch, (100, 75)),
            (FitMethod::Stretch, (40, 90)),
            (FitMethod::Contain, (64, 64)),
        ] {
            let start = Instant::now();
            let worker = run(&backends, &source, worker_method, fit, target);
            let worker_time = start.elapsed();
            let start = Instant::now();
            let builtin = run(&backends, &source, builtin_method, fit, target);
            let builtin_time = start.elapsed();

            let diff = mean_abs_diff(&worker, &builtin);
            println!(
                "{worker_method} vs {builtin_method} {fit} {}x{}: mean diff {diff:.2} ({worker_time:?} / {builtin_time:?})",
                target.0, target.1
            );
            assert!(
                diff < 4.0,
                "{worker_method} and {builtin_method} diverge on {fit} {target:?}: {diff}"
            );
        }
    }
}

#[test]
fn linear_rgb_darkens_mixed_edges_less() {
    // A fine black/white checkerboard averages to mid grey. In sRGB space the
    // average is ~128; in linear light it is ~188 once encoded back to sRGB.
    let backends = backends();
    let checker = RgbaImage::from_fn(64, 64, |x, y| {
        if (x + y) % 2 == 0 {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    });
    let source = SourceImage::from_raster(checker);
    let base = ResizeConfiguration {
        width: 8,
        height: 8,
        method: ResizeMethod::Triangle,
        fit_method: FitMethod::Stretch,
        ..ResizeConfiguration::default()
    };

    let srgb = pipeline::resize(
        &CancelToken::new(),
        &source,
        &ResizeConfiguration {
            linear_rgb: false,
            ..base
        },
        &backends,
        None,
    )
    .unwrap();
    let linear = pipeline::resize(
        &CancelToken::new(),
        &source,
        &ResizeConfiguration {
            linear_rgb: true,
            ..base
        },
        &backends,
        None,
    )
    .unwrap();

    let srgb_mid = srgb.get_pixel(4, 4).0[0];
    let linear_mid = linear.get_pixel(4, 4).0[0];
    println!("checkerboard average: sRGB {srgb_mid}, linear {linear_mid}");
    assert!(srgb_mid.abs_diff(128) <= 6, "{srgb_mid}");
    assert!(linear_mid.abs_diff(188) <= 6, "{linear_mid}");
}
