//! Pure calculation functions for resize dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::{CropRect, FitMethod, MAX_DIMENSION};

/// Scale multipliers offered as presets in dimensions mode.
pub const SIZE_PRESETS: [f64; 7] = [0.25, 0.3333, 0.5, 1.0, 2.0, 3.0, 4.0];

/// Clamp a requested longest edge into `1..=MAX_DIMENSION`.
pub fn clamp_longest_edge(longest_edge: u32) -> u32 {
    longest_edge.clamp(1, MAX_DIMENSION)
}

/// Calculate target dimensions that put `longest_edge` on the longer side of `base`.
///
/// Landscape and square sources take the edge on their width; portrait sources
/// on their height. The other side is scaled proportionally, rounded, and never
/// drops below one pixel. `base` must be non-zero in both dimensions.
///
/// # Examples
/// ```
/// # use sizewise::imaging::calculations::longest_edge_dimensions;
/// assert_eq!(longest_edge_dimensions((4000, 2000), 1000), (1000, 500));
/// assert_eq!(longest_edge_dimensions((1500, 2000), 1000), (750, 1000));
/// ```
pub fn longest_edge_dimensions(base: (u32, u32), longest_edge: u32) -> (u32, u32) {
    let (base_w, base_h) = base;
    let edge = clamp_longest_edge(longest_edge);

    if base_w >= base_h {
        // Landscape or square: width is the longest edge
        let h = (edge as f64 * base_h as f64 / base_w as f64).round() as u32;
        (edge, h.max(1))
    } else {
        // Portrait: height is the longest edge
        let w = (edge as f64 * base_w as f64 / base_h as f64).round() as u32;
        (w.max(1), edge)
    }
}

/// Centered crop of `source` that matches the aspect ratio of `target`.
///
/// The dimension that is too large for the target aspect is trimmed
/// symmetrically. Zero-sized inputs are treated as one pixel so the result is
/// always at least 1x1 and inside the source.
///
/// # Examples
/// ```
/// # use sizewise::imaging::calculations::contain_crop;
/// let crop = contain_crop((1920, 1080), (800, 800));
/// assert_eq!((crop.x, crop.y, crop.width, crop.height), (420, 0, 1080, 1080));
/// ```
pub fn contain_crop(source: (u32, u32), target: (u32, u32)) -> CropRect {
    let src_w = source.0.max(1);
    let src_h = source.1.max(1);
    let tgt_w = target.0.max(1);
    let tgt_h = target.1.max(1);

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if tgt_aspect > src_aspect {
        // Target is wider: keep full width, trim top and bottom
        let h = ((src_w as f64 / tgt_aspect).round() as u32).clamp(1, src_h);
        CropRect {
            x: 0,
            y: (src_h - h) / 2,
            width: src_w,
            height: h,
        }
    } else {
        // Target is taller (or equal): keep full height, trim left and right
        let w = ((src_h as f64 * tgt_aspect).round() as u32).clamp(1, src_w);
        CropRect {
            x: (src_w - w) / 2,
            y: 0,
            width: w,
            height: src_h,
        }
    }
}

/// Source rectangle to sample for a fit method.
pub fn crop_for_fit(fit: FitMethod, source: (u32, u32), target: (u32, u32)) -> CropRect {
    match fit {
        FitMethod::Stretch => CropRect::full(source.0, source.1),
        FitMethod::Contain => contain_crop(source, target),
    }
}

/// Dimensions a preset multiplier produces for an intrinsic size.
pub fn preset_dimensions(intrinsic: (u32, u32), multiplier: f64) -> (u32, u32) {
    (
        (intrinsic.0 as f64 * multiplier).round() as u32,
        (intrinsic.1 as f64 * multiplier).round() as u32,
    )
}

/// Height matching `width` at the given width/height aspect ratio.
pub fn height_for_width(width: u32, aspect: f64) -> u32 {
    (width as f64 / aspect).round() as u32
}

/// Width matching `height` at the given width/height aspect ratio.
pub fn width_for_height(height: u32, aspect: f64) -> u32 {
    (height as f64 * aspect).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // =========================================================================
    // longest_edge_dimensions tests
    // =========================================================================

    #[test]
    fn longest_edge_landscape() {
        assert_eq!(longest_edge_dimensions((4000, 2000), 1000), (1000, 500));
    }

    #[test]
    fn longest_edge_portrait() {
        assert_eq!(longest_edge_dimensions((1500, 2000), 1000), (750, 1000));
    }

    #[test]
    fn longest_edge_square_uses_width() {
        assert_eq!(longest_edge_dimensions((512, 512), 300), (300, 300));
    }

    #[test]
    fn longest_edge_clamps_to_max() {
        assert_eq!(longest_edge_dimensions((2000, 1000), 20000), (9999, 5000));
    }

    #[test]
    fn longest_edge_zero_becomes_one() {
        assert_eq!(longest_edge_dimensions((300, 200), 0), (1, 1));
    }

    #[test]
    fn longest_edge_extreme_aspect_keeps_one_pixel() {
        // 10000:1 panorama at edge 100 would round the height to 0
        assert_eq!(longest_edge_dimensions((10000, 1), 100), (100, 1));
    }

    // =========================================================================
    // contain_crop tests
    // =========================================================================

    #[test]
    fn contain_square_from_landscape() {
        let crop = contain_crop((1920, 1080), (800, 800));
        assert_eq!(
            crop,
            CropRect {
                x: 420,
                y: 0,
                width: 1080,
                height: 1080
            }
        );
    }

    #[test]
    fn contain_wide_from_square() {
        // 1000x1000 → 2:1 target keeps full width, trims to 500 high
        let crop = contain_crop((1000, 1000), (400, 200));
        assert_eq!(
            crop,
            CropRect {
                x: 0,
                y: 250,
                width: 1000,
                height: 500
            }
        );
    }

    #[test]
    fn contain_same_aspect_is_full_frame() {
        assert_eq!(contain_crop((800, 600), (400, 300)), CropRect::full(800, 600));
    }

    #[test]
    fn contain_degenerate_is_at_least_one_pixel() {
        let crop = contain_crop((1, 1000), (1000, 1));
        assert!(crop.width >= 1 && crop.height >= 1);
        assert!(crop.fits_within((1, 1000)));
    }

    #[test]
    fn stretch_is_full_frame() {
        assert_eq!(
            crop_for_fit(FitMethod::Stretch, (640, 480), (10, 300)),
            CropRect::full(640, 480)
        );
    }

    // =========================================================================
    // preset and aspect helpers
    // =========================================================================

    #[test]
    fn preset_third_rounds() {
        // 0.3333 × 1920 = 639.94 → 640
        assert_eq!(preset_dimensions((1920, 1080), 0.3333), (640, 360));
    }

    #[test]
    fn aspect_helpers_round_to_nearest() {
        let aspect = 1920.0 / 1080.0;
        assert_eq!(height_for_width(800, aspect), 450);
        assert_eq!(width_for_height(450, aspect), 800);
        // 3:2 at width 1001 → 667.33 → 667
        assert_eq!(height_for_width(1001, 1.5), 667);
    }

    // =========================================================================
    // properties
    // =========================================================================

    proptest! {
        #[test]
        fn longest_edge_hits_clamped_edge(
            w in 1u32..20_000,
            h in 1u32..20_000,
            edge in 0u32..20_000,
        ) {
            let (tw, th) = longest_edge_dimensions((w, h), edge);
            prop_assert_eq!(tw.max(th), clamp_longest_edge(edge));
            prop_assert!(tw >= 1 && th >= 1);
        }

        #[test]
        fn longest_edge_preserves_aspect(
            w in 1u32..10_000,
            h in 1u32..10_000,
            edge in 1u32..=9999,
        ) {
            let (tw, th) = longest_edge_dimensions((w, h), edge);
            if w >= h {
                let exact = edge as f64 * h as f64 / w as f64;
                prop_assert!((th as f64 - exact.max(1.0)).abs() <= 1.0);
            } else {
                let exact = edge as f64 * w as f64 / h as f64;
                prop_assert!((tw as f64 - exact.max(1.0)).abs() <= 1.0);
            }
        }

        #[test]
        fn contain_crop_is_inside_source_and_matches_aspect(
            sw in 1u32..5000,
            sh in 1u32..5000,
            tw in 1u32..5000,
            th in 1u32..5000,
        ) {
            let crop = contain_crop((sw, sh), (tw, th));
            prop_assert!(crop.fits_within((sw, sh)));

            // One side is untouched; the other is within a pixel of the exact ratio.
            let target_aspect = tw as f64 / th as f64;
            if crop.width == sw {
                let exact = sw as f64 / target_aspect;
                prop_assert!((crop.height as f64 - exact.clamp(1.0, sh as f64)).abs() <= 1.0);
            } else {
                prop_assert_eq!(crop.height, sh);
                let exact = sh as f64 * target_aspect;
                prop_assert!((crop.width as f64 - exact.clamp(1.0, sw as f64)).abs() <= 1.0);
            }
        }
    }
}
