//! Vector rasterizer backed by `resvg`.
//!
//! The crop rectangle is expressed in the drawable's native units; it is mapped
//! onto the whole output pixmap with an independent x/y scale, so stretch and
//! contain both come down to choosing the right rectangle.

use super::backend::{BackendError, Rasterizer};
use super::params::CropRect;
use crate::source::VectorImage;
use image::{Rgba, RgbaImage};
use resvg::tiny_skia::Pixmap;
use resvg::usvg::Transform;

/// Renders a [`VectorImage`] straight to the target size.
pub struct VectorRasterizer;

impl VectorRasterizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for VectorRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer for VectorRasterizer {
    fn rasterize(
        &self,
        drawable: &VectorImage,
        crop: CropRect,
        width: u32,
        height: u32,
    ) -> Result<RgbaImage, BackendError> {
        if crop.width == 0 || crop.height == 0 {
            return Err(BackendError::InvalidArgument(format!(
                "empty crop {}x{}",
                crop.width, crop.height
            )));
        }
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
            BackendError::InvalidArgument(format!("cannot allocate a {width}x{height} pixmap"))
        })?;

        let scale_x = width as f32 / crop.width as f32;
        let scale_y = height as f32 / crop.height as f32;
        let transform =
            Transform::from_scale(scale_x, scale_y).pre_translate(-(crop.x as f32), -(crop.y as f32));
        resvg::render(drawable.tree(), transform, &mut pixmap.as_mut());

        Ok(pixmap_to_rgba(&pixmap))
    }
}

/// tiny-skia stores premultiplied RGBA; the rest of the pipeline expects straight alpha.
fn pixmap_to_rgba(pixmap: &Pixmap) -> RgbaImage {
    let mut out = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in out.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    out
}
