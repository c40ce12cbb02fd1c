//! Source images: a decoded raster, plus the parsed drawable for SVG inputs.
//!
//! A [`SourceImage`] is read-only once built. Vector sources are rasterized
//! once at their native size so every method has raster pixels to work with;
//! the `vector` method renders from the drawable instead.

use crate::imaging::backend::{Dimensions, Rasterizer, Raster};
use crate::imaging::builtin::load_raster;
use crate::imaging::params::CropRect;
use crate::imaging::vector::VectorRasterizer;
use crate::imaging::BackendError;
use image::RgbaImage;
use resvg::usvg;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("SVG parse error: {0}")]
    Svg(String),
    #[error("failed to load image: {0}")]
    Decode(#[from] BackendError),
}

/// A parsed SVG document and its intrinsic pixel size.
pub struct VectorImage {
    tree: usvg::Tree,
    width: u32,
    height: u32,
}

impl VectorImage {
    pub fn from_data(data: &[u8]) -> Result<Self, SourceError> {
        let tree = usvg::Tree::from_data(data, &usvg::Options::default())
            .map_err(|e| SourceError::Svg(e.to_string()))?;
        let size = tree.size();
        Ok(Self {
            width: size.width().round().max(1.0) as u32,
            height: size.height().round().max(1.0) as u32,
            tree,
        })
    }

    pub fn tree(&self) -> &usvg::Tree {
        &self.tree
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }
}

impl fmt::Debug for VectorImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Input image state. Owned by the caller; the pipeline only reads it.
#[derive(Debug)]
pub struct SourceImage {
    raster: Raster,
    vector: Option<VectorImage>,
}

impl SourceImage {
    pub fn from_raster(raster: RgbaImage) -> Self {
        Self {
            raster: Arc::new(raster),
            vector: None,
        }
    }

    /// Keep the drawable and rasterize it once at its native size.
    pub fn from_vector(vector: VectorImage) -> Result<Self, SourceError> {
        let raster = VectorRasterizer::new().rasterize(
            &vector,
            CropRect::full(vector.width(), vector.height()),
            vector.width(),
            vector.height(),
        )?;
        Ok(Self {
            raster: Arc::new(raster),
            vector: Some(vector),
        })
    }

    /// Open a file: `.svg` becomes a vector source, anything else is decoded as a raster.
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let is_svg = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("svg"));
        if is_svg {
            let data = std::fs::read(path)?;
            return Self::from_vector(VectorImage::from_data(&data)?);
        }
        Ok(Self::from_raster(load_raster(path)?))
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn vector(&self) -> Option<&VectorImage> {
        self.vector.as_ref()
    }

    pub fn is_vector(&self) -> bool {
        self.vector.is_some()
    }

    /// Intrinsic size of the raster representation.
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::of(&self.raster)
    }
}
