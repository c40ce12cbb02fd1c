//! Image processing: parameter types, dimension math and the three backends.
//!
//! | Family | Backend | Crate |
//! |---|---|---|
//! | **Off-thread** | [`ThreadWorker`] | `rayon` pool + `fast_image_resize` |
//! | **In-process** | [`BuiltinResampler`] | `image::imageops` |
//! | **Vector** | [`VectorRasterizer`] | `resvg` |
//!
//! The module is split into:
//! - **Parameters**: data structures describing a resize request ([`params`])
//! - **Calculations**: pure functions for dimension and crop math (unit testable)
//! - **Backend**: the boundary traits, [`BackendError`] and recording mocks
//! - **Implementations**: [`worker`], [`builtin`], [`vector`]

pub mod backend;
pub mod builtin;
pub mod calculations;
pub mod params;
pub mod vector;
pub mod worker;

pub use backend::{BackendError, Dimensions, Raster, Rasterizer, Resampler, WorkerBackend};
pub use builtin::BuiltinResampler;
pub use params::{
    BackendFamily, CropRect, FitMethod, ResizeConfiguration, ResizeMethod,
    ResolvedConfiguration, Route, SizingMode,
};
pub use vector::VectorRasterizer;
pub use worker::ThreadWorker;
