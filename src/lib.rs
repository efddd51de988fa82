//! Turns contiguous ranges of a binary file into grayscale graymaps, one
//! byte per pixel, for eyeballing the structure of dumps.

pub mod error;
pub mod geometry;
pub mod pgm;
pub mod rasterize;

pub use error::{RasterError, Result};
pub use geometry::{
    Geometry, GeometryWarning, Layout, RasterJob, DEFAULT_SPLIT_COUNT, MAX_ROW_WIDTH,
};
pub use pgm::ShortReadPolicy;
pub use rasterize::{
    materialize, materialize_from, plan, rasterize, Artifact, RasterOptions, RasterReport,
};
