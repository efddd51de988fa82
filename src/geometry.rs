//! Partitioning of a source into equally sized splits and the raster
//! dimensions of each one. Nothing in here touches the filesystem.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{RasterError, Result};

/// Largest accepted row width, in pixels.
pub const MAX_ROW_WIDTH: u64 = 1024 * 1024;

pub const DEFAULT_SPLIT_COUNT: u64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub row_width: u64,
    pub row_count: u64,
}

impl Geometry {
    pub fn pixel_count(&self) -> u64 {
        self.row_width * self.row_count
    }
}

/// Bytes that the partition leaves out. Neither stops a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryWarning {
    /// `total_size` is not a multiple of `split_count`; the tail is never read.
    SizeMismatch {
        total_size: u64,
        split_count: u64,
        dropped: u64,
    },
    /// `row_width` does not divide a split; each split loses its partial last row.
    PartialRowDropped {
        row_width: u64,
        pixels_per_split: u64,
        dropped: u64,
    },
}

impl GeometryWarning {
    pub fn dropped_bytes(&self) -> u64 {
        match *self {
            GeometryWarning::SizeMismatch { dropped, .. } => dropped,
            GeometryWarning::PartialRowDropped { dropped, .. } => dropped,
        }
    }
}

impl fmt::Display for GeometryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            GeometryWarning::SizeMismatch {
                total_size,
                split_count,
                dropped,
            } => write!(
                f,
                "size {total_size} is not a multiple of {split_count} splits, \
                 dropping {dropped} trailing bytes"
            ),
            GeometryWarning::PartialRowDropped {
                row_width,
                pixels_per_split,
                dropped,
            } => write!(
                f,
                "split size {pixels_per_split} is not a multiple of row width {row_width}, \
                 dropping {dropped} bytes of partial rows"
            ),
        }
    }
}

/// The partition of `[start_offset, total_size)` into `split_count` splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub total_size: u64,
    pub start_offset: u64,
    pub split_count: u64,
    pub pixels_per_split: u64,
    pub geometry: Geometry,
}

impl Layout {
    pub fn plan(
        total_size: u64,
        row_width: u64,
        split_count: u64,
        start_offset: u64,
    ) -> Result<Self> {
        if row_width == 0 || row_width > MAX_ROW_WIDTH {
            return Err(RasterError::InvalidGeometry(format!(
                "row width {row_width} outside [1, {MAX_ROW_WIDTH}]"
            )));
        }
        if split_count == 0 {
            return Err(RasterError::InvalidGeometry(
                "split count must be at least 1".to_owned(),
            ));
        }
        if start_offset >= total_size {
            return Err(RasterError::InvalidGeometry(format!(
                "offset {start_offset} leaves nothing to read from a source of {total_size} bytes"
            )));
        }

        let pixels_per_split = (total_size - start_offset) / split_count;
        let row_count = pixels_per_split / row_width;

        if row_count == 0 {
            return Err(RasterError::InvalidGeometry(format!(
                "splits of {pixels_per_split} bytes cannot hold a row of {row_width} pixels"
            )));
        }

        Ok(Self {
            total_size,
            start_offset,
            split_count,
            pixels_per_split,
            geometry: Geometry {
                row_width,
                row_count,
            },
        })
    }

    pub fn effective_size(&self) -> u64 {
        self.total_size - self.start_offset
    }

    pub fn source_offset(&self, index: u64) -> u64 {
        self.start_offset + index * self.pixels_per_split
    }

    /// Bytes actually written as pixels across all splits.
    pub fn consumed_bytes(&self) -> u64 {
        self.geometry.pixel_count() * self.split_count
    }

    pub fn warnings(&self) -> Vec<GeometryWarning> {
        let mut warnings = Vec::new();

        let remainder = self.effective_size() % self.split_count;
        if remainder != 0 {
            warnings.push(GeometryWarning::SizeMismatch {
                total_size: self.effective_size(),
                split_count: self.split_count,
                dropped: remainder,
            });
        }

        let partial_row = self.pixels_per_split % self.geometry.row_width;
        if partial_row != 0 {
            warnings.push(GeometryWarning::PartialRowDropped {
                row_width: self.geometry.row_width,
                pixels_per_split: self.pixels_per_split,
                dropped: partial_row * self.split_count,
            });
        }

        warnings
    }

    /// One job per split, in index order, writing into `destination_dir`.
    pub fn jobs<'a>(
        &'a self,
        source_name: &'a OsStr,
        destination_dir: &'a Path,
    ) -> impl Iterator<Item = RasterJob> + 'a {
        (0..self.split_count).map(move |index| {
            let source_offset = self.source_offset(index);
            let source_end = source_offset + self.pixels_per_split;

            RasterJob {
                index: index as usize,
                geometry: self.geometry,
                source_offset,
                source_end,
                destination: artifact_path(
                    destination_dir,
                    source_name,
                    index,
                    source_offset,
                    source_end,
                ),
            }
        })
    }
}

/// Everything needed to produce one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterJob {
    pub index: usize,
    pub geometry: Geometry,
    pub source_offset: u64,
    /// Exclusive end of the split. Bytes of a dropped partial row lie before it.
    pub source_end: u64,
    pub destination: PathBuf,
}

impl RasterJob {
    pub fn pixel_count(&self) -> u64 {
        self.geometry.pixel_count()
    }
}

/// `<dir>/<name>_<index>_<start>-<end>.pgm`, keeping `name`'s bytes as they are.
pub fn artifact_path(dir: &Path, source_name: &OsStr, index: u64, start: u64, end: u64) -> PathBuf {
    let mut name = source_name.to_os_string();
    name.push(format!("_{index}_{start}-{end}.pgm"));
    dir.join(name)
}
