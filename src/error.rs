//! Error types for rasterization

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RasterError {
    /// Parameters that could not be turned into a run at all
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Row width out of range, or a split too small to hold a single row
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Could not read {}", path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not write {}", path.display())]
    DestinationUnwritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The source ran out before the declared pixel count was reached
    #[error(
        "Truncated read from {}: expected {expected} bytes, only {available} available",
        path.display()
    )]
    TruncatedRead {
        path: PathBuf,
        expected: u64,
        available: u64,
    },

    /// Job `index` failed; jobs `0..index` were written
    #[error("Job {index} ({}) failed after {index} completed", path.display())]
    JobFailed {
        index: usize,
        path: PathBuf,
        #[source]
        source: Box<RasterError>,
    },
}

impl RasterError {
    /// The failure underneath any `JobFailed` wrapping.
    pub fn root(&self) -> &RasterError {
        match self {
            RasterError::JobFailed { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, RasterError>;
