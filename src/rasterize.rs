use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{RasterError, Result};
use crate::geometry::{Geometry, GeometryWarning, Layout, RasterJob, DEFAULT_SPLIT_COUNT};
use crate::pgm::{self, CopyError, ShortReadPolicy};

/// Parameters for one run, already validated by whoever parsed them.
#[derive(Debug, Clone)]
pub struct RasterOptions {
    pub input: PathBuf,
    pub row_width: u64,
    pub destination: PathBuf,
    pub split_count: u64,
    pub start_offset: u64,
    pub short_read: ShortReadPolicy,
}

impl RasterOptions {
    pub fn new(input: impl Into<PathBuf>, row_width: u64, destination: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            row_width,
            destination: destination.into(),
            split_count: DEFAULT_SPLIT_COUNT,
            start_offset: 0,
            short_read: ShortReadPolicy::default(),
        }
    }

    pub fn split_count(mut self, split_count: u64) -> Self {
        self.split_count = split_count;
        self
    }

    pub fn start_offset(mut self, start_offset: u64) -> Self {
        self.start_offset = start_offset;
        self
    }

    pub fn short_read(mut self, policy: ShortReadPolicy) -> Self {
        self.short_read = policy;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub index: usize,
    pub path: PathBuf,
    pub geometry: Geometry,
    /// Header plus pixels.
    pub bytes_written: u64,
    pub padded_pixels: u64,
}

#[derive(Debug, Clone)]
pub struct RasterReport {
    pub layout: Layout,
    pub warnings: Vec<GeometryWarning>,
    pub artifacts: Vec<Artifact>,
}

/// Computes the layout for `options` without reading or writing anything
/// besides the source's metadata.
pub fn plan(options: &RasterOptions) -> Result<Layout> {
    let metadata =
        std::fs::metadata(&options.input).map_err(|source| RasterError::SourceUnreadable {
            path: options.input.clone(),
            source,
        })?;

    Layout::plan(
        metadata.len(),
        options.row_width,
        options.split_count,
        options.start_offset,
    )
}

/// Writes every split of `options.input` as a graymap, stopping at the first failure.
pub fn rasterize(options: &RasterOptions) -> Result<RasterReport> {
    let layout = plan(options)?;
    let source_name = source_name(&options.input)?;

    let warnings = layout.warnings();
    for warning in &warnings {
        warn!(input = %options.input.display(), "{warning}");
    }

    info!(
        splits = layout.split_count,
        width = layout.geometry.row_width,
        height = layout.geometry.row_count,
        "generating graymaps for {}",
        source_name.to_string_lossy()
    );

    let mut artifacts = Vec::new();

    for job in layout.jobs(&source_name, &options.destination) {
        let artifact =
            materialize(&options.input, &job, options.short_read).map_err(|err| {
                RasterError::JobFailed {
                    index: job.index,
                    path: job.destination.clone(),
                    source: Box::new(err),
                }
            })?;
        artifacts.push(artifact);
    }

    Ok(RasterReport {
        layout,
        warnings,
        artifacts,
    })
}

/// Opens `source_path` afresh and writes the artifact for `job`.
pub fn materialize(
    source_path: &Path,
    job: &RasterJob,
    policy: ShortReadPolicy,
) -> Result<Artifact> {
    let mut source = File::open(source_path).map_err(|source| RasterError::SourceUnreadable {
        path: source_path.to_owned(),
        source,
    })?;

    materialize_from(&mut source, source_path, job, policy)
}

/// Writes the artifact for `job` from an already open source.
///
/// The body goes to a temporary file next to the destination and is renamed
/// into place once complete, so a failed job never leaves a file at
/// `job.destination`.
pub fn materialize_from<R: Read + Seek>(
    source: &mut R,
    source_path: &Path,
    job: &RasterJob,
    policy: ShortReadPolicy,
) -> Result<Artifact> {
    let unreadable = |source: io::Error| RasterError::SourceUnreadable {
        path: source_path.to_owned(),
        source,
    };
    let unwritable = |source: io::Error| RasterError::DestinationUnwritable {
        path: job.destination.clone(),
        source,
    };

    info!("Writing {}", job.destination.display());
    debug!(
        index = job.index,
        start = job.source_offset,
        end = job.source_end,
        pixels = job.pixel_count(),
        "split bounds"
    );

    source
        .seek(SeekFrom::Start(job.source_offset))
        .map_err(unreadable)?;

    let dir = match job.destination.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    // Fixed short name: the artifact name alone may already be near NAME_MAX.
    let mut builder = tempfile::Builder::new();
    builder.prefix(".bin-to-pgm.").suffix(".part");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // Same mode as `File::create`; umask still applies.
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    let temp = builder.tempfile_in(dir).map_err(unwritable)?;

    let mut writer = BufWriter::new(temp);
    let header_len = pgm::write_header(&mut writer, job.geometry).map_err(unwritable)?;

    let outcome = pgm::copy_pixels(source, &mut writer, job.pixel_count(), policy).map_err(
        |err| match err {
            CopyError::Read(err) => unreadable(err),
            CopyError::Write(err) => unwritable(err),
            CopyError::Short {
                expected,
                available,
            } => RasterError::TruncatedRead {
                path: source_path.to_owned(),
                expected,
                available,
            },
        },
    )?;

    if outcome.padded > 0 {
        warn!(
            index = job.index,
            padded = outcome.padded,
            policy = %policy,
            "source ended early, padded {}",
            job.destination.display()
        );
    }

    writer.flush().map_err(unwritable)?;
    let temp = writer.into_inner().map_err(|err| unwritable(err.into_error()))?;
    temp.persist(&job.destination).map_err(|err| unwritable(err.error))?;

    Ok(Artifact {
        index: job.index,
        path: job.destination.clone(),
        geometry: job.geometry,
        bytes_written: header_len + job.pixel_count(),
        padded_pixels: outcome.padded,
    })
}

fn source_name(input: &Path) -> Result<OsString> {
    input
        .file_name()
        .map(|name| name.to_os_string())
        .ok_or_else(|| {
            RasterError::InvalidArguments(format!("{} has no file name", input.display()))
        })
}
