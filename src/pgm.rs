//! Binary portable graymap (`P5`) output.

use std::fmt;
use std::io::{self, Read, Write};
use std::str::FromStr;

use crate::geometry::Geometry;

const COPY_CHUNK: usize = 64 * 1024;

pub fn header(geometry: Geometry) -> String {
    format!("P5\n{} {}\n255\n", geometry.row_width, geometry.row_count)
}

pub fn write_header<W: Write>(writer: &mut W, geometry: Geometry) -> io::Result<u64> {
    let header = header(geometry);
    writer.write_all(header.as_bytes())?;
    Ok(header.len() as u64)
}

/// What to do when the source ends before a job's pixels are all read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShortReadPolicy {
    /// Fail the job; nothing is published.
    #[default]
    Abort,
    /// Pad the missing pixels with 0.
    ZeroFill,
    /// Pad with the last byte read, or 0 if nothing was read.
    RepeatLast,
}

impl ShortReadPolicy {
    pub const VARIANTS: [&'static str; 3] = ["abort", "zero", "repeat"];
}

impl FromStr for ShortReadPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "abort" => Ok(ShortReadPolicy::Abort),
            "zero" => Ok(ShortReadPolicy::ZeroFill),
            "repeat" => Ok(ShortReadPolicy::RepeatLast),
            other => Err(format!(
                "unknown short read policy '{other}', expected one of {}",
                Self::VARIANTS.join(", ")
            )),
        }
    }
}

impl fmt::Display for ShortReadPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShortReadPolicy::Abort => "abort",
            ShortReadPolicy::ZeroFill => "zero",
            ShortReadPolicy::RepeatLast => "repeat",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub enum CopyError {
    Read(io::Error),
    Write(io::Error),
    Short { expected: u64, available: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyOutcome {
    pub copied: u64,
    pub padded: u64,
}

/// Copies exactly `count` bytes from `reader` to `writer`, in order,
/// padding according to `policy` if the reader runs dry.
pub fn copy_pixels<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    count: u64,
    policy: ShortReadPolicy,
) -> Result<CopyOutcome, CopyError> {
    let mut buffer = vec![0_u8; COPY_CHUNK.min(count as usize)];
    let mut copied = 0_u64;
    let mut last = 0_u8;

    while copied < count {
        let want = (count - copied).min(buffer.len() as u64) as usize;
        let read = match reader.read(&mut buffer[..want]) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(CopyError::Read(err)),
        };

        writer
            .write_all(&buffer[..read])
            .map_err(CopyError::Write)?;
        last = buffer[read - 1];
        copied += read as u64;
    }

    let missing = count - copied;
    if missing == 0 {
        return Ok(CopyOutcome { copied, padded: 0 });
    }

    let fill = match policy {
        ShortReadPolicy::Abort => {
            return Err(CopyError::Short {
                expected: count,
                available: copied,
            })
        }
        ShortReadPolicy::ZeroFill => 0,
        ShortReadPolicy::RepeatLast => last,
    };

    io::copy(&mut io::repeat(fill).take(missing), writer).map_err(CopyError::Write)?;

    Ok(CopyOutcome {
        copied,
        padded: missing,
    })
}
