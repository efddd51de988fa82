use anyhow::Context;
use bin_to_pgm::{RasterOptions, ShortReadPolicy};
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

/// Generates PGM files where one pixel represents the value of one byte in the dump.
#[derive(StructOpt)]
#[structopt(name = "bin-to-pgm")]
pub struct Opts {
    /// Binary file to split into images
    input: std::path::PathBuf,
    /// Pixels per row, between 1 and 1048576
    row_width: u64,
    /// Existing directory the images are written into
    destination: std::path::PathBuf,
    /// Number of images to generate
    #[structopt(default_value = "8")]
    split_count: u64,
    /// Byte offset in the input where the first image starts
    #[structopt(long, default_value = "0")]
    offset: u64,
    /// What to do if the input ends before an image is full
    #[structopt(long, default_value = "abort", possible_values = &ShortReadPolicy::VARIANTS)]
    on_short_read: ShortReadPolicy,
    /// Log per-image offsets
    #[structopt(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::from_args();

    let fallback = if opts.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();

    if !opts.destination.is_dir() {
        anyhow::bail!(
            "Invalid arguments: destination {} is not a directory",
            opts.destination.display()
        );
    }

    let options = RasterOptions::new(opts.input.clone(), opts.row_width, opts.destination.clone())
        .split_count(opts.split_count)
        .start_offset(opts.offset)
        .short_read(opts.on_short_read);

    let report = bin_to_pgm::rasterize(&options)
        .with_context(|| format!("Failed to convert {}", opts.input.display()))?;

    let dropped: u64 = report.warnings.iter().map(|w| w.dropped_bytes()).sum();
    tracing::info!(
        images = report.artifacts.len(),
        consumed = report.layout.consumed_bytes(),
        dropped,
        "done"
    );

    Ok(())
}
