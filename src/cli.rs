use crate::config::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Contour, streamline, line-plot and colorbar figures for the CFD cases and
/// the PIV measurement
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Project root holding data/ and figs/
    #[arg(short, long, default_value = ".")]
    pub root: PathBuf,

    /// JSON file overriding the built-in figure settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Worker threads for the per-case loop (0 uses every core)
    #[arg(short, long, default_value_t = 1)]
    pub jobs: usize,

    /// Figure file format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Svg)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Fetch the PIV image, input files and CFD cases into data/
    Download,
    /// Velocity magnitude contours on the z = 0 plane
    ContourXy,
    /// Axial velocity contours on the x = 3 plane
    ContourYz,
    /// Streamlines over velocity magnitude on the z = 0 plane
    StreamXy,
    /// Velocity magnitude profiles along the y axis
    LineplotY,
    /// Standalone color legends
    Colorbar,
    /// Every figure family in turn
    All,
}

impl Args {
    /// Thread count for the per-case loop.
    pub fn threads(&self) -> usize {
        match self.jobs {
            0 => num_cpus::get(),
            n => n,
        }
    }
}

pub fn get_args() -> Args {
    Args::parse()
}
