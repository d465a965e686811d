//! The figure families. Each one reads the datasets under `data/`, runs the
//! filter chain per case and writes `figs/<family>/<case>.<ext>`.

pub mod colorbar;
pub mod contour_xy;
pub mod contour_yz;
pub mod download;
pub mod lineplot_y;
pub mod stream_xy;

use crate::cli::Command;
use crate::config::{FigureConfig, OutputFormat};
use crate::filters::{Plane, slice};
use crate::mesh::Dataset;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Input and output locations below the project root.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    root: PathBuf,
    format: OutputFormat,
}

impl Project {
    pub fn new(root: &Path, format: OutputFormat) -> Self {
        Project {
            root: root.to_path_buf(),
            format,
        }
    }

    pub fn data_dir(&self, kind: &str) -> PathBuf {
        self.root.join("data").join(kind)
    }

    pub fn cfd(&self, case: &str) -> PathBuf {
        self.data_dir("cfd").join(format!("{}.vtu", case))
    }

    pub fn piv(&self) -> PathBuf {
        self.data_dir("piv").join("piv.vti")
    }

    pub fn output(&self, family: &str, name: &str, extension: &str) -> PathBuf {
        self.root.join("figs").join(family).join(format!("{}.{}", name, extension))
    }

    pub fn figure(&self, family: &str, name: &str) -> PathBuf {
        self.output(family, name, self.format.extension())
    }
}

/// Cut `dataset` with the plane through `origin` normal to `normal`.
pub fn cut(dataset: &Dataset, origin: [f64; 3], normal: [f64; 3]) -> Result<Dataset> {
    let sliced = slice(dataset, &Plane::from_arrays(origin, normal)?);
    if sliced.is_empty() {
        log::warn!("Plane through {:?} normal to {:?} misses the dataset", origin, normal);
    }
    Ok(sliced)
}

/// Run `job` once per item, on `jobs` threads when more than one is asked
/// for. The first failure is returned with the item named.
pub fn run_cases<F>(items: &[String], jobs: usize, family: &str, job: F) -> Result<()>
where
    F: Fn(&str) -> Result<()> + Sync + Send,
{
    let pb = ProgressBar::new(items.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg} ({eta})")?
            .progress_chars("#>-"),
    );
    pb.set_message(family.to_string());

    let run_one = |item: &String| -> Result<()> {
        job(item.as_str()).with_context(|| format!("{} failed for {}", family, item))?;
        pb.inc(1);
        Ok(())
    };

    if jobs <= 1 {
        items.iter().try_for_each(run_one)?;
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("Failed to build thread pool")?;
        pool.install(|| items.par_iter().try_for_each(run_one))?;
    }

    pb.finish_with_message(format!("{} done", family));
    Ok(())
}

/// Dispatch one subcommand.
pub fn run(command: Command, project: &Project, config: &FigureConfig, jobs: usize) -> Result<()> {
    match command {
        Command::Download => download::run(project, &config.download),
        Command::ContourXy => contour_xy::run(project, config, jobs),
        Command::ContourYz => contour_yz::run(project, config, jobs),
        Command::StreamXy => stream_xy::run(project, config, jobs),
        Command::LineplotY => lineplot_y::run(project, config),
        Command::Colorbar => colorbar::run(project, &config.colorbars),
        Command::All => {
            for family in [
                Command::ContourXy,
                Command::ContourYz,
                Command::StreamXy,
                Command::LineplotY,
                Command::Colorbar,
            ] {
                run(family, project, config, jobs)?;
            }
            Ok(())
        }
    }
}
