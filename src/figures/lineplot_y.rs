//! Velocity magnitude along the y axis for each case, with a zoomed inset
//! and the PIV profile for the reference case. The sampled profiles are
//! exported as CSV next to each figure.

use crate::config::{FigureConfig, InsetConfig, LineplotConfig};
use crate::figures::{Project, cut};
use crate::io::csv::{Profile, write_profiles};
use crate::io::vtk::{read_vti, read_vtu};
use crate::mesh::Dataset;
use crate::render::{Axes, Corner, Inset, LinePlot, Series, write_figure};
use anyhow::{Result, anyhow};
use glam::{DVec2, DVec3};
use plotters::style::BLACK;

pub const FAMILY: &str = "lineplot_yaxis";

const MARKER_RADIUS: u32 = 5;

/// `(y, value)` pairs of a line dataset ordered by y.
pub fn profile(line: &Dataset, field: &str) -> Result<Vec<DVec2>> {
    let values = line.scalars(field)?;
    let mut samples: Vec<DVec2> = line
        .points()
        .iter()
        .zip(values)
        .map(|(p, &v)| DVec2::new(p.y, v))
        .collect();
    samples.sort_by(|a, b| a.x.total_cmp(&b.x));
    Ok(samples)
}

/// Cut along the y axis: the z = 0 plane, then x = 0 within it.
pub fn y_axis(cfd: &Dataset) -> Result<Dataset> {
    let xyplane = cut(cfd, [0.0; 3], [0.0, 0.0, 1.0])?;
    cut(&xyplane, [0.0; 3], [1.0, 0.0, 0.0])
}

fn inset(spec: &InsetConfig, config: &LineplotConfig) -> Result<Inset> {
    let corner = |code: u8| Corner::from_code(code).ok_or_else(|| anyhow!("Invalid inset corner code {}", code));
    let mut inset = Inset::new(spec.x, spec.y, (corner(spec.corners.0)?, corner(spec.corners.1)?));
    inset.zoom = config.zoom;
    inset.anchor = config.anchor;
    Ok(inset)
}

/// Line plot of one case; `piv` adds the measured profile as markers.
pub fn figure(cfd: &[DVec2], piv: Option<&[DVec2]>, inset_spec: Option<&InsetConfig>, config: &LineplotConfig) -> Result<LinePlot> {
    let axes = Axes::new(config.x_range, config.y_range).labels("y [mm]", "vxy [mm/s]");
    let mut plot = LinePlot::new(axes, config.size);
    if let Some(piv) = piv {
        plot = plot.with_series(Series::markers(piv.to_vec(), BLACK, MARKER_RADIUS));
    }
    plot = plot.with_series(Series::line(cfd.to_vec(), BLACK, 1));
    if let Some(spec) = inset_spec {
        plot = plot.with_inset(inset(spec, config)?);
    }
    Ok(plot)
}

fn to_samples(points: &[DVec2]) -> Vec<(f64, f64)> {
    points.iter().map(|p| (p.x, p.y)).collect()
}

/// Cases run one after the other: the PIV profile is read once and reused.
pub fn run(project: &Project, config: &FigureConfig) -> Result<()> {
    let cfg = &config.lineplot_y;
    let field = &config.fields.vxy;

    let piv_profile = if config.cases.contains(&cfg.piv_case) {
        let piv = read_vti(&project.piv())?;
        let line = cut(&piv.to_dataset(), [0.0; 3], [1.0, 0.0, 0.0])?;
        Some(profile(&line, field)?)
    } else {
        None
    };

    for (j, case) in config.cases.iter().enumerate() {
        log::info!("{}: {}", FAMILY, case);
        let cfd = read_vtu(&project.cfd(case))?;
        let cfd_profile = profile(&y_axis(&cfd)?, field)?;
        let piv = piv_profile.as_deref().filter(|_| *case == cfg.piv_case);
        if cfg.insets.get(j).is_none() {
            log::warn!("No inset configured for {}", case);
        }

        let plot = figure(&cfd_profile, piv, cfg.insets.get(j), cfg)?;
        write_figure(&plot, &project.figure(FAMILY, case))?;

        if cfg.export_csv {
            let mut profiles = vec![Profile::new(case, to_samples(&cfd_profile))];
            if let Some(piv) = piv {
                profiles.push(Profile::new("piv", to_samples(piv)));
            }
            write_profiles(&project.output(FAMILY, case, "csv"), "y_mm", field, &profiles)?;
        }
    }
    Ok(())
}
