//! Streamlines over velocity magnitude contours on the z = 0 plane.

use crate::config::{FieldNames, FigureConfig, StreamXyConfig};
use crate::figures::{Project, cut, run_cases};
use crate::filters::{CellLocator, RegularGrid2, probe_grid, triangulate};
use crate::io::vtk::read_vtu;
use crate::mesh::Dataset;
use crate::render::streamline::Streamline;
use crate::render::{
    Axes, Axis, ColorMap, ContourFigure, Extend, StreamOptions, TriMesh2, VectorGrid, filled_contours,
    integrate_streamlines, write_figure,
};
use anyhow::Result;
use plotters::style::{RGBColor, WHITE};

pub const FAMILY: &str = "streamplot_xyplane";

const STREAM_GRAY: RGBColor = RGBColor(128, 128, 128);
const VLINE_WIDTH: u32 = 2;

/// In-plane velocity of `cfd` resampled on the configured lattice and
/// traced into streamlines.
pub fn streamlines(cfd: &Dataset, fields: &FieldNames, config: &StreamXyConfig) -> Result<Vec<Streamline>> {
    let grid = RegularGrid2::new(config.x_range, config.y_range, config.grid_spacing, config.z);
    let (nx, ny) = grid.shape();
    log::info!("Probing {} x {} lattice", nx, ny);
    let locator = CellLocator::new(cfd);
    let probed = probe_grid(&locator, &grid);
    let velocity = VectorGrid::from_probe(&grid, &probed, &fields.vx, &fields.vy)?;
    let options = StreamOptions {
        density: config.density,
        max_width: config.max_width,
        ..StreamOptions::default()
    };
    let lines = integrate_streamlines(&velocity, &options);
    log::debug!("{} streamlines", lines.len());
    Ok(lines)
}

pub fn figure(cfd: &Dataset, fields: &FieldNames, config: &StreamXyConfig, cmap: &ColorMap, pixels_per_mm: f64) -> Result<ContourFigure> {
    let xyslice = cut(cfd, [0.0, 0.0, config.z], [0.0, 0.0, 1.0])?;
    let mesh = TriMesh2::from_dataset(&triangulate(&xyslice), &fields.vxy, (Axis::X, Axis::Y))?;
    let bands = filled_contours(&mesh, &config.levels.levels(), Extend::Both, cmap);
    let axes = Axes::new(config.x_range, config.y_range)
        .labels("x [mm]", "y [mm]")
        .hidden(config.hide_labels);

    let mut fig = ContourFigure::new(axes, bands, pixels_per_mm)
        .with_streamlines(streamlines(cfd, fields, config)?, STREAM_GRAY);
    if let Some(x) = config.vline_x {
        fig = fig.with_vline(x, WHITE, VLINE_WIDTH);
    }
    Ok(fig)
}

pub fn run(project: &Project, config: &FigureConfig, jobs: usize) -> Result<()> {
    let cfg = &config.stream_xy;
    let cmap = ColorMap::by_name(&cfg.cmap)?;
    run_cases(&config.cases, jobs, FAMILY, |case| {
        let cfd = read_vtu(&project.cfd(case))?;
        let fig = figure(&cfd, &config.fields, cfg, &cmap, config.pixels_per_mm)?;
        write_figure(&fig, &project.figure(FAMILY, case))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Field;
    use crate::mesh::test_support::hex_cube;
    use crate::render::render_svg;

    // uniform flow along +x through a box around the plotted window
    fn channel() -> Dataset {
        let cube = hex_cube(-2.0, 2.0, 3);
        let n = cube.num_points();
        cube.with_field("Vx_mm_s", Field::scalar(vec![40.0; n]))
            .unwrap()
            .with_field("Vy_mm_s", Field::scalar(vec![0.0; n]))
            .unwrap()
            .with_field("Vxy_mm_s", Field::scalar(vec![40.0; n]))
            .unwrap()
    }

    fn config() -> StreamXyConfig {
        StreamXyConfig {
            x_range: (-1.5, 1.5),
            y_range: (-1.5, 1.5),
            grid_spacing: 0.1,
            density: 0.4,
            ..StreamXyConfig::default()
        }
    }

    #[test]
    fn uniform_flow_gives_horizontal_full_width_lines() {
        let lines = streamlines(&channel(), &FieldNames::new(), &config()).unwrap();
        assert!(!lines.is_empty());
        for line in &lines {
            let y0 = line.points[0].y;
            assert!(line.points.iter().all(|p| (p.y - y0).abs() < 1e-9));
            assert!(line.widths.iter().all(|w| (w - 5.0).abs() < 1e-9));
        }
    }

    #[test]
    fn figure_has_bands_streamlines_and_vline() {
        let cfg = config();
        let cmap = ColorMap::by_name(&cfg.cmap).unwrap();
        let fig = figure(&channel(), &FieldNames::new(), &cfg, &cmap, 50.0).unwrap();
        let svg = render_svg(&fig).unwrap();
        assert!(svg.matches("<polygon").count() > 1);
        assert!(svg.matches("<polyline").count() >= 2);
    }

    #[test]
    fn missing_velocity_component_is_an_error() {
        let cube = hex_cube(-2.0, 2.0, 3);
        let n = cube.num_points();
        let cube = cube.with_field("Vx_mm_s", Field::scalar(vec![1.0; n])).unwrap();
        assert!(streamlines(&cube, &FieldNames::new(), &config()).is_err());
    }
}
