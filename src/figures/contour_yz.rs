//! Axial velocity contours on the x = 3 plane, outlined by the slice
//! boundary.

use crate::config::{ContourYzConfig, FigureConfig};
use crate::figures::{Project, cut, run_cases};
use crate::filters::connectivity::label_regions;
use crate::filters::{
    Chain, extract_boundary_edges, extract_closest_point_region, line_pairs, sort_chain, triangulate,
};
use crate::io::vtk::read_vtu;
use crate::mesh::Dataset;
use crate::render::{Axes, Axis, ColorMap, ContourFigure, Extend, TriMesh2, filled_contours, write_figure};
use anyhow::{Context, Result};
use glam::{DVec2, DVec3};
use plotters::style::BLACK;

pub const FAMILY: &str = "contourplot_yzplane";

/// The connected part of the yz slice nearest to the reference point.
pub fn yz_region(cfd: &Dataset, config: &ContourYzConfig) -> Result<Dataset> {
    let yzslice = cut(cfd, [config.x, 0.0, 0.0], [1.0, 0.0, 0.0])?;
    if log::log_enabled!(log::Level::Debug) {
        let regions = label_regions(&yzslice).into_iter().max().map_or(0, |r| r + 1);
        log::debug!("yz slice at x = {} has {} regions", config.x, regions);
    }
    Ok(extract_closest_point_region(&yzslice, DVec3::from_array(config.region_reference)))
}

/// Boundary of `region` walked in order, as (z, y) pairs. A closed
/// boundary is walked from `start`, an open one from its free end.
pub fn outline(region: &Dataset, start: usize) -> Result<Vec<DVec2>> {
    let edges = extract_boundary_edges(region);
    let pairs = line_pairs(&edges);
    let start = Chain::open_start(&pairs).unwrap_or(start);
    let chain = sort_chain(&pairs, start).context("Slice outline is not a single chain")?;
    Ok(chain
        .coordinates(edges.points())
        .into_iter()
        .map(|p| DVec2::new(p.z, p.y))
        .collect())
}

pub fn figure(
    region: &Dataset,
    field: &str,
    config: &ContourYzConfig,
    cmap: &ColorMap,
    pixels_per_mm: f64,
) -> Result<ContourFigure> {
    let mesh = TriMesh2::from_dataset(&triangulate(region), field, (Axis::Z, Axis::Y))?;
    let bands = filled_contours(&mesh, &config.levels.levels(), Extend::Both, cmap);
    let axes = Axes::new(config.z_range, config.y_range)
        .labels("z [mm]", "y [mm]")
        .hidden(config.hide_labels);
    Ok(ContourFigure::new(axes, bands, pixels_per_mm).with_outline(
        outline(region, config.chain_start)?,
        BLACK,
        config.outline_width,
    ))
}

pub fn run(project: &Project, config: &FigureConfig, jobs: usize) -> Result<()> {
    let cfg = &config.contour_yz;
    let cmap = ColorMap::by_name(&cfg.cmap)?;
    run_cases(&config.cases, jobs, FAMILY, |case| {
        let cfd = read_vtu(&project.cfd(case))?;
        let region = yz_region(&cfd, cfg)?;
        log::debug!("{}: yz region with {} cells", case, region.num_cells());
        let fig = figure(&region, &config.fields.vx, cfg, &cmap, config.pixels_per_mm)?;
        write_figure(&fig, &project.figure(FAMILY, case))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::test_support::hex_cube;
    use crate::mesh::{Cell, Field};
    use crate::render::render_svg;

    // two separate cubes along z; the reference point lies in the first
    fn two_tubes() -> Dataset {
        let a = hex_cube(-1.0, 1.0, 1);
        let mut points = a.points().to_vec();
        let mut cells = a.cells().to_vec();
        let offset = points.len();
        points.extend(a.points().iter().map(|p| *p + DVec3::new(0.0, 0.0, 4.0)));
        cells.extend(
            a.cells()
                .iter()
                .map(|c| Cell::new(c.kind, c.points.iter().map(|i| i + offset).collect())),
        );
        let vx = points.iter().map(|p| p.y).collect();
        Dataset::new(points, cells)
            .unwrap()
            .with_field("Vx_mm_s", Field::scalar(vx))
            .unwrap()
    }

    fn config() -> ContourYzConfig {
        ContourYzConfig {
            x: 0.0,
            region_reference: [0.0, 0.0, 0.0],
            ..ContourYzConfig::default()
        }
    }

    #[test]
    fn keeps_the_region_at_the_reference() {
        let region = yz_region(&two_tubes(), &config()).unwrap();
        assert!(region.num_cells() > 0);
        assert!(region.points().iter().all(|p| p.z <= 1.0 + 1e-12));
    }

    #[test]
    fn outline_is_closed_around_the_square() {
        let region = yz_region(&two_tubes(), &config()).unwrap();
        let ring = outline(&region, 0).unwrap();
        assert_eq!(ring.first(), ring.last());
        assert!(ring.len() >= 5);
        // every outline point lies on the square's perimeter
        for p in &ring {
            assert!((p.x.abs().max(p.y.abs()) - 1.0).abs() < 1e-12);
        }
        for corner in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            assert!(ring.iter().any(|p| (p.x, p.y) == corner));
        }
    }

    #[test]
    fn outline_of_block_cut_between_nodes() {
        let cfg = ContourYzConfig {
            x: 0.3,
            region_reference: [0.3, 0.0, 0.0],
            ..ContourYzConfig::default()
        };
        let region = yz_region(&hex_cube(-1.0, 1.0, 3), &cfg).unwrap();
        let edges = extract_boundary_edges(&region);
        // 12 cell faces on the perimeter, each split where the plane
        // crosses its diagonal
        assert_eq!(edges.num_cells(), 24);
        assert!(edges.points().iter().all(|p| (p.y.abs().max(p.z.abs()) - 1.0).abs() < 1e-12));

        let ring = outline(&region, 0).unwrap();
        assert_eq!(ring.len(), 25);
        assert_eq!(ring.first(), ring.last());
        let perimeter: f64 = ring.windows(2).map(|w| w[0].distance(w[1])).sum();
        assert!((perimeter - 8.0).abs() < 1e-9, "perimeter {perimeter}");
    }

    #[test]
    fn figure_draws_bands_and_outline() {
        let cfg = config();
        let region = yz_region(&two_tubes(), &cfg).unwrap();
        let cmap = ColorMap::by_name(&cfg.cmap).unwrap();
        let fig = figure(&region, "Vx_mm_s", &cfg, &cmap, 20.0).unwrap();
        let svg = render_svg(&fig).unwrap();
        assert!(svg.contains("<polyline"));
        assert!(svg.matches("<polygon").count() >= 2);
    }
}
