//! Velocity magnitude contours on the z = 0 plane for every CFD case, plus
//! the PIV image resampled on the slice of one case.

use crate::config::{ContourXyConfig, FigureConfig};
use crate::figures::{Project, cut, run_cases};
use crate::filters::{probe_dataset, triangulate};
use crate::io::vtk::{read_vti, read_vtu};
use crate::mesh::Dataset;
use crate::render::{Axes, Axis, ColorMap, ContourFigure, Extend, TriMesh2, filled_contours, write_figure};
use anyhow::Result;

pub const FAMILY: &str = "contourplot_xyplane";
pub const PIV: &str = "piv";

/// Contour plot of `field` on an xy slice.
pub fn figure(
    xyslice: &Dataset,
    field: &str,
    config: &ContourXyConfig,
    cmap: &ColorMap,
    pixels_per_mm: f64,
) -> Result<ContourFigure> {
    let mesh = TriMesh2::from_dataset(&triangulate(xyslice), field, (Axis::X, Axis::Y))?;
    let bands = filled_contours(&mesh, &config.levels.levels(), Extend::Both, cmap);
    let axes = Axes::new(config.x_range, config.y_range)
        .labels("x [mm]", "y [mm]")
        .hidden(config.hide_labels);
    Ok(ContourFigure::new(axes, bands, pixels_per_mm))
}

fn xy_slice(project: &Project, case: &str, z: f64) -> Result<Dataset> {
    let cfd = read_vtu(&project.cfd(case))?;
    cut(&cfd, [0.0, 0.0, z], [0.0, 0.0, 1.0])
}

pub fn run(project: &Project, config: &FigureConfig, jobs: usize) -> Result<()> {
    let cfg = &config.contour_xy;
    let cmap = ColorMap::by_name(&cfg.cmap)?;

    let mut items = config.cases.clone();
    if cfg.include_piv {
        items.push(PIV.to_string());
    }

    run_cases(&items, jobs, FAMILY, |item| {
        let xyslice = if item == PIV {
            // measured field on the geometry of the reference CFD slice
            let piv = read_vti(&project.piv())?;
            probe_dataset(&piv, &xy_slice(project, &cfg.piv_case, cfg.z)?)
        } else {
            xy_slice(project, item, cfg.z)?
        };
        let fig = figure(&xyslice, &config.fields.vxy, cfg, &cmap, config.pixels_per_mm)?;
        write_figure(&fig, &project.figure(FAMILY, item))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::probe::VALID_MASK;
    use crate::mesh::test_support::hex_cube;
    use crate::mesh::{Field, ImageData};
    use crate::render::render_svg;
    use crate::render::Figure;
    use glam::DVec3;

    fn cube_with_speed() -> Dataset {
        let cube = hex_cube(-6.0, 6.0, 3);
        let speed: Vec<f64> = cube.points().iter().map(|p| 50.0 + 4.0 * p.x).collect();
        cube.with_field("Vxy_mm_s", Field::scalar(speed)).unwrap()
    }

    #[test]
    fn slice_of_cube_renders() {
        let xyslice = cut(&cube_with_speed(), [0.0; 3], [0.0, 0.0, 1.0]).unwrap();
        let cfg = ContourXyConfig::default();
        let cmap = ColorMap::by_name(&cfg.cmap).unwrap();
        let fig = figure(&xyslice, "Vxy_mm_s", &cfg, &cmap, 10.0).unwrap();
        assert_eq!(fig.size(), (140, 140));
        let svg = render_svg(&fig).unwrap();
        assert!(svg.matches("<polygon").count() > 10);
    }

    #[test]
    fn piv_image_is_probed_on_the_slice() {
        let xyslice = cut(&cube_with_speed(), [0.0; 3], [0.0, 0.0, 1.0]).unwrap();
        // image covering only x >= 0
        let image = ImageData::new([0, 6, 0, 12, 0, 0], DVec3::new(0.0, -6.0, 0.0), DVec3::ONE);
        let n = image.num_points();
        let image = image.with_field("Vxy_mm_s", Field::scalar(vec![20.0; n])).unwrap();
        let probed = probe_dataset(&image, &xyslice);
        assert_eq!(probed.num_cells(), xyslice.num_cells());
        let values = probed.scalars("Vxy_mm_s").unwrap();
        let mask = probed.scalars(VALID_MASK).unwrap();
        for ((p, v), m) in probed.points().iter().zip(values).zip(mask) {
            if p.x >= 0.0 {
                assert_eq!((*v, *m), (20.0, 1.0));
            } else {
                assert_eq!((*v, *m), (0.0, 0.0));
            }
        }
    }

    #[test]
    fn missing_field_is_an_error() {
        let xyslice = cut(&cube_with_speed(), [0.0; 3], [0.0, 0.0, 1.0]).unwrap();
        let cfg = ContourXyConfig::default();
        let cmap = ColorMap::by_name(&cfg.cmap).unwrap();
        assert!(figure(&xyslice, "pressure", &cfg, &cmap, 10.0).is_err());
    }
}
