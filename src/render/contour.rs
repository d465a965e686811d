//! Filled contour bands over a triangulated scalar field.
//!
//! Every triangle is clipped against each band `[l_i, l_{i+1}]` of the
//! levels by linear interpolation of its vertex values, so the bands of one
//! triangle tile it exactly.

use crate::mesh::{Dataset, MeshError};
use crate::render::clip::clip_halfplane;
use crate::render::colormap::ColorMap;
use glam::{DVec2, DVec3};
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn pick(self, p: DVec3) -> f64 {
        match self {
            Axis::X => p.x,
            Axis::Y => p.y,
            Axis::Z => p.z,
        }
    }
}

/// How values outside the level range are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extend {
    Neither,
    #[default]
    Both,
}

/// Strictly increasing contour levels.
#[derive(Debug, Clone, PartialEq)]
pub struct Levels(Vec<f64>);

impl Levels {
    /// `n` evenly spaced levels from `lo` to `hi` inclusive.
    pub fn linspace(lo: f64, hi: f64, n: usize) -> Self {
        let n = n.max(2);
        let step = (hi - lo) / (n - 1) as f64;
        let mut levels: Vec<f64> = (0..n).map(|i| lo + i as f64 * step).collect();
        levels[n - 1] = hi;
        Levels(levels)
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn min(&self) -> f64 {
        self.0[0]
    }

    pub fn max(&self) -> f64 {
        self.0[self.0.len() - 1]
    }

    /// Position of `v` in `[0, 1]` across the level range.
    pub fn normalize(&self, v: f64) -> f64 {
        let span = self.max() - self.min();
        if span > 0.0 { (v - self.min()) / span } else { 0.5 }
    }
}

// Value interval filled by one band
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Band {
    Below,
    Between(usize),
    Above,
}

/// Triangles of a slice projected on two axes, with one scalar per point.
#[derive(Debug, Clone, PartialEq)]
pub struct TriMesh2 {
    pub points: Vec<DVec2>,
    pub triangles: Vec<[usize; 3]>,
    pub values: Vec<f64>,
}

impl TriMesh2 {
    /// Project the triangle cells of `dataset` on `(horizontal, vertical)`.
    pub fn from_dataset(dataset: &Dataset, field: &str, axes: (Axis, Axis)) -> Result<Self, MeshError> {
        let values = dataset.scalars(field)?.to_vec();
        let points = dataset
            .points()
            .iter()
            .map(|&p| DVec2::new(axes.0.pick(p), axes.1.pick(p)))
            .collect();
        let triangles = dataset
            .cells()
            .iter()
            .filter(|c| c.points.len() == 3 && c.kind.dimension() == 2)
            .map(|c| [c.points[0], c.points[1], c.points[2]])
            .collect();
        Ok(TriMesh2 {
            points,
            triangles,
            values,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilledPolygon {
    pub band: Band,
    pub points: Vec<DVec2>,
    pub color: RGBColor,
}

fn band_color(band: Band, levels: &Levels, cmap: &ColorMap) -> RGBColor {
    match band {
        Band::Below => cmap.sample(0.0),
        Band::Above => cmap.sample(1.0),
        Band::Between(i) => {
            let l = levels.values();
            cmap.sample(levels.normalize(0.5 * (l[i] + l[i + 1])))
        }
    }
}

fn clip_band(tri: &[(DVec2, f64)], lo: Option<f64>, hi: Option<f64>) -> Vec<(DVec2, f64)> {
    let lerp = |a: &(DVec2, f64), b: &(DVec2, f64), t: f64| (a.0.lerp(b.0, t), a.1 + (b.1 - a.1) * t);
    let mut poly = tri.to_vec();
    if let Some(lo) = lo {
        poly = clip_halfplane(&poly, |p| p.1 - lo, lerp);
    }
    if let Some(hi) = hi {
        poly = clip_halfplane(&poly, |p| hi - p.1, lerp);
    }
    poly
}

/// Band polygons of `mesh`, painted with `cmap`.
///
/// Inner bands are colored by the normalized midpoint of their interval.
/// With [`Extend::Both`] values below the first level or above the last get
/// the end colors; with [`Extend::Neither`] they are left empty.
pub fn filled_contours(mesh: &TriMesh2, levels: &Levels, extend: Extend, cmap: &ColorMap) -> Vec<FilledPolygon> {
    let l = levels.values();
    let mut bands: Vec<(Band, Option<f64>, Option<f64>)> = Vec::with_capacity(l.len() + 1);
    if extend == Extend::Both {
        bands.push((Band::Below, None, Some(l[0])));
    }
    bands.extend((0..l.len() - 1).map(|i| (Band::Between(i), Some(l[i]), Some(l[i + 1]))));
    if extend == Extend::Both {
        bands.push((Band::Above, Some(l[l.len() - 1]), None));
    }

    let mut out = Vec::new();
    for tri in &mesh.triangles {
        let corners: Vec<(DVec2, f64)> = tri.iter().map(|&i| (mesh.points[i], mesh.values[i])).collect();
        if corners.iter().any(|c| !c.1.is_finite()) {
            continue;
        }
        let vmin = corners.iter().map(|c| c.1).fold(f64::INFINITY, f64::min);
        let vmax = corners.iter().map(|c| c.1).fold(f64::NEG_INFINITY, f64::max);
        for &(band, lo, hi) in &bands {
            if lo.is_some_and(|lo| vmax < lo) || hi.is_some_and(|hi| vmin > hi) {
                continue;
            }
            let poly = clip_band(&corners, lo, hi);
            if poly.len() < 3 {
                continue;
            }
            out.push(FilledPolygon {
                band,
                points: poly.into_iter().map(|p| p.0).collect(),
                color: band_color(band, levels, cmap),
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{Plane, slice, triangulate};
    use crate::mesh::test_support::hex_cube;

    fn area(poly: &[DVec2]) -> f64 {
        let n = poly.len();
        0.5 * (0..n).map(|i| poly[i].perp_dot(poly[(i + 1) % n])).sum::<f64>()
    }

    fn single_triangle(values: [f64; 3]) -> TriMesh2 {
        TriMesh2 {
            points: vec![DVec2::ZERO, DVec2::new(2.0, 0.0), DVec2::new(0.0, 2.0)],
            triangles: vec![[0, 1, 2]],
            values: values.to_vec(),
        }
    }

    #[test]
    fn linspace_hits_both_ends() {
        let levels = Levels::linspace(-5.0, 5.0, 21);
        assert_eq!(levels.values().len(), 21);
        assert_eq!(levels.min(), -5.0);
        assert_eq!(levels.max(), 5.0);
        assert!((levels.values()[1] + 4.5).abs() < 1e-12);
    }

    #[test]
    fn bands_tile_the_triangle() {
        let mesh = single_triangle([-1.0, 0.4, 1.7]);
        let cmap = ColorMap::by_name("RdBu_r").unwrap();
        let bands = filled_contours(&mesh, &Levels::linspace(0.0, 1.0, 5), Extend::Both, &cmap);
        let total: f64 = bands.iter().map(|b| area(&b.points)).sum();
        assert!((total - 2.0).abs() < 1e-12);
        assert!(bands.iter().any(|b| b.band == Band::Below && b.color == cmap.sample(0.0)));
        assert!(bands.iter().any(|b| b.band == Band::Above && b.color == cmap.sample(1.0)));
    }

    #[test]
    fn without_extension_out_of_range_parts_stay_empty() {
        let mesh = single_triangle([-1.0, -1.0, 1.0]);
        let cmap = ColorMap::by_name("viridis").unwrap();
        let bands = filled_contours(&mesh, &Levels::linspace(0.0, 1.0, 3), Extend::Neither, &cmap);
        let total: f64 = bands.iter().map(|b| area(&b.points)).sum();
        // only the corner with v >= 0 remains: a quarter of the triangle
        assert!((total - 0.5).abs() < 1e-12);
        assert!(bands.iter().all(|b| matches!(b.band, Band::Between(_))));
    }

    #[test]
    fn band_color_uses_interval_midpoint() {
        let mesh = single_triangle([0.1, 0.1, 0.2]);
        let cmap = ColorMap::by_name("greys").unwrap();
        let bands = filled_contours(&mesh, &Levels::linspace(0.0, 1.0, 2), Extend::Both, &cmap);
        assert_eq!(bands.len(), 1);
        assert_eq!(bands[0].color, cmap.sample(0.5));
    }

    #[test]
    fn sliced_cube_contours_cover_the_cut() {
        let cube = hex_cube(-1.0, 1.0, 2);
        let cut = triangulate(&slice(&cube, &Plane::new(DVec3::ZERO, DVec3::Z).unwrap()));
        let mesh = TriMesh2::from_dataset(&cut, "f", (Axis::X, Axis::Y)).unwrap();
        let cmap = ColorMap::by_name("RdBu_r").unwrap();
        let bands = filled_contours(&mesh, &Levels::linspace(-1.0, 1.0, 9), Extend::Both, &cmap);
        let total: f64 = bands.iter().map(|b| area(&b.points).abs()).sum();
        assert!((total - 4.0).abs() < 1e-9);
        assert!(TriMesh2::from_dataset(&cut, "missing", (Axis::X, Axis::Y)).is_err());
    }
}
