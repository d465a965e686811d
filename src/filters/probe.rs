//! Resampling of point fields at foreign locations.
//!
//! Query points outside the source receive `0.0` in every component and a
//! `0` in [`VALID_MASK`]. The zero sentinel is what downstream streamline
//! integration relies on to stop at walls, so it is kept as the default even
//! though it is not a physical value. Accuracy depends on the query spacing
//! relative to the source resolution: a coarse lattice may pick up nonzero
//! values just outside the true domain.

use crate::mesh::{Bounds, Dataset, Field, ImageData};
use glam::{DMat3, DVec3};
use std::collections::BTreeMap;

/// Name of the 0/1 field marking query points that fell inside the source.
pub const VALID_MASK: &str = "vtkValidPointMask";

/// Something that can tell which of its points surround a location.
pub trait Locate {
    /// Interpolation weights `(point, weight)` at `p`, `None` outside.
    fn locate(&self, p: DVec3) -> Option<Vec<(usize, f64)>>;

    fn fields(&self) -> &BTreeMap<String, Field>;
}

impl Locate for ImageData {
    fn locate(&self, p: DVec3) -> Option<Vec<(usize, f64)>> {
        let tol = 1e-9 * self.spacing().abs().max_element().max(1.0);
        self.weights_at(p, tol)
    }

    fn fields(&self) -> &BTreeMap<String, Field> {
        self.point_data()
    }
}

// Simplices used for point location in explicit cells
enum Simplex {
    Tet([usize; 4]),
    Tri([usize; 3]),
}

/// Uniform bin locator over the cells of a dataset.
pub struct CellLocator<'a> {
    dataset: &'a Dataset,
    simplices: Vec<Simplex>,
    bounds: Bounds,
    dims: [usize; 3],
    bins: Vec<Vec<usize>>,
    tol: f64,
}

impl<'a> CellLocator<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        let mut simplices = Vec::new();
        for cell in dataset.cells() {
            match cell.kind.dimension() {
                3 => simplices.extend(cell.tetrahedra().into_iter().map(Simplex::Tet)),
                2 => simplices.extend(cell.triangles().into_iter().map(Simplex::Tri)),
                _ => {}
            }
        }

        let bounds = dataset.bounds().unwrap_or(Bounds {
            min: DVec3::ZERO,
            max: DVec3::ZERO,
        });
        let tol = 1e-9 * bounds.diagonal().max(1e-12);
        let extent = bounds.max - bounds.min;
        // about four simplices per bin along the populated axes
        let target = (simplices.len() as f64 / 4.0).max(1.0);
        let active = (0..3).filter(|&a| extent[a] > tol).count().max(1) as f64;
        let per_axis = target.powf(1.0 / active).ceil().max(1.0) as usize;
        let dims = [0, 1, 2].map(|a| if extent[a] > tol { per_axis.min(512) } else { 1 });

        let mut locator = CellLocator {
            dataset,
            simplices: Vec::new(),
            bounds,
            dims,
            bins: vec![Vec::new(); dims[0] * dims[1] * dims[2]],
            tol,
        };
        for (s, simplex) in simplices.iter().enumerate() {
            let ids: &[usize] = match simplex {
                Simplex::Tet(t) => t,
                Simplex::Tri(t) => t,
            };
            let Some(b) = Bounds::from_points(ids.iter().map(|&i| &dataset.points()[i])) else {
                continue;
            };
            let lo = locator.bin_coords(b.min - DVec3::splat(tol));
            let hi = locator.bin_coords(b.max + DVec3::splat(tol));
            for k in lo[2]..=hi[2] {
                for j in lo[1]..=hi[1] {
                    for i in lo[0]..=hi[0] {
                        let bin = locator.bin_index([i, j, k]);
                        locator.bins[bin].push(s);
                    }
                }
            }
        }
        locator.simplices = simplices;
        locator
    }

    fn bin_coords(&self, p: DVec3) -> [usize; 3] {
        let extent = self.bounds.max - self.bounds.min;
        [0, 1, 2].map(|a| {
            if self.dims[a] == 1 {
                return 0;
            }
            let u = (p[a] - self.bounds.min[a]) / extent[a] * self.dims[a] as f64;
            (u.floor().max(0.0) as usize).min(self.dims[a] - 1)
        })
    }

    fn bin_index(&self, c: [usize; 3]) -> usize {
        c[0] + self.dims[0] * (c[1] + self.dims[1] * c[2])
    }

    fn weights_in(&self, simplex: &Simplex, p: DVec3) -> Option<Vec<(usize, f64)>> {
        let pt = |i: usize| self.dataset.point(i);
        let eps = 1e-9;
        match simplex {
            Simplex::Tet(t) => {
                let a = pt(t[0]);
                let m = DMat3::from_cols(pt(t[1]) - a, pt(t[2]) - a, pt(t[3]) - a);
                if m.determinant().abs() < f64::EPSILON * self.tol.powi(3).max(f64::MIN_POSITIVE) {
                    return None;
                }
                let l = m.inverse() * (p - a);
                let l0 = 1.0 - l.x - l.y - l.z;
                let w = [l0, l.x, l.y, l.z];
                w.iter()
                    .all(|&wi| wi >= -eps)
                    .then(|| t.iter().zip(w).map(|(&i, wi)| (i, wi.max(0.0))).collect())
            }
            Simplex::Tri(t) => {
                let (a, b, c) = (pt(t[0]), pt(t[1]), pt(t[2]));
                let n = (b - a).cross(c - a);
                let area2 = n.length_squared();
                if area2 == 0.0 {
                    return None;
                }
                if (p - a).dot(n).abs() / area2.sqrt() > self.tol {
                    return None;
                }
                let wa = (b - p).cross(c - p).dot(n) / area2;
                let wb = (c - p).cross(a - p).dot(n) / area2;
                let wc = 1.0 - wa - wb;
                [wa, wb, wc]
                    .iter()
                    .all(|&wi| wi >= -eps)
                    .then(|| vec![(t[0], wa.max(0.0)), (t[1], wb.max(0.0)), (t[2], wc.max(0.0))])
            }
        }
    }
}

impl Locate for CellLocator<'_> {
    fn locate(&self, p: DVec3) -> Option<Vec<(usize, f64)>> {
        if self.simplices.is_empty() || !self.bounds.contains(p, self.tol) {
            return None;
        }
        let bin = self.bin_index(self.bin_coords(p));
        self.bins[bin]
            .iter()
            .find_map(|&s| self.weights_in(&self.simplices[s], p))
    }

    fn fields(&self) -> &BTreeMap<String, Field> {
        self.dataset.point_data()
    }
}

/// Sample every field of `source` at `points`. The result has the query
/// points, no cells, the source fields and [`VALID_MASK`].
pub fn probe(source: &impl Locate, points: &[DVec3]) -> Dataset {
    let mut mask = Vec::with_capacity(points.len());
    let weights: Vec<Vec<(usize, f64)>> = points
        .iter()
        .map(|&p| match source.locate(p) {
            Some(w) => {
                mask.push(1.0);
                w
            }
            None => {
                mask.push(0.0);
                Vec::new()
            }
        })
        .collect();

    let mut point_data: BTreeMap<String, Field> = source
        .fields()
        .iter()
        .map(|(name, field)| (name.clone(), field.interpolate(&weights)))
        .collect();
    let inside = mask.iter().filter(|&&m| m > 0.0).count();
    point_data.insert(VALID_MASK.to_string(), Field::scalar(mask));

    log::debug!("probed {} points, {} inside the source", points.len(), inside);
    Dataset::from_parts(points.to_vec(), Vec::new(), point_data)
}

/// Sample `source` at the points of `target`, keeping the target's cells.
pub fn probe_dataset(source: &impl Locate, target: &Dataset) -> Dataset {
    let probed = probe(source, target.points());
    Dataset::from_parts(
        target.points().to_vec(),
        target.cells().to_vec(),
        probed.point_data().clone(),
    )
}

/// Evenly spaced lattice in a plane of constant z, the resampling target
/// for streamline computation.
///
/// Coordinates run from the minimum in steps of `spacing` up to and
/// including the maximum when it is a whole number of steps away.
#[derive(Debug, Clone, PartialEq)]
pub struct RegularGrid2 {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: f64,
}

impl RegularGrid2 {
    pub fn new(x_range: (f64, f64), y_range: (f64, f64), spacing: f64, z: f64) -> Self {
        let axis = |(lo, hi): (f64, f64)| -> Vec<f64> {
            if spacing <= 0.0 || hi < lo {
                return vec![lo];
            }
            let n = ((hi - lo) / spacing + 1e-9).floor() as usize + 1;
            (0..n).map(|i| lo + i as f64 * spacing).collect()
        };
        RegularGrid2 {
            x: axis(x_range),
            y: axis(y_range),
            z,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.x.len(), self.y.len())
    }

    /// Lattice points with x as the outer loop: index `i * ny + j`.
    pub fn points(&self) -> Vec<DVec3> {
        self.x
            .iter()
            .flat_map(|&x| self.y.iter().map(move |&y| DVec3::new(x, y, self.z)))
            .collect()
    }
}

/// Sample `source` on a regular lattice.
pub fn probe_grid(source: &impl Locate, grid: &RegularGrid2) -> Dataset {
    probe(source, &grid.points())
}
