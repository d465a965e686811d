use super::{Cell, CellType, Dataset, Field, MeshError};
use glam::DVec3;
use std::collections::BTreeMap;

/// Regular lattice of points given by extent, origin and spacing.
///
/// Point `(i, j, k)` of the extent sits at `origin + (i, j, k) * spacing`
/// and points are numbered with `i` varying fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    extent: [i64; 6],
    origin: DVec3,
    spacing: DVec3,
    point_data: BTreeMap<String, Field>,
}

impl ImageData {
    pub fn new(extent: [i64; 6], origin: DVec3, spacing: DVec3) -> Self {
        ImageData {
            extent,
            origin,
            spacing,
            point_data: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: &str, field: Field) -> Result<Self, MeshError> {
        if field.len() != self.num_points() {
            return Err(MeshError::FieldLength {
                name: name.to_string(),
                expected: self.num_points() * field.components(),
                actual: field.values().len(),
            });
        }
        self.point_data.insert(name.to_string(), field);
        Ok(self)
    }

    pub fn dims(&self) -> [usize; 3] {
        let d = |a: usize| (self.extent[2 * a + 1] - self.extent[2 * a] + 1).max(0) as usize;
        [d(0), d(1), d(2)]
    }

    pub fn num_points(&self) -> usize {
        self.dims().iter().product()
    }

    pub fn origin(&self) -> DVec3 {
        self.origin
    }

    pub fn spacing(&self) -> DVec3 {
        self.spacing
    }

    pub fn point_data(&self) -> &BTreeMap<String, Field> {
        &self.point_data
    }

    pub fn point_id(&self, i: usize, j: usize, k: usize) -> usize {
        let [nx, ny, _] = self.dims();
        i + nx * (j + ny * k)
    }

    pub fn point(&self, i: usize, j: usize, k: usize) -> DVec3 {
        let ijk = DVec3::new(
            (self.extent[0] + i as i64) as f64,
            (self.extent[2] + j as i64) as f64,
            (self.extent[4] + k as i64) as f64,
        );
        self.origin + ijk * self.spacing
    }

    /// Multilinear interpolation weights at `p`, or `None` when `p` lies
    /// outside the lattice. Flat axes accept points within `tol` of the plane.
    pub fn weights_at(&self, p: DVec3, tol: f64) -> Option<Vec<(usize, f64)>> {
        let dims = self.dims();
        let mut base = [0usize; 3];
        let mut frac = [0.0f64; 3];
        for a in 0..3 {
            let n = dims[a];
            if n == 0 {
                return None;
            }
            let start = self.origin[a] + self.extent[2 * a] as f64 * self.spacing[a];
            if n == 1 {
                if (p[a] - start).abs() > tol {
                    return None;
                }
                continue;
            }
            let u = (p[a] - start) / self.spacing[a];
            let last = (n - 1) as f64;
            let slack = tol / self.spacing[a].abs();
            if u < -slack || u > last + slack {
                return None;
            }
            let u = u.clamp(0.0, last);
            let cell = (u.floor() as usize).min(n - 2);
            base[a] = cell;
            frac[a] = u - cell as f64;
        }

        let mut weights = Vec::with_capacity(8);
        for corner in 0..8usize {
            let mut w = 1.0;
            let mut ijk = base;
            for a in 0..3 {
                let upper = corner >> a & 1 == 1;
                if dims[a] == 1 {
                    if upper {
                        w = 0.0;
                    }
                    continue;
                }
                if upper {
                    ijk[a] += 1;
                    w *= frac[a];
                } else {
                    w *= 1.0 - frac[a];
                }
            }
            if w > 0.0 {
                weights.push((self.point_id(ijk[0], ijk[1], ijk[2]), w));
            }
        }
        if weights.is_empty() {
            weights.push((self.point_id(base[0], base[1], base[2]), 1.0));
        }
        Some(weights)
    }

    /// Explicit representation: lattice points plus lines, pixels or voxels
    /// depending on how many axes have more than one point.
    pub fn to_dataset(&self) -> Dataset {
        let [nx, ny, nz] = self.dims();
        let mut points = Vec::with_capacity(self.num_points());
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    points.push(self.point(i, j, k));
                }
            }
        }

        let active: Vec<usize> = (0..3).filter(|&a| self.dims()[a] > 1).collect();
        let kind = match active.len() {
            0 => CellType::Vertex,
            1 => CellType::Line,
            2 => CellType::Pixel,
            _ => CellType::Voxel,
        };
        let cell_dims = [nx.saturating_sub(1).max(1), ny.saturating_sub(1).max(1), nz.saturating_sub(1).max(1)];
        let mut cells = Vec::new();
        if !points.is_empty() {
            for k in 0..cell_dims[2] {
                for j in 0..cell_dims[1] {
                    for i in 0..cell_dims[0] {
                        let mut ids = Vec::with_capacity(8);
                        for corner in 0..(1usize << active.len()) {
                            let mut ijk = [i, j, k];
                            for (bit, &a) in active.iter().enumerate() {
                                if corner >> bit & 1 == 1 {
                                    ijk[a] += 1;
                                }
                            }
                            ids.push(self.point_id(ijk[0], ijk[1], ijk[2]));
                        }
                        cells.push(Cell::new(kind, ids));
                    }
                }
            }
        }
        Dataset::from_parts(points, cells, self.point_data.clone())
    }
}
