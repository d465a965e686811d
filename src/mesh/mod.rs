//! In-memory datasets: points, cells and named point fields.
//!
//! A [`Dataset`] is never modified once built. Filters read one and return a
//! new one, usually through [`builder::DatasetBuilder`].

pub mod builder;
pub mod cell;
pub mod image;

use glam::DVec3;
use std::collections::BTreeMap;
use thiserror::Error;

pub use cell::{Cell, CellType};
pub use image::ImageData;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshError {
    #[error("point field `{0}` not found")]
    UnknownField(String),
    #[error("field `{name}` has {actual} values, expected {expected}")]
    FieldLength {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("field `{name}` has {components} components, expected a scalar")]
    NotScalar { name: String, components: usize },
    #[error("cell {cell} references point {point} but the dataset has {points} points")]
    PointOutOfRange {
        cell: usize,
        point: usize,
        points: usize,
    },
    #[error("cell {cell} of type {kind:?} has {count} points")]
    CellSize {
        cell: usize,
        kind: CellType,
        count: usize,
    },
    #[error("plane normal must have non-zero length")]
    DegenerateNormal,
}

// Per-point values stored as flat tuples
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    components: usize,
    values: Vec<f64>,
}

impl Field {
    pub fn new(components: usize, values: Vec<f64>) -> Self {
        Field {
            components: components.max(1),
            values,
        }
    }

    pub fn scalar(values: Vec<f64>) -> Self {
        Field::new(1, values)
    }

    pub fn components(&self) -> usize {
        self.components
    }

    /// Number of tuples.
    pub fn len(&self) -> usize {
        self.values.len() / self.components
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn tuple(&self, i: usize) -> &[f64] {
        &self.values[i * self.components..(i + 1) * self.components]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Weighted sum of tuples, one output tuple per weight list.
    pub(crate) fn interpolate(&self, weights: &[Vec<(usize, f64)>]) -> Field {
        let mut values = Vec::with_capacity(weights.len() * self.components);
        for w in weights {
            for c in 0..self.components {
                values.push(
                    w.iter()
                        .map(|&(i, wi)| wi * self.tuple(i)[c])
                        .sum(),
                );
            }
        }
        Field::new(self.components, values)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: DVec3,
    pub max: DVec3,
}

impl Bounds {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a DVec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(
            Bounds {
                min: first,
                max: first,
            },
            |b, p| Bounds {
                min: b.min.min(*p),
                max: b.max.max(*p),
            },
        ))
    }

    pub fn diagonal(&self) -> f64 {
        (self.max - self.min).length()
    }

    pub fn contains(&self, p: DVec3, tol: f64) -> bool {
        p.cmpge(self.min - DVec3::splat(tol)).all() && p.cmple(self.max + DVec3::splat(tol)).all()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    points: Vec<DVec3>,
    cells: Vec<Cell>,
    point_data: BTreeMap<String, Field>,
}

impl Dataset {
    pub fn new(points: Vec<DVec3>, cells: Vec<Cell>) -> Result<Self, MeshError> {
        for (i, cell) in cells.iter().enumerate() {
            if !cell.has_valid_size() {
                return Err(MeshError::CellSize {
                    cell: i,
                    kind: cell.kind,
                    count: cell.points.len(),
                });
            }
            if let Some(&bad) = cell.points.iter().find(|&&p| p >= points.len()) {
                return Err(MeshError::PointOutOfRange {
                    cell: i,
                    point: bad,
                    points: points.len(),
                });
            }
        }
        Ok(Dataset {
            points,
            cells,
            point_data: BTreeMap::new(),
        })
    }

    /// Attach a point field. The field must hold one tuple per point.
    pub fn with_field(mut self, name: &str, field: Field) -> Result<Self, MeshError> {
        if field.len() != self.points.len() || field.values.len() % field.components != 0 {
            return Err(MeshError::FieldLength {
                name: name.to_string(),
                expected: self.points.len() * field.components,
                actual: field.values.len(),
            });
        }
        self.point_data.insert(name.to_string(), field);
        Ok(self)
    }

    pub(crate) fn from_parts(
        points: Vec<DVec3>,
        cells: Vec<Cell>,
        point_data: BTreeMap<String, Field>,
    ) -> Self {
        Dataset {
            points,
            cells,
            point_data,
        }
    }

    pub fn points(&self) -> &[DVec3] {
        &self.points
    }

    pub fn point(&self, i: usize) -> DVec3 {
        self.points[i]
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point_data(&self) -> &BTreeMap<String, Field> {
        &self.point_data
    }

    pub fn field(&self, name: &str) -> Result<&Field, MeshError> {
        self.point_data
            .get(name)
            .ok_or_else(|| MeshError::UnknownField(name.to_string()))
    }

    /// Values of a single-component field.
    pub fn scalars(&self, name: &str) -> Result<&[f64], MeshError> {
        let field = self.field(name)?;
        if field.components != 1 {
            return Err(MeshError::NotScalar {
                name: name.to_string(),
                components: field.components,
            });
        }
        Ok(field.values())
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.points)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Structured grid of hexahedra over `[lo, hi]^3` with `n` cells per axis
    /// and the scalar `f = x` attached as `"f"`.
    pub fn hex_cube(lo: f64, hi: f64, n: usize) -> Dataset {
        let h = (hi - lo) / n as f64;
        let m = n + 1;
        let mut points = Vec::new();
        for k in 0..m {
            for j in 0..m {
                for i in 0..m {
                    points.push(DVec3::new(
                        lo + i as f64 * h,
                        lo + j as f64 * h,
                        lo + k as f64 * h,
                    ));
                }
            }
        }
        let id = |i: usize, j: usize, k: usize| i + m * (j + m * k);
        let mut cells = Vec::new();
        for k in 0..n {
            for j in 0..n {
                for i in 0..n {
                    cells.push(Cell::new(
                        CellType::Hexahedron,
                        vec![
                            id(i, j, k),
                            id(i + 1, j, k),
                            id(i + 1, j + 1, k),
                            id(i, j + 1, k),
                            id(i, j, k + 1),
                            id(i + 1, j, k + 1),
                            id(i + 1, j + 1, k + 1),
                            id(i, j + 1, k + 1),
                        ],
                    ));
                }
            }
        }
        let f = points.iter().map(|p| p.x).collect();
        Dataset::new(points, cells)
            .unwrap()
            .with_field("f", Field::scalar(f))
            .unwrap()
    }

    /// Two unit squares, each split into two triangles, separated along x.
    pub fn two_squares(gap: f64) -> Dataset {
        let mut points = Vec::new();
        let mut cells = Vec::new();
        for s in 0..2 {
            let x0 = s as f64 * (1.0 + gap);
            let base = points.len();
            points.extend([
                DVec3::new(x0, 0.0, 0.0),
                DVec3::new(x0 + 1.0, 0.0, 0.0),
                DVec3::new(x0 + 1.0, 1.0, 0.0),
                DVec3::new(x0, 1.0, 0.0),
            ]);
            cells.push(Cell::triangle(base, base + 1, base + 2));
            cells.push(Cell::triangle(base, base + 2, base + 3));
        }
        let f = points.iter().map(|p| p.x).collect();
        Dataset::new(points, cells)
            .unwrap()
            .with_field("f", Field::scalar(f))
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_connectivity() {
        let err = Dataset::new(vec![DVec3::ZERO; 2], vec![Cell::line(0, 2)]).unwrap_err();
        assert_eq!(
            err,
            MeshError::PointOutOfRange {
                cell: 0,
                point: 2,
                points: 2
            }
        );
    }

    #[test]
    fn rejects_field_of_wrong_length() {
        let ds = Dataset::new(vec![DVec3::ZERO; 3], Vec::new()).unwrap();
        assert!(matches!(
            ds.with_field("v", Field::new(3, vec![0.0; 6])),
            Err(MeshError::FieldLength { .. })
        ));
    }

    #[test]
    fn interpolates_every_component() {
        let field = Field::new(2, vec![0.0, 10.0, 2.0, 20.0]);
        let out = field.interpolate(&[vec![(0, 0.5), (1, 0.5)], vec![(1, 1.0)]]);
        assert_eq!(out.values(), &[1.0, 15.0, 2.0, 20.0]);
    }

    #[test]
    fn bounds_of_cube() {
        let cube = test_support::hex_cube(-1.0, 1.0, 2);
        let b = cube.bounds().unwrap();
        assert_eq!(b.min, DVec3::splat(-1.0));
        assert_eq!(b.max, DVec3::splat(1.0));
        assert_eq!(cube.num_cells(), 8);
    }
}
