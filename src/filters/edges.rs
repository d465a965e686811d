use crate::mesh::builder::DatasetBuilder;
use crate::mesh::{Cell, Dataset};
use glam::DVec3;
use std::collections::HashMap;

// Which edges of a surface to extract
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeOptions {
    pub boundary: bool,
    pub feature: bool,
    pub feature_angle_deg: f64,
}

impl Default for EdgeOptions {
    fn default() -> Self {
        EdgeOptions {
            boundary: true,
            feature: false,
            feature_angle_deg: 30.0,
        }
    }
}

struct EdgeUse {
    first: (usize, usize),
    cells: Vec<usize>,
}

fn cell_normal(dataset: &Dataset, cell: &Cell) -> DVec3 {
    cell.triangles()
        .iter()
        .map(|&[a, b, c]| {
            let (a, b, c) = (dataset.point(a), dataset.point(b), dataset.point(c));
            (b - a).cross(c - a)
        })
        .sum::<DVec3>()
        .normalize_or_zero()
}

/// Edges of the surface cells of `dataset` as line cells.
///
/// A boundary edge is used by exactly one cell; a feature edge is shared by
/// two cells whose normals differ by more than the feature angle. Each edge
/// keeps the orientation it has in the first cell using it, and the output
/// holds only the points those edges use, numbered in order of first use.
pub fn extract_edges(dataset: &Dataset, options: &EdgeOptions) -> Dataset {
    let mut order: Vec<(usize, usize)> = Vec::new();
    let mut uses: HashMap<(usize, usize), EdgeUse> = HashMap::new();
    for (c, cell) in dataset.cells().iter().enumerate() {
        if cell.kind.dimension() != 2 {
            continue;
        }
        for (a, b) in cell.boundary_edges() {
            let key = (a.min(b), a.max(b));
            uses.entry(key)
                .or_insert_with(|| {
                    order.push(key);
                    EdgeUse {
                        first: (a, b),
                        cells: Vec::new(),
                    }
                })
                .cells
                .push(c);
        }
    }

    let cos_limit = options.feature_angle_deg.to_radians().cos();
    let mut builder = DatasetBuilder::new(dataset);
    for key in order {
        let edge = &uses[&key];
        let keep = match edge.cells.as_slice() {
            [_] => options.boundary,
            [c0, c1] if options.feature => {
                let n0 = cell_normal(dataset, &dataset.cells()[*c0]);
                let n1 = cell_normal(dataset, &dataset.cells()[*c1]);
                n0.dot(n1) < cos_limit
            }
            _ => false,
        };
        if keep {
            let (a, b) = edge.first;
            let (a, b) = (builder.vertex(a), builder.vertex(b));
            builder.push_cell(Cell::line(a, b));
        }
    }
    builder.build()
}

/// Boundary edges only, the outline of a planar slice.
pub fn extract_boundary_edges(dataset: &Dataset) -> Dataset {
    extract_edges(dataset, &EdgeOptions::default())
}

/// Line cells of an edge dataset as `(start, end)` point pairs.
pub fn line_pairs(edges: &Dataset) -> Vec<(usize, usize)> {
    edges
        .cells()
        .iter()
        .filter(|c| c.points.len() == 2)
        .map(|c| (c.points[0], c.points[1]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::chain::sort_chain;
    use crate::mesh::test_support::two_squares;
    use crate::mesh::Field;

    #[test]
    fn square_outline_is_a_closed_chain() {
        let squares = two_squares(1.0);
        let first = crate::filters::connectivity::extract_closest_point_region(&squares, DVec3::ZERO);
        let edges = extract_boundary_edges(&first);
        assert_eq!(edges.num_cells(), 4);
        assert_eq!(edges.num_points(), 4);
        let chain = sort_chain(&line_pairs(&edges), 0).unwrap();
        assert!(chain.closed);
        assert_eq!(chain.points.len(), 5);
        // outline values are copied from the source
        let f = edges.scalars("f").unwrap();
        for (p, v) in edges.points().iter().zip(f) {
            assert_eq!(p.x, *v);
        }
    }

    #[test]
    fn folded_surface_reports_feature_edge() {
        // two triangles folded 90 degrees along the x axis
        let points = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(0.0, 0.0, 1.0),
        ];
        let ds = Dataset::new(points, vec![Cell::triangle(0, 1, 2), Cell::triangle(1, 0, 3)])
            .unwrap()
            .with_field("f", Field::scalar(vec![0.0; 4]))
            .unwrap();
        let only_features = EdgeOptions {
            boundary: false,
            feature: true,
            feature_angle_deg: 30.0,
        };
        let features = extract_edges(&ds, &only_features);
        assert_eq!(line_pairs(&features).len(), 1);
        assert_eq!(extract_boundary_edges(&ds).num_cells(), 4);
    }
}
