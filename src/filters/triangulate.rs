use crate::mesh::{Cell, Dataset};

/// Replace every surface cell by triangles.
///
/// Polygons, quads and pixels are fanned from their first vertex and strips
/// are split with alternating order, so each triangle keeps the winding of
/// the cell it came from. Vertex, line and volume cells are dropped; point
/// numbering and fields are unchanged.
pub fn triangulate(dataset: &Dataset) -> Dataset {
    let cells: Vec<Cell> = dataset
        .cells()
        .iter()
        .filter(|c| c.kind.dimension() == 2)
        .flat_map(|c| c.triangles())
        .map(|[a, b, c]| Cell::triangle(a, b, c))
        .collect();
    Dataset::from_parts(
        dataset.points().to_vec(),
        cells,
        dataset.point_data().clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{CellType, Field};
    use glam::DVec3;

    fn area(ds: &Dataset, cell: &Cell) -> f64 {
        cell.triangles()
            .iter()
            .map(|&[a, b, c]| {
                let (a, b, c) = (ds.point(a), ds.point(b), ds.point(c));
                0.5 * (b - a).cross(c - a).length()
            })
            .sum()
    }

    fn mixed_surface() -> Dataset {
        let points = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(2.0, 0.0, 0.0),
            DVec3::new(2.0, 1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(3.0, 0.5, 0.0),
            DVec3::new(2.5, 2.0, 0.0),
            DVec3::new(0.0, 2.0, 0.0),
        ];
        let cells = vec![
            Cell::new(CellType::Quad, vec![0, 1, 2, 3]),
            Cell::new(CellType::Polygon, vec![1, 4, 5, 2]),
            Cell::new(CellType::Pixel, vec![3, 2, 6, 5]),
            Cell::line(0, 1),
            Cell::new(CellType::Vertex, vec![4]),
        ];
        Dataset::new(points, cells)
            .unwrap()
            .with_field("f", Field::scalar((0..7).map(f64::from).collect()))
            .unwrap()
    }

    #[test]
    fn every_output_cell_is_a_triangle() {
        let tri = triangulate(&mixed_surface());
        assert_eq!(tri.num_cells(), 6);
        assert!(tri
            .cells()
            .iter()
            .all(|c| c.kind == CellType::Triangle && c.points.len() == 3));
        assert_eq!(tri.field("f").unwrap().len(), 7);
    }

    #[test]
    fn total_area_is_preserved() {
        let ds = mixed_surface();
        let before: f64 = ds.cells().iter().map(|c| area(&ds, c)).sum();
        let tri = triangulate(&ds);
        let after: f64 = tri.cells().iter().map(|c| area(&tri, c)).sum();
        assert!((before - after).abs() < 1e-12);
    }

    #[test]
    fn winding_follows_the_source_cell() {
        let ds = mixed_surface();
        let tri = triangulate(&ds);
        for cell in tri.cells() {
            let (a, b, c) = (ds.point(cell.points[0]), ds.point(cell.points[1]), ds.point(cell.points[2]));
            assert!((b - a).cross(c - a).z > 0.0);
        }
    }
}
