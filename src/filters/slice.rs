//! Plane cuts.
//!
//! A point is above the plane when its signed distance is strictly positive
//! and below otherwise, so points lying exactly on the plane behave like
//! points just below it. Volume cells are cut tetrahedron by tetrahedron,
//! surface cells along their perimeter and line cells at their crossing.

use crate::mesh::builder::DatasetBuilder;
use crate::mesh::{Cell, CellType, Dataset, MeshError};
use glam::DVec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    origin: DVec3,
    normal: DVec3,
}

impl Plane {
    pub fn new(origin: DVec3, normal: DVec3) -> Result<Self, MeshError> {
        let normal = normal.try_normalize().ok_or(MeshError::DegenerateNormal)?;
        Ok(Plane { origin, normal })
    }

    pub fn from_arrays(origin: [f64; 3], normal: [f64; 3]) -> Result<Self, MeshError> {
        Plane::new(DVec3::from_array(origin), DVec3::from_array(normal))
    }

    pub fn origin(&self) -> DVec3 {
        self.origin
    }

    pub fn normal(&self) -> DVec3 {
        self.normal
    }

    pub fn signed_distance(&self, p: DVec3) -> f64 {
        (p - self.origin).dot(self.normal)
    }
}

// Parameter along a -> b where the distance changes sign, if it does
fn crossing(da: f64, db: f64) -> Option<f64> {
    if (da > 0.0) == (db > 0.0) {
        None
    } else {
        Some(da / (da - db))
    }
}

const TET_EDGES: [(usize, usize); 6] = [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)];

fn cut_tet(builder: &mut DatasetBuilder, tet: [usize; 4], dist: &[f64], normal: DVec3) {
    let mut ids: Vec<usize> = Vec::with_capacity(4);
    for (i, j) in TET_EDGES {
        let (a, b) = (tet[i], tet[j]);
        if let Some(t) = crossing(dist[a], dist[b]) {
            let id = builder.edge_point(a, b, t);
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    if ids.len() < 3 {
        return;
    }
    order_around_centroid(builder, &mut ids, normal);
    let kind = if ids.len() == 3 {
        CellType::Triangle
    } else {
        CellType::Polygon
    };
    builder.push_cell(Cell::new(kind, ids));
}

/// Sorts the points of a planar convex polygon counter-clockwise about
/// `normal`.
fn order_around_centroid(builder: &DatasetBuilder, ids: &mut [usize], normal: DVec3) {
    let pts: Vec<DVec3> = ids.iter().map(|&i| builder.point(i)).collect();
    let centroid = pts.iter().copied().sum::<DVec3>() / pts.len() as f64;
    let reference = (pts[0] - centroid).normalize_or_zero();
    let angle = |p: DVec3| {
        let v = (p - centroid).normalize_or_zero();
        reference.cross(v).dot(normal).atan2(reference.dot(v))
    };
    let mut keyed: Vec<(f64, usize)> = ids.iter().zip(&pts).map(|(&i, &p)| (angle(p), i)).collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    for (slot, (_, id)) in ids.iter_mut().zip(keyed) {
        *slot = id;
    }
}

fn cut_ring(builder: &mut DatasetBuilder, ring: &[usize], dist: &[f64]) {
    let mut hits = Vec::with_capacity(2);
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[(i + 1) % ring.len()]);
        if let Some(t) = crossing(dist[a], dist[b]) {
            let id = builder.edge_point(a, b, t);
            if !hits.contains(&id) {
                hits.push(id);
            }
        }
    }
    // a non-convex ring can cross more than twice; pair crossings in order
    for pair in hits.chunks_exact(2) {
        builder.push_cell(Cell::line(pair[0], pair[1]));
    }
}

/// Cut `dataset` with `plane`.
///
/// Fields are interpolated linearly onto the cut. A plane that misses the
/// dataset gives an empty dataset that still lists the source field names.
pub fn slice(dataset: &Dataset, plane: &Plane) -> Dataset {
    let dist: Vec<f64> = dataset
        .points()
        .iter()
        .map(|&p| plane.signed_distance(p))
        .collect();
    let mut builder = DatasetBuilder::new(dataset);

    for cell in dataset.cells() {
        match cell.kind.dimension() {
            3 => {
                for tet in cell.tetrahedra() {
                    cut_tet(&mut builder, tet, &dist, plane.normal());
                }
            }
            2 => match cell.polygon_loop() {
                Some(ring) => cut_ring(&mut builder, &ring, &dist),
                None => {
                    for tri in cell.triangles() {
                        cut_ring(&mut builder, &tri, &dist);
                    }
                }
            },
            1 => {
                for pair in cell.points.windows(2) {
                    if let Some(t) = crossing(dist[pair[0]], dist[pair[1]]) {
                        let id = builder.edge_point(pair[0], pair[1], t);
                        builder.push_cell(Cell::new(CellType::Vertex, vec![id]));
                    }
                }
            }
            _ => {}
        }
    }

    let out = builder.build();
    log::debug!(
        "slice at {:?} / {:?}: {} points, {} cells",
        plane.origin(),
        plane.normal(),
        out.num_points(),
        out.num_cells()
    );
    out
}
