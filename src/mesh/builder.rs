use super::{Cell, Dataset};
use glam::DVec3;
use std::collections::HashMap;

// Identity of an output point in terms of the source dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum PointKey {
    Vertex(usize),
    Edge(usize, usize),
}

/// Assembles a derived dataset whose points are source vertices or points on
/// source edges. Points with the same origin are shared, and every source
/// field is carried over by linear interpolation when the builder finishes.
pub struct DatasetBuilder<'a> {
    source: &'a Dataset,
    points: Vec<DVec3>,
    weights: Vec<Vec<(usize, f64)>>,
    lookup: HashMap<PointKey, usize>,
    cells: Vec<Cell>,
}

impl<'a> DatasetBuilder<'a> {
    pub fn new(source: &'a Dataset) -> Self {
        DatasetBuilder {
            source,
            points: Vec::new(),
            weights: Vec::new(),
            lookup: HashMap::new(),
            cells: Vec::new(),
        }
    }

    fn insert(&mut self, key: PointKey, point: DVec3, weights: Vec<(usize, f64)>) -> usize {
        if let Some(&id) = self.lookup.get(&key) {
            return id;
        }
        let id = self.points.len();
        self.points.push(point);
        self.weights.push(weights);
        self.lookup.insert(key, id);
        id
    }

    /// Output index of source vertex `src`, added on first use.
    pub fn vertex(&mut self, src: usize) -> usize {
        let p = self.source.point(src);
        self.insert(PointKey::Vertex(src), p, vec![(src, 1.0)])
    }

    /// Output index of the point at parameter `t` on the source edge `a -> b`.
    pub fn edge_point(&mut self, a: usize, b: usize, t: f64) -> usize {
        if t <= 0.0 {
            return self.vertex(a);
        }
        if t >= 1.0 {
            return self.vertex(b);
        }
        let (lo, hi, t) = if a < b { (a, b, t) } else { (b, a, 1.0 - t) };
        let p = self.source.point(lo).lerp(self.source.point(hi), t);
        self.insert(PointKey::Edge(lo, hi), p, vec![(lo, 1.0 - t), (hi, t)])
    }

    pub fn push_cell(&mut self, cell: Cell) {
        self.cells.push(cell);
    }

    pub fn point(&self, id: usize) -> DVec3 {
        self.points[id]
    }

    pub fn build(self) -> Dataset {
        let point_data = self
            .source
            .point_data()
            .iter()
            .map(|(name, field)| (name.clone(), field.interpolate(&self.weights)))
            .collect();
        Dataset::from_parts(self.points, self.cells, point_data)
    }
}
