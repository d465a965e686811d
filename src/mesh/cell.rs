// VTK cell types understood by the filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellType {
    Vertex,
    Line,
    Triangle,
    TriangleStrip,
    Polygon,
    Pixel,
    Quad,
    Tetra,
    Voxel,
    Hexahedron,
    Wedge,
    Pyramid,
}

impl CellType {
    pub fn from_vtk_id(id: u8) -> Option<Self> {
        let kind = match id {
            1 => CellType::Vertex,
            3 => CellType::Line,
            5 => CellType::Triangle,
            6 => CellType::TriangleStrip,
            7 => CellType::Polygon,
            8 => CellType::Pixel,
            9 => CellType::Quad,
            10 => CellType::Tetra,
            11 => CellType::Voxel,
            12 => CellType::Hexahedron,
            13 => CellType::Wedge,
            14 => CellType::Pyramid,
            _ => return None,
        };
        Some(kind)
    }

    /// Topological dimension: 0 for vertices, 1 for lines, 2 for surface
    /// cells and 3 for volume cells.
    pub fn dimension(self) -> u8 {
        match self {
            CellType::Vertex => 0,
            CellType::Line => 1,
            CellType::Triangle
            | CellType::TriangleStrip
            | CellType::Polygon
            | CellType::Pixel
            | CellType::Quad => 2,
            CellType::Tetra
            | CellType::Voxel
            | CellType::Hexahedron
            | CellType::Wedge
            | CellType::Pyramid => 3,
        }
    }

    /// Number of points for fixed-size cells, `None` for strips and polygons.
    pub fn fixed_size(self) -> Option<usize> {
        match self {
            CellType::Vertex => Some(1),
            CellType::Line => Some(2),
            CellType::Triangle => Some(3),
            CellType::Pixel | CellType::Quad | CellType::Tetra => Some(4),
            CellType::Pyramid => Some(5),
            CellType::Wedge => Some(6),
            CellType::Voxel | CellType::Hexahedron => Some(8),
            CellType::TriangleStrip | CellType::Polygon => None,
        }
    }

    fn min_size(self) -> usize {
        match self {
            CellType::TriangleStrip | CellType::Polygon => 3,
            other => other.fixed_size().unwrap_or(1),
        }
    }
}

// Tetrahedral decompositions in local vertex numbering. The hex is split
// around its 0-6 diagonal so that translated neighbours cut each shared
// face along the same diagonal.
const HEX_TETS: [[usize; 4]; 6] = [
    [0, 1, 2, 6],
    [0, 2, 3, 6],
    [0, 3, 7, 6],
    [0, 7, 4, 6],
    [0, 4, 5, 6],
    [0, 5, 1, 6],
];
const WEDGE_TETS: [[usize; 4]; 3] = [[0, 1, 2, 3], [1, 2, 3, 4], [2, 3, 4, 5]];
const PYRAMID_TETS: [[usize; 4]; 2] = [[0, 1, 2, 4], [0, 2, 3, 4]];
// voxel numbering is lexicographic, hexahedron numbering runs around each face
const VOXEL_TO_HEX: [usize; 8] = [0, 1, 3, 2, 4, 5, 7, 6];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub kind: CellType,
    pub points: Vec<usize>,
}

impl Cell {
    pub fn new(kind: CellType, points: Vec<usize>) -> Self {
        Cell { kind, points }
    }

    pub fn triangle(a: usize, b: usize, c: usize) -> Self {
        Cell::new(CellType::Triangle, vec![a, b, c])
    }

    pub fn line(a: usize, b: usize) -> Self {
        Cell::new(CellType::Line, vec![a, b])
    }

    pub(crate) fn has_valid_size(&self) -> bool {
        match self.kind.fixed_size() {
            Some(n) => self.points.len() == n,
            None => self.points.len() >= self.kind.min_size(),
        }
    }

    /// Perimeter of a 2-D cell in traversal order. Pixels are reordered so
    /// that consecutive entries share an edge; strips have no single loop.
    pub fn polygon_loop(&self) -> Option<Vec<usize>> {
        let p = &self.points;
        match self.kind {
            CellType::Triangle | CellType::Quad | CellType::Polygon => Some(p.clone()),
            CellType::Pixel => Some(vec![p[0], p[1], p[3], p[2]]),
            _ => None,
        }
    }

    /// Triangles covering a 2-D cell, winding consistent with the cell's
    /// own vertex order.
    pub fn triangles(&self) -> Vec<[usize; 3]> {
        if self.kind == CellType::TriangleStrip {
            return (0..self.points.len().saturating_sub(2))
                .map(|i| {
                    let (a, b, c) = (self.points[i], self.points[i + 1], self.points[i + 2]);
                    if i % 2 == 0 { [a, b, c] } else { [b, a, c] }
                })
                .collect();
        }
        match self.polygon_loop() {
            Some(ring) => (1..ring.len().saturating_sub(1))
                .map(|i| [ring[0], ring[i], ring[i + 1]])
                .collect(),
            None => Vec::new(),
        }
    }

    /// Oriented edges of a 2-D cell. Strips report the edges of each of their
    /// triangles, so interior strip edges appear twice.
    pub fn boundary_edges(&self) -> Vec<(usize, usize)> {
        let rings: Vec<Vec<usize>> = match self.polygon_loop() {
            Some(ring) => vec![ring],
            None if self.kind == CellType::TriangleStrip => {
                self.triangles().into_iter().map(|t| t.to_vec()).collect()
            }
            None => return Vec::new(),
        };
        rings
            .iter()
            .flat_map(|ring| {
                (0..ring.len()).map(move |i| (ring[i], ring[(i + 1) % ring.len()]))
            })
            .collect()
    }

    /// Tetrahedra covering a 3-D cell, in global point indices.
    pub fn tetrahedra(&self) -> Vec<[usize; 4]> {
        let p = &self.points;
        let map = |local: &[[usize; 4]], order: &dyn Fn(usize) -> usize| -> Vec<[usize; 4]> {
            local
                .iter()
                .map(|t| [p[order(t[0])], p[order(t[1])], p[order(t[2])], p[order(t[3])]])
                .collect()
        };
        match self.kind {
            CellType::Tetra => vec![[p[0], p[1], p[2], p[3]]],
            CellType::Hexahedron => map(&HEX_TETS, &|i| i),
            CellType::Voxel => map(&HEX_TETS, &|i| VOXEL_TO_HEX[i]),
            CellType::Wedge => map(&WEDGE_TETS, &|i| i),
            CellType::Pyramid => map(&PYRAMID_TETS, &|i| i),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vtk_ids_decode() {
        for id in [1u8, 3, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14] {
            assert!(CellType::from_vtk_id(id).is_some(), "{}", id);
        }
        assert_eq!(CellType::from_vtk_id(12), Some(CellType::Hexahedron));
        assert_eq!(CellType::from_vtk_id(8), Some(CellType::Pixel));
        for id in [0u8, 2, 4, 15, 42] {
            assert!(CellType::from_vtk_id(id).is_none());
        }
    }

    #[test]
    fn pixel_loop_walks_the_perimeter() {
        let pixel = Cell::new(CellType::Pixel, vec![0, 1, 2, 3]);
        assert_eq!(pixel.polygon_loop().unwrap(), vec![0, 1, 3, 2]);
        assert_eq!(pixel.triangles(), vec![[0, 1, 3], [0, 3, 2]]);
    }

    #[test]
    fn strip_triangles_keep_orientation() {
        let strip = Cell::new(CellType::TriangleStrip, vec![0, 1, 2, 3]);
        assert_eq!(strip.triangles(), vec![[0, 1, 2], [2, 1, 3]]);
    }

    #[test]
    fn voxel_decomposes_into_six_tets_around_one_diagonal() {
        let voxel = Cell::new(CellType::Voxel, (10..18).collect());
        let tets = voxel.tetrahedra();
        assert_eq!(tets.len(), 6);
        assert!(tets.iter().flatten().all(|i| (10..18).contains(i)));
        // voxel corners 0 and 7 are the hexahedron's 0 and 6
        assert!(tets.iter().all(|t| t.contains(&10) && t.contains(&17)));
    }

    // each face of the hex is cut by exactly one diagonal, and opposite
    // faces use parallel diagonals
    #[test]
    fn hex_face_diagonals_match_across_translated_neighbours() {
        let hex = Cell::new(CellType::Hexahedron, (0..8).collect());
        let mut diagonals = std::collections::BTreeSet::new();
        for t in hex.tetrahedra() {
            for a in 0..4 {
                for b in a + 1..4 {
                    let (i, j) = (t[a].min(t[b]), t[a].max(t[b]));
                    diagonals.insert((i, j));
                }
            }
        }
        for face_diagonal in [(0, 2), (4, 6), (0, 7), (1, 6), (0, 5), (3, 6)] {
            assert!(diagonals.contains(&face_diagonal), "{:?}", face_diagonal);
        }
        for crossing in [(1, 3), (5, 7), (3, 4), (2, 5), (1, 4), (2, 7)] {
            assert!(!diagonals.contains(&crossing), "{:?}", crossing);
        }
    }
}
