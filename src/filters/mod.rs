//! Dataset filters. Each one takes datasets by reference and returns a new
//! dataset; nothing is modified in place.

pub mod chain;
pub mod connectivity;
pub mod edges;
pub mod probe;
pub mod slice;
pub mod triangulate;

pub use chain::{Chain, sort_chain};
pub use connectivity::extract_closest_point_region;
pub use edges::{extract_boundary_edges, line_pairs};
pub use probe::{CellLocator, RegularGrid2, probe_dataset, probe_grid};
pub use slice::{Plane, slice};
pub use triangulate::triangulate;
