//! Ordering of boundary edges into a single polyline.
//!
//! Edges are directed `start -> end` pairs of point indices. The walk
//! follows the successor map from a chosen start point, so the map has to be
//! a bijection on the edge set: every point may start at most one edge and
//! end at most one edge. This is checked up front instead of letting a bad
//! edge set truncate the walk or loop forever.

use glam::DVec3;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("edge set is empty")]
    Empty,
    #[error("start point {0} does not begin any edge")]
    MissingStart(usize),
    #[error("point {point} begins more than one edge (to {first} and {second})")]
    DuplicateSuccessor {
        point: usize,
        first: usize,
        second: usize,
    },
    #[error("point {point} ends more than one edge (from {first} and {second})")]
    DuplicatePredecessor {
        point: usize,
        first: usize,
        second: usize,
    },
    #[error("walk from {start} covered {visited} of {edges} edges; the edge set is not a single chain")]
    Disconnected {
        start: usize,
        visited: usize,
        edges: usize,
    },
}

/// Point indices in walk order. For a closed chain the start index is
/// repeated as the last entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub points: Vec<usize>,
    pub closed: bool,
}

impl Chain {
    /// The only point that begins an edge without ending one, if the edge
    /// set describes an open chain.
    pub fn open_start(edges: &[(usize, usize)]) -> Option<usize> {
        let ends: std::collections::HashSet<usize> = edges.iter().map(|&(_, e)| e).collect();
        let mut starts = edges.iter().map(|&(s, _)| s).filter(|s| !ends.contains(s));
        let first = starts.next()?;
        starts.next().is_none().then_some(first)
    }

    pub fn coordinates(&self, points: &[DVec3]) -> Vec<DVec3> {
        self.points.iter().map(|&i| points[i]).collect()
    }
}

fn successor_map(edges: &[(usize, usize)]) -> Result<HashMap<usize, usize>, ChainError> {
    let mut next = HashMap::with_capacity(edges.len());
    let mut prev: HashMap<usize, usize> = HashMap::with_capacity(edges.len());
    for &(s, e) in edges {
        if let Some(&first) = next.get(&s) {
            return Err(ChainError::DuplicateSuccessor {
                point: s,
                first,
                second: e,
            });
        }
        if let Some(&first) = prev.get(&e) {
            return Err(ChainError::DuplicatePredecessor {
                point: e,
                first,
                second: s,
            });
        }
        next.insert(s, e);
        prev.insert(e, s);
    }
    Ok(next)
}

/// Walk the successor map of `edges` beginning at `start`.
pub fn sort_chain(edges: &[(usize, usize)], start: usize) -> Result<Chain, ChainError> {
    if edges.is_empty() {
        return Err(ChainError::Empty);
    }
    let next = successor_map(edges)?;
    if !next.contains_key(&start) {
        return Err(ChainError::MissingStart(start));
    }

    let mut points = Vec::with_capacity(edges.len() + 1);
    points.push(start);
    let mut current = start;
    let mut closed = false;
    // each step consumes one edge and successors are unique, so the walk ends
    while let Some(&following) = next.get(&current) {
        points.push(following);
        if following == start {
            closed = true;
            break;
        }
        current = following;
    }

    let visited = points.len() - 1;
    if visited != edges.len() {
        return Err(ChainError::Disconnected {
            start,
            visited,
            edges: edges.len(),
        });
    }
    Ok(Chain { points, closed })
}
