//! Evenly spaced streamlines of a 2-D vector field sampled on a lattice.
//!
//! The domain is covered by a coarse occupancy mask. Seeds are taken from
//! free mask cells, spiralling in from the border, and every line is grown
//! forward and backward with a midpoint step at unit speed until it leaves
//! the lattice, reaches a point of zero velocity, runs into a mask cell
//! claimed by another line or exceeds the maximum length. Lines shorter than
//! the minimum length are dropped and release their cells.

use crate::filters::RegularGrid2;
use crate::mesh::{Dataset, MeshError};
use glam::DVec2;

// Velocity on a regular lattice, x-major like `RegularGrid2::points`
#[derive(Debug, Clone, PartialEq)]
pub struct VectorGrid {
    origin: DVec2,
    step: DVec2,
    nx: usize,
    ny: usize,
    u: Vec<f64>,
    v: Vec<f64>,
}

impl VectorGrid {
    pub fn new(grid: &RegularGrid2, u: Vec<f64>, v: Vec<f64>) -> Result<Self, MeshError> {
        let (nx, ny) = grid.shape();
        for (name, values) in [("u", &u), ("v", &v)] {
            if values.len() != nx * ny {
                return Err(MeshError::FieldLength {
                    name: name.to_string(),
                    expected: nx * ny,
                    actual: values.len(),
                });
            }
        }
        let step_of = |axis: &[f64]| if axis.len() > 1 { axis[1] - axis[0] } else { 1.0 };
        Ok(VectorGrid {
            origin: DVec2::new(grid.x[0], grid.y[0]),
            step: DVec2::new(step_of(&grid.x), step_of(&grid.y)),
            nx,
            ny,
            u,
            v,
        })
    }

    /// Velocity components `(ux, uy)` from a dataset probed on `grid`.
    pub fn from_probe(grid: &RegularGrid2, probed: &Dataset, ux: &str, uy: &str) -> Result<Self, MeshError> {
        VectorGrid::new(grid, probed.scalars(ux)?.to_vec(), probed.scalars(uy)?.to_vec())
    }

    pub fn extent(&self) -> (DVec2, DVec2) {
        let last = DVec2::new((self.nx - 1) as f64, (self.ny - 1) as f64);
        (self.origin, self.origin + last * self.step)
    }

    pub fn max_speed(&self) -> f64 {
        self.u
            .iter()
            .zip(&self.v)
            .map(|(u, v)| u.hypot(*v))
            .fold(0.0, f64::max)
    }

    /// Bilinear velocity at `p`, `None` outside the lattice.
    pub fn sample(&self, p: DVec2) -> Option<DVec2> {
        if self.nx < 2 || self.ny < 2 {
            return None;
        }
        let g = (p - self.origin) / self.step;
        let (lx, ly) = ((self.nx - 1) as f64, (self.ny - 1) as f64);
        if !(g.x >= 0.0 && g.y >= 0.0 && g.x <= lx && g.y <= ly) {
            return None;
        }
        let i = (g.x.floor() as usize).min(self.nx - 2);
        let j = (g.y.floor() as usize).min(self.ny - 2);
        let (fx, fy) = (g.x - i as f64, g.y - j as f64);
        let at = |a: &[f64], i: usize, j: usize| a[i * self.ny + j];
        let blend = |a: &[f64]| {
            let bottom = at(a, i, j) * (1.0 - fx) + at(a, i + 1, j) * fx;
            let top = at(a, i, j + 1) * (1.0 - fx) + at(a, i + 1, j + 1) * fx;
            bottom * (1.0 - fy) + top * fy
        };
        Some(DVec2::new(blend(&self.u), blend(&self.v)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamOptions {
    /// Mask resolution is `25 * density` cells per axis.
    pub density: f64,
    pub max_width: f64,
    /// Shortest kept line, as a fraction of the domain size.
    pub min_length: f64,
    /// Longest line, as a fraction of the domain size.
    pub max_length: f64,
}

impl Default for StreamOptions {
    fn default() -> Self {
        StreamOptions {
            density: 1.0,
            max_width: 5.0,
            min_length: 0.1,
            max_length: 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Streamline {
    pub points: Vec<DVec2>,
    /// One width per segment, `max_width * |v| / max|v|`.
    pub widths: Vec<f64>,
}

struct Mask {
    n: usize,
    cells: Vec<bool>,
}

impl Mask {
    fn cell(&self, s: DVec2) -> (usize, usize) {
        let last = (self.n - 1) as f64;
        let c = |t: f64| (t * self.n as f64).floor().clamp(0.0, last) as usize;
        (c(s.x), c(s.y))
    }

    fn taken(&self, c: (usize, usize)) -> bool {
        self.cells[c.0 * self.n + c.1]
    }

    fn set(&mut self, c: (usize, usize), value: bool) {
        self.cells[c.0 * self.n + c.1] = value;
    }
}

/// Mask cells in order from the border inward.
fn spiral(n: usize) -> Vec<(usize, usize)> {
    let mut out = Vec::with_capacity(n * n);
    if n == 0 {
        return out;
    }
    let (mut x0, mut y0, mut x1, mut y1) = (0usize, 0usize, n - 1, n - 1);
    loop {
        out.extend((x0..=x1).map(|x| (x, y0)));
        out.extend((y0 + 1..=y1).map(|y| (x1, y)));
        if y1 > y0 {
            out.extend((x0..x1).rev().map(|x| (x, y1)));
        }
        if x1 > x0 {
            out.extend((y0 + 1..y1).rev().map(|y| (x0, y)));
        }
        if x1 - x0 < 2 || y1 - y0 < 2 {
            break;
        }
        x0 += 1;
        y0 += 1;
        x1 -= 1;
        y1 -= 1;
    }
    out
}

struct Integrator<'a> {
    grid: &'a VectorGrid,
    lo: DVec2,
    size: DVec2,
    step: f64,
    max_length: f64,
}

impl Integrator<'_> {
    fn to_data(&self, s: DVec2) -> DVec2 {
        self.lo + s * self.size
    }

    /// Unit direction in domain-fraction coordinates.
    fn direction(&self, s: DVec2, sign: f64) -> Option<DVec2> {
        let v = self.grid.sample(self.to_data(s))? / self.size;
        let speed = v.length();
        if !(speed > 1e-12) {
            return None;
        }
        Some(v * (sign / speed))
    }

    /// Grow from `seed` in one direction. Returns the points after the seed
    /// and the total length, claiming mask cells along the way.
    fn trace(&self, seed: DVec2, sign: f64, mask: &mut Mask, claimed: &mut Vec<(usize, usize)>) -> (Vec<DVec2>, f64) {
        let mut points = Vec::new();
        let mut s = seed;
        let mut length = 0.0;
        let mut cell = mask.cell(seed);
        while length < self.max_length {
            let Some(k1) = self.direction(s, sign) else { break };
            let Some(k2) = self.direction(s + k1 * (0.5 * self.step), sign) else { break };
            let next = s + k2 * self.step;
            if self.grid.sample(self.to_data(next)).is_none() {
                break;
            }
            let next_cell = mask.cell(next);
            if next_cell != cell {
                if mask.taken(next_cell) {
                    break;
                }
                mask.set(next_cell, true);
                claimed.push(next_cell);
                cell = next_cell;
            }
            length += self.step;
            points.push(next);
            s = next;
        }
        (points, length)
    }
}

/// Streamlines of `grid` following the options.
pub fn integrate_streamlines(grid: &VectorGrid, options: &StreamOptions) -> Vec<Streamline> {
    let (lo, hi) = grid.extent();
    let size = hi - lo;
    let max_speed = grid.max_speed();
    if !(size.x > 0.0 && size.y > 0.0 && max_speed > 0.0) {
        return Vec::new();
    }

    let n = ((25.0 * options.density).round() as usize).max(1);
    let mut mask = Mask {
        n,
        cells: vec![false; n * n],
    };
    let integrator = Integrator {
        grid,
        lo,
        size,
        step: 0.2 / n as f64,
        max_length: options.max_length,
    };

    let mut lines = Vec::new();
    for seed_cell in spiral(n) {
        if mask.taken(seed_cell) {
            continue;
        }
        let seed = (DVec2::new(seed_cell.0 as f64, seed_cell.1 as f64) + 0.5) / n as f64;
        if integrator.direction(seed, 1.0).is_none() {
            continue;
        }
        mask.set(seed_cell, true);
        let mut claimed = vec![seed_cell];
        let (backward, back_len) = integrator.trace(seed, -1.0, &mut mask, &mut claimed);
        let (forward, fwd_len) = integrator.trace(seed, 1.0, &mut mask, &mut claimed);

        if back_len + fwd_len < options.min_length {
            for c in claimed {
                mask.set(c, false);
            }
            continue;
        }

        let points: Vec<DVec2> = backward
            .into_iter()
            .rev()
            .chain(std::iter::once(seed))
            .chain(forward)
            .map(|s| integrator.to_data(s))
            .collect();
        let widths = points
            .windows(2)
            .map(|w| {
                let speed = grid.sample(w[0]).map_or(0.0, |v| v.length());
                options.max_width * speed / max_speed
            })
            .collect();
        lines.push(Streamline { points, widths });
    }
    log::debug!("{} streamlines on a {}x{} mask", lines.len(), n, n);
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(u: f64, v: f64) -> (RegularGrid2, VectorGrid) {
        let grid = RegularGrid2::new((0.0, 1.0), (0.0, 1.0), 0.1, 0.0);
        let (nx, ny) = grid.shape();
        let field = VectorGrid::new(&grid, vec![u; nx * ny], vec![v; nx * ny]).unwrap();
        (grid, field)
    }

    #[test]
    fn spiral_visits_every_cell_once_border_first() {
        for n in 1..7 {
            let order = spiral(n);
            assert_eq!(order.len(), n * n);
            let mut seen = order.clone();
            seen.sort();
            seen.dedup();
            assert_eq!(seen.len(), n * n);
        }
        let order = spiral(4);
        assert!(order[..12].iter().all(|&(x, y)| x == 0 || y == 0 || x == 3 || y == 3));
    }

    #[test]
    fn bilinear_sample_reproduces_linear_field() {
        let grid = RegularGrid2::new((-1.0, 1.0), (0.0, 2.0), 0.5, 0.0);
        let pts = grid.points();
        let u = pts.iter().map(|p| 2.0 * p.x + p.y).collect();
        let v = pts.iter().map(|p| -p.y).collect();
        let field = VectorGrid::new(&grid, u, v).unwrap();
        let s = field.sample(DVec2::new(0.3, 1.1)).unwrap();
        assert!((s.x - 1.7).abs() < 1e-12 && (s.y + 1.1).abs() < 1e-12);
        assert!(field.sample(DVec2::new(1.2, 1.0)).is_none());
    }

    #[test]
    fn uniform_flow_gives_parallel_full_width_lines() {
        let (_, field) = uniform(1.0, 0.0);
        let lines = integrate_streamlines(&field, &StreamOptions::default());
        assert!(!lines.is_empty());
        for line in &lines {
            let y0 = line.points[0].y;
            assert!(line.points.iter().all(|p| (p.y - y0).abs() < 1e-9));
            assert!(line.points.windows(2).all(|w| w[1].x > w[0].x));
            assert!(line.widths.iter().all(|w| (w - 5.0).abs() < 1e-9));
        }
        // one line per mask row at most
        assert!(lines.len() <= 25);
    }

    #[test]
    fn zero_field_has_no_lines() {
        let (_, field) = uniform(0.0, 0.0);
        assert!(integrate_streamlines(&field, &StreamOptions::default()).is_empty());
    }

    #[test]
    fn lines_stop_where_the_probe_found_nothing() {
        // right half is outside the source: the probe left zeros there
        let grid = RegularGrid2::new((0.0, 1.0), (0.0, 1.0), 0.05, 0.0);
        let u = grid.points().iter().map(|p| if p.x < 0.5 { 1.0 } else { 0.0 }).collect();
        let v = vec![0.0; grid.points().len()];
        let field = VectorGrid::new(&grid, u, v).unwrap();
        let lines = integrate_streamlines(&field, &StreamOptions::default());
        assert!(!lines.is_empty());
        assert!(lines.iter().flat_map(|l| &l.points).all(|p| p.x <= 0.55));
    }

    #[test]
    fn mismatched_components_are_rejected() {
        let grid = RegularGrid2::new((0.0, 1.0), (0.0, 1.0), 0.5, 0.0);
        assert!(VectorGrid::new(&grid, vec![0.0; 9], vec![0.0; 4]).is_err());
    }
}
