//! Polygon and polyline clipping used before anything reaches the backend.

use glam::DVec2;

// Axis-aligned box in data coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: DVec2,
    pub max: DVec2,
}

impl Rect {
    pub fn new(x: (f64, f64), y: (f64, f64)) -> Self {
        Rect {
            min: DVec2::new(x.0.min(x.1), y.0.min(y.1)),
            max: DVec2::new(x.0.max(x.1), y.0.max(y.1)),
        }
    }

    pub fn contains(&self, p: DVec2) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

/// One Sutherland-Hodgman pass: keep the part of the closed polygon where
/// `dist >= 0`, inserting `lerp`ed points where an edge crosses zero.
pub fn clip_halfplane<P: Copy>(
    polygon: &[P],
    dist: impl Fn(&P) -> f64,
    lerp: impl Fn(&P, &P, f64) -> P,
) -> Vec<P> {
    let mut out = Vec::with_capacity(polygon.len() + 2);
    let Some(last) = polygon.last() else {
        return out;
    };
    let mut prev = last;
    let mut d_prev = dist(prev);
    for cur in polygon {
        let d_cur = dist(cur);
        if d_cur >= 0.0 {
            if d_prev < 0.0 {
                out.push(lerp(prev, cur, d_prev / (d_prev - d_cur)));
            }
            out.push(*cur);
        } else if d_prev >= 0.0 {
            out.push(lerp(prev, cur, d_prev / (d_prev - d_cur)));
        }
        prev = cur;
        d_prev = d_cur;
    }
    out
}

/// Part of a polygon inside `rect`. Empty when nothing is left.
pub fn clip_polygon(polygon: &[DVec2], rect: &Rect) -> Vec<DVec2> {
    let lerp = |a: &DVec2, b: &DVec2, t: f64| a.lerp(*b, t);
    let mut poly = polygon.to_vec();
    poly = clip_halfplane(&poly, |p| p.x - rect.min.x, lerp);
    poly = clip_halfplane(&poly, |p| rect.max.x - p.x, lerp);
    poly = clip_halfplane(&poly, |p| p.y - rect.min.y, lerp);
    poly = clip_halfplane(&poly, |p| rect.max.y - p.y, lerp);
    if poly.len() < 3 { Vec::new() } else { poly }
}

/// Liang-Barsky: the part of segment `a -> b` inside `rect`.
pub fn clip_segment(a: DVec2, b: DVec2, rect: &Rect) -> Option<(DVec2, DVec2)> {
    let d = b - a;
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;
    for (p, q) in [
        (-d.x, a.x - rect.min.x),
        (d.x, rect.max.x - a.x),
        (-d.y, a.y - rect.min.y),
        (d.y, rect.max.y - a.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((a + d * t0, a + d * t1))
}

/// Split a polyline into the runs that lie inside `rect`.
pub fn clip_polyline(points: &[DVec2], rect: &Rect) -> Vec<Vec<DVec2>> {
    let mut runs: Vec<Vec<DVec2>> = Vec::new();
    let mut current: Vec<DVec2> = Vec::new();
    for w in points.windows(2) {
        match clip_segment(w[0], w[1], rect) {
            Some((s, e)) => {
                if current.last() != Some(&s) {
                    if current.len() > 1 {
                        runs.push(std::mem::take(&mut current));
                    }
                    current.clear();
                    current.push(s);
                }
                current.push(e);
            }
            None => {
                if current.len() > 1 {
                    runs.push(std::mem::take(&mut current));
                }
                current.clear();
            }
        }
    }
    if current.len() > 1 {
        runs.push(current);
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(poly: &[DVec2]) -> f64 {
        let n = poly.len();
        (0..n)
            .map(|i| poly[i].perp_dot(poly[(i + 1) % n]))
            .sum::<f64>()
            * 0.5
    }

    #[test]
    fn square_clipped_by_box_keeps_overlap() {
        let square = [
            DVec2::new(-1.0, -1.0),
            DVec2::new(1.0, -1.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(-1.0, 1.0),
        ];
        let rect = Rect::new((0.0, 5.0), (-0.5, 5.0));
        let clipped = clip_polygon(&square, &rect);
        assert!((area(&clipped) - 1.5).abs() < 1e-12);
        assert!(clip_polygon(&square, &Rect::new((2.0, 3.0), (2.0, 3.0))).is_empty());
    }

    #[test]
    fn segment_crossing_the_box_is_trimmed() {
        let rect = Rect::new((0.0, 1.0), (0.0, 1.0));
        let (s, e) = clip_segment(DVec2::new(-1.0, 0.5), DVec2::new(3.0, 0.5), &rect).unwrap();
        assert_eq!(s, DVec2::new(0.0, 0.5));
        assert_eq!(e, DVec2::new(1.0, 0.5));
        assert!(clip_segment(DVec2::new(-1.0, 2.0), DVec2::new(2.0, 2.0), &rect).is_none());
    }

    #[test]
    fn polyline_leaving_and_reentering_splits_into_runs() {
        let rect = Rect::new((0.0, 1.0), (0.0, 1.0));
        let line = [
            DVec2::new(0.25, 0.5),
            DVec2::new(0.5, 0.5),
            DVec2::new(0.5, 1.5),
            DVec2::new(0.8, 1.5),
            DVec2::new(0.8, -0.5),
        ];
        let runs = clip_polyline(&line, &rect);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0], vec![DVec2::new(0.25, 0.5), DVec2::new(0.5, 0.5), DVec2::new(0.5, 1.0)]);
        assert_eq!(runs[1], vec![DVec2::new(0.8, 1.0), DVec2::new(0.8, 0.0)]);
    }
}
