use crate::render::clip::{Rect, clip_polygon, clip_polyline, clip_segment};
use crate::render::contour::FilledPolygon;
use crate::render::streamline::Streamline;
use crate::render::{Axes, Figure, draw_frame};
use anyhow::Result;
use glam::DVec2;
use plotters::coord::Shift;
use plotters::prelude::*;

const MARGIN: u32 = 10;

fn xy(p: DVec2) -> (f64, f64) {
    (p.x, p.y)
}

// Polyline overlay drawn on top of the bands
#[derive(Debug, Clone, PartialEq)]
struct Overlay {
    points: Vec<DVec2>,
    color: RGBColor,
    width: u32,
}

/// Filled contour plot with optional streamlines, slice outline and a
/// vertical reference line. The pixel size keeps one data unit equally long
/// on both axes.
#[derive(Debug, Clone, PartialEq)]
pub struct ContourFigure {
    axes: Axes,
    bands: Vec<FilledPolygon>,
    streamlines: Vec<Streamline>,
    stream_color: RGBColor,
    outline: Option<Overlay>,
    vline: Option<Overlay>,
    pixels_per_unit: f64,
}

impl ContourFigure {
    pub fn new(axes: Axes, bands: Vec<FilledPolygon>, pixels_per_unit: f64) -> Self {
        ContourFigure {
            axes,
            bands,
            streamlines: Vec::new(),
            stream_color: RGBColor(128, 128, 128),
            outline: None,
            vline: None,
            pixels_per_unit,
        }
    }

    pub fn with_streamlines(mut self, lines: Vec<Streamline>, color: RGBColor) -> Self {
        self.streamlines = lines;
        self.stream_color = color;
        self
    }

    pub fn with_outline(mut self, points: Vec<DVec2>, color: RGBColor, width: u32) -> Self {
        self.outline = Some(Overlay { points, color, width });
        self
    }

    /// Vertical line at `x` spanning the whole y range.
    pub fn with_vline(mut self, x: f64, color: RGBColor, width: u32) -> Self {
        let points = vec![DVec2::new(x, self.axes.y.0), DVec2::new(x, self.axes.y.1)];
        self.vline = Some(Overlay { points, color, width });
        self
    }

    fn overlay<DB>(chart: &mut crate::render::Chart2d<'_, DB>, overlay: &Overlay, rect: &Rect) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let style = overlay.color.stroke_width(overlay.width);
        chart.draw_series(
            clip_polyline(&overlay.points, rect)
                .into_iter()
                .map(|run| PathElement::new(run.into_iter().map(xy).collect::<Vec<_>>(), style)),
        )?;
        Ok(())
    }
}

/// Consecutive clipped segments of a streamline grouped by stroke width.
fn width_runs(line: &Streamline, rect: &Rect) -> Vec<(Vec<DVec2>, u32)> {
    let mut runs: Vec<(Vec<DVec2>, u32)> = Vec::new();
    for (w, &width) in line.points.windows(2).zip(&line.widths) {
        let Some((a, b)) = clip_segment(w[0], w[1], rect) else {
            continue;
        };
        let px = (width.round() as u32).max(1);
        match runs.last_mut() {
            Some((pts, run_px)) if *run_px == px && pts.last() == Some(&a) => pts.push(b),
            _ => runs.push((vec![a, b], px)),
        }
    }
    runs
}

/// Small filled triangle at the middle of a line pointing downstream.
fn arrow_head(line: &Streamline, size: f64) -> Option<Vec<DVec2>> {
    let mid = line.points.len() / 2;
    let (a, b) = (*line.points.get(mid.checked_sub(1)?)?, *line.points.get(mid)?);
    let dir = (b - a).try_normalize()?;
    let side = dir.perp() * (0.35 * size);
    let tip = b + dir * (0.5 * size);
    let back = b - dir * (0.5 * size);
    Some(vec![tip, back + side, back - side])
}

impl Figure for ContourFigure {
    fn size(&self) -> (u32, u32) {
        let rect = self.axes.rect();
        let (y_area, x_area) = self.axes.label_areas();
        let plot_w = (rect.width() * self.pixels_per_unit).round() as u32;
        let plot_h = (rect.height() * self.pixels_per_unit).round() as u32;
        (plot_w + y_area + 2 * MARGIN, plot_h + x_area + 2 * MARGIN)
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>, text: bool) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;
        let rect = self.axes.rect();
        let mut chart = self.axes.chart(root, MARGIN, text)?;

        chart.draw_series(self.bands.iter().filter_map(|band| {
            let clipped = clip_polygon(&band.points, &rect);
            (!clipped.is_empty()).then(|| {
                Polygon::new(clipped.into_iter().map(xy).collect::<Vec<_>>(), band.color.filled())
            })
        }))?;

        if !self.streamlines.is_empty() {
            for line in &self.streamlines {
                chart.draw_series(width_runs(line, &rect).into_iter().map(|(pts, px)| {
                    PathElement::new(pts.into_iter().map(xy).collect::<Vec<_>>(), self.stream_color.stroke_width(px))
                }))?;
            }
            let head = 0.012 * rect.width().max(rect.height());
            chart.draw_series(
                self.streamlines
                    .iter()
                    .filter_map(|line| arrow_head(line, head))
                    .filter(|tri| tri.iter().all(|&p| rect.contains(p)))
                    .map(|tri| Polygon::new(tri.into_iter().map(xy).collect::<Vec<_>>(), self.stream_color.filled())),
            )?;
        }

        if let Some(outline) = &self.outline {
            Self::overlay(&mut chart, outline, &rect)?;
        }
        if let Some(vline) = &self.vline {
            Self::overlay(&mut chart, vline, &rect)?;
        }

        draw_frame(&mut chart, &self.axes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::colormap::ColorMap;
    use crate::render::contour::{Extend, Levels, TriMesh2, filled_contours};
    use crate::render::render_svg;

    fn square_bands() -> Vec<FilledPolygon> {
        let mesh = TriMesh2 {
            points: vec![
                DVec2::new(-1.0, -1.0),
                DVec2::new(1.0, -1.0),
                DVec2::new(1.0, 1.0),
                DVec2::new(-1.0, 1.0),
            ],
            triangles: vec![[0, 1, 2], [0, 2, 3]],
            values: vec![0.0, 50.0, 100.0, 50.0],
        };
        let cmap = ColorMap::by_name("RdBu_r").unwrap();
        filled_contours(&mesh, &Levels::linspace(0.0, 100.0, 21), Extend::Both, &cmap)
    }

    #[test]
    fn equal_aspect_sizing() {
        let axes = Axes::new((-6.0, 6.0), (-7.0, 5.0)).hidden(true);
        let fig = ContourFigure::new(axes, Vec::new(), 50.0);
        assert_eq!(fig.size(), (600 + 2 * MARGIN, 600 + 2 * MARGIN));
    }

    #[test]
    fn svg_contains_bands_and_overlays() {
        let axes = Axes::new((-2.0, 2.0), (-2.0, 2.0)).labels("z [mm]", "y [mm]");
        let line = Streamline {
            points: vec![DVec2::new(-0.5, 0.0), DVec2::new(0.0, 0.0), DVec2::new(0.5, 0.1)],
            widths: vec![1.0, 4.0],
        };
        let fig = ContourFigure::new(axes, square_bands(), 40.0)
            .with_streamlines(vec![line], RGBColor(128, 128, 128))
            .with_outline(
                vec![DVec2::new(-1.0, -1.0), DVec2::new(1.0, -1.0), DVec2::new(1.0, 1.0)],
                BLACK,
                2,
            )
            .with_vline(0.0, WHITE, 2);
        let svg = render_svg(&fig).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.matches("<polygon").count() >= 20);
        assert!(svg.contains("<polyline"));
    }

    #[test]
    fn streamline_runs_split_on_width_change() {
        let rect = Rect::new((-1.0, 1.0), (-1.0, 1.0));
        let line = Streamline {
            points: vec![DVec2::new(-0.5, 0.0), DVec2::new(0.0, 0.0), DVec2::new(0.2, 0.0), DVec2::new(0.4, 0.0)],
            widths: vec![1.2, 3.4, 3.0],
        };
        let runs = width_runs(&line, &rect);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].1, 1);
        assert_eq!(runs[1], (vec![DVec2::new(0.0, 0.0), DVec2::new(0.2, 0.0), DVec2::new(0.4, 0.0)], 3));
        assert!(arrow_head(&line, 0.1).is_some());
    }
}
