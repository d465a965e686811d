//! Line plots with an optional zoomed inset.

use crate::render::clip::{Rect, clip_polyline};
use crate::render::{Axes, Chart2d, Figure, draw_frame};
use anyhow::Result;
use glam::DVec2;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;

const MARGIN: u32 = 10;

/// Corner of a box, numbered like matplotlib's `loc` codes 1 to 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    UpperRight,
    UpperLeft,
    LowerLeft,
    LowerRight,
}

impl Corner {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Corner::UpperRight),
            2 => Some(Corner::UpperLeft),
            3 => Some(Corner::LowerLeft),
            4 => Some(Corner::LowerRight),
            _ => None,
        }
    }
}

// Box in backend pixels, y growing downwards
#[derive(Debug, Clone, Copy, PartialEq)]
struct PixelRect {
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
}

impl PixelRect {
    fn corner(&self, corner: Corner) -> (i32, i32) {
        let (x, y) = match corner {
            Corner::UpperRight => (self.right, self.top),
            Corner::UpperLeft => (self.left, self.top),
            Corner::LowerLeft => (self.left, self.bottom),
            Corner::LowerRight => (self.right, self.bottom),
        };
        (x.round() as i32, y.round() as i32)
    }
}

/// Zoomed view of part of the parent plot.
///
/// The inset box is `zoom` times larger than the region it shows, in parent
/// pixels. Its left edge and vertical center sit at `anchor`, given as a
/// fraction of the parent plotting area from its lower-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct Inset {
    pub x: (f64, f64),
    pub y: (f64, f64),
    pub zoom: f64,
    pub anchor: (f64, f64),
    pub corners: (Corner, Corner),
    pub x_ticks: usize,
}

impl Inset {
    pub fn new(x: (f64, f64), y: (f64, f64), corners: (Corner, Corner)) -> Self {
        Inset {
            x,
            y,
            zoom: 4.0,
            anchor: (0.07, 0.6),
            corners,
            x_ticks: 5,
        }
    }

    fn pixel_rect(&self, axes: &Axes, plot: &(Range<i32>, Range<i32>)) -> PixelRect {
        let (px, py) = plot;
        let pw = (px.end - px.start) as f64;
        let ph = (py.end - py.start) as f64;
        let w = self.zoom * (self.x.1 - self.x.0) / (axes.x.1 - axes.x.0) * pw;
        let h = self.zoom * (self.y.1 - self.y.0) / (axes.y.1 - axes.y.0) * ph;
        let left = px.start as f64 + self.anchor.0 * pw;
        let center = py.end as f64 - self.anchor.1 * ph;
        PixelRect {
            left,
            top: center - 0.5 * h,
            right: left + w,
            bottom: center + 0.5 * h,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeriesStyle {
    Line { color: RGBColor, width: u32 },
    Markers { color: RGBColor, radius: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub points: Vec<DVec2>,
    pub style: SeriesStyle,
}

impl Series {
    pub fn line(points: Vec<DVec2>, color: RGBColor, width: u32) -> Self {
        Series {
            points,
            style: SeriesStyle::Line { color, width },
        }
    }

    pub fn markers(points: Vec<DVec2>, color: RGBColor, radius: u32) -> Self {
        Series {
            points,
            style: SeriesStyle::Markers { color, radius },
        }
    }
}

fn draw_series_list<DB>(chart: &mut Chart2d<'_, DB>, series: &[Series], rect: &Rect) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    for s in series {
        match s.style {
            SeriesStyle::Line { color, width } => {
                chart.draw_series(clip_polyline(&s.points, rect).into_iter().map(|run| {
                    PathElement::new(
                        run.into_iter().map(|p| (p.x, p.y)).collect::<Vec<_>>(),
                        color.stroke_width(width),
                    )
                }))?;
            }
            SeriesStyle::Markers { color, radius } => {
                chart.draw_series(
                    s.points
                        .iter()
                        .filter(|p| rect.contains(**p))
                        .map(|p| Circle::new((p.x, p.y), radius, color.filled())),
                )?;
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinePlot {
    axes: Axes,
    series: Vec<Series>,
    inset: Option<Inset>,
    size: (u32, u32),
}

impl LinePlot {
    pub fn new(axes: Axes, size: (u32, u32)) -> Self {
        LinePlot {
            axes,
            series: Vec::new(),
            inset: None,
            size,
        }
    }

    pub fn with_series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    pub fn with_inset(mut self, inset: Inset) -> Self {
        self.inset = Some(inset);
        self
    }

    fn draw_inset<DB>(
        &self,
        root: &DrawingArea<DB, Shift>,
        parent: &mut Chart2d<'_, DB>,
        inset: &Inset,
        text: bool,
    ) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let boxed = inset.pixel_rect(&self.axes, &parent.plotting_area().get_pixel_range());

        // zoomed region on the parent and the two connectors
        parent.draw_series(std::iter::once(Rectangle::new(
            [(inset.x.0, inset.y.0), (inset.x.1, inset.y.1)],
            BLACK.stroke_width(1),
        )))?;
        let (ul, lr) = (
            parent.backend_coord(&(inset.x.0, inset.y.1)),
            parent.backend_coord(&(inset.x.1, inset.y.0)),
        );
        let zoomed = PixelRect {
            left: ul.0 as f64,
            top: ul.1 as f64,
            right: lr.0 as f64,
            bottom: lr.1 as f64,
        };
        for corner in [inset.corners.0, inset.corners.1] {
            root.draw(&PathElement::new(
                vec![zoomed.corner(corner), boxed.corner(corner)],
                BLACK.stroke_width(1),
            ))?;
        }

        // the inset chart; its label areas lie outside the zoom box
        let mut axes = Axes::new(inset.x, inset.y);
        axes.x_ticks = inset.x_ticks;
        axes.y_ticks = 4;
        axes.tick_size = 14.0;
        axes.label_size = 0.0;
        let (y_area, x_area) = axes.label_areas();
        let left = boxed.left.round() as i32 - y_area as i32;
        let top = boxed.top.round() as i32;
        let width = (boxed.right - boxed.left).round() as u32 + y_area;
        let height = (boxed.bottom - boxed.top).round() as u32 + x_area;
        let area = root.clone().shrink((left, top), (width, height));
        let mut chart = axes.chart(&area, 0, text)?;
        chart.plotting_area().fill(&WHITE)?;
        draw_series_list(&mut chart, &self.series, &axes.rect())?;
        draw_frame(&mut chart, &axes)?;
        Ok(())
    }
}

impl Figure for LinePlot {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>, text: bool) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;
        let mut chart = self.axes.chart(root, MARGIN, text)?;
        draw_series_list(&mut chart, &self.series, &self.axes.rect())?;
        draw_frame(&mut chart, &self.axes)?;
        if let Some(inset) = &self.inset {
            self.draw_inset(root, &mut chart, inset, text)?;
        }
        Ok(())
    }
}
