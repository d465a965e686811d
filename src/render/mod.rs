//! Figure rendering on top of plotters. Figures are drawn against any
//! backend; [`write_figure`] picks SVG or PNG from the file extension.

pub mod clip;
pub mod colorbar;
pub mod colormap;
pub mod contour;
pub mod figure;
pub mod lineplot;
pub mod streamline;

use anyhow::{Context, Result, bail};
use clip::Rect;
use plotters::coord::Shift;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use std::path::Path;

pub use colorbar::Colorbar;
pub use colormap::ColorMap;
pub use contour::{Axis, Extend, Levels, TriMesh2, filled_contours};
pub use figure::ContourFigure;
pub use lineplot::{Corner, Inset, LinePlot, Series};
pub use streamline::{StreamOptions, VectorGrid, integrate_streamlines};

pub(crate) const FONT: &str = "sans-serif";

/// Whether raster output can render glyphs. plotters' bitmap backend needs
/// the `ttf` font support for text and panics without it.
pub const RASTER_TEXT: bool = cfg!(feature = "ttf");

pub(crate) type Chart2d<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Something that can draw itself on a drawing area of fixed pixel size.
/// With `text` off, tick labels and axis descriptions are left out but the
/// space reserved for them is kept.
pub trait Figure {
    fn size(&self) -> (u32, u32);

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>, text: bool) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static;
}

// Limits and labelling of a 2-D cartesian plot
#[derive(Debug, Clone, PartialEq)]
pub struct Axes {
    pub x: (f64, f64),
    pub y: (f64, f64),
    pub x_label: String,
    pub y_label: String,
    pub hide_labels: bool,
    pub x_ticks: usize,
    pub y_ticks: usize,
    pub label_size: f64,
    pub tick_size: f64,
}

impl Axes {
    pub fn new(x: (f64, f64), y: (f64, f64)) -> Self {
        Axes {
            x,
            y,
            x_label: String::new(),
            y_label: String::new(),
            hide_labels: false,
            x_ticks: 7,
            y_ticks: 7,
            label_size: 28.0,
            tick_size: 22.0,
        }
    }

    pub fn labels(mut self, x: &str, y: &str) -> Self {
        self.x_label = x.to_string();
        self.y_label = y.to_string();
        self
    }

    pub fn hidden(mut self, hide: bool) -> Self {
        self.hide_labels = hide;
        self
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y)
    }

    /// Pixels reserved left of and below the plot for tick labels and axis
    /// descriptions.
    pub fn label_areas(&self) -> (u32, u32) {
        if self.hide_labels {
            (0, 0)
        } else {
            (
                (self.tick_size * 3.0 + self.label_size * 1.5) as u32,
                (self.tick_size * 1.5 + self.label_size * 1.5) as u32,
            )
        }
    }

    /// Cartesian chart filling `area` apart from `margin` and the label
    /// areas, with ticks and descriptions unless hidden or `text` is off.
    pub(crate) fn chart<'a, DB>(&self, area: &'a DrawingArea<DB, Shift>, margin: u32, text: bool) -> Result<Chart2d<'a, DB>>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let (y_area, x_area) = self.label_areas();
        let mut chart = ChartBuilder::on(area)
            .margin(margin)
            .x_label_area_size(x_area)
            .y_label_area_size(y_area)
            .build_cartesian_2d(self.x.0..self.x.1, self.y.0..self.y.1)?;
        if !self.hide_labels && text {
            let mut mesh = chart.configure_mesh();
            mesh.disable_mesh()
                .x_labels(self.x_ticks)
                .y_labels(self.y_ticks)
                .label_style((FONT, self.tick_size));
            if !self.x_label.is_empty() || !self.y_label.is_empty() {
                mesh.x_desc(self.x_label.as_str())
                    .y_desc(self.y_label.as_str())
                    .axis_desc_style((FONT, self.label_size));
            }
            mesh.draw()?;
        }
        Ok(chart)
    }
}

/// Black box around the plotting area, drawn last so it sits on top.
pub(crate) fn draw_frame<DB>(chart: &mut Chart2d<'_, DB>, axes: &Axes) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    chart.draw_series(std::iter::once(Rectangle::new(
        [(axes.x.0, axes.y.0), (axes.x.1, axes.y.1)],
        BLACK.stroke_width(1),
    )))?;
    Ok(())
}

/// Write `figure` to `path`, creating parent directories. The backend is
/// chosen by extension: `.svg` is vector output, `.png` raster.
pub fn write_figure<F: Figure>(figure: &F, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    let size = figure.size();
    match path.extension().and_then(|e| e.to_str()) {
        Some("svg") => {
            let root = SVGBackend::new(path, size).into_drawing_area();
            figure.draw(&root, true)?;
            root.present()
                .with_context(|| format!("Failed to write figure: {:?}", path))?;
        }
        Some("png") => {
            if !RASTER_TEXT {
                log::warn!("Built without the ttf feature, {:?} is written without text", path);
            }
            let root = BitMapBackend::new(path, size).into_drawing_area();
            figure.draw(&root, RASTER_TEXT)?;
            root.present()
                .with_context(|| format!("Failed to write figure: {:?}", path))?;
        }
        other => bail!("Unsupported figure format {:?} for {:?}", other, path),
    }
    log::info!("Wrote {:?}", path);
    Ok(())
}

/// Render `figure` as an SVG document in memory.
pub fn render_svg<F: Figure>(figure: &F) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, figure.size()).into_drawing_area();
        figure.draw(&root, true)?;
        root.present()?;
    }
    Ok(svg)
}
