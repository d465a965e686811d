use crate::render::colormap::ColorMap;
use crate::render::contour::Levels;
use crate::render::{Axes, Figure, draw_frame};
use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;

const MARGIN: u32 = 10;
const CONTINUOUS_STEPS: usize = 256;

/// Standalone vertical color legend for a value range.
#[derive(Debug, Clone, PartialEq)]
pub struct Colorbar {
    pub range: (f64, f64),
    pub cmap: ColorMap,
    pub unit: String,
    /// Number of contour levels; `None` draws a continuous gradient.
    pub levels: Option<usize>,
    pub size: (u32, u32),
}

impl Colorbar {
    pub fn new(range: (f64, f64), cmap: ColorMap, unit: &str, levels: Option<usize>) -> Self {
        Colorbar {
            range,
            cmap,
            unit: unit.to_string(),
            levels,
            size: (220, 700),
        }
    }

    /// Value intervals and their colors, bottom to top.
    pub fn strips(&self) -> Vec<(f64, f64, RGBColor)> {
        let (lo, hi) = self.range;
        let levels = match self.levels {
            Some(n) => Levels::linspace(lo, hi, n),
            None => Levels::linspace(lo, hi, CONTINUOUS_STEPS + 1),
        };
        levels
            .values()
            .windows(2)
            .map(|w| (w[0], w[1], self.cmap.sample(levels.normalize(0.5 * (w[0] + w[1])))))
            .collect()
    }
}

impl Figure for Colorbar {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>, text: bool) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;
        let mut axes = Axes::new((0.0, 1.0), self.range).labels("", &self.unit);
        axes.x_ticks = 0;
        axes.y_ticks = 6;
        let mut chart = axes.chart(root, MARGIN, text)?;
        chart.draw_series(
            self.strips()
                .into_iter()
                .map(|(lo, hi, color)| Rectangle::new([(0.0, lo), (1.0, hi)], color.filled())),
        )?;
        draw_frame(&mut chart, &axes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render_svg;

    fn rdbu() -> ColorMap {
        ColorMap::by_name("RdBu_r").unwrap()
    }

    #[test]
    fn discrete_bar_has_one_strip_per_band() {
        let bar = Colorbar::new((-5.0, 5.0), rdbu(), "[mm/s]", Some(21));
        let strips = bar.strips();
        assert_eq!(strips.len(), 20);
        assert_eq!(strips[0].0, -5.0);
        assert_eq!(strips[19].1, 5.0);
        // symmetric range: the two middle strips straddle the white center
        assert_eq!(strips[9].2, rdbu().sample(0.475));
    }

    #[test]
    fn continuous_bar_is_finely_sampled() {
        let bar = Colorbar::new((0.0, 100.0), rdbu(), "[mm/s]", None);
        assert_eq!(bar.strips().len(), CONTINUOUS_STEPS);
        let svg = render_svg(&bar).unwrap();
        assert!(svg.matches("<rect").count() >= CONTINUOUS_STEPS);
    }
}
