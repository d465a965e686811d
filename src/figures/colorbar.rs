//! Standalone color legends matching the contour families.

use crate::config::ColorbarConfig;
use crate::figures::Project;
use crate::render::{ColorMap, Colorbar, write_figure};
use anyhow::Result;

pub const FAMILY: &str = "colorbar";

pub fn legend(config: &ColorbarConfig) -> Result<Colorbar> {
    let cmap = ColorMap::by_name(&config.cmap)?;
    Ok(Colorbar::new((config.min, config.max), cmap, &config.unit, config.levels))
}

pub fn run(project: &Project, bars: &[ColorbarConfig]) -> Result<()> {
    for bar in bars {
        log::info!("{}: {}", FAMILY, bar.name);
        write_figure(&legend(bar)?, &project.figure(FAMILY, &bar.name))?;
    }
    Ok(())
}
