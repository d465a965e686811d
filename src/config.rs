use crate::render::Levels;
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::Path;

// Configuration structure for point-data array names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    pub vx: String,
    pub vy: String,
    pub vxy: String,
}

impl FieldNames {
    pub fn new() -> Self {
        FieldNames {
            vx: "Vx_mm_s".to_string(),
            vy: "Vy_mm_s".to_string(),
            vxy: "Vxy_mm_s".to_string(),
        }
    }
}

impl Default for FieldNames {
    fn default() -> Self {
        FieldNames::new()
    }
}

// Output format configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Svg,
    Png,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Png => "png",
        }
    }
}

// Evenly spaced contour levels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelSpec {
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

impl LevelSpec {
    pub fn new(min: f64, max: f64, count: usize) -> Self {
        LevelSpec { min, max, count }
    }

    pub fn levels(&self) -> Levels {
        Levels::linspace(self.min, self.max, self.count)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourXyConfig {
    pub z: f64,
    pub levels: LevelSpec,
    pub cmap: String,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub hide_labels: bool,
    /// Also draw the PIV image, probed on the slice of `piv_case`.
    pub include_piv: bool,
    pub piv_case: String,
}

impl Default for ContourXyConfig {
    fn default() -> Self {
        ContourXyConfig {
            z: 0.0,
            levels: LevelSpec::new(0.0, 100.0, 21),
            cmap: "RdBu_r".to_string(),
            x_range: (-6.0, 6.0),
            y_range: (-7.0, 5.0),
            hide_labels: true,
            include_piv: true,
            piv_case: "case0".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourYzConfig {
    pub x: f64,
    /// The connected part of the slice nearest to this point is kept.
    pub region_reference: [f64; 3],
    pub levels: LevelSpec,
    pub cmap: String,
    pub z_range: (f64, f64),
    pub y_range: (f64, f64),
    pub outline_width: u32,
    pub chain_start: usize,
    pub hide_labels: bool,
}

impl Default for ContourYzConfig {
    fn default() -> Self {
        ContourYzConfig {
            x: 3.0,
            region_reference: [3.0, 0.0, 0.0],
            levels: LevelSpec::new(-5.0, 5.0, 21),
            cmap: "RdBu_r".to_string(),
            z_range: (-6.0, 6.0),
            y_range: (-7.0, 5.0),
            outline_width: 2,
            chain_start: 0,
            hide_labels: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamXyConfig {
    pub z: f64,
    pub levels: LevelSpec,
    pub cmap: String,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    /// Lattice spacing of the velocity resampling in mm.
    pub grid_spacing: f64,
    pub density: f64,
    pub max_width: f64,
    pub vline_x: Option<f64>,
    pub hide_labels: bool,
}

impl Default for StreamXyConfig {
    fn default() -> Self {
        StreamXyConfig {
            z: 0.0,
            levels: LevelSpec::new(0.0, 100.0, 101),
            cmap: "RdBu_r".to_string(),
            x_range: (-6.0, 6.0),
            y_range: (-7.0, 5.0),
            grid_spacing: 0.005,
            density: 2.0,
            max_width: 5.0,
            vline_x: Some(0.0),
            hide_labels: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsetConfig {
    pub x: (f64, f64),
    pub y: (f64, f64),
    /// Connector corners as matplotlib `loc` codes (1 upper right, 2 upper
    /// left, 3 lower left, 4 lower right).
    pub corners: (u8, u8),
}

impl InsetConfig {
    pub fn new(x: (f64, f64), y: (f64, f64), corners: (u8, u8)) -> Self {
        InsetConfig { x, y, corners }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineplotConfig {
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    /// One inset per case, in case order.
    pub insets: Vec<InsetConfig>,
    pub zoom: f64,
    pub anchor: (f64, f64),
    pub piv_case: String,
    pub size: (u32, u32),
    pub export_csv: bool,
}

impl Default for LineplotConfig {
    fn default() -> Self {
        LineplotConfig {
            x_range: (-9.0, 5.0),
            y_range: (0.0, 51.0),
            insets: vec![
                InsetConfig::new((0.65, 2.15), (42.5, 49.5), (2, 4)),
                InsetConfig::new((1.1, 2.6), (10.5, 17.5), (1, 3)),
                InsetConfig::new((0.95, 2.45), (22.5, 29.5), (1, 4)),
                InsetConfig::new((1.1, 2.6), (7.5, 14.5), (1, 3)),
                InsetConfig::new((0.95, 2.45), (32.5, 39.5), (1, 4)),
                InsetConfig::new((0.85, 2.35), (14.5, 21.5), (1, 3)),
            ],
            zoom: 4.0,
            anchor: (0.07, 0.6),
            piv_case: "case0".to_string(),
            size: (1000, 750),
            export_csv: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorbarConfig {
    pub name: String,
    pub min: f64,
    pub max: f64,
    /// Discrete level count; absent for a continuous bar.
    pub levels: Option<usize>,
    pub cmap: String,
    pub unit: String,
}

impl ColorbarConfig {
    fn new(name: &str, min: f64, max: f64, levels: Option<usize>) -> Self {
        ColorbarConfig {
            name: name.to_string(),
            min,
            max,
            levels,
            cmap: "RdBu_r".to_string(),
            unit: "[mm/s]".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub base_url: String,
    pub piv: Vec<String>,
    pub input: Vec<String>,
    pub cfd: Vec<String>,
    pub chunk_size: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        DownloadConfig {
            base_url: "https://s3-eu-west-1.amazonaws.com/pfigshare-u-files/".to_string(),
            piv: owned(&["3196046/piv.vti"]),
            input: owned(&[
                "3195839/ccs_center.stl",
                "3195833/ccs_left.stl",
                "3195851/ccs_right.stl",
                "3195878/ocs_left.stl",
                "3195890/ocs_right.stl",
                "3195863/surface.stl",
                "3196049/geometry.pdf",
                "1561674/challenge_instructions.txt",
            ]),
            cfd: owned(&[
                "3196028/case0.vtu",
                "3196031/case1.vtu",
                "3196034/case2.vtu",
                "3196037/case3.vtu",
                "3196040/case4.vtu",
                "3196043/case5.vtu",
                "3196025/cfd_setup.txt",
            ]),
            chunk_size: crate::io::download::DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Every setting of every figure family. Missing keys in a JSON override
/// keep their built-in values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureConfig {
    pub cases: Vec<String>,
    pub fields: FieldNames,
    pub pixels_per_mm: f64,
    pub contour_xy: ContourXyConfig,
    pub contour_yz: ContourYzConfig,
    pub stream_xy: StreamXyConfig,
    pub lineplot_y: LineplotConfig,
    pub colorbars: Vec<ColorbarConfig>,
    pub download: DownloadConfig,
}

impl Default for FigureConfig {
    fn default() -> Self {
        FigureConfig {
            cases: (0..6).map(|i| format!("case{}", i)).collect(),
            fields: FieldNames::new(),
            pixels_per_mm: 60.0,
            contour_xy: ContourXyConfig::default(),
            contour_yz: ContourYzConfig::default(),
            stream_xy: StreamXyConfig::default(),
            lineplot_y: LineplotConfig::default(),
            colorbars: vec![
                ColorbarConfig::new("contourplot_xyplane", 0.0, 100.0, Some(21)),
                ColorbarConfig::new("contourplot_yzplane", -5.0, 5.0, Some(21)),
                ColorbarConfig::new("streamplot_xyplane", 0.0, 100.0, None),
            ],
            download: DownloadConfig::default(),
        }
    }
}

impl FigureConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse figure configuration")
    }

    /// Built-in settings, overridden by the JSON file at `path` if given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(FigureConfig::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {:?}", path))?;
        FigureConfig::from_json(&text).with_context(|| format!("Invalid configuration in {:?}", path))
    }
}
