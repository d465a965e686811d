//! Named color maps sampled on `[0, 1]`.

use glam::DVec3;
use plotters::style::RGBColor;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown color map `{0}`")]
pub struct UnknownColorMap(pub String);

// ColorBrewer diverging red-blue, red end first
const RDBU: [u32; 11] = [
    0x67001f, 0xb2182b, 0xd6604d, 0xf4a582, 0xfddbc7, 0xf7f7f7, 0xd1e5f0, 0x92c5de, 0x4393c3, 0x2166ac,
    0x053061,
];

const GREYS: [u32; 9] = [
    0xffffff, 0xf0f0f0, 0xd9d9d9, 0xbdbdbd, 0x969696, 0x737373, 0x525252, 0x252525, 0x000000,
];

const VIRIDIS: [u32; 11] = [
    0x440154, 0x482475, 0x414487, 0x355f8d, 0x2a788e, 0x21918c, 0x22a884, 0x44bf70, 0x7ad151, 0xbddf26,
    0xfde725,
];

const COOLWARM: [u32; 5] = [0x3b4cc0, 0x8db0fe, 0xdddddd, 0xf49a7b, 0xb40426];

fn hex(rgb: u32) -> DVec3 {
    DVec3::new(
        ((rgb >> 16) & 0xff) as f64,
        ((rgb >> 8) & 0xff) as f64,
        (rgb & 0xff) as f64,
    ) / 255.0
}

/// A color map as evenly spaced stops, linearly interpolated.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    pub name: String,
    pub colors: Vec<DVec3>,
}

impl ColorMap {
    pub fn new(name: impl Into<String>, colors: Vec<DVec3>) -> Self {
        ColorMap {
            name: name.into(),
            colors,
        }
    }

    /// Look up a map by name. A trailing `_r` reverses it.
    pub fn by_name(name: &str) -> Result<Self, UnknownColorMap> {
        if let Some(base) = name.strip_suffix("_r") {
            let mut map = ColorMap::by_name(base).map_err(|_| UnknownColorMap(name.to_string()))?;
            map.colors.reverse();
            map.name = name.to_string();
            return Ok(map);
        }
        let stops: &[u32] = match name.to_ascii_lowercase().as_str() {
            "rdbu" => &RDBU,
            "greys" | "grays" => &GREYS,
            "viridis" => &VIRIDIS,
            "coolwarm" => &COOLWARM,
            _ => return Err(UnknownColorMap(name.to_string())),
        };
        Ok(ColorMap::new(name, stops.iter().map(|&c| hex(c)).collect()))
    }

    /// Color at `t`, clamped to `[0, 1]`.
    pub fn sample(&self, t: f64) -> RGBColor {
        let rgb = match self.colors.as_slice() {
            [] => DVec3::ZERO,
            [only] => *only,
            colors => {
                let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
                let n = colors.len() - 1;
                let idx = ((t * n as f64).floor() as usize).min(n - 1);
                let frac = t * n as f64 - idx as f64;
                colors[idx].lerp(colors[idx + 1], frac)
            }
        };
        let c = (rgb * 255.0).round().clamp(DVec3::ZERO, DVec3::splat(255.0));
        RGBColor(c.x as u8, c.y as u8, c.z as u8)
    }
}
