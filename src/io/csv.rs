use anyhow::{Context, Result};
use csv::{Writer, WriterBuilder};
use std::fs::File;
use std::path::Path;

// One named series of (coordinate, value) samples
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub source: String,
    pub samples: Vec<(f64, f64)>,
}

impl Profile {
    pub fn new(source: &str, samples: Vec<(f64, f64)>) -> Self {
        Profile {
            source: source.to_string(),
            samples,
        }
    }
}

// Create CSV writer with headers
pub fn create_profile_writer(path: &Path, coordinate: &str, value: &str) -> Result<Writer<File>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    let mut wtr = WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to create CSV file: {:?}", path))?;

    // Write header
    wtr.write_record(["source", coordinate, value])?;

    Ok(wtr)
}

/// Write every profile to `path`, one row per sample.
pub fn write_profiles(path: &Path, coordinate: &str, value: &str, profiles: &[Profile]) -> Result<()> {
    let mut wtr = create_profile_writer(path, coordinate, value)?;
    for profile in profiles {
        for &(c, v) in &profile.samples {
            wtr.write_record([profile.source.clone(), c.to_string(), v.to_string()])?;
        }
    }
    wtr.flush().context("Failed to flush CSV writer")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use csv::ReaderBuilder;

    #[test]
    fn profiles_are_written_row_per_sample() {
        let dir = std::env::temp_dir().join(format!("cfdfig_csv_{}", std::process::id()));
        let path = dir.join("nested").join("case0.csv");
        let profiles = [
            Profile::new("piv", vec![(-1.0, 2.5)]),
            Profile::new("case0", vec![(0.0, 1.0), (0.5, 40.25)]),
        ];
        write_profiles(&path, "y_mm", "Vxy_mm_s", &profiles).unwrap();

        let mut rdr = ReaderBuilder::new().has_headers(true).from_path(&path).unwrap();
        assert_eq!(rdr.headers().unwrap(), vec!["source", "y_mm", "Vxy_mm_s"]);
        let rows: Vec<(String, f64, f64)> = rdr
            .records()
            .map(|r| {
                let r = r.unwrap();
                (r[0].to_string(), r[1].parse().unwrap(), r[2].parse().unwrap())
            })
            .collect();
        assert_eq!(
            rows,
            vec![
                ("piv".to_string(), -1.0, 2.5),
                ("case0".to_string(), 0.0, 1.0),
                ("case0".to_string(), 0.5, 40.25),
            ]
        );
        std::fs::remove_dir_all(dir).ok();
    }
}
