//! Fetches the published dataset into `data/`.

use crate::config::DownloadConfig;
use crate::figures::Project;
use crate::io::download::download;
use anyhow::{Context, Result, anyhow};
use std::path::PathBuf;

// One file of the manifest
#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    pub url: String,
    pub destination: PathBuf,
    pub decompress: bool,
}

/// Transfers for one manifest group. Mesh files are published gzipped;
/// text files are not.
pub fn plan(project: &Project, config: &DownloadConfig, group: &str, entries: &[String]) -> Result<Vec<Transfer>> {
    entries
        .iter()
        .map(|entry| {
            let name = entry
                .rsplit('/')
                .next()
                .filter(|n| !n.is_empty())
                .ok_or_else(|| anyhow!("Manifest entry without a file name: {:?}", entry))?;
            let decompress = group == "cfd" && !name.ends_with(".txt");
            let suffix = if decompress { ".gz" } else { "" };
            Ok(Transfer {
                url: format!("{}{}{}", config.base_url, entry, suffix),
                destination: project.data_dir(group).join(name),
                decompress,
            })
        })
        .collect()
}

pub fn run(project: &Project, config: &DownloadConfig) -> Result<()> {
    for (label, group, entries) in [
        ("PIV", "piv", &config.piv),
        ("input", "input", &config.input),
        ("CFD", "cfd", &config.cfd),
    ] {
        println!("\nDownloading {} data...", label);
        let dir = project.data_dir(group);
        std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create directory: {:?}", dir))?;
        for transfer in plan(project, config, group, entries)? {
            download(&transfer.url, &transfer.destination, transfer.decompress, config.chunk_size)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use std::path::Path;

    #[test]
    fn meshes_are_fetched_gzipped() {
        let project = Project::new(Path::new("/p"), OutputFormat::Svg);
        let config = DownloadConfig::default();
        let cfd = plan(&project, &config, "cfd", &config.cfd).unwrap();
        assert_eq!(cfd.len(), 7);
        assert_eq!(
            cfd[0],
            Transfer {
                url: "https://s3-eu-west-1.amazonaws.com/pfigshare-u-files/3196028/case0.vtu.gz".to_string(),
                destination: PathBuf::from("/p/data/cfd/case0.vtu"),
                decompress: true,
            }
        );
        let setup = &cfd[6];
        assert!(!setup.decompress);
        assert!(setup.url.ends_with("3196025/cfd_setup.txt"));
    }

    #[test]
    fn other_groups_are_fetched_as_is() {
        let project = Project::new(Path::new("/p"), OutputFormat::Svg);
        let config = DownloadConfig::default();
        let piv = plan(&project, &config, "piv", &config.piv).unwrap();
        assert_eq!(piv[0].destination, PathBuf::from("/p/data/piv/piv.vti"));
        assert!(!piv[0].decompress);
        let input = plan(&project, &config, "input", &config.input).unwrap();
        assert!(input.iter().all(|t| !t.decompress));
        assert_eq!(input.len(), 8);
    }

    #[test]
    fn entry_without_name_is_rejected() {
        let project = Project::new(Path::new("/p"), OutputFormat::Svg);
        let config = DownloadConfig::default();
        assert!(plan(&project, &config, "piv", &["3196046/".to_string()]).is_err());
    }
}
