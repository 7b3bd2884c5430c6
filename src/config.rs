use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use crate::atlas::{RankingConfig, MAX_SCALE};
use crate::ingest::IngestOptions;

/// Run configuration. Every section is optional in the YAML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    pub ingest: IngestOptions,
    pub ranking: RankingConfig,
    pub output: OutputConfig,
}

/// Where and how artifacts are written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Wiped and recreated on every run
    pub directory: PathBuf,
    /// Rows per ranking in the text report
    pub summary_rows: usize,
    /// HTML template directory; no pages are rendered without one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("dist"),
            summary_rows: 10,
            templates: None,
        }
    }
}

impl AtlasConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.ranking.boost_factor == 0 {
            return Err(ValidationError::InvalidRanking(
                "boost_factor must be at least 1".to_string(),
            ));
        }
        if self.ranking.scale == 0 || self.ranking.scale > MAX_SCALE {
            return Err(ValidationError::InvalidRanking(format!(
                "scale must be between 1 and {}, got {}",
                MAX_SCALE, self.ranking.scale
            )));
        }

        if self.output.directory.as_os_str().is_empty() {
            return Err(ValidationError::InvalidOutput(
                "directory cannot be empty".to_string(),
            ));
        }
        let directory = &self.output.directory;
        let names_nothing = directory.components().all(|c| {
            matches!(
                c,
                Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if names_nothing {
            return Err(ValidationError::InvalidOutput(format!(
                "refusing to use '{}' as output directory",
                directory.display()
            )));
        }

        // The output directory is wiped before writing.
        let output = resolve(directory);
        if let Ok(cwd) = std::env::current_dir() {
            if resolve(&cwd).starts_with(&output) {
                return Err(ValidationError::InvalidOutput(format!(
                    "output directory '{}' contains the working directory",
                    directory.display()
                )));
            }
        }
        if let Some(templates) = &self.output.templates {
            if resolve(templates).starts_with(&output) {
                return Err(ValidationError::InvalidOutput(format!(
                    "templates '{}' lie inside output directory '{}'",
                    templates.display(),
                    directory.display()
                )));
            }
        }

        Ok(())
    }
}

/// Absolute form of `path`, with symlinks resolved when it exists
fn resolve(path: &Path) -> PathBuf {
    std::fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid ranking configuration: {0}")]
    InvalidRanking(String),
    #[error("Invalid output configuration: {0}")]
    InvalidOutput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AtlasConfig::default();
        assert!(!config.ingest.strip_private);
        assert_eq!(config.ranking.boost_factor, 10_000);
        assert_eq!(config.ranking.scale, 1_000_000_000);
        assert_eq!(config.output.directory, PathBuf::from("dist"));
        assert_eq!(config.output.summary_rows, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: AtlasConfig = serde_yaml::from_str("ranking:\n  scale: 1000\n").unwrap();
        assert_eq!(config.ranking.scale, 1000);
        assert_eq!(config.ranking.boost_factor, 10_000);
        assert_eq!(config.output, OutputConfig::default());
    }

    #[test]
    fn test_rejects_zero_boost() {
        let mut config = AtlasConfig::default();
        config.ranking.boost_factor = 0;
        assert!(matches!(config.validate(), Err(ValidationError::InvalidRanking(_))));
    }

    #[test]
    fn test_scale_bounds() {
        let mut config = AtlasConfig::default();
        config.ranking.scale = 0;
        assert!(config.validate().is_err());
        config.ranking.scale = MAX_SCALE + 1;
        assert!(config.validate().is_err());
        config.ranking.scale = MAX_SCALE;
        assert!(config.validate().is_ok());
        config.ranking.scale = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_output_directory() {
        for bad in ["", ".", "..", "./..", "../..", "/"] {
            let mut config = AtlasConfig::default();
            config.output.directory = PathBuf::from(bad);
            assert!(
                matches!(config.validate(), Err(ValidationError::InvalidOutput(_))),
                "'{bad}' accepted"
            );
        }
    }

    #[test]
    fn test_rejects_output_containing_working_directory() {
        let cwd = std::env::current_dir().unwrap();
        let mut config = AtlasConfig::default();
        config.output.directory = cwd.parent().unwrap_or(&cwd).to_path_buf();
        assert!(matches!(config.validate(), Err(ValidationError::InvalidOutput(_))));
    }

    #[test]
    fn test_rejects_templates_inside_output() {
        let dir = tempfile::TempDir::new().unwrap();
        let site = dir.path().join("site");
        std::fs::create_dir_all(site.join("tpl")).unwrap();

        let mut config = AtlasConfig::default();
        config.output.directory = site.clone();
        config.output.templates = Some(site.clone());
        assert!(matches!(config.validate(), Err(ValidationError::InvalidOutput(_))));

        config.output.templates = Some(site.join("tpl"));
        assert!(matches!(config.validate(), Err(ValidationError::InvalidOutput(_))));

        config.output.templates = Some(dir.path().join("site").join("..").join("site").join("tpl"));
        assert!(matches!(config.validate(), Err(ValidationError::InvalidOutput(_))));

        config.output.templates = Some(dir.path().join("templates"));
        assert!(config.validate().is_ok());
    }
}
