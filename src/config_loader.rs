use crate::config::AtlasConfig;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Load and parse configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<AtlasConfig> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open config file '{}'", config_path.display()))?;
    let config: AtlasConfig = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse config file '{}'", config_path.display()))?;

    config.validate()?;

    Ok(config)
}

/// Load `config_path` if given, defaults otherwise
pub fn load_or_default(config_path: Option<&Path>) -> Result<AtlasConfig> {
    match config_path {
        Some(path) => load_config(path),
        None => {
            info!("No configuration file given, using defaults");
            Ok(AtlasConfig::default())
        }
    }
}

/// CLI arguments that override YAML settings
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub output: Option<PathBuf>,
    pub templates: Option<PathBuf>,
    pub strip_private: bool,
    pub summary_rows: Option<usize>,
}

/// Apply CLI overrides to a loaded configuration
pub fn apply_overrides(config: &mut AtlasConfig, overrides: &CliOverrides) -> Result<()> {
    if let Some(output) = &overrides.output {
        config.output.directory = output.clone();
    }
    if let Some(templates) = &overrides.templates {
        config.output.templates = Some(templates.clone());
    }
    if overrides.strip_private {
        config.ingest.strip_private = true;
    }
    if let Some(rows) = overrides.summary_rows {
        config.output.summary_rows = rows;
    }

    // Re-validate after applying overrides
    config.validate()?;

    Ok(())
}
