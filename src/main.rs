use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use ip_atlas::atlas::Atlas;
use ip_atlas::config_loader::{self, CliOverrides};
use ip_atlas::output;
use ip_atlas::snapshot::open_snapshot;

/// Rank ASNs by the IPv4, IPv6 and combined address space they own
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// ip2asn snapshot (.tsv, .tsv.gz or .tsv.zst)
    #[arg(short, long, default_value = "ip2asn-combined.tsv.gz")]
    input: PathBuf,

    /// Optional YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory, wiped on every run (overrides config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Drop ranges touching private address space
    #[arg(long)]
    strip_private: bool,

    /// HTML template directory (overrides config)
    #[arg(long)]
    templates: Option<PathBuf>,

    /// Rows per ranking in the text report (overrides config)
    #[arg(long)]
    top: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Number of parallel writers (0 = auto-detect)
    #[arg(short = 'j', long, default_value = "0")]
    threads: usize,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            output: self.output.clone(),
            templates: self.templates.clone(),
            strip_private: self.strip_private,
            summary_rows: self.top,
        }
    }
}

fn prepare_output_dir(output_dir: &Path) -> Result<()> {
    if output_dir.exists() {
        info!("Removing previous output in {}", output_dir.display());
        fs::remove_dir_all(output_dir)
            .wrap_err_with(|| format!("Failed to remove output directory '{}'", output_dir.display()))?;
    }
    fs::create_dir_all(output_dir)
        .wrap_err_with(|| format!("Failed to create output directory '{}'", output_dir.display()))
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(&args.log_level)).init();

    if args.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.threads)
            .build_global()
            .wrap_err("Failed to configure thread pool")?;
    }

    let mut config = config_loader::load_or_default(args.config.as_deref())?;
    config_loader::apply_overrides(&mut config, &args.overrides())?;

    info!("Reading snapshot {}", args.input.display());
    let reader = open_snapshot(&args.input)?;
    let atlas = Atlas::from_reader(reader, config.ingest)
        .wrap_err_with(|| format!("Failed to ingest snapshot '{}'", args.input.display()))?;

    let rankings = atlas.rank_all(&config.ranking);
    for ranking in &rankings {
        info!("{} ranking: {} owners", ranking.dimension(), ranking.len());
    }

    let output_dir = &config.output.directory;
    prepare_output_dir(output_dir)?;
    let generated_at = chrono::Utc::now().to_rfc3339();

    output::write_artifacts(&atlas, &rankings, output_dir, &generated_at)?;
    match &config.output.templates {
        Some(templates) => output::write_pages(&atlas, &rankings, templates, output_dir, &generated_at)?,
        None => info!("No template directory configured, skipping HTML pages"),
    }
    output::generate_text_report(
        &atlas,
        &rankings,
        config.output.summary_rows,
        &args.input.display().to_string(),
        &generated_at,
        output_dir,
    )?;

    output::print_summary(&atlas, &rankings);
    info!("Done, output written to {}", output_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let args = Args::parse_from(["ip-atlas"]);

        assert_eq!(args.input, PathBuf::from("ip2asn-combined.tsv.gz"));
        assert!(args.config.is_none());
        assert!(args.output.is_none());
        assert!(!args.strip_private);
        assert_eq!(args.log_level, "info");
        assert_eq!(args.threads, 0);
    }

    #[test]
    fn test_cli_overrides() {
        let args = Args::parse_from([
            "ip-atlas",
            "--input", "snap.tsv",
            "--config", "atlas.yaml",
            "--output", "site",
            "--strip-private",
            "--templates", "templates",
            "--top", "5",
        ]);

        assert_eq!(args.input, PathBuf::from("snap.tsv"));
        assert_eq!(args.config, Some(PathBuf::from("atlas.yaml")));
        let overrides = args.overrides();
        assert_eq!(overrides.output, Some(PathBuf::from("site")));
        assert_eq!(overrides.templates, Some(PathBuf::from("templates")));
        assert!(overrides.strip_private);
        assert_eq!(overrides.summary_rows, Some(5));
    }

    #[test]
    fn test_prepare_output_dir_clears_previous_run() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("dist");
        fs::create_dir_all(out.join("owners")).unwrap();
        fs::write(out.join("stale.json"), "{}").unwrap();

        prepare_output_dir(&out).unwrap();
        assert!(out.is_dir());
        assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
    }
}
