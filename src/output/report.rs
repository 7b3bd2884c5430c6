//! Human-readable text report and stdout summary.

use std::fs;
use std::path::Path;

use color_eyre::eyre::{Context, Result};

use crate::atlas::{Atlas, Ranking};

pub const REPORT_FILE: &str = "report.txt";

/// Render the text report: run metadata, then the top `top` rows of each ranking.
pub fn render_text_report(
    atlas: &Atlas,
    rankings: &[Ranking<'_>],
    top: usize,
    source: &str,
    generated_at: &str,
) -> String {
    let stats = atlas.stats();
    let mut lines: Vec<String> = Vec::new();

    lines.push("=".repeat(80));
    lines.push("                          IP ADDRESS OWNERSHIP ATLAS".to_string());
    lines.push("=".repeat(80));
    lines.push(String::new());

    lines.push(format!("Generated: {}", generated_at));
    lines.push(format!("Snapshot: {}", source));
    lines.push(format!("Lines Read: {}", stats.lines_read));
    lines.push(format!("Records: {}", stats.records));
    if stats.private_skipped > 0 {
        lines.push(format!("Private Ranges Skipped: {}", stats.private_skipped));
    }
    lines.push(format!("Owners: {}", atlas.len()));
    lines.push(String::new());

    for ranking in rankings {
        lines.push("=".repeat(80));
        lines.push(format!("{:^80}", format!("{} RANKING", ranking.dimension().label().to_uppercase())));
        lines.push("=".repeat(80));
        lines.push(String::new());

        if ranking.is_empty() {
            lines.push("  No owners hold addresses in this family.".to_string());
            lines.push(String::new());
            continue;
        }

        lines.push(format!("Ranked Owners: {}", ranking.len()));
        lines.push(String::new());
        for (i, row) in ranking.iter().take(top).enumerate() {
            lines.push(format!(
                "  {:>3}. AS{:<10} {:<40} {:>3}  {}% ({})",
                i + 1,
                row.asn(),
                truncate(row.name(), 40),
                row.owner.country_code,
                row.universe_percent_display(),
                row.total
            ));
        }
        if ranking.len() > top {
            lines.push(format!("  ... and {} more", ranking.len() - top));
        }
        lines.push(String::new());
    }

    lines.push("=".repeat(80));
    lines.join("\n")
}

fn truncate(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        name.to_string()
    } else {
        let mut out: String = name.chars().take(width - 3).collect();
        out.push_str("...");
        out
    }
}

/// Write the text report to `output_dir/report.txt`
pub fn generate_text_report(
    atlas: &Atlas,
    rankings: &[Ranking<'_>],
    top: usize,
    source: &str,
    generated_at: &str,
    output_dir: &Path,
) -> Result<()> {
    let path = output_dir.join(REPORT_FILE);
    let content = render_text_report(atlas, rankings, top, source, generated_at);
    fs::write(&path, content)
        .with_context(|| format!("Failed to write text report to {}", path.display()))?;

    log::info!("Text report written to {}", path.display());
    Ok(())
}

/// Print a summary to stdout
pub fn print_summary(atlas: &Atlas, rankings: &[Ranking<'_>]) {
    println!("\n=== IP ATLAS SUMMARY ===\n");
    println!("Records: {}", atlas.stats().records);
    println!("Owners: {}", atlas.len());

    for ranking in rankings {
        match ranking.top() {
            Some(top) => println!(
                "{}: {} ranked, top AS{} {} ({}%)",
                ranking.dimension(),
                ranking.len(),
                top.asn(),
                top.name(),
                top.universe_percent_display()
            ),
            None => println!("{}: no owners", ranking.dimension()),
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::RankingConfig;
    use crate::ingest::IngestOptions;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn atlas() -> Atlas {
        let input = "1.0.0.0\t1.255.255.255\t64500\tUS\tFirst\n\
                     2.0.0.0\t2.0.255.255\t64501\tDE\tSecond\n\
                     3.0.0.0\t3.0.0.255\t64502\tFR\tThird\n";
        Atlas::from_reader(Cursor::new(input), IngestOptions::default()).unwrap()
    }

    #[test]
    fn test_report_lists_top_rows() {
        let atlas = atlas();
        let rankings = atlas.rank_all(&RankingConfig::default());
        let report = render_text_report(&atlas, &rankings, 2, "snap.tsv", "now");

        assert!(report.contains("Records: 3"));
        assert!(report.contains("Owners: 3"));
        assert!(report.contains("IPV4 RANKING"));
        assert!(report.contains("AS64500"));
        assert!(report.contains("0.390625% (16777216)"));
        assert!(report.contains("... and 1 more"));
        assert!(report.contains("No owners hold addresses in this family."));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 40), "short");
        assert_eq!(truncate("abcdefghij", 8), "abcde...");
    }

    #[test]
    fn test_generate_text_report() {
        let atlas = atlas();
        let rankings = atlas.rank_all(&RankingConfig::default());
        let dir = TempDir::new().unwrap();
        generate_text_report(&atlas, &rankings, 10, "snap.tsv", "now", dir.path()).unwrap();
        let content = fs::read_to_string(dir.path().join(REPORT_FILE)).unwrap();
        assert!(content.starts_with(&"=".repeat(80)));
        assert!(!content.contains("more"));
    }
}
