//! HTML pages: chart rows, owner pages and `{{ PLACEHOLDER }}` templates.
//!
//! A template directory holds `index.html` (rendered once per ranking),
//! `company.html` (rendered once per owner) and any static files, which are
//! copied as is.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use color_eyre::eyre::{Context, Result};
use rayon::prelude::*;
use regex::{Captures, Regex};

use super::json::OWNERS_DIR;
use crate::atlas::{Atlas, Dimension, OwnerAggregate, RankedRow, Ranking};
use crate::ip::AddressRange;

pub const INDEX_TEMPLATE: &str = "index.html";
pub const OWNER_TEMPLATE: &str = "company.html";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").unwrap());

/// File name of the page for one ranking; IPv4 is the landing page.
pub fn page_name(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Ipv4 => "index.html",
        Dimension::Ipv6 => "ipv6.html",
        Dimension::Combined => "combined.html",
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Replace every `{{ KEY }}` found in `values`. Unknown keys are left in place.
pub fn fill_template(template: &str, values: &HashMap<&str, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| match values.get(&caps[1]) {
            Some(value) => value.clone(),
            None => {
                log::warn!("No value for template placeholder {}", &caps[1]);
                caps[0].to_string()
            }
        })
        .into_owned()
}

pub fn chart_row(row: &RankedRow<'_>) -> String {
    format!(
        concat!(
            "<div class=\"chart-row\">",
            "<div class=\"chart-label\"> <a href=\"{dir}/{asn}.html\" target=\"_blank\">{name}</a></div>",
            "<div class=\"chart-bar\">",
            "<div class=\"chart-bar-internal\" style=\"width: {width}%\"></div>",
            "</div>",
            "<div class=\"chart-percentage\">{percent}% ({total})</div>",
            "</div>"
        ),
        dir = OWNERS_DIR,
        asn = row.asn(),
        name = escape_html(row.name()),
        width = row.share_of_max_percent(),
        percent = row.universe_percent_display(),
        total = row.total,
    )
}

pub fn chart_rows(ranking: &Ranking<'_>) -> String {
    ranking.iter().map(chart_row).collect()
}

fn range_items(ranges: &[AddressRange]) -> String {
    ranges.iter().map(|range| format!("<li>{range}</li>")).collect()
}

pub fn render_ranking_page(template: &str, ranking: &Ranking<'_>, generated_at: &str) -> String {
    let values = HashMap::from([
        ("INSERT_NEW_ROWS", chart_rows(ranking)),
        ("INSERT_DIMENSION", ranking.dimension().label().to_string()),
        ("INSERT_GENERATED_AT", generated_at.to_string()),
    ]);
    fill_template(template, &values)
}

pub fn render_owner_page(template: &str, owner: &OwnerAggregate) -> String {
    let values = HashMap::from([
        ("INSERT_NAME", escape_html(&owner.name)),
        ("INSERT_ASN", owner.asn.to_string()),
        ("INSERT_COUNTRY_CODE", escape_html(&owner.country_code)),
        ("INSERT_TOTAL_NUMBER_OF_IP4s", owner.ipv4_total.to_string()),
        ("INSERT_TOTAL_NUMBER_OF_IP6s", owner.ipv6_total.to_string()),
        ("INSERT_TOTAL_NUMBER_OF_IPs_COMBINED", owner.combined_total.to_string()),
        ("INSERT_IPV4_RANGES", range_items(&owner.ipv4_ranges)),
        ("INSERT_IPV6_RANGES", range_items(&owner.ipv6_ranges)),
    ]);
    fill_template(template, &values)
}

fn read_template(path: &Path) -> Result<Option<String>> {
    if !path.is_file() {
        log::warn!("Template {} not found, skipping", path.display());
        return Ok(None);
    }
    fs::read_to_string(path)
        .with_context(|| format!("Failed to read template {}", path.display()))
        .map(Some)
}

/// Render pages from `templates_dir` into `output_dir` and copy its static files.
pub fn write_pages(
    atlas: &Atlas,
    rankings: &[Ranking<'_>],
    templates_dir: &Path,
    output_dir: &Path,
    generated_at: &str,
) -> Result<()> {
    if !templates_dir.is_dir() {
        color_eyre::eyre::bail!("Template directory not found: {}", templates_dir.display());
    }

    if let Some(template) = read_template(&templates_dir.join(INDEX_TEMPLATE))? {
        for ranking in rankings {
            let path = output_dir.join(page_name(ranking.dimension()));
            fs::write(&path, render_ranking_page(&template, ranking, generated_at))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            log::debug!("Wrote {}", path.display());
        }
    }

    if let Some(template) = read_template(&templates_dir.join(OWNER_TEMPLATE))? {
        let owners_dir = output_dir.join(OWNERS_DIR);
        fs::create_dir_all(&owners_dir)
            .with_context(|| format!("Failed to create directory: {}", owners_dir.display()))?;
        atlas.owners_by_asn().par_iter().try_for_each(|owner| {
            let path = owners_dir.join(format!("{}.html", owner.asn));
            fs::write(&path, render_owner_page(&template, owner))
                .with_context(|| format!("Failed to write {}", path.display()))
        })?;
    }

    copy_static_files(templates_dir, output_dir)?;
    log::info!("Wrote pages from {} to {}", templates_dir.display(), output_dir.display());
    Ok(())
}

fn copy_static_files(templates_dir: &Path, output_dir: &Path) -> Result<()> {
    let entries = fs::read_dir(templates_dir)
        .with_context(|| format!("Failed to list {}", templates_dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list {}", templates_dir.display()))?;
        let name = entry.file_name();
        if name == INDEX_TEMPLATE || name == OWNER_TEMPLATE || !entry.path().is_file() {
            continue;
        }
        let dest = output_dir.join(&name);
        fs::copy(entry.path(), &dest)
            .with_context(|| format!("Failed to copy {} to {}", entry.path().display(), dest.display()))?;
        log::debug!("Copied {}", dest.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::RankingConfig;
    use crate::ingest::IngestOptions;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn atlas() -> Atlas {
        let input = "1.0.0.0\t1.0.0.255\t64500\tUS\tAT&T <Labs>\n2.0.0.0\t2.0.1.255\t64501\tDE\tBig\n";
        Atlas::from_reader(Cursor::new(input), IngestOptions::default()).unwrap()
    }

    #[test]
    fn test_fill_template() {
        let values = HashMap::from([("A", "1".to_string()), ("B_2", "two".to_string())]);
        assert_eq!(fill_template("{{ A }}-{{B_2}}-{{  A  }}", &values), "1-two-1");
        assert_eq!(fill_template("{{ MISSING }} stays", &values), "{{ MISSING }} stays");
        assert_eq!(fill_template("no placeholders", &values), "no placeholders");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("AT&T <Labs> \"x\" 'y'"), "AT&amp;T &lt;Labs&gt; &quot;x&quot; &#39;y&#39;");
    }

    #[test]
    fn test_chart_row() {
        let atlas = atlas();
        let ranking = atlas.rank(Dimension::Ipv4, &RankingConfig::default());
        let top = chart_row(ranking.top().unwrap());
        assert!(top.contains("href=\"owners/64501.html\""));
        assert!(top.contains("width: 100%"));
        assert!(top.contains("(512)"));

        let second = chart_row(&ranking.rows()[1]);
        assert!(second.contains("AT&amp;T &lt;Labs&gt;"));
        assert!(second.contains("width: 50%"));
        assert!(second.contains("% (256)</div>"));
    }

    #[test]
    fn test_owner_page() {
        let atlas = atlas();
        let owner = atlas.owner(64501).unwrap();
        let page = render_owner_page(
            "<h1>{{ INSERT_NAME }} AS{{ INSERT_ASN }}</h1><p>{{ INSERT_TOTAL_NUMBER_OF_IP4s }}</p><ul>{{ INSERT_IPV4_RANGES }}</ul>",
            owner,
        );
        assert_eq!(page, "<h1>Big AS64501</h1><p>512</p><ul><li>2.0.0.0 - 2.0.1.255</li></ul>");
    }

    #[test]
    fn test_write_pages() {
        let atlas = atlas();
        let rankings = atlas.rank_all(&RankingConfig::default());
        let templates = TempDir::new().unwrap();
        fs::write(templates.path().join(INDEX_TEMPLATE), "<h1>{{ INSERT_DIMENSION }}</h1>{{ INSERT_NEW_ROWS }}").unwrap();
        fs::write(templates.path().join(OWNER_TEMPLATE), "{{ INSERT_NAME }}").unwrap();
        fs::write(templates.path().join("globals.css"), "body {}").unwrap();

        let out = TempDir::new().unwrap();
        write_pages(&atlas, &rankings, templates.path(), out.path(), "now").unwrap();

        let index = fs::read_to_string(out.path().join("index.html")).unwrap();
        assert!(index.starts_with("<h1>IPv4</h1><div class=\"chart-row\">"));
        let ipv6 = fs::read_to_string(out.path().join("ipv6.html")).unwrap();
        assert_eq!(ipv6, "<h1>IPv6</h1>");
        assert!(out.path().join("combined.html").is_file());
        assert_eq!(fs::read_to_string(out.path().join("owners/64501.html")).unwrap(), "Big");
        assert_eq!(fs::read_to_string(out.path().join("globals.css")).unwrap(), "body {}");
        assert!(!out.path().join(OWNER_TEMPLATE).exists());
    }

    #[test]
    fn test_missing_template_dir_fails() {
        let atlas = Atlas::new();
        let out = TempDir::new().unwrap();
        assert!(write_pages(&atlas, &[], Path::new("/nonexistent/templates"), out.path(), "now").is_err());
    }
}
