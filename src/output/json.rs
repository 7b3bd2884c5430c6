//! JSON artifacts: one file per owner, the ASN to name index and one file per ranking.

use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::atlas::{Atlas, Dimension, OwnerAggregate, Ranking};

pub const OWNERS_DIR: &str = "owners";
pub const RANKINGS_DIR: &str = "rankings";
pub const INDEX_FILE: &str = "key_name_map.json";

/// Row of a serialized ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    /// 1-based
    pub rank: usize,
    pub asn: u32,
    pub name: String,
    pub country_code: String,
    /// Decimal string, totals can exceed 2^64
    pub total: String,
    pub share_of_max_percent: f64,
    pub universe_percent: String,
    pub boosted: bool,
}

/// Serialized form of one [`Ranking`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingFile {
    pub dimension: Dimension,
    pub generated_at: String,
    pub rows: Vec<RankingEntry>,
}

impl RankingFile {
    pub fn from_ranking(ranking: &Ranking<'_>, generated_at: &str) -> Self {
        let rows = ranking
            .iter()
            .enumerate()
            .map(|(i, row)| RankingEntry {
                rank: i + 1,
                asn: row.asn(),
                name: row.name().to_string(),
                country_code: row.owner.country_code.clone(),
                total: row.total.to_string(),
                share_of_max_percent: row.share_of_max_percent(),
                universe_percent: row.universe_percent_display(),
                boosted: row.boosted,
            })
            .collect();
        Self {
            dimension: ranking.dimension(),
            generated_at: generated_at.to_string(),
            rows,
        }
    }
}

pub fn owner_path(output_dir: &Path, asn: u32) -> PathBuf {
    output_dir.join(OWNERS_DIR).join(format!("{asn}.json"))
}

pub fn ranking_path(output_dir: &Path, dimension: Dimension) -> PathBuf {
    output_dir.join(RANKINGS_DIR).join(format!("{}.json", dimension.slug()))
}

fn write_json<T: Serialize>(path: &Path, value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_vec_pretty(value)
    } else {
        serde_json::to_vec(value)
    }
    .with_context(|| format!("Failed to serialize {}", path.display()))?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}

/// Write every owner file in parallel, then the index.
pub fn write_owner_files(atlas: &Atlas, output_dir: &Path) -> Result<()> {
    let owners_dir = output_dir.join(OWNERS_DIR);
    fs::create_dir_all(&owners_dir)
        .with_context(|| format!("Failed to create directory: {}", owners_dir.display()))?;

    let owners = atlas.owners_by_asn();
    owners
        .par_iter()
        .try_for_each(|owner| write_json(&owner_path(output_dir, owner.asn), *owner, false))?;

    write_json(&owners_dir.join(INDEX_FILE), &atlas.index(), false)?;
    log::info!("Wrote {} owner files to {}", owners.len(), owners_dir.display());
    Ok(())
}

pub fn write_rankings(rankings: &[Ranking<'_>], output_dir: &Path, generated_at: &str) -> Result<()> {
    let rankings_dir = output_dir.join(RANKINGS_DIR);
    fs::create_dir_all(&rankings_dir)
        .with_context(|| format!("Failed to create directory: {}", rankings_dir.display()))?;

    for ranking in rankings {
        let file = RankingFile::from_ranking(ranking, generated_at);
        write_json(&ranking_path(output_dir, ranking.dimension()), &file, true)?;
    }
    Ok(())
}

/// All JSON artifacts for one run
pub fn write_artifacts(
    atlas: &Atlas,
    rankings: &[Ranking<'_>],
    output_dir: &Path,
    generated_at: &str,
) -> Result<()> {
    write_owner_files(atlas, output_dir)?;
    write_rankings(rankings, output_dir, generated_at)
}

/// Load an owner file written by [`write_owner_files`].
pub fn read_owner(path: &Path) -> Result<OwnerAggregate> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read owner file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse owner file {}", path.display()))
}

pub fn read_ranking(path: &Path) -> Result<RankingFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read ranking file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse ranking file {}", path.display()))
}
