//! # ip-atlas - who owns the Internet's address space
//!
//! Aggregates an ip2asn snapshot (tab-separated `start end asn country name`
//! rows) into per-ASN ownership totals and ranks owners by IPv4, IPv6 and
//! combined address count.
//!
//! ## Architecture
//!
//! - `ip`: 192-bit address counting and range arithmetic
//! - `ingest`: line parsing and the streaming record reader
//! - `atlas`: per-ASN aggregation and the three rankings
//! - `snapshot`: opening plain, gzip or zstd snapshot files
//! - `output`: JSON artifacts, HTML pages and the text report
//! - `config` / `config_loader`: YAML configuration and CLI overrides
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use ip_atlas::atlas::{Atlas, Dimension, RankingConfig};
//! use ip_atlas::ingest::IngestOptions;
//! use ip_atlas::snapshot::open_snapshot;
//!
//! let reader = open_snapshot("ip2asn-combined.tsv.gz".as_ref())?;
//! let atlas = Atlas::from_reader(reader, IngestOptions::default())?;
//!
//! let ranking = atlas.rank(Dimension::Ipv4, &RankingConfig::default());
//! if let Some(top) = ranking.top() {
//!     println!("AS{} {} holds {}% of IPv4", top.asn(), top.name(), top.universe_percent_display());
//! }
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! Ingestion fails on the first malformed row with an [`ingest::IngestError`]
//! carrying its line number. Application-level functions return
//! `color_eyre::Result` with file context attached.

pub mod atlas;
pub mod config;
pub mod config_loader;
pub mod ingest;
pub mod ip;
pub mod output;
pub mod snapshot;
