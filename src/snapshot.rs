//! Opening ip2asn snapshot files.
//!
//! Snapshots are published as `ip2asn-combined.tsv.gz`; plain and zstd
//! compressed copies are accepted too. The format is picked from the file
//! extension.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use color_eyre::eyre::{Context, Result};
use flate2::read::MultiGzDecoder;

const READ_BUFFER: usize = 64 * 1024;

/// Compression of a snapshot file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Zstd,
}

impl Compression {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("gz") => Compression::Gzip,
            Some(ext) if ext.eq_ignore_ascii_case("zst") || ext.eq_ignore_ascii_case("zstd") => {
                Compression::Zstd
            }
            _ => Compression::None,
        }
    }
}

/// Wrap `reader` in the decoder for `compression`.
pub fn decode<'a, R: Read + 'a>(reader: R, compression: Compression) -> Result<Box<dyn BufRead + 'a>> {
    Ok(match compression {
        Compression::None => Box::new(BufReader::with_capacity(READ_BUFFER, reader)),
        Compression::Gzip => Box::new(BufReader::with_capacity(
            READ_BUFFER,
            MultiGzDecoder::new(reader),
        )),
        Compression::Zstd => {
            let decoder =
                zstd::stream::read::Decoder::new(reader).context("Failed to start zstd decoder")?;
            Box::new(BufReader::with_capacity(READ_BUFFER, decoder))
        }
    })
}

/// Open a snapshot for line-by-line reading.
pub fn open_snapshot(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open snapshot: {}", path.display()))?;
    let compression = Compression::from_path(path);
    log::debug!("Reading {} as {:?}", path.display(), compression);
    decode(file, compression)
}
