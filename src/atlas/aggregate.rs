//! The aggregation context: one [`OwnerAggregate`] per ASN.

use std::collections::HashMap;
use std::io::BufRead;

use super::ranking::{Dimension, Ranking, RankingConfig};
use super::types::{OwnerAggregate, OwnerIndexEntry};
use crate::ingest::{IngestError, IngestOptions, IngestStats, RangeRecord, RecordReader};

/// Owns the ASN to aggregate mapping for one run.
///
/// Filled by a single ingestion pass, read-only afterwards.
#[derive(Debug, Default)]
pub struct Atlas {
    owners: HashMap<u32, OwnerAggregate>,
    stats: IngestStats,
}

impl Atlas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record in. The first record for an ASN fixes its name and country.
    pub fn add(&mut self, record: RangeRecord) {
        let owner = self
            .owners
            .entry(record.owner_asn())
            .or_insert_with(|| {
                OwnerAggregate::new(record.owner_asn(), record.owner_name(), record.country_code())
            });
        if owner.name != record.owner_name() {
            log::trace!(
                "AS{} seen as '{}', keeping '{}'",
                owner.asn,
                record.owner_name(),
                owner.name
            );
        }
        owner.absorb(&record);
    }

    /// Drain `records` into a fresh atlas. The first error aborts the pass.
    ///
    /// Every record counts as one line read; sentinel and private counters
    /// stay at zero since no raw lines pass through here.
    pub fn ingest<I>(records: I) -> Result<Self, IngestError>
    where
        I: IntoIterator<Item = Result<RangeRecord, IngestError>>,
    {
        let mut atlas = Self::new();
        for record in records {
            atlas.add(record?);
            atlas.stats.records += 1;
            atlas.stats.lines_read += 1;
        }
        Ok(atlas)
    }

    /// Read a whole snapshot stream.
    pub fn from_reader<R: BufRead>(reader: R, options: IngestOptions) -> Result<Self, IngestError> {
        let mut records = RecordReader::new(reader, options);
        let mut atlas = Self::new();
        for record in records.by_ref() {
            atlas.add(record?);
        }
        atlas.stats = records.stats().clone();

        log::info!(
            "Ingested {} records from {} lines into {} owners ({} private ranges skipped)",
            atlas.stats.records,
            atlas.stats.lines_read,
            atlas.owners.len(),
            atlas.stats.private_skipped
        );
        Ok(atlas)
    }

    pub fn owner(&self, asn: u32) -> Option<&OwnerAggregate> {
        self.owners.get(&asn)
    }

    /// Owners in unspecified order
    pub fn owners(&self) -> impl Iterator<Item = &OwnerAggregate> {
        self.owners.values()
    }

    /// Owners sorted by ascending ASN
    pub fn owners_by_asn(&self) -> Vec<&OwnerAggregate> {
        let mut owners: Vec<&OwnerAggregate> = self.owners.values().collect();
        owners.sort_by_key(|owner| owner.asn);
        owners
    }

    /// ASN to name index, ascending ASN
    pub fn index(&self) -> Vec<OwnerIndexEntry> {
        self.owners_by_asn().into_iter().map(OwnerIndexEntry::from).collect()
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    pub fn rank(&self, dimension: Dimension, config: &RankingConfig) -> Ranking<'_> {
        Ranking::new(self.owners.values(), dimension, config)
    }

    /// Rankings for IPv4, IPv6 and combined, in that order
    pub fn rank_all(&self, config: &RankingConfig) -> [Ranking<'_>; 3] {
        Dimension::ALL.map(|dimension| self.rank(dimension, config))
    }

    pub fn into_owners(self) -> HashMap<u32, OwnerAggregate> {
        self.owners
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ip::AddressCount;
    use std::io::Cursor;

    fn atlas(input: &str) -> Atlas {
        Atlas::from_reader(Cursor::new(input), IngestOptions::default()).unwrap()
    }

    #[test]
    fn test_same_asn_merges_into_one_owner() {
        let atlas = atlas("0.0.0.0\t0.0.0.255\t100\tUS\tAlice\n0.0.1.0\t0.0.1.255\t100\tUS\tAlice\n");
        assert_eq!(atlas.len(), 1);
        let alice = atlas.owner(100).unwrap();
        assert_eq!(alice.ipv4_total, 512);
        assert_eq!(alice.ipv4_ranges.len(), 2);
        assert_eq!(alice.ipv4_ranges[0].to_string(), "0.0.0.0 - 0.0.0.255");
        assert_eq!(alice.ipv4_ranges[1].to_string(), "0.0.1.0 - 0.0.1.255");
    }

    #[test]
    fn test_first_name_and_country_win() {
        let atlas = atlas("1.0.0.0\t1.0.0.0\t7\tUS\tFirst\n2.0.0.0\t2.0.0.0\t7\tCA\tSecond\n");
        let owner = atlas.owner(7).unwrap();
        assert_eq!(owner.name, "First");
        assert_eq!(owner.country_code, "US");
        assert_eq!(owner.ipv4_total, 2);
    }

    #[test]
    fn test_full_ipv6_space_for_not_routed() {
        let atlas = atlas("::\tffff:ffff:ffff:ffff:ffff:ffff:ffff:ffff\t0\tZZ\tUnrouted\n");
        let unrouted = atlas.owner(0).unwrap();
        assert_eq!(unrouted.ipv6_total, AddressCount::pow2(128));
        assert_eq!(unrouted.combined_total, AddressCount::pow2(128));
        assert_eq!(unrouted.ipv4_total, 0);
    }

    #[test]
    fn test_ingest_aborts_on_first_error() {
        let input = "1.0.0.0\t1.0.0.0\t1\tUS\tA\n1.0.0.0\t1.0.0.0\tx\tUS\tB\n2.0.0.0\t2.0.0.0\t2\tUS\tC\n";
        let err = Atlas::from_reader(Cursor::new(input), IngestOptions::default()).unwrap_err();
        assert_eq!(err.line(), 2);
    }

    #[test]
    fn test_ingest_from_records() {
        let records = vec![
            RangeRecord::new("1.0.0.0".parse().unwrap(), "1.0.0.9".parse().unwrap(), 5, "E", "US"),
            RangeRecord::new("2001:db8::".parse().unwrap(), "2001:db8::9".parse().unwrap(), 5, "E", "US"),
        ];
        let atlas = Atlas::ingest(records.into_iter().map(|r| Ok::<_, IngestError>(r.unwrap()))).unwrap();
        let owner = atlas.owner(5).unwrap();
        assert_eq!(owner.ipv4_total, 10);
        assert_eq!(owner.ipv6_total, AddressCount::from(10u32));
        assert_eq!(owner.combined_total, AddressCount::from(20u32));
        assert_eq!(atlas.stats().records, 2);
        assert_eq!(atlas.stats().lines_read, 2);
    }

    #[test]
    fn test_index_is_sorted_by_asn() {
        let atlas = atlas("1.0.0.0\t1.0.0.0\t30\tUS\tC\n2.0.0.0\t2.0.0.0\t10\tUS\tA\n3.0.0.0\t3.0.0.0\t20\tUS\tB\n");
        let asns: Vec<u32> = atlas.index().iter().map(|e| e.asn).collect();
        assert_eq!(asns, vec![10, 20, 30]);
    }
}
