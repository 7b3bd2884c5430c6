//! Per-owner aggregate types.

use serde::{Deserialize, Serialize};

use crate::ingest::RangeRecord;
use crate::ip::{AddressCount, AddressRange};

/// ASN used by ip2asn for space that no network announces
pub const NOT_ROUTED_ASN: u32 = 0;

/// Everything one ASN owns in a snapshot.
///
/// `name` and `country_code` come from the first record seen for the ASN.
/// `combined_total == ipv4_total + ipv6_total` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerAggregate {
    pub name: String,
    pub asn: u32,
    pub country_code: String,
    /// Up to 2^32, so a 32-bit counter is one bit short
    pub ipv4_total: u64,
    pub ipv6_total: AddressCount,
    pub combined_total: AddressCount,
    pub ipv4_ranges: Vec<AddressRange>,
    pub ipv6_ranges: Vec<AddressRange>,
}

impl OwnerAggregate {
    pub fn new(asn: u32, name: &str, country_code: &str) -> Self {
        Self {
            name: name.to_string(),
            asn,
            country_code: country_code.to_string(),
            ipv4_total: 0,
            ipv6_total: AddressCount::ZERO,
            combined_total: AddressCount::ZERO,
            ipv4_ranges: Vec::new(),
            ipv6_ranges: Vec::new(),
        }
    }

    /// False for the ASN 0 "not routed" bucket
    pub fn is_announced(&self) -> bool {
        self.asn != NOT_ROUTED_ASN
    }

    /// Fold one record into the totals. Does not touch name or country.
    pub(crate) fn absorb(&mut self, record: &RangeRecord) {
        let length = record.length();
        match record.ipv4_length() {
            Some(ipv4_length) => {
                self.ipv4_ranges.push(record.range());
                self.ipv4_total += ipv4_length;
            }
            None => {
                self.ipv6_ranges.push(record.range());
                self.ipv6_total += length;
            }
        }
        self.combined_total += length;
    }

    pub fn range_count(&self) -> usize {
        self.ipv4_ranges.len() + self.ipv6_ranges.len()
    }
}

/// Entry of the ASN to name index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerIndexEntry {
    pub asn: u32,
    pub name: String,
}

impl From<&OwnerAggregate> for OwnerIndexEntry {
    fn from(owner: &OwnerAggregate) -> Self {
        Self {
            asn: owner.asn,
            name: owner.name.clone(),
        }
    }
}
