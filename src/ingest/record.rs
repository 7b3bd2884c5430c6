//! Parsing of single ip2asn rows.
//!
//! Row format: `start_ip \t end_ip \t asn \t country \t name`.

use std::net::{IpAddr, Ipv6Addr};

use serde::{Deserialize, Serialize};

use super::{IngestError, IngestOptions};
use crate::ip::{self, AddressCount, AddressRange, Family, RangeError};

/// Number of tab-separated fields in a row
pub const FIELD_COUNT: usize = 5;

/// One validated input row. `start <= end` and both ends share a family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeRecord {
    start: Ipv6Addr,
    end: Ipv6Addr,
    owner_asn: u32,
    owner_name: String,
    country_code: String,
}

impl RangeRecord {
    /// Build a record from parsed addresses. Name and country are trimmed.
    pub fn new(
        start: IpAddr,
        end: IpAddr,
        owner_asn: u32,
        owner_name: &str,
        country_code: &str,
    ) -> Result<Self, RangeError> {
        let start = ip::normalize(start);
        let end = ip::normalize(end);
        ip::check_bounds(start, end)?;
        Ok(Self {
            start,
            end,
            owner_asn,
            owner_name: owner_name.trim().to_string(),
            country_code: country_code.trim().to_string(),
        })
    }

    pub fn start(&self) -> Ipv6Addr {
        self.start
    }

    pub fn end(&self) -> Ipv6Addr {
        self.end
    }

    pub fn owner_asn(&self) -> u32 {
        self.owner_asn
    }

    pub fn owner_name(&self) -> &str {
        &self.owner_name
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    /// Bucketing family, decided by the start address
    pub fn family(&self) -> Family {
        ip::family_of(self.start)
    }

    pub fn length(&self) -> AddressCount {
        ip::range_length(self.start, self.end)
    }

    /// Address count of an IPv4 range, `None` for IPv6 ranges.
    ///
    /// At most 2^32, so it always fits.
    pub fn ipv4_length(&self) -> Option<u64> {
        let start = self.start.to_ipv4_mapped()?;
        let end = self.end.to_ipv4_mapped()?;
        Some(u64::from(u32::from(end)) - u64::from(u32::from(start)) + 1)
    }

    pub fn range(&self) -> AddressRange {
        AddressRange::new(self.start, self.end)
    }
}

/// What a single line turned into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Record(RangeRecord),
    /// A line without any tab, normally the trailing empty line
    Sentinel,
    /// Dropped by the private-space policy
    Private,
}

/// Per-run ingestion counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
    pub lines_read: usize,
    pub records: usize,
    pub sentinel_lines: usize,
    pub private_skipped: usize,
}

impl IngestStats {
    pub(crate) fn count(&mut self, outcome: &LineOutcome) {
        self.lines_read += 1;
        match outcome {
            LineOutcome::Record(_) => self.records += 1,
            LineOutcome::Sentinel => self.sentinel_lines += 1,
            LineOutcome::Private => self.private_skipped += 1,
        }
    }
}

fn parse_addr(line: usize, field: &'static str, value: &str) -> Result<IpAddr, IngestError> {
    value.trim().parse().map_err(|_| IngestError::InvalidAddress {
        line,
        field,
        value: value.to_string(),
    })
}

/// Parse one line. `line_no` is 1-based and only used for diagnostics.
pub fn parse_line(
    line_no: usize,
    line: &str,
    options: &IngestOptions,
) -> Result<LineOutcome, IngestError> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() == 1 {
        return Ok(LineOutcome::Sentinel);
    }
    if fields.len() < FIELD_COUNT {
        return Err(IngestError::MissingField {
            line: line_no,
            found: fields.len(),
        });
    }

    let start = parse_addr(line_no, "start", fields[0])?;
    let end = parse_addr(line_no, "end", fields[1])?;

    // The private-space policy runs before the ASN is looked at, so filtered
    // rows never fail on their ASN column.
    if options.strip_private && (ip::is_private(ip::normalize(start)) || ip::is_private(ip::normalize(end))) {
        return Ok(LineOutcome::Private);
    }

    let asn_field = fields[2].trim();
    let owner_asn: u32 = asn_field.parse().map_err(|source| IngestError::InvalidAsn {
        line: line_no,
        value: asn_field.to_string(),
        source,
    })?;

    let record = RangeRecord::new(start, end, owner_asn, fields[4], fields[3])
        .map_err(|source| IngestError::InvalidRange { line: line_no, source })?;
    Ok(LineOutcome::Record(record))
}
