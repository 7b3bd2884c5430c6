//! Address normalization and range arithmetic.
//!
//! Every address is embedded in the 128-bit IPv6 space (IPv4 via the
//! IPv4-mapped block `::ffff:0:0/96`) so range lengths are computed the same
//! way for both families.

use std::fmt;
use std::net::{IpAddr, Ipv6Addr};

use serde::{Deserialize, Serialize};

use super::count::AddressCount;

/// Address family a range is bucketed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Family {
    Ipv4,
    Ipv6,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Family::Ipv4 => write!(f, "IPv4"),
            Family::Ipv6 => write!(f, "IPv6"),
        }
    }
}

/// Invalid range bounds
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("range start {start} is greater than range end {end}")]
    Inverted { start: IpAddr, end: IpAddr },

    #[error("range {start} - {end} starts in IPv4-mapped space but ends outside it")]
    MixedFamily { start: IpAddr, end: IpAddr },
}

/// Canonical 128-bit form of an address.
pub fn normalize(addr: IpAddr) -> Ipv6Addr {
    match addr {
        IpAddr::V4(v4) => v4.to_ipv6_mapped(),
        IpAddr::V6(v6) => v6,
    }
}

/// IPv4 iff the address has an IPv4-mapped projection.
pub fn family_of(addr: Ipv6Addr) -> Family {
    if addr.to_ipv4_mapped().is_some() {
        Family::Ipv4
    } else {
        Family::Ipv6
    }
}

/// Check `start <= end` and that both ends share a family.
///
/// Returns the family of the range, which is the family of `start`.
pub fn check_bounds(start: Ipv6Addr, end: Ipv6Addr) -> Result<Family, RangeError> {
    if start > end {
        return Err(RangeError::Inverted {
            start: start.to_canonical(),
            end: end.to_canonical(),
        });
    }
    let family = family_of(start);
    if family != family_of(end) {
        return Err(RangeError::MixedFamily {
            start: start.to_canonical(),
            end: end.to_canonical(),
        });
    }
    Ok(family)
}

/// Number of addresses in `start..=end`, exact up to the full 2^128 space.
///
/// Callers must ensure `start <= end`.
pub fn range_length(start: Ipv6Addr, end: Ipv6Addr) -> AddressCount {
    debug_assert!(start <= end, "inverted range {start} - {end}");
    let span = u128::from(end).wrapping_sub(u128::from(start));
    AddressCount::from(span) + AddressCount::ONE
}

/// Private address space: RFC 1918 for IPv4 (checked on the mapped form),
/// unique local fc00::/7 (RFC 4193) for IPv6.
pub fn is_private(addr: Ipv6Addr) -> bool {
    match addr.to_ipv4_mapped() {
        Some(v4) => v4.is_private(),
        None => addr.segments()[0] & 0xfe00 == 0xfc00,
    }
}

/// One owned range, kept in display form (IPv4-mapped shown as dotted quad).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressRange {
    pub start: IpAddr,
    pub end: IpAddr,
}

impl AddressRange {
    pub fn new(start: Ipv6Addr, end: Ipv6Addr) -> Self {
        Self {
            start: start.to_canonical(),
            end: end.to_canonical(),
        }
    }

    /// Number of addresses covered
    pub fn size(&self) -> AddressCount {
        range_length(normalize(self.start), normalize(self.end))
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}
