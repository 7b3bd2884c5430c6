//! Ranking of owners along one dimension.
//!
//! Shares are fixed-point integers computed exactly before anything is turned
//! into a float:
//!
//! - `share_of_universe = boosted_total * scale / universe`
//! - `share_of_max = boosted_total * 100 * scale / boosted_total(top)`,
//!   capped at `100 * scale`
//!
//! Rows are ordered by their raw total, so the boost never changes who ranks
//! above whom.
//!
//! ## Boost
//!
//! Every announced owner (ASN != 0) has its total multiplied by
//! [`RankingConfig::boost_factor`] before shares are computed; the ASN 0
//! "not routed" bucket never is. The boost only shapes chart bars; it is not
//! a measurement. When ASN 0 tops a ranking, announced rows below it can
//! have a boosted share above the top row's; their bars are capped at 100. [`RankedRow::universe_percent`] removes it again,
//! so the printed percentage is the true fraction of the universe.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::types::OwnerAggregate;
use crate::ip::AddressCount;

pub const DEFAULT_BOOST_FACTOR: u64 = 10_000;
pub const DEFAULT_SCALE: u64 = 1_000_000_000;
/// Largest scale that keeps every dimension's `universe / scale` above zero
pub const MAX_SCALE: u64 = 1 << 32;

/// Rendered instead of a percentage that rounds to zero
pub const ZERO_SHARE_MARKER: &str = "< 1e-11";

/// One of the three independent rankings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Ipv4,
    Ipv6,
    Combined,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Ipv4, Dimension::Ipv6, Dimension::Combined];

    /// Percentage denominator: 2^32 for IPv4, the flat 2^128 ceiling otherwise
    pub const fn universe(self) -> AddressCount {
        match self {
            Dimension::Ipv4 => AddressCount::pow2(32),
            Dimension::Ipv6 | Dimension::Combined => AddressCount::pow2(128),
        }
    }

    pub fn total(self, owner: &OwnerAggregate) -> AddressCount {
        match self {
            Dimension::Ipv4 => AddressCount::from(owner.ipv4_total),
            Dimension::Ipv6 => owner.ipv6_total,
            Dimension::Combined => owner.combined_total,
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Dimension::Ipv4 => "ipv4",
            Dimension::Ipv6 => "ipv6",
            Dimension::Combined => "combined",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Dimension::Ipv4 => "IPv4",
            Dimension::Ipv6 => "IPv6",
            Dimension::Combined => "Combined",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Presentation constants of the ranking math
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Multiplier applied to announced owners before computing shares
    pub boost_factor: u64,
    /// Fixed-point denominator of both shares
    pub scale: u64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            boost_factor: DEFAULT_BOOST_FACTOR,
            scale: DEFAULT_SCALE,
        }
    }
}

impl RankingConfig {
    /// Total used for shares
    pub fn boosted_total(&self, owner: &OwnerAggregate, total: AddressCount) -> AddressCount {
        if owner.is_announced() {
            total.saturating_mul_u64(self.boost_factor)
        } else {
            total
        }
    }
}

/// `part * per / whole`, exact unless `part * per` leaves the 192-bit range.
fn proportion(part: AddressCount, whole: AddressCount, per: u64) -> AddressCount {
    match part.checked_mul_u64(per) {
        Some(scaled) => scaled / whole,
        // Only reachable with heavily overlapping input.
        None => part / (whole / AddressCount::from(per)).max(AddressCount::ONE),
    }
}

/// One owner's line in a ranking
#[derive(Debug, Clone, Copy)]
pub struct RankedRow<'a> {
    pub owner: &'a OwnerAggregate,
    /// Unboosted total for the dimension
    pub total: AddressCount,
    pub boosted_total: AddressCount,
    /// Whether the boost factor was applied
    pub boosted: bool,
    /// Boosted fraction of the universe, in units of `1 / scale`
    pub share_of_universe: AddressCount,
    /// Bar width relative to the top row, `100 * scale` for the top row and
    /// never more
    pub share_of_max: AddressCount,
    boost_factor: u64,
    scale: u64,
}

impl RankedRow<'_> {
    pub fn asn(&self) -> u32 {
        self.owner.asn
    }

    pub fn name(&self) -> &str {
        &self.owner.name
    }

    /// Bar width on a 0 to 100 scale
    pub fn share_of_max_percent(&self) -> f64 {
        self.share_of_max.to_f64() / self.scale as f64
    }

    /// True percentage of the universe, boost removed
    pub fn universe_percent(&self) -> f64 {
        let percent = self.share_of_universe.to_f64() * 100.0 / self.scale as f64;
        if self.boosted {
            percent / self.boost_factor as f64
        } else {
            percent
        }
    }

    /// Ranking order between two rows of the same dimension
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .total
            .cmp(&self.total)
            .then_with(|| other.boosted.cmp(&self.boosted))
            .then_with(|| self.owner.asn.cmp(&other.owner.asn))
    }

    /// [`Self::universe_percent`] for display, with [`ZERO_SHARE_MARKER`] for
    /// shares below the fixed-point resolution
    pub fn universe_percent_display(&self) -> String {
        if self.share_of_universe.is_zero() {
            ZERO_SHARE_MARKER.to_string()
        } else {
            self.universe_percent().to_string()
        }
    }
}

/// Owners with a non-zero total for one dimension, best first.
///
/// Order: raw total descending, announced owners before ASN 0, ASN ascending.
#[derive(Debug, Clone)]
pub struct Ranking<'a> {
    dimension: Dimension,
    rows: Vec<RankedRow<'a>>,
}

impl<'a> Ranking<'a> {
    pub fn new<I>(owners: I, dimension: Dimension, config: &RankingConfig) -> Self
    where
        I: IntoIterator<Item = &'a OwnerAggregate>,
    {
        let scale = config.scale.max(1);
        let mut rows: Vec<RankedRow<'a>> = owners
            .into_iter()
            .filter_map(|owner| {
                let total = dimension.total(owner);
                (!total.is_zero()).then(|| RankedRow {
                    owner,
                    total,
                    boosted_total: config.boosted_total(owner, total),
                    boosted: owner.is_announced(),
                    share_of_universe: AddressCount::ZERO,
                    share_of_max: AddressCount::ZERO,
                    boost_factor: config.boost_factor,
                    scale,
                })
            })
            .collect();
        rows.sort_by(RankedRow::rank_cmp);

        let Some(top_boosted) = rows.first().map(|row| row.boosted_total) else {
            log::debug!("No owners hold {} addresses, ranking is empty", dimension);
            return Self { dimension, rows };
        };

        let universe = dimension.universe();
        let full_bar = AddressCount::from(scale.saturating_mul(100));
        for row in &mut rows {
            row.share_of_universe = proportion(row.boosted_total, universe, scale);
            row.share_of_max =
                proportion(row.boosted_total, top_boosted, scale.saturating_mul(100)).min(full_bar);
        }

        Self { dimension, rows }
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn rows(&self) -> &[RankedRow<'a>] {
        &self.rows
    }

    /// The top row, `None` for an empty dimension
    pub fn top(&self) -> Option<&RankedRow<'a>> {
        self.rows.first()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RankedRow<'a>> {
        self.rows.iter()
    }

    /// 0-based rank of an ASN, if it is ranked at all
    pub fn position(&self, asn: u32) -> Option<usize> {
        self.rows.iter().position(|row| row.asn() == asn)
    }
}
