//! Per-ASN aggregation and the three rankings built on top of it.

pub mod aggregate;
pub mod ranking;
pub mod types;

pub use aggregate::Atlas;
pub use ranking::{
    Dimension, RankedRow, Ranking, RankingConfig, DEFAULT_BOOST_FACTOR, DEFAULT_SCALE, MAX_SCALE,
    ZERO_SHARE_MARKER,
};
pub use types::{OwnerAggregate, OwnerIndexEntry, NOT_ROUTED_ASN};
