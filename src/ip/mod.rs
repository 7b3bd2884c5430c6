//! Address arithmetic.
//!
//! This module holds the exact counting type used for every total and the
//! helpers that put IPv4 and IPv6 addresses on one 128-bit number line.

pub mod count;
pub mod range;

// Re-export commonly used types
pub use count::{AddressCount, ParseCountError};
pub use range::{
    check_bounds, family_of, is_private, normalize, range_length, AddressRange, Family, RangeError,
};
