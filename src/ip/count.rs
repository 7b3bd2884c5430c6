//! Exact unsigned address counts.
//!
//! The IPv6 space holds 2^128 addresses, one more than `u128::MAX`, and the
//! ranking math multiplies totals by the boost factor and the fixed-point
//! scale before dividing. [`AddressCount`] keeps a 64-bit carry limb above a
//! 128-bit low limb so all of that stays exact.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul};
use std::str::FromStr;

use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of bits an [`AddressCount`] can hold.
pub const BITS: u32 = 192;

/// Unsigned integer of [`BITS`] bits: `high * 2^128 + low`.
// Field order matters: the derived `Ord` compares `high` first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AddressCount {
    high: u64,
    low: u128,
}

/// Errors from parsing a decimal [`AddressCount`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseCountError {
    #[error("cannot parse address count from empty string")]
    Empty,

    #[error("invalid digit in address count: {value}")]
    InvalidDigit { value: String },

    #[error("address count does not fit in 192 bits: {value}")]
    Overflow { value: String },
}

impl AddressCount {
    pub const ZERO: Self = Self { high: 0, low: 0 };
    pub const ONE: Self = Self { high: 0, low: 1 };
    pub const MAX: Self = Self { high: u64::MAX, low: u128::MAX };

    /// `2^exp`. Panics when `exp >= BITS`.
    pub const fn pow2(exp: u32) -> Self {
        if exp < 128 {
            Self { high: 0, low: 1u128 << exp }
        } else {
            Self { high: 1u64 << (exp - 128), low: 0 }
        }
    }

    pub const fn is_zero(&self) -> bool {
        self.high == 0 && self.low == 0
    }

    /// The value as `u128`, if it fits.
    pub const fn to_u128(self) -> Option<u128> {
        if self.high == 0 {
            Some(self.low)
        } else {
            None
        }
    }

    /// Nearest `f64`; only meant for display.
    pub fn to_f64(self) -> f64 {
        self.high as f64 * 2f64.powi(128) + self.low as f64
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        let (low, carry) = self.low.overflowing_add(rhs.low);
        let high = self.high.checked_add(rhs.high)?.checked_add(carry as u64)?;
        Some(Self { high, low })
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        let (low, borrow) = self.low.overflowing_sub(rhs.low);
        let high = self.high.checked_sub(rhs.high)?.checked_sub(borrow as u64)?;
        Some(Self { high, low })
    }

    pub fn checked_mul_u64(self, rhs: u64) -> Option<Self> {
        let rhs = rhs as u128;
        let lower = (self.low as u64 as u128) * rhs;
        let upper = (self.low >> 64) * rhs;
        let (low, overflow) = lower.overflowing_add(upper << 64);
        let spill = (upper >> 64) + overflow as u128;
        let high = (self.high as u128) * rhs + spill;
        let high = u64::try_from(high).ok()?;
        Some(Self { high, low })
    }

    pub fn saturating_mul_u64(self, rhs: u64) -> Self {
        self.checked_mul_u64(rhs).unwrap_or(Self::MAX)
    }

    /// Exact truncating division. `None` when `divisor` is zero.
    pub fn checked_div(self, divisor: Self) -> Option<Self> {
        if divisor.is_zero() {
            return None;
        }
        if let (Some(n), Some(d)) = (self.to_u128(), divisor.to_u128()) {
            return Some(Self::from(n / d));
        }

        // Restoring long division, one bit per step. `remainder < divisor`
        // holds between steps; the bit shifted out of the top is tracked so
        // the subtraction stays exact for divisors above 2^191.
        let mut quotient = Self::ZERO;
        let mut remainder = Self::ZERO;
        for index in (0..BITS).rev() {
            let carried = remainder.bit(BITS - 1);
            remainder = remainder.shl1();
            if self.bit(index) {
                remainder.low |= 1;
            }
            if carried || remainder >= divisor {
                remainder = remainder.wrapping_sub(divisor);
                quotient.set_bit(index);
            }
        }
        Some(quotient)
    }

    /// Division with remainder by a machine word. `None` when `divisor` is zero.
    pub fn div_rem_u64(self, divisor: u64) -> Option<(Self, u64)> {
        if divisor == 0 {
            return None;
        }
        let divisor = divisor as u128;
        let limbs = [self.high, (self.low >> 64) as u64, self.low as u64];
        let mut digits = [0u64; 3];
        let mut remainder: u128 = 0;
        for (digit, limb) in digits.iter_mut().zip(limbs) {
            let current = (remainder << 64) | limb as u128;
            *digit = (current / divisor) as u64;
            remainder = current % divisor;
        }
        let quotient = Self {
            high: digits[0],
            low: ((digits[1] as u128) << 64) | digits[2] as u128,
        };
        Some((quotient, remainder as u64))
    }

    fn bit(&self, index: u32) -> bool {
        if index < 128 {
            (self.low >> index) & 1 == 1
        } else {
            (self.high >> (index - 128)) & 1 == 1
        }
    }

    fn set_bit(&mut self, index: u32) {
        if index < 128 {
            self.low |= 1u128 << index;
        } else {
            self.high |= 1u64 << (index - 128);
        }
    }

    fn shl1(self) -> Self {
        Self {
            high: (self.high << 1) | (self.low >> 127) as u64,
            low: self.low << 1,
        }
    }

    fn wrapping_sub(self, rhs: Self) -> Self {
        let (low, borrow) = self.low.overflowing_sub(rhs.low);
        let high = self.high.wrapping_sub(rhs.high).wrapping_sub(borrow as u64);
        Self { high, low }
    }
}

impl From<u32> for AddressCount {
    fn from(value: u32) -> Self {
        Self::from(value as u128)
    }
}

impl From<u64> for AddressCount {
    fn from(value: u64) -> Self {
        Self::from(value as u128)
    }
}

impl From<u128> for AddressCount {
    fn from(value: u128) -> Self {
        Self { high: 0, low: value }
    }
}

impl Add for AddressCount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.checked_add(rhs).expect("overflow when adding address counts")
    }
}

impl AddAssign for AddressCount {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Mul<u64> for AddressCount {
    type Output = Self;

    fn mul(self, rhs: u64) -> Self {
        self.checked_mul_u64(rhs)
            .expect("overflow when multiplying address count")
    }
}

impl Div for AddressCount {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        self.checked_div(rhs).expect("attempt to divide address count by zero")
    }
}

impl fmt::Display for AddressCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(value) = self.to_u128() {
            return fmt::Display::fmt(&value, f);
        }

        const CHUNK: u64 = 10_000_000_000_000_000_000;
        let mut chunks = Vec::new();
        let mut rest = *self;
        while !rest.is_zero() {
            let Some((quotient, chunk)) = rest.div_rem_u64(CHUNK) else {
                return Err(fmt::Error);
            };
            chunks.push(chunk);
            rest = quotient;
        }

        let mut digits = String::with_capacity(chunks.len() * 19);
        for (i, chunk) in chunks.iter().rev().enumerate() {
            if i == 0 {
                digits.push_str(&chunk.to_string());
            } else {
                digits.push_str(&format!("{:019}", chunk));
            }
        }
        f.pad_integral(true, "", &digits)
    }
}

impl FromStr for AddressCount {
    type Err = ParseCountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseCountError::Empty);
        }
        s.chars().try_fold(Self::ZERO, |acc, c| {
            let digit = c.to_digit(10).ok_or_else(|| ParseCountError::InvalidDigit {
                value: s.to_string(),
            })?;
            acc.checked_mul_u64(10)
                .and_then(|shifted| shifted.checked_add(Self::from(digit)))
                .ok_or_else(|| ParseCountError::Overflow { value: s.to_string() })
        })
    }
}

impl Serialize for AddressCount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AddressCount {
    fn deserialize<D>(deserializer: D) -> Result<AddressCount, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_POW_128: &str = "340282366920938463463374607431768211456";

    #[test]
    fn test_u128_max_plus_one_carries() {
        let max = AddressCount::from(u128::MAX);
        let sum = max + AddressCount::ONE;
        assert_eq!(sum, AddressCount::pow2(128));
        assert!(!sum.is_zero());
        assert_eq!(sum.to_u128(), None);
        assert_eq!(sum.to_string(), TWO_POW_128);
    }

    #[test]
    fn test_ordering_across_limbs() {
        assert!(AddressCount::pow2(128) > AddressCount::from(u128::MAX));
        assert!(AddressCount::pow2(32) > AddressCount::from(u32::MAX));
        assert!(AddressCount::ZERO < AddressCount::ONE);
    }

    #[test]
    fn test_checked_sub() {
        let two_pow_128 = AddressCount::pow2(128);
        assert_eq!(
            two_pow_128.checked_sub(AddressCount::ONE),
            Some(AddressCount::from(u128::MAX))
        );
        assert_eq!(AddressCount::ZERO.checked_sub(AddressCount::ONE), None);
    }

    #[test]
    fn test_mul_u64_spills_into_high_limb() {
        let boosted = AddressCount::pow2(128) * 10_000;
        assert_eq!(boosted.to_string(), "3402823669209384634633746074317682114560000");

        let max = AddressCount::from(u128::MAX) * 2;
        assert_eq!(
            max.checked_add(AddressCount::from(2u32)),
            Some(AddressCount::pow2(129))
        );
    }

    #[test]
    fn test_mul_overflow_is_detected() {
        assert_eq!(AddressCount::pow2(191).checked_mul_u64(2), None);
        assert!(AddressCount::pow2(190).checked_mul_u64(2).is_some());
        assert_eq!(AddressCount::pow2(191).saturating_mul_u64(2), AddressCount::MAX);
    }

    #[test]
    fn test_division_by_ceiling_fraction() {
        // 2^128 / (2^128 / 10^9) rounds down to exactly 10^9
        let divisor = AddressCount::pow2(128) / AddressCount::from(1_000_000_000u64);
        assert_eq!(divisor.to_string(), "340282366920938463463374607431");
        let share = AddressCount::pow2(128) / divisor;
        assert_eq!(share, AddressCount::from(1_000_000_000u64));
    }

    #[test]
    fn test_wide_division_matches_narrow() {
        let wide = AddressCount::pow2(140) + AddressCount::from(12_345u32);
        let divisor = AddressCount::pow2(12);
        assert_eq!(wide / divisor, AddressCount::pow2(128) + AddressCount::from(3u32));
        assert_eq!(wide.checked_div(AddressCount::ZERO), None);
        assert_eq!(wide / wide, AddressCount::ONE);
        assert_eq!(divisor / wide, AddressCount::ZERO);
    }

    #[test]
    fn test_div_rem_u64() {
        let (quotient, remainder) = AddressCount::pow2(128).div_rem_u64(10).unwrap();
        assert_eq!(remainder, 6);
        assert_eq!(quotient.to_string(), "34028236692093846346337460743176821145");
        assert!(AddressCount::ONE.div_rem_u64(0).is_none());
    }

    #[test]
    fn test_parse_and_display_round_trip() {
        let parsed: AddressCount = TWO_POW_128.parse().unwrap();
        assert_eq!(parsed, AddressCount::pow2(128));
        assert_eq!("0".parse::<AddressCount>().unwrap(), AddressCount::ZERO);
        assert_eq!(format!("{:>6}", AddressCount::from(42u32)), "    42");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<AddressCount>(), Err(ParseCountError::Empty));
        assert!(matches!(
            "12a".parse::<AddressCount>(),
            Err(ParseCountError::InvalidDigit { .. })
        ));
        let too_big = "9".repeat(60);
        assert!(matches!(
            too_big.parse::<AddressCount>(),
            Err(ParseCountError::Overflow { .. })
        ));
    }

    #[test]
    fn test_serde_as_decimal_string() {
        let json = serde_json::to_string(&AddressCount::pow2(128)).unwrap();
        assert_eq!(json, format!("\"{}\"", TWO_POW_128));
        let back: AddressCount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, AddressCount::pow2(128));
    }

    #[test]
    fn test_to_f64() {
        assert_eq!(AddressCount::from(512u32).to_f64(), 512.0);
        assert_eq!(AddressCount::pow2(128).to_f64(), 2f64.powi(128));
    }
}
