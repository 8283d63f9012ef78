//! Denominated token amounts.
//!
//! Amounts are fixed-point integers (u128) tagged with a denomination.
//! The smallest unit is 1 raw. Arithmetic between different denominations
//! is not defined; the checked operations refuse it.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors from validating a token amount.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("invalid denomination {0:?}: expected 3-16 lowercase ascii letters")]
    InvalidDenom(String),
}

/// A non-negative token quantity with a denomination.
///
/// Internally stored as raw units (u128) for precision. Non-negative by
/// construction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenAmount {
    denom: String,
    amount: u128,
}

impl TokenAmount {
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    /// A zero amount of the given denomination.
    pub fn zero(denom: impl Into<String>) -> Self {
        Self::new(denom, 0)
    }

    pub fn denom(&self) -> &str {
        &self.denom
    }

    pub fn amount(&self) -> u128 {
        self.amount
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// A copy of this amount with the same denomination and a new quantity.
    pub fn with_amount(&self, amount: u128) -> Self {
        Self::new(self.denom.clone(), amount)
    }

    /// Check that the denomination is well-formed: 3-16 lowercase ascii
    /// letters.
    pub fn validate(&self) -> Result<(), AmountError> {
        let len = self.denom.len();
        if !(3..=16).contains(&len) || !self.denom.bytes().all(|b| b.is_ascii_lowercase()) {
            return Err(AmountError::InvalidDenom(self.denom.clone()));
        }
        Ok(())
    }

    /// `None` on overflow or denomination mismatch.
    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        if self.denom != other.denom {
            return None;
        }
        self.amount
            .checked_add(other.amount)
            .map(|raw| self.with_amount(raw))
    }

    /// `None` on underflow or denomination mismatch.
    pub fn checked_sub(&self, other: &Self) -> Option<Self> {
        if self.denom != other.denom {
            return None;
        }
        self.amount
            .checked_sub(other.amount)
            .map(|raw| self.with_amount(raw))
    }

    /// Whether `self < other`, comparing quantities of the same denomination.
    /// Mismatched denominations compare as not-less.
    pub fn lt(&self, other: &Self) -> bool {
        self.denom == other.denom && self.amount < other.amount
    }

    /// Whether `self >= other` in the same denomination.
    pub fn gte(&self, other: &Self) -> bool {
        self.denom == other.denom && self.amount >= other.amount
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_add_same_denom() {
        let a = TokenAmount::new("uplg", 10);
        let b = TokenAmount::new("uplg", 32);
        assert_eq!(a.checked_add(&b), Some(TokenAmount::new("uplg", 42)));
    }

    #[test]
    fn checked_ops_refuse_denom_mismatch() {
        let a = TokenAmount::new("uplg", 10);
        let b = TokenAmount::new("other", 1);
        assert_eq!(a.checked_add(&b), None);
        assert_eq!(a.checked_sub(&b), None);
    }

    #[test]
    fn checked_sub_underflow_is_none() {
        let a = TokenAmount::new("uplg", 10);
        let b = TokenAmount::new("uplg", 11);
        assert_eq!(a.checked_sub(&b), None);
    }

    #[test]
    fn checked_add_overflow_is_none() {
        let a = TokenAmount::new("uplg", u128::MAX);
        let b = TokenAmount::new("uplg", 1);
        assert_eq!(a.checked_add(&b), None);
    }

    #[test]
    fn validate_denom() {
        assert!(TokenAmount::new("uplg", 1).validate().is_ok());
        assert!(TokenAmount::new("up", 1).validate().is_err());
        assert!(TokenAmount::new("UPLG", 1).validate().is_err());
        assert!(TokenAmount::new("uplg9", 1).validate().is_err());
    }

    #[test]
    fn ordering_helpers() {
        let small = TokenAmount::new("uplg", 1);
        let big = TokenAmount::new("uplg", 2);
        assert!(small.lt(&big));
        assert!(big.gte(&small));
        assert!(big.gte(&big));
        assert!(!small.lt(&TokenAmount::new("other", 100)));
    }

    #[test]
    fn display_concatenates_denom() {
        assert_eq!(TokenAmount::new("uplg", 1500).to_string(), "1500uplg");
    }
}
