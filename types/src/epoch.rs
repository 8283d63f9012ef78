//! Logical time units: epochs and block heights.
//!
//! An epoch is a discrete boundary at which ledger changes become
//! effective. Operations always land at the *next* epoch boundary, never
//! immediately; reads resolve against an explicit epoch.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A logical epoch number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Epoch(u64);

impl Epoch {
    pub const ZERO: Self = Self(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// The epoch immediately after this one.
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// The epoch immediately before this one (saturating at zero).
    pub fn prev(&self) -> Self {
        Self(self.0.saturating_sub(1))
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epoch {}", self.0)
    }
}

/// A chain block height, used only by the unbonding-hold duration helpers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockHeight(u64);

impl BlockHeight {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block {}", self.0)
    }
}
