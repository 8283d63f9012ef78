//! Stake targets and stake kinds.
//!
//! A delegation is aimed at a [`StakeTarget`]: either a concrete provider,
//! or the *unplaced* bucket — funds committed but not yet assigned to any
//! provider. The unplaced bucket has no chain and no stake entry.

use crate::address::AccountAddress;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a delegation's funds are committed.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StakeTarget {
    /// Funds not assigned to any provider.
    Unplaced,
    /// Funds committed to a specific provider.
    Provider(AccountAddress),
}

impl StakeTarget {
    /// Reserved key token for the unplaced bucket. Can never collide with a
    /// provider address: those always carry the `plg_` prefix.
    pub const UNPLACED_TOKEN: &'static str = "unplaced";

    /// The chain id of the unplaced bucket.
    pub const UNPLACED_CHAIN_ID: &'static str = "";

    /// The token this target contributes to store keys and index sets.
    pub fn key_token(&self) -> &str {
        match self {
            Self::Unplaced => Self::UNPLACED_TOKEN,
            Self::Provider(addr) => addr.as_str(),
        }
    }

    /// Reconstruct a target from a key token previously produced by
    /// [`StakeTarget::key_token`].
    pub fn from_key_token(token: &str) -> Self {
        if token == Self::UNPLACED_TOKEN {
            Self::Unplaced
        } else {
            Self::Provider(AccountAddress::new_unchecked(token))
        }
    }

    pub fn is_unplaced(&self) -> bool {
        matches!(self, Self::Unplaced)
    }

    /// The provider address, if this target names one.
    pub fn provider(&self) -> Option<&AccountAddress> {
        match self {
            Self::Unplaced => None,
            Self::Provider(addr) => Some(addr),
        }
    }
}

impl fmt::Display for StakeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key_token())
    }
}

/// Whether a stake-entry mutation moves self-stake or delegated stake.
///
/// Decided once per operation from `delegator == provider` and threaded
/// through, instead of re-comparing addresses at every use site.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StakeKind {
    /// The provider delegating to itself.
    SelfStake,
    /// A third-party delegator.
    Delegated,
}

impl StakeKind {
    /// Classify a delegation from the pair of parties involved.
    pub fn classify(delegator: &AccountAddress, provider: &AccountAddress) -> Self {
        if delegator == provider {
            Self::SelfStake
        } else {
            Self::Delegated
        }
    }
}
