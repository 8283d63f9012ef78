//! Interfaces to the external collaborators the ledger depends on.
//!
//! The ledger never owns the stake entries, the chain-spec registry, the
//! epoch schedule or the validator-staking subsystem — it reaches them
//! through these traits, injected at construction. Implementations use
//! interior mutability where they mutate; all methods are `&self`.

use pledge_types::{AccountAddress, BlockHeight, Epoch, TokenAmount};
use serde::{Deserialize, Serialize};

/// Source of the logical clock: which epoch upcoming writes land at.
pub trait EpochSource {
    /// The next epoch boundary — the first one strictly after the current
    /// epoch. All ledger mutations take effect there.
    fn current_next_epoch(&self) -> Epoch;

    /// The current chain block height.
    fn current_block(&self) -> BlockHeight;
}

/// Opaque handle to a stake entry's storage slot, returned by a lookup and
/// passed back verbatim when modifying the same entry.
pub type PositionToken = u64;

/// A provider's aggregate stake on one chain: its own stake plus the total
/// delegated to it by third parties.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StakeEntry {
    pub provider: AccountAddress,
    pub self_stake: TokenAmount,
    pub delegate_total: TokenAmount,
}

/// The epoch-indexed provider registry owning the stake entries.
pub trait StakeRegistry {
    /// The provider's current stake entry on `chain_id`, with the position
    /// token to pass to [`StakeRegistry::modify_stake_entry`].
    fn current_stake_entry(
        &self,
        chain_id: &str,
        provider: &AccountAddress,
    ) -> Option<(StakeEntry, PositionToken)>;

    /// Replace the stake entry at `position` with `entry`.
    fn modify_stake_entry(&self, chain_id: &str, entry: StakeEntry, position: PositionToken);

    /// Unbonding-hold duration, in blocks, for dynamic-spec providers.
    fn unstake_hold_blocks(&self, block: BlockHeight) -> u64;

    /// Unbonding-hold duration, in blocks, for static-spec providers.
    fn unstake_hold_blocks_static(&self, block: BlockHeight) -> u64;
}

/// How a chain's providers are paired, which picks the unbonding-hold
/// duration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderKind {
    Dynamic,
    Static,
}

/// The subset of a chain spec the ledger cares about.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpecInfo {
    /// Floor a provider's self-stake may not drop below, except on a full
    /// unstake.
    pub min_stake_provider: TokenAmount,
}

/// The chain-specification registry.
pub trait SpecRegistry {
    /// `Some(kind)` when `chain_id` names a registered, active spec.
    fn is_spec_active(&self, chain_id: &str) -> Option<ProviderKind>;

    /// The spec parameters for `chain_id`, if registered.
    fn spec(&self, chain_id: &str) -> Option<SpecInfo>;
}

/// One delegation recorded in the validator-staking subsystem, denominated
/// in validator shares.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorDelegation {
    pub validator: String,
    pub shares: u128,
}

/// A validator's token/share exchange state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorInfo {
    pub tokens: u128,
    pub delegator_shares: u128,
}

impl ValidatorInfo {
    /// Convert a share quantity into tokens at this validator's exchange
    /// rate, truncating. `None` on multiplication overflow.
    pub fn tokens_from_shares(&self, shares: u128) -> Option<u128> {
        if self.delegator_shares == 0 {
            return Some(0);
        }
        self.tokens
            .checked_mul(shares)
            .map(|product| product / self.delegator_shares)
    }
}

/// Read-only view into the validator-staking subsystem, used solely by the
/// delegator-balance reconciliation check.
pub trait ValidatorStakingBridge {
    fn delegator_delegations(&self, delegator: &AccountAddress) -> Vec<ValidatorDelegation>;

    fn validator(&self, address: &str) -> Option<ValidatorInfo>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_from_shares_truncates() {
        let v = ValidatorInfo {
            tokens: 100,
            delegator_shares: 3,
        };
        assert_eq!(v.tokens_from_shares(1), Some(33));
        assert_eq!(v.tokens_from_shares(3), Some(100));
    }

    #[test]
    fn tokens_from_shares_zero_shares_pool() {
        let v = ValidatorInfo {
            tokens: 100,
            delegator_shares: 0,
        };
        assert_eq!(v.tokens_from_shares(10), Some(0));
    }

    #[test]
    fn tokens_from_shares_overflow_is_none() {
        let v = ValidatorInfo {
            tokens: u128::MAX,
            delegator_shares: 1,
        };
        assert_eq!(v.tokens_from_shares(2), None);
    }
}
