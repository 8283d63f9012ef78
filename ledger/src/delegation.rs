//! The two record types persisted in the versioned stores.

use pledge_types::{AccountAddress, StakeTarget, TokenAmount};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A delegator's committed amount to one stake target on one chain.
///
/// Exists only while the amount is positive: an entry that reaches zero is
/// tombstoned, never persisted as zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Delegation {
    pub delegator: AccountAddress,
    pub target: StakeTarget,
    pub chain_id: String,
    pub amount: TokenAmount,
}

impl Delegation {
    /// A fresh zero-amount delegation, about to receive its first increase.
    pub fn new(
        delegator: AccountAddress,
        target: StakeTarget,
        chain_id: impl Into<String>,
        denom: impl Into<String>,
    ) -> Self {
        Self {
            delegator,
            target,
            chain_id: chain_id.into(),
            amount: TokenAmount::zero(denom),
        }
    }

    /// `None` on overflow or denomination mismatch.
    pub fn add(&mut self, amount: &TokenAmount) -> Option<()> {
        self.amount = self.amount.checked_add(amount)?;
        Some(())
    }

    /// `None` on underflow or denomination mismatch.
    pub fn sub(&mut self, amount: &TokenAmount) -> Option<()> {
        self.amount = self.amount.checked_sub(amount)?;
        Some(())
    }
}

/// The set of stake targets a delegator currently has nonzero delegations
/// with, stored under the delegator's address.
///
/// Kept strictly in lock-step with the delegation entries: a target
/// appears here iff some chain holds a nonzero delegation for it. The
/// record itself is tombstoned once the set empties.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSet {
    providers: BTreeSet<String>,
}

impl ProviderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, token: &str) {
        self.providers.insert(token.to_string());
    }

    pub fn remove(&mut self, token: &str) {
        self.providers.remove(token);
    }

    pub fn contains(&self, token: &str) -> bool {
        self.providers.contains(token)
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// The member targets, in stable (lexicographic) order.
    pub fn targets(&self) -> Vec<StakeTarget> {
        self.providers
            .iter()
            .map(|token| StakeTarget::from_key_token(token))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> AccountAddress {
        AccountAddress::parse(s).unwrap()
    }

    #[test]
    fn delegation_add_and_sub() {
        let mut d = Delegation::new(
            addr("plg_alice"),
            StakeTarget::Provider(addr("plg_bob")),
            "chain",
            "uplg",
        );
        assert!(d.amount.is_zero());
        d.add(&TokenAmount::new("uplg", 100)).unwrap();
        d.sub(&TokenAmount::new("uplg", 40)).unwrap();
        assert_eq!(d.amount, TokenAmount::new("uplg", 60));
    }

    #[test]
    fn delegation_sub_below_zero_fails() {
        let mut d = Delegation::new(addr("plg_alice"), StakeTarget::Unplaced, "", "uplg");
        d.add(&TokenAmount::new("uplg", 5)).unwrap();
        assert!(d.sub(&TokenAmount::new("uplg", 6)).is_none());
    }

    #[test]
    fn delegation_refuses_mixed_denoms() {
        let mut d = Delegation::new(addr("plg_alice"), StakeTarget::Unplaced, "", "uplg");
        assert!(d.add(&TokenAmount::new("other", 5)).is_none());
    }

    #[test]
    fn provider_set_membership() {
        let mut set = ProviderSet::new();
        set.add("plg_bob");
        set.add("plg_bob");
        set.add(StakeTarget::UNPLACED_TOKEN);
        assert_eq!(set.len(), 2);
        assert!(set.contains("plg_bob"));

        set.remove("plg_bob");
        assert!(!set.contains("plg_bob"));
        assert!(!set.is_empty());
        set.remove(StakeTarget::UNPLACED_TOKEN);
        assert!(set.is_empty());
    }

    #[test]
    fn provider_set_targets_round_trip() {
        let mut set = ProviderSet::new();
        set.add("plg_bob");
        set.add(StakeTarget::UNPLACED_TOKEN);
        let targets = set.targets();
        assert!(targets.contains(&StakeTarget::Provider(addr("plg_bob"))));
        assert!(targets.contains(&StakeTarget::Unplaced));
    }
}
