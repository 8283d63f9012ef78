//! Nullable validator-staking bridge.

use pledge_ledger::{ValidatorDelegation, ValidatorInfo, ValidatorStakingBridge};
use pledge_types::AccountAddress;
use std::collections::HashMap;
use std::sync::Mutex;

/// An in-memory view of the validator-staking subsystem for testing the
/// delegator-balance reconciliation check.
#[derive(Default)]
pub struct NullValidatorStaking {
    delegations: Mutex<HashMap<String, Vec<ValidatorDelegation>>>,
    validators: Mutex<HashMap<String, ValidatorInfo>>,
}

impl NullValidatorStaking {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a share-denominated delegation for `delegator`.
    pub fn add_delegation(&self, delegator: &AccountAddress, validator: &str, shares: u128) {
        self.delegations
            .lock()
            .unwrap()
            .entry(delegator.as_str().to_string())
            .or_default()
            .push(ValidatorDelegation {
                validator: validator.to_string(),
                shares,
            });
    }

    /// Seed a validator's token/share exchange state.
    pub fn set_validator(&self, address: &str, tokens: u128, delegator_shares: u128) {
        self.validators.lock().unwrap().insert(
            address.to_string(),
            ValidatorInfo {
                tokens,
                delegator_shares,
            },
        );
    }
}

impl ValidatorStakingBridge for NullValidatorStaking {
    fn delegator_delegations(&self, delegator: &AccountAddress) -> Vec<ValidatorDelegation> {
        self.delegations
            .lock()
            .unwrap()
            .get(delegator.as_str())
            .cloned()
            .unwrap_or_default()
    }

    fn validator(&self, address: &str) -> Option<ValidatorInfo> {
        self.validators.lock().unwrap().get(address).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_delegations_round_trip() {
        let bridge = NullValidatorStaking::new();
        let alice = AccountAddress::parse("plg_alice").unwrap();
        bridge.add_delegation(&alice, "val1", 100);
        bridge.add_delegation(&alice, "val2", 50);
        bridge.set_validator("val1", 1000, 1000);

        let delegations = bridge.delegator_delegations(&alice);
        assert_eq!(delegations.len(), 2);
        assert_eq!(bridge.validator("val1").unwrap().tokens, 1000);
        assert!(bridge.validator("val3").is_none());
    }
}
