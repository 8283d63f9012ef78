//! Reversible key codec for the delegation indices.
//!
//! A delegation is keyed by `(provider, delegator, chain-id)`, joined with
//! a separator that cannot occur in any component: provider tokens and
//! delegator addresses are prefix-checked alphanumerics, and chain ids are
//! registry-defined tokens without whitespace. Provider first and chain id
//! last makes both scans the ledger needs contiguous ranges: "everything
//! under a provider" and "every chain for a (provider, delegator) pair".

use crate::error::StoreError;
use pledge_types::{AccountAddress, StakeTarget};

const SEPARATOR: char = ' ';

/// The decoded components of a delegation index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DelegationKey {
    pub provider_token: String,
    pub delegator: AccountAddress,
    pub chain_id: String,
}

impl DelegationKey {
    pub fn new(target: &StakeTarget, delegator: &AccountAddress, chain_id: &str) -> Self {
        Self {
            provider_token: target.key_token().to_string(),
            delegator: delegator.clone(),
            chain_id: chain_id.to_string(),
        }
    }

    /// The stake target this key points at.
    pub fn target(&self) -> StakeTarget {
        StakeTarget::from_key_token(&self.provider_token)
    }

    pub fn encode(&self) -> String {
        format!(
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            self.provider_token,
            self.delegator.as_str(),
            self.chain_id
        )
    }

    /// Recover the components of an encoded delegation index. Used for
    /// diagnostics when a scanned index turns out to have no live entry.
    pub fn decode(index: &str) -> Result<Self, StoreError> {
        let mut parts = index.splitn(3, SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(provider), Some(delegator), Some(chain_id)) if !provider.is_empty() => {
                Ok(Self {
                    provider_token: provider.to_string(),
                    delegator: AccountAddress::new_unchecked(delegator),
                    chain_id: chain_id.to_string(),
                })
            }
            _ => Err(StoreError::MalformedKey(index.to_string())),
        }
    }
}

/// Prefix covering every delegation aimed at `target`, across all
/// delegators and chains.
pub fn provider_prefix(target: &StakeTarget) -> String {
    format!("{}{SEPARATOR}", target.key_token())
}

/// Prefix covering every chain of one `(target, delegator)` pair.
pub fn provider_delegator_prefix(target: &StakeTarget, delegator: &AccountAddress) -> String {
    format!(
        "{}{SEPARATOR}{}{SEPARATOR}",
        target.key_token(),
        delegator.as_str()
    )
}

/// Index of a delegator's provider set in the delegator-index store.
pub fn delegator_key(delegator: &AccountAddress) -> String {
    delegator.as_str().to_string()
}
