//! Ledger-specific errors.

use pledge_store::StoreError;
use pledge_types::{AccountAddress, AddressError, AmountError, TokenAmount};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid {role} address: {source}")]
    InvalidAddress {
        role: &'static str,
        #[source]
        source: AddressError,
    },

    #[error("chain id {0:?} contains reserved characters")]
    InvalidChainId(String),

    #[error(transparent)]
    InvalidAmount(#[from] AmountError),

    #[error("delegation not found: {index}")]
    DelegationNotFound { index: String },

    #[error("insufficient delegation: requested {requested}, available {available}")]
    InsufficientDelegation {
        requested: TokenAmount,
        available: TokenAmount,
    },

    #[error("provider {provider} is not staked on chain {chain_id:?}")]
    ProviderNotStaked {
        provider: AccountAddress,
        chain_id: String,
    },

    #[error("insufficient stake-entry funds: subtracting {requested} from {available}")]
    InsufficientStakeFunds {
        requested: TokenAmount,
        available: TokenAmount,
    },

    #[error("provider self-stake would drop below the chain minimum {min_stake}")]
    BelowMinStake { min_stake: TokenAmount },

    #[error("arithmetic overflow while updating {context}")]
    Overflow { context: &'static str },

    /// A broken invariant between the co-maintained stores, or a logic
    /// bug. Logged at the highest severity at the detection site; callers
    /// treat it as "should never happen in practice".
    #[error("critical: {reason}")]
    Critical { reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LedgerError {
    /// Whether this error signals a broken cross-store invariant rather
    /// than a recoverable validation failure.
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Critical { .. })
    }
}
