//! Epoch-delayed delegation bookkeeping.
//!
//! Tracks how funds are committed by delegators to providers on a
//! per-chain basis. Changes never apply immediately: every mutation lands
//! at the next epoch boundary, so reads at the current epoch keep seeing
//! the pre-change state until the boundary passes.
//!
//! Two co-maintained indices back the ledger — delegations keyed by
//! `(provider, delegator, chain)` and a per-delegator provider set — and
//! every mutation keeps them in lock-step while propagating aggregate
//! changes into the external stake registry.

pub mod allocator;
pub mod delegation;
pub mod error;
pub mod ledger;
pub mod params;
pub mod registry;

pub use delegation::{Delegation, ProviderSet};
pub use error::LedgerError;
pub use ledger::DelegationLedger;
pub use params::LedgerParams;
pub use registry::{
    EpochSource, PositionToken, ProviderKind, SpecInfo, SpecRegistry, StakeEntry, StakeRegistry,
    ValidatorDelegation, ValidatorInfo, ValidatorStakingBridge,
};
