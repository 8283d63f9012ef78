//! Ledger policy parameters.

use serde::{Deserialize, Serialize};

/// Policy knobs for the delegation ledger.
///
/// Both default to `false`, which reproduces the historical behavior of
/// the uniform unbonding path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerParams {
    /// Whether the per-delegation unbonds issued by
    /// [`crate::DelegationLedger::unbond_uniform_delegators`] request
    /// full-unstake semantics. Off by default: a provider drained by a
    /// forced withdrawal still trips the min-stake floor instead of
    /// silently deregistering.
    #[serde(default)]
    pub uniform_unbond_full_unstake: bool,

    /// Opt into the all-or-nothing variant of uniform unbonding: snapshot
    /// both stores and the touched stake entries before the sequence and
    /// restore them if any per-delegation unbond fails. Off by default,
    /// which preserves the documented partial-failure behavior.
    #[serde(default)]
    pub atomic_uniform_unbond: bool,
}
