//! The delegation ledger service object.
//!
//! Owns the two epoch-versioned stores (delegations by provider, provider
//! sets by delegator) and coordinates every mutation across them and the
//! external stake registry. Constructed once with all collaborators passed
//! in explicitly.
//!
//! Every mutation lands at the next epoch boundary: reads resolved at the
//! current epoch never observe a change made in the same logical step.

use crate::allocator;
use crate::delegation::{Delegation, ProviderSet};
use crate::error::LedgerError;
use crate::params::LedgerParams;
use crate::registry::{
    EpochSource, ProviderKind, SpecRegistry, StakeRegistry, ValidatorStakingBridge,
};
use pledge_store::{keys, DelegationKey, StoreError, VersionedStore};
use pledge_types::{AccountAddress, BlockHeight, Epoch, StakeKind, StakeTarget, TokenAmount};

/// Meta-store key under which callers persist the ledger state snapshot.
const LEDGER_STATE_META_KEY: &str = "delegation_ledger_state";

/// Epoch-delayed delegation bookkeeping over two co-maintained indices.
pub struct DelegationLedger<E, S, C, V> {
    /// Delegations keyed by `(provider, delegator, chain)`.
    delegations: VersionedStore<Delegation>,
    /// Provider sets keyed by delegator.
    delegators: VersionedStore<ProviderSet>,
    epochs: E,
    stakes: S,
    specs: C,
    validators: V,
    params: LedgerParams,
}

/// Build a critical error, logging it at the highest severity. These mark
/// broken invariants between the co-maintained stores, not recoverable
/// validation failures.
fn critical(reason: String) -> LedgerError {
    tracing::error!(%reason, "delegation ledger invariant violated");
    LedgerError::Critical { reason }
}

fn validate_delegator(delegator: &AccountAddress) -> Result<(), LedgerError> {
    AccountAddress::parse(delegator.as_str())
        .map(|_| ())
        .map_err(|source| LedgerError::InvalidAddress {
            role: "delegator",
            source,
        })
}

fn validate_target(target: &StakeTarget) -> Result<(), LedgerError> {
    if let Some(provider) = target.provider() {
        AccountAddress::parse(provider.as_str()).map_err(|source| LedgerError::InvalidAddress {
            role: "provider",
            source,
        })?;
    }
    Ok(())
}

fn validate_chain_id(chain_id: &str) -> Result<(), LedgerError> {
    // The key codec joins components with a space.
    if chain_id.contains(' ') {
        return Err(LedgerError::InvalidChainId(chain_id.to_string()));
    }
    Ok(())
}

fn signed_diff(left: u128, right: u128) -> Result<i128, LedgerError> {
    let overflow = |_| LedgerError::Overflow {
        context: "balance difference",
    };
    if left >= right {
        i128::try_from(left - right).map_err(overflow)
    } else {
        i128::try_from(right - left).map(|d| -d).map_err(overflow)
    }
}

impl<E, S, C, V> DelegationLedger<E, S, C, V>
where
    E: EpochSource,
    S: StakeRegistry,
    C: SpecRegistry,
    V: ValidatorStakingBridge,
{
    pub fn new(epochs: E, stakes: S, specs: C, validators: V) -> Self {
        Self::with_params(epochs, stakes, specs, validators, LedgerParams::default())
    }

    pub fn with_params(
        epochs: E,
        stakes: S,
        specs: C,
        validators: V,
        params: LedgerParams,
    ) -> Self {
        Self {
            delegations: VersionedStore::new(),
            delegators: VersionedStore::new(),
            epochs,
            stakes,
            specs,
            validators,
            params,
        }
    }

    pub fn params(&self) -> &LedgerParams {
        &self.params
    }

    pub fn epochs(&self) -> &E {
        &self.epochs
    }

    pub fn stakes(&self) -> &S {
        &self.stakes
    }

    pub fn specs(&self) -> &C {
        &self.specs
    }

    pub fn validators(&self) -> &V {
        &self.validators
    }

    // ── Public operations ────────────────────────────────────────────────

    /// Commit `amount` from `delegator` to `target` on `chain_id`,
    /// effective at the next epoch. A zero amount is a no-op success.
    pub fn delegate(
        &mut self,
        delegator: &AccountAddress,
        target: &StakeTarget,
        chain_id: &str,
        amount: TokenAmount,
    ) -> Result<(), LedgerError> {
        validate_delegator(delegator)?;
        validate_target(target)?;
        validate_chain_id(chain_id)?;
        amount.validate()?;
        if amount.is_zero() {
            return Ok(());
        }

        let epoch = self.epochs.current_next_epoch();
        if let Err(err) = self.increase_delegation(delegator, target, chain_id, &amount, epoch) {
            tracing::warn!(%delegator, %target, chain_id, %amount, %err, "failed to increase delegation");
            return Err(err);
        }
        Ok(())
    }

    /// Move `amount` of `delegator`'s commitment from one target to
    /// another, both effective at the same next epoch. No tokens move and
    /// the unbonding hold is never consulted: the funds stay continuously
    /// committed.
    pub fn redelegate(
        &mut self,
        delegator: &AccountAddress,
        from: &StakeTarget,
        to: &StakeTarget,
        from_chain_id: &str,
        to_chain_id: &str,
        amount: TokenAmount,
    ) -> Result<(), LedgerError> {
        validate_delegator(delegator)?;
        validate_target(from)?;
        validate_target(to)?;
        validate_chain_id(from_chain_id)?;
        validate_chain_id(to_chain_id)?;
        amount.validate()?;
        if amount.is_zero() {
            return Ok(());
        }

        let epoch = self.epochs.current_next_epoch();
        if let Err(err) = self.increase_delegation(delegator, to, to_chain_id, &amount, epoch) {
            tracing::warn!(%delegator, %to, %amount, %err, "failed to increase delegation");
            return Err(err);
        }
        if let Err(err) =
            self.decrease_delegation(delegator, from, from_chain_id, &amount, epoch, false)
        {
            tracing::warn!(%delegator, %from, %amount, %err, "failed to decrease delegation");
            return Err(err);
        }
        Ok(())
    }

    /// Withdraw `amount` of `delegator`'s commitment to `target`,
    /// effective at the next epoch. Only ledger state changes here; the
    /// hold-then-release of the withdrawn funds belongs to an external
    /// collaborator.
    pub fn unbond(
        &mut self,
        delegator: &AccountAddress,
        target: &StakeTarget,
        chain_id: &str,
        amount: TokenAmount,
        is_full_unstake: bool,
    ) -> Result<(), LedgerError> {
        validate_delegator(delegator)?;
        validate_target(target)?;
        validate_chain_id(chain_id)?;
        amount.validate()?;
        if amount.is_zero() {
            return Ok(());
        }

        let epoch = self.epochs.current_next_epoch();
        if let Err(err) =
            self.decrease_delegation(delegator, target, chain_id, &amount, epoch, is_full_unstake)
        {
            tracing::warn!(%delegator, %target, chain_id, %amount, %err, "failed to decrease delegation");
            return Err(err);
        }
        Ok(())
    }

    /// Withdraw `total` from `delegator`'s aggregate stake, spread as
    /// evenly as possible with the smallest delegations drained first. The
    /// unplaced bucket, if present, is drained before anything else.
    ///
    /// Known limitation: each per-delegation withdrawal is an independent
    /// unbond, and completed ones are not reversed if a later one fails
    /// mid-sequence — unless [`LedgerParams::atomic_uniform_unbond`] is
    /// set, in which case both stores and the touched stake entries are
    /// restored on failure.
    pub fn unbond_uniform_delegators(
        &mut self,
        delegator: &AccountAddress,
        total: TokenAmount,
    ) -> Result<(), LedgerError> {
        validate_delegator(delegator)?;
        total.validate()?;
        if total.is_zero() {
            return Ok(());
        }

        let epoch = self.epochs.current_next_epoch();
        if self.params.atomic_uniform_unbond {
            self.unbond_uniform_atomic(delegator, total, epoch)
        } else {
            self.unbond_uniform_inner(delegator, total, epoch)
        }
    }

    // ── Read-only accessors ──────────────────────────────────────────────

    /// All stake targets `delegator` has nonzero delegations with, as of
    /// `epoch`. Empty when the delegator has none.
    pub fn delegator_providers(
        &self,
        delegator: &AccountAddress,
        epoch: Epoch,
    ) -> Result<Vec<StakeTarget>, LedgerError> {
        validate_delegator(delegator)?;
        let set = self
            .delegators
            .find(&keys::delegator_key(delegator), epoch)
            .unwrap_or_default();
        Ok(set.targets())
    }

    /// All delegations aimed at `target`, across delegators and chains, as
    /// of `epoch`.
    pub fn provider_delegations(
        &self,
        target: &StakeTarget,
        epoch: Epoch,
    ) -> Result<Vec<Delegation>, LedgerError> {
        validate_target(target)?;
        Ok(self.collect_delegations(&keys::provider_prefix(target), epoch))
    }

    /// The delegation of `delegator` to `target` on `chain_id`, as of
    /// `epoch`.
    pub fn delegation(
        &self,
        delegator: &AccountAddress,
        target: &StakeTarget,
        chain_id: &str,
        epoch: Epoch,
    ) -> Option<Delegation> {
        let index = DelegationKey::new(target, delegator, chain_id).encode();
        self.delegations.find(&index, epoch)
    }

    /// Every chain's delegation of `delegator` to `target`, as of `epoch`.
    pub fn provider_delegator_delegations(
        &self,
        delegator: &AccountAddress,
        target: &StakeTarget,
        epoch: Epoch,
    ) -> Vec<Delegation> {
        self.collect_delegations(&keys::provider_delegator_prefix(target, delegator), epoch)
    }

    /// Reconciliation check: the validator-staking subsystem's total
    /// delegated amount for `delegator` minus this ledger's total, signed.
    /// Read-only; used by external auditing logic.
    pub fn verify_delegator_balance(
        &self,
        delegator: &AccountAddress,
    ) -> Result<i128, LedgerError> {
        let epoch = self.epochs.current_next_epoch();

        let mut ledger_total: u128 = 0;
        for target in self.delegator_providers(delegator, epoch)? {
            for delegation in self.provider_delegator_delegations(delegator, &target, epoch) {
                ledger_total = ledger_total
                    .checked_add(delegation.amount.amount())
                    .ok_or(LedgerError::Overflow {
                        context: "ledger delegation total",
                    })?;
            }
        }

        let mut validator_total: u128 = 0;
        for entry in self.validators.delegator_delegations(delegator) {
            let info = self.validators.validator(&entry.validator).ok_or_else(|| {
                critical(format!(
                    "validator {} missing for recorded delegation of {delegator}",
                    entry.validator
                ))
            })?;
            let tokens = info
                .tokens_from_shares(entry.shares)
                .ok_or(LedgerError::Overflow {
                    context: "validator share conversion",
                })?;
            validator_total =
                validator_total
                    .checked_add(tokens)
                    .ok_or(LedgerError::Overflow {
                        context: "validator delegation total",
                    })?;
        }

        signed_diff(validator_total, ledger_total)
    }

    /// The unbonding-hold duration for withdrawals on `chain_id`, in
    /// blocks. Static-provider chains use the longer static duration; an
    /// unknown chain is a logged invariant break that falls through to the
    /// dynamic duration.
    pub fn unbond_hold_blocks(&self, chain_id: &str, block: BlockHeight) -> u64 {
        match self.specs.is_spec_active(chain_id) {
            Some(ProviderKind::Static) => self.stakes.unstake_hold_blocks_static(block),
            Some(ProviderKind::Dynamic) => self.stakes.unstake_hold_blocks(block),
            None => {
                tracing::error!(chain_id, "no active spec for chain");
                self.stakes.unstake_hold_blocks(block)
            }
        }
    }

    // ── Persistence ──────────────────────────────────────────────────────

    /// Serialize both stores, full version history included, for
    /// persistence under [`DelegationLedger::meta_key`].
    pub fn save_state(&self) -> Result<Vec<u8>, StoreError> {
        bincode::serialize(&(&self.delegations, &self.delegators))
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Restore both stores from a snapshot produced by
    /// [`DelegationLedger::save_state`].
    pub fn load_state(&mut self, data: &[u8]) -> Result<(), StoreError> {
        let (delegations, delegators) =
            bincode::deserialize(data).map_err(|e| StoreError::Corruption(e.to_string()))?;
        self.delegations = delegations;
        self.delegators = delegators;
        Ok(())
    }

    /// The meta-store key used for ledger state persistence.
    pub fn meta_key() -> &'static str {
        LEDGER_STATE_META_KEY
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn collect_delegations(&self, prefix: &str, epoch: Epoch) -> Vec<Delegation> {
        let mut delegations = Vec::new();
        for index in self.delegations.scan_prefix(prefix) {
            match self.delegations.find(&index, epoch) {
                Some(delegation) => delegations.push(delegation),
                None => {
                    // Live index with no entry at the query epoch: either
                    // the epoch predates it, or the indices desynchronized.
                    match DelegationKey::decode(&index) {
                        Ok(key) => tracing::error!(
                            provider = %key.provider_token,
                            delegator = %key.delegator,
                            chain_id = %key.chain_id,
                            %epoch,
                            "delegation index has no entry at query epoch"
                        ),
                        Err(_) => tracing::error!(%index, %epoch, "undecodable delegation index"),
                    }
                }
            }
        }
        delegations
    }

    /// Find-or-create both entries at `epoch`, add `amount`, and push the
    /// aggregate into the provider's stake entry. Sub-step failures after
    /// the first append are critical: there is no cross-store transaction
    /// to roll back.
    fn increase_delegation(
        &mut self,
        delegator: &AccountAddress,
        target: &StakeTarget,
        chain_id: &str,
        amount: &TokenAmount,
        epoch: Epoch,
    ) -> Result<(), LedgerError> {
        let index = DelegationKey::new(target, delegator, chain_id).encode();
        let mut entry = self.delegations.find(&index, epoch).unwrap_or_else(|| {
            Delegation::new(delegator.clone(), target.clone(), chain_id, amount.denom())
        });
        entry.add(amount).ok_or(LedgerError::Overflow {
            context: "delegation amount",
        })?;
        self.delegations
            .append(&index, epoch, entry)
            .map_err(|e| critical(format!("append delegation entry {index}: {e}")))?;

        let delegator_index = keys::delegator_key(delegator);
        let mut set = self
            .delegators
            .find(&delegator_index, epoch)
            .unwrap_or_default();
        set.add(target.key_token());
        self.delegators
            .append(&delegator_index, epoch, set)
            .map_err(|e| critical(format!("append delegator entry {delegator_index}: {e}")))?;

        if let Some(provider) = target.provider() {
            let kind = StakeKind::classify(delegator, provider);
            self.stake_entry_add(kind, provider, chain_id, amount)?;
        }

        Ok(())
    }

    /// Subtract `amount` at `epoch`, tombstoning the entry (and shrinking
    /// the provider set) when it reaches zero, and propagate into the
    /// stake entry.
    fn decrease_delegation(
        &mut self,
        delegator: &AccountAddress,
        target: &StakeTarget,
        chain_id: &str,
        amount: &TokenAmount,
        epoch: Epoch,
        is_full_unstake: bool,
    ) -> Result<(), LedgerError> {
        let index = DelegationKey::new(target, delegator, chain_id).encode();
        let mut entry =
            self.delegations
                .find(&index, epoch)
                .ok_or_else(|| LedgerError::DelegationNotFound {
                    index: index.clone(),
                })?;

        if !entry.amount.gte(amount) {
            return Err(LedgerError::InsufficientDelegation {
                requested: amount.clone(),
                available: entry.amount,
            });
        }
        entry.sub(amount).ok_or(LedgerError::Overflow {
            context: "delegation amount",
        })?;

        let now_zero = entry.amount.is_zero();
        if now_zero {
            self.delegations
                .del(&index, epoch)
                .map_err(|e| critical(format!("delete delegation entry {index}: {e}")))?;
        } else {
            self.delegations
                .append(&index, epoch, entry)
                .map_err(|e| critical(format!("append delegation entry {index}: {e}")))?;
        }

        // The delegation was found, so the delegator entry must exist.
        let delegator_index = keys::delegator_key(delegator);
        let mut set = self
            .delegators
            .find(&delegator_index, epoch)
            .ok_or_else(|| {
                critical(format!(
                    "delegator entry missing for existing delegation {index}"
                ))
            })?;

        // The target leaves the set only once no chain holds a nonzero
        // delegation for it anymore; the tombstone above already hides
        // this chain's entry at this epoch.
        if now_zero
            && self
                .provider_delegator_delegations(delegator, target, epoch)
                .is_empty()
        {
            set.remove(target.key_token());
            if set.is_empty() {
                self.delegators.del(&delegator_index, epoch).map_err(|e| {
                    critical(format!("delete delegator entry {delegator_index}: {e}"))
                })?;
            } else {
                self.delegators
                    .append(&delegator_index, epoch, set)
                    .map_err(|e| {
                        critical(format!("append delegator entry {delegator_index}: {e}"))
                    })?;
            }
        } else {
            set.add(target.key_token());
            self.delegators
                .append(&delegator_index, epoch, set)
                .map_err(|e| critical(format!("append delegator entry {delegator_index}: {e}")))?;
        }

        if let Some(provider) = target.provider() {
            let kind = StakeKind::classify(delegator, provider);
            self.stake_entry_sub(kind, provider, chain_id, amount, is_full_unstake)?;
        }

        Ok(())
    }

    fn stake_entry_add(
        &mut self,
        kind: StakeKind,
        provider: &AccountAddress,
        chain_id: &str,
        amount: &TokenAmount,
    ) -> Result<(), LedgerError> {
        let (mut entry, position) = self
            .stakes
            .current_stake_entry(chain_id, provider)
            .ok_or_else(|| LedgerError::ProviderNotStaked {
                provider: provider.clone(),
                chain_id: chain_id.to_string(),
            })?;

        if entry.provider != *provider {
            return Err(critical(format!(
                "stake entry address mismatch: asked {provider}, registry returned {}",
                entry.provider
            )));
        }

        match kind {
            StakeKind::SelfStake => {
                entry.self_stake =
                    entry
                        .self_stake
                        .checked_add(amount)
                        .ok_or(LedgerError::Overflow {
                            context: "provider self-stake",
                        })?;
            }
            StakeKind::Delegated => {
                entry.delegate_total =
                    entry
                        .delegate_total
                        .checked_add(amount)
                        .ok_or(LedgerError::Overflow {
                            context: "provider delegate-total",
                        })?;
            }
        }

        self.stakes.modify_stake_entry(chain_id, entry, position);
        Ok(())
    }

    fn stake_entry_sub(
        &mut self,
        kind: StakeKind,
        provider: &AccountAddress,
        chain_id: &str,
        amount: &TokenAmount,
        is_full_unstake: bool,
    ) -> Result<(), LedgerError> {
        // A provider that already left the registry has nothing to update.
        let Some((mut entry, position)) = self.stakes.current_stake_entry(chain_id, provider)
        else {
            return Ok(());
        };

        if entry.provider != *provider {
            return Err(critical(format!(
                "stake entry address mismatch: asked {provider}, registry returned {}",
                entry.provider
            )));
        }

        match kind {
            StakeKind::SelfStake => {
                entry.self_stake = entry.self_stake.checked_sub(amount).ok_or_else(|| {
                    LedgerError::InsufficientStakeFunds {
                        requested: amount.clone(),
                        available: entry.self_stake.clone(),
                    }
                })?;
                if !is_full_unstake {
                    let min_stake = self.min_stake(chain_id, amount.denom());
                    if entry.self_stake.lt(&min_stake) {
                        return Err(LedgerError::BelowMinStake { min_stake });
                    }
                }
            }
            StakeKind::Delegated => {
                entry.delegate_total = entry.delegate_total.checked_sub(amount).ok_or_else(|| {
                    LedgerError::InsufficientStakeFunds {
                        requested: amount.clone(),
                        available: entry.delegate_total.clone(),
                    }
                })?;
            }
        }

        self.stakes.modify_stake_entry(chain_id, entry, position);
        Ok(())
    }

    fn min_stake(&self, chain_id: &str, fallback_denom: &str) -> TokenAmount {
        match self.specs.spec(chain_id) {
            Some(info) => info.min_stake_provider,
            None => {
                tracing::error!(chain_id, "no spec registered for chain");
                TokenAmount::zero(fallback_denom)
            }
        }
    }

    fn unbond_uniform_inner(
        &mut self,
        delegator: &AccountAddress,
        mut remaining: TokenAmount,
        epoch: Epoch,
    ) -> Result<(), LedgerError> {
        let full_unstake = self.params.uniform_unbond_full_unstake;

        // The unplaced bucket goes first.
        if let Some(unplaced) = self.delegation(
            delegator,
            &StakeTarget::Unplaced,
            StakeTarget::UNPLACED_CHAIN_ID,
            epoch,
        ) {
            if unplaced.amount.gte(&remaining) {
                return self.unbond(
                    delegator,
                    &StakeTarget::Unplaced,
                    StakeTarget::UNPLACED_CHAIN_ID,
                    remaining,
                    full_unstake,
                );
            }
            let drained = unplaced.amount;
            self.unbond(
                delegator,
                &StakeTarget::Unplaced,
                StakeTarget::UNPLACED_CHAIN_ID,
                drained.clone(),
                full_unstake,
            )?;
            remaining = remaining
                .checked_sub(&drained)
                .ok_or(LedgerError::Overflow {
                    context: "uniform unbond remainder",
                })?;
        }

        let mut delegations = Vec::new();
        for target in self.delegator_providers(delegator, epoch)? {
            if target.is_unplaced() {
                continue;
            }
            delegations.extend(self.provider_delegator_delegations(delegator, &target, epoch));
        }
        delegations.sort_by_key(|d| d.amount.amount());

        if delegations.is_empty() {
            return Err(LedgerError::InsufficientDelegation {
                requested: remaining.clone(),
                available: remaining.with_amount(0),
            });
        }

        let amounts: Vec<u128> = delegations.iter().map(|d| d.amount.amount()).collect();
        let plan = allocator::uniform_shares(&amounts, remaining.amount());

        for (delegation, withdraw) in delegations.iter().zip(plan) {
            if withdraw == 0 {
                continue;
            }
            if let Err(err) = self.unbond(
                &delegation.delegator,
                &delegation.target,
                &delegation.chain_id,
                remaining.with_amount(withdraw),
                full_unstake,
            ) {
                tracing::warn!(
                    %delegator,
                    target = %delegation.target,
                    %err,
                    "uniform unbond failed mid-sequence; completed withdrawals stand"
                );
                return Err(err);
            }
        }

        Ok(())
    }

    /// All-or-nothing wrapper around the uniform unbond sequence.
    fn unbond_uniform_atomic(
        &mut self,
        delegator: &AccountAddress,
        total: TokenAmount,
        epoch: Epoch,
    ) -> Result<(), LedgerError> {
        let saved_delegations = self.delegations.clone();
        let saved_delegators = self.delegators.clone();

        let mut saved_entries = Vec::new();
        for target in self.delegator_providers(delegator, epoch)? {
            let Some(provider) = target.provider() else {
                continue;
            };
            for delegation in self.provider_delegator_delegations(delegator, &target, epoch) {
                if let Some((entry, position)) = self
                    .stakes
                    .current_stake_entry(&delegation.chain_id, provider)
                {
                    saved_entries.push((delegation.chain_id.clone(), entry, position));
                }
            }
        }

        match self.unbond_uniform_inner(delegator, total, epoch) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.delegations = saved_delegations;
                self.delegators = saved_delegators;
                for (chain_id, entry, position) in saved_entries {
                    self.stakes.modify_stake_entry(&chain_id, entry, position);
                }
                tracing::warn!(%delegator, %err, "uniform unbond rolled back");
                Err(err)
            }
        }
    }
}
