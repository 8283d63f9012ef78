//! Nullable stake registry — in-memory stake entries plus call recording.

use pledge_ledger::{PositionToken, StakeEntry, StakeRegistry};
use pledge_types::{AccountAddress, BlockHeight};
use std::sync::Mutex;

/// An in-memory stake registry for testing.
///
/// Entries are held in a vector; the vector index doubles as the position
/// token, mirroring how the real registry hands out slot handles. The
/// unbonding-hold duration queries are counted so tests can assert which
/// operations consulted them.
pub struct NullStakeRegistry {
    entries: Mutex<Vec<(String, StakeEntry)>>,
    hold_blocks: u64,
    hold_blocks_static: u64,
    hold_queries: Mutex<u64>,
}

impl NullStakeRegistry {
    pub fn new(hold_blocks: u64, hold_blocks_static: u64) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            hold_blocks,
            hold_blocks_static,
            hold_queries: Mutex::new(0),
        }
    }

    /// Seed or replace the stake entry of a `(chain, provider)` pair.
    pub fn set_stake_entry(&self, chain_id: &str, entry: StakeEntry) {
        let mut entries = self.entries.lock().unwrap();
        match entries
            .iter_mut()
            .find(|(chain, existing)| chain == chain_id && existing.provider == entry.provider)
        {
            Some(slot) => slot.1 = entry,
            None => entries.push((chain_id.to_string(), entry)),
        }
    }

    /// Inspect a seeded entry without going through the trait.
    pub fn stake_entry(&self, chain_id: &str, provider: &AccountAddress) -> Option<StakeEntry> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .find(|(chain, entry)| chain == chain_id && entry.provider == *provider)
            .map(|(_, entry)| entry.clone())
    }

    /// How many times either unbonding-hold duration was queried.
    pub fn hold_query_count(&self) -> u64 {
        *self.hold_queries.lock().unwrap()
    }
}

impl Default for NullStakeRegistry {
    fn default() -> Self {
        Self::new(210, 610)
    }
}

impl StakeRegistry for NullStakeRegistry {
    fn current_stake_entry(
        &self,
        chain_id: &str,
        provider: &AccountAddress,
    ) -> Option<(StakeEntry, PositionToken)> {
        let entries = self.entries.lock().unwrap();
        entries
            .iter()
            .position(|(chain, entry)| chain == chain_id && entry.provider == *provider)
            .map(|position| (entries[position].1.clone(), position as PositionToken))
    }

    fn modify_stake_entry(&self, chain_id: &str, entry: StakeEntry, position: PositionToken) {
        let mut entries = self.entries.lock().unwrap();
        if let Some(slot) = entries.get_mut(position as usize) {
            *slot = (chain_id.to_string(), entry);
        }
    }

    fn unstake_hold_blocks(&self, _block: BlockHeight) -> u64 {
        *self.hold_queries.lock().unwrap() += 1;
        self.hold_blocks
    }

    fn unstake_hold_blocks_static(&self, _block: BlockHeight) -> u64 {
        *self.hold_queries.lock().unwrap() += 1;
        self.hold_blocks_static
    }
}
