//! The epoch-versioned key-value primitive.
//!
//! Every index maps to a list of versions sorted ascending by the epoch
//! from which each becomes effective. Writing appends (or replaces the
//! version pending at the same epoch); deleting writes a tombstone.
//! Reading resolves the latest version whose effective epoch does not
//! exceed the query epoch, so a write effective at the next epoch is
//! invisible to reads at the current one.

use crate::error::StoreError;
use pledge_types::Epoch;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Bound;

/// A single committed version: a value, or a tombstone marking deletion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
enum Payload<R> {
    Value(R),
    Tombstone,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct VersionRecord<R> {
    effective: Epoch,
    payload: Payload<R>,
}

/// Epoch-indexed, append-only key-value store with soft deletes.
///
/// Generic over the record type. History is never discarded: versions
/// below the query epoch stay readable after later writes and deletes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VersionedStore<R> {
    entries: BTreeMap<String, Vec<VersionRecord<R>>>,
}

impl<R> Default for VersionedStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> VersionedStore<R> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Resolve `index` as of `epoch`: the latest version whose effective
    /// epoch is `<= epoch`. `None` if no such version exists or it is a
    /// tombstone.
    pub fn find(&self, index: &str, epoch: Epoch) -> Option<R>
    where
        R: Clone,
    {
        let versions = self.entries.get(index)?;
        let applicable = versions.iter().rev().find(|v| v.effective <= epoch)?;
        match &applicable.payload {
            Payload::Value(record) => Some(record.clone()),
            Payload::Tombstone => None,
        }
    }

    /// Commit a version of `index` effective from `epoch` onward.
    ///
    /// A second write at the same `(index, epoch)` replaces the pending
    /// version — there is never more than one version per epoch. Versions
    /// committed at other epochs are left untouched.
    pub fn append(&mut self, index: &str, epoch: Epoch, record: R) -> Result<(), StoreError> {
        self.put(index, epoch, Payload::Value(record));
        Ok(())
    }

    /// Write a tombstone effective at `epoch`: reads at `epoch` or later
    /// see nothing, reads below `epoch` are unaffected.
    pub fn del(&mut self, index: &str, epoch: Epoch) -> Result<(), StoreError> {
        self.put(index, epoch, Payload::Tombstone);
        Ok(())
    }

    fn put(&mut self, index: &str, epoch: Epoch, payload: Payload<R>) {
        let versions = self.entries.entry(index.to_string()).or_default();
        match versions.binary_search_by_key(&epoch, |v| v.effective) {
            Ok(pos) => versions[pos].payload = payload,
            Err(pos) => versions.insert(
                pos,
                VersionRecord {
                    effective: epoch,
                    payload,
                },
            ),
        }
    }

    /// All indices sharing `prefix`, in lexicographic order.
    ///
    /// Indices whose most recent version is a tombstone are omitted — they
    /// are no longer live, though `find` at earlier epochs still sees
    /// their history.
    pub fn scan_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(index, _)| index.starts_with(prefix))
            .filter(|(_, versions)| {
                !matches!(
                    versions.last().map(|v| &v.payload),
                    Some(Payload::Tombstone) | None
                )
            })
            .map(|(index, _)| index.clone())
            .collect()
    }

    /// Number of committed versions for `index`, tombstones included.
    pub fn version_count(&self, index: &str) -> usize {
        self.entries.get(index).map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<R: Serialize + DeserializeOwned> VersionedStore<R> {
    /// Serialize the full version history for persistence.
    pub fn save_state(&self) -> Result<Vec<u8>, StoreError> {
        bincode::serialize(&self.entries).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Restore a store from a snapshot produced by
    /// [`VersionedStore::save_state`].
    pub fn load_state(data: &[u8]) -> Result<Self, StoreError> {
        let entries =
            bincode::deserialize(data).map_err(|e| StoreError::Corruption(e.to_string()))?;
        Ok(Self { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> VersionedStore<u64> {
        VersionedStore::new()
    }

    #[test]
    fn find_before_any_version_is_none() {
        let mut s = store();
        s.append("k", Epoch::new(10), 1).unwrap();
        assert_eq!(s.find("k", Epoch::new(9)), None);
        assert_eq!(s.find("k", Epoch::new(10)), Some(1));
        assert_eq!(s.find("k", Epoch::new(11)), Some(1));
    }

    #[test]
    fn find_resolves_latest_applicable_version() {
        let mut s = store();
        s.append("k", Epoch::new(5), 1).unwrap();
        s.append("k", Epoch::new(10), 2).unwrap();
        s.append("k", Epoch::new(20), 3).unwrap();
        assert_eq!(s.find("k", Epoch::new(7)), Some(1));
        assert_eq!(s.find("k", Epoch::new(10)), Some(2));
        assert_eq!(s.find("k", Epoch::new(19)), Some(2));
        assert_eq!(s.find("k", Epoch::new(100)), Some(3));
    }

    #[test]
    fn same_epoch_write_replaces_pending_version() {
        let mut s = store();
        s.append("k", Epoch::new(5), 1).unwrap();
        s.append("k", Epoch::new(5), 2).unwrap();
        assert_eq!(s.find("k", Epoch::new(5)), Some(2));
        assert_eq!(s.version_count("k"), 1);
    }

    #[test]
    fn later_write_preserves_earlier_history() {
        let mut s = store();
        s.append("k", Epoch::new(5), 1).unwrap();
        s.append("k", Epoch::new(10), 2).unwrap();
        assert_eq!(s.find("k", Epoch::new(5)), Some(1));
        assert_eq!(s.version_count("k"), 2);
    }

    #[test]
    fn tombstone_hides_from_its_epoch_onward() {
        let mut s = store();
        s.append("k", Epoch::new(5), 1).unwrap();
        s.del("k", Epoch::new(10)).unwrap();
        assert_eq!(s.find("k", Epoch::new(9)), Some(1));
        assert_eq!(s.find("k", Epoch::new(10)), None);
        assert_eq!(s.find("k", Epoch::new(11)), None);
    }

    #[test]
    fn value_after_tombstone_revives_index() {
        let mut s = store();
        s.append("k", Epoch::new(5), 1).unwrap();
        s.del("k", Epoch::new(10)).unwrap();
        s.append("k", Epoch::new(15), 2).unwrap();
        assert_eq!(s.find("k", Epoch::new(12)), None);
        assert_eq!(s.find("k", Epoch::new(15)), Some(2));
        assert_eq!(s.scan_prefix("k"), vec!["k".to_string()]);
    }

    #[test]
    fn scan_prefix_is_lexicographic_and_skips_dead_indices() {
        let mut s = store();
        s.append("a 1", Epoch::new(1), 1).unwrap();
        s.append("a 2", Epoch::new(1), 2).unwrap();
        s.append("b 1", Epoch::new(1), 3).unwrap();
        s.del("a 2", Epoch::new(2)).unwrap();
        assert_eq!(s.scan_prefix("a "), vec!["a 1".to_string()]);
        assert_eq!(s.scan_prefix("b "), vec!["b 1".to_string()]);
        assert_eq!(s.scan_prefix(""), vec!["a 1".to_string(), "b 1".to_string()]);
        assert!(s.scan_prefix("c ").is_empty());
    }

    #[test]
    fn snapshot_round_trip_preserves_history() {
        let mut s = store();
        s.append("k", Epoch::new(5), 1).unwrap();
        s.del("k", Epoch::new(10)).unwrap();
        let bytes = s.save_state().unwrap();
        let restored = VersionedStore::<u64>::load_state(&bytes).unwrap();
        assert_eq!(restored.find("k", Epoch::new(7)), Some(1));
        assert_eq!(restored.find("k", Epoch::new(10)), None);
    }

    #[test]
    fn load_state_rejects_garbage() {
        assert!(VersionedStore::<u64>::load_state(&[0xff, 0x02, 0x03]).is_err());
    }
}
