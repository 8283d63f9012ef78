use proptest::prelude::*;

use pledge_store::VersionedStore;
use pledge_types::Epoch;

proptest! {
    /// `find(e)` always returns the value of the latest write whose
    /// effective epoch is <= e, regardless of write order.
    #[test]
    fn find_resolves_latest_applicable_write(
        mut writes in prop::collection::vec((0u64..100, 0u64..1_000_000), 1..20),
        query in 0u64..100,
    ) {
        let mut store = VersionedStore::new();
        for (epoch, value) in &writes {
            store.append("k", Epoch::new(*epoch), *value).unwrap();
        }

        // Last write wins per epoch; latest applicable epoch wins overall.
        writes.reverse();
        writes.sort_by_key(|(epoch, _)| *epoch);
        writes.dedup_by_key(|(epoch, _)| *epoch);
        let expected = writes
            .iter()
            .rev()
            .find(|(epoch, _)| *epoch <= query)
            .map(|(_, value)| *value);

        prop_assert_eq!(store.find("k", Epoch::new(query)), expected);
    }

    /// A tombstone never disturbs reads below its effective epoch.
    #[test]
    fn tombstone_preserves_earlier_history(
        write_epoch in 0u64..50,
        del_offset in 1u64..50,
        value in 0u64..1_000_000,
    ) {
        let mut store = VersionedStore::new();
        let del_epoch = write_epoch + del_offset;
        store.append("k", Epoch::new(write_epoch), value).unwrap();
        store.del("k", Epoch::new(del_epoch)).unwrap();

        prop_assert_eq!(store.find("k", Epoch::new(write_epoch)), Some(value));
        prop_assert_eq!(store.find("k", Epoch::new(del_epoch)), None);
    }

    /// Snapshot round-trips reproduce every observable read.
    #[test]
    fn snapshot_round_trip(
        writes in prop::collection::vec((0u64..50, 0u64..1000), 1..15),
        queries in prop::collection::vec(0u64..60, 1..10),
    ) {
        let mut store = VersionedStore::new();
        for (epoch, value) in &writes {
            store.append("k", Epoch::new(*epoch), *value).unwrap();
        }
        let restored =
            VersionedStore::<u64>::load_state(&store.save_state().unwrap()).unwrap();
        for q in queries {
            prop_assert_eq!(store.find("k", Epoch::new(q)), restored.find("k", Epoch::new(q)));
        }
    }
}
