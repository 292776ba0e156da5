//! Property tests over sequences of store mutations.

mod common;

use common::*;
use proptest::prelude::*;
use statvault_storage::{ApEntry, StatsRecord};

#[derive(Debug, Clone)]
enum Op {
    Battle,
    Ap { amount: u64, base: u64, count: u64, source: String },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Battle),
        (0u64..10_000, 0u64..1_000, 0u64..10, "[a-z]{1,8}").prop_map(
            |(amount, base, count, source)| Op::Ap {
                amount,
                base,
                count,
                source,
            }
        ),
    ]
}

proptest! {
    // Each case opens a real database file.
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn store_matches_in_memory_model(ops in prop::collection::vec(op_strategy(), 0..12)) {
        let t = open_store();
        let now = feb_2026();
        let mut model = StatsRecord::empty();

        for op in &ops {
            match op {
                Op::Battle => {
                    t.store.increment_battle_count("prop").unwrap();
                    model.record_battle();
                }
                Op::Ap { amount, base, count, source } => {
                    t.store
                        .add_akashi_ap_entry("prop", *amount, *base, *count, source)
                        .unwrap();
                    model.push_ap_entry(ApEntry::new(*amount, *base, *count, source.as_str(), now));
                }
            }
        }

        let stored = t.store.get_stats("prop", "2026-02").unwrap();
        prop_assert_eq!(&stored, &model);
        prop_assert!(stored.is_consistent());
        prop_assert_eq!(t.store.raw_blob("prop", "2026-02").unwrap().is_some(), !ops.is_empty());
    }

    #[test]
    fn any_single_byte_flip_fails_closed(index in any::<prop::sample::Index>(), mask in 1u8..=255) {
        let t = open_store();
        t.store.add_akashi_ap_entry("prop", 120, 60, 2, "akashi").unwrap();

        let mut blob = read_blob(&t.db_path(), "prop", "2026-02");
        let at = index.index(blob.len());
        blob[at] ^= mask;
        write_blob(&t.db_path(), "prop", "2026-02", &blob);

        prop_assert_eq!(t.store.get_stats("prop", "2026-02").unwrap(), StatsRecord::empty());
    }
}
