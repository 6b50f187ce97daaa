#![cfg(test)]

// Property tests for LazyTable kept inside the crate so they can check the
// structural invariants directly.

use crate::error::TableError;
use crate::lazy_table::LazyTable;
use crate::policy::{CompactionPolicy, ThresholdBasis};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations so shrinking moves toward earlier keys and
// shorter op lists.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    LazyRemove(usize),
    Remove(usize),
    Take(usize),
    At(usize),
    Contains(String),
    Mutate(usize, i32),
    Compact,
    ForceCompact,
    Iterate,
    Clear,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=10).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => idx.clone().prop_map(OpI::LazyRemove),
            2 => idx.clone().prop_map(OpI::Remove),
            1 => idx.clone().prop_map(OpI::Take),
            1 => idx.clone().prop_map(OpI::At),
            1 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,4}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => Just(OpI::Compact),
            1 => Just(OpI::ForceCompact),
            1 => Just(OpI::Iterate),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn arb_policy() -> impl Strategy<Value = CompactionPolicy> {
    prop_oneof![
        Just(CompactionPolicy::default()),
        Just(CompactionPolicy::never()),
        (0u32..=200).prop_map(|p| CompactionPolicy::new(ThresholdBasis::Occupied, p)),
        (0u32..=200).prop_map(|p| CompactionPolicy::new(ThresholdBasis::Allocated, p)),
    ]
}

fn live_pairs(t: &LazyTable<Key, i32>) -> BTreeMap<Key, i32> {
    t.iter().map(|(k, v)| (k.clone(), *v)).collect()
}

// Property: state-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - Duplicate inserts are no-ops that keep the first value.
// - `contains`/`at` parity with the model; `at` on a missing key is OutOfRange.
// - Lazy removal never moves a surviving entry.
// - Compaction never changes logical content; a rebuild leaves no tombstones.
// - `len() == model.len()`, `allocated_len() >= len()` and the structural
//   invariants hold after every op.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario(), policy in arb_policy()) {
        let mut sut: LazyTable<Key, i32> = LazyTable::with_policy(policy);
        let mut model: HashMap<Key, i32> = HashMap::new();

        for op in ops {
            match op {
                OpI::Insert(i, v) => {
                    let k = key_from(&pool, i);
                    let already = model.contains_key(&k);
                    let before_alloc = sut.allocated_len();
                    let reuse = sut.tombstone_count() > 0;
                    let positions: Vec<_> = model
                        .keys()
                        .filter(|other| **other != k)
                        .map(|other| (other.clone(), sut.position_of(other)))
                        .collect();
                    match sut.insert(k.clone(), v) {
                        Some(p) => {
                            prop_assert!(!already, "insert must fail on duplicate");
                            prop_assert_eq!(p.pair(), Ok((&k, &v)));
                            model.insert(k, v);
                            let grown = if reuse { before_alloc } else { before_alloc + 1 };
                            prop_assert_eq!(sut.allocated_len(), grown);
                        }
                        None => {
                            prop_assert!(already, "soft failure only when key exists");
                            prop_assert_eq!(sut.allocated_len(), before_alloc);
                        }
                    }
                    for (other, pos) in positions {
                        prop_assert_eq!(sut.position_of(&other), pos, "insert moved another slot");
                    }
                }
                OpI::LazyRemove(i) => {
                    let k = key_from(&pool, i);
                    let positions: Vec<_> = model
                        .keys()
                        .filter(|other| **other != k)
                        .map(|other| (other.clone(), sut.position_of(other)))
                        .collect();
                    let removed = sut.lazy_remove(&k);
                    prop_assert_eq!(removed, model.remove(&k).is_some());
                    for (other, pos) in positions {
                        prop_assert_eq!(sut.position_of(&other), pos, "lazy removal moved a slot");
                    }
                }
                OpI::Remove(i) => {
                    let k = key_from(&pool, i);
                    let before = live_pairs(&sut);
                    let removed = sut.remove(&k);
                    prop_assert_eq!(removed, model.remove(&k).is_some());
                    let mut expected = before;
                    expected.remove(&k);
                    prop_assert_eq!(live_pairs(&sut), expected);
                }
                OpI::Take(i) => {
                    let k = key_from(&pool, i);
                    prop_assert_eq!(sut.take(&k), model.remove(&k));
                }
                OpI::At(i) => {
                    let k = key_from(&pool, i);
                    match model.get(&k) {
                        Some(v) => {
                            let p = sut.at(&k).expect("present key resolves");
                            prop_assert_eq!(p.pair(), Ok((&k, v)));
                        }
                        None => {
                            prop_assert_eq!(sut.at(&k).map(|_| ()), Err(TableError::OutOfRange));
                        }
                    }
                }
                OpI::Contains(s) => {
                    let has = sut.contains(s.as_str());
                    let has_model = model.keys().any(|k| k.0 == s);
                    prop_assert_eq!(has, has_model);
                }
                OpI::Mutate(i, d) => {
                    let k = key_from(&pool, i);
                    if let Some(v) = sut.get_mut(&k) {
                        *v = v.saturating_add(d);
                        let mv = model.get_mut(&k).expect("model has live key");
                        *mv = mv.saturating_add(d);
                    } else {
                        prop_assert!(!model.contains_key(&k));
                    }
                }
                OpI::Compact => {
                    let before = live_pairs(&sut);
                    sut.compact();
                    prop_assert_eq!(live_pairs(&sut), before);
                    let last = sut.allocated_len().checked_sub(1).and_then(|pos| sut.proxy_at(pos));
                    if let Some(p) = last {
                        prop_assert!(!p.is_removed(), "trailing trim left a tombstone");
                    }
                }
                OpI::ForceCompact => {
                    let before: Vec<_> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                    sut.force_compact();
                    let after: Vec<_> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                    prop_assert_eq!(after, before, "rebuild preserves relative order");
                    prop_assert_eq!(sut.allocated_len(), sut.len());
                }
                OpI::Iterate => {
                    let s_keys: BTreeSet<_> = sut.keys().cloned().collect();
                    let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                    prop_assert_eq!(sut.iter().count(), model.len());
                    prop_assert_eq!(s_keys, m_keys);
                }
                OpI::Clear => {
                    sut.clear();
                    model.clear();
                    prop_assert!(sut.is_allocated_empty());
                }
            }

            // Post-conditions after each op
            sut.assert_invariants();
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.is_empty(), model.is_empty());
            prop_assert!(sut.allocated_len() >= sut.len());
            prop_assert_eq!(sut.allocated_len() - sut.tombstone_count(), sut.len());
        }
    }
}

// Property: every rebuild, direct or triggered by `remove`, leaves zero
// tombstones, and `remove` never leaves the table past its threshold.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_remove_keeps_fragmentation_bounded(
        n in 1u32..60,
        removals in proptest::collection::vec(0u32..60, 0..60),
        policy in arb_policy(),
    ) {
        let mut t: LazyTable<u32, u32> = LazyTable::with_policy(policy);
        for i in 0..n {
            t.insert(i, i).unwrap();
        }
        for k in removals {
            let tombstones_before = t.tombstone_count();
            t.remove(&k);
            prop_assert!(
                !policy.should_rebuild(t.tombstone_count(), t.allocated_len()),
                "remove left the table past its threshold (had {} tombstones)",
                tombstones_before
            );
            t.assert_invariants();
        }
        t.force_compact();
        prop_assert_eq!(t.tombstone_count(), 0);
        prop_assert_eq!(t.allocated_len(), t.len());
    }
}
