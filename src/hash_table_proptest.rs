#![cfg(test)]

// Property tests for HashTable kept inside the crate so they can observe
// tombstone and capacity counters.

use crate::callbacks::CallbackTable;
use crate::config::TableConfig;
use crate::error::ContainerError;
use crate::hash::KeyBytes;
use crate::hash_table::HashTable;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

// Pool-indexed operations so shrinking moves toward earlier keys.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    Remove(usize),
    Take(usize),
    Find(usize),
    FindByValue(i32),
    Reserve(usize),
    Iterate,
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=12).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            6 => (idx.clone(), -50i32..50).prop_map(|(i, v)| Op::Insert(i, v)),
            2 => idx.clone().prop_map(Op::Remove),
            1 => idx.clone().prop_map(Op::Take),
            3 => idx.clone().prop_map(Op::Find),
            1 => (-50i32..50).prop_map(Op::FindByValue),
            1 => (0usize..40).prop_map(Op::Reserve),
            1 => Just(Op::Iterate),
            1 => Just(Op::Clear),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn run_against_model(
    mut sut: HashTable<String, i32>,
    pool: Vec<String>,
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: BTreeMap<String, i32> = BTreeMap::new();

    for op in ops {
        let cap_before = sut.capacity();
        match op {
            Op::Insert(i, v) => {
                let k = pool[i].clone();
                let stored = *sut.insert(&k, &v).expect("insert");
                prop_assert_eq!(stored, v);
                model.insert(k, v);
            }
            Op::Remove(i) => {
                let k = &pool[i];
                match (sut.remove(k), model.remove(k)) {
                    (Ok(()), Some(_)) => {}
                    (Err(ContainerError::KeyNotFound), None) => {}
                    (got, want) => {
                        prop_assert!(false, "remove mismatch: {:?} vs {:?}", got, want)
                    }
                }
            }
            Op::Take(i) => {
                let k = &pool[i];
                let got = sut.take(k);
                let want = model.remove_entry(k);
                prop_assert_eq!(got, want);
            }
            Op::Find(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.find(k), model.get(k));
                prop_assert_eq!(sut.contains_key(k), model.contains_key(k));
            }
            Op::FindByValue(v) => {
                let present = model.values().any(|&mv| mv == v);
                prop_assert_eq!(sut.find_by_value(&v).is_some(), present);
            }
            Op::Reserve(n) => {
                sut.reserve(n).expect("reserve");
                if sut.capacity() > cap_before {
                    prop_assert_eq!(sut.tombstones(), 0, "growth drops tombstones");
                }
            }
            Op::Iterate => {
                let seen: BTreeMap<String, i32> =
                    sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(&seen, &model);
            }
            Op::Clear => {
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.capacity(), cap_before);
            }
        }

        // Post-conditions after each op
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.capacity().is_power_of_two());
        prop_assert!(sut.len() + sut.tombstones() <= sut.capacity());
        prop_assert!(sut.capacity() >= cap_before, "tables never shrink");
        let keys: BTreeSet<&String> = sut.keys().collect();
        prop_assert_eq!(keys.len(), sut.len(), "keys are unique");
    }

    // Every surviving mapping is still reachable.
    for (k, v) in &model {
        prop_assert_eq!(sut.find(k), Some(v));
    }
    Ok(())
}

// Property: HashTable behaves like an ordered map model across random
// insert/update/remove/take/reserve/clear sequences, under the default
// text hash.
proptest! {
    #![proptest_config(ProptestConfig { cases: 96, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let sut = HashTable::with_config(TableConfig::new(2)).unwrap();
        run_against_model(sut, pool, ops)?;
    }
}

fn collide(_: KeyBytes<'_>) -> u64 {
    7
}

// Property: same invariants when every key shares one hash code, so every
// lookup walks a probe chain across tombstones and compare decides.
proptest! {
    #![proptest_config(ProptestConfig { cases: 96, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let keys = CallbackTable::NONE.with_hash(collide);
        let sut = HashTable::with_callbacks(TableConfig::new(1), keys, CallbackTable::NONE).unwrap();
        run_against_model(sut, pool, ops)?;
    }
}

// Property: a table with a partial load limit keeps live entries under
// that limit after every insert.
proptest! {
    #[test]
    fn prop_load_limit_respected(keys in proptest::collection::btree_set(any::<u32>(), 1..200), pct in 25u8..=100) {
        let config = TableConfig::new(4).with_max_load_percent(pct);
        let mut t: HashTable<u32, u32> = HashTable::with_config(config).unwrap();
        for k in &keys {
            t.insert(k, k).unwrap();
            prop_assert!(t.len() <= t.capacity());
            prop_assert!(t.len() <= config.load_limit(t.capacity()) + 1);
        }
        for k in &keys {
            prop_assert_eq!(t.find(k), Some(k));
        }
    }
}
