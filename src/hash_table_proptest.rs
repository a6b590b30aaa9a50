#![cfg(test)]

// Property tests for HashTable kept inside the crate so they can inspect the
// entry store and free list directly.

use crate::error::TableError;
use crate::hash_table::HashTable;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Clone, Debug)]
enum Op {
    Put(u32, i32),
    Erase(u32),
    Get(u32),
    Mutate(u32, i32),
    Grow(u32, u32),
    Clear,
    Iterate,
    Walk,
}

// Keys come from a small range so chains collide often, especially with few buckets.
fn arb_op() -> impl Strategy<Value = Op> {
    let key = 0u32..24;
    prop_oneof![
        4 => (key.clone(), any::<i32>()).prop_map(|(k, v)| Op::Put(k, v)),
        3 => key.clone().prop_map(Op::Erase),
        2 => key.clone().prop_map(Op::Get),
        1 => (key, any::<i32>()).prop_map(|(k, d)| Op::Mutate(k, d)),
        1 => (1u32..9, 0u32..8).prop_map(|(b, extra)| Op::Grow(b, extra)),
        1 => Just(Op::Clear),
        1 => Just(Op::Iterate),
        1 => Just(Op::Walk),
    ]
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - `put` of a new key succeeds exactly when the table is not full; overwrite always succeeds.
// - `get` parity with the model; `erase` of an absent key is refused, never silently ignored.
// - Growth keeps every pair reachable and never shrinks capacity.
// - Both traversals yield exactly the model's pairs, once each.
// - `verify()` holds after every step; `is_full()` iff `len() == capacity()`.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(
        buckets in 1u32..6,
        capacity in 0u32..12,
        ops in proptest::collection::vec(arb_op(), 1..80),
    ) {
        let mut sut: HashTable<u32, i32> = HashTable::with_capacity(buckets, capacity);
        let mut model: HashMap<u32, i32> = HashMap::new();

        for op in ops {
            match op {
                Op::Put(k, v) => {
                    let present = model.contains_key(&k);
                    let was_full = sut.is_full();
                    match sut.try_put(k, v) {
                        Ok(()) => {
                            prop_assert!(present || !was_full, "new key accepted on a full table");
                            model.insert(k, v);
                        }
                        Err(TableError::Full) => {
                            prop_assert!(!present && was_full);
                        }
                        Err(e) => prop_assert!(false, "unexpected error {:?}", e),
                    }
                }
                Op::Erase(k) => {
                    match sut.try_erase(k) {
                        Ok(()) => prop_assert!(model.remove(&k).is_some()),
                        Err(TableError::KeyNotFound) => prop_assert!(!model.contains_key(&k)),
                        Err(e) => prop_assert!(false, "unexpected error {:?}", e),
                    }
                    prop_assert!(sut.get(k).is_none());
                }
                Op::Get(k) => {
                    prop_assert_eq!(sut.get(k), model.get(&k));
                    prop_assert_eq!(sut.contains_key(k), model.contains_key(&k));
                }
                Op::Mutate(k, d) => {
                    if let Some(v) = sut.get_mut(k) {
                        *v = v.wrapping_add(d);
                        let mv = model.get_mut(&k).expect("present in model");
                        *mv = mv.wrapping_add(d);
                    } else {
                        prop_assert!(!model.contains_key(&k));
                    }
                }
                Op::Grow(b, extra) => {
                    let new_capacity = sut.capacity() as u32 + extra;
                    sut.set_capacity(b, new_capacity);
                    prop_assert_eq!(sut.bucket_count(), b as usize);
                    prop_assert_eq!(sut.capacity(), new_capacity as usize);
                    for (k, v) in &model {
                        prop_assert_eq!(sut.get(*k), Some(v));
                    }
                }
                Op::Clear => {
                    sut.clear();
                    model.clear();
                }
                Op::Iterate => {
                    let mut seen: BTreeMap<u32, i32> = BTreeMap::new();
                    let mut visits = 0usize;
                    sut.iterate(&mut seen, |seen, &k, &v| {
                        visits += 1;
                        seen.insert(k, v);
                    });
                    prop_assert_eq!(visits, model.len());
                    let expected: BTreeMap<u32, i32> = model.iter().map(|(&k, &v)| (k, v)).collect();
                    prop_assert_eq!(seen, expected);
                }
                Op::Walk => {
                    let mut cursor = sut.cursor();
                    let mut keys = BTreeSet::new();
                    let mut visits = 0usize;
                    while cursor.advance() {
                        let k = *cursor.key().expect("positioned cursor has a key");
                        prop_assert_eq!(cursor.value(), model.get(&k));
                        keys.insert(k);
                        visits += 1;
                    }
                    prop_assert!(!cursor.advance());
                    prop_assert_eq!(visits, model.len());
                    let expected: BTreeSet<u32> = model.keys().copied().collect();
                    prop_assert_eq!(keys, expected);
                }
            }

            // Post-conditions after each op
            prop_assert!(sut.verify().is_ok(), "verify failed: {:?}", sut.verify());
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.is_empty(), model.is_empty());
            prop_assert_eq!(sut.is_full(), sut.len() == sut.capacity());
        }
    }
}

// Property: once the bump region is used up, erased slots come back newest first.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_free_list_reuse_is_lifo(
        capacity in 1u32..16,
        buckets in 1u32..5,
        picks in proptest::collection::vec(any::<proptest::sample::Index>(), 1..16),
    ) {
        let mut sut: HashTable<u32, u32> = HashTable::with_capacity(buckets, capacity);
        for k in 0..capacity {
            sut.put(k, k);
        }
        prop_assert!(sut.is_full());

        // Erase a distinct subset, remembering which slot each key held.
        let mut live: Vec<u32> = (0..capacity).collect();
        let mut freed: Vec<u32> = Vec::new();
        for pick in picks {
            if live.is_empty() {
                break;
            }
            let k = live.remove(pick.index(live.len()));
            freed.push(sut.find_index(k).expect("key present"));
            sut.erase(k);
        }

        // Fresh keys must land in the freed slots in reverse order of release.
        for (i, &slot) in freed.iter().rev().enumerate() {
            let k = 1_000 + i as u32;
            sut.put(k, k);
            prop_assert_eq!(sut.find_index(k).expect("key present"), slot);
        }
        prop_assert!(sut.is_full());
        prop_assert!(sut.verify().is_ok());
        for k in live {
            prop_assert_eq!(sut.get(k), Some(&k));
        }
    }
}
