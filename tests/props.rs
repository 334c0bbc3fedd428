// Randomized operation sequences checked against simpler reference
// models. Proptest shrinks any failing sequence to a minimal one.

use proptest::prelude::*;

use chaintable::raw::{Hashed, InsertUnique, RawTable, SelfKey};
use chaintable::{HashMap, HashMultiMap};

use std::collections::hash_map::RandomState;
use std::collections::HashMap as StdMap;

proptest! {
    #[test]
    fn prop_map_matches_std(
        ops in proptest::collection::vec((0u8..=4u8, 0usize..32, 0usize..1000), 1..200),
    ) {
        let mut map: HashMap<usize, usize> = HashMap::new();
        let mut model: StdMap<usize, usize> = StdMap::new();

        for (op, key, value) in ops {
            match op {
                0 => {
                    prop_assert_eq!(map.insert(key, value), model.insert(key, value));
                }
                1 => {
                    prop_assert_eq!(map.remove(&key), model.remove(&key));
                }
                2 => {
                    prop_assert_eq!(map.get(&key), model.get(&key));
                }
                3 => {
                    prop_assert_eq!(map.contains_key(&key), model.contains_key(&key));
                }
                _ => {
                    if let Some(v) = map.get_mut(&key) {
                        *v = value;
                    }
                    if let Some(v) = model.get_mut(&key) {
                        *v = value;
                    }
                }
            }
            prop_assert_eq!(map.len(), model.len());
        }

        for (k, v) in &model {
            prop_assert_eq!(map.get(k), Some(v));
        }
        prop_assert_eq!(map.iter().count(), model.len());
    }

    #[test]
    fn prop_multi_map_matches_model(
        ops in proptest::collection::vec((0u8..=3u8, 0usize..16, 0usize..1000), 1..200),
    ) {
        let mut map: HashMultiMap<usize, usize> = HashMultiMap::new();
        let mut model: StdMap<usize, Vec<usize>> = StdMap::new();
        let mut len = 0usize;

        for (op, key, value) in ops {
            match op {
                0 => {
                    map.insert(key, value);
                    model.entry(key).or_default().push(value);
                    len += 1;
                }
                1 => {
                    let removed = map.remove_all(&key);
                    let expected = model.remove(&key).map_or(0, |run| run.len());
                    prop_assert_eq!(removed, expected);
                    len -= removed;
                }
                2 => {
                    prop_assert_eq!(map.count(&key), model.get(&key).map_or(0, Vec::len));
                }
                _ => {
                    // Runs are unordered multisets; compare sorted.
                    let mut ours: Vec<usize> =
                        map.equal_range(&key).map(|(_, &v)| v).collect();
                    ours.sort_unstable();
                    let mut theirs = model.get(&key).cloned().unwrap_or_default();
                    theirs.sort_unstable();
                    prop_assert_eq!(ours, theirs);
                }
            }
            prop_assert_eq!(map.len(), len);
        }
    }

    #[test]
    fn prop_raw_table_stays_valid(
        ops in proptest::collection::vec((0u8..=5u8, 0u32..64u32), 1..200),
    ) {
        let mut table: RawTable<u32, Hashed<SelfKey, RandomState, u64>> =
            RawTable::new(Hashed::new(RandomState::new()));
        let mut model: Vec<u32> = Vec::new();

        for (op, key) in ops {
            match op {
                0 => match table.insert_unique(key, |a, b| a == b) {
                    InsertUnique::Inserted(_) => {
                        prop_assert!(!model.contains(&key));
                        model.push(key);
                    }
                    InsertUnique::Occupied { .. } => {
                        prop_assert!(model.contains(&key));
                    }
                },
                1 => {
                    table.insert_multi(key, |a, b| a == b);
                    model.push(key);
                }
                2 => {
                    let removed = table.remove(&key, |e| *e == key);
                    match model.iter().position(|&k| k == key) {
                        Some(at) => {
                            prop_assert_eq!(removed, Some(key));
                            model.remove(at);
                        }
                        None => prop_assert_eq!(removed, None),
                    }
                }
                3 => {
                    let before = model.len();
                    model.retain(|&k| k != key);
                    prop_assert_eq!(table.erase(&key, |e| *e == key), before - model.len());
                }
                4 => {
                    let expected = model.iter().filter(|&&k| k == key).count();
                    prop_assert_eq!(table.count(&key, |e| *e == key), expected);
                    prop_assert_eq!(table.find(&key, |e| *e == key).is_some(), expected > 0);
                }
                _ => {
                    table.rehash(key as usize);
                }
            }
            prop_assert!(table.validate());
            prop_assert_eq!(table.len(), model.len());
        }

        let mut contents: Vec<u32> = table.iter().copied().collect();
        contents.sort_unstable();
        model.sort_unstable();
        prop_assert_eq!(contents, model);
    }
}
