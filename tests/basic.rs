// Adapted from: https://github.com/jonhoo/flurry/blob/main/tests/basic.rs

use chaintable::HashMap;

use std::hash::{BuildHasherDefault, Hasher};
use std::sync::Arc;

mod common;
use common::{with_map, with_multi_map};

#[test]
fn new() {
    with_map::<usize, usize>(|map| drop(map()));
}

#[test]
fn clear() {
    with_map::<usize, usize>(|map| {
        let mut map = map();
        map.insert(0, 1);
        map.insert(1, 1);
        map.insert(2, 1);
        map.insert(3, 1);
        map.insert(4, 1);

        let buckets = map.bucket_count();
        map.clear();

        assert!(map.is_empty());
        // The bucket array is kept for reuse.
        assert_eq!(map.bucket_count(), buckets);

        map.insert(0, 2);
        assert_eq!(map.get(&0), Some(&2));
    });
}

#[test]
fn insert() {
    with_map::<usize, usize>(|map| {
        let mut map = map();
        let old = map.insert(42, 0);
        assert!(old.is_none());
    });
}

#[test]
fn get_empty() {
    with_map::<usize, usize>(|map| {
        let map = map();
        let e = map.get(&42);
        assert!(e.is_none());
    });
}

#[test]
fn get_key_value_empty() {
    with_map::<usize, usize>(|map| {
        let map = map();
        let e = map.get_key_value(&42);
        assert!(e.is_none());
    });
}

#[test]
fn remove_empty() {
    with_map::<usize, usize>(|map| {
        let mut map = map();
        let old = map.remove(&42);
        assert!(old.is_none());
    });
}

#[test]
fn insert_and_remove() {
    with_map::<usize, usize>(|map| {
        let mut map = map();
        map.insert(42, 0);
        let old = map.remove(&42).unwrap();
        assert_eq!(old, 0);
        assert!(map.get(&42).is_none());
        assert_eq!(map.len(), 0);
    });
}

#[test]
fn insert_and_get() {
    with_map::<usize, usize>(|map| {
        let mut map = map();
        map.insert(42, 0);

        let e = map.get(&42).unwrap();
        assert_eq!(e, &0);
    });
}

#[test]
fn insert_and_get_key_value() {
    with_map::<usize, usize>(|map| {
        let mut map = map();
        map.insert(42, 0);

        let e = map.get_key_value(&42).unwrap();
        assert_eq!(e, (&42, &0));
    });
}

#[test]
fn remove_entry() {
    with_map::<usize, usize>(|map| {
        let mut map = map();
        map.insert(42, 7);
        assert_eq!(map.remove_entry(&42), Some((42, 7)));
        assert_eq!(map.remove_entry(&42), None);
    });
}

#[test]
fn reinsert() {
    with_map::<usize, usize>(|map| {
        let mut map = map();
        map.insert(42, 0);
        let old = map.insert(42, 1);
        assert_eq!(old, Some(0));

        let e = map.get(&42).unwrap();
        assert_eq!(e, &1);
        assert_eq!(map.len(), 1);
    });
}

#[test]
fn try_insert() {
    with_map::<usize, usize>(|map| {
        let mut map = map();
        assert_eq!(map.try_insert(42, 0), Ok(&mut 0));

        let err = map.try_insert(42, 1).unwrap_err();
        assert_eq!(err.current, (&42, &0));
        assert_eq!(err.not_inserted, (42, 1));

        // The existing entry survived untouched.
        assert_eq!(map.get(&42), Some(&0));
        assert_eq!(map.len(), 1);
    });
}

#[test]
fn get_mut() {
    with_map::<usize, usize>(|map| {
        let mut map = map();
        map.insert(42, 0);
        *map.get_mut(&42).unwrap() += 5;
        assert_eq!(map.get(&42), Some(&5));
        assert!(map.get_mut(&41).is_none());
    });
}

#[test]
fn contains_key() {
    with_map::<usize, usize>(|map| {
        let mut map = map();
        map.insert(42, 0);
        assert!(map.contains_key(&42));
        assert!(!map.contains_key(&43));
    });
}

#[test]
fn borrowed_keys() {
    with_map::<String, usize>(|map| {
        let mut map = map();
        map.insert("apple".to_owned(), 1);
        map.insert("pear".to_owned(), 2);

        assert_eq!(map.get("apple"), Some(&1));
        assert!(map.contains_key("pear"));
        assert_eq!(map.remove("apple"), Some(1));
        assert!(map.get("apple").is_none());
    });
}

#[test]
fn current_kv_dropped() {
    let dropped1 = Arc::new(0);
    let dropped2 = Arc::new(0);

    with_map::<Arc<usize>, Arc<usize>>(|map| {
        let mut map = map();
        map.insert(dropped1.clone(), dropped2.clone());
        assert_eq!(Arc::strong_count(&dropped1), 2);
        assert_eq!(Arc::strong_count(&dropped2), 2);

        drop(map);

        // Dropping the map drops all keys and values.
        assert_eq!(Arc::strong_count(&dropped1), 1);
        assert_eq!(Arc::strong_count(&dropped2), 1);
    });
}

#[test]
fn replaced_value_dropped() {
    let first = Arc::new(0);
    let second = Arc::new(0);

    with_map::<usize, Arc<usize>>(|map| {
        let mut map = map();
        map.insert(42, first.clone());
        let old = map.insert(42, second.clone()).unwrap();
        assert_eq!(Arc::strong_count(&first), 2);

        drop(old);
        assert_eq!(Arc::strong_count(&first), 1);
        assert_eq!(Arc::strong_count(&second), 2);

        drop(map);
        assert_eq!(Arc::strong_count(&second), 1);
    });
}

#[test]
fn retain() {
    with_map::<usize, usize>(|map| {
        let mut map = map();
        for i in 0..64 {
            map.insert(i, i);
        }

        map.retain(|k, v| {
            *v += 1;
            k % 2 == 0
        });

        assert_eq!(map.len(), 32);
        assert_eq!(map.get(&10), Some(&11));
        assert!(map.get(&11).is_none());
    });
}

#[test]
fn empty_maps_equal() {
    with_map::<usize, usize>(|map1| {
        with_map::<usize, usize>(|map2| {
            let map1 = map1();
            let map2 = map2();
            assert_eq!(map1, map2);
            assert_eq!(map2, map1);
        });
    });
}

#[test]
fn different_size_maps_not_equal() {
    with_map::<usize, usize>(|map1| {
        with_map::<usize, usize>(|map2| {
            let mut map1 = map1();
            let mut map2 = map2();

            map1.insert(1, 0);
            map1.insert(2, 0);
            map1.insert(3, 0);

            map2.insert(1, 0);
            map2.insert(2, 0);

            assert_ne!(map1, map2);
            assert_ne!(map2, map1);
        });
    });
}

#[test]
fn same_values_equal() {
    with_map::<usize, usize>(|map1| {
        with_map::<usize, usize>(|map2| {
            let mut map1 = map1();
            let mut map2 = map2();

            map1.insert(1, 0);
            map2.insert(1, 0);

            assert_eq!(map1, map2);
            assert_eq!(map2, map1);
        });
    });
}

#[test]
fn different_values_not_equal() {
    with_map::<usize, usize>(|map1| {
        with_map::<usize, usize>(|map2| {
            let mut map1 = map1();
            let mut map2 = map2();

            map1.insert(1, 0);
            map2.insert(1, 1);

            assert_ne!(map1, map2);
            assert_ne!(map2, map1);
        });
    });
}

#[test]
fn clone_map_empty() {
    with_map::<&'static str, u32>(|map| {
        let map = map();
        let cloned_map = map.clone();
        assert_eq!(map.len(), cloned_map.len());
        assert_eq!(&map, &cloned_map);
        assert_eq!(cloned_map.len(), 0);
    });
}

#[test]
// Test that same values exist in both maps (original and cloned)
fn clone_map_filled() {
    with_map::<&'static str, u32>(|map| {
        let mut map = map();
        map.insert("FooKey", 0);
        map.insert("BarKey", 10);
        let cloned_map = map.clone();
        assert_eq!(map.len(), cloned_map.len());
        assert_eq!(&map, &cloned_map);

        // Test that we are not sharing the same table.
        map.insert("NewItem", 100);
        assert_ne!(&map, &cloned_map);
        assert!(!cloned_map.contains_key("NewItem"));
    });
}

#[test]
fn default() {
    let mut map: HashMap<usize, usize> = HashMap::default();
    map.insert(42, 0);

    assert_eq!(map.get(&42), Some(&0));
    assert_eq!(map.bucket_count(), 2);
}

#[test]
fn debug() {
    with_map::<usize, usize>(|map| {
        let mut map = map();
        map.insert(42, 0);
        map.insert(16, 8);

        let formatted = format!("{:?}", map);

        assert!(formatted == "{42: 0, 16: 8}" || formatted == "{16: 8, 42: 0}");
    });
}

#[test]
fn extend() {
    with_map::<usize, usize>(|map| {
        let mut map = map();

        let mut entries: Vec<(usize, usize)> = vec![(42, 0), (16, 6), (38, 42)];
        entries.sort_unstable();

        map.extend(entries.clone());

        let mut collected: Vec<(usize, usize)> =
            map.iter().map(|(key, value)| (*key, *value)).collect();
        collected.sort_unstable();

        assert_eq!(entries, collected);
    });
}

#[test]
fn extend_ref() {
    with_map::<usize, usize>(|map| {
        let mut map = map();

        let mut entries: Vec<(&usize, &usize)> = vec![(&42, &0), (&16, &6), (&38, &42)];
        entries.sort();

        map.extend(entries.clone());

        let mut collected: Vec<(&usize, &usize)> = map.iter().collect();
        collected.sort();

        assert_eq!(entries, collected);
    });
}

#[test]
fn from_array() {
    let map = HashMap::from([(1, 2), (3, 4)]);
    assert_eq!(map.len(), 2);
    assert_eq!(map.get(&1), Some(&2));
    assert_eq!(map.get(&3), Some(&4));
}

#[test]
fn from_iter_empty() {
    let entries: Vec<(usize, usize)> = Vec::new();
    let map: HashMap<usize, usize> = HashMap::from_iter(entries);

    assert_eq!(map.len(), 0);
    assert_eq!(map.bucket_count(), 1);
}

#[test]
fn keys_and_values() {
    with_map::<usize, usize>(|map| {
        let mut map = map();
        for i in 0..16 {
            map.insert(i, i + 100);
        }

        let mut keys: Vec<usize> = map.keys().copied().collect();
        keys.sort_unstable();
        assert_eq!(keys, (0..16).collect::<Vec<_>>());

        let mut values: Vec<usize> = map.values().copied().collect();
        values.sort_unstable();
        assert_eq!(values, (100..116).collect::<Vec<_>>());

        for value in map.values_mut() {
            *value -= 100;
        }
        assert_eq!(map.get(&7), Some(&7));
    });
}

#[test]
fn len() {
    with_map::<usize, usize>(|map| {
        let mut map = map();
        let len = if cfg!(miri) { 100 } else { 10_000 };
        for i in 0..len {
            map.insert(i, i + 1);
        }
        assert_eq!(map.len(), len);
    });
}

#[test]
fn iter() {
    with_map::<usize, usize>(|map| {
        let mut map = map();
        let len = if cfg!(miri) { 100 } else { 10_000 };
        for i in 0..len {
            assert_eq!(map.insert(i, i + 1), None);
        }

        let v: Vec<_> = (0..len).map(|i| (i, i + 1)).collect();
        let mut got: Vec<_> = map.iter().map(|(&k, &v)| (k, v)).collect();
        got.sort();
        assert_eq!(v, got);
    });
}

#[test]
fn iter_mut() {
    with_map::<usize, usize>(|map| {
        let mut map = map();
        for i in 0..64 {
            map.insert(i, 0);
        }

        for (key, value) in map.iter_mut() {
            *value = *key;
        }

        for i in 0..64 {
            assert_eq!(map.get(&i), Some(&i));
        }
    });
}

#[test]
fn into_iter_owned() {
    with_map::<usize, usize>(|map| {
        let mut map = map();
        for i in 0..64 {
            map.insert(i, i * 2);
        }

        let mut entries: Vec<(usize, usize)> = map.into_iter().collect();
        entries.sort_unstable();
        assert_eq!(entries, (0..64).map(|i| (i, i * 2)).collect::<Vec<_>>());
    });
}

#[test]
fn reserve_preallocates() {
    with_map::<usize, usize>(|map| {
        let mut map = map();
        map.reserve(1000);
        let buckets = map.bucket_count();

        for i in 0..1000 {
            map.insert(i, i);
        }

        // No further growth was needed.
        assert_eq!(map.bucket_count(), buckets);
    });
}

#[test]
fn rehash_grows_and_shrinks() {
    let mut map: HashMap<usize, usize> = HashMap::new();
    assert_eq!(map.bucket_count(), 1);

    for i in 0..1000 {
        map.insert(i, i);
    }
    let grown = map.bucket_count();
    assert!(grown >= 1000);

    map.retain(|&k, _| k < 10);
    // Removal alone never shrinks the array.
    assert_eq!(map.bucket_count(), grown);

    map.rehash(0);
    assert!(map.bucket_count() < grown);
    for i in 0..10 {
        assert_eq!(map.get(&i), Some(&i));
    }

    map.rehash(5000);
    assert!(map.bucket_count() >= 5000);
    assert_eq!(map.len(), 10);
}

#[test]
fn mixed() {
    const LEN: usize = if cfg!(miri) { 48 } else { 1024 };
    with_map::<usize, usize>(|map| {
        let mut map = map();
        assert!(map.get(&100).is_none());
        map.insert(100, 101);
        assert_eq!(map.get(&100), Some(&101));

        assert!(map.get(&200).is_none());
        map.insert(200, 202);
        assert_eq!(map.get(&200), Some(&202));

        assert!(map.get(&300).is_none());

        assert_eq!(map.remove(&100), Some(101));
        assert_eq!(map.remove(&200), Some(202));
        assert!(map.remove(&300).is_none());

        assert!(map.get(&100).is_none());
        assert!(map.get(&200).is_none());
        assert!(map.get(&300).is_none());

        for i in 0..LEN {
            assert_eq!(map.insert(i, i + 1), None);
        }

        for i in 0..LEN {
            assert_eq!(map.get(&i), Some(&(i + 1)));
        }

        for i in 0..LEN {
            *map.get_mut(&i).unwrap() -= 1;
        }

        for i in 0..LEN {
            assert_eq!(map.get(&i), Some(&i));
        }

        for i in 0..LEN {
            assert_eq!(map.remove(&i), Some(i));
        }

        for i in 0..LEN {
            assert_eq!(map.get(&i), None);
        }

        for i in 0..(LEN * 2) {
            assert_eq!(map.insert(i, i + 1), None);
        }

        for i in 0..(LEN * 2) {
            assert_eq!(map.get(&i), Some(&(i + 1)));
        }
    });
}

#[test]
fn multi_insert_and_count() {
    with_multi_map::<usize, &'static str>(|map| {
        let mut map = map();
        map.insert(1, "a");
        map.insert(2, "b");
        map.insert(1, "c");

        assert_eq!(map.len(), 3);
        assert_eq!(map.count(&1), 2);
        assert_eq!(map.count(&2), 1);
        assert_eq!(map.count(&3), 0);
    });
}

#[test]
fn multi_get_returns_first() {
    with_multi_map::<usize, &'static str>(|map| {
        let mut map = map();
        map.insert(1, "a");
        map.insert(1, "b");

        // New duplicates go after the existing ones, so the first
        // insertion stays at the head of its run.
        assert_eq!(map.get(&1), Some(&"a"));
    });
}

#[test]
fn multi_equal_range_yields_the_run() {
    with_multi_map::<usize, usize>(|map| {
        let mut map = map();
        map.insert(7, 1);
        map.insert(8, 100);
        map.insert(7, 2);
        map.insert(9, 200);
        map.insert(7, 3);

        let mut values: Vec<usize> = map.equal_range(&7).map(|(_, &v)| v).collect();
        values.sort_unstable();
        assert_eq!(values, vec![1, 2, 3]);

        let keys: Vec<usize> = map.equal_range(&7).map(|(&k, _)| k).collect();
        assert_eq!(keys, vec![7, 7, 7]);

        assert_eq!(map.equal_range(&10).count(), 0);
    });
}

#[test]
fn multi_equal_range_mut() {
    with_multi_map::<usize, usize>(|map| {
        let mut map = map();
        map.insert(7, 1);
        map.insert(7, 2);
        map.insert(8, 50);

        for (_, value) in map.equal_range_mut(&7) {
            *value += 10;
        }

        let mut values: Vec<usize> = map.equal_range(&7).map(|(_, &v)| v).collect();
        values.sort_unstable();
        assert_eq!(values, vec![11, 12]);
        assert_eq!(map.get(&8), Some(&50));
    });
}

#[test]
fn multi_remove_all() {
    with_multi_map::<usize, usize>(|map| {
        let mut map = map();
        map.insert(1, 10);
        map.insert(1, 11);
        map.insert(1, 12);
        map.insert(2, 20);

        assert_eq!(map.remove_all(&1), 3);
        assert_eq!(map.len(), 1);
        assert_eq!(map.count(&1), 0);
        assert_eq!(map.remove_all(&1), 0);
        assert_eq!(map.get(&2), Some(&20));
    });
}

#[test]
fn multi_remove_first() {
    with_multi_map::<usize, &'static str>(|map| {
        let mut map = map();
        map.insert(1, "a");
        map.insert(1, "b");

        assert_eq!(map.remove(&1), Some((1, "a")));
        assert_eq!(map.count(&1), 1);
        assert_eq!(map.get(&1), Some(&"b"));

        assert_eq!(map.remove(&1), Some((1, "b")));
        assert_eq!(map.remove(&1), None);
    });
}

#[test]
fn multi_runs_survive_rehash() {
    with_multi_map::<usize, usize>(|map| {
        let mut map = map();

        // Interleave duplicates across enough keys to force growth.
        for i in 0..300 {
            map.insert(i % 10, i);
        }
        assert_eq!(map.len(), 300);

        // Each key keeps all of its values. Rehashes are free to
        // reorder within a run, so compare as multisets.
        for key in 0..10 {
            assert_eq!(map.count(&key), 30);
            let mut values: Vec<usize> = map.equal_range(&key).map(|(_, &v)| v).collect();
            values.sort_unstable();
            let expected: Vec<usize> = (0..30).map(|j| key + j * 10).collect();
            assert_eq!(values, expected);
        }
    });
}

#[test]
fn multi_iter_groups_keys() {
    with_multi_map::<usize, usize>(|map| {
        let mut map = map();
        for i in 0..100 {
            map.insert(i % 7, i);
        }

        // Equal keys come out adjacent: once a key's run ends, that
        // key never reappears.
        let mut seen = Vec::new();
        for (&key, _) in map.iter() {
            if seen.last() != Some(&key) {
                assert!(!seen.contains(&key));
                seen.push(key);
            }
        }
        assert_eq!(seen.len(), 7);
    });
}

#[test]
fn multi_eq_is_multiset() {
    with_multi_map::<usize, usize>(|map1| {
        with_multi_map::<usize, usize>(|map2| {
            let mut map1 = map1();
            let mut map2 = map2();

            map1.insert(1, 10);
            map1.insert(1, 11);
            map1.insert(2, 20);

            // Same pairs, different insertion order.
            map2.insert(2, 20);
            map2.insert(1, 11);
            map2.insert(1, 10);

            assert_eq!(map1, map2);

            // A different multiplicity is not equal.
            map1.insert(1, 10);
            map2.insert(1, 11);
            assert_ne!(map1, map2);
        });
    });
}

#[test]
fn multi_extend_keeps_duplicates() {
    with_multi_map::<usize, usize>(|map| {
        let mut map = map();
        map.extend([(1, 10), (1, 11), (2, 20)]);
        assert_eq!(map.len(), 3);
        assert_eq!(map.count(&1), 2);
    });
}

#[test]
fn multi_from_array_keeps_duplicates() {
    use chaintable::HashMultiMap;

    let map = HashMultiMap::from([(1, "a"), (1, "b"), (2, "c")]);
    assert_eq!(map.len(), 3);
    assert_eq!(map.count(&1), 2);
}

#[test]
fn multi_clone_independent() {
    with_multi_map::<usize, usize>(|map| {
        let mut map = map();
        map.insert(1, 10);
        map.insert(1, 11);

        let mut cloned = map.clone();
        assert_eq!(map, cloned);

        cloned.insert(1, 12);
        assert_ne!(map, cloned);
        assert_eq!(map.count(&1), 2);
        assert_eq!(cloned.count(&1), 3);
    });
}

#[test]
fn multi_debug() {
    with_multi_map::<usize, usize>(|map| {
        let mut map = map();
        map.insert(1, 2);
        map.insert(1, 3);

        // No rehash has intervened, so the run is still in insertion order.
        assert_eq!(format!("{:?}", map), "{1: 2, 1: 3}");
    });
}

#[test]
fn multi_retain() {
    with_multi_map::<usize, usize>(|map| {
        let mut map = map();
        for i in 0..30 {
            map.insert(i % 3, i);
        }

        map.retain(|_, &mut v| v % 2 == 0);

        assert_eq!(map.len(), 15);
        assert!(map.equal_range(&0).all(|(_, &v)| v % 2 == 0));
    });
}

#[test]
fn multi_values_dropped() {
    let key = Arc::new(0);
    let value = Arc::new(0);

    with_multi_map::<Arc<usize>, Arc<usize>>(|map| {
        let mut map = map();
        map.insert(key.clone(), value.clone());
        map.insert(key.clone(), value.clone());
        assert_eq!(Arc::strong_count(&key), 3);
        assert_eq!(Arc::strong_count(&value), 3);

        assert_eq!(map.remove_all(&key), 2);
        assert_eq!(Arc::strong_count(&key), 1);
        assert_eq!(Arc::strong_count(&value), 1);

        map.insert(key.clone(), value.clone());
        drop(map);
        assert_eq!(Arc::strong_count(&key), 1);
        assert_eq!(Arc::strong_count(&value), 1);
    });
}

// Run tests with hashers that put every key in the same chain.
mod hasher {
    use super::*;

    fn check<S: std::hash::BuildHasher + Default>() {
        let range = if cfg!(miri) { 0..16 } else { 0..100 };

        let mut map: HashMap<i32, i32, S> = HashMap::with_hasher(S::default());
        for i in range.clone() {
            map.insert(i, i);
        }

        assert!(!map.contains_key(&i32::MIN));
        assert!(!map.contains_key(&(range.start - 1)));
        for i in range.clone() {
            assert!(map.contains_key(&i));
        }
        assert!(!map.contains_key(&range.end));
        assert!(!map.contains_key(&i32::MAX));

        for i in range.clone() {
            assert_eq!(map.remove(&i), Some(i));
        }
        assert!(map.is_empty());
    }

    #[test]
    fn test_zero_hasher() {
        #[derive(Default)]
        pub struct ZeroHasher;

        impl Hasher for ZeroHasher {
            fn finish(&self) -> u64 {
                0
            }

            fn write(&mut self, _: &[u8]) {}
        }

        check::<BuildHasherDefault<ZeroHasher>>();
    }

    #[test]
    fn test_max_hasher() {
        #[derive(Default)]
        struct MaxHasher;

        impl Hasher for MaxHasher {
            fn finish(&self) -> u64 {
                u64::MAX
            }

            fn write(&mut self, _: &[u8]) {}
        }

        check::<BuildHasherDefault<MaxHasher>>();
    }
}
