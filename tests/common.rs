#![allow(dead_code)]

use chaintable::{HashMap, HashMultiMap, HashMultiSet, HashSet};

use std::hash::Hash;

// Run the test on different configurations of a `HashMap`.
pub fn with_map<K: Hash, V>(mut test: impl FnMut(&dyn Fn() -> HashMap<K, V>)) {
    // Default configuration, no preallocation.
    test(&HashMap::new);

    // Preallocated buckets.
    test(&(|| HashMap::builder().capacity(128).build()));

    // A low load factor, rehashing often.
    test(&(|| HashMap::builder().max_load_factor(0.5).build()));

    // Long chains and a slow-growing array.
    test(
        &(|| {
            HashMap::builder()
                .max_load_factor(4.0)
                .growth_factor(1.5)
                .build()
        }),
    );
}

// Run the test on different configurations of a `HashMultiMap`.
pub fn with_multi_map<K: Hash, V>(mut test: impl FnMut(&dyn Fn() -> HashMultiMap<K, V>)) {
    test(&HashMultiMap::new);

    test(&(|| HashMultiMap::builder().capacity(128).build()));

    test(&(|| HashMultiMap::builder().max_load_factor(0.5).build()));

    test(
        &(|| {
            HashMultiMap::builder()
                .max_load_factor(4.0)
                .growth_factor(1.5)
                .build()
        }),
    );
}

// Run the test on different configurations of a `HashSet`.
pub fn with_set<K: Hash>(mut test: impl FnMut(&dyn Fn() -> HashSet<K>)) {
    test(&HashSet::new);

    test(&(|| HashSet::builder().capacity(128).build()));

    test(&(|| HashSet::builder().max_load_factor(0.5).build()));

    test(
        &(|| {
            HashSet::builder()
                .max_load_factor(4.0)
                .growth_factor(1.5)
                .build()
        }),
    );
}

// Run the test on different configurations of a `HashMultiSet`.
pub fn with_multi_set<K: Hash>(mut test: impl FnMut(&dyn Fn() -> HashMultiSet<K>)) {
    test(&HashMultiSet::new);

    test(&(|| HashMultiSet::builder().capacity(128).build()));

    test(&(|| HashMultiSet::builder().max_load_factor(0.5).build()));

    test(
        &(|| {
            HashMultiSet::builder()
                .max_load_factor(4.0)
                .growth_factor(1.5)
                .build()
        }),
    );
}
