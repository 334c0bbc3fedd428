#![doc = include_str!("../README.md")]

pub mod raw;

pub mod map;
pub mod set;

#[cfg(feature = "serde")]
mod serde_impls;

pub use map::{HashMap, HashMapBuilder, HashMultiMap, HashMultiMapBuilder, OccupiedError};
pub use set::{HashMultiSet, HashMultiSetBuilder, HashSet, HashSetBuilder};
