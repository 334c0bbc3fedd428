use crate::raw::{self, Hashed, InsertUnique, PairKey, RawTable, RehashPolicy};

use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;
use std::mem;

/// A hash map with unique keys, built on the open-chained raw table.
///
/// Keys are hashed with the map's [`BuildHasher`] and hash codes are
/// cached per entry, so rehashing never re-invokes the hasher. For
/// duplicate-key storage see [`HashMultiMap`]; for direct control over
/// hashing, caching, and allocation see the [`raw`](crate::raw) module.
pub struct HashMap<K, V, S = RandomState>
where
    K: Hash,
    S: BuildHasher,
{
    raw: RawTable<(K, V), Hashed<PairKey, S, u64>>,
}

/// A builder for a [`HashMap`].
///
/// # Examples
///
/// ```
/// use chaintable::HashMap;
/// use std::collections::hash_map::RandomState;
///
/// let map: HashMap<i32, &str> = HashMap::builder()
///     // Set the initial capacity.
///     .capacity(128)
///     // Set the hasher.
///     .hasher(RandomState::new())
///     // Grow once a bucket holds two entries on average.
///     .max_load_factor(2.0)
///     // Quadruple the bucket count on growth.
///     .growth_factor(4.0)
///     // Construct the hash map.
///     .build();
/// ```
pub struct HashMapBuilder<K, V, S = RandomState> {
    hasher: S,
    capacity: usize,
    max_load_factor: f32,
    growth_factor: f32,
    _kv: PhantomData<(K, V)>,
}

impl<K, V> HashMapBuilder<K, V> {
    /// Set the hash builder used to hash keys.
    ///
    /// Warning: `hasher` is normally randomly generated, and is designed
    /// to allow maps to be resistant to attacks that cause many
    /// collisions and very poor performance. Setting it manually using
    /// this function can expose a DoS attack vector.
    pub fn hasher<S>(self, hasher: S) -> HashMapBuilder<K, V, S> {
        HashMapBuilder {
            hasher,
            capacity: self.capacity,
            max_load_factor: self.max_load_factor,
            growth_factor: self.growth_factor,
            _kv: PhantomData,
        }
    }
}

impl<K, V, S> HashMapBuilder<K, V, S> {
    /// Set the initial capacity of the map.
    ///
    /// The map holds at least `capacity` entries before its first
    /// rehash. If `capacity` is 0, it will not allocate.
    pub fn capacity(self, capacity: usize) -> HashMapBuilder<K, V, S> {
        HashMapBuilder {
            capacity,
            hasher: self.hasher,
            max_load_factor: self.max_load_factor,
            growth_factor: self.growth_factor,
            _kv: PhantomData,
        }
    }

    /// Set the load factor at which the map grows: the average number
    /// of entries per bucket that triggers a rehash. Defaults to 1.0.
    ///
    /// # Panics
    ///
    /// `build` panics if the load factor is not positive and finite.
    pub fn max_load_factor(self, max_load_factor: f32) -> HashMapBuilder<K, V, S> {
        HashMapBuilder {
            max_load_factor,
            hasher: self.hasher,
            capacity: self.capacity,
            growth_factor: self.growth_factor,
            _kv: PhantomData,
        }
    }

    /// Set the factor by which the bucket count grows on rehash.
    /// Defaults to 2.0; the count is then snapped to a prime.
    ///
    /// # Panics
    ///
    /// `build` panics if the growth factor is less than 1.0.
    pub fn growth_factor(self, growth_factor: f32) -> HashMapBuilder<K, V, S> {
        HashMapBuilder {
            growth_factor,
            hasher: self.hasher,
            capacity: self.capacity,
            max_load_factor: self.max_load_factor,
            _kv: PhantomData,
        }
    }

    /// Construct a [`HashMap`] from the builder, using the configured
    /// options.
    pub fn build(self) -> HashMap<K, V, S>
    where
        K: Hash,
        S: BuildHasher,
    {
        HashMap {
            raw: RawTable::with_policy_in(
                RehashPolicy::with_factors(self.max_load_factor, self.growth_factor),
                self.capacity,
                Hashed::new(self.hasher),
                raw::Global,
            ),
        }
    }
}

impl<K, V, S> fmt::Debug for HashMapBuilder<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashMapBuilder")
            .field("capacity", &self.capacity)
            .field("max_load_factor", &self.max_load_factor)
            .field("growth_factor", &self.growth_factor)
            .finish()
    }
}

impl<K: Hash, V> HashMap<K, V> {
    /// Creates an empty `HashMap`.
    ///
    /// The map is initially created with a capacity of 0, so it will
    /// not allocate until it is first inserted into.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaintable::HashMap;
    /// let map: HashMap<&str, i32> = HashMap::new();
    /// ```
    pub fn new() -> HashMap<K, V> {
        HashMap::with_capacity_and_hasher(0, RandomState::new())
    }

    /// Creates an empty `HashMap` with at least the specified capacity.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaintable::HashMap;
    /// let map: HashMap<&str, i32> = HashMap::with_capacity(10);
    /// ```
    pub fn with_capacity(capacity: usize) -> HashMap<K, V> {
        HashMap::with_capacity_and_hasher(capacity, RandomState::new())
    }

    /// Returns a builder for a `HashMap`.
    ///
    /// The builder can be used for more complex configuration, such as
    /// the load factor and growth factor.
    pub fn builder() -> HashMapBuilder<K, V> {
        HashMapBuilder {
            hasher: RandomState::default(),
            capacity: 0,
            max_load_factor: RehashPolicy::DEFAULT_MAX_LOAD_FACTOR,
            growth_factor: RehashPolicy::DEFAULT_GROWTH_FACTOR,
            _kv: PhantomData,
        }
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Hash,
    S: BuildHasher,
{
    /// Creates an empty `HashMap` which will use the given hash builder
    /// to hash keys.
    pub fn with_hasher(hash_builder: S) -> HashMap<K, V, S> {
        HashMap::with_capacity_and_hasher(0, hash_builder)
    }

    /// Creates an empty `HashMap` with at least the specified capacity,
    /// using `hash_builder` to hash the keys.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> HashMap<K, V, S> {
        HashMap {
            raw: RawTable::with_capacity(capacity, Hashed::new(hash_builder)),
        }
    }

    /// Returns the number of entries in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaintable::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert(1, "a");
    /// map.insert(2, "b");
    /// assert_eq!(map.len(), 2);
    /// ```
    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the map is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaintable::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// assert!(map.is_empty());
    /// map.insert("a", 1);
    /// assert!(!map.is_empty());
    /// ```
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of buckets the map currently uses.
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.raw.bucket_count()
    }

    /// Returns a reference to the map's [`BuildHasher`].
    #[inline]
    pub fn hasher(&self) -> &S {
        self.raw.strategy().hasher()
    }

    /// An iterator visiting all key-value pairs in arbitrary order.
    /// The iterator element type is `(&K, &V)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaintable::HashMap;
    ///
    /// let map = HashMap::from([(1, "a"), (2, "b")]);
    /// for (key, value) in map.iter() {
    ///     println!("{key}: {value}");
    /// }
    /// ```
    #[inline]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            raw: self.raw.iter(),
        }
    }

    /// An iterator visiting all key-value pairs in arbitrary order,
    /// with mutable references to the values.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaintable::HashMap;
    ///
    /// let mut map = HashMap::from([(1, 10), (2, 20)]);
    /// for (_, value) in map.iter_mut() {
    ///     *value += 1;
    /// }
    /// assert_eq!(map.get(&1), Some(&11));
    /// ```
    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            raw: self.raw.iter_mut(),
        }
    }

    /// An iterator visiting all keys in arbitrary order.
    #[inline]
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { raw: self.iter() }
    }

    /// An iterator visiting all values in arbitrary order.
    #[inline]
    pub fn values(&self) -> Values<'_, K, V> {
        Values { raw: self.iter() }
    }

    /// An iterator visiting all values mutably in arbitrary order.
    #[inline]
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            raw: self.iter_mut(),
        }
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Returns a reference to the value corresponding to the key.
    ///
    /// The key may be any borrowed form of the map's key type, but
    /// [`Hash`] and [`Eq`] on the borrowed form *must* match those for
    /// the key type.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaintable::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert(1, "a");
    /// assert_eq!(map.get(&1), Some(&"a"));
    /// assert_eq!(map.get(&2), None);
    /// ```
    #[inline]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.raw.find(key, |e| e.0.borrow() == key).map(|e| &e.1)
    }

    /// Returns a mutable reference to the value corresponding to the
    /// key.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaintable::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert(1, "a");
    /// if let Some(v) = map.get_mut(&1) {
    ///     *v = "b";
    /// }
    /// assert_eq!(map.get(&1), Some(&"b"));
    /// ```
    #[inline]
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.raw
            .find_mut(key, |e| e.0.borrow() == key)
            .map(|e| &mut e.1)
    }

    /// Returns the key-value pair corresponding to the key.
    #[inline]
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.raw
            .find(key, |e| e.0.borrow() == key)
            .map(|e| (&e.0, &e.1))
    }

    /// Returns `true` if the map contains a value for the specified
    /// key.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaintable::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert(1, "a");
    /// assert!(map.contains_key(&1));
    /// assert!(!map.contains_key(&2));
    /// ```
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map did not have this key present, `None` is returned.
    /// If it did, the value is updated and the old value is returned;
    /// the key is not updated, which matters for types that can be
    /// `==` without being identical.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaintable::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// assert_eq!(map.insert(37, "a"), None);
    /// assert_eq!(map.insert(37, "b"), Some("a"));
    /// assert_eq!(map.get(&37), Some(&"b"));
    /// ```
    #[inline]
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.raw.insert_unique((key, value), |a, b| a.0 == b.0) {
            InsertUnique::Inserted(_) => None,
            InsertUnique::Occupied {
                current,
                value: element,
            } => Some(mem::replace(&mut current.1, element.1)),
        }
    }

    /// Inserts a key-value pair, failing if the key is already present.
    ///
    /// On failure nothing in the map changes, nothing is allocated,
    /// and the rejected pair is handed back in the error alongside a
    /// reference to the current entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaintable::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// assert_eq!(map.try_insert(37, "a").unwrap(), &"a");
    ///
    /// let err = map.try_insert(37, "b").unwrap_err();
    /// assert_eq!(err.current, (&37, &"a"));
    /// assert_eq!(err.not_inserted, (37, "b"));
    /// ```
    pub fn try_insert(&mut self, key: K, value: V) -> Result<&mut V, OccupiedError<'_, K, V>> {
        match self.raw.insert_unique((key, value), |a, b| a.0 == b.0) {
            InsertUnique::Inserted(e) => Ok(&mut e.1),
            InsertUnique::Occupied {
                current,
                value: element,
            } => Err(OccupiedError {
                current: (&current.0, &current.1),
                not_inserted: element,
            }),
        }
    }

    /// Removes a key from the map, returning the value at the key if
    /// the key was previously in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaintable::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert(1, "a");
    /// assert_eq!(map.remove(&1), Some("a"));
    /// assert_eq!(map.remove(&1), None);
    /// ```
    #[inline]
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.raw.remove(key, |e| e.0.borrow() == key).map(|e| e.1)
    }

    /// Removes a key from the map, returning the stored key and value
    /// if the key was previously in the map.
    #[inline]
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.raw.remove(key, |e| e.0.borrow() == key)
    }

    /// Retains only the elements specified by the predicate.
    ///
    /// In other words, remove all pairs `(k, v)` for which
    /// `f(&k, &mut v)` returns `false`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaintable::HashMap;
    ///
    /// let mut map: HashMap<i32, i32> = (0..8).map(|x| (x, x * 10)).collect();
    /// map.retain(|&k, _| k % 2 == 0);
    /// assert_eq!(map.len(), 4);
    /// ```
    #[inline]
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        self.raw.retain(|e| f(&e.0, &mut e.1))
    }

    /// Clears the map, removing all key-value pairs. Keeps the
    /// allocated buckets for reuse.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaintable::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert(1, "a");
    /// map.clear();
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    pub fn clear(&mut self) {
        self.raw.clear()
    }

    /// Reserves capacity for `additional` more entries to be inserted
    /// without rehashing.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaintable::HashMap;
    ///
    /// let mut map: HashMap<&str, i32> = HashMap::new();
    /// map.reserve(10);
    /// ```
    #[inline]
    pub fn reserve(&mut self, additional: usize) {
        self.raw.reserve(additional)
    }

    /// Rebuilds the map with at least `min_buckets` buckets. This is
    /// the one way to shrink the bucket array; `rehash(0)` shrinks it
    /// to fit the current entries, or releases it entirely when the
    /// map is empty.
    #[inline]
    pub fn rehash(&mut self, min_buckets: usize) {
        self.raw.rehash(min_buckets)
    }
}

impl<K, V, S> Default for HashMap<K, V, S>
where
    K: Hash,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        HashMap::with_hasher(S::default())
    }
}

impl<K, V, S> Clone for HashMap<K, V, S>
where
    K: Clone + Hash,
    V: Clone,
    S: BuildHasher + Clone,
{
    fn clone(&self) -> HashMap<K, V, S> {
        HashMap {
            raw: self.raw.clone(),
        }
    }
}

impl<K, V, S> fmt::Debug for HashMap<K, V, S>
where
    K: fmt::Debug + Hash,
    V: fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> PartialEq for HashMap<K, V, S>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }

        self.iter()
            .all(|(k, v)| other.get(k).map_or(false, |ov| *ov == *v))
    }
}

impl<K, V, S> Eq for HashMap<K, V, S>
where
    K: Hash + Eq,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> Extend<(K, V)> for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        // from `hashbrown::HashMap::extend`:
        // Keys may be already present or show multiple times in the
        // iterator. Reserve the entire hint lower bound if the map is
        // empty. Otherwise reserve half the hint (rounded up), so the
        // map will only resize twice in the worst case.
        let iter = iter.into_iter();
        let reserve = if self.is_empty() {
            iter.size_hint().0
        } else {
            (iter.size_hint().0 + 1) / 2
        };
        self.reserve(reserve);

        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, K, V, S> Extend<(&'a K, &'a V)> for HashMap<K, V, S>
where
    K: Copy + Hash + Eq + 'a,
    V: Copy + 'a,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = (&'a K, &'a V)>>(&mut self, iter: T) {
        self.extend(iter.into_iter().map(|(&k, &v)| (k, v)));
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for HashMap<K, V, RandomState>
where
    K: Hash + Eq,
{
    fn from(arr: [(K, V); N]) -> Self {
        HashMap::from_iter(arr)
    }
}

impl<K, V, S> FromIterator<(K, V)> for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let iter = iter.into_iter();
        let mut map = HashMap::with_capacity_and_hasher(iter.size_hint().0, S::default());
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<'a, K: Hash, V, S: BuildHasher> IntoIterator for &'a HashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K: Hash, V, S: BuildHasher> IntoIterator for &'a mut HashMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

impl<K: Hash, V, S: BuildHasher> IntoIterator for HashMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter {
            raw: self.raw.into_iter(),
        }
    }
}

/// The error returned by [`HashMap::try_insert`] when the key already
/// exists.
#[derive(Debug, PartialEq, Eq)]
pub struct OccupiedError<'a, K, V> {
    /// The entry in the map that was already there.
    pub current: (&'a K, &'a V),
    /// The pair which was not inserted, because the entry was already
    /// occupied.
    pub not_inserted: (K, V),
}

/// A hash map that keeps every inserted pair, including duplicate
/// keys.
///
/// Equal keys are stored next to each other and come back together
/// from [`equal_range`](HashMultiMap::equal_range). There is no
/// replacing insert; [`remove_all`](HashMultiMap::remove_all) drops a
/// key's entire run at once.
///
/// # Examples
///
/// ```
/// use chaintable::HashMultiMap;
///
/// let mut map = HashMultiMap::new();
/// map.insert("fruit", "apple");
/// map.insert("veg", "carrot");
/// map.insert("fruit", "pear");
///
/// let fruit: Vec<_> = map.equal_range(&"fruit").map(|(_, v)| *v).collect();
/// assert_eq!(fruit, ["apple", "pear"]);
///
/// assert_eq!(map.remove_all(&"fruit"), 2);
/// assert_eq!(map.len(), 1);
/// ```
pub struct HashMultiMap<K, V, S = RandomState>
where
    K: Hash,
    S: BuildHasher,
{
    raw: RawTable<(K, V), Hashed<PairKey, S, u64>>,
}

/// A builder for a [`HashMultiMap`].
pub struct HashMultiMapBuilder<K, V, S = RandomState> {
    hasher: S,
    capacity: usize,
    max_load_factor: f32,
    growth_factor: f32,
    _kv: PhantomData<(K, V)>,
}

impl<K, V> HashMultiMapBuilder<K, V> {
    /// Set the hash builder used to hash keys.
    pub fn hasher<S>(self, hasher: S) -> HashMultiMapBuilder<K, V, S> {
        HashMultiMapBuilder {
            hasher,
            capacity: self.capacity,
            max_load_factor: self.max_load_factor,
            growth_factor: self.growth_factor,
            _kv: PhantomData,
        }
    }
}

impl<K, V, S> HashMultiMapBuilder<K, V, S> {
    /// Set the initial capacity of the map.
    pub fn capacity(self, capacity: usize) -> HashMultiMapBuilder<K, V, S> {
        HashMultiMapBuilder {
            capacity,
            hasher: self.hasher,
            max_load_factor: self.max_load_factor,
            growth_factor: self.growth_factor,
            _kv: PhantomData,
        }
    }

    /// Set the load factor at which the map grows. Defaults to 1.0.
    pub fn max_load_factor(self, max_load_factor: f32) -> HashMultiMapBuilder<K, V, S> {
        HashMultiMapBuilder {
            max_load_factor,
            hasher: self.hasher,
            capacity: self.capacity,
            growth_factor: self.growth_factor,
            _kv: PhantomData,
        }
    }

    /// Set the factor by which the bucket count grows on rehash.
    /// Defaults to 2.0.
    pub fn growth_factor(self, growth_factor: f32) -> HashMultiMapBuilder<K, V, S> {
        HashMultiMapBuilder {
            growth_factor,
            hasher: self.hasher,
            capacity: self.capacity,
            max_load_factor: self.max_load_factor,
            _kv: PhantomData,
        }
    }

    /// Construct a [`HashMultiMap`] from the builder, using the
    /// configured options.
    pub fn build(self) -> HashMultiMap<K, V, S>
    where
        K: Hash,
        S: BuildHasher,
    {
        HashMultiMap {
            raw: RawTable::with_policy_in(
                RehashPolicy::with_factors(self.max_load_factor, self.growth_factor),
                self.capacity,
                Hashed::new(self.hasher),
                raw::Global,
            ),
        }
    }
}

impl<K, V, S> fmt::Debug for HashMultiMapBuilder<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashMultiMapBuilder")
            .field("capacity", &self.capacity)
            .field("max_load_factor", &self.max_load_factor)
            .field("growth_factor", &self.growth_factor)
            .finish()
    }
}

impl<K: Hash, V> HashMultiMap<K, V> {
    /// Creates an empty `HashMultiMap`. Does not allocate.
    pub fn new() -> HashMultiMap<K, V> {
        HashMultiMap::with_capacity_and_hasher(0, RandomState::new())
    }

    /// Creates an empty `HashMultiMap` with at least the specified
    /// capacity.
    pub fn with_capacity(capacity: usize) -> HashMultiMap<K, V> {
        HashMultiMap::with_capacity_and_hasher(capacity, RandomState::new())
    }

    /// Returns a builder for a `HashMultiMap`.
    pub fn builder() -> HashMultiMapBuilder<K, V> {
        HashMultiMapBuilder {
            hasher: RandomState::default(),
            capacity: 0,
            max_load_factor: RehashPolicy::DEFAULT_MAX_LOAD_FACTOR,
            growth_factor: RehashPolicy::DEFAULT_GROWTH_FACTOR,
            _kv: PhantomData,
        }
    }
}

impl<K, V, S> HashMultiMap<K, V, S>
where
    K: Hash,
    S: BuildHasher,
{
    /// Creates an empty `HashMultiMap` which will use the given hash
    /// builder to hash keys.
    pub fn with_hasher(hash_builder: S) -> HashMultiMap<K, V, S> {
        HashMultiMap::with_capacity_and_hasher(0, hash_builder)
    }

    /// Creates an empty `HashMultiMap` with at least the specified
    /// capacity, using `hash_builder` to hash the keys.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> HashMultiMap<K, V, S> {
        HashMultiMap {
            raw: RawTable::with_capacity(capacity, Hashed::new(hash_builder)),
        }
    }

    /// Returns the number of entries in the map, counting every
    /// duplicate.
    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the map is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of buckets the map currently uses.
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.raw.bucket_count()
    }

    /// Returns a reference to the map's [`BuildHasher`].
    #[inline]
    pub fn hasher(&self) -> &S {
        self.raw.strategy().hasher()
    }

    /// An iterator visiting all key-value pairs in arbitrary order,
    /// with equal keys adjacent.
    #[inline]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            raw: self.raw.iter(),
        }
    }

    /// An iterator visiting all key-value pairs with mutable
    /// references to the values.
    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            raw: self.raw.iter_mut(),
        }
    }

    /// An iterator visiting all keys, with duplicates.
    #[inline]
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { raw: self.iter() }
    }

    /// An iterator visiting all values in arbitrary order.
    #[inline]
    pub fn values(&self) -> Values<'_, K, V> {
        Values { raw: self.iter() }
    }

    /// An iterator visiting all values mutably in arbitrary order.
    #[inline]
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            raw: self.iter_mut(),
        }
    }
}

impl<K, V, S> HashMultiMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Inserts a key-value pair into the map. Always succeeds; an
    /// existing pair under the same key is kept, and the new pair goes
    /// to the end of the key's run.
    ///
    /// Returns a mutable reference to the inserted value.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaintable::HashMultiMap;
    ///
    /// let mut map = HashMultiMap::new();
    /// map.insert(1, "a");
    /// map.insert(1, "b");
    /// assert_eq!(map.len(), 2);
    /// ```
    #[inline]
    pub fn insert(&mut self, key: K, value: V) -> &mut V {
        &mut self.raw.insert_multi((key, value), |a, b| a.0 == b.0).1
    }

    /// Returns a reference to the first value of the key's run.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaintable::HashMultiMap;
    ///
    /// let mut map = HashMultiMap::new();
    /// map.insert(1, "a");
    /// map.insert(1, "b");
    /// assert_eq!(map.get(&1), Some(&"a"));
    /// assert_eq!(map.get(&2), None);
    /// ```
    #[inline]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.raw.find(key, |e| e.0.borrow() == key).map(|e| &e.1)
    }

    /// Returns `true` if the map contains at least one value for the
    /// key.
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// The number of values stored under the key.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaintable::HashMultiMap;
    ///
    /// let mut map = HashMultiMap::new();
    /// map.insert("a", 1);
    /// map.insert("a", 2);
    /// assert_eq!(map.count(&"a"), 2);
    /// assert_eq!(map.count(&"b"), 0);
    /// ```
    #[inline]
    pub fn count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.raw.count(key, |e| e.0.borrow() == key)
    }

    /// Iterates over every pair stored under the key. The pairs are
    /// adjacent in their chain; their relative order is unspecified
    /// once the table has rehashed.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaintable::HashMultiMap;
    ///
    /// let mut map = HashMultiMap::new();
    /// map.insert(1, "a");
    /// map.insert(2, "x");
    /// map.insert(1, "b");
    ///
    /// let values: Vec<_> = map.equal_range(&1).map(|(_, v)| *v).collect();
    /// assert_eq!(values, ["a", "b"]);
    /// ```
    #[inline]
    pub fn equal_range<Q>(&self, key: &Q) -> EqualRange<'_, K, V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        EqualRange {
            raw: self.raw.equal_range(key, |e| e.0.borrow() == key),
        }
    }

    /// Iterates over every pair stored under the key with mutable
    /// references to the values.
    #[inline]
    pub fn equal_range_mut<Q>(&mut self, key: &Q) -> EqualRangeMut<'_, K, V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        EqualRangeMut {
            raw: self.raw.equal_range_mut(key, |e| e.0.borrow() == key),
        }
    }

    /// Removes every value stored under the key, returning how many
    /// were removed.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaintable::HashMultiMap;
    ///
    /// let mut map = HashMultiMap::new();
    /// map.insert(1, "a");
    /// map.insert(1, "b");
    /// assert_eq!(map.remove_all(&1), 2);
    /// assert_eq!(map.remove_all(&1), 0);
    /// ```
    #[inline]
    pub fn remove_all<Q>(&mut self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.raw.erase(key, |e| e.0.borrow() == key)
    }

    /// Removes and returns one pair stored under the key, the first
    /// of its run.
    #[inline]
    pub fn remove<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.raw.remove(key, |e| e.0.borrow() == key)
    }

    /// Retains only the pairs specified by the predicate.
    #[inline]
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        self.raw.retain(|e| f(&e.0, &mut e.1))
    }

    /// Clears the map, removing all pairs. Keeps the allocated buckets
    /// for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.raw.clear()
    }

    /// Reserves capacity for `additional` more pairs to be inserted
    /// without rehashing.
    #[inline]
    pub fn reserve(&mut self, additional: usize) {
        self.raw.reserve(additional)
    }

    /// Rebuilds the map with at least `min_buckets` buckets; see
    /// [`HashMap::rehash`].
    #[inline]
    pub fn rehash(&mut self, min_buckets: usize) {
        self.raw.rehash(min_buckets)
    }
}

impl<K, V, S> Default for HashMultiMap<K, V, S>
where
    K: Hash,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        HashMultiMap::with_hasher(S::default())
    }
}

impl<K, V, S> Clone for HashMultiMap<K, V, S>
where
    K: Clone + Hash,
    V: Clone,
    S: BuildHasher + Clone,
{
    fn clone(&self) -> HashMultiMap<K, V, S> {
        HashMultiMap {
            raw: self.raw.clone(),
        }
    }
}

impl<K, V, S> fmt::Debug for HashMultiMap<K, V, S>
where
    K: fmt::Debug + Hash,
    V: fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> PartialEq for HashMultiMap<K, V, S>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }

        // Multiset equality: every pair occurs the same number of
        // times on both sides. Checking multiplicities from one side
        // suffices because the total lengths match.
        self.iter().all(|(k, v)| {
            let ours = self.equal_range(k).filter(|(_, x)| *x == v).count();
            let theirs = other.equal_range(k).filter(|(_, x)| *x == v).count();
            ours == theirs
        })
    }
}

impl<K, V, S> Eq for HashMultiMap<K, V, S>
where
    K: Hash + Eq,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> Extend<(K, V)> for HashMultiMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        let iter = iter.into_iter();
        // Every pair will be inserted, so the full hint is the right
        // reservation regardless of duplicates.
        self.reserve(iter.size_hint().0);

        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for HashMultiMap<K, V, RandomState>
where
    K: Hash + Eq,
{
    fn from(arr: [(K, V); N]) -> Self {
        HashMultiMap::from_iter(arr)
    }
}

impl<K, V, S> FromIterator<(K, V)> for HashMultiMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let iter = iter.into_iter();
        let mut map = HashMultiMap::with_capacity_and_hasher(iter.size_hint().0, S::default());
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<'a, K: Hash, V, S: BuildHasher> IntoIterator for &'a HashMultiMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K: Hash, V, S: BuildHasher> IntoIterator for &'a mut HashMultiMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

impl<K: Hash, V, S: BuildHasher> IntoIterator for HashMultiMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter {
            raw: self.raw.into_iter(),
        }
    }
}

/// An iterator over a map's entries.
///
/// This struct is created by the [`iter`](HashMap::iter) method on
/// [`HashMap`] and [`HashMultiMap`].
pub struct Iter<'a, K, V> {
    raw: raw::Iter<'a, (K, V), u64>,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            raw: self.raw.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.raw.next().map(|e| (&e.0, &e.1))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.raw.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> std::iter::FusedIterator for Iter<'_, K, V> {}

impl<K, V> fmt::Debug for Iter<'_, K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.clone()).finish()
    }
}

/// A mutable iterator over a map's entries.
pub struct IterMut<'a, K, V> {
    raw: raw::IterMut<'a, (K, V), u64>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.raw.next()?;
        Some((&entry.0, &mut entry.1))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.raw.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> std::iter::FusedIterator for IterMut<'_, K, V> {}

/// An owning iterator over a map's entries.
pub struct IntoIter<K, V> {
    raw: raw::IntoIter<(K, V), u64, raw::Global>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<(K, V)> {
        self.raw.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.raw.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> std::iter::FusedIterator for IntoIter<K, V> {}

/// An iterator over a map's keys.
pub struct Keys<'a, K, V> {
    raw: Iter<'a, K, V>,
}

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Keys {
            raw: self.raw.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<&'a K> {
        self.raw.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.raw.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> std::iter::FusedIterator for Keys<'_, K, V> {}

/// An iterator over a map's values.
pub struct Values<'a, K, V> {
    raw: Iter<'a, K, V>,
}

impl<K, V> Clone for Values<'_, K, V> {
    fn clone(&self) -> Self {
        Values {
            raw: self.raw.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<&'a V> {
        self.raw.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.raw.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> std::iter::FusedIterator for Values<'_, K, V> {}

/// A mutable iterator over a map's values.
pub struct ValuesMut<'a, K, V> {
    raw: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    #[inline]
    fn next(&mut self) -> Option<&'a mut V> {
        self.raw.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.raw.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}
impl<K, V> std::iter::FusedIterator for ValuesMut<'_, K, V> {}

/// An iterator over the pairs stored under one key, created by
/// [`HashMultiMap::equal_range`].
pub struct EqualRange<'a, K, V> {
    raw: raw::ChainIter<'a, (K, V), u64>,
}

impl<K, V> Clone for EqualRange<'_, K, V> {
    fn clone(&self) -> Self {
        EqualRange {
            raw: self.raw.clone(),
        }
    }
}

impl<'a, K, V> Iterator for EqualRange<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.raw.next().map(|e| (&e.0, &e.1))
    }
}

impl<K, V> std::iter::FusedIterator for EqualRange<'_, K, V> {}

impl<K, V> fmt::Debug for EqualRange<'_, K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// A mutable iterator over the pairs stored under one key, created by
/// [`HashMultiMap::equal_range_mut`].
pub struct EqualRangeMut<'a, K, V> {
    raw: raw::ChainIterMut<'a, (K, V), u64>,
}

impl<'a, K, V> Iterator for EqualRangeMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.raw.next()?;
        Some((&entry.0, &mut entry.1))
    }
}

impl<K, V> std::iter::FusedIterator for EqualRangeMut<'_, K, V> {}
