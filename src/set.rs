use crate::raw::{self, Hashed, InsertUnique, RawTable, RehashPolicy, SelfKey};

use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;

/// A hash set with unique values, built on the open-chained raw table.
///
/// For duplicate-value storage see [`HashMultiSet`].
pub struct HashSet<K, S = RandomState>
where
    K: Hash,
    S: BuildHasher,
{
    raw: RawTable<K, Hashed<SelfKey, S, u64>>,
}

/// A builder for a [`HashSet`].
///
/// # Examples
///
/// ```
/// use chaintable::HashSet;
/// use std::collections::hash_map::RandomState;
///
/// let set: HashSet<i32> = HashSet::builder()
///     // Set the initial capacity.
///     .capacity(2048)
///     // Set the hasher.
///     .hasher(RandomState::new())
///     // Grow once a bucket holds two values on average.
///     .max_load_factor(2.0)
///     // Construct the hash set.
///     .build();
/// ```
pub struct HashSetBuilder<K, S = RandomState> {
    hasher: S,
    capacity: usize,
    max_load_factor: f32,
    growth_factor: f32,
    _k: PhantomData<K>,
}

impl<K> HashSetBuilder<K> {
    /// Set the hash builder used to hash values.
    ///
    /// Warning: `hasher` is normally randomly generated, and is designed
    /// to allow sets to be resistant to attacks that cause many
    /// collisions and very poor performance. Setting it manually using
    /// this function can expose a DoS attack vector.
    pub fn hasher<S>(self, hasher: S) -> HashSetBuilder<K, S> {
        HashSetBuilder {
            hasher,
            capacity: self.capacity,
            max_load_factor: self.max_load_factor,
            growth_factor: self.growth_factor,
            _k: PhantomData,
        }
    }
}

impl<K, S> HashSetBuilder<K, S> {
    /// Set the initial capacity of the set.
    ///
    /// The set holds at least `capacity` values before its first
    /// rehash. If `capacity` is 0, it will not allocate.
    pub fn capacity(self, capacity: usize) -> HashSetBuilder<K, S> {
        HashSetBuilder {
            capacity,
            hasher: self.hasher,
            max_load_factor: self.max_load_factor,
            growth_factor: self.growth_factor,
            _k: PhantomData,
        }
    }

    /// Set the load factor at which the set grows. Defaults to 1.0.
    pub fn max_load_factor(self, max_load_factor: f32) -> HashSetBuilder<K, S> {
        HashSetBuilder {
            max_load_factor,
            hasher: self.hasher,
            capacity: self.capacity,
            growth_factor: self.growth_factor,
            _k: PhantomData,
        }
    }

    /// Set the factor by which the bucket count grows on rehash.
    /// Defaults to 2.0.
    pub fn growth_factor(self, growth_factor: f32) -> HashSetBuilder<K, S> {
        HashSetBuilder {
            growth_factor,
            hasher: self.hasher,
            capacity: self.capacity,
            max_load_factor: self.max_load_factor,
            _k: PhantomData,
        }
    }

    /// Construct a [`HashSet`] from the builder, using the configured
    /// options.
    pub fn build(self) -> HashSet<K, S>
    where
        K: Hash,
        S: BuildHasher,
    {
        HashSet {
            raw: RawTable::with_policy_in(
                RehashPolicy::with_factors(self.max_load_factor, self.growth_factor),
                self.capacity,
                Hashed::new(self.hasher),
                raw::Global,
            ),
        }
    }
}

impl<K, S> fmt::Debug for HashSetBuilder<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashSetBuilder")
            .field("capacity", &self.capacity)
            .field("max_load_factor", &self.max_load_factor)
            .field("growth_factor", &self.growth_factor)
            .finish()
    }
}

impl<K: Hash> HashSet<K> {
    /// Creates an empty `HashSet`.
    ///
    /// The set is initially created with a capacity of 0, so it will
    /// not allocate until it is first inserted into.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaintable::HashSet;
    /// let set: HashSet<&str> = HashSet::new();
    /// ```
    pub fn new() -> HashSet<K> {
        HashSet::with_capacity_and_hasher(0, RandomState::new())
    }

    /// Creates an empty `HashSet` with at least the specified capacity.
    pub fn with_capacity(capacity: usize) -> HashSet<K> {
        HashSet::with_capacity_and_hasher(capacity, RandomState::new())
    }

    /// Returns a builder for a `HashSet`.
    pub fn builder() -> HashSetBuilder<K> {
        HashSetBuilder {
            hasher: RandomState::default(),
            capacity: 0,
            max_load_factor: RehashPolicy::DEFAULT_MAX_LOAD_FACTOR,
            growth_factor: RehashPolicy::DEFAULT_GROWTH_FACTOR,
            _k: PhantomData,
        }
    }
}

impl<K, S> HashSet<K, S>
where
    K: Hash,
    S: BuildHasher,
{
    /// Creates an empty `HashSet` which will use the given hash builder
    /// to hash values.
    pub fn with_hasher(hash_builder: S) -> HashSet<K, S> {
        HashSet::with_capacity_and_hasher(0, hash_builder)
    }

    /// Creates an empty `HashSet` with at least the specified capacity,
    /// using `hash_builder` to hash the values.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> HashSet<K, S> {
        HashSet {
            raw: RawTable::with_capacity(capacity, Hashed::new(hash_builder)),
        }
    }

    /// Returns the number of values in the set.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaintable::HashSet;
    ///
    /// let mut set = HashSet::new();
    /// set.insert(1);
    /// set.insert(2);
    /// assert_eq!(set.len(), 2);
    /// ```
    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of buckets the set currently uses.
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.raw.bucket_count()
    }

    /// Returns a reference to the set's [`BuildHasher`].
    #[inline]
    pub fn hasher(&self) -> &S {
        self.raw.strategy().hasher()
    }

    /// An iterator visiting all values in arbitrary order.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaintable::HashSet;
    ///
    /// let set = HashSet::from(["a", "b", "c"]);
    /// for value in set.iter() {
    ///     println!("{value}");
    /// }
    /// ```
    #[inline]
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            raw: self.raw.iter(),
        }
    }
}

impl<K, S> HashSet<K, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Returns `true` if the set contains a value.
    ///
    /// The value may be any borrowed form of the set's value type, but
    /// [`Hash`] and [`Eq`] on the borrowed form *must* match those for
    /// the value type.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaintable::HashSet;
    ///
    /// let set = HashSet::from([1, 2, 3]);
    /// assert!(set.contains(&1));
    /// assert!(!set.contains(&4));
    /// ```
    #[inline]
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(value).is_some()
    }

    /// Returns a reference to the value in the set, if any, that is
    /// equal to the given value.
    #[inline]
    pub fn get<Q>(&self, value: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.raw.find(value, |e| e.borrow() == value)
    }

    /// Adds a value to the set.
    ///
    /// Returns `true` if the value was not already present. If it was,
    /// the stored value is kept unchanged, which matters for types
    /// that can be `==` without being identical.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaintable::HashSet;
    ///
    /// let mut set = HashSet::new();
    /// assert_eq!(set.insert(37), true);
    /// assert_eq!(set.insert(37), false);
    /// assert_eq!(set.len(), 1);
    /// ```
    #[inline]
    pub fn insert(&mut self, value: K) -> bool {
        match self.raw.insert_unique(value, |a, b| a == b) {
            InsertUnique::Inserted(_) => true,
            InsertUnique::Occupied { .. } => false,
        }
    }

    /// Removes a value from the set. Returns whether the value was
    /// present.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaintable::HashSet;
    ///
    /// let mut set = HashSet::new();
    /// set.insert(2);
    /// assert_eq!(set.remove(&2), true);
    /// assert_eq!(set.remove(&2), false);
    /// ```
    #[inline]
    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.take(value).is_some()
    }

    /// Removes and returns the value in the set, if any, that is equal
    /// to the given one.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaintable::HashSet;
    ///
    /// let mut set = HashSet::from([1, 2, 3]);
    /// assert_eq!(set.take(&2), Some(2));
    /// assert_eq!(set.take(&2), None);
    /// ```
    #[inline]
    pub fn take<Q>(&mut self, value: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.raw.remove(value, |e| e.borrow() == value)
    }

    /// Retains only the values specified by the predicate.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaintable::HashSet;
    ///
    /// let mut set: HashSet<i32> = (0..8).collect();
    /// set.retain(|&v| v % 2 == 0);
    /// assert_eq!(set.len(), 4);
    /// ```
    #[inline]
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K) -> bool,
    {
        self.raw.retain(|e| f(&*e))
    }

    /// Clears the set, removing all values. Keeps the allocated
    /// buckets for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.raw.clear()
    }

    /// Reserves capacity for `additional` more values to be inserted
    /// without rehashing.
    #[inline]
    pub fn reserve(&mut self, additional: usize) {
        self.raw.reserve(additional)
    }

    /// Rebuilds the set with at least `min_buckets` buckets; see
    /// [`HashMap::rehash`](crate::HashMap::rehash).
    #[inline]
    pub fn rehash(&mut self, min_buckets: usize) {
        self.raw.rehash(min_buckets)
    }
}

impl<K, S> Default for HashSet<K, S>
where
    K: Hash,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        HashSet::with_hasher(S::default())
    }
}

impl<K, S> Clone for HashSet<K, S>
where
    K: Clone + Hash,
    S: BuildHasher + Clone,
{
    fn clone(&self) -> HashSet<K, S> {
        HashSet {
            raw: self.raw.clone(),
        }
    }
}

impl<K, S> fmt::Debug for HashSet<K, S>
where
    K: fmt::Debug + Hash,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K, S> PartialEq for HashSet<K, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }

        self.iter().all(|key| other.contains(key))
    }
}

impl<K, S> Eq for HashSet<K, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
}

impl<K, S> Extend<K> for HashSet<K, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = K>>(&mut self, iter: T) {
        // from `hashbrown::HashSet::extend`:
        // Keys may be already present or show multiple times in the
        // iterator. Reserve the entire hint lower bound if the set is
        // empty. Otherwise reserve half the hint (rounded up), so the
        // set will only resize twice in the worst case.
        let iter = iter.into_iter();
        let reserve = if self.is_empty() {
            iter.size_hint().0
        } else {
            (iter.size_hint().0 + 1) / 2
        };
        self.reserve(reserve);

        for key in iter {
            self.insert(key);
        }
    }
}

impl<'a, K, S> Extend<&'a K> for HashSet<K, S>
where
    K: Copy + Hash + Eq + 'a,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = &'a K>>(&mut self, iter: T) {
        self.extend(iter.into_iter().copied());
    }
}

impl<K, const N: usize> From<[K; N]> for HashSet<K, RandomState>
where
    K: Hash + Eq,
{
    fn from(arr: [K; N]) -> Self {
        HashSet::from_iter(arr)
    }
}

impl<K, S> FromIterator<K> for HashSet<K, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<T: IntoIterator<Item = K>>(iter: T) -> Self {
        let iter = iter.into_iter();
        let mut set = HashSet::with_capacity_and_hasher(iter.size_hint().0, S::default());
        for key in iter {
            set.insert(key);
        }
        set
    }
}

impl<'a, K: Hash, S: BuildHasher> IntoIterator for &'a HashSet<K, S> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Iter<'a, K> {
        self.iter()
    }
}

impl<K: Hash, S: BuildHasher> IntoIterator for HashSet<K, S> {
    type Item = K;
    type IntoIter = IntoIter<K>;

    fn into_iter(self) -> IntoIter<K> {
        IntoIter {
            raw: self.raw.into_iter(),
        }
    }
}

/// A hash set that keeps every inserted value, including duplicates.
///
/// Equal values are stored next to each other;
/// [`count`](HashMultiSet::count) and
/// [`equal_range`](HashMultiSet::equal_range) work per distinct value,
/// and [`remove_all`](HashMultiSet::remove_all) drops all copies at
/// once.
///
/// # Examples
///
/// ```
/// use chaintable::HashMultiSet;
///
/// let mut set = HashMultiSet::new();
/// set.insert("a");
/// set.insert("b");
/// set.insert("a");
///
/// assert_eq!(set.len(), 3);
/// assert_eq!(set.count(&"a"), 2);
/// assert_eq!(set.remove_all(&"a"), 2);
/// assert_eq!(set.len(), 1);
/// ```
pub struct HashMultiSet<K, S = RandomState>
where
    K: Hash,
    S: BuildHasher,
{
    raw: RawTable<K, Hashed<SelfKey, S, u64>>,
}

/// A builder for a [`HashMultiSet`].
pub struct HashMultiSetBuilder<K, S = RandomState> {
    hasher: S,
    capacity: usize,
    max_load_factor: f32,
    growth_factor: f32,
    _k: PhantomData<K>,
}

impl<K> HashMultiSetBuilder<K> {
    /// Set the hash builder used to hash values.
    pub fn hasher<S>(self, hasher: S) -> HashMultiSetBuilder<K, S> {
        HashMultiSetBuilder {
            hasher,
            capacity: self.capacity,
            max_load_factor: self.max_load_factor,
            growth_factor: self.growth_factor,
            _k: PhantomData,
        }
    }
}

impl<K, S> HashMultiSetBuilder<K, S> {
    /// Set the initial capacity of the set.
    pub fn capacity(self, capacity: usize) -> HashMultiSetBuilder<K, S> {
        HashMultiSetBuilder {
            capacity,
            hasher: self.hasher,
            max_load_factor: self.max_load_factor,
            growth_factor: self.growth_factor,
            _k: PhantomData,
        }
    }

    /// Set the load factor at which the set grows. Defaults to 1.0.
    pub fn max_load_factor(self, max_load_factor: f32) -> HashMultiSetBuilder<K, S> {
        HashMultiSetBuilder {
            max_load_factor,
            hasher: self.hasher,
            capacity: self.capacity,
            growth_factor: self.growth_factor,
            _k: PhantomData,
        }
    }

    /// Set the factor by which the bucket count grows on rehash.
    /// Defaults to 2.0.
    pub fn growth_factor(self, growth_factor: f32) -> HashMultiSetBuilder<K, S> {
        HashMultiSetBuilder {
            growth_factor,
            hasher: self.hasher,
            capacity: self.capacity,
            max_load_factor: self.max_load_factor,
            _k: PhantomData,
        }
    }

    /// Construct a [`HashMultiSet`] from the builder, using the
    /// configured options.
    pub fn build(self) -> HashMultiSet<K, S>
    where
        K: Hash,
        S: BuildHasher,
    {
        HashMultiSet {
            raw: RawTable::with_policy_in(
                RehashPolicy::with_factors(self.max_load_factor, self.growth_factor),
                self.capacity,
                Hashed::new(self.hasher),
                raw::Global,
            ),
        }
    }
}

impl<K, S> fmt::Debug for HashMultiSetBuilder<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashMultiSetBuilder")
            .field("capacity", &self.capacity)
            .field("max_load_factor", &self.max_load_factor)
            .field("growth_factor", &self.growth_factor)
            .finish()
    }
}

impl<K: Hash> HashMultiSet<K> {
    /// Creates an empty `HashMultiSet`. Does not allocate.
    pub fn new() -> HashMultiSet<K> {
        HashMultiSet::with_capacity_and_hasher(0, RandomState::new())
    }

    /// Creates an empty `HashMultiSet` with at least the specified
    /// capacity.
    pub fn with_capacity(capacity: usize) -> HashMultiSet<K> {
        HashMultiSet::with_capacity_and_hasher(capacity, RandomState::new())
    }

    /// Returns a builder for a `HashMultiSet`.
    pub fn builder() -> HashMultiSetBuilder<K> {
        HashMultiSetBuilder {
            hasher: RandomState::default(),
            capacity: 0,
            max_load_factor: RehashPolicy::DEFAULT_MAX_LOAD_FACTOR,
            growth_factor: RehashPolicy::DEFAULT_GROWTH_FACTOR,
            _k: PhantomData,
        }
    }
}

impl<K, S> HashMultiSet<K, S>
where
    K: Hash,
    S: BuildHasher,
{
    /// Creates an empty `HashMultiSet` which will use the given hash
    /// builder to hash values.
    pub fn with_hasher(hash_builder: S) -> HashMultiSet<K, S> {
        HashMultiSet::with_capacity_and_hasher(0, hash_builder)
    }

    /// Creates an empty `HashMultiSet` with at least the specified
    /// capacity, using `hash_builder` to hash the values.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> HashMultiSet<K, S> {
        HashMultiSet {
            raw: RawTable::with_capacity(capacity, Hashed::new(hash_builder)),
        }
    }

    /// Returns the number of values in the set, counting every
    /// duplicate.
    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of buckets the set currently uses.
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.raw.bucket_count()
    }

    /// Returns a reference to the set's [`BuildHasher`].
    #[inline]
    pub fn hasher(&self) -> &S {
        self.raw.strategy().hasher()
    }

    /// An iterator visiting all values in arbitrary order, with equal
    /// values adjacent.
    #[inline]
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            raw: self.raw.iter(),
        }
    }
}

impl<K, S> HashMultiSet<K, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Adds a value to the set, keeping any equal values already
    /// present. The new copy goes to the end of its value's run.
    ///
    /// # Examples
    ///
    /// ```
    /// use chaintable::HashMultiSet;
    ///
    /// let mut set = HashMultiSet::new();
    /// set.insert(7);
    /// set.insert(7);
    /// assert_eq!(set.count(&7), 2);
    /// ```
    #[inline]
    pub fn insert(&mut self, value: K) {
        self.raw.insert_multi(value, |a, b| a == b);
    }

    /// Returns `true` if the set contains at least one copy of the
    /// value.
    #[inline]
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.raw.find(value, |e| e.borrow() == value).is_some()
    }

    /// The number of copies of the value in the set.
    #[inline]
    pub fn count<Q>(&self, value: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.raw.count(value, |e| e.borrow() == value)
    }

    /// Iterates over every copy of the value.
    #[inline]
    pub fn equal_range<Q>(&self, value: &Q) -> EqualRange<'_, K>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        EqualRange {
            raw: self.raw.equal_range(value, |e| e.borrow() == value),
        }
    }

    /// Removes every copy of the value, returning how many were
    /// removed.
    #[inline]
    pub fn remove_all<Q>(&mut self, value: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.raw.erase(value, |e| e.borrow() == value)
    }

    /// Retains only the values specified by the predicate.
    #[inline]
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K) -> bool,
    {
        self.raw.retain(|e| f(&*e))
    }

    /// Clears the set, removing all values. Keeps the allocated
    /// buckets for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.raw.clear()
    }

    /// Reserves capacity for `additional` more values to be inserted
    /// without rehashing.
    #[inline]
    pub fn reserve(&mut self, additional: usize) {
        self.raw.reserve(additional)
    }

    /// Rebuilds the set with at least `min_buckets` buckets; see
    /// [`HashMap::rehash`](crate::HashMap::rehash).
    #[inline]
    pub fn rehash(&mut self, min_buckets: usize) {
        self.raw.rehash(min_buckets)
    }
}

impl<K, S> Default for HashMultiSet<K, S>
where
    K: Hash,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        HashMultiSet::with_hasher(S::default())
    }
}

impl<K, S> Clone for HashMultiSet<K, S>
where
    K: Clone + Hash,
    S: BuildHasher + Clone,
{
    fn clone(&self) -> HashMultiSet<K, S> {
        HashMultiSet {
            raw: self.raw.clone(),
        }
    }
}

impl<K, S> fmt::Debug for HashMultiSet<K, S>
where
    K: fmt::Debug + Hash,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K, S> PartialEq for HashMultiSet<K, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }

        // Multiset equality: every value occurs the same number of
        // times on both sides.
        self.iter().all(|key| self.count(key) == other.count(key))
    }
}

impl<K, S> Eq for HashMultiSet<K, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
}

impl<K, S> Extend<K> for HashMultiSet<K, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = K>>(&mut self, iter: T) {
        let iter = iter.into_iter();
        // Every value will be inserted, duplicates included, so the
        // full hint is the right reservation.
        self.reserve(iter.size_hint().0);

        for key in iter {
            self.insert(key);
        }
    }
}

impl<K, const N: usize> From<[K; N]> for HashMultiSet<K, RandomState>
where
    K: Hash + Eq,
{
    fn from(arr: [K; N]) -> Self {
        HashMultiSet::from_iter(arr)
    }
}

impl<K, S> FromIterator<K> for HashMultiSet<K, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<T: IntoIterator<Item = K>>(iter: T) -> Self {
        let iter = iter.into_iter();
        let mut set = HashMultiSet::with_capacity_and_hasher(iter.size_hint().0, S::default());
        for key in iter {
            set.insert(key);
        }
        set
    }
}

impl<'a, K: Hash, S: BuildHasher> IntoIterator for &'a HashMultiSet<K, S> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Iter<'a, K> {
        self.iter()
    }
}

impl<K: Hash, S: BuildHasher> IntoIterator for HashMultiSet<K, S> {
    type Item = K;
    type IntoIter = IntoIter<K>;

    fn into_iter(self) -> IntoIter<K> {
        IntoIter {
            raw: self.raw.into_iter(),
        }
    }
}

/// An iterator over a set's values.
///
/// This struct is created by the [`iter`](HashSet::iter) method on
/// [`HashSet`] and [`HashMultiSet`].
pub struct Iter<'a, K> {
    raw: raw::Iter<'a, K, u64>,
}

impl<K> Clone for Iter<'_, K> {
    fn clone(&self) -> Self {
        Iter {
            raw: self.raw.clone(),
        }
    }
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<&'a K> {
        self.raw.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.raw.size_hint()
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}
impl<K> std::iter::FusedIterator for Iter<'_, K> {}

impl<K: fmt::Debug> fmt::Debug for Iter<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.clone()).finish()
    }
}

/// An owning iterator over a set's values.
pub struct IntoIter<K> {
    raw: raw::IntoIter<K, u64, raw::Global>,
}

impl<K> Iterator for IntoIter<K> {
    type Item = K;

    #[inline]
    fn next(&mut self) -> Option<K> {
        self.raw.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.raw.size_hint()
    }
}

impl<K> ExactSizeIterator for IntoIter<K> {}
impl<K> std::iter::FusedIterator for IntoIter<K> {}

/// An iterator over the copies of one value, created by
/// [`HashMultiSet::equal_range`].
pub struct EqualRange<'a, K> {
    raw: raw::ChainIter<'a, K, u64>,
}

impl<K> Clone for EqualRange<'_, K> {
    fn clone(&self) -> Self {
        EqualRange {
            raw: self.raw.clone(),
        }
    }
}

impl<'a, K> Iterator for EqualRange<'a, K> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<&'a K> {
        self.raw.next()
    }
}

impl<K> std::iter::FusedIterator for EqualRange<'_, K> {}
