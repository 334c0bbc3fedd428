use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;

/// A routed key: its hash code and the bucket index it maps to under
/// the bucket count it was computed against.
///
/// Routing ahead of time lets the hashing happen outside a lock while
/// only the pointer work happens inside (see
/// [`RawTable::route`](super::RawTable::route)). A `Routed` value is
/// invalidated by any rehash other than the consuming insert's own
/// growth, which reroutes internally.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Routed {
    /// The full hash code; zero under a ranged strategy, which has no
    /// bucket-count-independent code.
    pub code: u64,
    /// The bucket index, always less than the bucket count it was
    /// computed against.
    pub bucket: usize,
}

/// Per-node storage for a computed hash code.
///
/// `u64` caches the code: rehashing relinks nodes without rehashing
/// their keys, and lookups skip full key comparisons for nodes whose
/// stored code differs. `()` stores nothing and recomputes instead,
/// trading those savings for a smaller node.
pub trait CodeSlot: Copy {
    /// Whether real codes are stored.
    const CACHED: bool;

    /// The slot for a node whose key hashed to `code`.
    fn store(code: u64) -> Self;

    /// Cheap prefilter: could a node carrying this slot hold a key
    /// that hashes to `code`? Must never answer `false` for the code
    /// the slot was stored with; `true` for others merely costs a full
    /// comparison.
    fn matches(self, code: u64) -> bool;

    /// The stored code, if any.
    fn stored(self) -> Option<u64>;
}

impl CodeSlot for u64 {
    const CACHED: bool = true;

    #[inline]
    fn store(code: u64) -> u64 {
        code
    }

    #[inline]
    fn matches(self, code: u64) -> bool {
        self == code
    }

    #[inline]
    fn stored(self) -> Option<u64> {
        Some(self)
    }
}

impl CodeSlot for () {
    const CACHED: bool = false;

    #[inline]
    fn store(_code: u64) {}

    #[inline]
    fn matches(self, _code: u64) -> bool {
        true
    }

    #[inline]
    fn stored(self) -> Option<u64> {
        None
    }
}

/// Extracts the key a table element is addressed by.
pub trait ExtractKey<T> {
    type Key: ?Sized;

    fn key<'a>(&self, element: &'a T) -> &'a Self::Key;
}

/// The element is its own key (sets).
#[derive(Clone, Copy, Default, Debug)]
pub struct SelfKey;

impl<T> ExtractKey<T> for SelfKey {
    type Key = T;

    #[inline]
    fn key<'a>(&self, element: &'a T) -> &'a T {
        element
    }
}

/// The key is the first half of a `(key, value)` pair (maps).
#[derive(Clone, Copy, Default, Debug)]
pub struct PairKey;

impl<K, V> ExtractKey<(K, V)> for PairKey {
    type Key = K;

    #[inline]
    fn key<'a>(&self, element: &'a (K, V)) -> &'a K {
        &element.0
    }
}

/// How elements map to hash codes and bucket indices.
///
/// Implementations must be pure and consistent: equal keys route
/// identically for a given bucket count, and every returned bucket
/// index is less than the count it was asked about. The two provided
/// forms are [`Hashed`] (key to code, code to bucket) and [`Ranged`]
/// (key straight to bucket).
pub trait HashStrategy<T> {
    /// Per-node code storage: `u64` to cache hash codes, `()` to
    /// recompute them on demand.
    type Code: CodeSlot;

    /// Routes an element to its hash code and bucket.
    fn route(&self, element: &T, buckets: usize) -> Routed;

    /// Routes an element again after the bucket count changed, reusing
    /// the previously computed code where the hashing form permits.
    fn reroute(&self, element: &T, routed: Routed, buckets: usize) -> Routed;

    /// The bucket for a stored node during relocation: from its code
    /// slot when cached, recomputed from the element otherwise.
    fn relocate(&self, element: &T, code: Self::Code, buckets: usize) -> usize;
}

/// Strategies that can route borrowed lookup keys of type `Q`.
///
/// `Q` must hash and compare consistently with the stored key type, in
/// the usual [`Borrow`](std::borrow::Borrow) sense.
pub trait RouteKey<Q: ?Sized, T>: HashStrategy<T> {
    fn route_key(&self, key: &Q, buckets: usize) -> Routed;
}

// Reduces a hash code to a bucket index. The count is at least 1 (the
// shared empty array), so the modulo is always defined.
#[inline]
pub(crate) fn mod_bucket(code: u64, buckets: usize) -> usize {
    (code % buckets as u64) as usize
}

/// The two-part hashing form: a [`BuildHasher`] maps keys to codes and
/// a modulo reduction maps codes to buckets.
///
/// `X` extracts the key from stored elements and `C` selects per-node
/// code caching (`()` by default, `u64` to cache). This is the form
/// the [`HashMap`](crate::HashMap) family of containers uses.
pub struct Hashed<X, H, C = ()> {
    extract: X,
    hasher: H,
    _code: PhantomData<C>,
}

impl<X, H, C> Hashed<X, H, C> {
    /// A strategy hashing with `hasher`.
    pub fn new(hasher: H) -> Hashed<X, H, C>
    where
        X: Default,
    {
        Hashed::with_extract(X::default(), hasher)
    }

    /// A strategy with an explicit key extractor.
    pub fn with_extract(extract: X, hasher: H) -> Hashed<X, H, C> {
        Hashed {
            extract,
            hasher,
            _code: PhantomData,
        }
    }

    /// The underlying hasher.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }
}

impl<X: Default, H: Default, C> Default for Hashed<X, H, C> {
    fn default() -> Hashed<X, H, C> {
        Hashed::new(H::default())
    }
}

impl<X: Clone, H: Clone, C> Clone for Hashed<X, H, C> {
    fn clone(&self) -> Hashed<X, H, C> {
        Hashed {
            extract: self.extract.clone(),
            hasher: self.hasher.clone(),
            _code: PhantomData,
        }
    }
}

impl<T, X, H, C> HashStrategy<T> for Hashed<X, H, C>
where
    X: ExtractKey<T>,
    X::Key: Hash,
    H: BuildHasher,
    C: CodeSlot,
{
    type Code = C;

    #[inline]
    fn route(&self, element: &T, buckets: usize) -> Routed {
        let code = self.hasher.hash_one(self.extract.key(element));
        Routed {
            code,
            bucket: mod_bucket(code, buckets),
        }
    }

    #[inline]
    fn reroute(&self, _element: &T, routed: Routed, buckets: usize) -> Routed {
        // The code is bucket-count independent; only the reduction
        // changes.
        Routed {
            code: routed.code,
            bucket: mod_bucket(routed.code, buckets),
        }
    }

    #[inline]
    fn relocate(&self, element: &T, code: C, buckets: usize) -> usize {
        match code.stored() {
            Some(code) => mod_bucket(code, buckets),
            None => self.route(element, buckets).bucket,
        }
    }
}

impl<T, Q, X, H, C> RouteKey<Q, T> for Hashed<X, H, C>
where
    Q: Hash + ?Sized,
    X: ExtractKey<T>,
    X::Key: Hash,
    H: BuildHasher,
    C: CodeSlot,
{
    #[inline]
    fn route_key(&self, key: &Q, buckets: usize) -> Routed {
        let code = self.hasher.hash_one(key);
        Routed {
            code,
            bucket: mod_bucket(code, buckets),
        }
    }
}

/// A hash producing bucket indices directly.
///
/// Implemented for plain functions and closures of the matching shape.
pub trait RangedHash<Q: ?Sized> {
    /// The bucket for `key` out of `buckets`; must be less than
    /// `buckets`.
    fn bucket(&self, key: &Q, buckets: usize) -> usize;
}

impl<Q: ?Sized, F> RangedHash<Q> for F
where
    F: Fn(&Q, usize) -> usize,
{
    #[inline]
    fn bucket(&self, key: &Q, buckets: usize) -> usize {
        self(key, buckets)
    }
}

/// The ranged hashing form: the user hash produces bucket indices
/// directly.
///
/// A ranged index is only meaningful for the bucket count it was
/// computed against, so there is nothing stable to cache and the code
/// slot is pinned to `()`; rehashing re-invokes the hash per node.
pub struct Ranged<X, F> {
    extract: X,
    hash: F,
}

impl<X, F> Ranged<X, F> {
    /// A strategy around the given ranged hash.
    pub fn new(hash: F) -> Ranged<X, F>
    where
        X: Default,
    {
        Ranged::with_extract(X::default(), hash)
    }

    /// A strategy with an explicit key extractor.
    pub fn with_extract(extract: X, hash: F) -> Ranged<X, F> {
        Ranged { extract, hash }
    }
}

impl<X: Clone, F: Clone> Clone for Ranged<X, F> {
    fn clone(&self) -> Ranged<X, F> {
        Ranged {
            extract: self.extract.clone(),
            hash: self.hash.clone(),
        }
    }
}

impl<T, X, F> HashStrategy<T> for Ranged<X, F>
where
    X: ExtractKey<T>,
    F: RangedHash<X::Key>,
{
    type Code = ();

    #[inline]
    fn route(&self, element: &T, buckets: usize) -> Routed {
        Routed {
            code: 0,
            bucket: self.hash.bucket(self.extract.key(element), buckets),
        }
    }

    #[inline]
    fn reroute(&self, element: &T, _routed: Routed, buckets: usize) -> Routed {
        self.route(element, buckets)
    }

    #[inline]
    fn relocate(&self, element: &T, _code: (), buckets: usize) -> usize {
        self.route(element, buckets).bucket
    }
}

impl<T, Q, X, F> RouteKey<Q, T> for Ranged<X, F>
where
    Q: ?Sized,
    X: ExtractKey<T>,
    F: RangedHash<X::Key> + RangedHash<Q>,
{
    #[inline]
    fn route_key(&self, key: &Q, buckets: usize) -> Routed {
        Routed {
            code: 0,
            bucket: RangedHash::<Q>::bucket(&self.hash, key, buckets),
        }
    }
}
