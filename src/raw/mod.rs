//! The raw open-chained table: intrusive bucket chains, pluggable
//! hashing strategies, and closure-parameterized equality. The typed
//! containers in the crate root are thin layers over [`RawTable`];
//! drop down here to control key extraction, code caching, or
//! allocation directly.

mod alloc;
mod policy;
mod strategy;

use std::marker::PhantomData;
use std::mem::{self, ManuallyDrop};
use std::ptr::{self, NonNull};

pub use self::alloc::{AllocKind, Global, TableAlloc};
pub use self::policy::RehashPolicy;
pub use self::strategy::{
    CodeSlot, ExtractKey, HashStrategy, Hashed, PairKey, Ranged, RangedHash, RouteKey, Routed,
    SelfKey,
};

use self::alloc::{Buckets, Node};

/// An open-chained hash table of `T` elements.
///
/// Elements live in individually allocated nodes linked into per-bucket
/// chains; the strategy `S` decides how keys route to buckets and
/// whether hash codes are cached per node, and `A` supplies all memory.
/// Equality is passed into each operation as a closure, so one table
/// type serves maps, sets, and their multi-key variants.
///
/// A newly created table does not allocate: every empty table shares a
/// static one-bucket array that is replaced on first insertion.
pub struct RawTable<T, S: HashStrategy<T>, A: TableAlloc = Global> {
    buckets: Buckets<T, S::Code>,
    len: usize,
    policy: RehashPolicy,
    strategy: S,
    alloc: A,
    _marker: PhantomData<T>,
}

// Safety: the table owns its nodes exclusively and has no interior
// mutability; it moves and shares like a boxed graph of `T` plus the
// strategy and allocator values.
unsafe impl<T: Send, S: HashStrategy<T> + Send, A: TableAlloc + Send> Send for RawTable<T, S, A> where
    S::Code: Send
{
}
unsafe impl<T: Sync, S: HashStrategy<T> + Sync, A: TableAlloc + Sync> Sync for RawTable<T, S, A> where
    S::Code: Sync
{
}

/// The outcome of a unique-key insertion.
#[derive(Debug)]
pub enum InsertUnique<'t, T> {
    /// The value was inserted; borrows the new element.
    Inserted(&'t mut T),
    /// An equal key is already present. Nothing was allocated and
    /// `value` is handed back untouched.
    Occupied {
        /// The element already in the table.
        current: &'t mut T,
        /// The rejected value.
        value: T,
    },
}

impl<T, S: HashStrategy<T>> RawTable<T, S> {
    /// Creates an empty table. Does not allocate.
    pub fn new(strategy: S) -> RawTable<T, S> {
        RawTable::new_in(strategy, Global)
    }

    /// Creates a table pre-sized for `capacity` elements.
    pub fn with_capacity(capacity: usize, strategy: S) -> RawTable<T, S> {
        RawTable::with_capacity_in(capacity, strategy, Global)
    }
}

impl<T, S: HashStrategy<T>, A: TableAlloc> RawTable<T, S, A> {
    /// Creates an empty table backed by `alloc`. Does not allocate.
    pub fn new_in(strategy: S, alloc: A) -> RawTable<T, S, A> {
        RawTable {
            buckets: Buckets::shared_empty(),
            len: 0,
            policy: RehashPolicy::new(),
            strategy,
            alloc,
            _marker: PhantomData,
        }
    }

    /// Creates a table pre-sized for `capacity` elements in `alloc`.
    pub fn with_capacity_in(capacity: usize, strategy: S, alloc: A) -> RawTable<T, S, A> {
        RawTable::with_policy_in(RehashPolicy::new(), capacity, strategy, alloc)
    }

    /// Creates a table with an explicit growth policy.
    pub fn with_policy_in(
        policy: RehashPolicy,
        capacity: usize,
        strategy: S,
        alloc: A,
    ) -> RawTable<T, S, A> {
        let mut table = RawTable {
            buckets: Buckets::shared_empty(),
            len: 0,
            policy,
            strategy,
            alloc,
            _marker: PhantomData,
        };

        if capacity > 0 {
            let count = table.policy.bucket_count_for(capacity);
            table.buckets = Buckets::alloc(&table.alloc, count);
            table.policy.record(count);
        }

        table
    }

    /// The number of elements in the table.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The number of buckets. At least 1; exactly 1 only for the
    /// shared array of a table that has never allocated.
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.count
    }

    /// The current load: elements per bucket.
    pub fn load_factor(&self) -> f32 {
        self.len as f32 / self.buckets.count as f32
    }

    pub fn max_load_factor(&self) -> f32 {
        self.policy.max_load_factor()
    }

    /// Changes the load factor ceiling. Takes effect on the next
    /// insertion; the table never shrinks on its own.
    pub fn set_max_load_factor(&mut self, max_load_factor: f32) {
        self.policy.set_max_load_factor(max_load_factor);
    }

    pub fn growth_factor(&self) -> f32 {
        self.policy.growth_factor()
    }

    pub fn set_growth_factor(&mut self, growth_factor: f32) {
        self.policy.set_growth_factor(growth_factor);
    }

    /// The table's hashing strategy.
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// The table's allocator.
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Routes a lookup key: hashes it and picks its bucket under the
    /// current bucket count.
    ///
    /// The result feeds the `*_routed` operations, letting the hashing
    /// happen ahead of time (outside a lock, say) while the table walk
    /// happens later. It is invalidated by any rehash other than the
    /// consuming insert's own growth.
    #[inline]
    pub fn route<Q: ?Sized>(&self, key: &Q) -> Routed
    where
        S: RouteKey<Q, T>,
    {
        self.strategy.route_key(key, self.buckets.count)
    }

    /// Routes a full element by its extracted key.
    #[inline]
    pub fn route_element(&self, element: &T) -> Routed {
        self.strategy.route(element, self.buckets.count)
    }

    /// Returns the element matching `key`, if any. For multi-key
    /// tables this is the first element of the equal run.
    #[inline]
    pub fn find<Q: ?Sized>(&self, key: &Q, eq: impl FnMut(&T) -> bool) -> Option<&T>
    where
        S: RouteKey<Q, T>,
    {
        self.find_routed(self.route(key), eq)
    }

    /// `find` against a precomputed route.
    pub fn find_routed(&self, routed: Routed, mut eq: impl FnMut(&T) -> bool) -> Option<&T> {
        debug_assert!(routed.bucket < self.buckets.count);

        // Safety: the bucket is in range and chain nodes are live.
        unsafe {
            let mut node = self.buckets.chain(routed.bucket);
            while !node.is_null() {
                if (*node).code.matches(routed.code) && eq(&(*node).element) {
                    return Some(&(*node).element);
                }
                node = (*node).next;
            }
        }
        None
    }

    /// Mutable `find`.
    ///
    /// The returned element must not be mutated in a way that changes
    /// how its key hashes or compares; the typed containers guarantee
    /// this structurally by only exposing the value half.
    #[inline]
    pub fn find_mut<Q: ?Sized>(&mut self, key: &Q, eq: impl FnMut(&T) -> bool) -> Option<&mut T>
    where
        S: RouteKey<Q, T>,
    {
        self.find_routed_mut(self.route(key), eq)
    }

    /// `find_mut` against a precomputed route.
    pub fn find_routed_mut(
        &mut self,
        routed: Routed,
        mut eq: impl FnMut(&T) -> bool,
    ) -> Option<&mut T> {
        debug_assert!(routed.bucket < self.buckets.count);

        // Safety: as `find_routed`; the `&mut self` receiver makes the
        // returned borrow exclusive.
        unsafe {
            let mut node = self.buckets.chain(routed.bucket);
            while !node.is_null() {
                if (*node).code.matches(routed.code) && eq(&(*node).element) {
                    return Some(&mut (*node).element);
                }
                node = (*node).next;
            }
        }
        None
    }

    /// Inserts `value` under unique-key semantics.
    ///
    /// `eq` is called as `eq(existing, &value)`. If an equal key is
    /// already present nothing is allocated and the value is handed
    /// back in [`InsertUnique::Occupied`]; the caller decides whether
    /// that means "keep the old" or "replace in place". Growth, if the
    /// policy calls for it, happens before the new node is linked, so
    /// the node is never relocated by its own insert.
    #[inline]
    pub fn insert_unique(
        &mut self,
        value: T,
        eq: impl FnMut(&T, &T) -> bool,
    ) -> InsertUnique<'_, T> {
        let routed = self.route_element(&value);
        self.insert_unique_inner(routed, value, None, eq)
    }

    /// `insert_unique` against a precomputed route.
    #[inline]
    pub fn insert_unique_routed(
        &mut self,
        routed: Routed,
        value: T,
        eq: impl FnMut(&T, &T) -> bool,
    ) -> InsertUnique<'_, T> {
        self.insert_unique_inner(routed, value, None, eq)
    }

    /// `insert_unique` consuming a pre-allocated node, so the call
    /// itself only links pointers. On a duplicate the spare is freed
    /// and the value handed back.
    #[inline]
    pub fn insert_unique_spare(
        &mut self,
        routed: Routed,
        value: T,
        spare: SpareNode<T, S::Code, A>,
        eq: impl FnMut(&T, &T) -> bool,
    ) -> InsertUnique<'_, T> {
        self.insert_unique_inner(routed, value, Some(spare), eq)
    }

    fn insert_unique_inner(
        &mut self,
        routed: Routed,
        value: T,
        spare: Option<SpareNode<T, S::Code, A>>,
        mut eq: impl FnMut(&T, &T) -> bool,
    ) -> InsertUnique<'_, T> {
        debug_assert!(routed.bucket < self.buckets.count);

        // Check for a duplicate first; rejected inserts must not
        // allocate or grow.
        unsafe {
            let mut node = self.buckets.chain(routed.bucket);
            while !node.is_null() {
                if (*node).code.matches(routed.code) && eq(&(*node).element, &value) {
                    drop(spare);
                    return InsertUnique::Occupied {
                        current: &mut (*node).element,
                        value,
                    };
                }
                node = (*node).next;
            }
        }

        let node = self.link_new(routed, value, spare);
        // Safety: freshly linked and exclusively owned by the table.
        InsertUnique::Inserted(unsafe { &mut (*node.as_ptr()).element })
    }

    /// Inserts `value` under multi-key semantics; always succeeds.
    ///
    /// Equal keys are kept contiguous within their chain: the new node
    /// is spliced in directly after the end of the existing equal run,
    /// or linked at the chain head if the key is new. Contiguity is
    /// the only ordering guarantee; a rehash may reorder a run.
    #[inline]
    pub fn insert_multi(&mut self, value: T, eq: impl FnMut(&T, &T) -> bool) -> &mut T {
        let routed = self.route_element(&value);
        self.insert_multi_inner(routed, value, None, eq)
    }

    /// `insert_multi` against a precomputed route.
    #[inline]
    pub fn insert_multi_routed(
        &mut self,
        routed: Routed,
        value: T,
        eq: impl FnMut(&T, &T) -> bool,
    ) -> &mut T {
        self.insert_multi_inner(routed, value, None, eq)
    }

    /// `insert_multi` consuming a pre-allocated node.
    #[inline]
    pub fn insert_multi_spare(
        &mut self,
        routed: Routed,
        value: T,
        spare: SpareNode<T, S::Code, A>,
        eq: impl FnMut(&T, &T) -> bool,
    ) -> &mut T {
        self.insert_multi_inner(routed, value, Some(spare), eq)
    }

    fn insert_multi_inner(
        &mut self,
        routed: Routed,
        value: T,
        spare: Option<SpareNode<T, S::Code, A>>,
        mut eq: impl FnMut(&T, &T) -> bool,
    ) -> &mut T {
        debug_assert!(routed.bucket < self.buckets.count);

        // Grow first so the equal run located below stays put.
        let routed = self.grow_for(1, &value, routed);

        // Safety: the bucket is in range for the (possibly regrown)
        // array; chain surgery happens with exclusive access.
        unsafe {
            // Find the last node of the run of equal keys, if any.
            let mut run_end = ptr::null_mut();
            let mut node = self.buckets.chain(routed.bucket);
            while !node.is_null() {
                if (*node).code.matches(routed.code) && eq(&(*node).element, &value) {
                    run_end = node;
                    let mut next = (*node).next;
                    while !next.is_null()
                        && (*next).code.matches(routed.code)
                        && eq(&(*next).element, &value)
                    {
                        run_end = next;
                        next = (*next).next;
                    }
                    break;
                }
                node = (*node).next;
            }

            let link = if run_end.is_null() {
                self.buckets.slot(routed.bucket)
            } else {
                ptr::addr_of_mut!((*run_end).next)
            };
            let node = match spare {
                Some(spare) => spare.init(*link, S::Code::store(routed.code), value),
                None => Node::alloc(&self.alloc, *link, S::Code::store(routed.code), value),
            };
            *link = node.as_ptr();
            self.len += 1;
            &mut (*node.as_ptr()).element
        }
    }

    // Links a brand-new node at the head of its chain, growing first
    // when the policy requires.
    fn link_new(
        &mut self,
        routed: Routed,
        value: T,
        spare: Option<SpareNode<T, S::Code, A>>,
    ) -> NonNull<Node<T, S::Code>> {
        let routed = self.grow_for(1, &value, routed);

        // Safety: the bucket is in range for the (possibly regrown)
        // array.
        unsafe {
            let slot = self.buckets.slot(routed.bucket);
            let node = match spare {
                Some(spare) => spare.init(*slot, S::Code::store(routed.code), value),
                None => Node::alloc(&self.alloc, *slot, S::Code::store(routed.code), value),
            };
            *slot = node.as_ptr();
            self.len += 1;
            node
        }
    }

    // Grows ahead of `additions` insertions when the policy requires,
    // rerouting `element`'s destination against the new count.
    fn grow_for(&mut self, additions: usize, element: &T, routed: Routed) -> Routed {
        match self
            .policy
            .rehash_required(self.buckets.count, self.len, additions)
        {
            Some(count) => {
                self.rehash_to(count);
                self.strategy.reroute(element, routed, self.buckets.count)
            }
            None => routed,
        }
    }

    /// Removes and returns the first element matching `key`.
    ///
    /// This is the unique-key removal; use [`erase`](Self::erase) to
    /// drop an entire run of equal keys.
    #[inline]
    pub fn remove<Q: ?Sized>(&mut self, key: &Q, eq: impl FnMut(&T) -> bool) -> Option<T>
    where
        S: RouteKey<Q, T>,
    {
        self.remove_routed(self.route(key), eq)
    }

    /// `remove` against a precomputed route.
    pub fn remove_routed(&mut self, routed: Routed, mut eq: impl FnMut(&T) -> bool) -> Option<T> {
        debug_assert!(routed.bucket < self.buckets.count);

        // Safety: cursor surgery with exclusive access; the node is
        // unlinked before its element is moved out.
        unsafe {
            let mut link = self.buckets.slot(routed.bucket);
            loop {
                let node = *link;
                if node.is_null() {
                    return None;
                }
                if (*node).code.matches(routed.code) && eq(&(*node).element) {
                    *link = (*node).next;
                    self.len -= 1;
                    let element = ptr::read(ptr::addr_of!((*node).element));
                    Node::free(&self.alloc, node);
                    return Some(element);
                }
                link = ptr::addr_of_mut!((*node).next);
            }
        }
    }

    /// Removes every element matching `key`, returning how many.
    ///
    /// The matching elements form one contiguous run in their chain.
    /// The whole run is unlinked before any element is destroyed, so
    /// `key` may safely borrow from an element that is being removed;
    /// all comparisons complete before the first destructor runs.
    #[inline]
    pub fn erase<Q: ?Sized>(&mut self, key: &Q, eq: impl FnMut(&T) -> bool) -> usize
    where
        S: RouteKey<Q, T>,
    {
        self.erase_routed(self.route(key), eq)
    }

    /// `erase` against a precomputed route.
    pub fn erase_routed(&mut self, routed: Routed, mut eq: impl FnMut(&T) -> bool) -> usize {
        debug_assert!(routed.bucket < self.buckets.count);

        // Safety: cursor surgery with exclusive access.
        unsafe {
            let mut link = self.buckets.slot(routed.bucket);
            loop {
                let node = *link;
                if node.is_null() {
                    return 0;
                }
                if (*node).code.matches(routed.code) && eq(&(*node).element) {
                    // Measure the run to its end.
                    let mut run_len = 1;
                    let mut run_end = node;
                    let mut next = (*node).next;
                    while !next.is_null()
                        && (*next).code.matches(routed.code)
                        && eq(&(*next).element)
                    {
                        run_len += 1;
                        run_end = next;
                        next = (*next).next;
                    }

                    // Detach the run as a whole before destroying any
                    // node: `eq` is behind us, so memory the probe key
                    // may borrow from stays valid throughout.
                    *link = next;
                    (*run_end).next = ptr::null_mut();
                    self.len -= run_len;

                    let mut node = node;
                    while !node.is_null() {
                        let next = (*node).next;
                        Node::dealloc(&self.alloc, node);
                        node = next;
                    }
                    return run_len;
                }
                link = ptr::addr_of_mut!((*node).next);
            }
        }
    }

    /// The number of elements matching `key`. Always 0 or 1 under
    /// unique-key usage.
    #[inline]
    pub fn count<Q: ?Sized>(&self, key: &Q, eq: impl FnMut(&T) -> bool) -> usize
    where
        S: RouteKey<Q, T>,
    {
        self.count_routed(self.route(key), eq)
    }

    /// `count` against a precomputed route.
    pub fn count_routed(&self, routed: Routed, eq: impl FnMut(&T) -> bool) -> usize {
        self.find_run(routed, eq).2
    }

    /// Iterates over the run of elements matching `key`. The run is
    /// contiguous in its chain; its internal order is unspecified once
    /// the table has rehashed.
    #[inline]
    pub fn equal_range<Q: ?Sized>(
        &self,
        key: &Q,
        eq: impl FnMut(&T) -> bool,
    ) -> ChainIter<'_, T, S::Code>
    where
        S: RouteKey<Q, T>,
    {
        self.equal_range_routed(self.route(key), eq)
    }

    /// `equal_range` against a precomputed route.
    pub fn equal_range_routed(
        &self,
        routed: Routed,
        eq: impl FnMut(&T) -> bool,
    ) -> ChainIter<'_, T, S::Code> {
        let (node, end, _) = self.find_run(routed, eq);
        ChainIter {
            node,
            end,
            _marker: PhantomData,
        }
    }

    /// Mutable [`equal_range`](Self::equal_range); the key-hash
    /// obligation of [`find_mut`](Self::find_mut) applies.
    pub fn equal_range_mut<Q: ?Sized>(
        &mut self,
        key: &Q,
        eq: impl FnMut(&T) -> bool,
    ) -> ChainIterMut<'_, T, S::Code>
    where
        S: RouteKey<Q, T>,
    {
        let (node, end, _) = self.find_run(self.route(key), eq);
        ChainIterMut {
            node,
            end,
            _marker: PhantomData,
        }
    }

    // Locates the contiguous run matching `routed`/`eq`: (first node,
    // one past the last, run length), or nulls when absent.
    fn find_run(
        &self,
        routed: Routed,
        mut eq: impl FnMut(&T) -> bool,
    ) -> (*mut Node<T, S::Code>, *mut Node<T, S::Code>, usize) {
        debug_assert!(routed.bucket < self.buckets.count);

        // Safety: the bucket is in range and chain nodes are live.
        unsafe {
            let mut node = self.buckets.chain(routed.bucket);
            while !node.is_null() {
                if (*node).code.matches(routed.code) && eq(&(*node).element) {
                    let mut len = 1;
                    let mut end = (*node).next;
                    while !end.is_null() && (*end).code.matches(routed.code) && eq(&(*end).element)
                    {
                        len += 1;
                        end = (*end).next;
                    }
                    return (node, end, len);
                }
                node = (*node).next;
            }
        }
        (ptr::null_mut(), ptr::null_mut(), 0)
    }

    /// Keeps only the elements the predicate approves, dropping the
    /// rest. The predicate must not change how retained elements hash.
    pub fn retain(&mut self, mut f: impl FnMut(&mut T) -> bool) {
        // Safety: cursor surgery with exclusive access; the shared
        // empty array has no nodes, so it is never written.
        unsafe {
            for bucket in 0..self.buckets.count {
                let mut link = self.buckets.slot(bucket);
                loop {
                    let node = *link;
                    if node.is_null() {
                        break;
                    }
                    if f(&mut (*node).element) {
                        link = ptr::addr_of_mut!((*node).next);
                    } else {
                        *link = (*node).next;
                        self.len -= 1;
                        Node::dealloc(&self.alloc, node);
                    }
                }
            }
        }
    }

    /// Allocates a node ahead of an insertion, so the insert itself
    /// only links pointers. Dropping an unused spare frees it.
    pub fn spare_node(&self) -> SpareNode<T, S::Code, A>
    where
        A: Clone,
    {
        SpareNode {
            node: Node::alloc_raw(&self.alloc),
            alloc: self.alloc.clone(),
        }
    }

    /// Grows the table so that `additional` more insertions need no
    /// rehash.
    pub fn reserve(&mut self, additional: usize) {
        let total = self.len + additional;
        if total == 0 {
            return;
        }
        let count = self.policy.bucket_count_for(total);
        if count > self.buckets.count {
            self.rehash_to(count);
        }
    }

    /// Rebuilds the table with at least `min_buckets` buckets, snapped
    /// to the policy's prime ladder and floored by what the current
    /// elements need.
    ///
    /// This is the one operation that can shrink the array. On an
    /// empty table `rehash(0)` releases the array entirely, returning
    /// to the zero-allocation state.
    pub fn rehash(&mut self, min_buckets: usize) {
        if self.len == 0 && min_buckets <= 1 {
            // Safety: no elements, so no chains to free.
            unsafe { self.buckets.dealloc(&self.alloc) };
            self.buckets = Buckets::shared_empty();
            self.policy.forget();
            return;
        }

        let count = self.policy.bucket_count_at_least(min_buckets, self.len);
        if count != self.buckets.count {
            self.rehash_to(count);
        }
    }

    // Rebuilds with exactly `count` buckets (a ladder count >= 2),
    // relinking every node.
    //
    // The strategy runs once per node and may panic. Nodes are routed
    // before being unlinked, so at every point each node is reachable
    // from exactly one of the two arrays; on panic the guard frees
    // both arrays and all nodes, leaving the table empty. Resuming a
    // half-moved table after a failed user callback has no safe
    // meaning, so the table fails stop instead.
    fn rehash_to(&mut self, count: usize) {
        debug_assert!(count >= 2);
        let new = Buckets::alloc(&self.alloc, count);

        let guard = RehashGuard { table: self, new };
        let old = guard.table.buckets;
        for bucket in 0..old.count {
            // Safety: both arrays and all nodes are exclusively owned;
            // `bucket` and `dest` are in range for their arrays.
            unsafe {
                let slot = old.slot(bucket);
                loop {
                    let node = *slot;
                    if node.is_null() {
                        break;
                    }
                    let dest = guard
                        .table
                        .strategy
                        .relocate(&(*node).element, (*node).code, count);
                    debug_assert!(dest < count);
                    *slot = (*node).next;
                    let dest_slot = new.slot(dest);
                    (*node).next = *dest_slot;
                    *dest_slot = node;
                }
            }
        }

        // Every node moved; disarm the guard and commit.
        mem::forget(guard);
        // Safety: the old chains are all empty now.
        unsafe { self.buckets.dealloc(&self.alloc) };
        self.buckets = new;
        self.policy.record(count);
    }

    /// Drops every element, keeping the bucket array.
    pub fn clear(&mut self) {
        if self.len == 0 {
            return;
        }
        self.len = 0;

        // Safety: exclusive access; each slot is emptied before its
        // chain is freed, and `len > 0` implies a real array.
        unsafe {
            for bucket in 0..self.buckets.count {
                let slot = self.buckets.slot(bucket);
                let mut node = *slot;
                *slot = ptr::null_mut();
                while !node.is_null() {
                    let next = (*node).next;
                    Node::dealloc(&self.alloc, node);
                    node = next;
                }
            }
        }
    }

    /// Drops every element and releases the bucket array, returning to
    /// the zero-allocation empty state.
    pub fn reset(&mut self) {
        self.clear();
        // Safety: chains are empty after `clear`.
        unsafe { self.buckets.dealloc(&self.alloc) };
        self.buckets = Buckets::shared_empty();
        self.policy.forget();
    }

    /// Forgets every element and the bucket array without running a
    /// single destructor or allocator call.
    ///
    /// For tables whose allocator is an arena about to be discarded
    /// wholesale; anywhere else this leaks every node.
    pub fn reset_no_drop(&mut self) {
        self.buckets = Buckets::shared_empty();
        self.len = 0;
        self.policy.forget();
    }

    /// Exchanges the entire contents and configuration of two tables.
    pub fn swap(&mut self, other: &mut RawTable<T, S, A>) {
        mem::swap(self, other);
    }

    /// Iterates over every element, bucket by bucket.
    pub fn iter(&self) -> Iter<'_, T, S::Code> {
        // Safety: slot 0 always exists and the sentinel terminates the
        // skip.
        unsafe {
            let slot = self.buckets.slot(0);
            let mut iter = Iter {
                node: *slot,
                slot,
                remaining: self.len,
                _marker: PhantomData,
            };
            skip_empty(&mut iter.node, &mut iter.slot);
            iter
        }
    }

    /// Mutable iteration; the key-hash obligation of
    /// [`find_mut`](Self::find_mut) applies to every element.
    pub fn iter_mut(&mut self) -> IterMut<'_, T, S::Code> {
        // Safety: as `iter`.
        unsafe {
            let slot = self.buckets.slot(0);
            let mut iter = IterMut {
                node: *slot,
                slot,
                remaining: self.len,
                _marker: PhantomData,
            };
            skip_empty(&mut iter.node, &mut iter.slot);
            iter
        }
    }

    /// Iterates over one bucket's chain.
    ///
    /// # Panics
    ///
    /// Panics if `bucket >= bucket_count()`.
    pub fn bucket_iter(&self, bucket: usize) -> ChainIter<'_, T, S::Code> {
        assert!(bucket < self.buckets.count, "bucket index out of range");
        // Safety: just checked.
        ChainIter {
            node: unsafe { self.buckets.chain(bucket) },
            end: ptr::null_mut(),
            _marker: PhantomData,
        }
    }

    /// The number of elements chained in `bucket`.
    ///
    /// # Panics
    ///
    /// Panics if `bucket >= bucket_count()`.
    pub fn bucket_size(&self, bucket: usize) -> usize {
        self.bucket_iter(bucket).count()
    }

    /// Structural self-check: chains terminated, sentinel intact, and
    /// exactly `len` reachable nodes. For tests and debugging; user
    /// callables are never invoked.
    pub fn validate(&self) -> bool {
        // Safety: read-only walk of owned structure.
        unsafe {
            if self.buckets.is_shared() {
                return self.len == 0 && self.buckets.chain(0).is_null();
            }

            let mut total = 0;
            for bucket in 0..self.buckets.count {
                let mut node = self.buckets.chain(bucket);
                while !node.is_null() {
                    if alloc::is_sentinel(node) {
                        return false;
                    }
                    total += 1;
                    if total > self.len {
                        return false;
                    }
                    node = (*node).next;
                }
            }
            total == self.len && alloc::is_sentinel(self.buckets.chain(self.buckets.count))
        }
    }

    /// Whether `iter` is positioned inside this table: exhausted, or
    /// standing on a node reachable from the bucket slot it claims.
    pub fn validate_iter(&self, iter: &Iter<'_, T, S::Code>) -> bool {
        if iter.remaining == 0 {
            return true;
        }

        // Safety: read-only; pointers are compared, not followed,
        // until the slot is known to lie inside this table's array.
        unsafe {
            let first = self.buckets.slot(0);
            let last = self.buckets.slot(self.buckets.count);
            if !(first..=last).contains(&iter.slot) {
                return false;
            }

            let mut node = *iter.slot;
            while !node.is_null() && !alloc::is_sentinel(node) {
                if node == iter.node {
                    return true;
                }
                node = (*node).next;
            }
        }
        false
    }
}

impl<T, S: HashStrategy<T> + Default> Default for RawTable<T, S> {
    fn default() -> RawTable<T, S> {
        RawTable::new(S::default())
    }
}

impl<T: Clone, S: HashStrategy<T> + Clone, A: TableAlloc + Clone> Clone for RawTable<T, S, A> {
    fn clone(&self) -> RawTable<T, S, A> {
        let mut out = RawTable {
            buckets: Buckets::shared_empty(),
            len: 0,
            policy: self.policy.clone(),
            strategy: self.strategy.clone(),
            alloc: self.alloc.clone(),
            _marker: PhantomData,
        };

        if !self.buckets.is_shared() {
            out.buckets = Buckets::alloc(&out.alloc, self.buckets.count);
        }

        // Clone chain by chain, preserving order and copying cached
        // code slots verbatim; the strategy is never consulted. If an
        // element clone panics, `out` is a well-formed table at every
        // point and unwinds normally.
        unsafe {
            for bucket in 0..self.buckets.count {
                let mut src = self.buckets.chain(bucket);
                let mut link = out.buckets.slot(bucket);
                while !src.is_null() {
                    let node = Node::alloc(
                        &out.alloc,
                        ptr::null_mut(),
                        (*src).code,
                        (*src).element.clone(),
                    );
                    *link = node.as_ptr();
                    out.len += 1;
                    link = ptr::addr_of_mut!((*node.as_ptr()).next);
                    src = (*src).next;
                }
            }
        }

        debug_assert_eq!(out.len, self.len);
        out
    }
}

impl<T, S: HashStrategy<T>, A: TableAlloc> Drop for RawTable<T, S, A> {
    fn drop(&mut self) {
        // Safety: exclusive access and nothing is used afterwards.
        unsafe {
            drop_chains(self.buckets, &self.alloc);
            self.buckets.dealloc(&self.alloc);
        }
    }
}

impl<'a, T, S: HashStrategy<T>, A: TableAlloc> IntoIterator for &'a RawTable<T, S, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, S::Code>;

    fn into_iter(self) -> Iter<'a, T, S::Code> {
        self.iter()
    }
}

impl<'a, T, S: HashStrategy<T>, A: TableAlloc> IntoIterator for &'a mut RawTable<T, S, A> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T, S::Code>;

    fn into_iter(self) -> IterMut<'a, T, S::Code> {
        self.iter_mut()
    }
}

impl<T, S: HashStrategy<T>, A: TableAlloc> IntoIterator for RawTable<T, S, A> {
    type Item = T;
    type IntoIter = IntoIter<T, S::Code, A>;

    fn into_iter(self) -> IntoIter<T, S::Code, A> {
        let table = ManuallyDrop::new(self);

        // Safety: the table is never dropped; its parts move into the
        // iterator, the strategy is dropped here, and each field is
        // read exactly once.
        unsafe {
            drop(ptr::read(&table.strategy));
            let buckets = table.buckets;
            let slot = buckets.slot(0);
            let mut iter = IntoIter {
                node: *slot,
                slot,
                remaining: table.len,
                buckets,
                alloc: ptr::read(&table.alloc),
            };
            skip_empty(&mut iter.node, &mut iter.slot);
            iter
        }
    }
}

/// A node allocation made ahead of an insert; see
/// [`RawTable::spare_node`].
pub struct SpareNode<T, C, A: TableAlloc> {
    // Allocated but uninitialized.
    node: NonNull<Node<T, C>>,
    alloc: A,
}

impl<T, C, A: TableAlloc> SpareNode<T, C, A> {
    // Consumes the spare by initializing the node in place.
    fn init(self, next: *mut Node<T, C>, code: C, element: T) -> NonNull<Node<T, C>> {
        let spare = ManuallyDrop::new(self);
        // Safety: the block is node-sized and writable; the allocator
        // clone is dropped rather than leaked, and the node is now
        // owned by the caller.
        unsafe {
            drop(ptr::read(&spare.alloc));
            spare.node.as_ptr().write(Node {
                next,
                code,
                element,
            });
        }
        spare.node
    }
}

impl<T, C, A: TableAlloc> Drop for SpareNode<T, C, A> {
    fn drop(&mut self) {
        // Unused; the element slot was never initialized, so only the
        // block is released.
        unsafe { Node::free(&self.alloc, self.node.as_ptr()) }
    }
}

// Safety: a spare node is an exclusively owned uninitialized block
// plus the allocator handle.
unsafe impl<T: Send, C: Send, A: TableAlloc + Send> Send for SpareNode<T, C, A> {}
unsafe impl<T: Sync, C: Sync, A: TableAlloc + Sync> Sync for SpareNode<T, C, A> {}

// Advances past empty buckets until a chain head or the sentinel.
//
// Safety: `slot` must point into a live bucket array at or before its
// sentinel slot, with `node` the value read from `slot`.
unsafe fn skip_empty<T, C>(node: &mut *mut Node<T, C>, slot: &mut *mut *mut Node<T, C>) {
    while node.is_null() {
        // Safety: a null head is never the sentinel, so the next slot
        // is still inside the array.
        unsafe {
            *slot = slot.add(1);
            *node = **slot;
        }
    }
}

// Frees every node reachable from the chains of `buckets`, without
// touching the array itself.
//
// Safety: exclusive access; the nodes are never used again.
unsafe fn drop_chains<T, C, A: TableAlloc>(buckets: Buckets<T, C>, alloc: &A) {
    for bucket in 0..buckets.count {
        // Safety: in-range bucket; nodes are live and exclusively
        // owned.
        unsafe {
            let mut node = buckets.chain(bucket);
            while !node.is_null() {
                let next = (*node).next;
                Node::dealloc(alloc, node);
                node = next;
            }
        }
    }
}

/// An iterator over every element of a table.
pub struct Iter<'a, T, C> {
    node: *mut Node<T, C>,
    slot: *mut *mut Node<T, C>,
    remaining: usize,
    _marker: PhantomData<&'a T>,
}

// Safety: iteration only reads; sharing the iterator shares `&T`.
unsafe impl<T: Sync, C: Sync> Send for Iter<'_, T, C> {}
unsafe impl<T: Sync, C: Sync> Sync for Iter<'_, T, C> {}

impl<T, C> Clone for Iter<'_, T, C> {
    fn clone(&self) -> Self {
        Iter {
            node: self.node,
            slot: self.slot,
            remaining: self.remaining,
            _marker: PhantomData,
        }
    }
}

impl<'a, T, C> Iterator for Iter<'a, T, C> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }

        // Safety: `remaining > 0` means `node` is a live node, never
        // null or the sentinel.
        unsafe {
            let element = &(*self.node).element;
            self.node = (*self.node).next;
            skip_empty(&mut self.node, &mut self.slot);
            self.remaining -= 1;
            Some(element)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T, C> ExactSizeIterator for Iter<'_, T, C> {}
impl<T, C> std::iter::FusedIterator for Iter<'_, T, C> {}

/// A mutable iterator over every element of a table.
pub struct IterMut<'a, T, C> {
    node: *mut Node<T, C>,
    slot: *mut *mut Node<T, C>,
    remaining: usize,
    _marker: PhantomData<&'a mut T>,
}

// Safety: yields exclusive references to distinct nodes.
unsafe impl<T: Send, C: Send> Send for IterMut<'_, T, C> {}
unsafe impl<T: Sync, C: Sync> Sync for IterMut<'_, T, C> {}

impl<'a, T, C> Iterator for IterMut<'a, T, C> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<&'a mut T> {
        if self.remaining == 0 {
            return None;
        }

        // Safety: as `Iter::next`; each node is visited exactly once,
        // so the exclusive borrows never overlap.
        unsafe {
            let element = &mut *ptr::addr_of_mut!((*self.node).element);
            self.node = (*self.node).next;
            skip_empty(&mut self.node, &mut self.slot);
            self.remaining -= 1;
            Some(element)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T, C> ExactSizeIterator for IterMut<'_, T, C> {}
impl<T, C> std::iter::FusedIterator for IterMut<'_, T, C> {}

/// An owning iterator over the elements of a table.
///
/// Nodes are freed as they are yielded; dropping the iterator frees
/// whatever was not visited, then the array.
pub struct IntoIter<T, C, A: TableAlloc> {
    node: *mut Node<T, C>,
    slot: *mut *mut Node<T, C>,
    remaining: usize,
    buckets: Buckets<T, C>,
    alloc: A,
}

// Safety: the iterator exclusively owns the remaining nodes and array.
unsafe impl<T: Send, C: Send, A: TableAlloc + Send> Send for IntoIter<T, C, A> {}
unsafe impl<T: Sync, C: Sync, A: TableAlloc + Sync> Sync for IntoIter<T, C, A> {}

impl<T, C, A: TableAlloc> Iterator for IntoIter<T, C, A> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.remaining == 0 {
            return None;
        }

        // Safety: `remaining > 0` means `node` is live; the element is
        // moved out before the node is freed.
        unsafe {
            let node = self.node;
            self.node = (*node).next;
            let element = ptr::read(ptr::addr_of!((*node).element));
            Node::free(&self.alloc, node);
            skip_empty(&mut self.node, &mut self.slot);
            self.remaining -= 1;
            Some(element)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T, C, A: TableAlloc> ExactSizeIterator for IntoIter<T, C, A> {}
impl<T, C, A: TableAlloc> std::iter::FusedIterator for IntoIter<T, C, A> {}

impl<T, C, A: TableAlloc> Drop for IntoIter<T, C, A> {
    fn drop(&mut self) {
        // Drain whatever was not yielded, then release the array.
        for _ in &mut *self {}
        // Safety: every node has been freed.
        unsafe { self.buckets.dealloc(&self.alloc) };
    }
}

/// An iterator over one bucket's chain, or an equal range within it.
///
/// Positions compare by node identity.
pub struct ChainIter<'a, T, C> {
    node: *mut Node<T, C>,
    end: *mut Node<T, C>,
    _marker: PhantomData<&'a T>,
}

// Safety: as `Iter`.
unsafe impl<T: Sync, C: Sync> Send for ChainIter<'_, T, C> {}
unsafe impl<T: Sync, C: Sync> Sync for ChainIter<'_, T, C> {}

impl<T, C> Clone for ChainIter<'_, T, C> {
    fn clone(&self) -> Self {
        ChainIter {
            node: self.node,
            end: self.end,
            _marker: PhantomData,
        }
    }
}

impl<T, C> PartialEq for ChainIter<'_, T, C> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl<T, C> Eq for ChainIter<'_, T, C> {}

impl<'a, T, C> Iterator for ChainIter<'a, T, C> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.node == self.end {
            return None;
        }

        // Safety: every pointer in `[node, end)` is a live node.
        unsafe {
            let element = &(*self.node).element;
            self.node = (*self.node).next;
            Some(element)
        }
    }
}

impl<T, C> std::iter::FusedIterator for ChainIter<'_, T, C> {}

/// A mutable [`ChainIter`].
pub struct ChainIterMut<'a, T, C> {
    node: *mut Node<T, C>,
    end: *mut Node<T, C>,
    _marker: PhantomData<&'a mut T>,
}

// Safety: as `IterMut`.
unsafe impl<T: Send, C: Send> Send for ChainIterMut<'_, T, C> {}
unsafe impl<T: Sync, C: Sync> Sync for ChainIterMut<'_, T, C> {}

impl<'a, T, C> Iterator for ChainIterMut<'a, T, C> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<&'a mut T> {
        if self.node == self.end {
            return None;
        }

        // Safety: as `ChainIter`, with exclusive borrows of distinct
        // nodes.
        unsafe {
            let element = &mut *ptr::addr_of_mut!((*self.node).element);
            self.node = (*self.node).next;
            Some(element)
        }
    }
}

impl<T, C> std::iter::FusedIterator for ChainIterMut<'_, T, C> {}

// Frees both bucket arrays and every node still linked in either when
// a rehash unwinds, leaving the table empty.
struct RehashGuard<'a, T, S: HashStrategy<T>, A: TableAlloc> {
    table: &'a mut RawTable<T, S, A>,
    new: Buckets<T, S::Code>,
}

impl<T, S: HashStrategy<T>, A: TableAlloc> Drop for RehashGuard<'_, T, S, A> {
    fn drop(&mut self) {
        // Reached only when the strategy panicked mid-relink. Every
        // node is linked in exactly one of the two arrays, so freeing
        // both frees each node once.
        unsafe {
            drop_chains(self.table.buckets, &self.table.alloc);
            self.table.buckets.dealloc(&self.table.alloc);
            drop_chains(self.new, &self.table.alloc);
            self.new.dealloc(&self.table.alloc);
        }
        self.table.buckets = Buckets::shared_empty();
        self.table.len = 0;
        self.table.policy.forget();
    }
}
