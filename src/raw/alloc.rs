use std::alloc::{self, Layout};
use std::ptr::{self, NonNull};

/// What a table allocation holds.
///
/// Passed through to [`TableAlloc`] so pooling allocators can route the
/// two shapes differently: nodes are fixed-size and freed one at a
/// time, bucket arrays grow geometrically and are freed whole.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AllocKind {
    /// A single chain node.
    Node,
    /// The array of chain-head slots (including the sentinel slot).
    BucketArray,
}

/// A memory source for table nodes and bucket arrays.
///
/// # Safety
///
/// `allocate` must return a pointer valid for reads and writes of
/// `layout.size()` bytes at `layout.align()` alignment, owned by the
/// caller until it is passed back to `deallocate` with the same layout
/// and kind. Exhaustion must divert (abort or panic); returning a
/// dangling pointer is undefined behavior, and the table never checks.
pub unsafe trait TableAlloc {
    fn allocate(&self, layout: Layout, kind: AllocKind) -> NonNull<u8>;

    /// # Safety
    ///
    /// `ptr` must denote a live block obtained from `allocate` on this
    /// same allocator, with the same `layout` and `kind`.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout, kind: AllocKind);
}

/// The global allocator.
#[derive(Clone, Copy, Default, Debug)]
pub struct Global;

// Safety: defers to `std::alloc`, aborting on exhaustion.
unsafe impl TableAlloc for Global {
    fn allocate(&self, layout: Layout, _kind: AllocKind) -> NonNull<u8> {
        debug_assert!(layout.size() > 0);

        // Safety: the layout is non-zero sized; both allocation shapes
        // contain at least one pointer.
        let ptr = unsafe { alloc::alloc(layout) };
        match NonNull::new(ptr) {
            Some(ptr) => ptr,
            None => alloc::handle_alloc_error(layout),
        }
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout, _kind: AllocKind) {
        // Safety: guaranteed by the caller.
        unsafe { alloc::dealloc(ptr.as_ptr(), layout) }
    }
}

// A single stored element, linked into its bucket's chain.
pub(crate) struct Node<T, C> {
    // The next node in the same bucket; null at the end of the chain.
    pub next: *mut Node<T, C>,
    // The cached hash code; zero-sized when the strategy disables
    // caching.
    pub code: C,
    pub element: T,
}

impl<T, C> Node<T, C> {
    fn layout() -> Layout {
        Layout::new::<Node<T, C>>()
    }

    // Allocates and fully initializes a node.
    pub fn alloc<A: TableAlloc>(
        alloc: &A,
        next: *mut Node<T, C>,
        code: C,
        element: T,
    ) -> NonNull<Node<T, C>> {
        let node = Node::alloc_raw(alloc);
        // Safety: `alloc_raw` returned a writable node-sized block.
        unsafe { node.as_ptr().write(Node { next, code, element }) };
        node
    }

    // Allocates node memory without initializing it.
    pub fn alloc_raw<A: TableAlloc>(alloc: &A) -> NonNull<Node<T, C>> {
        alloc.allocate(Node::<T, C>::layout(), AllocKind::Node).cast()
    }

    // Drops the node's element and frees its memory.
    //
    // Safety: `node` must be live, allocated from `alloc`, unlinked,
    // and never touched again.
    pub unsafe fn dealloc<A: TableAlloc>(alloc: &A, node: *mut Node<T, C>) {
        unsafe {
            ptr::drop_in_place(ptr::addr_of_mut!((*node).element));
            Node::free(alloc, node);
        }
    }

    // Frees node memory without touching the element.
    //
    // Safety: as `dealloc`; the element must be uninitialized or
    // already moved out.
    pub unsafe fn free<A: TableAlloc>(alloc: &A, node: *mut Node<T, C>) {
        // Safety: nodes are never null.
        let ptr = unsafe { NonNull::new_unchecked(node) };
        unsafe { alloc.deallocate(ptr.cast(), Node::<T, C>::layout(), AllocKind::Node) }
    }
}

/// The end-of-table marker stored in the last bucket slot. Non-null,
/// so the empty-bucket skip loop stops on a plain null test with no
/// bounds check. Never dereferenced.
pub(crate) fn sentinel<T, C>() -> *mut Node<T, C> {
    usize::MAX as *mut Node<T, C>
}

pub(crate) fn is_sentinel<T, C>(node: *mut Node<T, C>) -> bool {
    node as usize == usize::MAX
}

// The bucket array shared by every empty table: one empty chain head
// and the sentinel, stored as plain words and reinterpreted at pointer
// type. Read-only; `is_shared` guards every write path, and the first
// insertion replaces it with a real allocation.
static SHARED_EMPTY: [usize; 2] = [0, usize::MAX];

// A handle to a bucket array of `count + 1` chain-head slots; the slot
// at index `count` holds the sentinel. The handle is plain data, and
// allocation and release are managed by the owning table.
pub(crate) struct Buckets<T, C> {
    head: NonNull<*mut Node<T, C>>,
    pub count: usize,
}

impl<T, C> Copy for Buckets<T, C> {}

impl<T, C> Clone for Buckets<T, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, C> Buckets<T, C> {
    // The shared empty array, identified by a count of 1; real arrays
    // always have at least 2 buckets.
    pub fn shared_empty() -> Buckets<T, C> {
        let head = SHARED_EMPTY.as_ptr() as *mut *mut Node<T, C>;
        // Safety: a static is never null.
        Buckets {
            head: unsafe { NonNull::new_unchecked(head) },
            count: 1,
        }
    }

    pub fn is_shared(&self) -> bool {
        self.count == 1
    }

    // Allocates an array of `count` empty buckets plus the sentinel.
    pub fn alloc<A: TableAlloc>(alloc: &A, count: usize) -> Buckets<T, C> {
        debug_assert!(count >= 2);

        let head = alloc
            .allocate(Buckets::<T, C>::layout(count), AllocKind::BucketArray)
            .cast::<*mut Node<T, C>>();

        // Safety: freshly allocated for `count + 1` slots.
        unsafe {
            ptr::write_bytes(head.as_ptr(), 0, count);
            head.as_ptr().add(count).write(sentinel());
        }

        Buckets { head, count }
    }

    // Frees the array; a no-op for the shared empty array.
    //
    // Safety: all chains must already be detached or freed, and the
    // array must not be used again.
    pub unsafe fn dealloc<A: TableAlloc>(self, alloc: &A) {
        if self.is_shared() {
            return;
        }

        // Safety: guaranteed by the caller; the layout matches `alloc`.
        unsafe {
            alloc.deallocate(
                self.head.cast(),
                Buckets::<T, C>::layout(self.count),
                AllocKind::BucketArray,
            )
        }
    }

    // The chain-head slot for `bucket`.
    //
    // Safety: `bucket <= count`; the slot at `count` is the sentinel.
    #[inline]
    pub unsafe fn slot(&self, bucket: usize) -> *mut *mut Node<T, C> {
        debug_assert!(bucket <= self.count);
        unsafe { self.head.as_ptr().add(bucket) }
    }

    // The current head node of `bucket`'s chain.
    //
    // Safety: as `slot`.
    #[inline]
    pub unsafe fn chain(&self, bucket: usize) -> *mut Node<T, C> {
        unsafe { *self.slot(bucket) }
    }

    // The array layout used for allocation.
    fn layout(count: usize) -> Layout {
        Layout::array::<*mut Node<T, C>>(count + 1).unwrap()
    }
}

#[test]
fn shared_empty() {
    let buckets: Buckets<u32, u64> = Buckets::shared_empty();
    assert!(buckets.is_shared());
    assert_eq!(buckets.count, 1);
    unsafe {
        assert!(buckets.chain(0).is_null());
        assert!(is_sentinel(buckets.chain(1)));
    }
}

#[test]
fn alloc_roundtrip() {
    let buckets: Buckets<u32, ()> = Buckets::alloc(&Global, 5);
    assert!(!buckets.is_shared());
    unsafe {
        for i in 0..5 {
            assert!(buckets.chain(i).is_null());
        }
        assert!(is_sentinel(buckets.chain(5)));
        buckets.dealloc(&Global);
    }
}

#[test]
fn node_roundtrip() {
    let node = Node::alloc(&Global, ptr::null_mut(), 7u64, String::from("x"));
    unsafe {
        assert_eq!((*node.as_ptr()).code, 7);
        assert_eq!((*node.as_ptr()).element, "x");
        Node::dealloc(&Global, node.as_ptr());
    }
}
