//! Singly-linked list with a position cache.
//!
//! The list owns a chain of heap nodes and tracks head, tail, and length.
//! Indexed access walks the chain, but the last node located by index is
//! remembered, and a lookup at or past that position resumes from it
//! instead of from the head.
//!
//! # Position Cache
//!
//! ```text
//! head                     cache (index 3)         tail
//!  │                          │                     │
//!  ▼                          ▼                     ▼
//! [a] ──► [b] ──► [c] ──► [d] ──► [e] ──► [f] ──► [g]
//!
//! get(5): resume at [d], walk 2 links
//! get(1): 1 < 3, restart at head, walk 1 link
//! get(6): tail, no walk
//! ```
//!
//! Every structural mutation moves the cache to a node it just touched or
//! clears it, so the cache never refers to a released node or a stale
//! index. It affects performance only, never results.
//!
//! # Example
//!
//! ```
//! use nexus_sequence::SequenceList;
//!
//! let mut list = SequenceList::new();
//! list.add(10);
//! list.add(30);
//! list.add_at(1, 20);
//!
//! // Ascending scan: each get resumes from the previous position
//! let mut sum = 0;
//! for i in 0..list.len() {
//!     sum += list.get(i);
//! }
//! assert_eq!(sum, 60);
//!
//! assert_eq!(list.remove(1), 20);
//! assert_eq!(list.shift(), 10);
//! assert_eq!(list.pop(), 30);
//! assert!(list.is_empty());
//! ```

use core::cell::Cell;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use core::mem;
use core::ops::{Index, IndexMut};
use core::ptr::NonNull;

use crate::AllocError;
use crate::iter::{IntoIter, Iter, IterMut};
use crate::node::{Link, Node};

/// Last node located by index.
///
/// The node pointer is untyped so that the list stays covariant in `T`.
#[derive(Clone, Copy)]
struct Position {
    index: usize,
    node: NonNull<u8>,
}

impl Position {
    #[inline]
    fn node<T>(self) -> NonNull<Node<T>> {
        self.node.cast()
    }
}

/// A singly-linked list with O(1) append/prepend and cached indexed access.
///
/// # Example
///
/// ```
/// use nexus_sequence::SequenceList;
///
/// let mut list: SequenceList<&str> = SequenceList::new();
/// list.add("b");
/// list.unshift("a");
///
/// assert_eq!(list.front(), Some(&"a"));
/// assert_eq!(list.back(), Some(&"b"));
/// assert_eq!(list.at(2), None);
/// ```
pub struct SequenceList<T> {
    pub(crate) head: Link<T>,
    pub(crate) tail: Link<T>,
    pub(crate) len: usize,
    cache: Cell<Option<Position>>,
    _marker: PhantomData<Box<Node<T>>>,
}

// Safety: the list exclusively owns its nodes. Not Sync: `&self` lookups
// write the cache.
unsafe impl<T: Send> Send for SequenceList<T> {}

impl<T> Default for SequenceList<T> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Construction and size
// =============================================================================

impl<T> SequenceList<T> {
    /// Creates an empty list.
    #[inline]
    pub const fn new() -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
            cache: Cell::new(None),
            _marker: PhantomData,
        }
    }

    /// Creates a list holding `n` clones of `value`.
    ///
    /// ```
    /// use nexus_sequence::SequenceList;
    ///
    /// let list = SequenceList::from_elem(3, 'x');
    /// assert_eq!(list.len(), 3);
    /// assert!(list.iter().all(|&c| c == 'x'));
    /// ```
    pub fn from_elem(n: usize, value: T) -> Self
    where
        T: Clone,
    {
        let mut list = Self::new();
        for _ in 0..n {
            list.add(value.clone());
        }
        list
    }

    /// Returns the number of elements in the list.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the list is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` if `index` refers to an element.
    ///
    /// O(1) and leaves the position cache alone.
    #[inline]
    pub const fn exist(&self, index: usize) -> bool {
        index < self.len
    }

    // ========================================================================
    // Position cache
    // ========================================================================

    #[inline]
    fn remember(&self, index: usize, node: NonNull<Node<T>>) {
        self.cache.set(Some(Position {
            index,
            node: node.cast(),
        }));
    }

    #[inline]
    pub(crate) fn forget(&self) {
        self.cache.set(None);
    }

    /// Returns the node at `index` and caches it.
    ///
    /// # Safety
    ///
    /// `index` must be less than `self.len`.
    unsafe fn node_at(&self, index: usize) -> NonNull<Node<T>> {
        debug_assert!(index < self.len);

        let node = if index + 1 == self.len {
            // Safety: list is non-empty
            unsafe { self.tail.unwrap_unchecked() }
        } else {
            let (mut pos, mut node) = match self.cache.get() {
                Some(hit) if hit.index <= index => (hit.index, hit.node()),
                // Safety: list is non-empty
                _ => (0, unsafe { self.head.unwrap_unchecked() }),
            };
            while pos < index {
                // Safety: pos < index < len, so the chain continues
                node = unsafe { node.as_ref().next.unwrap_unchecked() };
                pos += 1;
            }
            node
        };

        self.remember(index, node);
        node
    }

    #[inline]
    fn locate(&self, index: usize) -> Link<T> {
        if index < self.len {
            // Safety: bounds checked
            Some(unsafe { self.node_at(index) })
        } else {
            None
        }
    }

    // ========================================================================
    // Insertion
    // ========================================================================

    /// Appends a value to the back of the list.
    ///
    /// # Aborts
    ///
    /// Aborts via `handle_alloc_error` if the node cannot be allocated.
    #[inline]
    pub fn add(&mut self, value: T) {
        self.link_back(Node::alloc(value));
    }

    /// Appends a value to the back of the list.
    ///
    /// # Errors
    ///
    /// Returns `Err(AllocError(value))` if the node cannot be allocated. The
    /// list is unchanged.
    #[inline]
    pub fn try_add(&mut self, value: T) -> Result<(), AllocError<T>> {
        let node = Self::try_node(value)?;
        self.link_back(node);
        Ok(())
    }

    /// Prepends a value to the front of the list.
    ///
    /// # Aborts
    ///
    /// Aborts via `handle_alloc_error` if the node cannot be allocated.
    #[inline]
    pub fn unshift(&mut self, value: T) {
        self.link_front(Node::alloc(value));
    }

    /// Prepends a value to the front of the list.
    ///
    /// # Errors
    ///
    /// Returns `Err(AllocError(value))` if the node cannot be allocated. The
    /// list is unchanged.
    #[inline]
    pub fn try_unshift(&mut self, value: T) -> Result<(), AllocError<T>> {
        let node = Self::try_node(value)?;
        self.link_front(node);
        Ok(())
    }

    /// Inserts a value so that it ends up at `index`.
    ///
    /// An `index` at or past the end appends, and `0` prepends.
    ///
    /// ```
    /// use nexus_sequence::SequenceList;
    ///
    /// let mut list = SequenceList::new();
    /// list.add(1);
    /// list.add_at(5, 3); // past the end: appends
    /// list.add_at(1, 2);
    /// assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    /// ```
    ///
    /// # Aborts
    ///
    /// Aborts via `handle_alloc_error` if the node cannot be allocated.
    #[inline]
    pub fn add_at(&mut self, index: usize, value: T) {
        self.link_at(index, Node::alloc(value));
    }

    /// Inserts a value so that it ends up at `index`.
    ///
    /// # Errors
    ///
    /// Returns `Err(AllocError(value))` if the node cannot be allocated. The
    /// list is unchanged.
    #[inline]
    pub fn try_add_at(&mut self, index: usize, value: T) -> Result<(), AllocError<T>> {
        let node = Self::try_node(value)?;
        self.link_at(index, node);
        Ok(())
    }

    fn try_node(value: T) -> Result<NonNull<Node<T>>, AllocError<T>> {
        Node::try_alloc(value).map_err(|value| {
            log_warn!(
                "node allocation failed ({} bytes)",
                mem::size_of::<Node<T>>()
            );
            AllocError(value)
        })
    }

    fn link_back(&mut self, node: NonNull<Node<T>>) {
        match self.tail {
            // Safety: tail is valid when present
            Some(tail) => unsafe { (*tail.as_ptr()).next = Some(node) },
            None => self.head = Some(node),
        }

        self.tail = Some(node);
        self.len += 1;
        self.remember(self.len - 1, node);
    }

    fn link_front(&mut self, node: NonNull<Node<T>>) {
        // Safety: node is freshly allocated and unlinked
        unsafe { (*node.as_ptr()).next = self.head };
        if self.tail.is_none() {
            self.tail = Some(node);
        }

        self.head = Some(node);
        self.len += 1;
        // Every cached index past 0 just shifted by one.
        self.remember(0, node);
    }

    fn link_at(&mut self, index: usize, node: NonNull<Node<T>>) {
        if index >= self.len {
            return self.link_back(node);
        }
        if index == 0 {
            return self.link_front(node);
        }

        // Safety: 0 < index < len
        let prev = unsafe { self.node_at(index - 1) };
        // Safety: prev is in the chain, node is unlinked
        unsafe {
            (*node.as_ptr()).next = (*prev.as_ptr()).next;
            (*prev.as_ptr()).next = Some(node);
        }

        self.len += 1;
        self.remember(index, node);
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Removes and returns the front element.
    ///
    /// Returns `None` if the list is empty.
    pub fn pop_front(&mut self) -> Option<T> {
        let head = self.head?;

        // Safety: head is valid when present
        self.head = unsafe { head.as_ref().next };
        self.len -= 1;

        match self.head {
            Some(next) => self.remember(0, next),
            None => {
                self.tail = None;
                self.forget();
            }
        }

        // Safety: head is unlinked
        Some(unsafe { Node::release(head) })
    }

    /// Removes and returns the back element.
    ///
    /// Walks to the second-to-last node, resuming from the cache when it
    /// sits before it.
    ///
    /// Returns `None` if the list is empty.
    pub fn pop_back(&mut self) -> Option<T> {
        let tail = self.tail?;

        if self.len == 1 {
            self.head = None;
            self.tail = None;
            self.len = 0;
            self.forget();
        } else {
            // Safety: len >= 2; caches (len - 2, prev), the new last index
            let prev = unsafe { self.node_at(self.len - 2) };
            // Safety: prev is in the chain
            unsafe { (*prev.as_ptr()).next = None };
            self.tail = Some(prev);
            self.len -= 1;
        }

        // Safety: tail is unlinked
        Some(unsafe { Node::release(tail) })
    }

    /// Removes and returns the element at `index`.
    ///
    /// Returns `None` if `index` is out of range.
    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        if index >= self.len {
            return None;
        }
        if index == 0 {
            return self.pop_front();
        }
        if index + 1 == self.len {
            return self.pop_back();
        }

        // Safety: 0 < index < len - 1; caches (index - 1, prev)
        let prev = unsafe { self.node_at(index - 1) };
        // Safety: prev has a successor since index < len - 1
        let target = unsafe { (*prev.as_ptr()).next.unwrap_unchecked() };
        unsafe { (*prev.as_ptr()).next = target.as_ref().next };
        self.len -= 1;

        // Safety: target is unlinked
        Some(unsafe { Node::release(target) })
    }

    /// Removes all elements, releasing nodes front to back.
    pub fn clear(&mut self) {
        while self.pop_front().is_some() {}
    }

    // ========================================================================
    // Access
    // ========================================================================

    /// Returns a reference to the element at `index`.
    ///
    /// Returns `None` if `index` is out of range.
    #[inline]
    pub fn at(&self, index: usize) -> Option<&T> {
        // Safety: node lives as long as the borrow of self
        self.locate(index).map(|node| unsafe { &(*node.as_ptr()).data })
    }

    /// Returns a mutable reference to the element at `index`.
    ///
    /// Returns `None` if `index` is out of range.
    #[inline]
    pub fn at_mut(&mut self, index: usize) -> Option<&mut T> {
        // Safety: node lives as long as the borrow of self, which is exclusive
        self.locate(index)
            .map(|node| unsafe { &mut (*node.as_ptr()).data })
    }

    /// Overwrites the element at `index` in place.
    ///
    /// Returns `false` and drops `value` if `index` is out of range.
    #[inline]
    pub fn set(&mut self, index: usize, value: T) -> bool {
        match self.at_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Returns a reference to the front element.
    #[inline]
    pub fn front(&self) -> Option<&T> {
        // Safety: head is valid when present
        self.head.map(|node| unsafe { &(*node.as_ptr()).data })
    }

    /// Returns a mutable reference to the front element.
    #[inline]
    pub fn front_mut(&mut self) -> Option<&mut T> {
        // Safety: head is valid when present
        self.head.map(|node| unsafe { &mut (*node.as_ptr()).data })
    }

    /// Returns a reference to the back element.
    #[inline]
    pub fn back(&self) -> Option<&T> {
        // Safety: tail is valid when present
        self.tail.map(|node| unsafe { &(*node.as_ptr()).data })
    }

    /// Returns a mutable reference to the back element.
    #[inline]
    pub fn back_mut(&mut self) -> Option<&mut T> {
        // Safety: tail is valid when present
        self.tail.map(|node| unsafe { &mut (*node.as_ptr()).data })
    }

    // ========================================================================
    // Iteration
    // ========================================================================

    /// Returns an iterator over references to elements, front to back.
    #[inline]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self.head, self.len)
    }

    /// Returns an iterator over mutable references to elements, front to back.
    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut::new(self.head, self.len)
    }
}

// =============================================================================
// Lenient accessors - default value instead of None
// =============================================================================

impl<T: Default> SequenceList<T> {
    /// Removes and returns the element at `index`.
    ///
    /// Returns `T::default()` and leaves the list unchanged if `index` is out
    /// of range. See [`remove_at`](Self::remove_at) to tell the cases apart.
    #[inline]
    pub fn remove(&mut self, index: usize) -> T {
        self.remove_at(index).unwrap_or_default()
    }

    /// Removes and returns the back element, or `T::default()` if empty.
    #[inline]
    pub fn pop(&mut self) -> T {
        self.pop_back().unwrap_or_default()
    }

    /// Removes and returns the front element, or `T::default()` if empty.
    #[inline]
    pub fn shift(&mut self) -> T {
        self.pop_front().unwrap_or_default()
    }
}

impl<T: Clone + Default> SequenceList<T> {
    /// Returns a clone of the element at `index`, or `T::default()` if out of
    /// range. See [`at`](Self::at) to tell the cases apart.
    #[inline]
    pub fn get(&self, index: usize) -> T {
        self.at(index).cloned().unwrap_or_default()
    }

    /// Returns a clone of the front element, or `T::default()` if empty.
    #[inline]
    pub fn head(&self) -> T {
        self.front().cloned().unwrap_or_default()
    }

    /// Returns a clone of the back element, or `T::default()` if empty.
    #[inline]
    pub fn tail(&self) -> T {
        self.back().cloned().unwrap_or_default()
    }
}

// =============================================================================
// Drop
// =============================================================================

impl<T> Drop for SequenceList<T> {
    fn drop(&mut self) {
        // Keeps releasing if a value's destructor panics.
        struct DropGuard<'a, T>(&'a mut SequenceList<T>);

        impl<T> Drop for DropGuard<'_, T> {
            fn drop(&mut self) {
                while self.0.pop_front().is_some() {}
            }
        }

        while let Some(value) = self.pop_front() {
            let guard = DropGuard(self);
            drop(value);
            mem::forget(guard);
        }
    }
}

// =============================================================================
// Trait impls
// =============================================================================

impl<T> Index<usize> for SequenceList<T> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[inline]
    fn index(&self, index: usize) -> &T {
        let len = self.len;
        match self.at(index) {
            Some(value) => value,
            None => panic!("index out of bounds: the len is {len} but the index is {index}"),
        }
    }
}

impl<T> IndexMut<usize> for SequenceList<T> {
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len;
        match self.at_mut(index) {
            Some(value) => value,
            None => panic!("index out of bounds: the len is {len} but the index is {index}"),
        }
    }
}

impl<T: Clone> Clone for SequenceList<T> {
    fn clone(&self) -> Self {
        self.iter().cloned().collect()
    }
}

impl<T: fmt::Debug> fmt::Debug for SequenceList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for SequenceList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for SequenceList<T> {}

impl<T: Hash> Hash for SequenceList<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len);
        for value in self {
            value.hash(state);
        }
    }
}

impl<T> Extend<T> for SequenceList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.add(value);
        }
    }
}

impl<T> FromIterator<T> for SequenceList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<T, const N: usize> From<[T; N]> for SequenceList<T> {
    fn from(values: [T; N]) -> Self {
        values.into_iter().collect()
    }
}

impl<T> IntoIterator for SequenceList<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    #[inline]
    fn into_iter(self) -> IntoIter<T> {
        IntoIter::new(self)
    }
}

impl<'a, T> IntoIterator for &'a SequenceList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    #[inline]
    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut SequenceList<T> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    #[inline]
    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}

// =============================================================================
// Test support
// =============================================================================

#[cfg(test)]
impl<T> SequenceList<T> {
    /// Checks the structural invariants, including cache validity.
    pub(crate) fn assert_invariants(&self) {
        let cache = self.cache.get();
        let mut count = 0;
        let mut last = None;
        let mut cursor = self.head;

        while let Some(node) = cursor {
            if let Some(hit) = cache {
                if hit.index == count {
                    assert_eq!(hit.node::<T>(), node, "cache node does not match its index");
                }
            }
            last = Some(node);
            count += 1;
            cursor = unsafe { node.as_ref().next };
        }

        assert_eq!(count, self.len, "len does not match chain length");
        assert_eq!(last, self.tail, "tail is not the last node");
        assert_eq!(self.head.is_none(), self.len == 0);
        assert_eq!(self.tail.is_none(), self.len == 0);
        if let Some(hit) = cache {
            assert!(hit.index < self.len, "cache index out of range");
        }
    }

    pub(crate) fn cached_index(&self) -> Option<usize> {
        self.cache.get().map(|hit| hit.index)
    }
}


#[cfg(test)]
mod bench_latency {
    use super::*;
    use hdrhistogram::Histogram;

    #[inline]
    fn rdtscp() -> u64 {
        #[cfg(target_arch = "x86_64")]
        unsafe {
            core::arch::x86_64::__rdtscp(&mut 0)
        }
        #[cfg(not(target_arch = "x86_64"))]
        {
            use std::sync::OnceLock;
            use std::time::Instant;
            static EPOCH: OnceLock<Instant> = OnceLock::new();
            EPOCH.get_or_init(Instant::now).elapsed().as_nanos() as u64
        }
    }

    fn print_histogram(name: &str, hist: &Histogram<u64>) {
        println!(
            "{:24} p50: {:4} cycles | p99: {:4} cycles | p999: {:5} cycles | min: {:4} | max: {:5}",
            name,
            hist.value_at_quantile(0.50),
            hist.value_at_quantile(0.99),
            hist.value_at_quantile(0.999),
            hist.min(),
            hist.max(),
        );
    }

    const WARMUP: usize = 10_000;
    const ITERATIONS: usize = 100_000;
    const SCAN_LEN: usize = 1_000;

    #[test]
    #[ignore]
    fn bench_add() {
        let mut list: SequenceList<u64> = SequenceList::new();
        let mut hist = Histogram::<u64>::new(3).unwrap();

        for i in 0..WARMUP {
            list.add(i as u64);
            let _ = list.pop_front();
        }

        for i in 0..ITERATIONS {
            let start = rdtscp();
            list.add(i as u64);
            let elapsed = rdtscp() - start;
            hist.record(elapsed).unwrap();
            let _ = list.pop_front();
        }

        print_histogram("add", &hist);
    }

    #[test]
    #[ignore]
    fn bench_unshift() {
        let mut list: SequenceList<u64> = SequenceList::new();
        let mut hist = Histogram::<u64>::new(3).unwrap();

        for i in 0..WARMUP {
            list.unshift(i as u64);
            let _ = list.pop_front();
        }

        for i in 0..ITERATIONS {
            let start = rdtscp();
            list.unshift(i as u64);
            let elapsed = rdtscp() - start;
            hist.record(elapsed).unwrap();
            let _ = list.pop_front();
        }

        print_histogram("unshift", &hist);
    }

    #[test]
    #[ignore]
    fn bench_sequential_get() {
        let list: SequenceList<u64> = (0..SCAN_LEN as u64).collect();
        let mut hist = Histogram::<u64>::new(3).unwrap();

        for _ in 0..WARMUP / SCAN_LEN {
            for i in 0..SCAN_LEN {
                std::hint::black_box(list.get(i));
            }
        }

        for _ in 0..ITERATIONS / SCAN_LEN {
            for i in 0..SCAN_LEN {
                let start = rdtscp();
                std::hint::black_box(list.get(i));
                let elapsed = rdtscp() - start;
                hist.record(elapsed).unwrap();
            }
        }

        print_histogram("get (ascending)", &hist);
    }

    #[test]
    #[ignore]
    fn bench_remove_middle() {
        let mut list: SequenceList<u64> = (0..SCAN_LEN as u64).collect();
        let mut hist = Histogram::<u64>::new(3).unwrap();
        let middle = SCAN_LEN / 2;

        for i in 0..ITERATIONS {
            list.add_at(middle, i as u64);
            let start = rdtscp();
            std::hint::black_box(list.remove_at(middle));
            let elapsed = rdtscp() - start;
            hist.record(elapsed).unwrap();
        }

        print_histogram("remove_at (middle)", &hist);
    }

    #[test]
    #[ignore]
    fn bench_list_all() {
        println!("\n=== SequenceList Latency ===");
        bench_add();
        bench_unshift();
        bench_sequential_get();
        bench_remove_middle();
    }
}
