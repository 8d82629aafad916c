//! In-place natural merge sort over the node chain.
//!
//! Each pass scans the chain for maximal non-descending runs and merges
//! adjacent pairs by relinking nodes. Passes repeat until one run spans the
//! whole chain. No buffer is allocated and no `T` is moved.
//!
//! ```text
//! pass 1:  [5 7] [2 9] [1 4 6] [3]      runs found by scanning
//!          └─merge─┘   └──merge──┘
//! pass 2:  [2 5 7 9]   [1 3 4 6]
//!          └─────merge─────┘
//! pass 3:  [1 2 3 4 5 6 7 9]            single run: done
//! ```
//!
//! Merging takes from the left run on ties, and runs are cut only where the
//! next element is strictly smaller, so the sort is stable.

use core::cmp::Ordering;
use core::mem;
use core::ptr::NonNull;

use crate::SequenceList;
use crate::node::{Link, Node};

impl<T> SequenceList<T> {
    /// Sorts the list in ascending order.
    ///
    /// Stable. See [`sort_by`](Self::sort_by).
    #[inline]
    pub fn sort(&mut self)
    where
        T: Ord,
    {
        self.sort_by(|a, b| a.cmp(b));
    }

    /// Sorts the list by the key `f` extracts from each element.
    ///
    /// Stable. The key is recomputed on every comparison.
    #[inline]
    pub fn sort_by_key<K, F>(&mut self, mut f: F)
    where
        K: Ord,
        F: FnMut(&T) -> K,
    {
        self.sort_by(|a, b| f(a).cmp(&f(b)));
    }

    /// Sorts the list with a three-way comparator.
    ///
    /// The sort is stable: elements that compare `Equal` keep their relative
    /// order. Nodes are relinked in place; values never move. Already sorted
    /// input finishes after a single O(n) scan.
    ///
    /// If `compare` panics, every element is still in the list, in an
    /// unspecified order.
    ///
    /// # Example
    ///
    /// ```
    /// use nexus_sequence::SequenceList;
    ///
    /// let mut list = SequenceList::from([(2, 'a'), (1, 'b'), (2, 'c'), (1, 'd')]);
    /// list.sort_by(|x, y| x.0.cmp(&y.0));
    ///
    /// let order: Vec<char> = list.iter().map(|&(_, tag)| tag).collect();
    /// assert_eq!(order, vec!['b', 'd', 'a', 'c']);
    /// ```
    pub fn sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        if self.len < 2 {
            return;
        }

        self.forget();

        let guard = Resync(self);
        // Safety: the chain is well formed and exclusively borrowed
        let (tail, passes) = unsafe { merge_runs(&mut guard.0.head, &mut compare) };
        guard.0.tail = Some(tail);
        let len = guard.0.len;
        mem::forget(guard);

        log_trace!("sorted {} elements in {} passes", len, passes);
    }
}

/// Recomputes the tail if a comparator panic unwinds out of the sort.
struct Resync<'a, T>(&'a mut SequenceList<T>);

impl<T> Drop for Resync<'_, T> {
    fn drop(&mut self) {
        let mut tail = self.0.head;
        // Safety: Splice relinks every node before the panic leaves it
        while let Some(next) = tail.and_then(|node| unsafe { node.as_ref().next }) {
            tail = Some(next);
        }
        self.0.tail = tail;
    }
}

/// Merges runs until one spans the chain.
///
/// Returns the last node and the number of passes.
///
/// # Safety
///
/// `head` must start a well-formed, non-empty chain with no other live
/// references into it.
unsafe fn merge_runs<T, F>(head: &mut Link<T>, compare: &mut F) -> (NonNull<Node<T>>, usize)
where
    F: FnMut(&T, &T) -> Ordering,
{
    let head: *mut Link<T> = head;
    let mut passes = 0;

    loop {
        passes += 1;
        let mut join = head;

        // Safety: join always points at a live link slot in the chain
        while let Some(left) = unsafe { *join } {
            let left_end = unsafe { run_end(left, compare) };
            let Some(right) = (unsafe { left_end.as_ref().next }) else {
                if join == head {
                    return (left_end, passes);
                }
                // Odd run out; it is merged on the next pass.
                break;
            };
            let right_end = unsafe { run_end(right, compare) };

            // Safety: both ends are live nodes in the chain
            let mut splice = unsafe {
                let rest = right_end.as_ref().next;
                (*left_end.as_ptr()).next = None;
                (*right_end.as_ptr()).next = None;
                Splice {
                    join,
                    left: Some(left),
                    left_end,
                    right: Some(right),
                    right_end,
                    rest,
                    closed: false,
                }
            };
            unsafe {
                splice.merge(compare);
                join = splice.close();
            }
        }
    }
}

/// Returns the last node of the non-descending run starting at `node`.
///
/// # Safety
///
/// `node` must be a live node of a well-formed chain.
unsafe fn run_end<T, F>(mut node: NonNull<Node<T>>, compare: &mut F) -> NonNull<Node<T>>
where
    F: FnMut(&T, &T) -> Ordering,
{
    // Safety: every link in a well-formed chain is live
    while let Some(next) = unsafe { node.as_ref().next } {
        let ordering = unsafe { compare(&node.as_ref().data, &next.as_ref().data) };
        if ordering == Ordering::Greater {
            break;
        }
        node = next;
    }
    node
}

/// Two detached runs being merged into the slot at `join`.
///
/// Everything before `join` is already merged. `left` and `right` hold the
/// unconsumed parts of each run, ending at `left_end`/`right_end`. `rest`
/// is the chain after both runs.
///
/// Dropping an unclosed splice relinks whatever is left, so a panicking
/// comparator cannot detach nodes from the list.
struct Splice<T> {
    join: *mut Link<T>,
    left: Link<T>,
    left_end: NonNull<Node<T>>,
    right: Link<T>,
    right_end: NonNull<Node<T>>,
    rest: Link<T>,
    closed: bool,
}

impl<T> Splice<T> {
    /// Moves nodes to `join` in order until one run is exhausted.
    unsafe fn merge<F>(&mut self, compare: &mut F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        while let (Some(left), Some(right)) = (self.left, self.right) {
            // Safety: unconsumed nodes are live
            let take = unsafe {
                if compare(&left.as_ref().data, &right.as_ref().data) != Ordering::Greater {
                    self.left = left.as_ref().next;
                    left
                } else {
                    self.right = right.as_ref().next;
                    right
                }
            };

            // Safety: join is a live slot; take is live
            unsafe {
                *self.join = Some(take);
                self.join = &raw mut (*take.as_ptr()).next;
            }
        }
    }

    /// Links the unconsumed runs and then `rest` after `join`.
    ///
    /// Returns the link slot holding `rest`.
    unsafe fn close(&mut self) -> *mut Link<T> {
        self.closed = true;

        // Safety: join and both run ends are live
        unsafe {
            if let Some(left) = self.left.take() {
                *self.join = Some(left);
                self.join = &raw mut (*self.left_end.as_ptr()).next;
            }
            if let Some(right) = self.right.take() {
                *self.join = Some(right);
                self.join = &raw mut (*self.right_end.as_ptr()).next;
            }
            *self.join = self.rest.take();
        }

        self.join
    }
}

impl<T> Drop for Splice<T> {
    fn drop(&mut self) {
        if !self.closed {
            // Safety: reached only while unwinding out of merge
            unsafe { self.close() };
        }
    }
}
