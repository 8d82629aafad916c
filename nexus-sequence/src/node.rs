//! Heap-allocated chain nodes.
//!
//! Each node is its own allocation, so the list never needs a contiguous
//! block and never reallocates. Allocation goes through the global
//! allocator directly so that insertion can report failure instead of
//! aborting.

use core::ptr::NonNull;
use std::alloc::{Layout, alloc, dealloc, handle_alloc_error};

/// Link to the next node, or `None` at the end of the chain.
pub(crate) type Link<T> = Option<NonNull<Node<T>>>;

/// A single element of the chain.
pub(crate) struct Node<T> {
    pub(crate) data: T,
    pub(crate) next: Link<T>,
}

impl<T> Node<T> {
    // Never zero-sized: a node always carries its `next` link.
    const LAYOUT: Layout = Layout::new::<Node<T>>();

    /// Allocates an unlinked node holding `data`.
    ///
    /// Hands `data` back if the allocator refuses.
    #[inline]
    pub(crate) fn try_alloc(data: T) -> Result<NonNull<Self>, T> {
        // Safety: LAYOUT has non-zero size
        let ptr = unsafe { alloc(Self::LAYOUT) }.cast::<Self>();
        match NonNull::new(ptr) {
            Some(node) => {
                // Safety: fresh allocation sized and aligned for Node<T>
                unsafe { node.as_ptr().write(Node { data, next: None }) };
                Ok(node)
            }
            None => Err(data),
        }
    }

    /// Allocates an unlinked node holding `data`.
    ///
    /// # Aborts
    ///
    /// Calls [`handle_alloc_error`] if the allocator refuses.
    #[inline]
    pub(crate) fn alloc(data: T) -> NonNull<Self> {
        match Self::try_alloc(data) {
            Ok(node) => node,
            Err(_) => handle_alloc_error(Self::LAYOUT),
        }
    }

    /// Releases a node and returns its value.
    ///
    /// # Safety
    ///
    /// `node` must come from [`Node::alloc`] or [`Node::try_alloc`], must
    /// already be unlinked from its chain, and must not be released twice.
    #[inline]
    pub(crate) unsafe fn release(node: NonNull<Self>) -> T {
        unsafe {
            let Node { data, .. } = node.as_ptr().read();
            dealloc(node.as_ptr().cast(), Self::LAYOUT);
            data
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_and_release_round_trip() {
        let node = Node::alloc(String::from("payload"));
        // Safety: fresh node, never linked
        assert!(unsafe { node.as_ref() }.next.is_none());
        let value = unsafe { Node::release(node) };
        assert_eq!(value, "payload");
    }

    #[test]
    fn zero_sized_values_still_get_a_node() {
        assert!(Node::<()>::LAYOUT.size() > 0);
        let node = Node::try_alloc(()).ok().unwrap();
        unsafe { Node::release(node) };
    }
}
