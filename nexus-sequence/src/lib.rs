//! Singly-linked sequence list for memory-constrained systems.
//!
//! [`SequenceList`] stores each element in its own node, so growing the
//! list never reallocates or needs a contiguous block. It trades the
//! random-access speed of `Vec` for:
//!
//! - **O(1) append and prepend**: the tail is tracked directly
//! - **Cached indexed access**: the last node found by index is remembered,
//!   so ascending scans with [`get`](SequenceList::get) cost O(1) per call
//! - **In-place stable sort**: a natural merge sort that relinks nodes
//!   without an auxiliary buffer and without moving any `T`
//!
//! # Quick Start
//!
//! ```
//! use nexus_sequence::SequenceList;
//!
//! let mut list = SequenceList::new();
//! list.add(3);
//! list.add(1);
//! list.unshift(2);
//!
//! assert_eq!(list.len(), 3);
//! assert_eq!(list.get(0), 2);
//!
//! list.sort();
//! assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
//! ```
//!
//! # Two Error Contracts
//!
//! The index-based API has a lenient contract that firmware-style callers
//! expect: out-of-range reads return `T::default()` and out-of-range writes
//! return `false`.
//!
//! ```
//! use nexus_sequence::SequenceList;
//!
//! let mut list: SequenceList<u32> = SequenceList::new();
//! assert_eq!(list.pop(), 0);      // empty: default value
//! assert!(!list.set(4, 1));       // out of range: no-op
//! ```
//!
//! A stored default and a missing element look the same through that
//! contract. Use [`exist`](SequenceList::exist) / [`len`](SequenceList::len),
//! or the `Option`-returning twins:
//!
//! | Lenient | Explicit |
//! |---------|----------|
//! | [`get`](SequenceList::get) | [`at`](SequenceList::at), [`at_mut`](SequenceList::at_mut) |
//! | [`head`](SequenceList::head) / [`tail`](SequenceList::tail) | [`front`](SequenceList::front) / [`back`](SequenceList::back) |
//! | [`remove`](SequenceList::remove) | [`remove_at`](SequenceList::remove_at) |
//! | [`pop`](SequenceList::pop) / [`shift`](SequenceList::shift) | [`pop_back`](SequenceList::pop_back) / [`pop_front`](SequenceList::pop_front) |
//!
//! # Allocation Failure
//!
//! `add`, `add_at` and `unshift` treat allocation failure as fatal, like
//! `Vec::push`. The `try_` variants return [`AllocError`] carrying the value
//! back instead.
//!
//! # Thread Safety
//!
//! The list is `Send` but not `Sync`: lookups through `&self` update the
//! position cache.
//!
//! # Feature Flags
//!
//! - `log` - Emit `log` records for allocation failures and sort passes

#![warn(missing_docs)]

#[cfg(feature = "log")]
macro_rules! log_trace {
    ($($arg:tt)*) => { ::log::trace!(target: "nexus_sequence", $($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_trace {
    ($($arg:tt)*) => {
        if false {
            let _ = format_args!($($arg)*);
        }
    };
}

#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { ::log::warn!(target: "nexus_sequence", $($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if false {
            let _ = format_args!($($arg)*);
        }
    };
}

pub mod error;
pub mod iter;
pub mod list;
mod node;
mod sort;

pub use error::AllocError;
pub use iter::{IntoIter, Iter, IterMut};
pub use list::SequenceList;
