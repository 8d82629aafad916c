//! Error types for fallible insertion.

use core::fmt;

/// Error returned when a node could not be allocated.
///
/// Carries the value that could not be inserted so the caller keeps
/// ownership of it.
///
/// # Example
///
/// ```
/// use nexus_sequence::{AllocError, SequenceList};
///
/// let mut list: SequenceList<u64> = SequenceList::new();
/// match list.try_add(7) {
///     Ok(()) => assert_eq!(list.len(), 1),
///     Err(AllocError(value)) => assert_eq!(value, 7),
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocError<T>(pub T);

impl<T> AllocError<T> {
    /// Returns the value that could not be inserted.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Display for AllocError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to allocate list node")
    }
}

impl<T: fmt::Debug> std::error::Error for AllocError<T> {}
