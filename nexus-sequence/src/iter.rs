//! Forward iterators over a [`SequenceList`].
//!
//! Iteration follows links, not indices, so it never touches the position
//! cache. Each iterator carries the current link plus a remaining count.

use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;

use crate::SequenceList;
use crate::node::{Link, Node};

/// Iterator over references to list elements.
pub struct Iter<'a, T> {
    current: Link<T>,
    remaining: usize,
    _marker: PhantomData<&'a Node<T>>,
}

impl<'a, T> Iter<'a, T> {
    #[inline]
    pub(crate) fn new(head: Link<T>, len: usize) -> Self {
        Self {
            current: head,
            remaining: len,
            _marker: PhantomData,
        }
    }
}

// Safety: Iter only hands out shared references.
unsafe impl<T: Sync> Send for Iter<'_, T> {}
unsafe impl<T: Sync> Sync for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            current: self.current,
            remaining: self.remaining,
            _marker: PhantomData,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        self.current.map(|node| {
            // Safety: the list is borrowed for 'a, so the node outlives it
            let node = unsafe { &*node.as_ptr() };
            self.remaining -= 1;
            self.current = node.next;
            &node.data
        })
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

/// Iterator over mutable references to list elements.
pub struct IterMut<'a, T> {
    current: Link<T>,
    remaining: usize,
    _marker: PhantomData<&'a mut Node<T>>,
}

impl<'a, T> IterMut<'a, T> {
    #[inline]
    pub(crate) fn new(head: Link<T>, len: usize) -> Self {
        Self {
            current: head,
            remaining: len,
            _marker: PhantomData,
        }
    }
}

// Safety: IterMut behaves like `&mut T`.
unsafe impl<T: Send> Send for IterMut<'_, T> {}
unsafe impl<T: Sync> Sync for IterMut<'_, T> {}

impl<T> fmt::Debug for IterMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterMut")
            .field("remaining", &self.remaining)
            .finish()
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        self.current.map(|node| {
            // Safety: the list is exclusively borrowed for 'a and each node
            // is visited exactly once
            let node = unsafe { &mut *node.as_ptr() };
            self.remaining -= 1;
            self.current = node.next;
            &mut node.data
        })
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

impl<T> FusedIterator for IterMut<'_, T> {}

/// Owning iterator that yields elements front to back.
pub struct IntoIter<T> {
    list: SequenceList<T>,
}

impl<T> IntoIter<T> {
    #[inline]
    pub(crate) fn new(list: SequenceList<T>) -> Self {
        Self { list }
    }
}

impl<T: fmt::Debug> fmt::Debug for IntoIter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.list).finish()
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.list.pop_front()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.list.len(), Some(self.list.len()))
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}

#[cfg(test)]
mod tests {
    use crate::SequenceList;

    #[test]
    fn iter_empty() {
        let list: SequenceList<u64> = SequenceList::new();
        assert_eq!(list.iter().count(), 0);
        assert!(list.iter().next().is_none());
    }

    #[test]
    fn iter_front_to_back() {
        let mut list = SequenceList::new();
        list.add(2u64);
        list.add(3);
        list.unshift(1);

        let values: Vec<_> = list.iter().copied().collect();
        assert_eq!(values, vec![1, 2, 3]);
        assert_eq!(list.iter().len(), 3);
    }

    #[test]
    fn iter_is_restartable() {
        let list: SequenceList<u64> = (0..4).collect();
        let first: Vec<_> = list.iter().collect();
        let second: Vec<_> = list.iter().collect();
        assert_eq!(first, second);

        let mut it = list.iter();
        it.next();
        let resumed: Vec<_> = it.clone().copied().collect();
        assert_eq!(resumed, vec![1, 2, 3]);
    }

    #[test]
    fn iter_leaves_cache_alone() {
        let list: SequenceList<u64> = (0..5).collect();
        list.at(2);
        for _ in &list {}
        assert_eq!(list.cached_index(), Some(2));
    }

    #[test]
    fn iter_is_fused() {
        let list: SequenceList<u64> = (0..1).collect();
        let mut it = list.iter();
        assert_eq!(it.next(), Some(&0));
        assert_eq!(it.next(), None);
        assert_eq!(it.next(), None);
    }

    #[test]
    fn multiple_shared_iterators() {
        let list: SequenceList<u64> = (0..3).collect();
        let pairs: Vec<_> = list.iter().zip(list.iter().skip(1)).collect();
        assert_eq!(pairs, vec![(&0, &1), (&1, &2)]);
    }

    #[test]
    fn iter_mut_modifies_in_place() {
        let mut list: SequenceList<u64> = (1..=3).collect();
        for value in list.iter_mut() {
            *value *= 10;
        }
        assert_eq!(list.get(0), 10);
        assert_eq!(list.get(1), 20);
        assert_eq!(list.get(2), 30);
        list.assert_invariants();
    }

    #[test]
    fn into_iter_by_ref_mut() {
        let mut list: SequenceList<u64> = (0..3).collect();
        for value in &mut list {
            *value += 1;
        }
        let values: Vec<_> = (&list).into_iter().copied().collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn into_iter_owned() {
        let list: SequenceList<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let mut it = list.into_iter();
        assert_eq!(it.len(), 3);
        assert_eq!(it.next().as_deref(), Some("a"));
        let rest: Vec<_> = it.collect();
        assert_eq!(rest, vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn into_iter_partial_drop_releases_rest() {
        use std::rc::Rc;

        let tracker = Rc::new(());
        let list: SequenceList<_> = (0..4).map(|_| Rc::clone(&tracker)).collect();
        let mut it = list.into_iter();
        it.next();
        drop(it);
        assert_eq!(Rc::strong_count(&tracker), 1);
    }

    #[test]
    fn iter_debug() {
        let list: SequenceList<u64> = (0..2).collect();
        assert_eq!(format!("{:?}", list.iter()), "[0, 1]");
    }
}
