//! Doubly-linked list over external slab storage.
//!
//! Nodes are stored in a [`slab::Slab`], with the list managing the links
//! internally. Insertion returns the node's slab key, which stays valid
//! until that exact node is removed, regardless of what happens to its
//! neighbors.

use std::marker::PhantomData;

use slab::Slab;

/// Storage for list nodes.
///
/// Grows on demand; slots are reused after removal, so keys are only
/// meaningful while their node is resident.
pub type ListStorage<T> = Slab<ListNode<T>>;

/// Sentinel key meaning "no node".
///
/// `slab` keys are dense indices, so `usize::MAX` can never collide with
/// a real key.
const NIL: usize = usize::MAX;

/// A node in the linked list.
///
/// Wraps user data with prev/next keys. Users interact with `&T` and
/// `&mut T` through the list's accessors; the node itself is an
/// implementation detail.
#[derive(Debug)]
pub struct ListNode<T> {
    data: T,
    prev: usize,
    next: usize,
}

impl<T> ListNode<T> {
    #[inline]
    fn new(data: T) -> Self {
        Self {
            data,
            prev: NIL,
            next: NIL,
        }
    }
}

/// A doubly-linked list over external storage.
///
/// The list tracks head, tail, and length. Nodes live in a caller-provided
/// [`ListStorage`], which may be shared with other lists (an element is in
/// at most one list at a time).
///
/// # Example
///
/// ```
/// use handoff_collections::{List, ListStorage};
///
/// let mut storage: ListStorage<String> = ListStorage::new();
/// let mut list: List<String> = List::new();
///
/// let key = list.push_back(&mut storage, "hello".into());
/// assert_eq!(list.get(&storage, key).map(String::as_str), Some("hello"));
/// ```
#[derive(Debug)]
pub struct List<T> {
    head: usize,
    tail: usize,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> List<T> {
    /// Creates an empty list.
    #[inline]
    pub const fn new() -> Self {
        Self {
            head: NIL,
            tail: NIL,
            len: 0,
            _marker: PhantomData,
        }
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

    /// Appends a value to the back of the list.
    ///
    /// Returns the new node's key for O(1) access or removal later.
    #[inline]
    pub fn push_back(&mut self, storage: &mut ListStorage<T>, value: T) -> usize {
        let key = storage.insert(ListNode::new(value));

        let node = &mut storage[key];
        node.prev = self.tail;
        node.next = NIL;

        if self.tail != NIL {
            storage[self.tail].next = key;
        } else {
            self.head = key;
        }

        self.tail = key;
        self.len += 1;
        key
    }

    /// Removes and returns the front element.
    ///
    /// Returns `None` if the list is empty.
    #[inline]
    pub fn pop_front(&mut self, storage: &mut ListStorage<T>) -> Option<T> {
        if self.head == NIL {
            return None;
        }

        let key = self.head;
        self.unlink(storage, key);
        Some(storage.remove(key).data)
    }

    /// Removes an element by key.
    ///
    /// Returns `None` if the key is not resident in storage.
    #[inline]
    pub fn remove(&mut self, storage: &mut ListStorage<T>, key: usize) -> Option<T> {
        storage.get(key)?;
        self.unlink(storage, key);
        Some(storage.remove(key).data)
    }

    /// Unlinks a node from the list, leaving it in storage.
    ///
    /// List surgery only: fixes up neighbor links and head/tail, clears
    /// the node's own links.
    fn unlink(&mut self, storage: &mut ListStorage<T>, key: usize) {
        let node = &storage[key];
        let prev = node.prev;
        let next = node.next;

        if prev != NIL {
            storage[prev].next = next;
        } else {
            self.head = next;
        }

        if next != NIL {
            storage[next].prev = prev;
        } else {
            self.tail = prev;
        }

        let node = &mut storage[key];
        node.prev = NIL;
        node.next = NIL;

        self.len -= 1;
    }

    /// Returns a reference to the element at the given key.
    #[inline]
    pub fn get<'a>(&self, storage: &'a ListStorage<T>, key: usize) -> Option<&'a T> {
        storage.get(key).map(|node| &node.data)
    }

    /// Returns a mutable reference to the element at the given key.
    #[inline]
    pub fn get_mut<'a>(&mut self, storage: &'a mut ListStorage<T>, key: usize) -> Option<&'a mut T> {
        storage.get_mut(key).map(|node| &mut node.data)
    }

    /// Iterates front-to-back, yielding `(key, &element)` pairs.
    ///
    /// The walk follows `next` links and stops at the sentinel, so it is
    /// well-defined on an empty list and never reads past the tail.
    #[inline]
    pub fn iter<'a>(&self, storage: &'a ListStorage<T>) -> Iter<'a, T> {
        Iter {
            storage,
            cur: self.head,
        }
    }

    /// Clears the list, removing all elements from storage.
    pub fn clear(&mut self, storage: &mut ListStorage<T>) {
        let mut key = self.head;
        while key != NIL {
            let next = storage[key].next;
            storage.remove(key);
            key = next;
        }

        self.head = NIL;
        self.tail = NIL;
        self.len = 0;
    }
}

/// Front-to-back iterator over `(key, &element)` pairs.
///
/// Created by [`List::iter`].
#[derive(Debug)]
pub struct Iter<'a, T> {
    storage: &'a ListStorage<T>,
    cur: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur == NIL {
            return None;
        }

        let key = self.cur;
        let node = &self.storage[key];
        self.cur = node.next;
        Some((key, &node.data))
    }
}
