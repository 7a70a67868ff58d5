//! Slab-backed linked list with stable keys.
//!
//! The one data structure in this workspace: a doubly-linked list whose
//! nodes live in an external [`slab::Slab`], coordinated by integer keys.
//! The key insight: separate storage from structure.
//!
//! ```text
//! slab::Slab  - owns the nodes, provides stable keys, reuses slots
//! List        - coordinates keys, owns nothing
//! ```
//!
//! Benefits over `std::collections::LinkedList` and raw pointer lists:
//!
//! - **Stable keys**: remove from the middle without invalidating the
//!   keys of other elements
//! - **O(1) keyed removal**: a caller that remembers its key can remove
//!   its own element without a scan
//! - **Safe traversal**: walking the list is a key-walk that ends at a
//!   sentinel, so a scan can never dereference past the tail
//! - **No manual node lifetime**: the slab frees a slot exactly when the
//!   list removes the node
//!
//! # Quick Start
//!
//! ```
//! use handoff_collections::{List, ListStorage};
//!
//! let mut storage: ListStorage<u64> = ListStorage::new();
//! let mut list: List<u64> = List::new();
//!
//! let a = list.push_back(&mut storage, 1);
//! let b = list.push_back(&mut storage, 2);
//! let c = list.push_back(&mut storage, 3);
//!
//! // O(1) removal from the middle - other keys stay valid
//! assert_eq!(list.remove(&mut storage, b), Some(2));
//! assert_eq!(list.get(&storage, c), Some(&3));
//!
//! assert_eq!(list.pop_front(&mut storage), Some(1));
//! assert_eq!(list.pop_front(&mut storage), Some(3));
//! assert_eq!(list.pop_front(&mut storage), None);
//! ```
//!
//! # Critical Invariant: Same Storage Instance
//!
//! All operations on a list must use the same storage instance it was
//! populated with. This is the caller's responsibility (same discipline
//! as the `slab` crate itself). Keys handed out by one storage are
//! meaningless to another.

#![warn(missing_docs)]

pub mod list;

pub use list::{List, ListStorage};
