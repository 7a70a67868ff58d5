//! An unbounded blocking FIFO queue with ticket pairing.
//!
//! [`PairingQueue`] is a thread-safe, unbounded, multi-producer
//! multi-consumer queue where a consumer that blocks on an empty queue is
//! *paired* to a specific future item before it is woken. The producer
//! reserves the new item for the oldest unpaired waiter and then wakes
//! exactly that waiter — so no two blocked consumers ever race for the
//! same item, and a woken consumer never finds the queue bare.
//!
//! # Why Pairing
//!
//! The naive design signals a condition variable on every enqueue and
//! lets the woken threads race:
//!
//! ```text
//! Broadcast-and-race:
//! ┌──────────────────────────────────────────────────────────┐
//! │ enqueue(x) -> push -> notify                             │
//! │ waiter A wakes ─┐                                        │
//! │ waiter B wakes ─┼─> both scan the queue, one loses,      │
//! │ waiter C wakes ─┘   two go back to sleep (thundering     │
//! │                     herd; wakeup order is arbitrary)     │
//! └──────────────────────────────────────────────────────────┘
//!
//! Ticket pairing:
//! ┌──────────────────────────────────────────────────────────┐
//! │ enqueue(x) -> push -> reserve x for oldest unpaired      │
//! │               waiter -> wake that one waiter             │
//! │ the woken waiter removes exactly its reserved item;      │
//! │ nobody else is woken, nobody competes                    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Pairing happens *before* the wake, under the same lock as the push, so
//! the woken thread already knows precisely which item is its own. This
//! also buys FIFO fairness among waiters: the oldest unpaired waiter
//! always receives the next produced item.
//!
//! # Structure
//!
//! All state sits behind a single mutex: an item list (pending payloads,
//! each tagged with a monotonically increasing sequence number and a
//! reserved flag), a waiter list (one ticket per blocked [`dequeue`]
//! call), and the bookkeeping counters. Both lists are slab-backed
//! [`handoff_collections::List`]s, so removal from the middle is O(1) by
//! key and traversal can never run past the tail.
//!
//! Each ticket carries its own wakeup handle, a
//! [`crossbeam_utils::sync::Parker`] token: the producer unparks one
//! specific waiter, and a wake that lands before the waiter has parked is
//! simply consumed by the next park. There is no shared condition
//! variable and no broadcast anywhere.
//!
//! [`dequeue`]: PairingQueue::dequeue
//!
//! # Example
//!
//! ```
//! use handoff_queue::PairingQueue;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let queue = Arc::new(PairingQueue::new());
//!
//! let q = Arc::clone(&queue);
//! let consumer = thread::spawn(move || q.dequeue());
//!
//! queue.enqueue("hello");
//!
//! assert_eq!(consumer.join().unwrap(), "hello");
//! ```
//!
//! # Non-blocking Consumption
//!
//! [`try_dequeue`](PairingQueue::try_dequeue) takes the oldest item that
//! is not reserved for a waiter, or returns `None` immediately. It never
//! enrolls a ticket and never waits — an item already promised to a
//! blocked consumer is invisible to it:
//!
//! ```
//! use handoff_queue::PairingQueue;
//!
//! let queue: PairingQueue<u64> = PairingQueue::new();
//!
//! assert_eq!(queue.try_dequeue(), None);
//!
//! queue.enqueue(1);
//! queue.enqueue(2);
//!
//! assert_eq!(queue.try_dequeue(), Some(1));
//! assert_eq!(queue.try_dequeue(), Some(2));
//! assert_eq!(queue.try_dequeue(), None);
//! ```
//!
//! # What This Is Not
//!
//! No capacity bound (`enqueue` never blocks), no priorities, no
//! timeouts, no cancellation: once a thread is inside [`dequeue`], it
//! returns only when a future `enqueue` pairs an item to it. Dropping the
//! queue while a consumer is parked is unreachable from safe code —
//! blocked calls borrow the queue, so the borrow checker (or the caller's
//! `Arc`) keeps it alive until they return. For blocking with
//! disconnect-on-drop semantics, use a channel instead.

#![warn(missing_docs)]

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crossbeam_utils::sync::{Parker, Unparker};
use handoff_collections::{List, ListStorage};

/// A pending payload.
///
/// `seq` is unique and strictly increasing in arrival order; it is the
/// value a ticket's reservation refers to. `reserved` items are promised
/// to a specific waiter and skipped by every other consumer.
struct Item<T> {
    payload: T,
    seq: u64,
    reserved: bool,
}

/// Bookkeeping for one blocked `dequeue` call.
///
/// The matching `Parker` lives on the blocked call's stack; the
/// `Unparker` is a cheap cloneable handle, so the producer can wake the
/// waiter without ever touching its stack frame.
struct Ticket {
    unparker: Unparker,
    reservation: Option<u64>,
}

/// Everything behind the lock.
///
/// Invariants whenever the lock is not held:
///
/// - `paired <= waiters.len()` and `paired <= items.len()`
/// - exactly `paired` items are `reserved`, exactly `paired` tickets
///   carry a reservation, and set reservations map one-to-one onto
///   reserved items' `seq` values
/// - `seq` is strictly increasing front-to-back along the item list
struct Inner<T> {
    items: List<Item<T>>,
    item_slab: ListStorage<Item<T>>,
    waiters: List<Ticket>,
    waiter_slab: ListStorage<Ticket>,
    /// Items currently reserved for a waiter but not yet collected.
    paired: usize,
    /// Total payloads handed to consumers. Monotonic.
    visited: u64,
    /// Next sequence number to assign. Monotonic, never reused.
    next_seq: u64,
}

impl<T> Inner<T> {
    /// Unlinks and returns the first unreserved item.
    ///
    /// Caller must have established `items.len() > paired`, which
    /// guarantees such an item exists.
    fn take_first_unreserved(&mut self) -> T {
        let key = self
            .items
            .iter(&self.item_slab)
            .find(|(_, item)| !item.reserved)
            .map(|(key, _)| key)
            .expect("items.len() > paired implies an unreserved item");

        let item = self
            .items
            .remove(&mut self.item_slab, key)
            .expect("key was just yielded by iteration");

        self.visited += 1;
        item.payload
    }
}

/// An unbounded blocking FIFO queue with ticket pairing.
///
/// Multi-producer, multi-consumer, `&self` API throughout; share it
/// between threads with an `Arc` (or scoped threads).
///
/// See the [crate docs](crate) for the pairing protocol.
///
/// # Example
///
/// ```
/// use handoff_queue::PairingQueue;
///
/// let queue = PairingQueue::new();
///
/// queue.enqueue(1);
/// queue.enqueue(2);
///
/// assert_eq!(queue.dequeue(), 1);
/// assert_eq!(queue.dequeue(), 2);
/// assert_eq!(queue.visited(), 2);
/// ```
pub struct PairingQueue<T> {
    inner: Mutex<Inner<T>>,
}

impl<T> Default for PairingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PairingQueue<T> {
    /// Creates an empty queue.
    ///
    /// # Example
    ///
    /// ```
    /// use handoff_queue::PairingQueue;
    ///
    /// let queue: PairingQueue<String> = PairingQueue::new();
    /// assert!(queue.is_empty());
    /// ```
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: List::new(),
                item_slab: ListStorage::new(),
                waiters: List::new(),
                waiter_slab: ListStorage::new(),
                paired: 0,
                visited: 0,
                next_seq: 0,
            }),
        }
    }

    /// Acquires the state lock.
    ///
    /// Poisoning is recovered: no caller code runs under the lock, so a
    /// poisoned guard still holds consistent state.
    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a payload to the queue.
    ///
    /// If any blocked consumer is still unpaired, the new item is
    /// reserved for the oldest such consumer and exactly that consumer is
    /// woken, all within the same locked section as the append. Never
    /// blocks, never fails.
    ///
    /// # Example
    ///
    /// ```
    /// use handoff_queue::PairingQueue;
    ///
    /// let queue = PairingQueue::new();
    /// queue.enqueue("payload");
    /// assert_eq!(queue.len(), 1);
    /// ```
    pub fn enqueue(&self, payload: T) {
        let mut guard = self.lock();
        let inner = &mut *guard;

        let seq = inner.next_seq;
        inner.next_seq += 1;

        let item_key = inner.items.push_back(
            &mut inner.item_slab,
            Item {
                payload,
                seq,
                reserved: false,
            },
        );

        // Pair the new item with the oldest unpaired waiter, then wake
        // exactly that waiter. Reserving before the unpark is what makes
        // the wakeup unambiguous.
        if inner.waiters.len() > inner.paired {
            let ticket_key = inner
                .waiters
                .iter(&inner.waiter_slab)
                .find(|(_, ticket)| ticket.reservation.is_none())
                .map(|(key, _)| key)
                .expect("waiters.len() > paired implies an unpaired ticket");

            let ticket = inner
                .waiters
                .get_mut(&mut inner.waiter_slab, ticket_key)
                .expect("key was just yielded by iteration");
            ticket.reservation = Some(seq);
            let unparker = ticket.unparker.clone();

            inner
                .items
                .get_mut(&mut inner.item_slab, item_key)
                .expect("item was just inserted")
                .reserved = true;
            inner.paired += 1;

            unparker.unpark();
        }
    }

    /// Removes and returns the oldest available payload, blocking until
    /// one arrives.
    ///
    /// If an unreserved item is resident, it is taken immediately.
    /// Otherwise the call enrolls a ticket at the tail of the waiter list
    /// and parks; a future [`enqueue`](Self::enqueue) reserves its item
    /// and wakes it, and the call removes exactly that item.
    ///
    /// There is no timeout and no cancellation: the call returns only
    /// when a matching enqueue occurs.
    ///
    /// # Example
    ///
    /// ```
    /// use handoff_queue::PairingQueue;
    /// use std::sync::Arc;
    /// use std::thread;
    ///
    /// let queue = Arc::new(PairingQueue::new());
    ///
    /// let q = Arc::clone(&queue);
    /// let handle = thread::spawn(move || q.dequeue());
    ///
    /// queue.enqueue(42);
    /// assert_eq!(handle.join().unwrap(), 42);
    /// ```
    pub fn dequeue(&self) -> T {
        let ticket_key;
        let parker;

        {
            let mut guard = self.lock();
            let inner = &mut *guard;

            // Fast path: an unreserved item is already resident.
            if inner.items.len() > inner.paired {
                return inner.take_first_unreserved();
            }

            // Enroll a ticket and go to sleep until an enqueue reserves
            // an item for us.
            parker = Parker::new();
            ticket_key = inner.waiters.push_back(
                &mut inner.waiter_slab,
                Ticket {
                    unparker: parker.unparker().clone(),
                    reservation: None,
                },
            );
        }

        // An unpark that lands between the unlock above and the park
        // below is stored in the parker's token and consumed here, so
        // unlock-then-park cannot miss the wake.
        loop {
            parker.park();

            let mut guard = self.lock();
            let inner = &mut *guard;

            let reservation = inner
                .waiters
                .get(&inner.waiter_slab, ticket_key)
                .expect("ticket is resident until this call removes it")
                .reservation;

            let Some(seq) = reservation else {
                // The only unpark site reserves before waking, so an
                // unreserved wake cannot happen; tolerate it by parking
                // again rather than returning an item we don't own.
                debug_assert!(false, "woken without a reservation");
                continue;
            };

            let item_key = inner
                .items
                .iter(&inner.item_slab)
                .find(|(_, item)| item.seq == seq)
                .map(|(key, _)| key)
                .expect("a set reservation identifies a resident item");

            let item = inner
                .items
                .remove(&mut inner.item_slab, item_key)
                .expect("key was just yielded by iteration");
            debug_assert!(item.reserved, "reserved seq on an unreserved item");

            inner.paired -= 1;
            inner.waiters.remove(&mut inner.waiter_slab, ticket_key);
            inner.visited += 1;

            return item.payload;
        }
    }

    /// Removes and returns the oldest unreserved payload, or `None` if
    /// every resident item is reserved (or the queue is empty).
    ///
    /// Never enrolls a ticket and never waits. Items already promised to
    /// a blocked consumer are skipped.
    ///
    /// # Example
    ///
    /// ```
    /// use handoff_queue::PairingQueue;
    ///
    /// let queue = PairingQueue::new();
    /// assert_eq!(queue.try_dequeue(), None);
    ///
    /// queue.enqueue(7);
    /// assert_eq!(queue.try_dequeue(), Some(7));
    /// ```
    pub fn try_dequeue(&self) -> Option<T> {
        let mut guard = self.lock();
        let inner = &mut *guard;

        if inner.items.len() <= inner.paired {
            return None;
        }

        Some(inner.take_first_unreserved())
    }

    /// Returns the number of payloads currently resident, reserved or
    /// not.
    ///
    /// A snapshot: with concurrent producers and consumers it may be
    /// stale by the time the caller looks at it. Diagnostics only, not a
    /// coordination primitive.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Returns `true` if no payloads are resident.
    ///
    /// Same snapshot caveat as [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of blocked consumers that have no item assigned
    /// to them yet.
    ///
    /// A consumer that is paired (its item has been reserved) but has not
    /// yet collected it is *not* counted: it is guaranteed to return and
    /// no longer needs a producer. Same snapshot caveat as
    /// [`len`](Self::len).
    ///
    /// # Example
    ///
    /// ```
    /// use handoff_queue::PairingQueue;
    ///
    /// let queue: PairingQueue<u64> = PairingQueue::new();
    /// assert_eq!(queue.waiting(), 0);
    /// ```
    pub fn waiting(&self) -> usize {
        let guard = self.lock();
        guard.waiters.len() - guard.paired
    }

    /// Returns the total number of payloads handed to consumers over the
    /// queue's lifetime.
    ///
    /// Monotonic; counts successful [`dequeue`](Self::dequeue) and
    /// [`try_dequeue`](Self::try_dequeue) completions.
    pub fn visited(&self) -> u64 {
        self.lock().visited
    }

    /// Drops all resident payloads and resets the queue to empty,
    /// including [`visited`](Self::visited). Sequence numbering is not
    /// restarted: a sequence number is never reused over the queue's
    /// lifetime, clears included.
    ///
    /// Must not be called while any consumer is blocked in
    /// [`dequeue`](Self::dequeue); doing so is a bug in the caller and is
    /// caught by a debug assertion.
    ///
    /// # Example
    ///
    /// ```
    /// use handoff_queue::PairingQueue;
    ///
    /// let queue = PairingQueue::new();
    /// queue.enqueue(1);
    /// queue.enqueue(2);
    /// assert_eq!(queue.try_dequeue(), Some(1));
    ///
    /// queue.clear();
    /// assert!(queue.is_empty());
    /// assert_eq!(queue.visited(), 0);
    /// assert_eq!(queue.try_dequeue(), None);
    /// ```
    pub fn clear(&self) {
        let mut guard = self.lock();
        let inner = &mut *guard;

        debug_assert!(
            inner.waiters.is_empty(),
            "clear() while consumers are blocked in dequeue()"
        );

        inner.items.clear(&mut inner.item_slab);
        inner.paired = 0;
        inner.visited = 0;
        // next_seq is deliberately left alone: sequence numbers are
        // never reused, so a reservation can never alias an item from a
        // different epoch.
    }
}

impl<T> fmt::Debug for PairingQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.lock();
        f.debug_struct("PairingQueue")
            .field("len", &guard.items.len())
            .field("waiting", &(guard.waiters.len() - guard.paired))
            .field("paired", &guard.paired)
            .field("visited", &guard.visited)
            .finish_non_exhaustive()
    }
}
