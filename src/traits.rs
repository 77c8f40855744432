//! Common traits for addressable heaps
//!
//! This module provides a two-tier trait hierarchy:
//!
//! - [`Heap`]: Base trait with the `BinaryHeap`-style surface (`push`, `pop`, `peek`, `merge`)
//! - [`AddressableHeap`]: Extended trait adding handle-based `decrease_key` and `delete`
//!
//! Both traits are implemented by [`HollowHeap`](crate::hollow::HollowHeap); generic
//! code (and the integration tests) are written against the traits so that the
//! hollow heap can be swapped for another addressable heap.

use std::fmt;

/// Error type for heap operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapError {
    /// The heap holds no items
    EmptyHeap,
    /// The handle is no longer valid (item was removed) or belongs to another heap
    InvalidHandle,
    /// `decrease_key` was given a key larger than the item's current key
    ///
    /// This is the heap-order invariant violation: accepting the key would put
    /// the item above a smaller descendant. An equal key is not an error.
    /// Corresponds to `PriorityNotDecreased` in heaps that reject equal keys too.
    KeyIncreased,
}

impl fmt::Display for HeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeapError::EmptyHeap => write!(f, "the heap is empty"),
            HeapError::InvalidHandle => {
                write!(f, "handle is no longer valid or belongs to another heap")
            }
            HeapError::KeyIncreased => {
                write!(
                    f,
                    "new key is greater than the item's current key (heap order violation)"
                )
            }
        }
    }
}

impl std::error::Error for HeapError {}

/// A handle to an item in an addressable heap
///
/// Handles may be `Clone` but not necessarily `Copy`, depending on the
/// underlying implementation.
pub trait Handle: Clone + PartialEq + Eq {}

/// Base trait for min-heaps over a totally ordered key
///
/// Unlike `BinaryHeap`, this is a min-heap: `pop` returns the smallest key.
///
/// # Example
///
/// ```rust
/// use hollow_heap::Heap;
/// use hollow_heap::hollow::HollowHeap;
///
/// let mut heap: HollowHeap<i32> = Heap::new();
/// heap.push(3);
/// heap.push(1);
/// heap.push(2);
///
/// assert_eq!(heap.peek(), Some(1));
/// assert_eq!(heap.pop(), Some(1));
/// ```
pub trait Heap<K: Ord> {
    /// Creates a new empty heap
    fn new() -> Self;

    /// Returns true if the heap is empty
    fn is_empty(&self) -> bool;

    /// Returns the number of items in the heap
    fn len(&self) -> usize;

    /// Inserts a key
    fn push(&mut self, key: K);

    /// Returns a copy of the minimum key without removing it
    fn peek(&self) -> Option<K>;

    /// Removes and returns the minimum key
    fn pop(&mut self) -> Option<K>;

    /// Moves every item of `other` into this heap, leaving `other` empty
    fn merge(&mut self, other: &mut Self);
}

/// Extended heap trait with handle-based operations
///
/// # Example
///
/// ```rust
/// use hollow_heap::{AddressableHeap, Heap};
/// use hollow_heap::hollow::HollowHeap;
///
/// let mut heap: HollowHeap<i32> = Heap::new();
/// let handle = heap.push_with_handle(10);
/// heap.decrease_key(&handle, 5).unwrap();
/// assert_eq!(heap.peek(), Some(5));
/// ```
pub trait AddressableHeap<K: Ord>: Heap<K> {
    /// The handle type for this heap
    type Handle: Handle;

    /// Inserts a key, returning a handle to the new item
    fn push_with_handle(&mut self, key: K) -> Self::Handle;

    /// Lowers the key of the item identified by `handle`
    ///
    /// # Errors
    /// - [`HeapError::InvalidHandle`] if the item was removed or is not in this heap
    /// - [`HeapError::KeyIncreased`] if `key` is greater than the current key
    fn decrease_key(&mut self, handle: &Self::Handle, key: K) -> Result<(), HeapError>;

    /// Removes the item identified by `handle`, returning its key
    ///
    /// # Errors
    /// Returns [`HeapError::InvalidHandle`] if the item was removed or is not in this heap.
    fn delete(&mut self, handle: &Self::Handle) -> Result<K, HeapError>;
}
