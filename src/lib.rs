//! Hollow heap: an addressable, mergeable priority queue
//!
//! This crate provides the hollow heap of Hansen, Kaplan, Tarjan and Zwick, a
//! min-heap with handle-based `decrease_key` and arbitrary deletion that matches
//! the amortized bounds of the Fibonacci heap with a much simpler structure.
//!
//! # Features
//!
//! - O(1) insert, find-min and merge
//! - O(1) amortized decrease-key and deletion of non-minimum items
//! - O(log n) amortized extract-min
//! - Handles that survive merges and decrease-key, and are rejected once their
//!   item is gone or when used with a heap that does not own them
//! - Arena storage with generational keys: no `unsafe`, no reference cycles
//!
//! # Example
//!
//! ```rust
//! use hollow_heap::hollow::HollowHeap;
//! use hollow_heap::HeapError;
//!
//! let mut heap = HollowHeap::new();
//! let handle1 = heap.insert(5);
//! let _handle2 = heap.insert(3);
//! heap.decrease_key(&handle1, 1).unwrap();
//! assert_eq!(heap.get_min(), Ok(1));
//!
//! heap.delete_item(&handle1).unwrap();
//! assert_eq!(heap.decrease_key(&handle1, 0), Err(HeapError::InvalidHandle));
//! assert_eq!(heap.extract_min(), Ok(3));
//! assert_eq!(heap.extract_min(), Err(HeapError::EmptyHeap));
//! ```
//!
//! # Logging
//!
//! Diagnostics go through the [`log`] facade: delete-min passes are reported at
//! `trace` level, arena transfers and releases at `debug` level.

pub mod hollow;
pub mod rank;
mod storage;
pub mod traits;

// Re-export the main types for convenience
pub use hollow::{HollowHeap, ItemHandle};
pub use traits::{AddressableHeap, Handle, Heap, HeapError};
