//! Hollow Heap implementation
//!
//! A hollow heap is a simple data structure with the same amortized efficiency as
//! the classical Fibonacci heap, but with a simpler implementation.
//!
//! # Time Complexity
//!
//! | Operation      | Complexity           |
//! |----------------|----------------------|
//! | `insert`       | O(1) worst-case      |
//! | `get_min`      | O(1) worst-case      |
//! | `merge`        | O(1) worst-case (same arena) |
//! | `decrease_key` | O(1) amortized       |
//! | `delete_item`  | O(1) amortized, O(log n) if it removes the minimum |
//! | `extract_min`  | O(log n) amortized   |
//!
//! # Key Innovation
//!
//! Hollow heaps combine two ideas:
//!
//! 1. **Lazy deletion**: Deleting an item only detaches it from its node. The node
//!    stays in the structure as a *hollow* node until a later delete-min reaches it.
//!
//! 2. **Decrease-key by replacement**: Instead of cutting a subtree (like Fibonacci
//!    heaps), we create a new node with the lower key, move the item there and hang
//!    the old, now hollow, node below it. The hollow node keeps its place in its
//!    original parent's child list too, so it has two parents and the structure is
//!    a DAG rather than a tree.
//!
//! # Algorithm Overview
//!
//! - **Insert / merge**: Link the new tree with the root; the larger key becomes a child.
//! - **Decrease-key**: New node with lower key and rank `max(r - 2, 0)`, item moves there.
//! - **Delete-min**: Destroy the hollow root and every hollow node it exposes; each full
//!   node exposed becomes a root. Roots are linked by rank (like a binomial heap), then
//!   the survivors are linked into a single tree.
//!
//! # Storage
//!
//! Nodes and items live in a generational arena (`slotmap`). Heaps created with
//! [`HollowHeap::sibling`] share an arena and merge in constant time; heaps with
//! different arenas can still be merged, at a cost linear in the absorbed heap.
//!
//! # References
//!
//! - Hansen, T.D., Kaplan, H., Tarjan, R.E., Zwick, U. (2015). "Hollow Heaps."
//!   *ICALP 2015*. [arXiv:1510.06535](https://arxiv.org/abs/1510.06535)
//! - Hansen, T.D., Kaplan, H., Tarjan, R.E., Zwick, U. (2017). "Hollow Heaps."
//!   *ACM Transactions on Algorithms*, 13(3), 42.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use log::{debug, trace};
use smallvec::{smallvec, SmallVec};

use crate::rank::{self, INLINE_SLOTS};
use crate::storage::{Forest, HandleSlot, Item, ItemKey, Node, NodeKey, OwnerId};
use crate::traits::{AddressableHeap, Handle, Heap, HeapError};

/// Full roots indexed by rank during delete-min
type RankTable = SmallVec<[Option<NodeKey>; INLINE_SLOTS]>;

/// Handle to an item in a [`HollowHeap`]
///
/// The handle follows the item, not the node: `decrease_key` moves the item to a
/// new node and merging heaps may move it to another arena, and the handle keeps
/// working in both cases. Once the item is removed the handle is permanently
/// invalid and every operation given it fails with [`HeapError::InvalidHandle`].
#[derive(Clone)]
pub struct ItemHandle {
    slot: HandleSlot,
}

impl PartialEq for ItemHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.slot, &other.slot)
    }
}

impl Eq for ItemHandle {}

impl fmt::Debug for ItemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemHandle")
            .field("location", &self.slot.get())
            .finish()
    }
}

impl Handle for ItemHandle {}

/// Hollow Heap implementation
///
/// A min-heap over keys of type `K`. `insert` returns an [`ItemHandle`] that can
/// later be used with [`decrease_key`](HollowHeap::decrease_key) and
/// [`delete_item`](HollowHeap::delete_item).
///
/// # Example
///
/// ```rust
/// use hollow_heap::hollow::HollowHeap;
///
/// let mut heap = HollowHeap::new();
/// let handle = heap.insert(5);
/// heap.insert(3);
/// heap.decrease_key(&handle, 1).unwrap();
/// assert_eq!(heap.get_min(), Ok(1));
/// assert_eq!(heap.extract_min(), Ok(1));
/// assert_eq!(heap.len(), 1);
/// ```
pub struct HollowHeap<K> {
    forest: Rc<RefCell<Forest<K>>>,
    /// Identity of this heap inside the arena
    owner: OwnerId,
    /// Root of the single tree (None if empty)
    min: Option<NodeKey>,
    /// Number of live items
    count: usize,
}

impl<K> HollowHeap<K> {
    /// Creates an empty heap with its own arena.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty heap whose arena has room for `capacity` items
    /// before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut forest = Forest::with_capacity(capacity);
        let owner = forest.new_owner();
        HollowHeap {
            forest: Rc::new(RefCell::new(forest)),
            owner,
            min: None,
            count: 0,
        }
    }

    /// Creates an empty heap sharing this heap's arena.
    ///
    /// Merging sibling heaps never moves nodes, so it is O(1) worst-case.
    ///
    /// ```rust
    /// use hollow_heap::hollow::HollowHeap;
    ///
    /// let mut a = HollowHeap::new();
    /// let mut b = a.sibling();
    /// a.insert(2);
    /// let handle = b.insert(1);
    /// a.merge(&mut b);
    /// a.decrease_key(&handle, 0).unwrap();
    /// assert_eq!(a.extract_min(), Ok(0));
    /// ```
    pub fn sibling(&self) -> Self {
        let owner = self.forest.borrow_mut().new_owner();
        HollowHeap {
            forest: Rc::clone(&self.forest),
            owner,
            min: None,
            count: 0,
        }
    }

    /// Returns true if the heap holds no items
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns the number of live items
    pub fn len(&self) -> usize {
        self.count
    }

    /// Number of nodes, full and hollow, currently allocated in this heap's arena.
    ///
    /// Sibling heaps share an arena, so their nodes are counted together.
    pub fn node_count(&self) -> usize {
        self.forest.borrow().node_count()
    }

    /// Returns true if `handle` refers to a live item of this heap.
    pub fn contains(&self, handle: &ItemHandle) -> bool {
        let mut forest = self.forest.borrow_mut();
        self.resolve(&mut forest, handle).is_ok()
    }

    /// Removes every item, invalidating all outstanding handles.
    pub fn clear(&mut self) {
        if let Some(min) = self.min.take() {
            let released = self.forest.borrow_mut().release(min);
            debug!("released {} items from hollow heap", released);
        }
        self.count = 0;
    }

    /// Maps a handle to the item it refers to, if that item belongs to this heap.
    fn resolve(&self, forest: &mut Forest<K>, handle: &ItemHandle) -> Result<ItemKey, HeapError> {
        let location = handle.slot.get().ok_or(HeapError::InvalidHandle)?;
        if location.forest != forest.id() {
            return Err(HeapError::InvalidHandle);
        }
        let owner = forest
            .get_item(location.item)
            .ok_or(HeapError::InvalidHandle)?
            .owner;
        if !forest.same_owner(owner, self.owner) {
            return Err(HeapError::InvalidHandle);
        }
        Ok(location.item)
    }
}

impl<K: Ord + Clone> HollowHeap<K> {
    /// Returns the minimum key.
    ///
    /// # Errors
    /// Returns [`HeapError::EmptyHeap`] if the heap is empty.
    pub fn get_min(&self) -> Result<K, HeapError> {
        let min = self.min.ok_or(HeapError::EmptyHeap)?;
        Ok(self.forest.borrow().node(min).key.clone())
    }

    /// Returns the current key of the item behind `handle`.
    ///
    /// # Errors
    /// Returns [`HeapError::InvalidHandle`] if the item was removed or is not in this heap.
    pub fn value(&self, handle: &ItemHandle) -> Result<K, HeapError> {
        let mut forest = self.forest.borrow_mut();
        let item = self.resolve(&mut forest, handle)?;
        Ok(forest.item(item).value.clone())
    }

    /// Inserts a key, returning a handle to the new item.
    pub fn insert(&mut self, value: K) -> ItemHandle {
        let mut forest = self.forest.borrow_mut();
        let (node, slot) = forest.new_full_node(value, self.owner);

        self.min = Some(match self.min {
            None => node,
            Some(min) => Self::link(&mut forest, min, node),
        });
        self.count += 1;

        ItemHandle { slot }
    }

    /// Moves every item of `other` into this heap, leaving `other` empty.
    ///
    /// Handles obtained from `other` stay valid and now refer to items of `self`.
    /// `other` remains usable as an empty heap.
    pub fn merge(&mut self, other: &mut Self) {
        let Some(other_min) = other.min.take() else {
            return;
        };
        let other_count = std::mem::take(&mut other.count);

        let mut forest = self.forest.borrow_mut();
        let other_root = if Rc::ptr_eq(&self.forest, &other.forest) {
            // Same arena: the items only change hands.
            forest.union_owners(self.owner, other.owner);
            let absorbed = std::mem::replace(&mut other.owner, forest.new_owner());
            forest.release_owner(absorbed);
            other_min
        } else {
            let mut donor = other.forest.borrow_mut();
            let root = forest.adopt(&mut donor, other_min, self.owner);
            debug!(
                "moved {} items into arena {:?}, {} nodes left in donor arena",
                other_count,
                forest.id(),
                donor.node_count()
            );
            root
        };

        self.min = Some(match self.min {
            None => other_root,
            Some(min) => Self::link(&mut forest, min, other_root),
        });
        self.count += other_count;
    }

    /// Removes and returns the minimum key.
    ///
    /// # Errors
    /// Returns [`HeapError::EmptyHeap`] if the heap is empty.
    pub fn extract_min(&mut self) -> Result<K, HeapError> {
        let min = self.min.ok_or(HeapError::EmptyHeap)?;
        let arena = Rc::clone(&self.forest);
        let mut forest = arena.borrow_mut();
        let item = forest
            .node(min)
            .item
            .expect("the minimum root is never hollow");
        Ok(self.remove(&mut forest, item))
    }

    /// Lowers the key of the item behind `handle` to `value`.
    ///
    /// Setting the key to its current value is a no-op.
    ///
    /// # Errors
    /// - [`HeapError::InvalidHandle`] if the item was removed or is not in this heap
    /// - [`HeapError::KeyIncreased`] if `value` is greater than the current key
    ///
    /// The heap is unchanged when an error is returned.
    pub fn decrease_key(&mut self, handle: &ItemHandle, value: K) -> Result<(), HeapError> {
        let arena = Rc::clone(&self.forest);
        let mut forest = arena.borrow_mut();
        let item = self.resolve(&mut forest, handle)?;

        match value.cmp(&forest.item(item).value) {
            Ordering::Greater => return Err(HeapError::KeyIncreased),
            Ordering::Equal => return Ok(()),
            Ordering::Less => {}
        }

        let old = forest.item(item).node;

        // The root is already minimal: update in place.
        if self.min == Some(old) {
            forest.node_mut(old).key = value.clone();
            forest.item_mut(item).value = value;
            return Ok(());
        }

        let min = self
            .min
            .expect("heap holding a live item must have a root");
        let rank = rank::after_decrease(forest.node(old).rank);
        let fresh = forest.insert_node(Node {
            key: value.clone(),
            item: Some(item),
            child: Some(old),
            next: None,
            extra_parent: None,
            rank,
        });

        // The old node goes hollow and gains the new node as its second parent.
        // It keeps its `next` link: the rest of its original sibling list still
        // hangs off it for the benefit of the first parent.
        let hollowed = forest.node_mut(old);
        hollowed.item = None;
        hollowed.extra_parent = Some(fresh);

        let record = forest.item_mut(item);
        record.node = fresh;
        record.value = value;

        self.min = Some(Self::link(&mut forest, fresh, min));
        Ok(())
    }

    /// Removes the item behind `handle`, returning its key.
    ///
    /// # Errors
    /// Returns [`HeapError::InvalidHandle`] if the item was removed or is not in this heap.
    pub fn delete_item(&mut self, handle: &ItemHandle) -> Result<K, HeapError> {
        let arena = Rc::clone(&self.forest);
        let mut forest = arena.borrow_mut();
        let item = self.resolve(&mut forest, handle)?;
        Ok(self.remove(&mut forest, item))
    }

    /// Removes all items, returning their keys in ascending order.
    pub fn into_sorted_vec(mut self) -> Vec<K> {
        let mut sorted = Vec::with_capacity(self.count);
        while let Ok(key) = self.extract_min() {
            sorted.push(key);
        }
        sorted
    }

    /// Checks the internal structure, returning false on any inconsistency.
    ///
    /// Verifies that the root is full and unlinked, that heap order holds along
    /// every parent-child edge, that every full node and its item point at each
    /// other, and that the number of reachable items matches `len()`.
    /// Walks the whole structure, so it is meant for tests and debugging.
    pub fn verify_structure(&self) -> bool {
        let mut forest = self.forest.borrow_mut();
        let Some(min) = self.min else {
            return self.count == 0;
        };

        let root = forest.node(min);
        if root.is_hollow() || root.next.is_some() || root.extra_parent.is_some() {
            return false;
        }

        let mut full = 0;
        for key in forest.reachable(min) {
            let node = forest.node(key);
            if node.extra_parent.is_some() && !node.is_hollow() {
                return false;
            }

            let mut cursor = node.child;
            while let Some(child) = cursor {
                let child_node = forest.node(child);
                if child_node.key < node.key {
                    return false;
                }
                // Past a child whose second parent is `key`, the list belongs
                // to that child's first parent.
                if child_node.extra_parent == Some(key) {
                    break;
                }
                cursor = child_node.next;
            }

            if let Some(item) = node.item {
                full += 1;
                let Some(record) = forest.get_item(item) else {
                    return false;
                };
                if record.node != key || record.value != node.key {
                    return false;
                }
                let owner = record.owner;
                if !forest.same_owner(owner, self.owner) {
                    return false;
                }
            }
        }

        full == self.count
    }

    /// Detaches `item` from its node and frees it, reclaiming if the node was the root.
    fn remove(&mut self, forest: &mut Forest<K>, item: ItemKey) -> K {
        let Item { value, node, .. } = forest.remove_item(item);
        forest.node_mut(node).item = None;

        if self.min == Some(node) {
            self.reclaim(forest, node);
        }
        self.count -= 1;

        value
    }

    /// Destroys the hollow root `vacated` and every hollow node it exposes, then
    /// rebuilds a single tree from the exposed full nodes.
    ///
    /// Called before `count` is decremented.
    fn reclaim(&mut self, forest: &mut Forest<K>, vacated: NodeKey) {
        let mut full_roots: RankTable = smallvec![None; rank::table_size(self.count)];
        let mut max_rank = 0;
        let mut hollow = vec![vacated];
        let mut destroyed = 0usize;

        while let Some(parent) = hollow.pop() {
            let mut cursor = forest.node(parent).child;
            while let Some(child) = cursor {
                let node = forest.node_mut(child);
                if !node.is_hollow() {
                    cursor = node.next.take();
                    let placed = Self::ranked_insert(forest, &mut full_roots, child);
                    max_rank = max_rank.max(placed);
                    continue;
                }

                match node.extra_parent.take() {
                    // Only parent is going away: destroy it too.
                    None => {
                        cursor = node.next;
                        hollow.push(child);
                    }
                    // We are its second parent; the rest of this list is the
                    // first parent's.
                    Some(second) if second == parent => cursor = None,
                    // We are its first parent; the second parent keeps it.
                    Some(_) => cursor = node.next.take(),
                }
            }

            forest.remove_node(parent);
            destroyed += 1;
        }

        let mut root: Option<NodeKey> = None;
        let mut survivors = 0usize;
        for slot in full_roots.iter_mut().take(max_rank + 1) {
            if let Some(tree) = slot.take() {
                survivors += 1;
                root = Some(match root {
                    None => tree,
                    Some(acc) => Self::link(forest, acc, tree),
                });
            }
        }

        trace!(
            "reclaimed {} hollow nodes, linked {} ranked roots (max rank {})",
            destroyed,
            survivors,
            max_rank
        );
        self.min = root;
    }

    /// Places a full root in the rank table, linking it with equal-rank roots
    /// until it finds a free slot. Returns the rank it settled at.
    fn ranked_insert(forest: &mut Forest<K>, full_roots: &mut RankTable, mut tree: NodeKey) -> usize {
        loop {
            let rank = usize::from(forest.node(tree).rank);
            if rank >= full_roots.len() {
                full_roots.resize(rank + 1, None);
            }

            match full_roots[rank].take() {
                None => {
                    full_roots[rank] = Some(tree);
                    return rank;
                }
                Some(occupant) => {
                    tree = Self::link(forest, tree, occupant);
                    let winner = forest.node_mut(tree);
                    winner.rank = rank::checked_increment(winner.rank);
                }
            }
        }
    }

    /// Links two roots, making the one with the larger key the first child of
    /// the other. Returns the winner; `a` wins ties.
    fn link(forest: &mut Forest<K>, a: NodeKey, b: NodeKey) -> NodeKey {
        if forest.node(a).key <= forest.node(b).key {
            Self::add_child(forest, a, b);
            a
        } else {
            Self::add_child(forest, b, a);
            b
        }
    }

    /// Prepends child to parent's child list
    fn add_child(forest: &mut Forest<K>, parent: NodeKey, child: NodeKey) {
        let first = forest.node_mut(parent).child.replace(child);
        forest.node_mut(child).next = first;
        // A root has no siblings.
        forest.node_mut(parent).next = None;
    }
}

impl<K> Default for HollowHeap<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Drop for HollowHeap<K> {
    fn drop(&mut self) {
        // Without siblings the whole arena goes away with this heap.
        if Rc::strong_count(&self.forest) > 1 {
            self.clear();
            self.forest.borrow_mut().release_owner(self.owner);
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for HollowHeap<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let forest = self.forest.borrow();
        let min = self.min.map(|key| &forest.node(key).key);
        f.debug_struct("HollowHeap")
            .field("len", &self.count)
            .field("min", &min)
            .field("arena", &*forest)
            .finish()
    }
}

impl<K: Ord + Clone> Extend<K> for HollowHeap<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K: Ord + Clone> FromIterator<K> for HollowHeap<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut heap = Self::with_capacity(iter.size_hint().0);
        heap.extend(iter);
        heap
    }
}

impl<K: Ord + Clone> Heap<K> for HollowHeap<K> {
    fn new() -> Self {
        Self::with_capacity(0)
    }

    fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn len(&self) -> usize {
        self.count
    }

    fn push(&mut self, key: K) {
        let _ = self.insert(key);
    }

    fn peek(&self) -> Option<K> {
        self.get_min().ok()
    }

    fn pop(&mut self) -> Option<K> {
        self.extract_min().ok()
    }

    fn merge(&mut self, other: &mut Self) {
        HollowHeap::merge(self, other);
    }
}

impl<K: Ord + Clone> AddressableHeap<K> for HollowHeap<K> {
    type Handle = ItemHandle;

    fn push_with_handle(&mut self, key: K) -> Self::Handle {
        self.insert(key)
    }

    fn decrease_key(&mut self, handle: &Self::Handle, key: K) -> Result<(), HeapError> {
        HollowHeap::decrease_key(self, handle, key)
    }

    fn delete(&mut self, handle: &Self::Handle) -> Result<K, HeapError> {
        self.delete_item(handle)
    }
}
