//! Arena storage for hollow heap nodes and items
//!
//! Nodes and items live in a [`Forest`]: two `slotmap` tables addressed by
//! generational keys. Every pointer of the heap structure (`child`, `next`,
//! `extra_parent`, item↔node) is a key into these tables, so a stale reference
//! is detected by a failed lookup instead of a use-after-free.
//!
//! A forest may be shared by several heaps (see `HollowHeap::sibling`). Each
//! heap owns a disjoint set of items; the forest tracks which heap an item
//! belongs to through an alias table with union-find semantics, so that
//! melding two sibling heaps is a constant-time union rather than a walk over
//! the absorbed items. Table entries are reference counted (items, heaps and
//! child entries all hold one) and recycled once nothing refers to them.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use slotmap::{new_key_type, SecondaryMap, SlotMap};

use crate::rank::Rank;

new_key_type! {
    /// Arena key of a heap node
    pub(crate) struct NodeKey;

    /// Arena key of an item
    pub(crate) struct ItemKey;
}

static NEXT_FOREST: AtomicU64 = AtomicU64::new(0);

/// Process-unique identity of a forest, stamped into handle locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ForestId(u64);

impl ForestId {
    fn fresh() -> Self {
        ForestId(NEXT_FOREST.fetch_add(1, Ordering::Relaxed))
    }
}

/// Identity of a heap within its forest (an entry of the alias table).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OwnerId(usize);

/// Where an item currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Location {
    pub forest: ForestId,
    pub item: ItemKey,
}

/// Shared cell between an item and the handles given out for it.
///
/// The heap rewrites it when the item moves to another forest and clears it
/// when the item is removed.
pub(crate) type HandleSlot = Rc<Cell<Option<Location>>>;

/// A node of the heap DAG.
///
/// A node is *full* while it owns an item and *hollow* afterwards.
pub(crate) struct Node<K> {
    /// Cached key; still meaningful for ordering after the node went hollow
    pub key: K,
    pub item: Option<ItemKey>,
    /// First child
    pub child: Option<NodeKey>,
    /// Next sibling in the parent's child list (unset for roots)
    pub next: Option<NodeKey>,
    /// Second parent, set when `decrease_key` hollowed this node
    pub extra_parent: Option<NodeKey>,
    pub rank: Rank,
}

impl<K> Node<K> {
    pub fn is_hollow(&self) -> bool {
        self.item.is_none()
    }
}

/// A live item: the value a handle refers to.
pub(crate) struct Item<K> {
    pub value: K,
    /// Full node currently owning this item
    pub node: NodeKey,
    pub owner: OwnerId,
    pub slot: HandleSlot,
}

/// An entry of the owner alias table.
#[derive(Debug, Clone, Copy)]
struct OwnerEntry {
    /// `parent == own index` marks the representative of a set
    parent: usize,
    /// Upper bound on the height below a representative
    rank: u8,
    /// Items, heaps and child entries referring to this entry
    refs: usize,
}

/// Node and item tables shared by one or more heaps.
pub(crate) struct Forest<K> {
    id: ForestId,
    nodes: SlotMap<NodeKey, Node<K>>,
    items: SlotMap<ItemKey, Item<K>>,
    owners: Vec<OwnerEntry>,
    /// Recyclable indices of `owners`
    free_owners: Vec<usize>,
}

impl<K> fmt::Debug for Forest<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Forest")
            .field("id", &self.id)
            .field("nodes", &self.nodes.len())
            .field("items", &self.items.len())
            .field("owners", &self.owner_count())
            .finish()
    }
}

impl<K> Forest<K> {
    pub fn with_capacity(capacity: usize) -> Self {
        Forest {
            id: ForestId::fresh(),
            nodes: SlotMap::with_capacity_and_key(capacity),
            items: SlotMap::with_capacity_and_key(capacity),
            owners: Vec::new(),
            free_owners: Vec::new(),
        }
    }

    pub fn id(&self) -> ForestId {
        self.id
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, key: NodeKey) -> &Node<K> {
        &self.nodes[key]
    }

    pub fn node_mut(&mut self, key: NodeKey) -> &mut Node<K> {
        &mut self.nodes[key]
    }

    pub fn insert_node(&mut self, node: Node<K>) -> NodeKey {
        self.nodes.insert(node)
    }

    pub fn remove_node(&mut self, key: NodeKey) -> Node<K> {
        self.nodes
            .remove(key)
            .expect("removed node must be present in the arena")
    }

    pub fn item(&self, key: ItemKey) -> &Item<K> {
        &self.items[key]
    }

    pub fn item_mut(&mut self, key: ItemKey) -> &mut Item<K> {
        &mut self.items[key]
    }

    pub fn get_item(&self, key: ItemKey) -> Option<&Item<K>> {
        self.items.get(key)
    }

    /// Removes an item and invalidates every handle to it.
    pub fn remove_item(&mut self, key: ItemKey) -> Item<K> {
        let item = self
            .items
            .remove(key)
            .expect("removed item must be present in the arena");
        item.slot.set(None);
        self.release_owner(item.owner);
        item
    }

    /// Creates a fresh heap identity, held once by the caller.
    pub fn new_owner(&mut self) -> OwnerId {
        let id = self.free_owners.pop().unwrap_or(self.owners.len());
        let entry = OwnerEntry {
            parent: id,
            rank: 0,
            refs: 1,
        };
        if id == self.owners.len() {
            self.owners.push(entry);
        } else {
            self.owners[id] = entry;
        }
        OwnerId(id)
    }

    fn retain_owner(&mut self, owner: OwnerId) {
        self.owners[owner.0].refs += 1;
    }

    /// Drops one reference to `owner`, recycling every entry left unreferenced.
    pub fn release_owner(&mut self, owner: OwnerId) {
        let mut id = owner.0;
        loop {
            let entry = &mut self.owners[id];
            entry.refs -= 1;
            if entry.refs > 0 {
                return;
            }
            let parent = entry.parent;
            self.free_owners.push(id);
            if parent == id {
                return;
            }
            // The parent loses a child entry.
            id = parent;
        }
    }

    /// Number of owner table entries in use.
    pub fn owner_count(&self) -> usize {
        self.owners.len() - self.free_owners.len()
    }

    /// Representative of the set `owner` belongs to (with path halving).
    pub fn find_owner(&mut self, owner: OwnerId) -> OwnerId {
        let mut id = owner.0;
        loop {
            let parent = self.owners[id].parent;
            if parent == id {
                return OwnerId(id);
            }
            let grandparent = self.owners[parent].parent;
            if grandparent != parent {
                self.owners[id].parent = grandparent;
                self.owners[grandparent].refs += 1;
                self.release_owner(OwnerId(parent));
            }
            id = grandparent;
        }
    }

    /// Makes every item owned by `from` count as owned by `into`.
    ///
    /// Union by rank: the shallower set hangs below the other representative.
    pub fn union_owners(&mut self, into: OwnerId, from: OwnerId) {
        let a = self.find_owner(into).0;
        let b = self.find_owner(from).0;
        if a == b {
            return;
        }
        let (root, child) = match self.owners[a].rank.cmp(&self.owners[b].rank) {
            std::cmp::Ordering::Less => (b, a),
            std::cmp::Ordering::Greater => (a, b),
            std::cmp::Ordering::Equal => {
                self.owners[a].rank += 1;
                (a, b)
            }
        };
        self.owners[child].parent = root;
        self.owners[root].refs += 1;
    }

    pub fn same_owner(&mut self, a: OwnerId, b: OwnerId) -> bool {
        self.find_owner(a) == self.find_owner(b)
    }

    /// Every node reachable from `root` through `child` and `next` links.
    ///
    /// The structure is a DAG (hollow nodes may have two parents), so nodes are
    /// reported once each.
    pub fn reachable(&self, root: NodeKey) -> Vec<NodeKey> {
        let mut seen: SecondaryMap<NodeKey, ()> = SecondaryMap::new();
        let mut order = Vec::new();
        let mut stack = vec![root];

        while let Some(key) = stack.pop() {
            let Some(node) = self.nodes.get(key) else {
                continue;
            };
            if seen.insert(key, ()).is_some() {
                continue;
            }
            order.push(key);
            stack.extend(node.next);
            stack.extend(node.child);
        }

        order
    }

    /// Frees everything reachable from `root`, returning the number of items freed.
    pub fn release(&mut self, root: NodeKey) -> usize {
        let mut released = 0;
        for key in self.reachable(root) {
            let node = self.remove_node(key);
            if let Some(item) = node.item {
                self.remove_item(item);
                released += 1;
            }
        }
        released
    }

    /// Moves the structure rooted at `root` out of `donor` into this forest.
    ///
    /// Moved items are assigned to `owner` and their handle slots are rewritten
    /// so that outstanding handles keep working. Returns the root's new key.
    pub fn adopt(&mut self, donor: &mut Forest<K>, root: NodeKey, owner: OwnerId) -> NodeKey {
        let order = donor.reachable(root);
        let mut moved: SecondaryMap<NodeKey, NodeKey> = SecondaryMap::with_capacity(order.len());

        for &old in &order {
            let node = donor.remove_node(old);
            moved.insert(old, self.nodes.insert(node));
        }

        let remap = |key: Option<NodeKey>| key.and_then(|k| moved.get(k).copied());
        for &old in &order {
            let node = &mut self.nodes[moved[old]];
            node.child = remap(node.child);
            node.next = remap(node.next);
            node.extra_parent = remap(node.extra_parent);

            if let Some(old_item) = node.item {
                let mut item = donor
                    .items
                    .remove(old_item)
                    .expect("full node must own a live item");
                donor.release_owner(item.owner);
                item.node = moved[old];
                item.owner = owner;
                self.owners[owner.0].refs += 1;
                let slot = Rc::clone(&item.slot);
                let new_item = self.items.insert(item);
                slot.set(Some(Location {
                    forest: self.id,
                    item: new_item,
                }));
                node.item = Some(new_item);
            }
        }

        moved[root]
    }
}

impl<K: Clone> Forest<K> {
    /// Allocates a full rank-0 node together with the item it owns.
    pub fn new_full_node(&mut self, value: K, owner: OwnerId) -> (NodeKey, HandleSlot) {
        let node = self.nodes.insert(Node {
            key: value.clone(),
            item: None,
            child: None,
            next: None,
            extra_parent: None,
            rank: 0,
        });
        let slot: HandleSlot = Rc::new(Cell::new(None));
        self.retain_owner(owner);
        let item = self.items.insert(Item {
            value,
            node,
            owner,
            slot: Rc::clone(&slot),
        });
        self.nodes[node].item = Some(item);
        slot.set(Some(Location {
            forest: self.id,
            item,
        }));
        (node, slot)
    }
}
