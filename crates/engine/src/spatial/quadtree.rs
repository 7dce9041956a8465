//! Region QuadTree for spatial indexing.
//!
//! Items live in a slot map; each item remembers the node that holds it and
//! its slot inside that node's item list, so removal is O(1) and never
//! descends the tree. Nodes are stored in a flat arena and are never merged
//! back: the tree only grows until it is rebuilt with [`QuadTree::reset`].

use crate::geometry::Bounds;
use slotmap::{SlotMap, new_key_type};

/// Maximum items a leaf holds before it subdivides.
pub const MAX_ITEMS: usize = 64;

/// Depth at which leaves stop subdividing. Only reachable when thousands of
/// items pile up on the same point, where f32 quadrant bounds would
/// otherwise collapse.
pub const MAX_DEPTH: u32 = 24;

new_key_type! {
    /// Handle returned by [`QuadTree::insert`].
    pub struct QuadHandle;
}

#[derive(Debug)]
struct QuadNode {
    bound: Bounds,
    depth: u32,
    /// Index of the first of four consecutive child nodes.
    children: Option<usize>,
    items: Vec<QuadHandle>,
}

impl QuadNode {
    fn new(bound: Bounds, depth: u32) -> Self {
        Self {
            bound,
            depth,
            children: None,
            items: Vec::new(),
        }
    }

    /// Quadrant that fully contains `bound`, if any.
    #[inline]
    fn quadrant(&self, bound: &Bounds) -> Option<usize> {
        let c = self.bound.center();
        if bound.max_x <= c.x {
            if bound.max_y <= c.y {
                return Some(0);
            }
            if bound.min_y >= c.y {
                return Some(2);
            }
        } else if bound.min_x >= c.x {
            if bound.max_y <= c.y {
                return Some(1);
            }
            if bound.min_y >= c.y {
                return Some(3);
            }
        }
        None
    }
}

#[derive(Debug)]
struct QuadItem<T> {
    bound: Bounds,
    payload: T,
    node: usize,
    slot: usize,
}

/// QuadTree keyed by opaque handles, carrying a payload per item.
pub struct QuadTree<T> {
    nodes: Vec<QuadNode>,
    items: SlotMap<QuadHandle, QuadItem<T>>,
}

impl<T> QuadTree<T> {
    /// Create an empty tree covering `bound`.
    pub fn new(bound: Bounds) -> Self {
        let mut nodes = Vec::with_capacity(64);
        nodes.push(QuadNode::new(bound, 0));
        Self {
            nodes,
            items: SlotMap::with_capacity_and_key(1024),
        }
    }

    /// Bounds of the root node.
    #[inline]
    pub fn bound(&self) -> Bounds {
        self.nodes[0].bound
    }

    /// Insert an item and return its handle.
    pub fn insert(&mut self, bound: Bounds, payload: T) -> QuadHandle {
        let handle = self.items.insert(QuadItem {
            bound,
            payload,
            node: 0,
            slot: 0,
        });
        self.place(handle, bound);
        handle
    }

    /// Remove an item, returning its payload.
    ///
    /// A stale handle is a caller bug: it trips a debug assertion and is a
    /// no-op in release builds.
    pub fn remove(&mut self, handle: QuadHandle) -> Option<T> {
        let Some(item) = self.items.remove(handle) else {
            debug_assert!(false, "QuadTree::remove with stale handle {handle:?}");
            return None;
        };
        self.detach(item.node, item.slot);
        Some(item.payload)
    }

    /// Move an item to a new bound, keeping its handle.
    ///
    /// Returns false (and asserts in debug builds) for a stale handle.
    pub fn update(&mut self, handle: QuadHandle, bound: Bounds) -> bool {
        let Some(item) = self.items.get_mut(handle) else {
            debug_assert!(false, "QuadTree::update with stale handle {handle:?}");
            return false;
        };
        let (node, slot) = (item.node, item.slot);
        item.bound = bound;
        self.detach(node, slot);
        self.place(handle, bound);
        true
    }

    /// Visit every item overlapping `query`. Stops and returns true as soon
    /// as `visit` returns true.
    pub fn find<F>(&self, query: &Bounds, mut visit: F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        self.find_in(0, query, &mut visit)
    }

    /// Collect the payloads of all items overlapping `query`.
    pub fn find_all(&self, query: &Bounds) -> Vec<T>
    where
        T: Copy,
    {
        let mut found = Vec::with_capacity(32);
        self.find(query, |&payload| {
            found.push(payload);
            false
        });
        found
    }

    /// Stored bound and payload of an item.
    #[inline]
    pub fn get(&self, handle: QuadHandle) -> Option<(&Bounds, &T)> {
        self.items.get(handle).map(|item| (&item.bound, &item.payload))
    }

    #[inline]
    pub fn contains(&self, handle: QuadHandle) -> bool {
        self.items.contains_key(handle)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of allocated nodes (including empty ones).
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Drop every item and node, starting over with a single root.
    pub fn reset(&mut self, bound: Bounds) {
        self.items.clear();
        self.nodes.clear();
        self.nodes.push(QuadNode::new(bound, 0));
    }

    fn place(&mut self, handle: QuadHandle, bound: Bounds) {
        let mut index = 0;
        while let Some(first_child) = self.nodes[index].children {
            // Boxes hanging over the node's edge stay at the node
            match self.nodes[index].quadrant(&bound) {
                Some(q) if self.nodes[first_child + q].bound.contains(&bound) => index = first_child + q,
                _ => break,
            }
        }

        let node = &mut self.nodes[index];
        let slot = node.items.len();
        node.items.push(handle);
        let should_split =
            node.children.is_none() && node.items.len() > MAX_ITEMS && node.depth < MAX_DEPTH;

        let item = &mut self.items[handle];
        item.node = index;
        item.slot = slot;

        if should_split {
            self.subdivide(index);
        }
    }

    /// Create four children. Items already stored here stay where they are.
    fn subdivide(&mut self, index: usize) {
        let first_child = self.nodes.len();
        let depth = self.nodes[index].depth + 1;
        for quad in self.nodes[index].bound.quadrants() {
            self.nodes.push(QuadNode::new(quad, depth));
        }
        self.nodes[index].children = Some(first_child);
    }

    fn detach(&mut self, node: usize, slot: usize) {
        let items = &mut self.nodes[node].items;
        items.swap_remove(slot);
        if let Some(&moved) = items.get(slot) {
            self.items[moved].slot = slot;
        }
    }

    fn find_in<F>(&self, index: usize, query: &Bounds, visit: &mut F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        let node = &self.nodes[index];
        if let Some(first_child) = node.children {
            for child in first_child..first_child + 4 {
                if query.intersects(&self.nodes[child].bound) && self.find_in(child, query, visit) {
                    return true;
                }
            }
        }
        for &handle in &node.items {
            let item = &self.items[handle];
            if query.intersects(&item.bound) && visit(&item.payload) {
                return true;
            }
        }
        false
    }
}

impl<T> std::fmt::Debug for QuadTree<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuadTree")
            .field("items", &self.items.len())
            .field("nodes", &self.nodes.len())
            .field("bounds", &self.nodes[0].bound)
            .finish()
    }
}
