//! Spatial indexing utilities.
//!
//! Region QuadTree with handle-based O(1) removal, matching the search
//! semantics of the MultiOgar QuadNode.

mod quadtree;

pub use quadtree::{MAX_DEPTH, MAX_ITEMS, QuadHandle, QuadTree};
