//! Structural storage trait seam.
//!
//! The trait covers the full structural surface, topology queries plus the
//! mutation operations, so that immutable implementations can participate in
//! the same seams as editable ones while rejecting every mutation explicitly
//! instead of silently ignoring it.

use crate::error::EngineError;
use crate::model::{Edge, Item};

/// Externally supplied parent resolution for root tests.
///
/// The storage itself only knows its edge list; which item counts as a node's
/// parent is decided by the owning structure layer.
pub type ParentLookup<'a> = &'a dyn Fn(Item) -> Option<Item>;

/// Storage abstraction over a root item and an ordered edge list.
pub trait EdgeStorage {
    // ------------------------------------------------------------------
    // Topology queries
    // ------------------------------------------------------------------

    /// Total number of edges.
    fn edge_count(&self) -> usize;

    /// Edge at the given global index.
    ///
    /// The index arrives as `u64` from the index layer; values past native
    /// range fail with [`EngineError::IndexOverflow`], values past the edge
    /// list with [`EngineError::EdgeOutOfBounds`].
    fn edge_at(&self, index: u64) -> Result<Edge, EngineError>;

    /// Position of the given edge in the list, `None` if absent.
    fn index_of_edge(&self, edge: &Edge) -> Option<usize>;

    /// Whether the node's parent (per the supplied lookup) is the stored root.
    fn is_root(&self, node: Item, parent_of: ParentLookup<'_>) -> bool;

    /// Number of edges touching the node in one direction.
    fn edge_count_directed(&self, node: Item, incoming: bool) -> usize;

    /// Total number of edges touching the node (incoming + outgoing).
    fn edge_count_of(&self, node: Item) -> usize {
        self.edge_count_directed(node, true) + self.edge_count_directed(node, false)
    }

    // ------------------------------------------------------------------
    // Mutation surface (rejected by immutable implementations)
    // ------------------------------------------------------------------

    fn add_edge(&mut self, edge: Edge) -> Result<(), EngineError>;

    fn remove_edge(&mut self, index: u64) -> Result<Edge, EngineError>;

    fn move_edge(&mut self, from: u64, to: u64) -> Result<(), EngineError>;

    /// Re-points one terminal of the edge at `index`.
    fn set_terminal(&mut self, index: u64, item: Item, as_source: bool) -> Result<(), EngineError>;

    /// Returns the storage to its unbuilt state for reuse.
    fn recycle(&mut self) -> Result<(), EngineError>;

    /// Re-initializes a recycled storage with new content.
    fn revive(&mut self, root: Item, edges: Vec<Edge>) -> Result<(), EngineError>;

    // ------------------------------------------------------------------
    // Lifecycle notifications
    // ------------------------------------------------------------------

    /// Called when the storage gets attached to a host structure.
    fn add_notify(&mut self) {}

    /// Called when the storage gets detached from a host structure.
    fn remove_notify(&mut self) {}
}
