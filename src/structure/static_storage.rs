//! Immutable pre-built edge storage.
//!
//! Built once from a finalized edge list and queried intensively afterwards.
//! Per-node degree counts are precomputed at build time so direction-aware
//! edge counting is a table lookup instead of a list scan.

use std::collections::HashMap;

use crate::error::EngineError;
use crate::model::{Edge, Item};
use crate::structure::edge_storage::{EdgeStorage, ParentLookup};

/// Per-node degree entry precomputed at construction.
#[derive(Debug, Clone, Copy, Default)]
struct Degree {
    incoming: usize,
    outgoing: usize,
}

/// Immutable storage over a root item and an ordered edge list.
///
/// Every structural mutation fails with
/// [`EngineError::UnsupportedOperation`]; the edge list never changes after
/// construction, which makes concurrent reads safe without locking.
#[derive(Debug, Clone)]
pub struct StaticEdgeStorage {
    root: Item,
    edges: Vec<Edge>,
    degrees: HashMap<Item, Degree>,
}

impl StaticEdgeStorage {
    /// Starts a builder; see [`StaticEdgeStorageBuilder`].
    pub fn builder() -> StaticEdgeStorageBuilder {
        StaticEdgeStorageBuilder::default()
    }

    /// Builds directly from finalized parts.
    pub fn new(root: Item, edges: Vec<Edge>) -> Self {
        let mut degrees: HashMap<Item, Degree> = HashMap::new();
        for edge in &edges {
            degrees.entry(edge.source).or_default().outgoing += 1;
            degrees.entry(edge.target).or_default().incoming += 1;
        }
        log::debug!(
            "static edge storage built: {} edges over {} distinct terminals",
            edges.len(),
            degrees.len()
        );
        Self {
            root,
            edges,
            degrees,
        }
    }

    /// The root item this structure hangs off.
    ///
    /// The root is externally owned; dropping the storage never releases it.
    pub fn root(&self) -> Item {
        self.root
    }
}

impl EdgeStorage for StaticEdgeStorage {
    fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn edge_at(&self, index: u64) -> Result<Edge, EngineError> {
        let native = usize::try_from(index).map_err(|_| EngineError::IndexOverflow(index))?;
        self.edges
            .get(native)
            .copied()
            .ok_or(EngineError::EdgeOutOfBounds {
                index,
                count: self.edges.len(),
            })
    }

    fn index_of_edge(&self, edge: &Edge) -> Option<usize> {
        self.edges.iter().position(|e| e == edge)
    }

    fn is_root(&self, node: Item, parent_of: ParentLookup<'_>) -> bool {
        parent_of(node) == Some(self.root)
    }

    fn edge_count_directed(&self, node: Item, incoming: bool) -> usize {
        let degree = self.degrees.get(&node).copied().unwrap_or_default();
        if incoming {
            degree.incoming
        } else {
            degree.outgoing
        }
    }

    fn add_edge(&mut self, _edge: Edge) -> Result<(), EngineError> {
        Err(EngineError::UnsupportedOperation("add_edge"))
    }

    fn remove_edge(&mut self, _index: u64) -> Result<Edge, EngineError> {
        Err(EngineError::UnsupportedOperation("remove_edge"))
    }

    fn move_edge(&mut self, _from: u64, _to: u64) -> Result<(), EngineError> {
        Err(EngineError::UnsupportedOperation("move_edge"))
    }

    fn set_terminal(
        &mut self,
        _index: u64,
        _item: Item,
        _as_source: bool,
    ) -> Result<(), EngineError> {
        Err(EngineError::UnsupportedOperation("set_terminal"))
    }

    fn recycle(&mut self) -> Result<(), EngineError> {
        Err(EngineError::UnsupportedOperation("recycle"))
    }

    fn revive(&mut self, _root: Item, _edges: Vec<Edge>) -> Result<(), EngineError> {
        Err(EngineError::UnsupportedOperation("revive"))
    }

    // No dynamic attach/detach state to track.
    fn add_notify(&mut self) {}
    fn remove_notify(&mut self) {}
}

/// Builder validating the parts of a [`StaticEdgeStorage`].
///
/// Construction fails if the root or the edge list was never supplied; a
/// partially configured builder never yields a storage.
#[derive(Debug, Default)]
pub struct StaticEdgeStorageBuilder {
    root: Option<Item>,
    edges: Option<Vec<Edge>>,
}

impl StaticEdgeStorageBuilder {
    pub fn root(mut self, root: Item) -> Self {
        self.root = Some(root);
        self
    }

    pub fn edges(mut self, edges: Vec<Edge>) -> Self {
        self.edges = Some(edges);
        self
    }

    pub fn build(self) -> Result<StaticEdgeStorage, EngineError> {
        let root = self
            .root
            .ok_or_else(|| EngineError::InvalidInput("missing root item".to_string()))?;
        let edges = self
            .edges
            .ok_or_else(|| EngineError::InvalidInput("missing edge list".to_string()))?;
        Ok(StaticEdgeStorage::new(root, edges))
    }
}
