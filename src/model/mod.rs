//! Core corpus data model primitives.
//!
//! This module is organized into the following submodules:
//! - `layers`: lazily resolved layer-type handles
//!
//! The types here are deliberately small: items and edges carry identity only,
//! while all per-item values live in the annotation storages and all topology
//! lives in the structure storages.

pub mod layers;

use serde::{Deserialize, Serialize};

pub use layers::{LayerType, LayerTypeCell};

/// Sentinel for "no value stored" in long-valued annotation slots.
///
/// Corpus indices are non-negative, so -1 is free to act as the unset marker
/// for both annotation values and index ranges.
pub const UNSET_LONG: i64 = -1;

/// Atomic addressable unit in the corpus data model (e.g. a token).
///
/// Identity-based equality: two items are the same iff their ids match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
}

impl Item {
    pub fn new(id: u64) -> Self {
        Self { id }
    }
}

/// Directed relation between two items in a structural layer.
///
/// Edges carry no payload of their own; relation labels are regular
/// annotations attached through an annotation storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: Item,
    pub target: Item,
}

impl Edge {
    pub fn new(source: Item, target: Item) -> Self {
        Self { source, target }
    }
}

/// A candidate unit evaluated by a query filter.
///
/// Containers are addressed by a global index (the values flowing out of the
/// merged index streams) and group the items a filter expression may inspect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub index: u64,
    pub items: Vec<Item>,
}

impl Container {
    pub fn new(index: u64, items: Vec<Item>) -> Self {
        Self { index, items }
    }

    /// The item annotation reads default to when no explicit target is given.
    pub fn primary_item(&self) -> Option<Item> {
        self.items.first().copied()
    }
}

/// Supplies per-key "no entry" sentinel values for an annotation layer.
///
/// Owned by the manifest/configuration subsystem; storages only consume it
/// once at construction time.
pub trait AnnotationManifest {
    /// Sentinel for the given key, or `None` to fall back to [`UNSET_LONG`].
    fn no_entry_value(&self, key: &str) -> Option<i64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_identity() {
        let a = Item::new(1);
        let b = Item::new(1);
        let c = Item::new(2);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_container_primary_item() {
        let c = Container::new(7, vec![Item::new(3), Item::new(4)]);
        assert_eq!(c.primary_item(), Some(Item::new(3)));

        let empty = Container::new(8, vec![]);
        assert_eq!(empty.primary_item(), None);
    }
}
