//! Structural (tree/graph) layer storage.
//!
//! This module is organized into the following submodules:
//! - `edge_storage`: the structural query/mutation trait seam
//! - `static_storage`: immutable pre-built edge storage

pub mod edge_storage;
pub mod static_storage;

pub use edge_storage::{EdgeStorage, ParentLookup};
pub use static_storage::{StaticEdgeStorage, StaticEdgeStorageBuilder};
