//! Index-set utilities.
//!
//! This module is organized into the following submodules:
//! - `range`: mutable min/max interval tracker with intersection semantics
//! - `heap_merge`: k-way merge of sorted index streams

pub mod heap_merge;
pub mod range;

pub use heap_merge::HeapMerge;
pub use range::IndexRange;
