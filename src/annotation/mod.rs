//! Annotation storage layer.
//!
//! This module is organized into the following submodules:
//! - `lookup`: string key to dense slot index mapping
//! - `fixed_keys`: fixed-key long-valued per-item annotation storage

pub mod fixed_keys;
pub mod lookup;

pub use fixed_keys::FixedKeysLongStorage;
pub use lookup::{BinarySearchLookup, IndexLookup};
