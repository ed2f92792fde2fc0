//! Fixed-key long-valued annotation storage.
//!
//! One buffer of `i64` values per item, index-aligned with the key lookup.
//! An item without a buffer is semantically "all no-entry values"; buffers are
//! allocated lazily on first write, never shared across items.

use std::collections::HashMap;
use std::sync::Arc;

use crate::annotation::lookup::IndexLookup;
use crate::error::EngineError;
use crate::model::{AnnotationManifest, Item, UNSET_LONG};

/// Per-item annotation storage with a fixed key set.
///
/// Reads are lock-free over shared references; writes take `&mut self`.
/// Coordinating concurrent writes to the same item is the caller's
/// responsibility (one item per thread at a time).
#[derive(Clone)]
pub struct FixedKeysLongStorage {
    lookup: Arc<dyn IndexLookup + Send + Sync>,
    no_entry_values: Vec<i64>,
    buffers: HashMap<Item, Vec<i64>>,
}

impl FixedKeysLongStorage {
    /// Builds a storage over the given key lookup.
    ///
    /// No-entry sentinels are derived once from the manifest, falling back to
    /// [`UNSET_LONG`] for keys the manifest does not cover.
    pub fn new(
        lookup: Arc<dyn IndexLookup + Send + Sync>,
        manifest: Option<&dyn AnnotationManifest>,
    ) -> Self {
        let no_entry_values = (0..lookup.key_count())
            .map(|slot| {
                let key = lookup.key_at(slot).unwrap_or_default();
                manifest
                    .and_then(|m| m.no_entry_value(key))
                    .unwrap_or(UNSET_LONG)
            })
            .collect();
        Self {
            lookup,
            no_entry_values,
            buffers: HashMap::new(),
        }
    }

    /// Number of keys this storage covers.
    pub fn key_count(&self) -> usize {
        self.lookup.key_count()
    }

    /// The no-entry sentinel for the given key.
    pub fn no_entry_value(&self, key: &str) -> Result<i64, EngineError> {
        let slot = self.slot_of(key)?;
        Ok(self.no_entry_values[slot])
    }

    fn slot_of(&self, key: &str) -> Result<usize, EngineError> {
        self.lookup
            .index_of(key)
            .ok_or_else(|| EngineError::UnknownKey(key.to_string()))
    }

    /// Reads the long value stored for `(item, key)`.
    ///
    /// Items without a buffer report the key's no-entry sentinel.
    pub fn get_long(&self, item: Item, key: &str) -> Result<i64, EngineError> {
        let slot = self.slot_of(key)?;
        let buffer = self
            .buffers
            .get(&item)
            .map(|b| b.as_slice())
            .unwrap_or(&self.no_entry_values);
        Ok(buffer[slot])
    }

    /// Writes a long value for `(item, key)`, allocating the item's buffer on
    /// first write.
    pub fn set_long(&mut self, item: Item, key: &str, value: i64) -> Result<(), EngineError> {
        let slot = self.slot_of(key)?;
        if !self.buffers.contains_key(&item) {
            log::trace!("allocating annotation buffer for item {}", item.id);
        }
        let defaults = &self.no_entry_values;
        let buffer = self.buffers.entry(item).or_insert_with(|| defaults.clone());
        buffer[slot] = value;
        Ok(())
    }

    /// Narrowing read: truncating cast of the stored long.
    pub fn get_int(&self, item: Item, key: &str) -> Result<i32, EngineError> {
        Ok(self.get_long(item, key)? as i32)
    }

    /// Widening read as `f32`.
    pub fn get_float(&self, item: Item, key: &str) -> Result<f32, EngineError> {
        Ok(self.get_long(item, key)? as f32)
    }

    /// Widening read as `f64`.
    pub fn get_double(&self, item: Item, key: &str) -> Result<f64, EngineError> {
        Ok(self.get_long(item, key)? as f64)
    }

    pub fn set_int(&mut self, item: Item, key: &str, value: i32) -> Result<(), EngineError> {
        self.set_long(item, key, i64::from(value))
    }

    /// Stores the float truncated toward zero.
    pub fn set_float(&mut self, item: Item, key: &str, value: f32) -> Result<(), EngineError> {
        self.set_long(item, key, value as i64)
    }

    /// Stores the double truncated toward zero.
    pub fn set_double(&mut self, item: Item, key: &str, value: f64) -> Result<(), EngineError> {
        self.set_long(item, key, value as i64)
    }

    /// Whether the stored value for `(item, key)` differs from the sentinel.
    pub fn is_set(&self, item: Item, key: &str) -> Result<bool, EngineError> {
        let slot = self.slot_of(key)?;
        Ok(self
            .buffers
            .get(&item)
            .map(|b| b[slot] != self.no_entry_values[slot])
            .unwrap_or(false))
    }

    /// Invokes `action` with every key whose stored value differs from its
    /// no-entry sentinel.
    ///
    /// Returns `true` iff at least one key was reported; items without a
    /// buffer report nothing.
    pub fn collect_keys(&self, item: Item, mut action: impl FnMut(&str)) -> bool {
        let Some(buffer) = self.buffers.get(&item) else {
            return false;
        };
        let mut reported = false;
        for slot in 0..buffer.len() {
            if buffer[slot] != self.no_entry_values[slot] {
                if let Some(key) = self.lookup.key_at(slot) {
                    action(key);
                    reported = true;
                }
            }
        }
        reported
    }
}
