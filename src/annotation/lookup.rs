//! String-key to dense-slot-index mapping for fixed-key storages.

use crate::error::EngineError;

/// Maps string annotation keys to dense slot indices in `[0, key_count)`.
///
/// Immutable after construction; safe for concurrent reads.
pub trait IndexLookup {
    /// Number of keys.
    fn key_count(&self) -> usize;

    /// Key stored at the given slot index, `None` if out of bounds.
    fn key_at(&self, index: usize) -> Option<&str>;

    /// Slot index for the given key, `None` if the key is absent.
    fn index_of(&self, key: &str) -> Option<usize>;
}

/// [`IndexLookup`] over a sorted array of unique keys, resolved via binary
/// search.
#[derive(Debug, Clone)]
pub struct BinarySearchLookup {
    keys: Vec<String>,
}

impl BinarySearchLookup {
    /// Builds a lookup over the given keys.
    ///
    /// The keys must already be sorted ascending and unique; violating either
    /// fails with [`EngineError::InvalidInput`].
    pub fn new(keys: Vec<String>) -> Result<Self, EngineError> {
        for pair in keys.windows(2) {
            if pair[0] >= pair[1] {
                return Err(EngineError::InvalidInput(format!(
                    "keys must be sorted and unique, found '{}' before '{}'",
                    pair[0], pair[1]
                )));
            }
        }
        Ok(Self { keys })
    }

    /// Convenience constructor sorting and deduplicating the input first.
    pub fn from_unsorted(mut keys: Vec<String>) -> Self {
        keys.sort_unstable();
        keys.dedup();
        Self { keys }
    }
}

impl IndexLookup for BinarySearchLookup {
    #[inline]
    fn key_count(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    fn key_at(&self, index: usize) -> Option<&str> {
        self.keys.get(index).map(|k| k.as_str())
    }

    #[inline]
    fn index_of(&self, key: &str) -> Option<usize> {
        self.keys.binary_search_by(|k| k.as_str().cmp(key)).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(keys: &[&str]) -> BinarySearchLookup {
        BinarySearchLookup::new(keys.iter().map(|k| k.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_index_of_hits_and_misses() {
        let l = lookup(&["form", "lemma", "pos"]);
        assert_eq!(l.index_of("form"), Some(0));
        assert_eq!(l.index_of("lemma"), Some(1));
        assert_eq!(l.index_of("pos"), Some(2));
        assert_eq!(l.index_of("head"), None);
        assert_eq!(l.index_of(""), None);
    }

    #[test]
    fn test_key_accessors() {
        let l = lookup(&["lemma", "pos"]);
        assert_eq!(l.key_count(), 2);
        assert_eq!(l.key_at(0), Some("lemma"));
        assert_eq!(l.key_at(1), Some("pos"));
        assert_eq!(l.key_at(2), None);
    }

    #[test]
    fn test_construction_rejects_unsorted_or_duplicate() {
        let unsorted = BinarySearchLookup::new(vec!["pos".into(), "lemma".into()]);
        assert!(unsorted.is_err());

        let duplicate = BinarySearchLookup::new(vec!["pos".into(), "pos".into()]);
        assert!(duplicate.is_err());
    }

    #[test]
    fn test_from_unsorted_normalizes() {
        let l = BinarySearchLookup::from_unsorted(vec![
            "pos".into(),
            "lemma".into(),
            "pos".into(),
        ]);
        assert_eq!(l.key_count(), 2);
        assert_eq!(l.index_of("lemma"), Some(0));
        assert_eq!(l.index_of("pos"), Some(1));
    }

    #[test]
    fn test_empty_lookup() {
        let l = BinarySearchLookup::new(vec![]).unwrap();
        assert_eq!(l.key_count(), 0);
        assert_eq!(l.index_of("anything"), None);
    }
}
