//! K-way merge of sorted ascending index streams.
//!
//! Per-layer and per-segment index sets arrive as individually sorted streams;
//! the merge combines them into one globally ordered stream without
//! materializing the inputs. A min-heap keyed by each source's current head
//! value keeps exactly one live entry per non-exhausted source.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Heap entry: a source's current head value plus the source's ordinal.
///
/// Ordered by value first, source ordinal second, so ties across sources are
/// broken deterministically and no entry is ever dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct HeapEntry {
    value: u64,
    source: usize,
}

/// Lazily merges N sorted ascending `u64` streams into one sorted stream.
///
/// Duplicates across sources are preserved (no dedup). Each source must be
/// individually sorted ascending; that is a caller contract and is not
/// verified at runtime. Single-pass, not restartable.
///
/// Any number of sources is accepted, including zero (immediately exhausted)
/// and one (pass-through).
#[derive(Debug)]
pub struct HeapMerge<I: Iterator<Item = u64>> {
    sources: Vec<I>,
    heap: BinaryHeap<Reverse<HeapEntry>>,
}

impl<I: Iterator<Item = u64>> HeapMerge<I> {
    /// Builds a merge over the given sources, priming the heap with each
    /// source's first value.
    pub fn new(sources: impl IntoIterator<Item = I>) -> Self {
        let mut sources: Vec<I> = sources.into_iter().collect();
        let mut heap = BinaryHeap::with_capacity(sources.len());
        for (ordinal, source) in sources.iter_mut().enumerate() {
            if let Some(value) = source.next() {
                heap.push(Reverse(HeapEntry {
                    value,
                    source: ordinal,
                }));
            }
        }
        log::trace!(
            "heap merge over {} sources, {} initially non-empty",
            sources.len(),
            heap.len()
        );
        Self { sources, heap }
    }

    /// Whether another value is available.
    pub fn has_next(&self) -> bool {
        !self.heap.is_empty()
    }
}

impl<I: Iterator<Item = u64>> Iterator for HeapMerge<I> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let Reverse(entry) = self.heap.pop()?;
        // Refill from the source that just yielded the minimum.
        if let Some(value) = self.sources[entry.source].next() {
            debug_assert!(value >= entry.value, "source must be sorted ascending");
            self.heap.push(Reverse(HeapEntry {
                value,
                source: entry.source,
            }));
        }
        Some(entry.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.heap.len(), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merge(inputs: Vec<Vec<u64>>) -> Vec<u64> {
        HeapMerge::new(inputs.into_iter().map(|v| v.into_iter())).collect()
    }

    #[test]
    fn test_three_way_merge_with_duplicates() {
        let out = merge(vec![vec![1, 4, 9], vec![2, 4, 6], vec![3, 3, 8]]);
        assert_eq!(out, vec![1, 2, 3, 3, 4, 4, 6, 8, 9]);
    }

    #[test]
    fn test_output_is_non_decreasing_and_cardinality_preserved() {
        let inputs = vec![
            vec![0, 5, 5, 17, 120],
            vec![],
            vec![2, 2, 2],
            vec![1, 3, 5, 7, 9, 11],
        ];
        let expected_len: usize = inputs.iter().map(|v| v.len()).sum();
        let out = merge(inputs.clone());

        assert_eq!(out.len(), expected_len);
        assert!(out.windows(2).all(|w| w[0] <= w[1]));

        let mut flat: Vec<u64> = inputs.into_iter().flatten().collect();
        flat.sort_unstable();
        assert_eq!(out, flat);
    }

    #[test]
    fn test_single_source_passes_through() {
        let out = merge(vec![vec![2, 3, 5, 7]]);
        assert_eq!(out, vec![2, 3, 5, 7]);
    }

    #[test]
    fn test_no_sources_is_exhausted() {
        let mut m: HeapMerge<std::vec::IntoIter<u64>> = HeapMerge::new(Vec::new());
        assert!(!m.has_next());
        assert_eq!(m.next(), None);
    }

    #[test]
    fn test_exhaustion_after_drain() {
        let mut m = HeapMerge::new(vec![vec![1u64].into_iter(), vec![2u64].into_iter()]);
        assert!(m.has_next());
        assert_eq!(m.next(), Some(1));
        assert_eq!(m.next(), Some(2));
        assert!(!m.has_next());
        assert_eq!(m.next(), None);
        // Stays exhausted.
        assert_eq!(m.next(), None);
    }

    #[test]
    fn test_ties_across_sources_are_stable() {
        // Both sources sit at the same value; the lower source ordinal wins,
        // and every occurrence survives.
        let out = merge(vec![vec![4, 4], vec![4], vec![4, 4, 4]]);
        assert_eq!(out, vec![4, 4, 4, 4, 4, 4]);
    }
}
