//! Mutable min/max interval tracker used by index-set consumers.

use serde::Serialize;

use crate::model::UNSET_LONG;

/// Tracks the smallest and largest index seen so far.
///
/// Both bounds are [`UNSET_LONG`] while no value has been recorded; once set,
/// `min <= max` always holds. Pure value semantics, no error states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexRange {
    min: i64,
    max: i64,
}

impl IndexRange {
    /// Creates an empty (unset) range.
    pub fn new() -> Self {
        Self {
            min: UNSET_LONG,
            max: UNSET_LONG,
        }
    }

    /// Creates a range already spanning `[min, max]`.
    pub fn of(min: i64, max: i64) -> Self {
        debug_assert!(min >= 0 && min <= max);
        Self { min, max }
    }

    /// Whether no value has been recorded yet.
    pub fn is_unset(&self) -> bool {
        self.min == UNSET_LONG
    }

    /// Lower bound, [`UNSET_LONG`] while unset.
    pub fn min(&self) -> i64 {
        self.min
    }

    /// Upper bound, [`UNSET_LONG`] while unset.
    pub fn max(&self) -> i64 {
        self.max
    }

    /// Extends the range to include `value`; sets both bounds on first call.
    pub fn update(&mut self, value: i64) {
        debug_assert!(value >= 0);
        if self.is_unset() {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
    }

    /// Overwrites both bounds.
    pub fn set(&mut self, min: i64, max: i64) {
        debug_assert!(min >= 0 && min <= max);
        self.min = min;
        self.max = max;
    }

    /// Whether the range is set and contains `value`.
    pub fn contains(&self, value: i64) -> bool {
        !self.is_unset() && self.min <= value && value <= self.max
    }

    /// Narrows this range to its intersection with `other`.
    ///
    /// A no-op when either side is unset; resets to unset when the two ranges
    /// are disjoint.
    pub fn limit(&mut self, other: &IndexRange) {
        if self.is_unset() || other.is_unset() {
            return;
        }
        if self.max < other.min || self.min > other.max {
            self.reset();
            return;
        }
        self.min = self.min.max(other.min);
        self.max = self.max.min(other.max);
    }

    /// Resets both bounds to unset.
    pub fn reset(&mut self) {
        self.min = UNSET_LONG;
        self.max = UNSET_LONG;
    }
}

impl Default for IndexRange {
    fn default() -> Self {
        Self::new()
    }
}
