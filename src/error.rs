//! Crate-wide error types.

use thiserror::Error;

use crate::eval::value::ValueType;

/// Errors that can occur across the corpus engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown annotation key: {0}")]
    UnknownKey(String),

    #[error("Index {0} exceeds native range")]
    IndexOverflow(u64),

    #[error("Edge index out of bounds: {index} (edge count {count})")]
    EdgeOutOfBounds { index: u64, count: usize },

    #[error("Unsupported operation on immutable storage: {0}")]
    UnsupportedOperation(&'static str),

    #[error("Illegal state: {0}")]
    IllegalState(String),

    #[error("Foreign thread access: resource is pinned to {owner}")]
    ForeignThread { owner: String },

    #[error("Type mismatch: expected {expected:?}, got {actual:?}")]
    TypeMismatch {
        expected: ValueType,
        actual: ValueType,
    },
}
