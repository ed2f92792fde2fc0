//! Tagged runtime values produced by expression evaluation.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Runtime value of an expression node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Boolean(bool),
    Long(i64),
    Double(f64),
    Text(String),
}

/// Discriminant of a [`Value`], used in type-mismatch reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    Null,
    Boolean,
    Long,
    Double,
    Text,
}

impl Value {
    pub fn type_of(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Long(_) => ValueType::Long,
            Value::Double(_) => ValueType::Double,
            Value::Text(_) => ValueType::Text,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Boolean content, failing on any other type.
    pub fn as_boolean(&self) -> Result<bool, EngineError> {
        match self {
            Value::Boolean(b) => Ok(*b),
            other => Err(EngineError::TypeMismatch {
                expected: ValueType::Boolean,
                actual: other.type_of(),
            }),
        }
    }

    /// Numeric content widened to `f64`, failing on non-numeric types.
    pub fn as_double(&self) -> Result<f64, EngineError> {
        match self {
            Value::Long(v) => Ok(*v as f64),
            Value::Double(v) => Ok(*v),
            other => Err(EngineError::TypeMismatch {
                expected: ValueType::Double,
                actual: other.type_of(),
            }),
        }
    }

    /// Ordering between two values, with numeric coercion between longs and
    /// doubles and lexicographic ordering for text. `None` for incomparable
    /// combinations.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Long(a), Value::Long(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::Long(_) | Value::Double(_), Value::Long(_) | Value::Double(_)) => {
                let a = self.as_double().ok()?;
                let b = other.as_double().ok()?;
                a.partial_cmp(&b)
            }
            _ => None,
        }
    }

    /// Value equality with numeric coercion; `Null` only equals `Null`.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            _ => self.compare(other) == Some(Ordering::Equal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_boolean() {
        assert!(Value::Boolean(true).as_boolean().unwrap());
        assert!(matches!(
            Value::Long(1).as_boolean(),
            Err(EngineError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(
            Value::Long(2).compare(&Value::Double(2.0)),
            Some(Ordering::Equal)
        );
        assert_eq!(
            Value::Double(1.5).compare(&Value::Long(2)),
            Some(Ordering::Less)
        );
        assert!(Value::Long(3).equals(&Value::Double(3.0)));
    }

    #[test]
    fn test_incomparable_combinations() {
        assert_eq!(Value::Text("a".into()).compare(&Value::Long(1)), None);
        assert!(!Value::Text("a".into()).equals(&Value::Long(1)));
    }

    #[test]
    fn test_null_equality() {
        assert!(Value::Null.equals(&Value::Null));
        assert!(!Value::Null.equals(&Value::Long(0)));
    }
}
