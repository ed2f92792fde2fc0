//! Assignment operation node.

use serde::{Deserialize, Serialize};

use crate::eval::expression::Expression;

/// Assignable target: a named slot in an evaluation context.
///
/// Slots are interned per duplication context, so duplicated expression trees
/// never share per-evaluation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableRef {
    pub name: String,
    pub slot: usize,
}

/// Evaluates a source expression, assigns the result into the target slot and
/// yields whether the assignment counts as successful.
///
/// Success is `optional || value != Null`; the value is stored either way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentOperation {
    pub source: Box<Expression>,
    pub target: VariableRef,
    pub optional: bool,
}

impl AssignmentOperation {
    pub fn new(source: Expression, target: VariableRef, optional: bool) -> Self {
        Self {
            source: Box::new(source),
            target,
            optional,
        }
    }
}
