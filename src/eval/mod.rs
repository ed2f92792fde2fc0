//! Query expression evaluation core.
//!
//! This module is organized into the following submodules:
//! - `value`: tagged runtime values and their types
//! - `matcher`: string/regex matching for text values and keys
//! - `expression`: the expression tree, evaluation, optimization, duplication
//! - `assignment`: the assignment operation node

pub mod assignment;
pub mod expression;
pub mod matcher;
pub mod value;

pub use assignment::{AssignmentOperation, VariableRef};
pub use expression::{
    ComparisonOp, DuplicationContext, EvaluationContext, Expression, LogicalOp,
};
pub use matcher::Matcher;
pub use value::{Value, ValueType};
