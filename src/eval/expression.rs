//! Expression tree: evaluation, constant folding and duplication.
//!
//! Expressions are evaluated once per candidate. Most node kinds are pure;
//! assignment nodes mutate a slot in the evaluation context. Trees are value
//! objects: optimization consumes and rebuilds an equivalent cheaper tree,
//! duplication produces an independent deep copy bound to a fresh slot
//! numbering so concurrent evaluation contexts never share state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::annotation::fixed_keys::FixedKeysLongStorage;
use crate::error::EngineError;
use crate::eval::assignment::{AssignmentOperation, VariableRef};
use crate::eval::matcher::Matcher;
use crate::eval::value::Value;
use crate::model::Container;

/// Binary comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// N-ary boolean connectives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOp {
    And,
    Or,
}

/// A query expression node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expression {
    /// Constant value.
    Literal(Value),
    /// Reads the candidate's primary-item annotation for `key`; yields `Null`
    /// when no explicit value is stored.
    Annotation { key: String },
    /// Reads a previously assigned slot.
    Variable(VariableRef),
    Comparison {
        op: ComparisonOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Logical {
        op: LogicalOp,
        operands: Vec<Expression>,
    },
    Not(Box<Expression>),
    /// Matches the textual content of the source value; `Null` never matches.
    TextMatch {
        source: Box<Expression>,
        matcher: Matcher,
    },
    Assignment(AssignmentOperation),
}

impl Expression {
    pub fn literal(value: Value) -> Self {
        Expression::Literal(value)
    }

    pub fn annotation(key: impl Into<String>) -> Self {
        Expression::Annotation { key: key.into() }
    }

    pub fn comparison(op: ComparisonOp, left: Expression, right: Expression) -> Self {
        Expression::Comparison {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn and(operands: Vec<Expression>) -> Self {
        Expression::Logical {
            op: LogicalOp::And,
            operands,
        }
    }

    pub fn or(operands: Vec<Expression>) -> Self {
        Expression::Logical {
            op: LogicalOp::Or,
            operands,
        }
    }

    /// Evaluates this node against one candidate.
    pub fn evaluate(
        &self,
        storage: &FixedKeysLongStorage,
        candidate: &Container,
        env: &mut EvaluationContext,
    ) -> Result<Value, EngineError> {
        match self {
            Expression::Literal(value) => Ok(value.clone()),
            Expression::Annotation { key } => {
                let Some(item) = candidate.primary_item() else {
                    return Ok(Value::Null);
                };
                let stored = storage.get_long(item, key)?;
                if stored == storage.no_entry_value(key)? {
                    Ok(Value::Null)
                } else {
                    Ok(Value::Long(stored))
                }
            }
            Expression::Variable(var) => Ok(env.get_slot(var.slot).clone()),
            Expression::Comparison { op, left, right } => {
                let lhs = left.evaluate(storage, candidate, env)?;
                let rhs = right.evaluate(storage, candidate, env)?;
                eval_comparison(*op, &lhs, &rhs)
            }
            Expression::Logical { op, operands } => {
                // Short-circuits left to right.
                for operand in operands {
                    let hit = operand.evaluate(storage, candidate, env)?.as_boolean()?;
                    match op {
                        LogicalOp::And if !hit => return Ok(Value::Boolean(false)),
                        LogicalOp::Or if hit => return Ok(Value::Boolean(true)),
                        _ => {}
                    }
                }
                Ok(Value::Boolean(matches!(op, LogicalOp::And)))
            }
            Expression::Not(inner) => {
                let hit = inner.evaluate(storage, candidate, env)?.as_boolean()?;
                Ok(Value::Boolean(!hit))
            }
            Expression::TextMatch { source, matcher } => {
                match source.evaluate(storage, candidate, env)? {
                    Value::Null => Ok(Value::Boolean(false)),
                    Value::Text(text) => Ok(Value::Boolean(matcher.matches(&text))),
                    other => Err(EngineError::TypeMismatch {
                        expected: crate::eval::value::ValueType::Text,
                        actual: other.type_of(),
                    }),
                }
            }
            Expression::Assignment(assignment) => {
                let value = assignment.source.evaluate(storage, candidate, env)?;
                let success = assignment.optional || !value.is_null();
                env.set_slot(assignment.target.slot, value);
                Ok(Value::Boolean(success))
            }
        }
    }

    /// Whether this node is provably constant (no candidate or slot access).
    pub fn is_constant(&self) -> bool {
        match self {
            Expression::Literal(_) => true,
            Expression::Annotation { .. } | Expression::Variable(_) => false,
            Expression::Comparison { left, right, .. } => {
                left.is_constant() && right.is_constant()
            }
            Expression::Logical { operands, .. } => operands.iter().all(|o| o.is_constant()),
            Expression::Not(inner) => inner.is_constant(),
            Expression::TextMatch { source, .. } => source.is_constant(),
            // The assignment's side effect keeps it non-constant even for a
            // constant source; folding happens in `optimize`.
            Expression::Assignment(_) => false,
        }
    }

    /// Rewrites this tree into an equivalent, cheaper one.
    ///
    /// Folds constant subtrees bottom-up. An assignment whose optimized
    /// source is constant `Null` can never contribute a value, so the whole
    /// node collapses to its success flag: `Literal(Boolean(optional))`.
    pub fn optimize(self) -> Expression {
        match self {
            Expression::Literal(_) | Expression::Annotation { .. } | Expression::Variable(_) => {
                self
            }
            Expression::Comparison { op, left, right } => {
                let left = left.optimize();
                let right = right.optimize();
                if let (Expression::Literal(a), Expression::Literal(b)) = (&left, &right) {
                    if let Ok(folded) = eval_comparison(op, a, b) {
                        log::trace!("folded constant comparison to {folded:?}");
                        return Expression::Literal(folded);
                    }
                }
                Expression::comparison(op, left, right)
            }
            Expression::Logical { op, operands } => {
                let operands: Vec<Expression> =
                    operands.into_iter().map(Expression::optimize).collect();
                let folded: Option<Vec<bool>> = operands
                    .iter()
                    .map(|o| match o {
                        Expression::Literal(v) => v.as_boolean().ok(),
                        _ => None,
                    })
                    .collect();
                if let Some(flags) = folded {
                    let result = match op {
                        LogicalOp::And => flags.into_iter().all(|f| f),
                        LogicalOp::Or => flags.into_iter().any(|f| f),
                    };
                    return Expression::Literal(Value::Boolean(result));
                }
                Expression::Logical { op, operands }
            }
            Expression::Not(inner) => {
                let inner = inner.optimize();
                if let Expression::Literal(value) = &inner {
                    if let Ok(flag) = value.as_boolean() {
                        return Expression::Literal(Value::Boolean(!flag));
                    }
                }
                Expression::Not(Box::new(inner))
            }
            Expression::TextMatch { source, matcher } => {
                let source = source.optimize();
                match &source {
                    Expression::Literal(Value::Null) => {
                        Expression::Literal(Value::Boolean(false))
                    }
                    Expression::Literal(Value::Text(text)) => {
                        Expression::Literal(Value::Boolean(matcher.matches(text)))
                    }
                    _ => Expression::TextMatch {
                        source: Box::new(source),
                        matcher,
                    },
                }
            }
            Expression::Assignment(assignment) => {
                let source = assignment.source.optimize();
                if matches!(source, Expression::Literal(Value::Null)) {
                    // A permanently-null assignment can never do useful work;
                    // only its success flag remains observable.
                    return Expression::Literal(Value::Boolean(assignment.optional));
                }
                Expression::Assignment(AssignmentOperation {
                    source: Box::new(source),
                    target: assignment.target,
                    optional: assignment.optional,
                })
            }
        }
    }

    /// Deep-copies this tree into a fresh duplication context.
    ///
    /// Variable targets are re-interned through `ctx`, giving the copy its own
    /// slot numbering for use in a separate (possibly concurrent) evaluation
    /// context.
    pub fn duplicate(&self, ctx: &mut DuplicationContext) -> Expression {
        match self {
            Expression::Literal(value) => Expression::Literal(value.clone()),
            Expression::Annotation { key } => Expression::Annotation { key: key.clone() },
            Expression::Variable(var) => Expression::Variable(ctx.variable(&var.name)),
            Expression::Comparison { op, left, right } => Expression::Comparison {
                op: *op,
                left: Box::new(left.duplicate(ctx)),
                right: Box::new(right.duplicate(ctx)),
            },
            Expression::Logical { op, operands } => Expression::Logical {
                op: *op,
                operands: operands.iter().map(|o| o.duplicate(ctx)).collect(),
            },
            Expression::Not(inner) => Expression::Not(Box::new(inner.duplicate(ctx))),
            Expression::TextMatch { source, matcher } => Expression::TextMatch {
                source: Box::new(source.duplicate(ctx)),
                matcher: matcher.clone(),
            },
            Expression::Assignment(assignment) => {
                Expression::Assignment(AssignmentOperation {
                    source: Box::new(assignment.source.duplicate(ctx)),
                    target: ctx.variable(&assignment.target.name),
                    optional: assignment.optional,
                })
            }
        }
    }
}

/// Interns variable names into dense slot indices for one expression copy.
#[derive(Debug, Default)]
pub struct DuplicationContext {
    names: Vec<String>,
    slots: HashMap<String, usize>,
}

impl DuplicationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot-bound reference for the given variable name, interning it on
    /// first use.
    pub fn variable(&mut self, name: &str) -> VariableRef {
        let slot = match self.slots.get(name) {
            Some(&slot) => slot,
            None => {
                let slot = self.names.len();
                self.names.push(name.to_string());
                self.slots.insert(name.to_string(), slot);
                slot
            }
        };
        VariableRef {
            name: name.to_string(),
            slot,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.names.len()
    }
}

/// Per-evaluation mutable state: the assignable slots.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    slots: Vec<Value>,
}

impl EvaluationContext {
    /// Context sized for the slots interned in `ctx`, all initially `Null`.
    pub fn for_duplication(ctx: &DuplicationContext) -> Self {
        Self {
            slots: vec![Value::Null; ctx.slot_count()],
        }
    }

    pub fn with_slot_count(count: usize) -> Self {
        Self {
            slots: vec![Value::Null; count],
        }
    }

    pub fn get_slot(&self, slot: usize) -> &Value {
        self.slots.get(slot).unwrap_or(&Value::Null)
    }

    pub fn set_slot(&mut self, slot: usize, value: Value) {
        if slot < self.slots.len() {
            self.slots[slot] = value;
        }
    }

    /// Clears all slots between candidates.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            *slot = Value::Null;
        }
    }
}

fn eval_comparison(op: ComparisonOp, lhs: &Value, rhs: &Value) -> Result<Value, EngineError> {
    use std::cmp::Ordering;

    let result = match op {
        ComparisonOp::Eq => lhs.equals(rhs),
        ComparisonOp::Ne => !lhs.equals(rhs),
        _ => {
            let ordering = lhs
                .compare(rhs)
                .ok_or_else(|| EngineError::TypeMismatch {
                    expected: lhs.type_of(),
                    actual: rhs.type_of(),
                })?;
            match op {
                ComparisonOp::Lt => ordering == Ordering::Less,
                ComparisonOp::Le => ordering != Ordering::Greater,
                ComparisonOp::Gt => ordering == Ordering::Greater,
                ComparisonOp::Ge => ordering != Ordering::Less,
                ComparisonOp::Eq | ComparisonOp::Ne => unreachable!(),
            }
        }
    };
    Ok(Value::Boolean(result))
}
