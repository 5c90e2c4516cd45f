// crates/gateflag-core/src/expression.rs
// ============================================================================
// Module: Gateflag Expression
// Description: A small, pure boolean expression tree evaluated against an
//              actor's property map.
// Purpose: Back the expression gate (4.2.6) and the rule-based branch of the
//          admin surface with a data structure that has no side effects and
//          no dependency on storage.
// Dependencies: crate::values::Type, serde_json::Value
// ============================================================================

//! ## Overview
//! An [`Expression`] is a tree of property reads, literals, comparisons, and
//! boolean combinators. [`Expression::evaluate`] is the only entry point and
//! is pure: the same tree and the same properties always produce the same
//! result, and evaluation never mutates or allocates beyond what the tree
//! itself requires.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::values::Type;

// ============================================================================
// SECTION: Scalar
// ============================================================================

/// A literal value an expression can compare against or a property can hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// `true` / `false`.
    Boolean(bool),
    /// UTF-8 text.
    String(String),
    /// Signed 64-bit integer.
    Integer(i64),
    /// 64-bit float.
    Float(f64),
}

impl Scalar {
    /// Returns this scalar's [`Type`] discriminant.
    #[must_use]
    pub fn kind(&self) -> Type {
        match self {
            Self::Boolean(_) => Type::Boolean,
            Self::String(_) => Type::String,
            Self::Integer(_) => Type::Integer,
            Self::Float(_) => Type::Float,
        }
    }

    /// Reads a property value out of a JSON map entry, widening ints/floats
    /// and rejecting anything that isn't boolean, string, or numeric.
    fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Bool(b) => Some(Self::Boolean(*b)),
            JsonValue::String(s) => Some(Self::String(s.clone())),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Self::Integer(i))
                } else {
                    n.as_f64().map(Self::Float)
                }
            }
            JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => None,
        }
    }

    /// Orders two scalars of the same variant, returning `None` across
    /// variants (callers treat that as a type-mismatch error).
    fn partial_cmp_same_kind(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a.partial_cmp(b),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Integer(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            (Self::Float(a), Self::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Self::String(a), Self::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

// ============================================================================
// SECTION: Expression
// ============================================================================

/// A node in the expression tree.
///
/// # Invariants
/// - `And`/`Any`/`All` with zero children evaluate deterministically (`And`
///   and `All` vacuously true, `Any` vacuously false), matching standard
///   quantifier semantics over an empty set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expression {
    /// A literal value.
    Value(Scalar),
    /// Reads a named property from the actor's property map.
    Property(String),
    /// `left == right`, comparable across scalar types (always `false` when
    /// the operand kinds differ, never an error).
    Equal(Box<Expression>, Box<Expression>),
    /// `left != right`.
    NotEqual(Box<Expression>, Box<Expression>),
    /// `left > right`. Errors if operand kinds differ or aren't orderable.
    GreaterThan(Box<Expression>, Box<Expression>),
    /// `left >= right`.
    GreaterThanOrEqual(Box<Expression>, Box<Expression>),
    /// `left < right`.
    LessThan(Box<Expression>, Box<Expression>),
    /// `left <= right`.
    LessThanOrEqual(Box<Expression>, Box<Expression>),
    /// Logical AND: true iff every child is true.
    And(Vec<Expression>),
    /// Logical OR: true iff at least one child is true.
    Any(Vec<Expression>),
    /// Logical AND, spelled `All` to mirror the property-bag "all of" phrasing
    /// upstream exposes alongside `And`. Semantically identical to `And`.
    All(Vec<Expression>),
    /// Logical negation of a single child.
    Not(Box<Expression>),
}

/// Errors raised evaluating an [`Expression`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExpressionError {
    /// A `Property` node named a key absent from the supplied property map.
    #[error("property {0:?} is not present")]
    MissingProperty(String),
    /// A property value's JSON representation isn't one of the scalar kinds
    /// Gateflag expressions understand (boolean, string, integer, float).
    #[error("property {0:?} holds an unsupported value type")]
    UnsupportedPropertyType(String),
    /// An ordering comparison (`>`, `>=`, `<`, `<=`) was attempted between
    /// operands of different or non-orderable kinds.
    #[error("cannot compare {left} to {right}")]
    TypeMismatch {
        /// The left operand's type.
        left: Type,
        /// The right operand's type.
        right: Type,
    },
    /// A node expected to produce a boolean produced a non-boolean scalar.
    #[error("expected a boolean result, got {0}")]
    NotBoolean(Type),
}

impl Expression {
    /// Evaluates the expression to a boolean against a property map.
    ///
    /// # Errors
    ///
    /// Returns [`ExpressionError`] when a referenced property is missing, a
    /// comparison can't be evaluated, or the root node doesn't reduce to a
    /// boolean.
    pub fn evaluate(&self, properties: &BTreeMap<String, JsonValue>) -> Result<bool, ExpressionError> {
        match self.eval_scalar(properties)? {
            Scalar::Boolean(b) => Ok(b),
            other => Err(ExpressionError::NotBoolean(other.kind())),
        }
    }

    /// Evaluates the expression to a [`Scalar`], used internally for nested
    /// comparison operands.
    fn eval_scalar(&self, properties: &BTreeMap<String, JsonValue>) -> Result<Scalar, ExpressionError> {
        match self {
            Self::Value(scalar) => Ok(scalar.clone()),
            Self::Property(name) => {
                let raw = properties
                    .get(name)
                    .ok_or_else(|| ExpressionError::MissingProperty(name.clone()))?;
                Scalar::from_json(raw).ok_or_else(|| ExpressionError::UnsupportedPropertyType(name.clone()))
            }
            Self::Equal(left, right) => {
                let (l, r) = (left.eval_scalar(properties)?, right.eval_scalar(properties)?);
                Ok(Scalar::Boolean(l == r))
            }
            Self::NotEqual(left, right) => {
                let (l, r) = (left.eval_scalar(properties)?, right.eval_scalar(properties)?);
                Ok(Scalar::Boolean(l != r))
            }
            Self::GreaterThan(left, right) => Self::compare(left, right, properties, |o| o.is_gt()),
            Self::GreaterThanOrEqual(left, right) => Self::compare(left, right, properties, |o| o.is_ge()),
            Self::LessThan(left, right) => Self::compare(left, right, properties, |o| o.is_lt()),
            Self::LessThanOrEqual(left, right) => Self::compare(left, right, properties, |o| o.is_le()),
            Self::And(children) | Self::All(children) => {
                for child in children {
                    if !child.evaluate(properties)? {
                        return Ok(Scalar::Boolean(false));
                    }
                }
                Ok(Scalar::Boolean(true))
            }
            Self::Any(children) => {
                for child in children {
                    if child.evaluate(properties)? {
                        return Ok(Scalar::Boolean(true));
                    }
                }
                Ok(Scalar::Boolean(false))
            }
            Self::Not(child) => Ok(Scalar::Boolean(!child.evaluate(properties)?)),
        }
    }

    /// Shared implementation for the four ordering comparisons.
    fn compare(
        left: &Expression,
        right: &Expression,
        properties: &BTreeMap<String, JsonValue>,
        accept: impl Fn(std::cmp::Ordering) -> bool,
    ) -> Result<Scalar, ExpressionError> {
        let (l, r) = (left.eval_scalar(properties)?, right.eval_scalar(properties)?);
        let ordering = l
            .partial_cmp_same_kind(&r)
            .ok_or_else(|| ExpressionError::TypeMismatch {
                left: l.kind(),
                right: r.kind(),
            })?;
        Ok(Scalar::Boolean(accept(ordering)))
    }

    /// Returns the structural AST equality used by `remove_expression`:
    /// `Expression`'s derived [`PartialEq`] already compares the tree deeply,
    /// so this is a named convenience for call sites that want to spell out
    /// intent rather than use `==` directly.
    #[must_use]
    pub fn structurally_equal(&self, other: &Self) -> bool {
        self == other
    }
}
