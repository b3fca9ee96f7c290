//! Single elements of a domain: raw items as written, and their canonical
//! [`DomainTerm`] form used for every comparison.

use crate::errors::{DomainError, DomainResult};
use crate::operators::{Connective, TermOperator};
use log::warn;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Number, Value};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// A `(field, operator, value)` comparison exactly as it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    pub field: String,
    pub operator: String,
    pub value: Value,
}

impl Leaf {
    pub fn new(field: impl Into<String>, operator: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }
}

/// One element of a domain sequence.
///
/// `Constant` holds the host framework's always-true `[1, "=", 1]` and
/// always-false `[0, "=", 1]` leaves, the only leaves without a string field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainItem {
    Connective(Connective),
    Leaf(Leaf),
    Constant(bool),
}

impl DomainItem {
    pub fn leaf(field: impl Into<String>, operator: impl Into<String>, value: impl Into<Value>) -> Self {
        DomainItem::Leaf(Leaf::new(field, operator, value))
    }

    pub fn from_value(value: &Value) -> DomainResult<Self> {
        match value {
            Value::String(token) => Connective::from_str(token)
                .map(DomainItem::Connective)
                .map_err(|_| DomainError::InvalidTerm(value.to_string())),
            Value::Array(parts) if parts.len() == 3 => {
                if let Some(constant) = constant_leaf(parts) {
                    return Ok(DomainItem::Constant(constant));
                }
                match (&parts[0], &parts[1]) {
                    (Value::String(field), Value::String(operator)) if !field.is_empty() => {
                        Ok(DomainItem::Leaf(Leaf {
                            field: field.clone(),
                            operator: operator.clone(),
                            value: parts[2].clone(),
                        }))
                    }
                    _ => Err(DomainError::InvalidTerm(value.to_string())),
                }
            }
            _ => Err(DomainError::InvalidTerm(value.to_string())),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            DomainItem::Connective(c) => Value::String(c.as_str().to_string()),
            DomainItem::Leaf(leaf) => json!([leaf.field, leaf.operator, leaf.value]),
            DomainItem::Constant(true) => json!([1, "=", 1]),
            DomainItem::Constant(false) => json!([0, "=", 1]),
        }
    }

    /// Like [`DomainItem::to_value`], with object keys in leaf values sorted
    /// so that values comparing equal print the same.
    pub fn canonical_value(&self) -> Value {
        match self {
            DomainItem::Leaf(leaf) => json!([leaf.field, leaf.operator, sorted_keys(&leaf.value)]),
            other => other.to_value(),
        }
    }

    pub fn is_connective(&self) -> bool {
        matches!(self, DomainItem::Connective(_))
    }
}

fn sorted_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, item)| (key.clone(), sorted_keys(item)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted_keys).collect()),
        other => other.clone(),
    }
}

fn constant_leaf(parts: &[Value]) -> Option<bool> {
    if parts[1] != "=" || parts[2] != 1 {
        return None;
    }
    match parts[0].as_i64() {
        Some(1) => Some(true),
        Some(0) => Some(false),
        _ => None,
    }
}

impl From<Connective> for DomainItem {
    fn from(connective: Connective) -> Self {
        DomainItem::Connective(connective)
    }
}

impl From<Leaf> for DomainItem {
    fn from(leaf: Leaf) -> Self {
        DomainItem::Leaf(leaf)
    }
}

impl Serialize for DomainItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DomainItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        DomainItem::from_value(&value).map_err(serde::de::Error::custom)
    }
}

/// Canonical form of one domain element.
///
/// Leaves carry a resolved [`TermOperator`] after the host's rewrite rules
/// have been applied, so syntactically different spellings of the same
/// comparison compare equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainTerm {
    Operator(Connective),
    Leaf {
        field: String,
        operator: TermOperator,
        value: Value,
    },
    Constant(bool),
}

impl DomainTerm {
    pub fn new(item: &DomainItem) -> DomainResult<Self> {
        match item {
            DomainItem::Connective(c) => Ok(DomainTerm::Operator(*c)),
            DomainItem::Constant(b) => Ok(DomainTerm::Constant(*b)),
            DomainItem::Leaf(leaf) => {
                let operator = TermOperator::from_str(&leaf.operator)
                    .map_err(|_| DomainError::UnknownOperator(leaf.operator.clone()))?;
                let operator = canonical_operator(&leaf.field, operator, &leaf.value);
                Ok(DomainTerm::Leaf {
                    field: leaf.field.clone(),
                    operator,
                    value: leaf.value.clone(),
                })
            }
        }
    }

    pub fn from_value(value: &Value) -> DomainResult<Self> {
        DomainTerm::new(&DomainItem::from_value(value)?)
    }

    pub fn is_operator(&self) -> bool {
        matches!(self, DomainTerm::Operator(_))
    }

    pub fn is_leaf(&self) -> bool {
        !self.is_operator()
    }

    /// Back to a sequence element, with the canonical operator spelling.
    pub fn to_item(&self) -> DomainItem {
        match self {
            DomainTerm::Operator(c) => DomainItem::Connective(*c),
            DomainTerm::Constant(b) => DomainItem::Constant(*b),
            DomainTerm::Leaf {
                field,
                operator,
                value,
            } => DomainItem::Leaf(Leaf {
                field: field.clone(),
                operator: operator.as_str().to_string(),
                value: value.clone(),
            }),
        }
    }

    /// Compact JSON text of the canonical form.
    pub fn canonical_key(&self) -> String {
        self.to_item().canonical_value().to_string()
    }

    /// Matches every record.
    pub fn is_tautology(&self) -> bool {
        match self {
            DomainTerm::Constant(b) => *b,
            DomainTerm::Leaf {
                operator: TermOperator::EqOrUnset,
                value,
                ..
            } => is_unset(value),
            _ => false,
        }
    }

    /// Matches no record.
    pub fn is_contradiction(&self) -> bool {
        matches!(self, DomainTerm::Constant(false))
    }

    /// Whether every record matching `self` also matches `other`.
    ///
    /// Sound but incomplete: `true` is only returned when the implication is
    /// guaranteed, and some valid implications are not detected (for instance
    /// `x = 1` does not imply `x != 2` here). Connectives only imply
    /// themselves.
    pub fn implies(&self, other: &DomainTerm) -> bool {
        if self == other {
            return true;
        }
        if self.is_operator() || other.is_operator() {
            return false;
        }
        if self.is_contradiction() || other.is_tautology() {
            return true;
        }
        match (self, other) {
            (
                DomainTerm::Leaf {
                    field,
                    operator,
                    value,
                },
                DomainTerm::Leaf {
                    field: other_field,
                    operator: other_operator,
                    value: other_value,
                },
            ) => field == other_field && leaf_implies(*operator, value, *other_operator, other_value),
            _ => false,
        }
    }
}

impl Hash for DomainTerm {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_key().hash(state);
    }
}

impl std::fmt::Display for DomainTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical_key())
    }
}

/// `=?` compares against "unset" (`False`/`None`), which makes it a tautology.
fn is_unset(value: &Value) -> bool {
    matches!(value, Value::Null | Value::Bool(false))
}

fn canonical_operator(field: &str, operator: TermOperator, value: &Value) -> TermOperator {
    use TermOperator::*;
    let operator = match operator {
        EqOrUnset if !is_unset(value) => Eq,
        op => op,
    };
    match (operator, value) {
        (In, Value::Bool(_)) | (NotIn, Value::Bool(_)) => {
            let rewritten = if operator == In { Eq } else { Ne };
            warn!(
                "The domain term '({:?}, {:?}, {})' should use the '{}' operator",
                field, operator.as_str(), value, rewritten
            );
            rewritten
        }
        (Eq, Value::Array(_)) | (Ne, Value::Array(_)) => {
            let rewritten = if operator == Eq { In } else { NotIn };
            warn!(
                "The domain term '({:?}, {:?}, {})' should use the '{}' operator",
                field, operator.as_str(), value, rewritten
            );
            rewritten
        }
        (op, _) => op,
    }
}

/// Largest magnitude below which every integer has an exact `f64`.
const MAX_EXACT_F64_INTEGER: u64 = 1 << 53;

/// `n` as an `f64`, or `None` for an integer `f64` cannot hold exactly.
fn exact_f64(n: &Number) -> Option<f64> {
    if n.is_f64() {
        return n.as_f64();
    }
    if let Some(i) = n.as_i64() {
        return (i.unsigned_abs() <= MAX_EXACT_F64_INTEGER).then_some(i as f64);
    }
    n.as_u64()
        .filter(|u| *u <= MAX_EXACT_F64_INTEGER)
        .map(|u| u as f64)
}

/// Integers are compared exactly; `f64` is only used when a float is
/// involved and the integer side converts without rounding.
fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return Some(x.cmp(&y));
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return Some(x.cmp(&y));
    }
    if a.is_f64() || b.is_f64() {
        return exact_f64(a)?.partial_cmp(&exact_f64(b)?);
    }
    // one side negative, the other above i64::MAX
    match (a.as_i64(), b.as_i64()) {
        (Some(_), None) => Some(Ordering::Less),
        (None, Some(_)) => Some(Ordering::Greater),
        _ => None,
    }
}

/// Ordering is only decided between numbers: string ordering depends on the
/// database collation.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        _ => None,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y) == Some(Ordering::Equal),
        _ => a == b,
    }
}

fn elements(value: &Value) -> &[Value] {
    match value {
        Value::Array(items) => items,
        other => std::slice::from_ref(other),
    }
}

fn contains(collection: &Value, needle: &Value) -> bool {
    elements(collection).iter().any(|item| values_equal(item, needle))
}

/// Every element of `small` appears in `big`.
fn subset(small: &Value, big: &Value) -> bool {
    elements(small).iter().all(|item| contains(big, item))
}

/// `needle` is a substring of `haystack`. Escaped patterns are left alone.
fn substring(haystack: &Value, needle: &Value, ignore_case: bool) -> bool {
    match (haystack, needle) {
        (Value::String(h), Value::String(n)) if !h.contains('\\') && !n.contains('\\') => {
            if ignore_case {
                h.to_lowercase().contains(&n.to_lowercase())
            } else {
                h.contains(n.as_str())
            }
        }
        _ => false,
    }
}

fn leaf_implies(op: TermOperator, value: &Value, other_op: TermOperator, other: &Value) -> bool {
    use TermOperator::*;
    let ordering = || compare(value, other);
    match (op, other_op) {
        (In, _) => elements(value)
            .iter()
            .all(|item| leaf_implies(Eq, item, other_op, other)),
        (Eq, Eq) => values_equal(value, other),
        (Eq, Gt) => ordering() == Some(Ordering::Greater),
        (Eq, Ge) => matches!(ordering(), Some(Ordering::Greater | Ordering::Equal)),
        (Eq, Lt) => ordering() == Some(Ordering::Less),
        (Eq, Le) => matches!(ordering(), Some(Ordering::Less | Ordering::Equal)),
        (Eq, In) => contains(other, value),
        (Eq, Like) => substring(value, other, false),
        (Eq, ILike) => substring(value, other, true),
        (Gt, Gt) | (Gt, Ge) | (Ge, Ge) => {
            matches!(ordering(), Some(Ordering::Greater | Ordering::Equal))
        }
        (Ge, Gt) => ordering() == Some(Ordering::Greater),
        (Lt, Lt) | (Lt, Le) | (Le, Le) => matches!(ordering(), Some(Ordering::Less | Ordering::Equal)),
        (Le, Lt) => ordering() == Some(Ordering::Less),
        (NotIn, NotIn) => subset(other, value),
        (NotIn, Ne) => contains(value, other),
        (Ne, NotIn) => {
            let excluded = elements(other);
            !excluded.is_empty() && excluded.iter().all(|item| values_equal(item, value))
        }
        (Like, Like) => substring(value, other, false),
        (Like, ILike) | (ILike, ILike) => substring(value, other, true),
        (NotLike, NotLike) => substring(other, value, false),
        (NotILike, NotILike) | (NotILike, NotLike) => substring(other, value, true),
        _ => false,
    }
}
