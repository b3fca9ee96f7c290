//! The public entry point: an ordered prefix-notation sequence of leaves and
//! connectives, plus the normalize → tree → decide pipeline.

use crate::errors::{DomainError, DomainResult};
use crate::literal::{parse_literal, to_literal, to_literal_tuple};
use crate::operators::{Connective, TermOperator};
use crate::term::{DomainItem, DomainTerm, Leaf};
use crate::tree::{DomainTree, Limits};
use indexmap::IndexSet;
use log::trace;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::str::FromStr;

/// A search domain in the host framework's shape, e.g.
/// `['|', ('state', '=', 'done'), ('amount', '>', 100)]`.
///
/// `PartialEq` compares the sequences as written. Logical comparison goes
/// through [`Domain::equals`] and [`Domain::implies`], which work on the
/// normalized tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Domain {
    items: Vec<DomainItem>,
}

impl Domain {
    pub fn new(items: Vec<DomainItem>) -> Self {
        Self { items }
    }

    /// The empty domain: no filter, matches every record.
    pub fn true_domain() -> Self {
        Self::default()
    }

    /// Matches no record.
    pub fn false_domain() -> Self {
        Self::new(vec![DomainItem::Constant(false)])
    }

    pub fn from_value(value: &Value) -> DomainResult<Self> {
        match value {
            Value::Array(elements) => elements
                .iter()
                .map(DomainItem::from_value)
                .collect::<DomainResult<Vec<_>>>()
                .map(Self::new),
            other => Err(DomainError::InvalidTerm(other.to_string())),
        }
    }

    /// Strict JSON text, without the literal syntax [`FromStr`] also
    /// accepts.
    pub fn from_json(text: &str) -> DomainResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        Domain::from_value(&value)
    }

    pub fn to_value(&self) -> Value {
        Value::Array(self.items.iter().map(DomainItem::to_value).collect())
    }

    /// The host's textual literal form, leaves printed as tuples.
    pub fn to_literal(&self) -> String {
        let parts: Vec<String> = self
            .items
            .iter()
            .map(|item| match item.to_value() {
                Value::Array(parts) => to_literal_tuple(&parts),
                token => to_literal(&token),
            })
            .collect();
        format!("[{}]", parts.join(", "))
    }

    pub fn items(&self) -> &[DomainItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<DomainItem> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn leaves(&self) -> impl Iterator<Item = &Leaf> {
        self.items.iter().filter_map(|item| match item {
            DomainItem::Leaf(leaf) => Some(leaf),
            _ => None,
        })
    }

    /// Field paths referenced by the leaves, in order of first appearance.
    pub fn fields(&self) -> IndexSet<String> {
        self.leaves().map(|leaf| leaf.field.clone()).collect()
    }

    /// Make every implicit AND explicit: `[A, B]` becomes `['&', A, B]`.
    pub fn normalize_domain(&self) -> DomainResult<Domain> {
        if self.items.is_empty() {
            return Ok(self.clone());
        }
        let mut result: Vec<DomainItem> = Vec::with_capacity(self.items.len() + 1);
        let mut prefix = 0;
        let mut expected: usize = 1;
        let mut last_connective: Option<Connective> = None;
        for item in &self.items {
            if expected == 0 {
                // more operands than the connectives consume: AND them in front
                prefix += 1;
                expected = 1;
            }
            match item {
                DomainItem::Connective(connective) => {
                    expected += connective.arity() - 1;
                    last_connective = Some(*connective);
                }
                _ => expected -= 1,
            }
            result.push(item.clone());
        }
        if expected > 0 {
            let connective = last_connective.unwrap_or(Connective::And);
            return Err(DomainError::ArityUnderflow {
                operator: connective.as_str().to_string(),
                expected: connective.arity(),
            });
        }
        let mut items = vec![DomainItem::Connective(Connective::And); prefix];
        items.extend(result);
        trace!("normalize_domain: {} implicit AND(s) made explicit", prefix);
        Ok(Domain::new(items))
    }

    fn canonicalize_operators(&self) -> DomainResult<Domain> {
        self.items
            .iter()
            .map(|item| DomainTerm::new(item).map(|term| term.to_item()))
            .collect::<DomainResult<Vec<_>>>()
            .map(Domain::new)
    }

    /// Push every `!` down to the leaves using De Morgan's laws and the
    /// operator negation table. A `!` only survives in front of a leaf
    /// whose operator has no negated form (`=like`, `child_of`, ...).
    pub fn distribute_not(&self) -> DomainResult<Domain> {
        let normalized = self.normalize_domain()?;
        let mut result = Vec::with_capacity(normalized.len());
        let mut stack = vec![false];
        for item in normalized.items {
            let negate = stack.pop().ok_or(DomainError::TrailingTerms(1))?;
            match item {
                DomainItem::Connective(Connective::Not) => stack.push(!negate),
                DomainItem::Connective(connective) => {
                    let emitted = match (negate, connective.dual()) {
                        (true, Some(dual)) => dual,
                        _ => connective,
                    };
                    result.push(DomainItem::Connective(emitted));
                    stack.push(negate);
                    stack.push(negate);
                }
                DomainItem::Constant(b) => result.push(DomainItem::Constant(b != negate)),
                DomainItem::Leaf(leaf) if negate => {
                    let negated = TermOperator::from_str(&leaf.operator)
                        .ok()
                        .and_then(TermOperator::negation);
                    match negated {
                        Some(op) => result.push(DomainItem::Leaf(Leaf {
                            operator: op.as_str().to_string(),
                            ..leaf
                        })),
                        None => {
                            result.push(DomainItem::Connective(Connective::Not));
                            result.push(DomainItem::Leaf(leaf));
                        }
                    }
                }
                leaf => result.push(leaf),
            }
        }
        Ok(Domain::new(result))
    }

    /// Explicit ANDs, canonical operators, and negations pushed to the
    /// leaves. The empty domain normalizes to itself.
    pub fn normalized(&self) -> DomainResult<Domain> {
        let normalized = self
            .normalize_domain()?
            .canonicalize_operators()?
            .distribute_not()?;
        trace!("normalized {} into {}", self, normalized);
        Ok(normalized)
    }

    /// Normalize, absorb redundant branches and print children in a
    /// deterministic order.
    pub fn simplified(&self) -> DomainResult<Domain> {
        self.simplified_with(&Limits::default())
    }

    pub fn simplified_with(&self, limits: &Limits) -> DomainResult<Domain> {
        if self.is_empty() {
            return Ok(Domain::true_domain());
        }
        Ok(self.tree_with(limits)?.get_simplified_domain())
    }

    /// Tree of the normalized domain.
    pub fn tree(&self) -> DomainResult<DomainTree> {
        self.tree_with(&Limits::default())
    }

    pub fn tree_with(&self, limits: &Limits) -> DomainResult<DomainTree> {
        DomainTree::build(&self.normalized()?, limits)
    }

    /// Conjunction of all `domains`. Empty domains are the identity; a false
    /// domain absorbs everything.
    pub fn and(domains: &[Domain]) -> DomainResult<Domain> {
        combine(Connective::And, domains)
    }

    /// Disjunction of all `domains`. An empty (true) domain absorbs
    /// everything; no operand at all gives the false domain.
    pub fn or(domains: &[Domain]) -> DomainResult<Domain> {
        combine(Connective::Or, domains)
    }

    pub fn and_with(&self, other: &Domain) -> DomainResult<Domain> {
        Domain::and(&[self.clone(), other.clone()])
    }

    pub fn or_with(&self, other: &Domain) -> DomainResult<Domain> {
        Domain::or(&[self.clone(), other.clone()])
    }

    /// `!` in front of the normalized domain. The negation is not pushed to
    /// the leaves here; [`Domain::normalized`] does that.
    pub fn negate(&self) -> DomainResult<Domain> {
        let normalized = self.normalized()?;
        if normalized.is_empty() {
            return Ok(Domain::false_domain());
        }
        let mut items = Vec::with_capacity(normalized.len() + 1);
        items.push(DomainItem::Connective(Connective::Not));
        items.extend(normalized.items);
        Ok(Domain::new(items))
    }

    /// Logical equality: both sides build equal trees.
    pub fn equals(&self, other: &Domain) -> DomainResult<bool> {
        Ok(self.tree()? == other.tree()?)
    }

    /// Text of the simplified tree. Domains for which [`Domain::equals`]
    /// holds share the same key, so it can stand in for the domain in hash
    /// maps keyed by meaning.
    pub fn canonical_key(&self) -> DomainResult<String> {
        Ok(self.tree()?.canonical_key())
    }

    /// Whether every record matching `self` matches `other`, as far as
    /// [`DomainTree::implies`] can tell.
    pub fn implies(&self, other: &Domain) -> DomainResult<bool> {
        Ok(self.tree()?.implies(&other.tree()?))
    }
}

fn is_constant(domain: &Domain, value: bool) -> bool {
    match domain.items() {
        [] => value,
        [DomainItem::Constant(b)] => *b == value,
        _ => false,
    }
}

fn combine(connective: Connective, domains: &[Domain]) -> DomainResult<Domain> {
    let (unit, zero) = match connective {
        Connective::Or => (false, true),
        _ => (true, false),
    };
    let mut operands = Vec::with_capacity(domains.len());
    for domain in domains {
        let normalized = domain.normalized()?;
        if is_constant(&normalized, unit) {
            continue;
        }
        if is_constant(&normalized, zero) {
            return Ok(if zero {
                Domain::true_domain()
            } else {
                Domain::false_domain()
            });
        }
        operands.push(normalized);
    }
    if operands.is_empty() {
        return Ok(if unit {
            Domain::true_domain()
        } else {
            Domain::false_domain()
        });
    }
    let mut items = vec![DomainItem::Connective(connective); operands.len() - 1];
    for operand in operands {
        items.extend(operand.items);
    }
    Ok(Domain::new(items))
}

impl From<Vec<DomainItem>> for Domain {
    fn from(items: Vec<DomainItem>) -> Self {
        Domain::new(items)
    }
}

impl TryFrom<Value> for Domain {
    type Error = DomainError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Domain::from_value(&value)
    }
}

/// Reads JSON text or the host's literal syntax.
impl FromStr for Domain {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Domain::from_value(&parse_literal(s.trim())?)
    }
}

/// Compact JSON text.
impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

impl Serialize for Domain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Domain {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<DomainItem>::deserialize(deserializer)?;
        Ok(Domain::new(items))
    }
}
