//! Grouped view of a normalized domain.
//!
//! Runs of the same binary connective are flattened into one n-ary group,
//! children made redundant by a sibling are absorbed, and children are kept
//! sorted by their canonical text so that equality and hashing ignore the
//! order in which the domain was written.

use crate::domain::Domain;
use crate::errors::{DomainError, DomainResult};
use crate::operators::Connective;
use crate::term::{DomainItem, DomainTerm};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Decisions keyed by node address, valid for one top-level `implies` call.
type ImplicationCache = HashMap<(*const DomainTree, *const DomainTree), bool>;

/// Resource limits applied while building trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum nesting of connectives.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

fn default_max_depth() -> usize {
    256
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainTree {
    Leaf(DomainTerm),
    /// `children` is sorted by canonical key and never empty. `&`/`|` groups
    /// hold at least two children, `!` groups exactly one.
    Group {
        connective: Connective,
        children: Vec<DomainTree>,
    },
}

impl DomainTree {
    /// Build from a domain that is already normalized (see
    /// [`Domain::normalized`]). The empty domain builds as the true constant.
    pub fn build(domain: &Domain, limits: &Limits) -> DomainResult<Self> {
        if domain.is_empty() {
            return Ok(DomainTree::Leaf(DomainTerm::Constant(true)));
        }
        let terms = domain
            .items()
            .iter()
            .map(DomainTerm::new)
            .collect::<DomainResult<Vec<_>>>()?;
        let mut builder = TreeBuilder {
            terms: &terms,
            pos: 0,
            limits,
        };
        let tree = builder.build(0)?;
        let leftover = terms.len() - builder.pos;
        if leftover > 0 {
            return Err(DomainError::TrailingTerms(leftover));
        }
        Ok(tree)
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, DomainTree::Leaf(_))
    }

    /// The leaf term, or the grouping connective as a term.
    pub fn term(&self) -> DomainTerm {
        match self {
            DomainTree::Leaf(term) => term.clone(),
            DomainTree::Group { connective, .. } => DomainTerm::Operator(*connective),
        }
    }

    pub fn children(&self) -> &[DomainTree] {
        match self {
            DomainTree::Leaf(_) => &[],
            DomainTree::Group { children, .. } => children,
        }
    }

    fn is_tautology(&self) -> bool {
        matches!(self, DomainTree::Leaf(term) if term.is_tautology())
    }

    fn is_contradiction(&self) -> bool {
        matches!(self, DomainTree::Leaf(term) if term.is_contradiction())
    }

    /// Whether every record matching `self` also matches `other`.
    ///
    /// This is a sound but incomplete decision procedure: it never claims an
    /// implication that does not hold, but reasoning that needs to combine
    /// several leaves (e.g. `x > 1 & x < 3` implying `x in (2,)`) is out of
    /// its reach.
    pub fn implies(&self, other: &DomainTree) -> bool {
        self.implies_cached(other, &mut HashMap::new())
    }

    /// Each (self, other) node pair is decided once; nested `&`/`|` groups
    /// otherwise reach the same pair through both operands.
    fn implies_cached(&self, other: &DomainTree, seen: &mut ImplicationCache) -> bool {
        let key = (self as *const DomainTree, other as *const DomainTree);
        if let Some(&known) = seen.get(&key) {
            return known;
        }
        let result = self.implies_uncached(other, seen);
        seen.insert(key, result);
        result
    }

    fn implies_uncached(&self, other: &DomainTree, seen: &mut ImplicationCache) -> bool {
        if self == other || self.is_contradiction() || other.is_tautology() {
            return true;
        }
        if let DomainTree::Group {
            connective: Connective::And,
            children,
        } = other
        {
            return children.iter().all(|child| self.implies_cached(child, seen));
        }
        if let DomainTree::Group {
            connective: Connective::Or,
            children,
        } = self
        {
            return children.iter().all(|child| child.implies_cached(other, seen));
        }
        if let DomainTree::Group {
            connective: Connective::And,
            children,
        } = self
        {
            if children.iter().any(|child| child.implies_cached(other, seen)) {
                return true;
            }
        }
        if let DomainTree::Group {
            connective: Connective::Or,
            children,
        } = other
        {
            if children.iter().any(|child| self.implies_cached(child, seen)) {
                return true;
            }
        }
        match (self, other) {
            (DomainTree::Leaf(a), DomainTree::Leaf(b)) => a.implies(b),
            (
                DomainTree::Group {
                    connective: Connective::Not,
                    children: mine,
                },
                DomainTree::Group {
                    connective: Connective::Not,
                    children: theirs,
                },
            ) => match (mine.first(), theirs.first()) {
                // contraposition
                (Some(a), Some(b)) => b.implies_cached(a, seen),
                _ => false,
            },
            _ => false,
        }
    }

    /// Flatten back to prefix notation, children in canonical order.
    pub fn get_simplified_domain(&self) -> Domain {
        let mut items = Vec::new();
        self.flatten_into(&mut items);
        Domain::new(items)
    }

    fn flatten_into(&self, items: &mut Vec<DomainItem>) {
        match self {
            DomainTree::Leaf(term) => items.push(term.to_item()),
            DomainTree::Group {
                connective,
                children,
            } => {
                let repeats = match connective {
                    Connective::Not => 1,
                    _ => children.len().saturating_sub(1),
                };
                items.extend(std::iter::repeat(DomainItem::Connective(*connective)).take(repeats));
                for child in children {
                    child.flatten_into(items);
                }
            }
        }
    }

    /// Compact JSON text of the simplified domain, object keys sorted.
    pub fn canonical_key(&self) -> String {
        let mut items = Vec::new();
        self.flatten_into(&mut items);
        Value::Array(items.iter().map(DomainItem::canonical_value).collect()).to_string()
    }

    fn negation(child: DomainTree) -> DomainTree {
        match child {
            DomainTree::Group {
                connective: Connective::Not,
                mut children,
            } if children.len() == 1 => children.remove(0),
            DomainTree::Leaf(DomainTerm::Constant(b)) => DomainTree::Leaf(DomainTerm::Constant(!b)),
            child => DomainTree::Group {
                connective: Connective::Not,
                children: vec![child],
            },
        }
    }
}

impl Hash for DomainTree {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_key().hash(state);
    }
}

impl std::fmt::Display for DomainTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical_key())
    }
}

struct TreeBuilder<'a> {
    terms: &'a [DomainTerm],
    pos: usize,
    limits: &'a Limits,
}

impl<'a> TreeBuilder<'a> {
    fn build(&mut self, depth: usize) -> DomainResult<DomainTree> {
        if depth > self.limits.max_depth {
            return Err(DomainError::DepthLimitExceeded(self.limits.max_depth));
        }
        let term = self.terms[self.pos].clone();
        self.pos += 1;
        let connective = match term {
            DomainTerm::Operator(connective) => connective,
            leaf => return Ok(DomainTree::Leaf(leaf)),
        };
        if connective == Connective::Not {
            let child = self.operand(connective, depth)?;
            return Ok(DomainTree::negation(child));
        }

        let mut group = GroupBuilder::new(connective);
        let mut pending = connective.arity();
        while pending > 0 {
            // `& A & B C` is the same group as `& & A B C`
            if self.terms.get(self.pos) == Some(&DomainTerm::Operator(connective)) {
                self.pos += 1;
                pending += 1;
                continue;
            }
            group.push(self.operand(connective, depth)?);
            pending -= 1;
        }
        Ok(group.finish())
    }

    fn operand(&mut self, parent: Connective, depth: usize) -> DomainResult<DomainTree> {
        if self.pos >= self.terms.len() {
            return Err(DomainError::ArityUnderflow {
                operator: parent.as_str().to_string(),
                expected: parent.arity(),
            });
        }
        self.build(depth + 1)
    }
}

struct GroupBuilder {
    connective: Connective,
    children: Vec<DomainTree>,
}

impl GroupBuilder {
    fn new(connective: Connective) -> Self {
        Self {
            connective,
            children: Vec::new(),
        }
    }

    /// Whether `kept` makes `candidate` redundant inside this group: in `&`
    /// the implied child is redundant, in `|` the implying one.
    fn absorbs(&self, kept: &DomainTree, candidate: &DomainTree) -> bool {
        match self.connective {
            Connective::Or => candidate.implies(kept),
            _ => kept.implies(candidate),
        }
    }

    fn push(&mut self, child: DomainTree) {
        match child {
            DomainTree::Group {
                connective,
                children,
            } if connective == self.connective => {
                for grandchild in children {
                    self.push(grandchild);
                }
            }
            child => self.absorb(child),
        }
    }

    fn absorb(&mut self, child: DomainTree) {
        for index in 0..self.children.len() {
            if !self.absorbs(&self.children[index], &child) {
                continue;
            }
            // equivalent siblings: keep the canonically smaller one
            if self.absorbs(&child, &self.children[index])
                && child.canonical_key() < self.children[index].canonical_key()
            {
                debug!("Absorbing {} into equivalent {}", self.children[index], child);
                self.children[index] = child;
            } else {
                debug!("Absorbing {} into {}", child, self.children[index]);
            }
            return;
        }
        let before = self.children.len();
        let connective = self.connective;
        self.children.retain(|existing| match connective {
            Connective::Or => !existing.implies(&child),
            _ => !child.implies(existing),
        });
        if self.children.len() < before {
            debug!(
                "{} made {} sibling(s) redundant",
                child,
                before - self.children.len()
            );
        }
        self.children.push(child);
    }

    fn finish(mut self) -> DomainTree {
        if self.children.len() == 1 {
            return self.children.remove(0);
        }
        self.children.sort_by_cached_key(DomainTree::canonical_key);
        DomainTree::Group {
            connective: self.connective,
            children: self.children,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(value: serde_json::Value) -> DomainTree {
        let domain = Domain::from_value(&value).unwrap();
        DomainTree::build(&domain, &Limits::default()).unwrap()
    }

    #[test]
    fn test_leaf_tree() {
        let t = tree(json!([["x", "=", 1]]));
        assert!(t.is_leaf());
        assert!(t.children().is_empty());
        assert_eq!(t.term(), DomainTerm::from_value(&json!(["x", "=", 1])).unwrap());
    }

    #[test]
    fn test_runs_of_same_connective_flatten() {
        let a = tree(json!(["&", ["a", "=", 1], "&", ["b", "=", 2], ["c", "=", 3]]));
        let b = tree(json!(["&", "&", ["a", "=", 1], ["b", "=", 2], ["c", "=", 3]]));
        assert_eq!(a, b);
        assert_eq!(a.children().len(), 3);
        assert_eq!(a.term(), DomainTerm::Operator(Connective::And));
    }

    #[test]
    fn test_child_order_is_irrelevant() {
        let a = tree(json!(["|", ["a", "=", 1], ["b", "=", 2]]));
        let b = tree(json!(["|", ["b", "=", 2], ["a", "=", 1]]));
        assert_eq!(a, b);
        assert_eq!(a.canonical_key(), b.canonical_key());
    }

    #[test]
    fn test_and_keeps_the_stronger_child() {
        let t = tree(json!(["&", ["x", "in", [1, 2]], ["x", "in", [1]]]));
        assert_eq!(t, tree(json!([["x", "in", [1]]])));
    }

    #[test]
    fn test_or_keeps_the_weaker_child() {
        let t = tree(json!(["|", ["x", ">", 5], ["x", ">", 3]]));
        assert_eq!(t, tree(json!([["x", ">", 3]])));
    }

    #[test]
    fn test_duplicates_collapse() {
        let t = tree(json!(["&", ["x", "=", 1], ["x", "=", 1]]));
        assert!(t.is_leaf());
    }

    #[test]
    fn test_equivalent_children_keep_the_same_representative() {
        let a = tree(json!(["&", ["x", "in", [1, 2]], ["x", "in", [2, 1]]]));
        let b = tree(json!(["&", ["x", "in", [2, 1]], ["x", "in", [1, 2]]]));
        assert_eq!(a, b);
    }

    #[test]
    fn test_not_groups() {
        let t = tree(json!(["!", ["x", "=like", "a%"]]));
        assert_eq!(t.term(), DomainTerm::Operator(Connective::Not));
        assert_eq!(t.children().len(), 1);
        assert_eq!(tree(json!(["!", "!", ["x", "=", 1]])), tree(json!([["x", "=", 1]])));
        assert_eq!(tree(json!(["!", [1, "=", 1]])), tree(json!([[0, "=", 1]])));
    }

    #[test]
    fn test_underflow() {
        let domain = Domain::from_value(&json!(["&", ["x", "=", 1]])).unwrap();
        let err = DomainTree::build(&domain, &Limits::default()).unwrap_err();
        assert!(matches!(err, DomainError::ArityUnderflow { expected: 2, .. }));
    }

    #[test]
    fn test_trailing_terms() {
        let domain = Domain::from_value(&json!([["x", "=", 1], ["y", "=", 1]])).unwrap();
        let err = DomainTree::build(&domain, &Limits::default()).unwrap_err();
        assert!(matches!(err, DomainError::TrailingTerms(1)));
    }

    #[test]
    fn test_depth_limit() {
        let mut items = vec![json!("!"); 40];
        items.push(json!(["x", "=like", "a"]));
        let domain = Domain::from_value(&serde_json::Value::Array(items)).unwrap();
        let err = DomainTree::build(&domain, &Limits { max_depth: 10 }).unwrap_err();
        assert!(matches!(err, DomainError::DepthLimitExceeded(10)));
        assert!(DomainTree::build(&domain, &Limits { max_depth: 64 }).is_ok());
    }

    #[test]
    fn test_tree_implication() {
        let leaf = tree(json!([["x", "=", 1]]));
        let or = tree(json!(["|", ["x", "=", 1], ["y", "=", 2]]));
        let and = tree(json!(["&", ["x", "=", 1], ["y", "=", 2]]));
        assert!(leaf.implies(&or));
        assert!(and.implies(&leaf));
        assert!(and.implies(&or));
        assert!(!or.implies(&leaf));
        assert!(!leaf.implies(&and));
    }

    #[test]
    fn test_negation_contraposition() {
        let a = tree(json!(["!", ["x", "=like", "ab"]]));
        let b = tree(json!(["!", ["x", "=like", "ab"]]));
        assert!(a.implies(&b));
        let c = tree(json!(["!", "|", ["x", "=like", "ab"], ["y", "=like", "c"]]));
        assert!(c.implies(&a));
        assert!(!a.implies(&c));
    }

    #[test]
    fn test_simplified_domain_arity() {
        let t = tree(json!(["|", "|", ["a", "=", 1], ["b", "=", 2], ["c", "=", 3]]));
        let simplified = t.get_simplified_domain();
        assert_eq!(
            simplified.to_value(),
            json!(["|", "|", ["a", "=", 1], ["b", "=", 2], ["c", "=", 3]])
        );
    }

    fn alternating_chain(depth: usize, last: i64) -> DomainTree {
        let mut items = Vec::new();
        for i in 0..depth {
            items.push(json!(if i % 2 == 0 { "&" } else { "|" }));
            items.push(json!([format!("a{}", i), "=", 1]));
        }
        items.push(json!(["z", "=", last]));
        tree(serde_json::Value::Array(items))
    }

    #[test]
    fn test_implication_on_deep_alternating_chains() {
        let a = alternating_chain(40, 1);
        let b = alternating_chain(40, 2);
        assert!(!a.implies(&b));
        assert!(!b.implies(&a));
        assert!(a.implies(&a.clone()));

        let wider = tree(json!(["|", ["y", "=", 1], "|", ["z", "=", 1], ["z", "=", 2]]));
        let wider_chain = {
            let mut items = Vec::new();
            for i in 0..40 {
                items.push(json!(if i % 2 == 0 { "&" } else { "|" }));
                items.push(json!([format!("a{}", i), "=", 1]));
            }
            items.extend(wider.get_simplified_domain().to_value().as_array().cloned().unwrap_or_default());
            tree(serde_json::Value::Array(items))
        };
        assert!(a.implies(&wider_chain));
        assert!(b.implies(&wider_chain));
        assert!(!wider_chain.implies(&a));
    }

    #[test]
    fn test_tree_key_ignores_object_key_order() {
        let a = tree(json!(["|", ["x", "=", {"k": 1, "l": 2}], ["y", "=", 1]]));
        let b = tree(json!(["|", ["y", "=", 1], ["x", "=", {"l": 2, "k": 1}]]));
        assert_eq!(a, b);
        assert_eq!(a.canonical_key(), b.canonical_key());
        use std::collections::HashSet;
        let set: HashSet<DomainTree> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_hash_matches_equality() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(tree(json!(["|", ["a", "=", 1], ["b", "=", 2]])));
        set.insert(tree(json!(["|", ["b", "=", 2], ["a", "=", 1]])));
        assert_eq!(set.len(), 1);
    }
}
