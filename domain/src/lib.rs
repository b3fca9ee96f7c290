//! Algebra over search domains: the prefix-notation filters
//! (`['|', ('state', '=', 'done'), ('amount', '>', 100)]`) used by the host
//! ORM to describe which records a search matches.
//!
//! A [`Domain`] can be normalized (explicit ANDs, canonical operators,
//! negations pushed to the leaves), combined with `AND`/`OR`/`NOT`,
//! simplified by absorbing redundant branches, and compared for equality or
//! implication through its [`DomainTree`].
//!
//! ```
//! use xoeuf_domain::Domain;
//!
//! let narrow: Domain = "[('x', 'in', (1, 2, 3))]".parse().unwrap();
//! let wide: Domain = "[('x', 'in', (1, 2, 3, 4))]".parse().unwrap();
//! assert!(narrow.implies(&wide).unwrap());
//! assert!(!wide.implies(&narrow).unwrap());
//! ```

pub mod domain;
pub mod errors;
pub mod literal;
pub mod operators;
pub mod term;
pub mod tree;

pub use domain::Domain;
pub use errors::{DomainError, DomainResult};
pub use literal::{parse_literal, to_literal};
pub use operators::{Connective, TermOperator};
pub use term::{DomainItem, DomainTerm, Leaf};
pub use tree::{DomainTree, Limits};
