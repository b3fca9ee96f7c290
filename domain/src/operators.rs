use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// Structural tokens of the prefix notation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, EnumIter, IntoStaticStr,
)]
pub enum Connective {
    #[strum(serialize = "&")]
    And,
    #[strum(serialize = "|")]
    Or,
    #[strum(serialize = "!")]
    Not,
}

impl Connective {
    /// Number of sub-expressions that follow the token.
    pub fn arity(self) -> usize {
        match self {
            Connective::And | Connective::Or => 2,
            Connective::Not => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// De Morgan dual, `None` for `!`.
    pub fn dual(self) -> Option<Connective> {
        match self {
            Connective::And => Some(Connective::Or),
            Connective::Or => Some(Connective::And),
            Connective::Not => None,
        }
    }
}

/// Comparison operators allowed in a leaf.
///
/// Parsing is ASCII case-insensitive and accepts `<>` as an alias of `!=`,
/// matching what the host framework accepts in persisted domains.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum TermOperator {
    #[strum(serialize = "=")]
    Eq,
    #[strum(to_string = "!=", serialize = "<>")]
    Ne,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = "<=")]
    Le,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = ">=")]
    Ge,
    #[strum(serialize = "in")]
    In,
    #[strum(serialize = "not in")]
    NotIn,
    #[strum(serialize = "like")]
    Like,
    #[strum(serialize = "ilike")]
    ILike,
    #[strum(serialize = "not like")]
    NotLike,
    #[strum(serialize = "not ilike")]
    NotILike,
    #[strum(serialize = "=like")]
    EqLike,
    #[strum(serialize = "=ilike")]
    EqILike,
    #[strum(serialize = "=?")]
    EqOrUnset,
    #[strum(serialize = "child_of")]
    ChildOf,
    #[strum(serialize = "parent_of")]
    ParentOf,
}

impl TermOperator {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// The operator matching exactly the complement of `self`, if the
    /// vocabulary has one.
    pub fn negation(self) -> Option<TermOperator> {
        use TermOperator::*;
        match self {
            Eq => Some(Ne),
            Ne => Some(Eq),
            Lt => Some(Ge),
            Ge => Some(Lt),
            Gt => Some(Le),
            Le => Some(Gt),
            In => Some(NotIn),
            NotIn => Some(In),
            Like => Some(NotLike),
            NotLike => Some(Like),
            ILike => Some(NotILike),
            NotILike => Some(ILike),
            EqLike | EqILike | EqOrUnset | ChildOf | ParentOf => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_operator_aliases() {
        assert_eq!(TermOperator::from_str("<>").unwrap(), TermOperator::Ne);
        assert_eq!(TermOperator::from_str("NOT IN").unwrap(), TermOperator::NotIn);
        assert_eq!(TermOperator::from_str("ILike").unwrap(), TermOperator::ILike);
        assert!(TermOperator::from_str("~").is_err());
        assert_eq!(TermOperator::Ne.to_string(), "!=");
        assert_eq!(TermOperator::Ne.as_str(), "!=");
    }

    #[test]
    fn test_operator_text_roundtrip() {
        for op in TermOperator::iter() {
            assert_eq!(TermOperator::from_str(op.as_str()).unwrap(), op);
        }
        for conn in Connective::iter() {
            assert_eq!(Connective::from_str(conn.as_str()).unwrap(), conn);
        }
    }

    #[test]
    fn test_negation_is_an_involution() {
        for op in TermOperator::iter() {
            if let Some(neg) = op.negation() {
                assert_eq!(neg.negation(), Some(op));
            }
        }
        assert_eq!(TermOperator::EqLike.negation(), None);
    }

    #[test]
    fn test_connective_arity() {
        assert_eq!(Connective::And.arity(), 2);
        assert_eq!(Connective::Or.arity(), 2);
        assert_eq!(Connective::Not.arity(), 1);
        assert_eq!(Connective::And.dual(), Some(Connective::Or));
        assert_eq!(Connective::Not.dual(), None);
    }
}
