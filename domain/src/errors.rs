/// Error types for building, normalizing and comparing domains
#[derive(Debug)]
pub enum DomainError {
    /// An element is neither a connective token nor a well-formed leaf.
    InvalidTerm(String),
    /// A connective expects `expected` operands but the sequence ran out.
    ArityUnderflow { operator: String, expected: usize },
    /// Terms left over after a complete expression was read.
    TrailingTerms(usize),
    /// A leaf uses an operator outside the supported vocabulary.
    UnknownOperator(String),
    DepthLimitExceeded(usize),
    /// The textual literal form could not be parsed.
    Literal { position: usize, message: String },
    Json(serde_json::Error),
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Json(err)
    }
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainError::InvalidTerm(term) => write!(f, "Invalid domain term: {}", term),
            DomainError::ArityUnderflow { operator, expected } => write!(
                f,
                "Operator '{}' expects {} operand(s) but the domain ended early",
                operator, expected
            ),
            DomainError::TrailingTerms(count) => write!(
                f,
                "{} term(s) left over after a complete expression",
                count
            ),
            DomainError::UnknownOperator(op) => write!(f, "Unknown term operator: {}", op),
            DomainError::DepthLimitExceeded(limit) => {
                write!(f, "Domain nesting exceeds the depth limit of {}", limit)
            }
            DomainError::Literal { position, message } => {
                write!(f, "Literal parse error at offset {}: {}", position, message)
            }
            DomainError::Json(err) => write!(f, "Serde JSON error: {}", err),
        }
    }
}

impl std::error::Error for DomainError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DomainError::Json(err) => Some(err),
            _ => None,
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
