mod common;

use serde_json::json;
use std::error::Error;
use xoeuf_domain::{Domain, DomainError, DomainTerm, Limits};

#[test]
fn test_error_creation() {
    // Malformed elements
    let err = Domain::from_value(&json!([["x", "="]])).unwrap_err();
    assert!(matches!(err, DomainError::InvalidTerm(_)));
    let err = Domain::from_value(&json!(["^", ["x", "=", 1]])).unwrap_err();
    assert!(matches!(err, DomainError::InvalidTerm(_)));
    let err = Domain::from_value(&json!([["", "=", 1]])).unwrap_err();
    assert!(matches!(err, DomainError::InvalidTerm(_)));
    let err = Domain::from_value(&json!({"x": 1})).unwrap_err();
    assert!(matches!(err, DomainError::InvalidTerm(_)));

    // Structural problems
    let err = Domain::from_value(&json!(["|", ["x", "=", 1]]))
        .unwrap()
        .normalized()
        .unwrap_err();
    assert!(matches!(err, DomainError::ArityUnderflow { expected: 2, .. }));

    // Vocabulary
    let err = DomainTerm::from_value(&json!(["x", "between", [1, 2]])).unwrap_err();
    assert!(matches!(err, DomainError::UnknownOperator(_)));

    // Limits
    let err = "['&', ('a', '=', 1), '|', ('b', '=', 2), '&', ('c', '=', 3), ('d', '=', 4)]"
        .parse::<Domain>()
        .unwrap()
        .tree_with(&Limits { max_depth: 1 })
        .unwrap_err();
    assert!(matches!(err, DomainError::DepthLimitExceeded(1)));

    // Text forms
    let err = "[('x', '=', 1)".parse::<Domain>().unwrap_err();
    assert!(matches!(err, DomainError::Literal { .. }));
    let err = Domain::from_json("invalid json").unwrap_err();
    assert!(matches!(err, DomainError::Json(_)));
}

#[test]
fn test_error_display() {
    let err = DomainError::InvalidTerm("[\"x\",\"=\"]".to_string());
    assert_eq!(format!("{}", err), "Invalid domain term: [\"x\",\"=\"]");

    let err = DomainError::ArityUnderflow {
        operator: "&".to_string(),
        expected: 2,
    };
    assert_eq!(
        format!("{}", err),
        "Operator '&' expects 2 operand(s) but the domain ended early"
    );

    let err = DomainError::TrailingTerms(3);
    assert_eq!(format!("{}", err), "3 term(s) left over after a complete expression");

    let err = DomainError::UnknownOperator("between".to_string());
    assert_eq!(format!("{}", err), "Unknown term operator: between");

    let err = DomainError::DepthLimitExceeded(256);
    assert_eq!(format!("{}", err), "Domain nesting exceeds the depth limit of 256");

    let err = DomainError::Literal {
        position: 7,
        message: "unterminated string".to_string(),
    };
    assert_eq!(
        format!("{}", err),
        "Literal parse error at offset 7: unterminated string"
    );

    let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
    let err = DomainError::Json(json_error);
    assert!(format!("{}", err).starts_with("Serde JSON error: "));
}

#[test]
fn test_error_source() {
    let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert!(DomainError::Json(json_error).source().is_some());
    assert!(DomainError::TrailingTerms(1).source().is_none());
}

#[test]
fn test_unknown_operator_is_reported_by_every_entry_point() {
    let domain = Domain::from_value(&json!([["x", "~", 1]])).unwrap();
    assert!(matches!(domain.normalized(), Err(DomainError::UnknownOperator(_))));
    assert!(matches!(domain.simplified(), Err(DomainError::UnknownOperator(_))));
    assert!(matches!(domain.negate(), Err(DomainError::UnknownOperator(_))));
    assert!(matches!(domain.equals(&domain), Err(DomainError::UnknownOperator(_))));
    assert!(matches!(
        Domain::true_domain().implies(&domain),
        Err(DomainError::UnknownOperator(_))
    ));
}
