//! Shared fixtures for the xoeuf-domain integration tests

#![allow(dead_code)]

use xoeuf_domain::Domain;

/// Sample domains in the host's literal syntax. Each sample filters on its
/// own fields, so combining two samples never lets one absorb the other.
pub const SAMPLE_DOMAINS: &[&str] = &[
    "[]",
    "[('a', '=', 1)]",
    "[('b', '>', 3), ('c', 'ilike', 'foo')]",
    "['|', ('state', '=', 'done'), ('amount', '>=', 100)]",
    "['!', '&', ('d', 'in', (1, 2)), ('e', '!=', False)]",
    "['|', ('f', '=like', 'x%'), '!', ('g', 'child_of', 3)]",
    "[('partner_id.country_id.code', '=', 'CU'), '|', ('h', '<', 2), ('h', 'not in', (5, 6))]",
    "['&', '|', ('i', '=', 1), ('j', '=', 2), '|', ('k', '=', 3), ('i', '=', 1)]",
    "[('name', 'like', 'abc'), ('name', 'like', 'b')]",
    "[(1, '=', 1), ('m', '<>', 2)]",
];

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn parse(text: &str) -> Domain {
    text.parse()
        .unwrap_or_else(|e| panic!("failed to parse {}: {}", text, e))
}

pub fn samples() -> Vec<Domain> {
    SAMPLE_DOMAINS.iter().map(|text| parse(text)).collect()
}
