use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::debug;
use tabular::{Row, Table};
use xoeuf_cli::{read_domain, Config};
use xoeuf_domain::DomainTree;

fn trees(left: &str, right: &str, config: &Config) -> Result<(DomainTree, DomainTree)> {
    let left_tree = read_domain(left)?
        .tree_with(&config.limits)
        .context("Failed to build the left domain")?;
    let right_tree = read_domain(right)?
        .tree_with(&config.limits)
        .context("Failed to build the right domain")?;
    debug!("Comparing {} with {}", left_tree, right_tree);
    Ok((left_tree, right_tree))
}

pub fn handle_implies_command(left: &str, right: &str, config: &Config) -> Result<String> {
    let (left, right) = trees(left, right, config)?;
    Ok(left.implies(&right).to_string())
}

pub fn handle_equals_command(left: &str, right: &str, config: &Config) -> Result<String> {
    let (left, right) = trees(left, right, config)?;
    Ok((left == right).to_string())
}

/// One row per field path, in order of first use.
pub fn handle_fields_command(input: &str) -> Result<String> {
    let domain = read_domain(input)?;
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for leaf in domain.leaves() {
        *counts.entry(leaf.field.as_str()).or_insert(0) += 1;
    }

    #[allow(clippy::literal_string_with_formatting_args)]
    let mut table =
        Table::new("{:<}  {:>}").with_row(Row::from_cells(["Field", "Leaves"].iter().cloned()));
    for (field, count) in counts {
        table.add_row(Row::new().with_cell(field).with_cell(count));
    }
    Ok(table.to_string())
}
