use anyhow::{Context, Result};
use log::info;
use xoeuf_cli::{read_domain, render, Config};
use xoeuf_domain::{Connective, Domain};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Normalize,
    Simplify,
    Negate,
}

impl Transform {
    fn verb(self) -> &'static str {
        match self {
            Transform::Normalize => "normalize",
            Transform::Simplify => "simplify",
            Transform::Negate => "negate",
        }
    }
}

pub fn handle_transform_command(
    transform: Transform,
    input: &str,
    config: &Config,
) -> Result<String> {
    let domain = read_domain(input)?;
    let result = match transform {
        Transform::Normalize => domain.normalized(),
        Transform::Simplify => domain.simplified_with(&config.limits),
        Transform::Negate => domain.negate(),
    }
    .with_context(|| format!("Failed to {} the domain", transform.verb()))?;
    if transform == Transform::Simplify && result.len() < domain.len() {
        info!("Simplified {} term(s) down to {}", domain.len(), result.len());
    }
    Ok(render(&result, &config.output)?)
}

/// `&` or `|` of every input domain.
pub fn handle_combine_command(
    connective: Connective,
    inputs: &[String],
    config: &Config,
) -> Result<String> {
    let domains = inputs
        .iter()
        .map(|input| read_domain(input))
        .collect::<Result<Vec<_>, _>>()?;
    let result = match connective {
        Connective::Or => Domain::or(&domains),
        _ => Domain::and(&domains),
    }
    .with_context(|| {
        format!(
            "Failed to combine {} domain(s) with '{}'",
            domains.len(),
            connective
        )
    })?;
    Ok(render(&result, &config.output)?)
}
