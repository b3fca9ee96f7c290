pub mod config;

pub use config::{Config, OutputConfig, OutputFormat};

use std::path::PathBuf;
use xoeuf_domain::{Domain, DomainError};

/// Error type for reading domains given on the command line
#[derive(Debug)]
pub enum CliError {
    InputFile(PathBuf, std::io::Error),
    InvalidDomain(String, DomainError),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::InputFile(path, e) => {
                write!(
                    f,
                    "Failed to read domain file '{}': {e}\n\nPass the domain inline, or prefix a readable file path with '@'.",
                    path.display()
                )
            }
            CliError::InvalidDomain(input, e) => {
                write!(
                    f,
                    "Invalid domain {input}: {e}\n\nDomains are JSON arrays or literals such as:\n  [('state', '=', 'done'), '|', ('amount', '>', 100), ('partner_id', '=', False)]"
                )
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::InputFile(_, e) => Some(e),
            CliError::InvalidDomain(_, e) => Some(e),
        }
    }
}

/// Parse a command-line argument as a domain. `@path` reads the text from
/// a file, strictly as JSON when the file name ends in `.json`; anything
/// else is the domain itself, as JSON or literal text.
pub fn read_domain(arg: &str) -> Result<Domain, CliError> {
    let Some(path) = arg.strip_prefix('@') else {
        return arg
            .parse()
            .map_err(|e| CliError::InvalidDomain(format!("'{}'", arg), e));
    };
    let path = PathBuf::from(path);
    let text =
        fs_err::read_to_string(&path).map_err(|e| CliError::InputFile(path.clone(), e))?;
    let parsed = if path.extension().is_some_and(|ext| ext == "json") {
        Domain::from_json(&text)
    } else {
        text.parse()
    };
    parsed.map_err(|e| CliError::InvalidDomain(format!("in '{}'", path.display()), e))
}

/// Print a domain the way the output settings ask for.
pub fn render(domain: &Domain, output: &OutputConfig) -> serde_json::Result<String> {
    match output.format {
        OutputFormat::Json if output.pretty => serde_json::to_string_pretty(domain),
        OutputFormat::Json => serde_json::to_string(domain),
        OutputFormat::Literal => Ok(domain.to_literal()),
    }
}
