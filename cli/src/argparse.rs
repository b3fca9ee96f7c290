use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use xoeuf_cli::OutputFormat;

#[derive(Parser)]
#[command(
    name = "xdom",
    about = "Normalize, simplify and compare search domains",
    version,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// TOML configuration file, defaults to <config dir>/xoeuf/xdom.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format, overrides the configuration file
    #[arg(long, global = true, value_enum)]
    pub format: Option<OutputFormat>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Pick which subcommand to use
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Make ANDs explicit, canonicalize operators and push negations to the leaves
    Normalize(DomainArgs),
    /// Normalize, then drop redundant branches
    Simplify(DomainArgs),
    /// Negate a domain
    Negate(DomainArgs),
    /// Conjunction of one or more domains
    And(DomainListArgs),
    /// Disjunction of one or more domains
    Or(DomainListArgs),
    /// Whether every record matching LEFT also matches RIGHT
    Implies(DomainPairArgs),
    /// Whether two domains are logically equal
    Equals(DomainPairArgs),
    /// Field paths used by a domain, with the number of leaves using each
    Fields(DomainArgs),
}

#[derive(Args)]
pub struct DomainArgs {
    /// Domain as JSON or literal text, or @path to read it from a file
    pub domain: String,
}

#[derive(Args)]
pub struct DomainListArgs {
    /// Domains as JSON or literal text, or @path to read them from files
    #[arg(required = true)]
    pub domains: Vec<String>,
}

#[derive(Args)]
pub struct DomainPairArgs {
    pub left: String,
    pub right: String,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
