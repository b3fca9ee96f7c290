mod compare;
mod transform;

use crate::argparse::Commands;
use anyhow::Result;
pub use compare::{handle_equals_command, handle_fields_command, handle_implies_command};
pub use transform::{handle_combine_command, handle_transform_command, Transform};
use xoeuf_cli::Config;
use xoeuf_domain::Connective;

pub fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let output = match command {
        Commands::Normalize(args) => {
            handle_transform_command(Transform::Normalize, &args.domain, config)?
        }
        Commands::Simplify(args) => {
            handle_transform_command(Transform::Simplify, &args.domain, config)?
        }
        Commands::Negate(args) => handle_transform_command(Transform::Negate, &args.domain, config)?,
        Commands::And(args) => handle_combine_command(Connective::And, &args.domains, config)?,
        Commands::Or(args) => handle_combine_command(Connective::Or, &args.domains, config)?,
        Commands::Implies(args) => handle_implies_command(&args.left, &args.right, config)?,
        Commands::Equals(args) => handle_equals_command(&args.left, &args.right, config)?,
        Commands::Fields(args) => handle_fields_command(&args.domain)?,
    };
    println!("{}", output.trim_end());
    Ok(())
}
