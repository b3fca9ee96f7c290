mod argparse;
mod commands;
mod utils;

use anyhow::Result;
use argparse::parse_args;
use xoeuf_cli::Config;

fn main() -> Result<()> {
    let cli = parse_args();
    utils::init_logger(cli.verbose);

    let mut config = Config::resolve(cli.config.as_deref())?;
    if let Some(format) = cli.format {
        config.output.format = format;
    }

    commands::handle_command(cli.command, &config)
}
