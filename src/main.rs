//! Command-line entry point for viral-taxa.
//!
//! Subcommands:
//! 1. `info`: annotate taxid files with family, rank, name, genetic code and lineage.
//! 2. `group`: split an annotation table into per-(family, genetic code) taxid files.
//! 3. `sample`: draw random taxa of one rank from a clade.
//! 4. `lookup`: print what the taxonomy knows about individual taxids.

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{run_cli, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG still wins over the default level.
    let default_level = if cli.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    run_cli(cli)
}
