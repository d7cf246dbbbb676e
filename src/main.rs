//! Command-line interface for compiling requirement dependency graphs and
//! generating boolean truth-table test cases.

use clap::Parser;

mod cli;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
