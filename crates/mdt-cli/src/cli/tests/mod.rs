//! CLI tests: argument parsing, the command table, rendering and shell input.

use super::Cli;
use clap::Parser;

pub(super) fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
}

mod interrupts;
