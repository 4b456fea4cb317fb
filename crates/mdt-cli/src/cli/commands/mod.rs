//! Shell command handlers, one file per command.

mod add;
mod cd;
mod exit;
mod help;
mod show;
mod trim;
mod watch;

use anyhow::{bail, Result};
use mdt_core::CommandRouter;

use super::shell::Shell;

#[cfg(test)]
pub use show::render_rows;

/// The registration table of the shell.
pub fn router() -> CommandRouter<Shell> {
    CommandRouter::builder()
        .command("add", add::Add)
        .command("cd", cd::Cd)
        .command("exit", exit::Exit)
        .command("exit force", exit::ExitForce)
        .command("help", help::Help)
        .command("show", show::Show)
        .command("trim", trim::Trim)
        .command("watch", watch::Watch)
        .build()
}

fn expect_no_args(args: &[String]) -> Result<()> {
    if !args.is_empty() {
        bail!("expected 0 arguments, got {}: {:?}", args.len(), args);
    }
    Ok(())
}
