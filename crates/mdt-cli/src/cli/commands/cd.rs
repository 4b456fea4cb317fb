//! `cd [path...]` – print or change the working directory.

use anyhow::{Context, Result};
use async_trait::async_trait;
use mdt_core::router::Handler;
use mdt_core::Flow;

use crate::cli::shell::Shell;

pub struct Cd;

#[async_trait]
impl Handler<Shell> for Cd {
    fn description(&self) -> &str {
        "Print or change the current working directory"
    }

    async fn run(&self, ctx: &mut Shell, args: &[String]) -> Result<Flow> {
        let dest = args.join(" ");
        if dest.is_empty() {
            let cwd = std::env::current_dir().context("reading current directory")?;
            println!("{}", cwd.display());
            return Ok(Flow::Continue);
        }

        let running = ctx.jobs.running_count();
        if running > 0 {
            tracing::warn!(running, dest = %dest, "cd rejected");
            println!("cannot change directory while jobs are in progress");
            return Ok(Flow::Continue);
        }
        std::env::set_current_dir(&dest).with_context(|| format!("cannot change directory to {}", dest))?;
        tracing::info!(dest = %dest, "changed directory");
        Ok(Flow::Continue)
    }
}
