//! `exit` and `exit force`.

use anyhow::Result;
use async_trait::async_trait;
use mdt_core::router::Handler;
use mdt_core::Flow;

use super::expect_no_args;
use crate::cli::shell::{report_waiting, Shell};

pub struct Exit;

#[async_trait]
impl Handler<Shell> for Exit {
    fn description(&self) -> &str {
        "Exit once all running jobs have finished"
    }

    async fn run(&self, ctx: &mut Shell, args: &[String]) -> Result<Flow> {
        expect_no_args(args)?;
        let interval = ctx.config.exit_poll_interval();
        tokio::select! {
            _ = ctx.jobs.wait_until_idle(interval, report_waiting) => {
                println!();
                Ok(Flow::Exit)
            }
            _ = ctx.interrupts.next() => {
                println!("\nstopped waiting, {} jobs still running", ctx.jobs.running_count());
                Ok(Flow::Continue)
            }
        }
    }
}

pub struct ExitForce;

#[async_trait]
impl Handler<Shell> for ExitForce {
    fn description(&self) -> &str {
        "Exit immediately, abandoning running jobs"
    }

    async fn run(&self, ctx: &mut Shell, args: &[String]) -> Result<Flow> {
        expect_no_args(args)?;
        tracing::warn!(running = ctx.jobs.running_count(), "forced exit");
        std::process::exit(0)
    }
}
