//! `watch` – redraw `show` every interval until Ctrl-C.

use anyhow::Result;
use async_trait::async_trait;
use mdt_core::router::Handler;
use mdt_core::Flow;

use super::expect_no_args;
use super::show::print_jobs;
use crate::cli::shell::Shell;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub struct Watch;

#[async_trait]
impl Handler<Shell> for Watch {
    fn description(&self) -> &str {
        "Show progress for all jobs, refreshing until Ctrl-C"
    }

    async fn run(&self, ctx: &mut Shell, args: &[String]) -> Result<Flow> {
        expect_no_args(args)?;
        let interval = ctx.config.watch_interval();
        loop {
            print!("{}", CLEAR_SCREEN);
            print_jobs(ctx);
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = ctx.interrupts.next() => {
                    println!();
                    return Ok(Flow::Continue);
                }
            }
        }
    }
}
