//! `trim` – show all jobs, then forget the finished and errored ones.

use anyhow::Result;
use async_trait::async_trait;
use mdt_core::router::Handler;
use mdt_core::Flow;

use super::expect_no_args;
use super::show::print_jobs;
use crate::cli::shell::Shell;

pub struct Trim;

#[async_trait]
impl Handler<Shell> for Trim {
    fn description(&self) -> &str {
        "Show progress for all jobs, then remove finished and errored ones"
    }

    async fn run(&self, ctx: &mut Shell, args: &[String]) -> Result<Flow> {
        expect_no_args(args)?;
        print_jobs(ctx);
        for job in ctx.jobs.trim() {
            tracing::debug!(job = %job.name(), stage = %job.stage(), "removed from list");
        }
        Ok(Flow::Continue)
    }
}
