//! `help` – list commands with their descriptions.

use anyhow::Result;
use async_trait::async_trait;
use mdt_core::router::Handler;
use mdt_core::Flow;

use super::expect_no_args;
use crate::cli::shell::Shell;

pub struct Help;

#[async_trait]
impl Handler<Shell> for Help {
    fn description(&self) -> &str {
        "Print this help message"
    }

    async fn run(&self, ctx: &mut Shell, args: &[String]) -> Result<Flow> {
        expect_no_args(args)?;
        for (name, description) in &ctx.help {
            println!("{}: {}", name, description);
        }
        Ok(Flow::Continue)
    }
}
