//! `add <source> [destination...]` – probe the source, ask for options, start a job.

use std::path::PathBuf;

use anyhow::{bail, Result};
use async_trait::async_trait;
use mdt_core::options::{default_audio_only, default_destination, suggestion_words, JobOptions, TrimRange};
use mdt_core::router::Handler;
use mdt_core::Flow;

use crate::cli::prompt::{self, Cancelled, OptionChoice};
use crate::cli::shell::Shell;

const OPTIONS_PROMPT: &str = "add options (? for help, empty for done):\n> ";

pub struct Add;

#[async_trait]
impl Handler<Shell> for Add {
    fn description(&self) -> &str {
        "Start a download job"
    }

    async fn run(&self, ctx: &mut Shell, args: &[String]) -> Result<Flow> {
        let Some((source, rest)) = args.split_first() else {
            bail!("expected a source, got 0 arguments");
        };
        let destination = (!rest.is_empty()).then(|| rest.join(" "));

        match build_options(ctx, source, destination).await {
            Ok(options) => {
                let job = ctx.jobs.add(options.into_spec(source.as_str()));
                println!("started {}", job.name());
                Ok(Flow::Continue)
            }
            Err(err) if err.is::<Cancelled>() => {
                println!("add cancelled");
                Ok(Flow::Continue)
            }
            Err(err) => Err(err),
        }
    }
}

async fn build_options(
    ctx: &mut Shell,
    source: &str,
    destination: Option<String>,
) -> Result<JobOptions> {
    println!("fetching metadata for {} ...", source);
    let info = prompt::probe(&ctx.probe, &mut ctx.interrupts, source).await?;
    tracing::debug!(source, ?info, "probed source");

    let audio_only = prompt::confirm(ctx, "audio only?", default_audio_only(&info)).await?;
    let destination = match destination {
        Some(dest) => dest,
        None => {
            let words = suggestion_words(&info);
            if !words.is_empty() {
                println!("words from the title: {}", words.join(" "));
            }
            let default = default_destination(&info, audio_only);
            prompt::ask_with_default(ctx, "enter destination path:", &default).await?
        }
    };

    let mut options = JobOptions::new(&info, audio_only, Some(PathBuf::from(destination)));
    loop {
        let answer = prompt::ask(ctx, OPTIONS_PROMPT).await?;
        match OptionChoice::parse(&answer) {
            OptionChoice::Done => break,
            OptionChoice::Help => prompt::print_option_help(),
            OptionChoice::Trim => {
                let start = prompt::ask_timestamp(ctx, "enter timestamp for start of capture: ").await?;
                let end = prompt::ask_timestamp(ctx, "enter timestamp for end of capture: ").await?;
                options.add_trim(&TrimRange::new(start.as_deref(), end.as_deref())?);
            }
            OptionChoice::Unknown(other) => println!("unknown option '{}', ? lists them", other),
        }
    }
    Ok(options)
}
