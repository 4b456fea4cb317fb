//! Interactive questions asked while building a job.
//!
//! Every prompt can be abandoned with Ctrl-C or end of input, which surfaces
//! as a [`Cancelled`] error so the caller can back out without adding a job.

use std::sync::Arc;

use anyhow::{Context, Result};
use mdt_core::backend::{MediaInfo, MetadataProbe};
use mdt_core::options::{is_valid_timestamp, EXTRA_OPTIONS};
use thiserror::Error;

use super::interrupts::Interrupts;
use super::shell::{Input, Shell};

#[derive(Debug, Error)]
#[error("cancelled")]
pub struct Cancelled;

/// One answer to the "add options" question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionChoice {
    Help,
    Done,
    Trim,
    Unknown(String),
}

impl OptionChoice {
    pub fn parse(answer: &str) -> Self {
        match answer.trim() {
            "" => OptionChoice::Done,
            "?" => OptionChoice::Help,
            "trim" => OptionChoice::Trim,
            other => OptionChoice::Unknown(other.to_string()),
        }
    }
}

/// `y`/`yes`/`n`/`no` in any case; an empty answer takes `default`.
pub fn parse_yes_no(answer: &str, default: bool) -> Option<bool> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Ask `question` and return the raw answer.
pub async fn ask(shell: &mut Shell, question: &str) -> Result<String> {
    match shell.next_input(question).await? {
        Input::Line(answer) => Ok(answer),
        Input::Eof => Err(Cancelled.into()),
        Input::Interrupt => {
            println!();
            Err(Cancelled.into())
        }
    }
}

pub async fn confirm(shell: &mut Shell, question: &str, default: bool) -> Result<bool> {
    let hint = if default { "[Y/n]" } else { "[y/N]" };
    loop {
        let answer = ask(shell, &format!("{} {} ", question, hint)).await?;
        match parse_yes_no(&answer, default) {
            Some(yes) => return Ok(yes),
            None => println!("please answer y or n"),
        }
    }
}

/// Ask for a value, falling back to `default` on an empty answer.
pub async fn ask_with_default(shell: &mut Shell, question: &str, default: &str) -> Result<String> {
    let answer = ask(shell, &format!("{} [{}]\n> ", question, default)).await?;
    let answer = answer.trim();
    Ok(if answer.is_empty() {
        default.to_string()
    } else {
        answer.to_string()
    })
}

/// Ask for a timestamp until the answer is valid or empty.
pub async fn ask_timestamp(shell: &mut Shell, question: &str) -> Result<Option<String>> {
    loop {
        let answer = ask(shell, question).await?;
        let answer = answer.trim();
        if answer.is_empty() {
            return Ok(None);
        }
        if is_valid_timestamp(answer) {
            return Ok(Some(answer.to_string()));
        }
        println!("timestamp must be of format [[HH:]MM:]SS[.fraction]");
    }
}

pub fn print_option_help() {
    for (name, description) in EXTRA_OPTIONS {
        println!("{}: {}", name, description);
    }
}

/// Run the metadata probe off the async runtime; Ctrl-C abandons the wait.
pub async fn probe(
    probe: &Arc<dyn MetadataProbe>,
    interrupts: &mut Interrupts,
    source: &str,
) -> Result<MediaInfo> {
    let task = {
        let probe = Arc::clone(probe);
        let source = source.to_string();
        tokio::task::spawn_blocking(move || probe.probe(&source))
    };
    tokio::select! {
        joined = task => {
            let info = joined
                .context("metadata probe task failed")?
                .with_context(|| format!("could not fetch metadata for {}", source))?;
            Ok(info)
        }
        _ = interrupts.next() => {
            println!();
            Err(Cancelled.into())
        }
    }
}
