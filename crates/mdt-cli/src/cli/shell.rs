//! The interactive loop and the context every command handler receives.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use mdt_core::backend::MetadataProbe;
use mdt_core::config::MdtConfig;
use mdt_core::router::DispatchError;
use mdt_core::{CommandRouter, Flow, JobManager};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

use super::interrupts::Interrupts;

const PROMPT: &str = "enter a command:\n- ";

const STILL_RUNNING: &str = "some jobs are still running. To exit safely use the \"exit\" command; \
     to exit immediately press Ctrl-C again or use \"exit force\"";

pub type InputReader = Box<dyn AsyncBufRead + Send + Unpin>;

/// Shell state shared by all commands: the job registry plus what the
/// commands need to build and display jobs.
pub struct Shell {
    pub jobs: JobManager,
    pub config: MdtConfig,
    pub probe: Arc<dyn MetadataProbe>,
    /// `(name, description)` of every command, sorted.
    pub help: Vec<(String, String)>,
    /// Ctrl-C presses; commands that can be interrupted wait on this.
    pub interrupts: Interrupts,
    input: Lines<InputReader>,
}

/// What the user did at a prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    Line(String),
    Eof,
    Interrupt,
}

impl Shell {
    pub fn new(
        jobs: JobManager,
        config: MdtConfig,
        probe: Arc<dyn MetadataProbe>,
        help: Vec<(String, String)>,
    ) -> Self {
        let stdin: InputReader = Box::new(BufReader::new(tokio::io::stdin()));
        Self::with_io(jobs, config, probe, help, stdin, Interrupts::listen())
    }

    pub fn with_io(
        jobs: JobManager,
        config: MdtConfig,
        probe: Arc<dyn MetadataProbe>,
        help: Vec<(String, String)>,
        input: InputReader,
        interrupts: Interrupts,
    ) -> Self {
        Self {
            jobs,
            config,
            probe,
            help,
            interrupts,
            input: input.lines(),
        }
    }

    /// Print `prompt` and wait for a line, end of input, or Ctrl-C. A press
    /// queued while a command ran wins over pending input.
    pub async fn next_input(&mut self, prompt: &str) -> Result<Input> {
        print!("{}", prompt);
        std::io::stdout().flush().context("writing prompt")?;
        tokio::select! {
            biased;
            _ = self.interrupts.next() => Ok(Input::Interrupt),
            line = self.input.next_line() => {
                Ok(match line.context("reading input")? {
                    Some(line) => Input::Line(line),
                    None => Input::Eof,
                })
            }
        }
    }

    /// Read and dispatch commands until `exit`, end of input, or an
    /// interrupt that is allowed to end the session.
    pub async fn run(&mut self, router: &CommandRouter<Shell>) -> Result<()> {
        let mut interrupt_attempted = false;
        loop {
            match self.next_input(PROMPT).await? {
                Input::Eof => {
                    println!();
                    tracing::info!("end of input");
                    return self.finish_on_eof().await;
                }
                Input::Line(line) => {
                    interrupt_attempted = false;
                    if let Flow::Exit = self.execute(router, &line).await {
                        tracing::info!("session ended by command");
                        return Ok(());
                    }
                }
                Input::Interrupt => {
                    println!();
                    let running = self.jobs.running_count();
                    if interrupt_attempted || running == 0 {
                        tracing::info!(running, "session interrupted");
                        return Ok(());
                    }
                    interrupt_attempted = true;
                    println!("{}", STILL_RUNNING);
                }
            }
        }
    }

    async fn execute(&mut self, router: &CommandRouter<Shell>, line: &str) -> Flow {
        let tokens = tokenize(line);
        match router.dispatch(self, &tokens).await {
            Ok(flow) => flow,
            Err(DispatchError::NotFound { .. }) => {
                println!("command not found");
                Flow::Continue
            }
            Err(_) => {
                println!("error when running command (details in the log)");
                Flow::Continue
            }
        }
    }

    /// End of input behaves like `exit`: wait for running jobs, then leave.
    async fn finish_on_eof(&self) -> Result<()> {
        let interval = self.config.exit_poll_interval();
        self.jobs.wait_until_idle(interval, report_waiting).await;
        Ok(())
    }
}

/// Split a command line into whitespace-separated tokens.
pub fn tokenize(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

/// Progress line shown while waiting for jobs to finish.
pub fn report_waiting(running: usize) {
    print!("\rwaiting for running jobs, {} left...", running);
    let _ = std::io::stdout().flush();
}
