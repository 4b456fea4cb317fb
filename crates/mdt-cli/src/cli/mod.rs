//! CLI for the MDT media download & transcode shell.

mod commands;
mod interrupts;
mod prompt;
mod shell;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use mdt_core::backend::{Backends, Ffmpeg, YtDlp};
use mdt_core::config;
use mdt_core::JobManager;

use shell::Shell;

/// Top-level CLI for the MDT shell.
#[derive(Debug, Parser)]
#[command(name = "mdt", version)]
#[command(about = "MDT: interactive shell for concurrent media download & transcode jobs", long_about = None)]
pub struct Cli {
    /// Working directory to start the shell in.
    pub directory: Option<PathBuf>,
}

impl Cli {
    pub async fn run_from_args() -> Result<()> {
        Cli::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)
                .with_context(|| format!("cannot change directory to {}", dir.display()))?;
        }
        let cfg = config::load_or_init()?.with_env_overrides();
        tracing::debug!("loaded config: {:?}", cfg);

        let ytdlp = Arc::new(YtDlp::from_config(&cfg));
        let backends = Backends::new(ytdlp.clone(), Arc::new(Ffmpeg::from_config(&cfg)));
        let router = commands::router();

        let mut shell = Shell::new(JobManager::new(backends), cfg, ytdlp, router.describe());
        shell.run(&router).await
    }
}

#[cfg(test)]
mod tests;
