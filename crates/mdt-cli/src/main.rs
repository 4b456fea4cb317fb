use mdt_core::logging;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    // The log file keeps the interactive terminal clean; stderr is the fallback.
    if let Err(err) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable: {:#}", err);
    }

    if let Err(err) = Cli::run_from_args().await {
        eprintln!("mdt error: {:#}", err);
        std::process::exit(1);
    }
}
