use scanflow_core::logging;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    // The terminal holds job rows; logs go to the state dir unless that fails.
    if let Err(err) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("log file unavailable, logging to stderr: {:#}", err);
    }

    if let Err(err) = CliCommand::run_from_args().await {
        eprintln!("scanflow error: {:#}", err);
        std::process::exit(1);
    }
}
