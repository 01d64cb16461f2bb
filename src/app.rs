use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::interfaces::cli::{execute, Cli};

/// Entry point of the `csvloop` binary.
///
/// A `.env` file in the working directory is loaded before anything else.
/// Logs go to stderr (`RUST_LOG`, default `info`); command output to stdout.
pub fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(cli, &mut out)
}
