//! flagcheck entry point.
//!
//! ```bash
//! flagcheck deploy -r us-west-2 -m deploy.yaml -b artifacts --dry-run
//! RUST_LOG=flagcheck=debug flagcheck deploy ...
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::FromArgMatches;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use flagcheck_cli::config::CliConfig;
use flagcheck_cli::output::Output;
use flagcheck_cli::{App, Cli};
use flagcheck_kernel::ConsoleSink;

const DEFAULT_LOG_FILTER: &str = "flagcheck=warn";

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(flagcheck_cli::exit_code(&err))
        }
    }
}

async fn run() -> Result<()> {
    let matches = match flagcheck_cli::command()?.try_get_matches() {
        Ok(matches) => matches,
        Err(e) => e.exit(),
    };
    let cli = Cli::from_arg_matches(&matches)?;
    let config = CliConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    // RUST_LOG wins over the config file.
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER))
            .context("invalid log_filter in configuration")?,
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let app = App::new(&config, Arc::new(ConsoleSink::stderr()), Output::Stdout)?;
    tracing::debug!(?app, "starting");
    app.run(&matches).await
}
