//! flagcheck command line.
//!
//! ```bash
//! flagcheck deploy --region us-west-2 --manifest deploy.yaml --bucket artifacts
//! flagcheck rules
//! ```
//!
//! `deploy` validates its flags before anything else runs. Every Error-level
//! problem is reported in one go and the process exits with
//! [`EXIT_VALIDATION`]; warnings and notices go to stderr and the command
//! carries on.

pub mod bridge;
pub mod config;
pub mod deploy;
pub mod groups;
pub mod output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{ArgMatches, CommandFactory, Parser};
use flagcheck_kernel::{DiagnosticSink, PatternError, TracingSink, ValidationError};

use crate::config::CliConfig;
use crate::deploy::{Deployment, PrintPlan};
use crate::output::Output;

/// Exit status when flag validation fails.
pub const EXIT_VALIDATION: u8 = 2;
/// Exit status for any other failure.
pub const EXIT_FAILURE: u8 = 1;

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "flagcheck", version, about = "Pre-flight flag validation for deploys")]
pub struct Cli {
    /// Config file [default: $FLAGCHECK_CONFIG, then $XDG_CONFIG_HOME/flagcheck/config.toml]
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// The full command tree.
pub fn command() -> Result<clap::Command, PatternError> {
    let deploy = Deployment::new(&CliConfig::default(), Arc::new(TracingSink))?;
    Ok(Cli::command()
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(bridge::command(deploy.spec()))
        .subcommand(clap::Command::new("rules").about("List the checks `deploy` runs")))
}

/// Exit status for an error returned by [`App::run`].
pub fn exit_code(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<ValidationError>().is_some() {
        EXIT_VALIDATION
    } else {
        EXIT_FAILURE
    }
}

/// A configured flagcheck, ready to dispatch parsed arguments.
#[derive(Debug)]
pub struct App {
    deployment: Deployment,
    out: Output,
}

impl App {
    pub fn new(
        config: &CliConfig,
        sink: Arc<dyn DiagnosticSink>,
        out: Output,
    ) -> Result<Self, PatternError> {
        Ok(Self::from_parts(Deployment::new(config, sink)?, out))
    }

    pub fn from_parts(deployment: Deployment, out: Output) -> Self {
        Self { deployment, out }
    }

    pub fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    /// Run the subcommand selected in `matches` (from [`command`]).
    pub async fn run(&self, matches: &ArgMatches) -> anyhow::Result<()> {
        match matches.subcommand() {
            Some((deploy::NAME, sub)) => {
                let flags = self
                    .deployment
                    .flags(sub)
                    .context("failed to read deploy flags")?;
                self.deployment
                    .run(flags, PrintPlan::new(self.out.clone()))
                    .await
            }
            Some(("rules", _)) => {
                for line in self.deployment.rule_listing() {
                    self.out.line(&line)?;
                }
                Ok(())
            }
            Some((other, _)) => bail!("unknown command: {other}"),
            None => bail!("no command given"),
        }
    }
}
