//! The `deploy` command.
//!
//! ```text
//!  argv ──bridge──▶ FlagSet ──▶ Traced ──▶ FlagValidation ──▶ PrintPlan
//!                                              │
//!                    env region ─┐             │ Error: stop, exit 2
//!                 config defaults│             │ Warning/Info: stderr
//!               declared defaults├─▶ preprocess▼
//!            lowercase environment┘
//! ```
//!
//! Precedence for a flag's value: command line, then environment, then the
//! config file, then the declared default.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use clap::ArgMatches;
use clap::parser::MatchesError;
use flagcheck_kernel::{
    Chain, CommandSpec, DiagnosticSink, EnvDefault, FlagGroup, FlagSet, FlagSpec, FlagValidation,
    FnRule, Handler, Invocation, Normalize, PatternError, RuleError, Severity, StaticDefaults,
    Traced, ValidationContext, Validator,
};
use serde::Serialize;

use crate::bridge;
use crate::config::CliConfig;
use crate::groups::{CredentialsGroup, ManifestGroup, StorageGroup, TargetGroup};
use crate::output::Output;

pub const NAME: &str = "deploy";
pub const ABOUT: &str = "Validate deploy flags and print the resolved plan";

/// Environment variables consulted for `--region`, in order.
pub const REGION_ENV: [&str; 2] = ["AWS_REGION", "AWS_DEFAULT_REGION"];

/// The groups `deploy` is built from, in evaluation order.
pub fn groups() -> Result<Vec<Arc<dyn FlagGroup>>, PatternError> {
    Ok(vec![
        Arc::new(TargetGroup::new()),
        Arc::new(ManifestGroup::new()),
        Arc::new(CredentialsGroup),
        Arc::new(StorageGroup::new()?),
    ])
}

/// Flag declarations of `deploy`: every flag of the validator's groups, then
/// `--dry-run`.
pub fn command_spec(validator: &Validator) -> CommandSpec {
    let mut spec = CommandSpec::new(NAME, ABOUT);
    validator.register_flags(&mut spec);
    spec.add_flag(
        FlagSpec::bool("dry-run", "Validate and print the plan; deploy nothing").with_short('n'),
    );
    spec
}

/// Replacement for the process environment.
pub type EnvLookup = dyn Fn(&str) -> Option<String> + Send + Sync;

/// Everything needed to validate and run `deploy`.
#[derive(Debug)]
pub struct Deployment {
    spec: CommandSpec,
    validator: Arc<Validator>,
}

impl Deployment {
    pub fn new(config: &CliConfig, sink: Arc<dyn DiagnosticSink>) -> Result<Self, PatternError> {
        Self::with_env(config, sink, Arc::new(|var: &str| std::env::var(var).ok()))
    }

    /// Like [`Deployment::new`] with a replacement for the process environment.
    pub fn with_env(
        config: &CliConfig,
        sink: Arc<dyn DiagnosticSink>,
        env: Arc<EnvLookup>,
    ) -> Result<Self, PatternError> {
        let mut validator = Validator::with_sink(sink);
        for group in groups()? {
            validator.add_group_arc(group);
        }
        let spec = command_spec(&validator);

        let region_from_env =
            EnvDefault::new("region", REGION_ENV).with_lookup(move |var: &str| (*env)(var));
        validator
            .add_preprocessor(region_from_env)
            .add_preprocessor(config.defaults_preprocessor())
            .add_preprocessor(StaticDefaults::declared(&spec))
            .add_preprocessor(Normalize::lowercase("environment"))
            .add_rule(dry_run_notice());

        Ok(Self {
            spec,
            validator: Arc::new(validator),
        })
    }

    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Parsed `deploy` matches as a flag set.
    pub fn flags(&self, matches: &ArgMatches) -> Result<FlagSet, MatchesError> {
        bridge::flag_set(&self.spec, matches)
    }

    /// `body` behind tracing and validation.
    pub fn chain(&self, body: impl Handler + 'static) -> Chain {
        Chain::new(body)
            .with(Traced)
            .with(FlagValidation::new(self.validator.clone()))
    }

    pub async fn run(&self, flags: FlagSet, body: impl Handler + 'static) -> anyhow::Result<()> {
        let context = ValidationContext::for_command(NAME).with_operation(self.operation(&flags));
        self.chain(body)
            .call(&mut Invocation::new(flags, context))
            .await
    }

    /// `plan` for a dry run, `apply` otherwise, judged on the flags as
    /// preprocessing will leave them.
    fn operation(&self, flags: &FlagSet) -> &'static str {
        let ctx = ValidationContext::for_command(NAME);
        let mut resolved = flags.clone();
        for step in self.validator.preprocessors() {
            // Validation reports the failure.
            if step.process(&ctx, &mut resolved).is_err() {
                break;
            }
        }
        if resolved.bool("dry-run") { "plan" } else { "apply" }
    }

    /// One line per rule: severity, then description.
    pub fn rule_listing(&self) -> Vec<String> {
        self.validator
            .rules()
            .iter()
            .map(|rule| format!("{:<7}  {}", rule.severity().as_str(), rule.description()))
            .collect()
    }
}

fn dry_run_notice() -> FnRule {
    FnRule::new("notice when --dry-run is set", Severity::Info, |_, flags| {
        if flags.bool("dry-run") {
            return Err(RuleError::custom(
                "dry run: the plan is printed and nothing is deployed",
            ));
        }
        Ok(())
    })
}

/// How the deploy authenticates. Secrets are never part of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Credentials {
    Profile { name: String },
    AccessKey { id: String },
    /// Whatever the environment provides.
    Ambient,
}

/// The resolved deployment, as printed by `deploy`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeployPlan {
    pub region: String,
    pub environment: String,
    pub manifest: PathBuf,
    /// `bucket/prefix<manifest file name>`.
    pub destination: String,
    pub credentials: Credentials,
    pub dry_run: bool,
    /// Where each set flag's value came from.
    pub sources: BTreeMap<String, String>,
}

impl DeployPlan {
    pub fn from_flags(flags: &FlagSet) -> Self {
        let manifest = PathBuf::from(flags.string("manifest"));
        let file_name = manifest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let credentials = if !flags.is_empty("profile") {
            Credentials::Profile {
                name: flags.string("profile"),
            }
        } else if !flags.is_empty("access-key") {
            Credentials::AccessKey {
                id: flags.string("access-key"),
            }
        } else {
            Credentials::Ambient
        };

        let sources = flags
            .names()
            .into_iter()
            .filter(|name| *name != "secret-key")
            .filter_map(|name| flags.source(name).map(|s| (name.to_string(), s.to_string())))
            .collect();

        Self {
            region: flags.string("region"),
            environment: flags.string("environment"),
            destination: format!(
                "{}/{}{file_name}",
                flags.string("bucket"),
                flags.string("prefix")
            ),
            manifest,
            credentials,
            dry_run: flags.bool("dry-run"),
            sources,
        }
    }

    pub fn manifest(&self) -> &Path {
        &self.manifest
    }
}

/// Command body: print the plan as JSON.
#[derive(Debug, Clone, Default)]
pub struct PrintPlan {
    out: Output,
}

impl PrintPlan {
    pub fn new(out: Output) -> Self {
        Self { out }
    }
}

#[async_trait]
impl Handler for PrintPlan {
    async fn call(&self, inv: &mut Invocation) -> anyhow::Result<()> {
        let plan = DeployPlan::from_flags(&inv.flags);
        tracing::info!(
            region = %plan.region,
            environment = %plan.environment,
            dry_run = plan.dry_run,
            "deploy plan resolved"
        );
        self.out.line(&serde_json::to_string_pretty(&plan)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use flagcheck_kernel::{FlagValue, MemorySink};

    fn deployment(config: &CliConfig) -> Deployment {
        let no_env = |_: &str| -> Option<String> { None };
        Deployment::with_env(config, Arc::new(MemorySink::new()), Arc::new(no_env)).unwrap()
    }

    #[test]
    fn spec_declares_every_group_flag_and_dry_run() {
        let d = deployment(&CliConfig::default());
        assert_eq!(
            d.spec().names().collect::<Vec<_>>(),
            vec![
                "region",
                "environment",
                "manifest",
                "profile",
                "access-key",
                "secret-key",
                "bucket",
                "prefix",
                "dry-run",
            ]
        );
    }

    #[test]
    fn operation_follows_resolved_dry_run() {
        let d = deployment(&CliConfig::default());
        assert_eq!(d.operation(&FlagSet::new()), "apply");
        assert_eq!(d.operation(&FlagSet::new().with("dry-run", true)), "plan");

        let config = CliConfig {
            defaults: BTreeMap::from([("dry-run".to_string(), FlagValue::from(true))]),
            ..CliConfig::default()
        };
        assert_eq!(deployment(&config).operation(&FlagSet::new()), "plan");
    }

    #[test]
    fn plan_prefers_profile_and_hides_secrets() {
        let flags = FlagSet::new()
            .with("region", "us-west-2")
            .with("environment", "prod")
            .with("manifest", "deploy/api.yaml")
            .with("bucket", "artifacts")
            .with("prefix", "releases/")
            .with("profile", "ops")
            .with("secret-key", "s3cr3t");
        let plan = DeployPlan::from_flags(&flags);

        assert_eq!(plan.destination, "artifacts/releases/api.yaml");
        assert_eq!(
            plan.credentials,
            Credentials::Profile {
                name: "ops".into()
            }
        );
        assert!(!plan.sources.contains_key("secret-key"));
        assert_eq!(plan.sources["region"], "command-line");

        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["credentials"]["kind"], "profile");
        assert!(!json.to_string().contains("s3cr3t"));
    }

    #[test]
    fn plan_without_credentials_is_ambient() {
        let plan = DeployPlan::from_flags(&FlagSet::new().with("access-key", ""));
        assert_eq!(plan.credentials, Credentials::Ambient);
        assert_eq!(plan.manifest(), Path::new(""));
    }
}
