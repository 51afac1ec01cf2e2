//! Flag groups of the `deploy` command.
//!
//! | Group | Flags | Checks |
//! |-------|-------|--------|
//! | [`TargetGroup`] | `--region`, `--environment` | region present and well-formed, known environment |
//! | [`ManifestGroup`] | `--manifest` | present, exists on disk, YAML extension (warning) |
//! | [`CredentialsGroup`] | `--profile`, `--access-key`, `--secret-key` | profile xor keys, keys come in pairs |
//! | [`StorageGroup`] | `--bucket`, `--prefix` | bucket present and well-named, relative prefix (warning) |

use std::sync::Arc;

use flagcheck_kernel::{
    CommandSpec, Conflict, Dependency, FileExists, FileExtension, FlagGroup, FlagSpec, FnRule,
    Pattern, PatternError, RegionFormat, Required, Rule, RuleError, Severity,
};

/// Where the deploy goes.
#[derive(Debug, Clone)]
pub struct TargetGroup {
    environments: Vec<String>,
}

impl TargetGroup {
    pub fn new() -> Self {
        Self::with_environments(["dev", "staging", "prod"])
    }

    pub fn with_environments<I, S>(environments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            environments: environments.into_iter().map(Into::into).collect(),
        }
    }

    fn known_environment(&self) -> FnRule {
        let known = self.environments.clone();
        FnRule::new(
            format!("--environment must be one of {}", known.join(", ")),
            Severity::Error,
            move |_, flags| {
                let env = flags.string("environment");
                if env.is_empty() || known.contains(&env) {
                    return Ok(());
                }
                Err(RuleError::custom(format!(
                    "--environment: unknown environment {env:?} (expected one of {})",
                    known.join(", ")
                )))
            },
        )
    }
}

impl Default for TargetGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl FlagGroup for TargetGroup {
    fn name(&self) -> &str {
        "target"
    }

    fn rules(&self) -> Vec<Arc<dyn Rule>> {
        vec![
            Arc::new(Required::flag("region")),
            Arc::new(RegionFormat::flag("region")),
            Arc::new(self.known_environment()),
        ]
    }

    fn register_flags(&self, target: &mut CommandSpec) {
        target.add_flag(
            FlagSpec::string("region", "Region to deploy into, e.g. us-west-2").with_short('r'),
        );
        target.add_flag(
            FlagSpec::string("environment", "Target environment")
                .with_short('e')
                .with_default("staging"),
        );
    }
}

/// The deployment manifest.
#[derive(Debug, Clone)]
pub struct ManifestGroup {
    extensions: Vec<String>,
}

impl ManifestGroup {
    pub fn new() -> Self {
        Self {
            extensions: vec![".yaml".into(), ".yml".into()],
        }
    }
}

impl Default for ManifestGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl FlagGroup for ManifestGroup {
    fn name(&self) -> &str {
        "manifest"
    }

    fn rules(&self) -> Vec<Arc<dyn Rule>> {
        vec![
            Arc::new(Required::flag("manifest")),
            Arc::new(FileExists::flag("manifest")),
            Arc::new(FileExtension::flag("manifest", &self.extensions)),
        ]
    }

    fn register_flags(&self, target: &mut CommandSpec) {
        target.add_flag(FlagSpec::string("manifest", "Path to the deployment manifest").with_short('m'));
    }
}

/// How the deploy authenticates: a named profile or an explicit key pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialsGroup;

impl FlagGroup for CredentialsGroup {
    fn name(&self) -> &str {
        "credentials"
    }

    fn rules(&self) -> Vec<Arc<dyn Rule>> {
        vec![
            Arc::new(Conflict::flags(["profile", "access-key"])),
            Arc::new(Dependency::flags("access-key", ["secret-key"])),
            Arc::new(Dependency::flags("secret-key", ["access-key"])),
            Arc::new(FnRule::new(
                "--secret-key should not be passed on the command line",
                Severity::Warning,
                |_, flags| {
                    if flags.changed("secret-key") {
                        return Err(RuleError::custom(
                            "--secret-key on the command line is saved in shell history; prefer --profile",
                        ));
                    }
                    Ok(())
                },
            )),
        ]
    }

    fn register_flags(&self, target: &mut CommandSpec) {
        target.add_flag(FlagSpec::string("profile", "Named credentials profile").with_short('p'));
        target.add_flag(FlagSpec::string("access-key", "Access key id"));
        target.add_flag(FlagSpec::string("secret-key", "Secret access key"));
    }
}

/// Bucket names: lowercase letters, digits, dots and dashes, 3 to 63 long.
const BUCKET_PATTERN: &str = r"^[a-z0-9][a-z0-9.-]{1,61}[a-z0-9]$";

/// Where artifacts are uploaded.
#[derive(Debug, Clone)]
pub struct StorageGroup {
    bucket_name: Arc<Pattern>,
    relative_prefix: Arc<Pattern>,
}

impl StorageGroup {
    pub fn new() -> Result<Self, PatternError> {
        Ok(Self {
            bucket_name: Arc::new(
                Pattern::flag("bucket", BUCKET_PATTERN)?
                    .with_description("--bucket must be a valid bucket name"),
            ),
            relative_prefix: Arc::new(
                Pattern::flag("prefix", "^[^/]")?
                    .with_severity(Severity::Warning)
                    .with_description("--prefix should not start with /"),
            ),
        })
    }
}

impl FlagGroup for StorageGroup {
    fn name(&self) -> &str {
        "storage"
    }

    fn rules(&self) -> Vec<Arc<dyn Rule>> {
        vec![
            Arc::new(Required::flag("bucket")),
            self.bucket_name.clone(),
            self.relative_prefix.clone(),
        ]
    }

    fn register_flags(&self, target: &mut CommandSpec) {
        target.add_flag(FlagSpec::string("bucket", "Artifact bucket").with_short('b'));
        target.add_flag(FlagSpec::string("prefix", "Key prefix inside the bucket"));
    }
}
