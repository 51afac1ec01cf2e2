//! End-to-end tests for the flagcheck command line.
//!
//! Each test parses real argv through the full command tree and runs the
//! selected subcommand with captured output and diagnostics.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use flagcheck_cli::config::CliConfig;
use flagcheck_cli::deploy::Deployment;
use flagcheck_cli::output::Output;
use flagcheck_cli::{App, EXIT_FAILURE, EXIT_VALIDATION, command, exit_code};
use flagcheck_kernel::{FlagValue, MemorySink, ValidationError};
use rstest::rstest;
use serde_json::Value;

struct Harness {
    app: App,
    out: Output,
    sink: Arc<MemorySink>,
    dir: tempfile::TempDir,
}

impl Harness {
    fn new() -> Self {
        Self::with(CliConfig::default(), &[])
    }

    fn with(config: CliConfig, env: &[(&str, &str)]) -> Self {
        let env: BTreeMap<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let sink = Arc::new(MemorySink::new());
        let out = Output::buffer();
        let deployment = Deployment::with_env(
            &config,
            sink.clone(),
            Arc::new(move |var: &str| env.get(var).cloned()),
        )
        .unwrap();
        Self {
            app: App::from_parts(deployment, out.clone()),
            out,
            sink,
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn manifest(&self, name: &str) -> String {
        let path: PathBuf = self.dir.path().join(name);
        std::fs::write(&path, "service: api\n").unwrap();
        path.display().to_string()
    }

    async fn run(&self, args: &[&str]) -> anyhow::Result<()> {
        let matches = command()
            .unwrap()
            .try_get_matches_from(std::iter::once("flagcheck").chain(args.iter().copied()))
            .unwrap();
        self.app.run(&matches).await
    }

    fn plan(&self) -> Value {
        serde_json::from_str(&self.out.contents()).unwrap()
    }
}

// ============================================================================
// deploy: valid invocations run and print a plan
// ============================================================================

#[tokio::test]
async fn valid_deploy_prints_the_plan() {
    let h = Harness::new();
    let manifest = h.manifest("api.yaml");

    h.run(&[
        "deploy",
        "-r",
        "us-west-2",
        "-m",
        &manifest,
        "-b",
        "release-artifacts",
        "--prefix",
        "api/",
        "--profile",
        "ops",
    ])
    .await
    .unwrap();

    let plan = h.plan();
    assert_eq!(plan["region"], "us-west-2");
    assert_eq!(plan["environment"], "staging");
    assert_eq!(plan["destination"], "release-artifacts/api/api.yaml");
    assert_eq!(plan["credentials"]["kind"], "profile");
    assert_eq!(plan["dry_run"], false);
    assert_eq!(plan["sources"]["region"], "command-line");
    assert_eq!(plan["sources"]["environment"], "default");
    assert!(h.sink.messages().is_empty());
}

#[tokio::test]
async fn wrong_extension_warns_but_deploys() {
    let h = Harness::new();
    let manifest = h.manifest("api.json");

    h.run(&["deploy", "-r", "eu-west-1", "-m", &manifest, "-b", "artifacts"])
        .await
        .unwrap();

    assert_eq!(h.plan()["region"], "eu-west-1");
    let warnings = h.sink.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("--manifest"), "{warnings:?}");
}

#[tokio::test]
async fn dry_run_emits_a_notice() {
    let h = Harness::new();
    let manifest = h.manifest("api.yml");

    h.run(&["deploy", "-r", "us-east-1", "-m", &manifest, "-b", "artifacts", "-n"])
        .await
        .unwrap();

    assert_eq!(h.plan()["dry_run"], true);
    assert_eq!(
        h.sink.infos(),
        vec!["dry run: the plan is printed and nothing is deployed"]
    );
}

// ============================================================================
// deploy: preprocessing fills and normalises flags
// ============================================================================

#[tokio::test]
async fn region_falls_back_to_environment_variables() {
    let h = Harness::with(CliConfig::default(), &[("AWS_DEFAULT_REGION", "ap-southeast-2")]);
    let manifest = h.manifest("api.yaml");

    h.run(&["deploy", "-m", &manifest, "-b", "artifacts"])
        .await
        .unwrap();

    let plan = h.plan();
    assert_eq!(plan["region"], "ap-southeast-2");
    assert_eq!(plan["sources"]["region"], "environment");
}

#[tokio::test]
async fn config_defaults_fill_gaps_but_never_override() {
    let config = CliConfig {
        defaults: BTreeMap::from([
            ("bucket".to_string(), FlagValue::from("config-bucket")),
            ("region".to_string(), FlagValue::from("us-east-2")),
        ]),
        ..CliConfig::default()
    };
    let h = Harness::with(config, &[("AWS_REGION", "eu-north-1")]);
    let manifest = h.manifest("api.yaml");

    h.run(&["deploy", "-m", &manifest, "-b", "cli-bucket"])
        .await
        .unwrap();

    let plan = h.plan();
    assert_eq!(plan["destination"], "cli-bucket/api.yaml");
    assert_eq!(plan["sources"]["bucket"], "command-line");
    // Environment beats the config file.
    assert_eq!(plan["region"], "eu-north-1");
}

#[tokio::test]
async fn config_default_beats_declared_default() {
    let config = CliConfig {
        defaults: BTreeMap::from([("environment".to_string(), FlagValue::from("PROD"))]),
        ..CliConfig::default()
    };
    let h = Harness::with(config, &[]);
    let manifest = h.manifest("api.yaml");

    h.run(&["deploy", "-r", "us-west-2", "-m", &manifest, "-b", "artifacts"])
        .await
        .unwrap();

    let plan = h.plan();
    assert_eq!(plan["environment"], "prod");
    assert_eq!(plan["sources"]["environment"], "config");
}

#[tokio::test]
async fn environment_name_is_normalised_before_checking() {
    let h = Harness::new();
    let manifest = h.manifest("api.yaml");

    h.run(&["deploy", "-r", "us-west-2", "-m", &manifest, "-b", "artifacts", "-e", " PROD "])
        .await
        .unwrap();

    let plan = h.plan();
    assert_eq!(plan["environment"], "prod");
    assert_eq!(plan["sources"]["environment"], "command-line");
}

// ============================================================================
// deploy: validation failures stop the command
// ============================================================================

#[tokio::test]
async fn bare_deploy_reports_every_missing_flag() {
    let h = Harness::new();
    let err = h.run(&["deploy"]).await.unwrap_err();

    assert_eq!(exit_code(&err), EXIT_VALIDATION);
    let message = err.to_string();
    assert!(message.starts_with("validation failed with 3 errors:"), "{message}");
    for flag in ["--region", "--manifest", "--bucket"] {
        assert!(message.contains(&format!("{flag} is required")), "{message}");
    }
    assert!(h.out.contents().is_empty(), "plan must not be printed");
}

#[rstest]
#[case::bad_region(&["-r", "west"], "not a valid region")]
#[case::unknown_environment(&["-r", "us-west-2", "-e", "qa"], "unknown environment")]
#[case::profile_and_keys(
    &["-r", "us-west-2", "--profile", "ops", "--access-key", "AKIA1", "--secret-key", "x"],
    "--profile, --access-key cannot be used together"
)]
#[case::key_without_secret(&["-r", "us-west-2", "--access-key", "AKIA1"], "--access-key requires --secret-key")]
#[case::bad_bucket_name(&["-r", "us-west-2", "-b", "Not_A_Bucket"], "does not match pattern")]
#[tokio::test]
async fn invalid_flags_are_blocked(#[case] extra: &[&str], #[case] expected: &str) {
    let h = Harness::new();
    let manifest = h.manifest("api.yaml");
    let mut args = vec!["deploy", "-m", manifest.as_str()];
    if !extra.contains(&"-b") {
        args.extend(["-b", "artifacts"]);
    }
    args.extend_from_slice(extra);

    let err = h.run(&args).await.unwrap_err();

    assert!(err.downcast_ref::<ValidationError>().is_some());
    assert!(err.to_string().contains(expected), "{err}");
    assert!(h.out.contents().is_empty());
}

#[tokio::test]
async fn missing_manifest_file_is_fatal() {
    let h = Harness::new();
    let missing = h.dir.path().join("gone.yaml").display().to_string();

    let err = h
        .run(&["deploy", "-r", "us-west-2", "-m", &missing, "-b", "artifacts"])
        .await
        .unwrap_err();

    assert_eq!(exit_code(&err), EXIT_VALIDATION);
    assert!(err.to_string().contains("does not exist"));
}

// ============================================================================
// rules and misc
// ============================================================================

#[tokio::test]
async fn rules_lists_every_check_with_its_severity() {
    let h = Harness::new();
    h.run(&["rules"]).await.unwrap();

    let listing = h.out.contents();
    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(lines.len(), h.app.deployment().validator().rules().len());
    assert!(lines.contains(&"error    --region is required"));
    assert!(lines
        .iter()
        .any(|l| l.starts_with("warning") && l.contains("--manifest should have extension")));
    assert!(lines.iter().any(|l| l.starts_with("info")));
}

#[test]
fn other_errors_exit_with_one() {
    let err = anyhow::anyhow!("disk full");
    assert_eq!(exit_code(&err), EXIT_FAILURE);
}

#[test]
fn usage_errors_come_from_clap() {
    let err = command()
        .unwrap()
        .try_get_matches_from(["flagcheck", "deploy", "--no-such-flag"])
        .unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
}
