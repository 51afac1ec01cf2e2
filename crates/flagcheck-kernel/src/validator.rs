//! The validator: preprocess, evaluate every rule, aggregate by severity.
//!
//! ```text
//!  preprocessors (in order) ──fail──▶ fatal Preprocess
//!        │
//!        ▼
//!  rules (registration order, no short-circuit)
//!        │
//!        ├── Error   ──▶ RuleFailures (joined, all kept)
//!        ├── Warning ──▶ sink + report.warnings
//!        └── Info    ──▶ sink only
//! ```
//!
//! Registration order is the order of `add_rule` / `add_group` calls, with a
//! group's rules flattened in the group's own order.

use std::fmt;
use std::sync::Arc;

use flagcheck_types::{CommandSpec, Severity};

use crate::context::ValidationContext;
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::error::{RuleFailure, RuleFailures, ValidationError};
use crate::flags::FlagSet;
use crate::group::FlagGroup;
use crate::preprocess::Preprocessor;
use crate::rules::Rule;

/// The outcome of a pass that found something.
///
/// At most one fatal error plus zero or more warning messages. A clean pass
/// produces no report at all.
#[derive(Debug)]
pub struct ValidationReport {
    fatal: Option<ValidationError>,
    warnings: Vec<String>,
}

impl ValidationReport {
    fn fatal(error: ValidationError) -> Self {
        Self {
            fatal: Some(error),
            warnings: Vec::new(),
        }
    }

    /// Whether the command must not run.
    pub fn is_fatal(&self) -> bool {
        self.fatal.is_some()
    }

    pub fn error(&self) -> Option<&ValidationError> {
        self.fatal.as_ref()
    }

    /// Warning messages, in rule-evaluation order.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Split into the fatal error and the warnings.
    pub fn into_parts(self) -> (Option<ValidationError>, Vec<String>) {
        (self.fatal, self.warnings)
    }

    /// `Err` if fatal, otherwise the warnings.
    pub fn into_result(self) -> Result<Vec<String>, ValidationError> {
        match self.fatal {
            Some(err) => Err(err),
            None => Ok(self.warnings),
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.fatal {
            Some(err) => write!(f, "{err}")?,
            None => f.write_str("validation passed")?,
        }
        if !self.warnings.is_empty() {
            write!(f, " ({} warning(s))", self.warnings.len())?;
        }
        Ok(())
    }
}

/// Orchestrates preprocessors and rules for one command.
///
/// Built once during command setup, then read-only: `validate` takes `&self`
/// and may be called any number of times.
pub struct Validator {
    rules: Vec<Arc<dyn Rule>>,
    groups: Vec<Arc<dyn FlagGroup>>,
    preprocessors: Vec<Arc<dyn Preprocessor>>,
    sink: Arc<dyn DiagnosticSink>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// Create an empty validator reporting through `tracing`.
    pub fn new() -> Self {
        Self::with_sink(Arc::new(TracingSink))
    }

    /// Create an empty validator reporting to `sink`.
    pub fn with_sink(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            rules: Vec::new(),
            groups: Vec::new(),
            preprocessors: Vec::new(),
            sink,
        }
    }

    /// Add a rule that belongs to no group.
    pub fn add_rule(&mut self, rule: impl Rule + 'static) -> &mut Self {
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn add_rule_arc(&mut self, rule: Arc<dyn Rule>) -> &mut Self {
        self.rules.push(rule);
        self
    }

    /// Add a group and append its rules to the rule list.
    pub fn add_group(&mut self, group: impl FlagGroup + 'static) -> &mut Self {
        self.add_group_arc(Arc::new(group))
    }

    pub fn add_group_arc(&mut self, group: Arc<dyn FlagGroup>) -> &mut Self {
        let rules = group.rules();
        tracing::debug!(group = group.name(), rules = rules.len(), "adding flag group");
        self.rules.extend(rules);
        self.groups.push(group);
        self
    }

    pub fn add_preprocessor(&mut self, preprocessor: impl Preprocessor + 'static) -> &mut Self {
        self.preprocessors.push(Arc::new(preprocessor));
        self
    }

    pub fn add_preprocessor_arc(&mut self, preprocessor: Arc<dyn Preprocessor>) -> &mut Self {
        self.preprocessors.push(preprocessor);
        self
    }

    /// Let every group declare its flags on `target`.
    pub fn register_flags(&self, target: &mut CommandSpec) {
        for group in &self.groups {
            group.register_flags(target);
        }
    }

    /// All rules, in evaluation order.
    pub fn rules(&self) -> &[Arc<dyn Rule>] {
        &self.rules
    }

    pub fn groups(&self) -> &[Arc<dyn FlagGroup>] {
        &self.groups
    }

    pub fn preprocessors(&self) -> &[Arc<dyn Preprocessor>] {
        &self.preprocessors
    }

    /// Run one validation pass.
    ///
    /// Returns `None` when nothing failed at Error or Warning severity.
    /// Info findings go to the sink only and never produce a report.
    pub fn validate(&self, ctx: &ValidationContext, flags: &mut FlagSet) -> Option<ValidationReport> {
        if ctx.is_cancelled() {
            return Some(ValidationReport::fatal(ValidationError::Cancelled));
        }

        for preprocessor in &self.preprocessors {
            tracing::debug!(step = preprocessor.name(), "preprocessing");
            if let Err(source) = preprocessor.process(ctx, flags) {
                tracing::debug!(step = preprocessor.name(), error = %source, "preprocessing failed");
                return Some(ValidationReport::fatal(ValidationError::Preprocess {
                    step: preprocessor.name().to_string(),
                    source,
                }));
            }
        }

        let flags: &FlagSet = flags;
        let mut errors = RuleFailures::new();
        let mut warnings = Vec::new();

        for rule in &self.rules {
            let Err(error) = rule.validate(ctx, flags) else {
                tracing::trace!(rule = rule.description(), "rule passed");
                continue;
            };
            let severity = rule.severity();
            tracing::debug!(rule = rule.description(), %severity, %error, "rule failed");

            match severity {
                Severity::Error => errors.push(RuleFailure {
                    rule: rule.description().to_string(),
                    severity,
                    error,
                }),
                Severity::Warning => {
                    let message = error.to_string();
                    self.sink.warning(&message);
                    warnings.push(message);
                }
                Severity::Info => self.sink.info(&error.to_string()),
            }
        }

        if errors.is_empty() && warnings.is_empty() {
            return None;
        }
        Some(ValidationReport {
            fatal: (!errors.is_empty()).then(|| ValidationError::Rules(errors)),
            warnings,
        })
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field(
                "rules",
                &self.rules.iter().map(|r| r.description()).collect::<Vec<_>>(),
            )
            .field(
                "groups",
                &self.groups.iter().map(|g| g.name()).collect::<Vec<_>>(),
            )
            .field(
                "preprocessors",
                &self.preprocessors.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MemorySink;
    use crate::error::RuleError;
    use crate::group::RuleGroup;
    use crate::preprocess::{FnPreprocessor, StaticDefaults};
    use crate::rules::{Conflict, FileExtension, FnRule, RegionFormat, Required};
    use flagcheck_types::FlagSpec;

    fn validator() -> (Validator, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        (Validator::with_sink(sink.clone()), sink)
    }

    fn notice(message: &'static str) -> FnRule {
        FnRule::new(message, Severity::Info, move |_, _| {
            Err(RuleError::custom(message))
        })
    }

    #[test]
    fn clean_pass_returns_none() {
        let (mut v, sink) = validator();
        v.add_rule(Required::flag("region"));

        let mut flags = FlagSet::new().with("region", "us-west-2");
        assert!(v.validate(&ValidationContext::default(), &mut flags).is_none());
        assert!(sink.messages().is_empty());
    }

    #[test]
    fn every_error_is_kept() {
        let (mut v, _) = validator();
        v.add_rule(Required::flag("region"))
            .add_rule(RegionFormat::flag("fallback-region"))
            .add_rule(Conflict::flags(["profile", "access-key"]));

        let mut flags = FlagSet::new()
            .with("fallback-region", "mars")
            .with("profile", "ops")
            .with("access-key", "AKIA");
        let report = v
            .validate(&ValidationContext::default(), &mut flags)
            .unwrap();

        let failures = report.error().and_then(|e| e.failures()).unwrap();
        assert_eq!(failures.len(), 3);
        let causes: Vec<_> = failures.causes().cloned().collect();
        assert_eq!(
            causes[0],
            RuleError::Missing {
                flag: "region".into()
            }
        );
        assert!(matches!(causes[1], RuleError::InvalidRegion { .. }));
        assert!(matches!(causes[2], RuleError::Conflict { .. }));
    }

    #[test]
    fn warnings_and_errors_coexist() {
        let (mut v, sink) = validator();
        v.add_rule(FileExtension::flag("manifest", [".yaml"]))
            .add_rule(Required::flag("region"));

        let mut flags = FlagSet::new().with("manifest", "app.txt");
        let report = v
            .validate(&ValidationContext::default(), &mut flags)
            .unwrap();

        assert!(report.is_fatal());
        assert_eq!(report.warnings().len(), 1);
        assert_eq!(sink.warnings(), report.warnings());
    }

    #[test]
    fn only_warnings_is_not_fatal() {
        let (mut v, _) = validator();
        v.add_rule(FileExtension::flag("manifest", [".yaml"]));

        let mut flags = FlagSet::new().with("manifest", "test.txt");
        let report = v
            .validate(&ValidationContext::default(), &mut flags)
            .unwrap();
        assert!(!report.is_fatal());
        assert_eq!(report.into_result().unwrap().len(), 1);
    }

    #[test]
    fn info_goes_to_sink_only() {
        let (mut v, sink) = validator();
        v.add_rule(notice("dry run: nothing will be changed"));

        let mut flags = FlagSet::new();
        assert!(v.validate(&ValidationContext::default(), &mut flags).is_none());
        assert_eq!(sink.infos(), vec!["dry run: nothing will be changed"]);
    }

    #[test]
    fn sink_sees_findings_in_rule_order() {
        let (mut v, sink) = validator();
        v.add_rule(notice("first"))
            .add_rule(FileExtension::flag("manifest", [".yaml"]))
            .add_rule(notice("third"));

        let mut flags = FlagSet::new().with("manifest", "x.json");
        v.validate(&ValidationContext::default(), &mut flags);

        let order: Vec<Severity> = sink.messages().into_iter().map(|(s, _)| s).collect();
        assert_eq!(order, vec![Severity::Info, Severity::Warning, Severity::Info]);
    }

    #[test]
    fn preprocessor_failure_is_fatal_and_stops_the_pass() {
        let (mut v, sink) = validator();
        v.add_preprocessor(FnPreprocessor::new("resolve", |_, _| Err("no account".into())))
            .add_rule(notice("should not run"));

        let mut flags = FlagSet::new();
        let report = v
            .validate(&ValidationContext::default(), &mut flags)
            .unwrap();

        match report.error() {
            Some(ValidationError::Preprocess { step, source }) => {
                assert_eq!(step, "resolve");
                assert_eq!(source.to_string(), "no account");
            }
            other => panic!("expected preprocess failure, got {other:?}"),
        }
        assert!(sink.messages().is_empty());
    }

    #[test]
    fn preprocessors_run_before_rules() {
        let (mut v, _) = validator();
        v.add_preprocessor(StaticDefaults::from_config([("region", "us-east-1")]))
            .add_rule(Required::flag("region"));

        let mut flags = FlagSet::new();
        assert!(v.validate(&ValidationContext::default(), &mut flags).is_none());
        assert_eq!(flags.string("region"), "us-east-1");
    }

    #[test]
    fn cancelled_context_runs_nothing() {
        let (mut v, sink) = validator();
        v.add_preprocessor(FnPreprocessor::new("boom", |_, _| panic!("must not run")))
            .add_rule(notice("must not run"));

        let ctx = ValidationContext::default();
        ctx.cancellation().cancel();

        let report = v.validate(&ctx, &mut FlagSet::new()).unwrap();
        assert!(matches!(report.error(), Some(ValidationError::Cancelled)));
        assert!(sink.messages().is_empty());
    }

    #[test]
    fn groups_register_flags_and_rules_in_order() {
        let (mut v, _) = validator();
        v.add_rule(notice("standalone"));
        v.add_group(
            RuleGroup::new("target")
                .flag(FlagSpec::string("region", "Region"))
                .rule(Required::flag("region"))
                .rule(RegionFormat::flag("region")),
        );

        let mut spec = CommandSpec::new("deploy", "");
        v.register_flags(&mut spec);
        assert_eq!(spec.names().collect::<Vec<_>>(), vec!["region"]);

        let order: Vec<&str> = v.rules().iter().map(|r| r.description()).collect();
        assert_eq!(
            order,
            vec!["standalone", "--region is required", "--region must be a valid region"]
        );
    }

    #[test]
    fn repeated_passes_agree() {
        let (mut v, _) = validator();
        v.add_rule(Required::flag("region"))
            .add_rule(FileExtension::flag("manifest", [".yaml"]));

        let mut flags = FlagSet::new().with("manifest", "a.txt");
        let ctx = ValidationContext::default();
        let first = v.validate(&ctx, &mut flags).unwrap();
        let second = v.validate(&ctx, &mut flags).unwrap();

        assert_eq!(first.warnings(), second.warnings());
        assert_eq!(
            first.error().and_then(|e| e.failures()),
            second.error().and_then(|e| e.failures())
        );
    }
}
