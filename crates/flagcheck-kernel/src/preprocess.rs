//! Preprocessors: derive or normalise flag state before rules run.
//!
//! Preprocessors run in registration order. Any failure aborts the pass and
//! is fatal regardless of what the rules would have said. Every preprocessor
//! must be idempotent within one pass; the built-ins only fill empty values
//! or apply idempotent transforms.

use std::collections::BTreeMap;
use std::fmt;

use flagcheck_types::{CommandSpec, FlagValue};

use crate::context::ValidationContext;
use crate::error::BoxError;
use crate::flags::{FlagSet, FlagSource};

/// A setup step run before rule evaluation.
pub trait Preprocessor: Send + Sync {
    /// Name used in logs and in preprocessing errors.
    fn name(&self) -> &str;

    fn process(&self, ctx: &ValidationContext, flags: &mut FlagSet) -> Result<(), BoxError>;
}

type EnvLookup = dyn Fn(&str) -> Option<String> + Send + Sync;

/// Fill an empty flag from the first set environment variable.
pub struct EnvDefault {
    name: String,
    flag: String,
    vars: Vec<String>,
    lookup: Box<EnvLookup>,
}

impl EnvDefault {
    pub fn new<I, S>(flag: &str, vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: format!("env-default({flag})"),
            flag: flag.to_string(),
            vars: vars.into_iter().map(Into::into).collect(),
            lookup: Box::new(|var: &str| std::env::var(var).ok()),
        }
    }

    /// Replace the process environment with another source.
    pub fn with_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.lookup = Box::new(lookup);
        self
    }
}

impl Preprocessor for EnvDefault {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, _ctx: &ValidationContext, flags: &mut FlagSet) -> Result<(), BoxError> {
        if !flags.is_empty(&self.flag) {
            return Ok(());
        }
        let found = self
            .vars
            .iter()
            .find_map(|var| (self.lookup)(var).filter(|v| !v.is_empty()).map(|v| (var, v)));
        if let Some((var, value)) = found {
            tracing::debug!(flag = %self.flag, %var, "defaulting flag from environment");
            flags.set_if_empty(&self.flag, FlagValue::Str(value), FlagSource::Environment);
        }
        Ok(())
    }
}

impl fmt::Debug for EnvDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvDefault")
            .field("flag", &self.flag)
            .field("vars", &self.vars)
            .finish()
    }
}

/// Fill empty flags from a fixed table, typically the config file.
#[derive(Debug, Clone)]
pub struct StaticDefaults {
    name: String,
    values: BTreeMap<String, FlagValue>,
    source: FlagSource,
}

impl StaticDefaults {
    pub fn new(name: impl Into<String>, source: FlagSource) -> Self {
        Self {
            name: name.into(),
            values: BTreeMap::new(),
            source,
        }
    }

    /// Defaults read from a config file.
    pub fn from_config<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FlagValue>,
    {
        let mut defaults = Self::new("config-defaults", FlagSource::Config);
        for (k, v) in values {
            defaults.values.insert(k.into(), v.into());
        }
        defaults
    }

    /// The declared defaults of `spec`. Register it after every other
    /// defaulting step so those win over the declaration.
    pub fn declared(spec: &CommandSpec) -> Self {
        let mut defaults = Self::new("declared-defaults", FlagSource::Default);
        for flag in &spec.flags {
            if let Some(default) = &flag.default {
                defaults.values.insert(flag.name.clone(), default.clone());
            }
        }
        defaults
    }

    pub fn value(mut self, flag: impl Into<String>, value: impl Into<FlagValue>) -> Self {
        self.values.insert(flag.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Preprocessor for StaticDefaults {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, _ctx: &ValidationContext, flags: &mut FlagSet) -> Result<(), BoxError> {
        for (flag, value) in &self.values {
            if flags.set_if_empty(flag, value.clone(), self.source) {
                tracing::debug!(%flag, source = ?self.source, "applied default");
            }
        }
        Ok(())
    }
}

type Transform = dyn Fn(&str) -> String + Send + Sync;

/// Rewrite a string flag in place, keeping its source.
///
/// The transform must be idempotent (`f(f(x)) == f(x)`).
pub struct Normalize {
    name: String,
    flag: String,
    transform: Box<Transform>,
}

impl Normalize {
    pub fn new<F>(flag: &str, transform: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self {
            name: format!("normalize({flag})"),
            flag: flag.to_string(),
            transform: Box::new(transform),
        }
    }

    pub fn lowercase(flag: &str) -> Self {
        Self::new(flag, |s| s.trim().to_lowercase())
    }

    pub fn trim(flag: &str) -> Self {
        Self::new(flag, |s| s.trim().to_string())
    }
}

impl Preprocessor for Normalize {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, _ctx: &ValidationContext, flags: &mut FlagSet) -> Result<(), BoxError> {
        let Some(FlagValue::Str(current)) = flags.value(&self.flag) else {
            return Ok(());
        };
        let normalized = (self.transform)(current);
        if &normalized != current {
            let source = flags.source(&self.flag).unwrap_or(FlagSource::Derived);
            flags.set(&self.flag, FlagValue::Str(normalized), source);
        }
        Ok(())
    }
}

impl fmt::Debug for Normalize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Normalize").field("flag", &self.flag).finish()
    }
}

type ProcessFn = dyn Fn(&ValidationContext, &mut FlagSet) -> Result<(), BoxError> + Send + Sync;

/// A preprocessor backed by a closure.
pub struct FnPreprocessor {
    name: String,
    process: Box<ProcessFn>,
}

impl FnPreprocessor {
    pub fn new<F>(name: impl Into<String>, process: F) -> Self
    where
        F: Fn(&ValidationContext, &mut FlagSet) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            process: Box::new(process),
        }
    }
}

impl Preprocessor for FnPreprocessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, ctx: &ValidationContext, flags: &mut FlagSet) -> Result<(), BoxError> {
        (self.process)(ctx, flags)
    }
}

impl fmt::Debug for FnPreprocessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPreprocessor")
            .field("name", &self.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use flagcheck_types::FlagSpec;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + Send + Sync + 'static {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| map.get(var).cloned()
    }

    fn run(p: &dyn Preprocessor, flags: &mut FlagSet) {
        p.process(&ValidationContext::default(), flags).unwrap();
    }

    #[test]
    fn env_default_uses_first_set_variable() {
        let p = EnvDefault::new("region", ["AWS_REGION", "AWS_DEFAULT_REGION"])
            .with_lookup(env(&[("AWS_REGION", ""), ("AWS_DEFAULT_REGION", "eu-west-1")]));
        let mut flags = FlagSet::new();
        run(&p, &mut flags);

        assert_eq!(flags.string("region"), "eu-west-1");
        assert_eq!(flags.source("region"), Some(FlagSource::Environment));
        assert_eq!(p.name(), "env-default(region)");
    }

    #[test]
    fn env_default_keeps_explicit_value() {
        let p = EnvDefault::new("region", ["AWS_REGION"])
            .with_lookup(env(&[("AWS_REGION", "eu-west-1")]));
        let mut flags = FlagSet::new().with("region", "us-west-2");
        run(&p, &mut flags);
        assert_eq!(flags.string("region"), "us-west-2");
        assert!(flags.changed("region"));
    }

    #[test]
    fn static_defaults_fill_only_empty_flags() {
        let p = StaticDefaults::from_config([("region", "us-east-1"), ("bucket", "artifacts")]);
        let mut flags = FlagSet::new().with("bucket", "mine");
        run(&p, &mut flags);

        assert_eq!(flags.string("region"), "us-east-1");
        assert_eq!(flags.source("region"), Some(FlagSource::Config));
        assert_eq!(flags.string("bucket"), "mine");
    }

    #[test]
    fn declared_defaults_lose_to_earlier_steps() {
        let spec = CommandSpec::new("deploy", "")
            .flag(FlagSpec::string("environment", "").with_default("staging"))
            .flag(FlagSpec::string("region", "").with_default("us-east-1"))
            .flag(FlagSpec::string("bucket", ""));
        let mut flags = FlagSet::new();
        run(&StaticDefaults::from_config([("environment", "prod")]), &mut flags);
        run(&StaticDefaults::declared(&spec), &mut flags);

        assert_eq!(flags.string("environment"), "prod");
        assert_eq!(flags.source("environment"), Some(FlagSource::Config));
        assert_eq!(flags.string("region"), "us-east-1");
        assert_eq!(flags.source("region"), Some(FlagSource::Default));
        assert!(!flags.is_set("bucket"));
    }

    #[test]
    fn normalize_is_idempotent() {
        let p = Normalize::lowercase("environment");
        let mut flags = FlagSet::new().with("environment", " Prod ");
        run(&p, &mut flags);
        let once = flags.clone();
        run(&p, &mut flags);

        assert_eq!(flags.string("environment"), "prod");
        assert_eq!(flags, once);
        assert!(flags.changed("environment"));
    }

    #[test]
    fn normalize_ignores_non_strings() {
        let p = Normalize::trim("replicas");
        let mut flags = FlagSet::new().with("replicas", 3i64);
        run(&p, &mut flags);
        assert_eq!(flags.int("replicas"), Some(3));
    }

    #[test]
    fn fn_preprocessor_can_fail() {
        let p = FnPreprocessor::new("resolve-account", |_, flags| {
            if flags.is_empty("profile") {
                return Err("no profile to resolve an account from".into());
            }
            flags.set("account", "123".into(), FlagSource::Derived);
            Ok(())
        });

        let mut empty = FlagSet::new();
        let err = p
            .process(&ValidationContext::default(), &mut empty)
            .unwrap_err();
        assert_eq!(err.to_string(), "no profile to resolve an account from");

        let mut flags = FlagSet::new().with("profile", "ops");
        run(&p, &mut flags);
        assert_eq!(flags.source("account"), Some(FlagSource::Derived));
    }
}
