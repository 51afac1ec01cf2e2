//! Test utilities for flagcheck.
//!
//! Scripted pieces for exercising the validator and middleware without real
//! flags or real commands:
//! - [`ScriptedRule`] fails (or passes) on demand and counts evaluations
//! - [`CountingPreprocessor`] / [`FailingPreprocessor`] for pass ordering
//! - [`RecordingHandler`] records every invocation that reached the body
//! - [`flags`] builds a command-line [`FlagSet`] from string pairs

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use flagcheck_kernel::{
    BoxError, FlagSet, Handler, Invocation, Preprocessor, Rule, RuleError, Severity,
    ValidationContext,
};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Build a flag set where every pair was set on the command line.
pub fn flags(pairs: &[(&str, &str)]) -> FlagSet {
    pairs
        .iter()
        .fold(FlagSet::new(), |set, (name, value)| set.with(name, *value))
}

/// A rule with a fixed outcome.
#[derive(Debug)]
pub struct ScriptedRule {
    description: String,
    severity: Severity,
    failure: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedRule {
    pub fn passing(description: &str) -> Self {
        Self {
            description: description.to_string(),
            severity: Severity::Error,
            failure: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always fails at `severity` with `message`.
    pub fn failing(severity: Severity, message: &str) -> Self {
        Self {
            description: message.to_string(),
            severity,
            failure: Some(message.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared evaluation counter; stays readable after the rule is moved
    /// into a validator.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl Rule for ScriptedRule {
    fn description(&self) -> &str {
        &self.description
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn validate(&self, _ctx: &ValidationContext, _flags: &FlagSet) -> Result<(), RuleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(message) => Err(RuleError::custom(message.clone())),
            None => Ok(()),
        }
    }
}

/// Appends its name to a shared log every time it runs.
#[derive(Debug, Clone)]
pub struct CountingPreprocessor {
    name: String,
    log: Arc<Mutex<Vec<String>>>,
}

impl CountingPreprocessor {
    pub fn new(name: &str, log: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            name: name.to_string(),
            log,
        }
    }
}

impl Preprocessor for CountingPreprocessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, _ctx: &ValidationContext, _flags: &mut FlagSet) -> Result<(), BoxError> {
        lock(&self.log).push(self.name.clone());
        Ok(())
    }
}

/// Always fails.
#[derive(Debug, Clone)]
pub struct FailingPreprocessor {
    name: String,
    message: String,
}

impl FailingPreprocessor {
    pub fn new(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            message: message.to_string(),
        }
    }
}

impl Preprocessor for FailingPreprocessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, _ctx: &ValidationContext, _flags: &mut FlagSet) -> Result<(), BoxError> {
        Err(self.message.clone().into())
    }
}

/// Command body that records the flags of every call it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingHandler {
    seen: Arc<Mutex<Vec<FlagSet>>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        lock(&self.seen).len()
    }

    /// Flags as the body saw them, i.e. after preprocessing.
    pub fn seen(&self) -> Vec<FlagSet> {
        lock(&self.seen).clone()
    }
}

#[async_trait]
impl Handler for RecordingHandler {
    async fn call(&self, inv: &mut Invocation) -> anyhow::Result<()> {
        lock(&self.seen).push(inv.flags.clone());
        Ok(())
    }
}
