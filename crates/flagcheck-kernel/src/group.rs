//! Flag groups: rules bundled with the flags they govern.
//!
//! A command adds one group instead of N rules plus N flag declarations.

use std::fmt;
use std::sync::Arc;

use flagcheck_types::{CommandSpec, FlagSpec};

use crate::rules::Rule;

/// A cohesive set of flags and the rules over them.
pub trait FlagGroup: Send + Sync {
    /// Short name used in logs and listings.
    fn name(&self) -> &str;

    /// The group's rules, in evaluation order.
    fn rules(&self) -> Vec<Arc<dyn Rule>>;

    /// Declare the group's flags on a command.
    ///
    /// Called once while the command is being built, before any parsing.
    fn register_flags(&self, target: &mut CommandSpec);
}

/// A group assembled from parts.
#[derive(Default)]
pub struct RuleGroup {
    name: String,
    flags: Vec<FlagSpec>,
    rules: Vec<Arc<dyn Rule>>,
}

impl RuleGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn flag(mut self, spec: FlagSpec) -> Self {
        self.flags.push(spec);
        self
    }

    pub fn rule(mut self, rule: impl Rule + 'static) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn rule_arc(mut self, rule: Arc<dyn Rule>) -> Self {
        self.rules.push(rule);
        self
    }
}

impl FlagGroup for RuleGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn rules(&self) -> Vec<Arc<dyn Rule>> {
        self.rules.clone()
    }

    fn register_flags(&self, target: &mut CommandSpec) {
        for spec in &self.flags {
            if !target.add_flag(spec.clone()) {
                tracing::debug!(
                    group = %self.name,
                    flag = %spec.name,
                    "flag already declared by another group"
                );
            }
        }
    }
}

impl fmt::Debug for RuleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rules: Vec<&str> = self.rules.iter().map(|r| r.description()).collect();
        f.debug_struct("RuleGroup")
            .field("name", &self.name)
            .field("flags", &self.flags.iter().map(|s| &s.name).collect::<Vec<_>>())
            .field("rules", &rules)
            .finish()
    }
}
