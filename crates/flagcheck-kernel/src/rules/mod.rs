//! Validation rules.
//!
//! A [`Rule`] is a stateless check over the current [`FlagSet`]. Rules read
//! flags through typed accessors, so the same rule works whether a value comes
//! straight from a flag (`Required::flag("region")`) or from a computed view
//! (`Required::new("target", |f| f.list("target").to_vec())`).
//!
//! The catalog:
//!
//! | Rule | Fails when | Default severity |
//! |------|------------|------------------|
//! | [`Required`] | value is empty | Error |
//! | [`Pattern`] | non-empty value does not match | Error |
//! | [`FileExists`] | non-empty path is missing (or empty and required) | Error |
//! | [`FileExtension`] | non-empty value has another extension | Warning |
//! | [`Conflict`] | more than one field is non-empty | Error |
//! | [`Dependency`] | trigger set and a dependent empty | Error |
//! | [`RegionFormat`] | non-empty value is not a region id | Error |
//! | [`FnRule`] | the closure says so | caller's choice |

mod file;
mod pattern;
mod relation;
mod required;

pub use file::{FileExists, FileExtension};
pub use pattern::{Pattern, RegionFormat};
pub use relation::{Conflict, Dependency};
pub use required::Required;

use flagcheck_types::{FlagValue, Severity};

use crate::context::ValidationContext;
use crate::error::RuleError;
use crate::flags::{FlagSet, IsEmpty};

/// A single named check with a fixed severity.
///
/// Evaluating a rule twice on the same flags yields the same outcome.
pub trait Rule: Send + Sync {
    /// Human-readable intent, used for listings.
    fn description(&self) -> &str;

    fn severity(&self) -> Severity;

    /// Check the flags. `Err` means the rule failed at [`Rule::severity`].
    fn validate(&self, ctx: &ValidationContext, flags: &FlagSet) -> Result<(), RuleError>;
}

/// Typed read of one value from the flag set.
pub type Accessor<T> = Box<dyn Fn(&FlagSet) -> T + Send + Sync>;

/// Read of a value by field name, for rules spanning several flags.
pub type FieldAccessor = Box<dyn Fn(&FlagSet, &str) -> Option<FlagValue> + Send + Sync>;

/// Accessor reading a string flag by name.
pub(crate) fn string_flag(name: &str) -> Accessor<String> {
    let name = name.to_string();
    Box::new(move |flags: &FlagSet| flags.string(&name))
}

/// Field accessor reading flags by name; empty values read as `None`.
pub(crate) fn by_name() -> FieldAccessor {
    Box::new(|flags: &FlagSet, name: &str| {
        flags
            .value(name)
            .filter(|v| !v.is_empty_value())
            .cloned()
    })
}

/// Whether a field accessor result counts as empty.
pub(crate) fn field_is_empty(value: Option<&FlagValue>) -> bool {
    crate::flags::flag_is_empty(value)
}

/// Description and severity shared by every catalog rule.
#[derive(Debug, Clone)]
pub(crate) struct RuleMeta {
    pub(crate) description: String,
    pub(crate) severity: Severity,
}

impl RuleMeta {
    pub(crate) fn new(description: impl Into<String>, severity: Severity) -> Self {
        Self {
            description: description.into(),
            severity,
        }
    }
}

/// `with_severity` / `with_description` for a rule holding a `meta: RuleMeta`.
macro_rules! meta_builders {
    () => {
        /// Override the default severity.
        pub fn with_severity(mut self, severity: flagcheck_types::Severity) -> Self {
            self.meta.severity = severity;
            self
        }

        /// Override the generated description.
        pub fn with_description(mut self, description: impl Into<String>) -> Self {
            self.meta.description = description.into();
            self
        }
    };
}

pub(crate) use meta_builders;

pub(crate) fn format_flags(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("--{n}"))
        .collect::<Vec<_>>()
        .join(", ")
}

type CheckFn = dyn Fn(&ValidationContext, &FlagSet) -> Result<(), RuleError> + Send + Sync;

/// A rule backed by a closure.
///
/// For checks the catalog does not cover: cross-flag arithmetic, notices that
/// depend on the command being run, and so on.
pub struct FnRule {
    meta: RuleMeta,
    check: Box<CheckFn>,
}

impl FnRule {
    pub fn new<F>(description: impl Into<String>, severity: Severity, check: F) -> Self
    where
        F: Fn(&ValidationContext, &FlagSet) -> Result<(), RuleError> + Send + Sync + 'static,
    {
        Self {
            meta: RuleMeta::new(description, severity),
            check: Box::new(check),
        }
    }
}

impl Rule for FnRule {
    fn description(&self) -> &str {
        &self.meta.description
    }

    fn severity(&self) -> Severity {
        self.meta.severity
    }

    fn validate(&self, ctx: &ValidationContext, flags: &FlagSet) -> Result<(), RuleError> {
        (self.check)(ctx, flags)
    }
}

impl std::fmt::Debug for FnRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnRule")
            .field("description", &self.meta.description)
            .field("severity", &self.meta.severity)
            .finish()
    }
}
