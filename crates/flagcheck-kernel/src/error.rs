//! Error types for flag validation.
//!
//! Three layers:
//!
//! - [`RuleError`]: what a single rule found wrong
//! - [`RuleFailures`]: every Error-severity failure of one pass, joined
//! - [`ValidationError`]: the fatal outcome handed back to the caller

use std::fmt;
use std::path::PathBuf;

use flagcheck_types::Severity;
use thiserror::Error;

use crate::rules::format_flags;

/// Boxed error reported by preprocessors and custom steps.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("--{flag} is required")]
    Missing { flag: String },

    #[error("--{flag}: {value:?} does not match pattern {pattern}")]
    PatternMismatch {
        flag: String,
        value: String,
        pattern: String,
    },

    #[error("--{flag}: file {} does not exist", .path.display())]
    FileNotFound { flag: String, path: PathBuf },

    #[error("--{flag}: extension {found:?} is not one of {}", .allowed.join(", "))]
    ExtensionNotAllowed {
        flag: String,
        found: String,
        allowed: Vec<String>,
    },

    #[error("{} cannot be used together", format_flags(.flags))]
    Conflict { flags: Vec<String> },

    #[error("--{trigger} requires {}", format_flags(.missing))]
    MissingDependency {
        trigger: String,
        missing: Vec<String>,
    },

    #[error("--{flag}: {value:?} is not a valid region (expected something like us-west-2)")]
    InvalidRegion { flag: String, value: String },

    #[error("{0}")]
    Custom(String),
}

impl RuleError {
    pub fn custom(message: impl Into<String>) -> Self {
        RuleError::Custom(message.into())
    }

    /// Flags named by this violation, in the order they were reported.
    pub fn flags(&self) -> Vec<&str> {
        match self {
            RuleError::Missing { flag }
            | RuleError::PatternMismatch { flag, .. }
            | RuleError::FileNotFound { flag, .. }
            | RuleError::ExtensionNotAllowed { flag, .. }
            | RuleError::InvalidRegion { flag, .. } => vec![flag.as_str()],
            RuleError::Conflict { flags } => flags.iter().map(String::as_str).collect(),
            RuleError::MissingDependency { trigger, missing } => std::iter::once(trigger.as_str())
                .chain(missing.iter().map(String::as_str))
                .collect(),
            RuleError::Custom(_) => Vec::new(),
        }
    }
}

/// A rule violation tagged with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error}")]
pub struct RuleFailure {
    /// Description of the rule that failed.
    pub rule: String,
    pub severity: Severity,
    pub error: RuleError,
}

/// Every Error-severity failure from one validation pass.
///
/// Later failures never replace earlier ones; iterate to see all causes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleFailures {
    failures: Vec<RuleFailure>,
}

impl RuleFailures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, failure: RuleFailure) {
        self.failures.push(failure);
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RuleFailure> {
        self.failures.iter()
    }

    /// The underlying rule errors, in evaluation order.
    pub fn causes(&self) -> impl Iterator<Item = &RuleError> {
        self.failures.iter().map(|f| &f.error)
    }
}

impl fmt::Display for RuleFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.failures.as_slice() {
            [] => f.write_str("validation failed"),
            [only] => write!(f, "validation failed: {only}"),
            many => {
                write!(f, "validation failed with {} errors:", many.len())?;
                for failure in many {
                    write!(f, "\n  - {failure}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for RuleFailures {}

impl FromIterator<RuleFailure> for RuleFailures {
    fn from_iter<I: IntoIterator<Item = RuleFailure>>(iter: I) -> Self {
        Self {
            failures: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for RuleFailures {
    type Item = RuleFailure;
    type IntoIter = std::vec::IntoIter<RuleFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.failures.into_iter()
    }
}

impl<'a> IntoIterator for &'a RuleFailures {
    type Item = &'a RuleFailure;
    type IntoIter = std::slice::Iter<'a, RuleFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.failures.iter()
    }
}

/// The fatal outcome of a validation pass.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The context was already cancelled; no rule ran.
    #[error("validation cancelled before any rule ran")]
    Cancelled,

    /// A preprocessor failed. Always fatal.
    #[error("preprocessing failed in {step}")]
    Preprocess {
        step: String,
        #[source]
        source: BoxError,
    },

    /// One or more Error-severity rules failed.
    #[error(transparent)]
    Rules(#[from] RuleFailures),
}

impl ValidationError {
    /// The joined rule failures, if this outcome came from rule evaluation.
    pub fn failures(&self) -> Option<&RuleFailures> {
        match self {
            ValidationError::Rules(failures) => Some(failures),
            _ => None,
        }
    }
}

/// A pattern rule was built with a pattern that does not compile.
#[derive(Debug, Error)]
#[error("invalid pattern for --{flag}")]
pub struct PatternError {
    pub flag: String,
    #[source]
    pub source: regex::Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(error: RuleError) -> RuleFailure {
        RuleFailure {
            rule: "test rule".to_string(),
            severity: Severity::Error,
            error,
        }
    }

    #[test]
    fn joined_message_names_every_failure() {
        let failures: RuleFailures = [
            failure(RuleError::Missing {
                flag: "region".into(),
            }),
            failure(RuleError::Conflict {
                flags: vec!["profile".into(), "access-key".into()],
            }),
        ]
        .into_iter()
        .collect();

        let msg = failures.to_string();
        assert!(msg.starts_with("validation failed with 2 errors:"), "{msg}");
        assert!(msg.contains("--region is required"), "{msg}");
        assert!(
            msg.contains("--profile, --access-key cannot be used together"),
            "{msg}"
        );
    }

    #[test]
    fn single_failure_is_one_line() {
        let failures: RuleFailures = [failure(RuleError::InvalidRegion {
            flag: "region".into(),
            value: "mars".into(),
        })]
        .into_iter()
        .collect();

        assert_eq!(
            failures.to_string(),
            "validation failed: --region: \"mars\" is not a valid region (expected something like us-west-2)"
        );
    }

    #[test]
    fn dependency_names_trigger_and_missing() {
        let err = RuleError::MissingDependency {
            trigger: "access-key".into(),
            missing: vec!["secret-key".into()],
        };
        assert_eq!(err.to_string(), "--access-key requires --secret-key");
        assert_eq!(err.flags(), vec!["access-key", "secret-key"]);
    }

    #[test]
    fn preprocess_error_keeps_source() {
        let err = ValidationError::Preprocess {
            step: "env-default(region)".into(),
            source: "boom".into(),
        };
        assert_eq!(err.to_string(), "preprocessing failed in env-default(region)");
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("boom"));
        assert!(err.failures().is_none());
    }
}
