//! Filesystem rules.

use std::path::{Path, PathBuf};

use flagcheck_types::Severity;

use super::{Accessor, Rule, RuleMeta, meta_builders, string_flag};
use crate::context::ValidationContext;
use crate::error::RuleError;
use crate::flags::FlagSet;

/// Fails iff a non-empty path does not exist.
///
/// An empty value fails only when the rule is marked [`FileExists::required`].
pub struct FileExists {
    field: String,
    accessor: Accessor<String>,
    required: bool,
    meta: RuleMeta,
}

impl FileExists {
    pub fn flag(name: &str) -> Self {
        Self::new(name, string_flag(name))
    }

    pub fn new<F>(field: &str, accessor: F) -> Self
    where
        F: Fn(&FlagSet) -> String + Send + Sync + 'static,
    {
        Self {
            field: field.to_string(),
            accessor: Box::new(accessor),
            required: false,
            meta: RuleMeta::new(
                format!("--{field} must point to an existing file"),
                Severity::Error,
            ),
        }
    }

    /// Also fail when the value is empty.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    meta_builders!();
}

impl Rule for FileExists {
    fn description(&self) -> &str {
        &self.meta.description
    }

    fn severity(&self) -> Severity {
        self.meta.severity
    }

    fn validate(&self, _ctx: &ValidationContext, flags: &FlagSet) -> Result<(), RuleError> {
        let value = (self.accessor)(flags);
        if value.is_empty() {
            if self.required {
                return Err(RuleError::Missing {
                    flag: self.field.clone(),
                });
            }
            return Ok(());
        }

        let path = PathBuf::from(value);
        if path.exists() {
            Ok(())
        } else {
            Err(RuleError::FileNotFound {
                flag: self.field.clone(),
                path,
            })
        }
    }
}

impl std::fmt::Debug for FileExists {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileExists")
            .field("field", &self.field)
            .field("required", &self.required)
            .field("severity", &self.meta.severity)
            .finish_non_exhaustive()
    }
}

/// Fails iff a non-empty value's extension is not in the allowed set.
///
/// Comparison ignores case. Allowed entries may be given with or without
/// the leading dot.
pub struct FileExtension {
    field: String,
    accessor: Accessor<String>,
    allowed: Vec<String>,
    meta: RuleMeta,
}

impl FileExtension {
    pub fn flag<I, S>(name: &str, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(name, allowed, string_flag(name))
    }

    pub fn new<I, S, F>(field: &str, allowed: I, accessor: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&FlagSet) -> String + Send + Sync + 'static,
    {
        let allowed: Vec<String> = allowed.into_iter().map(|e| normalize(e.as_ref())).collect();
        Self {
            field: field.to_string(),
            accessor: Box::new(accessor),
            meta: RuleMeta::new(
                format!("--{field} should have extension {}", allowed.join(", ")),
                Severity::Warning,
            ),
            allowed,
        }
    }

    meta_builders!();
}

/// `YAML` and `.yaml` both become `.yaml`.
fn normalize(ext: &str) -> String {
    let lower = ext.to_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{lower}")
    }
}

impl Rule for FileExtension {
    fn description(&self) -> &str {
        &self.meta.description
    }

    fn severity(&self) -> Severity {
        self.meta.severity
    }

    fn validate(&self, _ctx: &ValidationContext, flags: &FlagSet) -> Result<(), RuleError> {
        let value = (self.accessor)(flags);
        if value.is_empty() {
            return Ok(());
        }

        // Suffix of the file name from its last dot, so `.yaml` itself counts.
        let found = Path::new(&value)
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .and_then(|n| n.rfind('.').map(|i| n[i..].to_string()))
            .unwrap_or_default();

        if self.allowed.contains(&found) {
            return Ok(());
        }
        Err(RuleError::ExtensionNotAllowed {
            flag: self.field.clone(),
            found,
            allowed: self.allowed.clone(),
        })
    }
}

impl std::fmt::Debug for FileExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileExtension")
            .field("field", &self.field)
            .field("allowed", &self.allowed)
            .field("severity", &self.meta.severity)
            .finish_non_exhaustive()
    }
}
