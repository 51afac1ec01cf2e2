//! Pattern and region-format rules.

use std::sync::LazyLock;

use flagcheck_types::Severity;
use regex::Regex;

use super::{Accessor, Rule, RuleMeta, meta_builders, string_flag};
use crate::context::ValidationContext;
use crate::error::{PatternError, RuleError};
use crate::flags::FlagSet;

/// Two-letter area, optional `-gov`, a location segment, a single digit.
const REGION_PATTERN: &str = r"^[a-z]{2}(-gov)?-[a-z0-9-]+-[0-9]$";

// Constant pattern, compiled by every test in this module.
#[allow(clippy::expect_used)]
static REGION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(REGION_PATTERN).expect("region pattern compiles"));

/// Fails iff a non-empty value does not match a fixed pattern.
pub struct Pattern {
    field: String,
    accessor: Accessor<String>,
    regex: Regex,
    meta: RuleMeta,
}

impl Pattern {
    /// Match the named string flag against `pattern`.
    ///
    /// An invalid pattern is a programming error and is reported here, at
    /// construction, never during validation.
    pub fn flag(name: &str, pattern: &str) -> Result<Self, PatternError> {
        Self::new(name, pattern, string_flag(name))
    }

    pub fn new<F>(field: &str, pattern: &str, accessor: F) -> Result<Self, PatternError>
    where
        F: Fn(&FlagSet) -> String + Send + Sync + 'static,
    {
        let regex = Regex::new(pattern).map_err(|source| PatternError {
            flag: field.to_string(),
            source,
        })?;
        Ok(Self {
            field: field.to_string(),
            accessor: Box::new(accessor),
            meta: RuleMeta::new(format!("--{field} must match {pattern}"), Severity::Error),
            regex,
        })
    }

    meta_builders!();
}

impl Rule for Pattern {
    fn description(&self) -> &str {
        &self.meta.description
    }

    fn severity(&self) -> Severity {
        self.meta.severity
    }

    fn validate(&self, _ctx: &ValidationContext, flags: &FlagSet) -> Result<(), RuleError> {
        let value = (self.accessor)(flags);
        if value.is_empty() || self.regex.is_match(&value) {
            return Ok(());
        }
        Err(RuleError::PatternMismatch {
            flag: self.field.clone(),
            value,
            pattern: self.regex.as_str().to_string(),
        })
    }
}

impl std::fmt::Debug for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pattern")
            .field("field", &self.field)
            .field("pattern", &self.regex.as_str())
            .field("severity", &self.meta.severity)
            .finish_non_exhaustive()
    }
}

/// Fails iff a non-empty value is not shaped like a cloud region id
/// (`us-west-2`, `us-gov-east-1`, `ap-southeast-3`).
pub struct RegionFormat {
    field: String,
    accessor: Accessor<String>,
    meta: RuleMeta,
}

impl RegionFormat {
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
            meta: RuleMeta::new(format!("--{field} must be a valid region"), Severity::Error),
        }
    }

    meta_builders!();
}

impl Rule for RegionFormat {
    fn description(&self) -> &str {
        &self.meta.description
    }

    fn severity(&self) -> Severity {
        self.meta.severity
    }

    fn validate(&self, _ctx: &ValidationContext, flags: &FlagSet) -> Result<(), RuleError> {
        let value = (self.accessor)(flags);
        if value.is_empty() || REGION.is_match(&value) {
            return Ok(());
        }
        Err(RuleError::InvalidRegion {
            flag: self.field.clone(),
            value,
        })
    }
}

impl std::fmt::Debug for RegionFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionFormat")
            .field("field", &self.field)
            .field("severity", &self.meta.severity)
            .finish_non_exhaustive()
    }
}
