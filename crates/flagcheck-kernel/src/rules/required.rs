//! Required: the value must be non-empty.

use flagcheck_types::{FlagValue, Severity};

use super::{Accessor, Rule, RuleMeta, meta_builders};
use crate::context::ValidationContext;
use crate::error::RuleError;
use crate::flags::{FlagSet, IsEmpty};

/// Fails iff the accessed value is empty.
pub struct Required<T> {
    field: String,
    accessor: Accessor<T>,
    meta: RuleMeta,
}

impl Required<Option<FlagValue>> {
    /// Require the named flag to hold a non-empty value.
    pub fn flag(name: &str) -> Self {
        let key = name.to_string();
        Self::new(name, move |flags: &FlagSet| {
            flags
                .value(&key)
                .filter(|v| !v.is_empty_value())
                .cloned()
        })
    }
}

impl<T: IsEmpty + 'static> Required<T> {
    pub fn new<F>(field: &str, accessor: F) -> Self
    where
        F: Fn(&FlagSet) -> T + Send + Sync + 'static,
    {
        Self {
            field: field.to_string(),
            accessor: Box::new(accessor),
            meta: RuleMeta::new(format!("--{field} is required"), Severity::Error),
        }
    }

    meta_builders!();
}

impl<T: IsEmpty + 'static> Rule for Required<T> {
    fn description(&self) -> &str {
        &self.meta.description
    }

    fn severity(&self) -> Severity {
        self.meta.severity
    }

    fn validate(&self, _ctx: &ValidationContext, flags: &FlagSet) -> Result<(), RuleError> {
        if (self.accessor)(flags).is_empty_value() {
            return Err(RuleError::Missing {
                flag: self.field.clone(),
            });
        }
        Ok(())
    }
}

impl<T> std::fmt::Debug for Required<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Required")
            .field("field", &self.field)
            .field("severity", &self.meta.severity)
            .finish_non_exhaustive()
    }
}
