//! Rules spanning several flags: mutual exclusion and dependency.

use flagcheck_types::Severity;

use super::{FieldAccessor, Rule, RuleMeta, by_name, field_is_empty, format_flags, meta_builders};
use crate::context::ValidationContext;
use crate::error::RuleError;
use crate::flags::FlagSet;

/// Fails iff more than one of the named fields is non-empty.
///
/// The failure names every non-empty field, in declaration order.
pub struct Conflict {
    fields: Vec<String>,
    accessor: FieldAccessor,
    meta: RuleMeta,
}

impl Conflict {
    pub fn flags<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_accessor(fields, by_name())
    }

    pub fn with_accessor<I, S>(fields: I, accessor: FieldAccessor) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        Self {
            meta: RuleMeta::new(
                format!("only one of {} may be set", format_flags(&fields)),
                Severity::Error,
            ),
            fields,
            accessor,
        }
    }

    meta_builders!();
}

impl Rule for Conflict {
    fn description(&self) -> &str {
        &self.meta.description
    }

    fn severity(&self) -> Severity {
        self.meta.severity
    }

    fn validate(&self, _ctx: &ValidationContext, flags: &FlagSet) -> Result<(), RuleError> {
        let set: Vec<String> = self
            .fields
            .iter()
            .filter(|name| !field_is_empty((self.accessor)(flags, name).as_ref()))
            .cloned()
            .collect();

        if set.len() > 1 {
            return Err(RuleError::Conflict { flags: set });
        }
        Ok(())
    }
}

impl std::fmt::Debug for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conflict")
            .field("fields", &self.fields)
            .field("severity", &self.meta.severity)
            .finish_non_exhaustive()
    }
}

/// When the trigger field is non-empty, every dependent must be too.
///
/// All missing dependents are reported, in declaration order.
pub struct Dependency {
    trigger: String,
    dependents: Vec<String>,
    accessor: FieldAccessor,
    meta: RuleMeta,
}

impl Dependency {
    pub fn flags<I, S>(trigger: &str, dependents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_accessor(trigger, dependents, by_name())
    }

    pub fn with_accessor<I, S>(trigger: &str, dependents: I, accessor: FieldAccessor) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let dependents: Vec<String> = dependents.into_iter().map(Into::into).collect();
        Self {
            meta: RuleMeta::new(
                format!("--{trigger} requires {}", format_flags(&dependents)),
                Severity::Error,
            ),
            trigger: trigger.to_string(),
            dependents,
            accessor,
        }
    }

    meta_builders!();
}

impl Rule for Dependency {
    fn description(&self) -> &str {
        &self.meta.description
    }

    fn severity(&self) -> Severity {
        self.meta.severity
    }

    fn validate(&self, _ctx: &ValidationContext, flags: &FlagSet) -> Result<(), RuleError> {
        if field_is_empty((self.accessor)(flags, &self.trigger).as_ref()) {
            return Ok(());
        }

        let missing: Vec<String> = self
            .dependents
            .iter()
            .filter(|name| field_is_empty((self.accessor)(flags, name).as_ref()))
            .cloned()
            .collect();

        if missing.is_empty() {
            return Ok(());
        }
        Err(RuleError::MissingDependency {
            trigger: self.trigger.clone(),
            missing,
        })
    }
}

impl std::fmt::Debug for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dependency")
            .field("trigger", &self.trigger)
            .field("dependents", &self.dependents)
            .field("severity", &self.meta.severity)
            .finish_non_exhaustive()
    }
}
