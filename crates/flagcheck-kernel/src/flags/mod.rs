//! Flag state.
//!
//! [`FlagSet`] is the parsed view of a command's flags. Front ends build it
//! from their argument parser, preprocessors fill in derived values, and rules
//! read it through typed getters. Rules never mutate it.

mod empty;

pub use empty::{IsEmpty, is_empty};
pub(crate) use empty::flag_is_empty;

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use flagcheck_types::FlagValue;

/// Where a flag's current value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagSource {
    /// Declared default.
    Default,
    /// Supplied on the command line.
    CommandLine,
    /// Read from an environment variable by a preprocessor.
    Environment,
    /// Read from the config file by a preprocessor.
    Config,
    /// Computed from other flags by a preprocessor.
    Derived,
}

impl FlagSource {
    pub fn as_str(self) -> &'static str {
        match self {
            FlagSource::Default => "default",
            FlagSource::CommandLine => "command-line",
            FlagSource::Environment => "environment",
            FlagSource::Config => "config",
            FlagSource::Derived => "derived",
        }
    }
}

impl fmt::Display for FlagSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct FlagEntry {
    value: FlagValue,
    source: FlagSource,
}

/// Current flag values for one command invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlagSet {
    entries: HashMap<String, FlagEntry>,
}

impl FlagSet {
    /// Create an empty flag set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`FlagSet::set`] with [`FlagSource::CommandLine`].
    pub fn with(mut self, name: &str, value: impl Into<FlagValue>) -> Self {
        self.set(name, value.into(), FlagSource::CommandLine);
        self
    }

    /// Set a flag, replacing any previous value.
    pub fn set(&mut self, name: &str, value: FlagValue, source: FlagSource) {
        self.entries
            .insert(name.to_string(), FlagEntry { value, source });
    }

    /// Set a flag only if it is currently absent or empty.
    ///
    /// Returns whether the value was written. Repeated calls with the same
    /// arguments are no-ops after the first, which keeps defaulting
    /// preprocessors idempotent.
    pub fn set_if_empty(&mut self, name: &str, value: FlagValue, source: FlagSource) -> bool {
        if !flag_is_empty(self.value(name)) {
            return false;
        }
        self.set(name, value, source);
        true
    }

    /// Remove a flag entirely.
    pub fn unset(&mut self, name: &str) -> Option<FlagValue> {
        self.entries.remove(name).map(|e| e.value)
    }

    /// The raw value, if any.
    pub fn value(&self, name: &str) -> Option<&FlagValue> {
        self.entries.get(name).map(|e| &e.value)
    }

    /// Where the current value came from.
    pub fn source(&self, name: &str) -> Option<FlagSource> {
        self.entries.get(name).map(|e| e.source)
    }

    /// Whether the flag holds any value, empty or not.
    pub fn is_set(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Whether the user supplied this flag on the command line.
    pub fn changed(&self, name: &str) -> bool {
        self.source(name) == Some(FlagSource::CommandLine)
    }

    /// Whether the flag is absent or holds an empty value.
    pub fn is_empty(&self, name: &str) -> bool {
        flag_is_empty(self.value(name))
    }

    /// String value, or `""` when absent.
    ///
    /// Non-string values are rendered with their `Display` form so string
    /// rules can still inspect them.
    pub fn string(&self, name: &str) -> String {
        match self.value(name) {
            Some(FlagValue::Str(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }

    pub fn bool(&self, name: &str) -> bool {
        self.value(name).and_then(FlagValue::as_bool).unwrap_or(false)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.value(name).and_then(FlagValue::as_int)
    }

    /// List value, or an empty slice when absent.
    pub fn list(&self, name: &str) -> &[String] {
        self.value(name).and_then(FlagValue::as_list).unwrap_or(&[])
    }

    /// Map value, or an empty map when absent.
    pub fn map(&self, name: &str) -> BTreeMap<String, String> {
        self.value(name)
            .and_then(FlagValue::as_map)
            .cloned()
            .unwrap_or_default()
    }

    /// Names of all flags with a value, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.entries.keys().map(String::as_str).collect();
        names.sort();
        names
    }
}
