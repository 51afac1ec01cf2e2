//! Flag declarations.
//!
//! A [`CommandSpec`] is what flag groups register into. Front ends turn it
//! into whatever their argument parser wants; the kernel uses it to seed
//! declared defaults.

use serde::{Deserialize, Serialize};

use crate::value::{FlagKind, FlagValue};

/// A single flag declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagSpec {
    /// Long name without dashes (`region` for `--region`).
    pub name: String,
    pub kind: FlagKind,
    /// Help text shown by the front end.
    pub help: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<FlagValue>,
    #[serde(default)]
    pub hidden: bool,
}

impl FlagSpec {
    pub fn new(name: impl Into<String>, kind: FlagKind, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            help: help.into(),
            short: None,
            default: None,
            hidden: false,
        }
    }

    pub fn string(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self::new(name, FlagKind::String, help)
    }

    pub fn bool(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self::new(name, FlagKind::Bool, help)
    }

    pub fn int(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self::new(name, FlagKind::Int, help)
    }

    pub fn list(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self::new(name, FlagKind::List, help)
    }

    pub fn map(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self::new(name, FlagKind::Map, help)
    }

    pub fn with_short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn with_default(mut self, default: impl Into<FlagValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// The flag-registration target for one command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub name: String,
    pub about: String,
    /// Declared flags, in registration order.
    pub flags: Vec<FlagSpec>,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>, about: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            about: about.into(),
            flags: Vec::new(),
        }
    }

    /// Builder form of [`CommandSpec::add_flag`].
    pub fn flag(mut self, spec: FlagSpec) -> Self {
        self.add_flag(spec);
        self
    }

    /// Declare a flag.
    ///
    /// The first declaration of a name wins. Returns `false` when a flag with
    /// the same name was already declared and this one was ignored, which
    /// happens when two groups govern the same flag.
    pub fn add_flag(&mut self, spec: FlagSpec) -> bool {
        if self.get(&spec.name).is_some() {
            return false;
        }
        self.flags.push(spec);
        true
    }

    pub fn get(&self, name: &str) -> Option<&FlagSpec> {
        self.flags.iter().find(|f| f.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().map(|f| f.name.as_str())
    }
}
