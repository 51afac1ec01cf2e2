//! flagcheck-kernel: the flag validation engine.
//!
//! A command declares its flags through [`FlagGroup`]s, the front end parses
//! argv into a [`FlagSet`], and a [`Validator`] decides whether the command may
//! run:
//!
//! ```text
//!   FlagGroup ──register_flags──▶ CommandSpec ──(front end parses)──▶ FlagSet
//!       │                                                              │
//!       └──rules──▶ Validator ◀── preprocessors ◀──────────────────────┘
//!                      │
//!                      ▼
//!              Option<ValidationReport>
//! ```
//!
//! Error-severity failures block execution and are all reported together.
//! Warnings and info notices go to a [`DiagnosticSink`] and never block.
//! [`FlagValidation`] plugs the validator into a [`Chain`] of middleware in
//! front of the command body.

pub mod context;
pub mod diagnostics;
pub mod error;
pub mod flags;
pub mod group;
pub mod middleware;
pub mod preprocess;
pub mod rules;
pub mod validator;

pub use context::{Invocation, ValidationContext};
pub use diagnostics::{ConsoleSink, DiagnosticSink, MemorySink, TracingSink};
pub use error::{BoxError, PatternError, RuleError, RuleFailure, RuleFailures, ValidationError};
pub use flags::{FlagSet, FlagSource, IsEmpty, is_empty};
pub use group::{FlagGroup, RuleGroup};
pub use middleware::{Chain, FlagValidation, Handler, Middleware, Traced};
pub use preprocess::{EnvDefault, FnPreprocessor, Normalize, Preprocessor, StaticDefaults};
pub use rules::{
    Accessor, Conflict, Dependency, FieldAccessor, FileExists, FileExtension, FnRule, Pattern,
    RegionFormat, Required, Rule,
};
pub use validator::{ValidationReport, Validator};

pub use flagcheck_types::{CommandSpec, FlagKind, FlagSpec, FlagValue, Severity};
