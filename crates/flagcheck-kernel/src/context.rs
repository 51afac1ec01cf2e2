//! Request-scoped context for validation and command execution.

use std::collections::BTreeMap;

use tokio_util::sync::CancellationToken;

use crate::flags::FlagSet;

/// Ambient data threaded through every rule and preprocessor call.
///
/// Every field is optional; `ValidationContext::default()` stands in for an
/// absent context.
#[derive(Debug, Clone, Default)]
pub struct ValidationContext {
    /// Command being validated (`deploy`, `rollback`, ...).
    pub command: Option<String>,
    /// Finer-grained operation within the command, if any.
    pub operation: Option<String>,
    /// Free-form labels for custom rules.
    pub metadata: BTreeMap<String, String>,
    cancel: CancellationToken,
}

impl ValidationContext {
    /// Create a context for a named command.
    pub fn for_command(command: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
            ..Self::default()
        }
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Tie this context to an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The token governing this context.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Command name, or `""` when absent.
    pub fn command_name(&self) -> &str {
        self.command.as_deref().unwrap_or("")
    }
}

/// What a command body receives: its flags and its context.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    pub flags: FlagSet,
    pub context: ValidationContext,
}

impl Invocation {
    pub fn new(flags: FlagSet, context: ValidationContext) -> Self {
        Self { flags, context }
    }
}
