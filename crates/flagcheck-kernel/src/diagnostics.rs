//! Where non-fatal findings go.
//!
//! Warnings and informational notices are emitted during the validation pass,
//! one message per call, in rule-evaluation order.

use std::io::{self, Write};
use std::sync::Mutex;

use flagcheck_types::Severity;

/// Destination for warning and info messages.
pub trait DiagnosticSink: Send + Sync {
    fn warning(&self, message: &str);
    fn info(&self, message: &str);
}

/// Routes diagnostics to `tracing`. The default sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn warning(&self, message: &str) {
        tracing::warn!(target: "flagcheck::diagnostics", "{message}");
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "flagcheck::diagnostics", "{message}");
    }
}

/// Prefix for warning lines written by [`ConsoleSink`].
pub const WARNING_PREFIX: &str = "warning: ";
/// Prefix for info lines written by [`ConsoleSink`].
pub const INFO_PREFIX: &str = "info: ";

/// Writes `warning: ...` / `info: ...` lines to a writer (stderr by default).
pub struct ConsoleSink<W: Write + Send = io::Stderr> {
    out: Mutex<W>,
}

impl ConsoleSink<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Recover the writer, e.g. to inspect a buffer.
    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn line(&self, prefix: &str, message: &str) {
        let mut out = match self.out.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // A closed stderr is not worth failing validation over.
        let _ = writeln!(out, "{prefix}{message}");
    }
}

impl<W: Write + Send> DiagnosticSink for ConsoleSink<W> {
    fn warning(&self, message: &str) {
        self.line(WARNING_PREFIX, message);
    }

    fn info(&self, message: &str) {
        self.line(INFO_PREFIX, message);
    }
}

/// Captures diagnostics in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    messages: Mutex<Vec<(Severity, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, in order.
    pub fn messages(&self) -> Vec<(Severity, String)> {
        match self.messages.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn warnings(&self) -> Vec<String> {
        self.of(Severity::Warning)
    }

    pub fn infos(&self) -> Vec<String> {
        self.of(Severity::Info)
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.messages.lock() {
            guard.clear();
        }
    }

    fn of(&self, severity: Severity) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|(s, _)| *s == severity)
            .map(|(_, m)| m)
            .collect()
    }

    fn record(&self, severity: Severity, message: &str) {
        match self.messages.lock() {
            Ok(mut guard) => guard.push((severity, message.to_string())),
            Err(poisoned) => poisoned
                .into_inner()
                .push((severity, message.to_string())),
        }
    }
}

impl DiagnosticSink for MemorySink {
    fn warning(&self, message: &str) {
        self.record(Severity::Warning, message);
    }

    fn info(&self, message: &str) {
        self.record(Severity::Info, message);
    }
}
