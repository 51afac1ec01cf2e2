//! Rule severity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How much a failed rule matters.
///
/// Ordered by blocking power: `Info < Warning < Error`. Only `Error`
/// stops a command from running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Reported, never aggregated.
    Info,
    /// Reported and returned alongside the verdict, non-blocking.
    Warning,
    /// Blocks execution.
    Error,
}

impl Severity {
    /// Whether a failure at this severity prevents the command from running.
    pub fn blocks(self) -> bool {
        matches!(self, Severity::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_follows_blocking_power() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert_eq!(
            [Severity::Error, Severity::Info, Severity::Warning]
                .into_iter()
                .max(),
            Some(Severity::Error)
        );
    }

    #[test]
    fn only_error_blocks() {
        assert!(Severity::Error.blocks());
        assert!(!Severity::Warning.blocks());
        assert!(!Severity::Info.blocks());
    }

    #[test]
    fn serde_is_lowercase() {
        let json = serde_json::to_string(&Severity::Warning).unwrap();
        assert_eq!(json, "\"warning\"");
        let back: Severity = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(back, Severity::Error);
    }
}
