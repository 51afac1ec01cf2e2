//! flagcheck-types: pure data shared by the flagcheck engine and its front ends.
//!
//! Nothing in here evaluates anything. The kernel owns rule evaluation; this
//! crate only describes:
//!
//! - [`Severity`]: how much a failed rule matters
//! - [`FlagValue`] / [`FlagKind`]: the closed set of shapes a flag can hold
//! - [`FlagSpec`] / [`CommandSpec`]: flag declarations, the target that
//!   flag groups register into before any parsing happens

mod severity;
mod spec;
mod value;

pub use severity::Severity;
pub use spec::{CommandSpec, FlagSpec};
pub use value::{FlagKind, FlagValue};
