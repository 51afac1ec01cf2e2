//! Where command output goes: stdout, or a buffer in tests.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
pub enum Output {
    #[default]
    Stdout,
    Buffer(Arc<Mutex<Vec<u8>>>),
}

impl Output {
    pub fn buffer() -> Self {
        Output::Buffer(Arc::new(Mutex::new(Vec::new())))
    }

    /// Write `text` followed by a newline.
    pub fn line(&self, text: &str) -> io::Result<()> {
        match self {
            Output::Stdout => {
                let mut out = io::stdout().lock();
                writeln!(out, "{text}")?;
                out.flush()
            }
            Output::Buffer(buf) => {
                let mut buf = match buf.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                writeln!(buf, "{text}")
            }
        }
    }

    /// Everything written so far. Always empty for stdout.
    pub fn contents(&self) -> String {
        match self {
            Output::Stdout => String::new(),
            Output::Buffer(buf) => {
                let bytes = match buf.lock() {
                    Ok(guard) => guard.clone(),
                    Err(poisoned) => poisoned.into_inner().clone(),
                };
                String::from_utf8_lossy(&bytes).into_owned()
            }
        }
    }
}
