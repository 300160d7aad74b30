//! Line oriented output used by the demo pipelines.

use std::{cell::RefCell, rc::Rc};

use tracing::info;

/// Destination for human readable output lines.
pub trait OutputSink {
    fn write_line(&self, line: &str);
}

/// Prints every line to stdout.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn write_line(&self, line: &str) {
        println!("{line}");
    }
}

/// Emits every line as an `info` level `tracing` event.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl OutputSink for TracingSink {
    fn write_line(&self, line: &str) {
        info!(target: "rxlite::sink", "{line}");
    }
}

/// Keeps every line in memory. Clones share the same buffer.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    lines: Rc<RefCell<Vec<String>>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines written so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    /// Returns `true` if any written line equals `line`.
    #[must_use]
    pub fn contains(&self, line: &str) -> bool {
        self.lines.borrow().iter().any(|l| l == line)
    }
}

impl OutputSink for MemorySink {
    fn write_line(&self, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }
}
