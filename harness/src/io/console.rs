//! Host-visible console output.
//!
//! This is the product log stream the host shows to the player, distinct from
//! developer tracing in [`crate::logging`]. Every message is a single line
//! beginning with a bracketed tag.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

/// Tag for profiler notices.
pub const PROFILER_TAG: &str = "[Profiler]";

/// Receives console lines.
pub trait ConsoleSink {
    fn line(&self, line: &str);
}

/// Writes console lines to stdout.
#[derive(Debug, Default)]
pub struct StdoutConsole;

impl ConsoleSink for StdoutConsole {
    fn line(&self, line: &str) {
        let mut stdout = std::io::stdout().lock();
        // A closed stdout must not take the tick down with it.
        let _ = writeln!(stdout, "{line}");
    }
}

/// Keeps every console line in memory.
#[derive(Debug, Default, Clone)]
pub struct RecordingConsole {
    lines: Rc<RefCell<Vec<String>>>,
}

impl RecordingConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    /// Lines starting with `tag`.
    pub fn tagged(&self, tag: &str) -> Vec<String> {
        self.lines
            .borrow()
            .iter()
            .filter(|line| line.starts_with(tag))
            .cloned()
            .collect()
    }
}

impl ConsoleSink for RecordingConsole {
    fn line(&self, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }
}
