//! Fallback appender used when the real backend cannot be built

use crate::core::{Appender, LogEvent, PatternFormatter, Result};
use std::io::Write;

/// Prints the bare message of every event on stdout, ignoring the layout.
pub struct PassThroughAppender {
    formatter: PatternFormatter,
}

impl PassThroughAppender {
    pub fn new() -> Self {
        Self {
            formatter: PatternFormatter::default(),
        }
    }

    /// Text written for `event`: its message and a newline.
    pub fn render(event: &LogEvent) -> String {
        format!("{}\n", event.data)
    }
}

impl Default for PassThroughAppender {
    fn default() -> Self {
        Self::new()
    }
}

impl Appender for PassThroughAppender {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn formatter(&self) -> &PatternFormatter {
        &self.formatter
    }

    fn set_formatter(&mut self, formatter: PatternFormatter) {
        self.formatter = formatter;
    }

    fn append(&mut self, event: &LogEvent) -> Result<()> {
        self.write(&Self::render(event))
    }

    fn write(&mut self, formatted: &str) -> Result<()> {
        std::io::stdout().lock().write_all(formatted.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        std::io::stdout().flush()?;
        Ok(())
    }
}
