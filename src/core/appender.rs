//! Appender trait for log output destinations

use super::{error::Result, log_event::LogEvent, pattern::PatternFormatter};

/// An output sink owned by a logger.
///
/// Implementors provide `write` for already formatted text; `append` renders
/// an event through the appender's layout and writes the result.
pub trait Appender: Send + Sync {
    fn name(&self) -> &str;

    fn formatter(&self) -> &PatternFormatter;

    fn set_formatter(&mut self, formatter: PatternFormatter);

    fn write(&mut self, formatted: &str) -> Result<()>;

    fn flush(&mut self) -> Result<()>;

    /// Flush and release the underlying resource.
    fn close(&mut self) -> Result<()> {
        self.flush()
    }

    fn append(&mut self, event: &LogEvent) -> Result<()> {
        let formatted = self.formatter().format(event);
        self.write(&formatted)
    }
}
