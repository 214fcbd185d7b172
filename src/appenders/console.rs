//! Console appender implementation

use crate::core::{Appender, LogEvent, PatternFormatter, Result};
use std::io::Write;

/// Standard stream written by a [`ConsoleAppender`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleTarget {
    Stdout,
    Stderr,
}

impl ConsoleTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsoleTarget::Stdout => "stdout",
            ConsoleTarget::Stderr => "stderr",
        }
    }
}

pub struct ConsoleAppender {
    target: ConsoleTarget,
    use_colors: bool,
    formatter: PatternFormatter,
    plain: PatternFormatter,
}

impl ConsoleAppender {
    /// Appender on stdout, colored when the terminal supports it.
    pub fn new() -> Self {
        Self::with_target(ConsoleTarget::Stdout)
    }

    pub fn stderr() -> Self {
        Self::with_target(ConsoleTarget::Stderr)
    }

    pub fn with_target(target: ConsoleTarget) -> Self {
        let formatter = PatternFormatter::default();
        Self {
            target,
            use_colors: colored::control::SHOULD_COLORIZE.should_colorize(),
            plain: formatter.without_colors(),
            formatter,
        }
    }

    /// Force color output on or off, regardless of terminal detection.
    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Set the layout for this appender
    ///
    /// # Example
    ///
    /// ```
    /// use rust_logger_registry::appenders::ConsoleAppender;
    /// use rust_logger_registry::PatternFormatter;
    ///
    /// let appender = ConsoleAppender::new()
    ///     .with_formatter(PatternFormatter::from_pattern("%5l: %m\n").unwrap());
    /// ```
    #[must_use]
    pub fn with_formatter(mut self, formatter: PatternFormatter) -> Self {
        self.set_formatter(formatter);
        self
    }

    pub fn target(&self) -> ConsoleTarget {
        self.target
    }
}

impl Default for ConsoleAppender {
    fn default() -> Self {
        Self::new()
    }
}

impl Appender for ConsoleAppender {
    fn name(&self) -> &str {
        self.target.as_str()
    }

    fn formatter(&self) -> &PatternFormatter {
        &self.formatter
    }

    fn set_formatter(&mut self, formatter: PatternFormatter) {
        self.plain = formatter.without_colors();
        self.formatter = formatter;
    }

    fn append(&mut self, event: &LogEvent) -> Result<()> {
        let formatted = if self.use_colors {
            self.formatter.format(event)
        } else {
            self.plain.format(event)
        };
        self.write(&formatted)
    }

    fn write(&mut self, formatted: &str) -> Result<()> {
        match self.target {
            ConsoleTarget::Stdout => std::io::stdout().lock().write_all(formatted.as_bytes())?,
            ConsoleTarget::Stderr => std::io::stderr().lock().write_all(formatted.as_bytes())?,
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        match self.target {
            ConsoleTarget::Stdout => std::io::stdout().flush()?,
            ConsoleTarget::Stderr => std::io::stderr().flush()?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_names() {
        assert_eq!(ConsoleAppender::new().name(), "stdout");
        assert_eq!(ConsoleAppender::stderr().name(), "stderr");
    }

    #[test]
    fn test_console_append() {
        let mut appender = ConsoleAppender::new()
            .with_colors(false)
            .with_formatter(PatternFormatter::from_pattern("%l %m\n").unwrap());
        let event = LogEvent::new("console-test", 2, "visible on stdout", None);
        appender.append(&event).unwrap();
        appender.flush().unwrap();
        assert_eq!(appender.formatter().pattern(), "%l %m\n");
    }
}
