//! Appender over an arbitrary writer

use crate::core::{Appender, LoggerError, PatternFormatter, Result};
use std::io::Write;

/// Writes formatted events to any `Write` implementation.
///
/// # Example
///
/// ```
/// use rust_logger_registry::appenders::IoAppender;
/// use rust_logger_registry::core::Appender;
///
/// let appender = IoAppender::new("buffer", Vec::<u8>::new());
/// assert_eq!(appender.name(), "buffer");
/// ```
pub struct IoAppender {
    name: String,
    writer: Option<Box<dyn Write + Send + Sync>>,
    formatter: PatternFormatter,
}

impl IoAppender {
    pub fn new<W>(name: impl Into<String>, writer: W) -> Self
    where
        W: Write + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            writer: Some(Box::new(writer)),
            formatter: PatternFormatter::default(),
        }
    }

    #[must_use]
    pub fn with_formatter(mut self, formatter: PatternFormatter) -> Self {
        self.formatter = formatter;
        self
    }
}

impl Appender for IoAppender {
    fn name(&self) -> &str {
        &self.name
    }

    fn formatter(&self) -> &PatternFormatter {
        &self.formatter
    }

    fn set_formatter(&mut self, formatter: PatternFormatter) {
        self.formatter = formatter;
    }

    fn write(&mut self, formatted: &str) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::writer(format!("appender '{}' is closed", self.name)))?;
        writer.write_all(formatted.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.flush()?;
        self.writer = None;
        Ok(())
    }
}
