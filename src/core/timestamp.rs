//! Timestamp formatting utilities
//!
//! Backs the `%d` directive. A format is either one of the predefined
//! renderings (selected by a pattern's `date_method`) or a strftime pattern
//! (a pattern's `date_pattern`) in which `%s` stands for the six-digit
//! microsecond fraction.

use super::error::{LoggerError, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Default `date_pattern`: ISO 8601 with microseconds, local time.
pub const DEFAULT_DATE_PATTERN: &str = "%Y-%m-%dT%H:%M:%S.%s";

/// Timestamp format options
///
/// # Examples
///
/// ```
/// use rust_logger_registry::core::TimestampFormat;
/// use chrono::Local;
///
/// let format = TimestampFormat::custom("%Y-%m-%d %H:%M:%S.%s").unwrap();
/// let rendered = format.format(&Local::now());
/// assert_eq!(rendered.len(), 26);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// ISO 8601 with milliseconds and offset: `2025-01-08T10:30:45.123+01:00`
    #[default]
    Iso8601,

    /// ISO 8601 with microseconds and offset: `2025-01-08T10:30:45.123456+01:00`
    Iso8601Micros,

    /// RFC 3339 format: `2025-01-08T10:30:45.123456789+01:00`
    Rfc3339,

    /// Unix timestamp in seconds: `1736332245`
    Unix,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Unix timestamp in microseconds: `1736332245123456`
    UnixMicros,

    /// strftime pattern, `%s` meaning microseconds
    Custom(DatePattern),
}

/// A strftime pattern checked and translated to chrono syntax once.
///
/// Serializes as the pattern text it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DatePattern {
    source: String,
    translated: String,
}

impl DatePattern {
    /// # Errors
    ///
    /// Returns [`LoggerError::Pattern`] when chrono rejects a specifier.
    pub fn new(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let translated = translate_micros(&source);
        if StrftimeItems::new(&translated).any(|item| matches!(item, Item::Error)) {
            return Err(LoggerError::pattern(source, "invalid date pattern"));
        }
        Ok(Self { source, translated })
    }

    /// Pattern as written, before `%s` translation.
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl TryFrom<String> for DatePattern {
    type Error = LoggerError;

    fn try_from(source: String) -> Result<Self> {
        Self::new(source)
    }
}

impl From<DatePattern> for String {
    fn from(pattern: DatePattern) -> Self {
        pattern.source
    }
}

impl TimestampFormat {
    /// Build a validated strftime format.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::Pattern`] when chrono rejects a specifier.
    pub fn custom(pattern: impl Into<String>) -> Result<Self> {
        DatePattern::new(pattern).map(TimestampFormat::Custom)
    }

    /// Resolve a `date_method` name.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`] for unknown names.
    pub fn from_method(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "iso8601" => Ok(TimestampFormat::Iso8601),
            "iso8601_micros" => Ok(TimestampFormat::Iso8601Micros),
            "rfc3339" | "to_s" => Ok(TimestampFormat::Rfc3339),
            "unix" | "to_i" => Ok(TimestampFormat::Unix),
            "unix_millis" => Ok(TimestampFormat::UnixMillis),
            "unix_micros" | "usec" => Ok(TimestampFormat::UnixMicros),
            other => Err(LoggerError::config(
                "PatternFormatter",
                format!("unknown date method '{}'", other),
            )),
        }
    }

    #[must_use]
    pub fn format(&self, datetime: &DateTime<Local>) -> String {
        match self {
            TimestampFormat::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string(),
            TimestampFormat::Iso8601Micros => {
                datetime.format("%Y-%m-%dT%H:%M:%S%.6f%:z").to_string()
            }
            TimestampFormat::Rfc3339 => datetime.to_rfc3339(),
            TimestampFormat::Unix => datetime.timestamp().to_string(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::UnixMicros => datetime.timestamp_micros().to_string(),
            TimestampFormat::Custom(pattern) => datetime.format(&pattern.translated).to_string(),
        }
    }

    /// Check if this is a Unix-based numeric format
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TimestampFormat::Unix | TimestampFormat::UnixMillis | TimestampFormat::UnixMicros
        )
    }
}

/// Rewrite `%s` to chrono's six-digit fraction, leaving `%%` escapes alone.
fn translate_micros(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 4);
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('s') => out.push_str("%6f"),
            Some(next) => {
                out.push('%');
                out.push(next);
            }
            None => out.push('%'),
        }
    }
    out
}
