//! Level definitions
//!
//! Severities are assigned by position in an ordered list of level names, so a
//! process can add levels such as `step` or `todo` next to the conventional
//! ones. The list is installed once per process with [`define`]; every logger
//! and formatter reads it through [`global`].

use super::error::{LoggerError, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Largest number of levels a set may hold (one bit per level in the enabled mask).
pub const MAX_LEVELS: usize = 64;

/// Level list installed when nothing was defined explicitly.
pub const DEFAULT_LEVELS: [&str; 8] = [
    "trace", "debug", "info", "step", "warn", "error", "fatal", "todo",
];

/// Name accepted by [`LevelSet::parse_threshold`] to disable every gated level.
pub const OFF: &str = "off";

static GLOBAL: OnceLock<LevelSet> = OnceLock::new();

/// Levels this crate gives special meaning to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinLevel {
    Trace,
    Debug,
    Info,
    Step,
    Warn,
    Error,
    Fatal,
    Todo,
}

impl BuiltinLevel {
    pub const ALL: [BuiltinLevel; 8] = [
        BuiltinLevel::Trace,
        BuiltinLevel::Debug,
        BuiltinLevel::Info,
        BuiltinLevel::Step,
        BuiltinLevel::Warn,
        BuiltinLevel::Error,
        BuiltinLevel::Fatal,
        BuiltinLevel::Todo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuiltinLevel::Trace => "trace",
            BuiltinLevel::Debug => "debug",
            BuiltinLevel::Info => "info",
            BuiltinLevel::Step => "step",
            BuiltinLevel::Warn => "warn",
            BuiltinLevel::Error => "error",
            BuiltinLevel::Fatal => "fatal",
            BuiltinLevel::Todo => "todo",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    /// Color used when a scheme gives a level no explicit escape.
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            BuiltinLevel::Trace => BrightBlack,
            BuiltinLevel::Debug => Cyan,
            BuiltinLevel::Info | BuiltinLevel::Step => Green,
            BuiltinLevel::Warn => Yellow,
            BuiltinLevel::Error => Red,
            BuiltinLevel::Fatal => BrightRed,
            BuiltinLevel::Todo => Magenta,
        }
    }
}

impl fmt::Display for BuiltinLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuiltinLevel {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_ascii_lowercase();
        BuiltinLevel::ALL
            .iter()
            .copied()
            .find(|level| level.as_str() == lower || (lower == "warning" && *level == BuiltinLevel::Warn))
            .ok_or_else(|| LoggerError::config("BuiltinLevel", format!("Invalid log level: '{}'", s)))
    }
}

/// Ordered mapping from level name to severity.
///
/// Severity is the position in the list; lower severities are more verbose.
/// `todo` is always on: it is ranked like any other level but emission at that
/// severity ignores the logger threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelSet {
    names: Vec<String>,
    upper: Vec<String>,
    builtin: [Option<u32>; 8],
    max_name_len: usize,
}

impl LevelSet {
    /// Build a level set from names ordered least to most severe.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`] when the list is empty,
    /// too long, contains blank or duplicate names, or places the built-in
    /// levels out of their canonical order.
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = names
            .into_iter()
            .map(|name| name.as_ref().trim().to_ascii_lowercase())
            .collect();

        if names.is_empty() {
            return Err(LoggerError::config("LevelSet", "at least one level is required"));
        }
        if names.len() > MAX_LEVELS {
            return Err(LoggerError::config(
                "LevelSet",
                format!("{} levels defined, at most {} supported", names.len(), MAX_LEVELS),
            ));
        }

        let mut builtin = [None; 8];
        let mut last_ordered: Option<BuiltinLevel> = None;
        for (severity, name) in names.iter().enumerate() {
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(LoggerError::config(
                    "LevelSet",
                    format!("invalid level name '{}'", name),
                ));
            }
            if name == OFF {
                return Err(LoggerError::config("LevelSet", "'off' is reserved"));
            }
            if names[..severity].contains(name) {
                return Err(LoggerError::config(
                    "LevelSet",
                    format!("level '{}' defined twice", name),
                ));
            }
            if let Ok(level) = name.parse::<BuiltinLevel>() {
                if level.as_str() != name {
                    // "warning" aliases warn for parsing only
                    continue;
                }
                if level != BuiltinLevel::Todo {
                    if let Some(previous) = last_ordered {
                        if previous.index() > level.index() {
                            return Err(LoggerError::config(
                                "LevelSet",
                                format!("level '{}' must rank above '{}'", previous, level),
                            ));
                        }
                    }
                    last_ordered = Some(level);
                }
                builtin[level.index()] = Some(severity as u32);
            }
        }

        let upper = names.iter().map(|n| n.to_ascii_uppercase()).collect();
        let max_name_len = names.iter().map(String::len).max().unwrap_or(0);

        Ok(Self {
            names,
            upper,
            builtin,
            max_name_len,
        })
    }

    /// Severity of `name`, case-insensitive.
    pub fn severity(&self, name: &str) -> Option<u32> {
        self.names
            .iter()
            .position(|n| n.eq_ignore_ascii_case(name))
            .map(|idx| idx as u32)
    }

    /// Lower-case name of `severity`.
    pub fn name(&self, severity: u32) -> Option<&str> {
        self.names.get(severity as usize).map(String::as_str)
    }

    /// Upper-case name of `severity`, as rendered by the `%l` directive.
    pub fn display_name(&self, severity: u32) -> Option<&str> {
        self.upper.get(severity as usize).map(String::as_str)
    }

    #[inline]
    pub fn builtin(&self, level: BuiltinLevel) -> Option<u32> {
        self.builtin[level.index()]
    }

    /// Width of the longest level name, used to align level columns.
    pub fn max_name_len(&self) -> usize {
        self.max_name_len
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(idx, name)| (idx as u32, name.as_str()))
    }

    /// Whether emission at `severity` bypasses the logger threshold.
    #[inline]
    pub fn is_always_on(&self, severity: u32) -> bool {
        self.builtin(BuiltinLevel::Todo) == Some(severity)
    }

    /// Parse a threshold given as a level name, `off`, or a decimal severity.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`] for anything that does not
    /// name a defined severity.
    pub fn parse_threshold(&self, text: &str) -> Result<u32> {
        let text = text.trim();
        if let Some(severity) = self.severity(text) {
            return Ok(severity);
        }
        if text.eq_ignore_ascii_case(OFF) {
            return Ok(self.len() as u32);
        }
        if text.eq_ignore_ascii_case("warning") {
            if let Some(severity) = self.builtin(BuiltinLevel::Warn) {
                return Ok(severity);
            }
        }
        match text.parse::<u32>() {
            Ok(severity) => self.check_threshold(severity),
            Err(_) => Err(LoggerError::config(
                "Logger",
                format!("'{}' is neither a level name nor an integer severity", text),
            )),
        }
    }

    /// Validate a numeric threshold; `len()` means "off".
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`] when out of range.
    pub fn check_threshold(&self, severity: u32) -> Result<u32> {
        if (severity as usize) <= self.len() {
            Ok(severity)
        } else {
            Err(LoggerError::config(
                "Logger",
                format!(
                    "severity {} is out of range (0..={})",
                    severity,
                    self.len()
                ),
            ))
        }
    }

    /// Bitmask of levels enabled under `threshold`.
    ///
    /// Bit `n` is set when severity `n` would be emitted. Always-on levels are
    /// set regardless of the threshold.
    pub fn enabled_mask(&self, threshold: u32) -> u64 {
        let mut mask = 0u64;
        for severity in 0..self.len() as u32 {
            if severity >= threshold || self.is_always_on(severity) {
                mask |= 1u64 << severity;
            }
        }
        mask
    }
}

impl Default for LevelSet {
    fn default() -> Self {
        Self::new(DEFAULT_LEVELS).expect("default level list is valid")
    }
}

/// Install the process-wide level set.
///
/// Redefining with the same list is a no-op.
///
/// # Errors
///
/// Returns [`LoggerError::InvalidConfiguration`] when the list is invalid or
/// conflicts with the set already installed.
pub fn define<I, S>(names: I) -> Result<&'static LevelSet>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let candidate = LevelSet::new(names)?;
    let installed = GLOBAL.get_or_init(|| candidate.clone());
    if *installed == candidate {
        Ok(installed)
    } else {
        Err(LoggerError::config(
            "LevelSet",
            format!(
                "levels already defined as [{}], cannot redefine as [{}]",
                installed.names().join(", "),
                candidate.names().join(", ")
            ),
        ))
    }
}

/// The process-wide level set, installing [`DEFAULT_LEVELS`] on first use.
pub fn global() -> &'static LevelSet {
    GLOBAL.get_or_init(LevelSet::default)
}
