//! Named ANSI color schemes
//!
//! A scheme maps level names and directive token categories to escape
//! sequences. Schemes are registered by name in a process-wide table and
//! referenced from pattern options through `color_scheme`.

use super::error::{LoggerError, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

/// Escape sequence that restores the terminal's default attributes.
pub const RESET: &str = "\x1b[0m";

static SCHEMES: OnceLock<RwLock<HashMap<String, Arc<ColorScheme>>>> = OnceLock::new();

fn table() -> &'static RwLock<HashMap<String, Arc<ColorScheme>>> {
    SCHEMES.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Category of output produced by a directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Token {
    Logger,
    Date,
    File,
    FileLine,
    Line,
    Method,
    Message,
    Pid,
    Time,
    Thread,
    ThreadId,
    Mdc,
    Ndc,
}

impl Token {
    pub fn as_str(&self) -> &'static str {
        match self {
            Token::Logger => "logger",
            Token::Date => "date",
            Token::File => "file",
            Token::FileLine => "file_line",
            Token::Line => "line",
            Token::Method => "method",
            Token::Message => "message",
            Token::Pid => "pid",
            Token::Time => "time",
            Token::Thread => "thread",
            Token::ThreadId => "thread_id",
            Token::Mdc => "mdc",
            Token::Ndc => "ndc",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Token {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        let token = match s.to_ascii_lowercase().as_str() {
            "logger" => Token::Logger,
            "date" => Token::Date,
            "file" => Token::File,
            "file_line" => Token::FileLine,
            "line" => Token::Line,
            "method" => Token::Method,
            "message" => Token::Message,
            "pid" => Token::Pid,
            "time" => Token::Time,
            "thread" => Token::Thread,
            "thread_id" => Token::ThreadId,
            "mdc" => Token::Mdc,
            "ndc" => Token::Ndc,
            _ => {
                return Err(LoggerError::config(
                    "ColorScheme",
                    format!("unknown token '{}'", s),
                ))
            }
        };
        Ok(token)
    }
}

/// Resolve a color to its escape sequence.
///
/// Accepts raw escape sequences unchanged, or any color name understood by
/// [`colored::Color`] (`blue`, `bright red`, `purple`, ...).
///
/// # Errors
///
/// Returns [`LoggerError::InvalidConfiguration`] for unknown names.
pub fn escape_for(color: &str) -> Result<String> {
    if color.starts_with('\x1b') {
        return Ok(color.to_string());
    }
    let parsed: colored::Color = color.trim().parse().map_err(|_| {
        LoggerError::config("ColorScheme", format!("unknown color '{}'", color))
    })?;
    Ok(format!("\x1b[{}m", parsed.to_fg_str()))
}

/// Mapping from levels and tokens to escape sequences.
///
/// # Example
///
/// ```
/// use rust_logger_registry::core::{color_scheme, ColorScheme, Token};
///
/// ColorScheme::new("docs")
///     .with_level("error", "red").unwrap()
///     .with_token(Token::Date, "blue").unwrap()
///     .register();
///
/// let scheme = color_scheme::lookup("docs").unwrap();
/// assert_eq!(scheme.level_escape("error"), Some("\x1b[31m"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorScheme {
    name: String,
    levels: BTreeMap<String, String>,
    tokens: BTreeMap<Token, String>,
}

impl ColorScheme {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            levels: BTreeMap::new(),
            tokens: BTreeMap::new(),
        }
    }

    /// Set the color of a level.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`] for unknown colors.
    pub fn with_level(mut self, level: &str, color: &str) -> Result<Self> {
        self.set_level(level, color)?;
        Ok(self)
    }

    /// Set the color of a token category.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`] for unknown colors.
    pub fn with_token(mut self, token: Token, color: &str) -> Result<Self> {
        self.set_token(token, color)?;
        Ok(self)
    }

    pub fn set_level(&mut self, level: &str, color: &str) -> Result<()> {
        let escape = escape_for(color)?;
        self.levels.insert(level.to_ascii_lowercase(), escape);
        Ok(())
    }

    pub fn set_token(&mut self, token: Token, color: &str) -> Result<()> {
        let escape = escape_for(color)?;
        self.tokens.insert(token, escape);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level_escape(&self, level: &str) -> Option<&str> {
        self.levels.get(&level.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn token_escape(&self, token: Token) -> Option<&str> {
        self.tokens.get(&token).map(String::as_str)
    }

    pub fn levels(&self) -> &BTreeMap<String, String> {
        &self.levels
    }

    pub fn tokens(&self) -> &BTreeMap<Token, String> {
        &self.tokens
    }

    /// Finalize and register under the scheme's name, replacing any scheme
    /// previously registered with that name.
    pub fn register(self) -> Arc<ColorScheme> {
        let scheme = Arc::new(self);
        table()
            .write()
            .insert(scheme.name.clone(), Arc::clone(&scheme));
        scheme
    }
}

/// Look up a registered scheme.
///
/// # Errors
///
/// Returns [`LoggerError::InvalidConfiguration`] when no scheme has that name.
pub fn lookup(name: &str) -> Result<Arc<ColorScheme>> {
    table().read().get(name).cloned().ok_or_else(|| {
        LoggerError::config("ColorScheme", format!("no color scheme named '{}'", name))
    })
}

pub fn is_registered(name: &str) -> bool {
    table().read().contains_key(name)
}

pub fn remove(name: &str) -> Option<Arc<ColorScheme>> {
    table().write().remove(name)
}
