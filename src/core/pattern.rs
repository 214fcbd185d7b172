//! Pattern-based event formatting
//!
//! A pattern is literal text interleaved with `%` directives. Each directive
//! may carry printf-style modifiers: `-` left-justifies, a number sets the
//! minimum width and `.N` truncates to `N` characters (`%-5l`, `%.1l`).
//!
//! | Directive | Output                                              |
//! |-----------|-----------------------------------------------------|
//! | `%c`      | logger name                                         |
//! | `%d`      | event time, see `date_pattern` / `date_method`      |
//! | `%F`      | full source file path                               |
//! | `%f`      | source file base name                               |
//! | `%L`      | source line                                         |
//! | `%l`      | level name, upper case                              |
//! | `%M`      | method (module path)                                |
//! | `%m`      | message                                             |
//! | `%p`      | process id                                          |
//! | `%r`      | milliseconds since the formatter was created        |
//! | `%t`      | thread id                                           |
//! | `%T`      | thread name                                         |
//! | `%C`      | `(file::line)` with an embedded color escape        |
//! | `%g`      | like `%C`, keeping only the last two directories    |
//! | `%X{key}` | mapped diagnostic context value                     |
//! | `%x`      | nested diagnostic context                           |
//! | `%%`      | a literal `%`                                       |

use super::color_scheme::{self, ColorScheme, Token, RESET};
use super::diagnostic_context::{MappedContext, NestedContext};
use super::error::{LoggerError, Result};
use super::level_set::{self, LevelSet};
use super::log_event::LogEvent;
use super::timestamp::{TimestampFormat, DEFAULT_DATE_PATTERN};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path};
use std::sync::Arc;

/// Pattern used when options do not name one.
pub const DEFAULT_PATTERN: &str = "[%d] %-5l -- %c : %m\n";

/// Escape embedded by `%C` and `%g` around the file position.
pub const FILE_LINE_ESCAPE: &str = "\x1b[38;5;25m";

/// Options consumed by [`PatternFormatter::new`].
///
/// # Example
///
/// ```
/// use rust_logger_registry::core::{PatternFormatter, PatternOptions};
///
/// let options = PatternOptions::new()
///     .with_pattern("%d %5l: %m")
///     .with_date_pattern("%Y-%m-%d %H:%M:%S");
/// let formatter = PatternFormatter::new(&options).unwrap();
/// assert_eq!(formatter.pattern(), "%d %5l: %m");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternOptions {
    pub pattern: Option<String>,
    pub date_pattern: Option<String>,
    pub date_method: Option<String>,
    pub color_scheme: Option<String>,
}

impl PatternOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    #[must_use]
    pub fn with_date_pattern(mut self, date_pattern: impl Into<String>) -> Self {
        self.date_pattern = Some(date_pattern.into());
        self
    }

    #[must_use]
    pub fn with_date_method(mut self, date_method: impl Into<String>) -> Self {
        self.date_method = Some(date_method.into());
        self
    }

    #[must_use]
    pub fn with_color_scheme(mut self, name: impl Into<String>) -> Self {
        self.color_scheme = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Directive {
    Logger,
    Date,
    FullFile,
    BaseFile,
    Line,
    Level,
    Method,
    Message,
    Pid,
    Elapsed,
    ThreadId,
    ThreadName,
    FileLine,
    ShortFileLine,
    Mdc(String),
    Ndc,
}

impl Directive {
    fn from_letter(letter: char) -> Option<Self> {
        let directive = match letter {
            'c' => Directive::Logger,
            'd' => Directive::Date,
            'F' => Directive::FullFile,
            'f' => Directive::BaseFile,
            'L' => Directive::Line,
            'l' => Directive::Level,
            'M' => Directive::Method,
            'm' => Directive::Message,
            'p' => Directive::Pid,
            'r' => Directive::Elapsed,
            't' => Directive::ThreadId,
            'T' => Directive::ThreadName,
            'C' => Directive::FileLine,
            'g' => Directive::ShortFileLine,
            'x' => Directive::Ndc,
            _ => return None,
        };
        Some(directive)
    }

    /// Color category; `None` for `%l`, which is colored by level.
    fn token(&self) -> Option<Token> {
        match self {
            Directive::Logger => Some(Token::Logger),
            Directive::Date => Some(Token::Date),
            Directive::FullFile | Directive::BaseFile => Some(Token::File),
            Directive::Line => Some(Token::Line),
            Directive::Level => None,
            Directive::Method => Some(Token::Method),
            Directive::Message => Some(Token::Message),
            Directive::Pid => Some(Token::Pid),
            Directive::Elapsed => Some(Token::Time),
            Directive::ThreadId => Some(Token::ThreadId),
            Directive::ThreadName => Some(Token::Thread),
            Directive::FileLine | Directive::ShortFileLine => Some(Token::FileLine),
            Directive::Mdc(_) => Some(Token::Mdc),
            Directive::Ndc => Some(Token::Ndc),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Modifiers {
    left: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

impl Modifiers {
    fn apply(&self, value: &str, out: &mut String) {
        let truncated: &str = match self.precision {
            Some(max) => match value.char_indices().nth(max) {
                Some((idx, _)) => &value[..idx],
                None => value,
            },
            None => value,
        };
        let len = truncated.chars().count();
        let pad = self.width.map_or(0, |w| w.saturating_sub(len));
        if !self.left {
            out.extend(std::iter::repeat(' ').take(pad));
        }
        out.push_str(truncated);
        if self.left {
            out.extend(std::iter::repeat(' ').take(pad));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Directive(Directive, Modifiers),
}

fn parse_pattern(pattern: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            literal.push(c);
            continue;
        }

        let mut modifiers = Modifiers::default();
        if chars.peek() == Some(&'-') {
            modifiers.left = true;
            chars.next();
        }
        let mut width = String::new();
        while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
            width.push(d);
            chars.next();
        }
        if !width.is_empty() {
            modifiers.width = Some(
                width
                    .parse()
                    .map_err(|_| LoggerError::pattern(pattern, "width out of range"))?,
            );
        }
        if chars.peek() == Some(&'.') {
            chars.next();
            let mut precision = String::new();
            while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                precision.push(d);
                chars.next();
            }
            if precision.is_empty() {
                return Err(LoggerError::pattern(pattern, "precision without digits"));
            }
            modifiers.precision = Some(
                precision
                    .parse()
                    .map_err(|_| LoggerError::pattern(pattern, "precision out of range"))?,
            );
        }

        let letter = chars
            .next()
            .ok_or_else(|| LoggerError::pattern(pattern, "dangling '%' at end of pattern"))?;

        let directive = match letter {
            '%' if modifiers == Modifiers::default() => {
                literal.push('%');
                continue;
            }
            'X' => {
                if chars.next() != Some('{') {
                    return Err(LoggerError::pattern(pattern, "'%X' requires a {key}"));
                }
                let mut key = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(k) => key.push(k),
                        None => {
                            return Err(LoggerError::pattern(pattern, "unterminated '%X{' key"))
                        }
                    }
                }
                Directive::Mdc(key)
            }
            other => Directive::from_letter(other).ok_or_else(|| {
                LoggerError::pattern(pattern, format!("unknown directive '{}'", other))
            })?,
        };

        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        segments.push(Segment::Directive(directive, modifiers));
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

/// Compiled pattern that renders [`LogEvent`]s.
#[derive(Debug, Clone)]
pub struct PatternFormatter {
    pattern: String,
    segments: Vec<Segment>,
    date_format: TimestampFormat,
    color_scheme: Option<Arc<ColorScheme>>,
    levels: &'static LevelSet,
    created_at: DateTime<Local>,
    pid: u32,
}

impl PatternFormatter {
    /// Compile a formatter from pattern options.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::Pattern`] for unknown directives or a bad date
    /// pattern, and [`LoggerError::InvalidConfiguration`] for an unknown
    /// color scheme or date method.
    pub fn new(options: &PatternOptions) -> Result<Self> {
        let pattern = options
            .pattern
            .clone()
            .unwrap_or_else(|| DEFAULT_PATTERN.to_string());
        let segments = parse_pattern(&pattern)?;

        let date_format = match (&options.date_method, &options.date_pattern) {
            (Some(method), _) => TimestampFormat::from_method(method)?,
            (None, Some(date_pattern)) => TimestampFormat::custom(date_pattern.clone())?,
            (None, None) => TimestampFormat::custom(DEFAULT_DATE_PATTERN)?,
        };

        let color_scheme = match &options.color_scheme {
            Some(name) => Some(color_scheme::lookup(name)?),
            None => None,
        };

        Ok(Self {
            pattern,
            segments,
            date_format,
            color_scheme,
            levels: level_set::global(),
            created_at: Local::now(),
            pid: std::process::id(),
        })
    }

    /// Compile a bare pattern with the default date pattern and no colors.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::Pattern`] for unknown directives.
    pub fn from_pattern(pattern: &str) -> Result<Self> {
        Self::new(&PatternOptions::new().with_pattern(pattern))
    }

    /// Render level names from `levels` instead of the process-wide set.
    #[must_use]
    pub fn with_levels(mut self, levels: &'static LevelSet) -> Self {
        self.levels = levels;
        self
    }

    /// A copy of this formatter that never emits color escapes from a scheme.
    #[must_use]
    pub fn without_colors(&self) -> Self {
        let mut plain = self.clone();
        plain.color_scheme = None;
        plain
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn color_scheme(&self) -> Option<&ColorScheme> {
        self.color_scheme.as_deref()
    }

    pub fn date_format(&self) -> &TimestampFormat {
        &self.date_format
    }

    pub fn format_date(&self, time: &DateTime<Local>) -> String {
        self.date_format.format(time)
    }

    /// Render one event.
    pub fn format(&self, event: &LogEvent) -> String {
        let mut out = String::with_capacity(self.pattern.len() + event.data.len() + 32);
        let mut scratch = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Directive(directive, modifiers) => {
                    let value = self.directive_value(directive, event);
                    let escape = self.escape_for(directive, event);
                    match escape {
                        Some(escape) => {
                            scratch.clear();
                            modifiers.apply(&value, &mut scratch);
                            out.push_str(escape);
                            out.push_str(&scratch);
                            out.push_str(RESET);
                        }
                        None => modifiers.apply(&value, &mut out),
                    }
                }
            }
        }
        out
    }

    fn escape_for(&self, directive: &Directive, event: &LogEvent) -> Option<&str> {
        let scheme = self.color_scheme.as_deref()?;
        match directive.token() {
            Some(token) => scheme.token_escape(token),
            None => scheme.level_escape(self.levels.name(event.level)?),
        }
    }

    fn directive_value(&self, directive: &Directive, event: &LogEvent) -> String {
        match directive {
            Directive::Logger => event.logger.to_string(),
            Directive::Date => self.format_date(&event.time),
            Directive::FullFile => event.file().to_string(),
            Directive::BaseFile => Path::new(event.file())
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            Directive::Line => match event.call_site {
                Some(site) => site.line().to_string(),
                None => String::new(),
            },
            Directive::Level => self
                .levels
                .display_name(event.level)
                .map(str::to_string)
                .unwrap_or_else(|| event.level.to_string()),
            Directive::Method => event.method().to_string(),
            Directive::Message => event.data.clone(),
            Directive::Pid => self.pid.to_string(),
            Directive::Elapsed => (event.time - self.created_at).num_milliseconds().to_string(),
            Directive::ThreadId => event.thread_id.clone(),
            Directive::ThreadName => event.thread_name.clone().unwrap_or_default(),
            Directive::FileLine => decorate_file_line(event.file(), event.line()),
            Directive::ShortFileLine => {
                decorate_file_line(&short_file(event.file()), event.line())
            }
            Directive::Mdc(key) => MappedContext::get(key)
                .map(|value| value.to_string())
                .unwrap_or_default(),
            Directive::Ndc => NestedContext::render(),
        }
    }
}

impl Default for PatternFormatter {
    fn default() -> Self {
        Self::new(&PatternOptions::default()).expect("default pattern compiles")
    }
}

fn decorate_file_line(file: &str, line: u32) -> String {
    if file.is_empty() {
        return String::new();
    }
    format!("({}{}::{}{})", FILE_LINE_ESCAPE, file, line, RESET)
}

/// Keep the base name and at most two enclosing directories.
fn short_file(file: &str) -> String {
    let parts: Vec<String> = Path::new(file)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    let start = parts.len().saturating_sub(3);
    parts[start..].join("/")
}
