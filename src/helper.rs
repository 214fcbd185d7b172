//! Owner-scoped logger setup
//!
//! A [`LogHelper`] lives inside the object that logs. It builds that object's
//! logger on first use from [`LoggerOptions`], numbers progress steps and
//! remembers which `todo` call sites already fired.

use crate::appenders::{
    ConsoleAppender, PassThroughAppender, RotatingFileAppender, RotationAge, RotationPolicy,
};
use crate::core::{
    color_scheme::{self, ColorScheme},
    level_set::{self, BuiltinLevel},
    Appender, CallSite, LogEvent, Logger, PatternFormatter, PatternOptions, Result,
};
use colored::Colorize;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Name of the color scheme applied when options name none.
pub const DEFAULT_SCHEME: &str = "rust_logger_registry";

/// Date pattern of helper-built layouts.
pub const HELPER_DATE_PATTERN: &str = "%Y-%m-%d %H:%M:%S";

/// Threshold used when options give none.
pub const DEFAULT_LEVEL: &str = "warn";

/// Produces pattern options given the widest level name.
pub type PatternOptionsFn = Arc<dyn Fn(usize) -> Option<PatternOptions> + Send + Sync>;

/// Where a setting came from, reported when verbose levels are requested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Origins {
    pub log_level: Option<String>,
}

/// File rotation settings handed to the rotating file appender.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationOptions {
    /// Rotate once the file reaches this many bytes
    pub size: Option<u64>,
    /// `hourly`/`daily`/`weekly`/`monthly`, or a number of seconds
    pub age: Option<RotationAge>,
    /// Rotated files to keep
    pub keep: Option<usize>,
    pub compress: bool,
}

impl RotationOptions {
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`](crate::LoggerError::InvalidConfiguration)
    /// for an unknown frequency.
    pub fn to_policy(&self) -> Result<RotationPolicy> {
        Ok(RotationPolicy::from_options(self.size, self.age.as_ref(), self.keep)?
            .with_compression(self.compress))
    }
}

/// Options recognized by [`LogHelper::get_logger`].
///
/// # Example
///
/// ```
/// use rust_logger_registry::helper::LoggerOptions;
///
/// let options = LoggerOptions::from_json(
///     r#"{"my_name": "builder", "log_level": "info", "trace": true,
///         "rotation": {"age": "daily", "keep": 7}}"#,
/// ).unwrap();
/// assert_eq!(options.level(), "info");
/// ```
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerOptions {
    pub log_file: Option<PathBuf>,
    pub log_path: Option<PathBuf>,
    pub my_name: Option<String>,
    pub log_level: Option<String>,
    pub trace: bool,
    #[serde(skip)]
    pub log_opts: Option<PatternOptionsFn>,
    pub origins: Origins,
    pub rotation: RotationOptions,
}

impl fmt::Debug for LoggerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerOptions")
            .field("log_file", &self.log_file)
            .field("log_path", &self.log_path)
            .field("my_name", &self.my_name)
            .field("log_level", &self.log_level)
            .field("trace", &self.trace)
            .field("log_opts", &self.log_opts.as_ref().map(|_| "<fn>"))
            .field("origins", &self.origins)
            .field("rotation", &self.rotation)
            .finish()
    }
}

impl LoggerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// Returns [`LoggerError::JsonError`](crate::LoggerError::JsonError) for malformed input.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_log_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_path = Some(dir.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.my_name = Some(name.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_log_opts<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) -> Option<PatternOptions> + Send + Sync + 'static,
    {
        self.log_opts = Some(Arc::new(f));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_level_origin(mut self, origin: impl Into<String>) -> Self {
        self.origins.log_level = Some(origin.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_rotation(mut self, rotation: RotationOptions) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LEVEL)
    }

    /// Log file and directory after defaulting.
    ///
    /// An explicit `log_file` sets the directory to its parent. Otherwise
    /// `my_name` names `<log_path>/<my_name>.log`, or the same file in the
    /// system temp directory when no `log_path` is given.
    pub fn resolved_paths(&self) -> (Option<PathBuf>, Option<PathBuf>) {
        if let Some(file) = &self.log_file {
            let dir = file
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            return (Some(file.clone()), Some(dir));
        }
        match &self.my_name {
            Some(name) => {
                let dir = self.log_path.clone().unwrap_or_else(std::env::temp_dir);
                (Some(dir.join(format!("{}.log", name))), Some(dir))
            }
            None => (None, self.log_path.clone()),
        }
    }
}

/// Register the default color scheme unless a scheme with that name exists.
///
/// # Errors
///
/// Returns [`LoggerError::InvalidConfiguration`](crate::LoggerError::InvalidConfiguration)
/// if a color fails to parse.
pub fn default_color_scheme() -> Result<Arc<ColorScheme>> {
    if let Ok(scheme) = color_scheme::lookup(DEFAULT_SCHEME) {
        return Ok(scheme);
    }
    let scheme = ColorScheme::new(DEFAULT_SCHEME)
        .with_level("trace", "\x1b[38;5;89m")?
        .with_level("debug", "cyan")?
        .with_level("info", "green")?
        .with_level("step", "green")?
        .with_level("warn", "yellow")?
        .with_level("error", "red")?
        .with_level("fatal", "\x1b[38;5;33m")?
        .with_level("todo", "\x1b[38;5;55m")?;
    Ok(scheme.register())
}

/// Logger state owned by one object.
///
/// # Example
///
/// ```
/// use rust_logger_registry::helper::{LogHelper, LoggerOptions};
///
/// let helper = LogHelper::new();
/// let dir = tempfile::tempdir().unwrap();
/// let options = LoggerOptions::new()
///     .with_name("docs")
///     .with_log_path(dir.path())
///     .with_level("step");
///
/// helper.get_logger(&options).unwrap();
/// assert!(helper.log_step("fetch sources"));
/// assert_eq!(helper.step_count(), 1);
/// ```
#[derive(Default)]
pub struct LogHelper {
    logger: RwLock<Option<Arc<Logger>>>,
    step: AtomicU64,
    todos: Mutex<HashMap<String, String>>,
}

impl LogHelper {
    pub fn new() -> Self {
        Self::default()
    }

    /// The owner's logger, building it from `options` on first call.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`](crate::LoggerError::InvalidConfiguration)
    /// or [`LoggerError::Pattern`](crate::LoggerError::Pattern)
    /// for bad options. A backend that cannot be built is replaced by a
    /// pass-through logger instead.
    pub fn get_logger(&self, options: &LoggerOptions) -> Result<Arc<Logger>> {
        self.get_logger_from(options, "")
    }

    /// Like [`get_logger`](Self::get_logger), prefixing layouts with `from`.
    ///
    /// # Errors
    ///
    /// See [`get_logger`](Self::get_logger).
    pub fn get_logger_from(&self, options: &LoggerOptions, from: &str) -> Result<Arc<Logger>> {
        if let Some(logger) = self.logger.read().as_ref() {
            return Ok(Arc::clone(logger));
        }

        let mut slot = self.logger.write();
        if let Some(logger) = slot.as_ref() {
            return Ok(Arc::clone(logger));
        }

        self.step.store(0, Ordering::Relaxed);
        let logger = match build_logger(options, from) {
            Ok(logger) => logger,
            Err(e) if e.is_backend_failure() => {
                println!("{}", e);
                fallback_logger(options)?
            }
            Err(e) => return Err(e),
        };
        let logger = Arc::new(logger);
        *slot = Some(Arc::clone(&logger));
        Ok(logger)
    }

    /// Use `logger` from now on instead of building one.
    pub fn set_logger(&self, logger: Arc<Logger>) {
        *self.logger.write() = Some(logger);
    }

    pub fn logger(&self) -> Option<Arc<Logger>> {
        self.logger.read().clone()
    }

    /// Log `Step N: msg ...` at the step level.
    ///
    /// The counter advances even when the step level is disabled. Returns
    /// whether the message passed the threshold, `false` without a logger.
    #[track_caller]
    pub fn log_step(&self, msg: &str) -> bool {
        self.log_step_as("Step", msg)
    }

    #[track_caller]
    pub fn log_step_as(&self, category: &str, msg: &str) -> bool {
        let Some(logger) = self.logger() else {
            return false;
        };
        let n = self.step.fetch_add(1, Ordering::Relaxed) + 1;
        let Some(severity) = logger.levels().builtin(BuiltinLevel::Step) else {
            return false;
        };
        logger.emit_with(severity, || format!("{} {}: {} ...", category, n, msg), None)
    }

    pub fn step_count(&self) -> u64 {
        self.step.load(Ordering::Relaxed)
    }

    /// Log `msg` at the `todo` level once per call site.
    ///
    /// The threshold is ignored. Later calls from the same `file::line`
    /// are no-ops until [`clear_todos`](Self::clear_todos).
    #[track_caller]
    pub fn todo(&self, msg: &str) -> bool {
        let key = CallSite::here().key();
        let Some(logger) = self.logger() else {
            return false;
        };
        let Some(severity) = logger.levels().builtin(BuiltinLevel::Todo) else {
            return false;
        };

        let mut todos = self.todos.lock();
        if todos.contains_key(&key) {
            return false;
        }
        logger.log_event(&LogEvent::new(logger.name(), severity, msg, None));
        todos.insert(key, msg.to_string());
        true
    }

    /// Messages logged through [`todo`](Self::todo), keyed by `file::line`.
    pub fn todos(&self) -> HashMap<String, String> {
        self.todos.lock().clone()
    }

    pub fn clear_todos(&self) {
        self.todos.lock().clear();
    }
}

/// Objects that own a [`LogHelper`].
///
/// # Example
///
/// ```
/// use rust_logger_registry::helper::{HasLogger, LogHelper};
///
/// struct Deployer {
///     log: LogHelper,
/// }
///
/// impl HasLogger for Deployer {
///     fn log_helper(&self) -> &LogHelper {
///         &self.log
///     }
/// }
///
/// let deployer = Deployer { log: LogHelper::new() };
/// assert!(deployer.logger().is_none());
/// assert!(!deployer.log_step("nothing configured"));
/// ```
pub trait HasLogger {
    fn log_helper(&self) -> &LogHelper;

    fn logger(&self) -> Option<Arc<Logger>> {
        self.log_helper().logger()
    }

    #[track_caller]
    fn log_step(&self, msg: &str) -> bool {
        self.log_helper().log_step(msg)
    }

    #[track_caller]
    fn log_todo(&self, msg: &str) -> bool {
        self.log_helper().todo(msg)
    }
}

fn logger_name(options: &LoggerOptions) -> String {
    options
        .my_name
        .clone()
        .unwrap_or_else(|| "STDOUT".to_string())
}

fn build_logger(options: &LoggerOptions, from: &str) -> Result<Logger> {
    let levels = level_set::global();
    let (log_file, _log_path) = options.resolved_paths();

    let mut prefix = if from.is_empty() {
        String::new()
    } else {
        format!("{} - ", from)
    };
    if let Some(origin) = &options.origins.log_level {
        let verbose = levels
            .severity(options.level())
            .is_some_and(|severity| severity < 2);
        if verbose {
            println!(
                "{}",
                format!("{} says {}", origin, options.level()).bright_yellow()
            );
        } else {
            prefix.clear();
        }
    }

    let width = levels.max_name_len();
    let layout = options
        .log_opts
        .as_ref()
        .and_then(|f| f(width))
        .unwrap_or_else(|| {
            PatternOptions::new()
                .with_pattern(format!("{}%d %{}l: %m %C\n", prefix, width))
                .with_date_pattern(HELPER_DATE_PATTERN)
        });

    let mut appenders: Vec<Box<dyn Appender>> = Vec::new();

    let mut console_layout = layout.clone();
    if console_layout.color_scheme.is_none() {
        default_color_scheme()?;
        console_layout.color_scheme = Some(DEFAULT_SCHEME.to_string());
    }
    let console = ConsoleAppender::new().with_formatter(PatternFormatter::new(&console_layout)?);
    appenders.push(Box::new(console));

    if let Some(path) = log_file {
        let policy = options.rotation.to_policy()?;
        let file = RotatingFileAppender::with_policy(&path, policy)?
            .with_formatter(PatternFormatter::new(&layout)?);
        appenders.push(Box::new(file));
    }

    let mut builder = Logger::builder(logger_name(options))
        .level(options.level())
        .trace(options.trace)
        .additive(false);
    for appender in appenders {
        builder = builder.boxed_appender(appender);
    }
    builder.build()
}

/// Logger that prints bare messages, used when the real one cannot be built.
fn fallback_logger(options: &LoggerOptions) -> Result<Logger> {
    let logger = Logger::builder(logger_name(options))
        .additive(false)
        .appender(PassThroughAppender::new())
        .build()?;
    logger.set_severity(0)?;
    Ok(logger)
}
