//! Process-wide logger registry
//!
//! Names are hierarchical, with `.` or `::` between segments. Resolving a
//! name that has no entry either aliases it to its nearest registered
//! ancestor (its master) or, when no ancestor is registered, creates a new
//! primary logger and links registered descendants beneath it.
//!
//! Every mutation happens under one lock, so concurrent resolution of the
//! same name always yields the same instance.

use super::{
    appender::Appender,
    error::{LoggerError, Result},
    level_set,
    logger::Logger,
    pattern::{PatternFormatter, PatternOptions},
};
use crate::appenders::{ConsoleAppender, ConsoleTarget, RotatingFileAppender, RotationPolicy};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

/// Date pattern of loggers built by [`LoggerRegistry::logger_for`].
pub const DEVICE_DATE_PATTERN: &str = "%Y-%m-%dT%H:%M:%S.%s";

static GLOBAL: OnceLock<LoggerRegistry> = OnceLock::new();

/// Proper ancestors of `name`, nearest first.
///
/// `a.b::c` yields `a.b` then `a`.
pub fn ancestors(name: &str) -> Vec<&str> {
    let bytes = name.as_bytes();
    let mut cuts = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'.' {
            cuts.push(i);
            i += 1;
        } else if bytes[i] == b':' && bytes.get(i + 1) == Some(&b':') {
            cuts.push(i);
            i += 2;
        } else {
            i += 1;
        }
    }
    cuts.into_iter()
        .rev()
        .filter(|&cut| cut > 0)
        .map(|cut| &name[..cut])
        .collect()
}

fn is_descendant(name: &str, ancestor: &str) -> bool {
    ancestors(name).contains(&ancestor)
}

#[derive(Default)]
struct RegistryState {
    /// Primary names and aliases
    entries: HashMap<String, Arc<Logger>>,
    /// Primary name to its nearest registered ancestor primary
    parents: HashMap<String, String>,
    /// Master name to the aliases resolved through it
    pending: HashMap<String, BTreeSet<String>>,
}

impl RegistryState {
    fn is_primary(&self, name: &str) -> bool {
        self.entries
            .get(name)
            .is_some_and(|logger| logger.name() == name)
    }

    fn nearest_registered_ancestor(&self, name: &str) -> Option<Arc<Logger>> {
        ancestors(name)
            .into_iter()
            .find_map(|ancestor| self.entries.get(ancestor).cloned())
    }

    fn link(&mut self, child: &str, parent: Option<&str>) {
        let parent_logger = parent.and_then(|p| self.entries.get(p).cloned());
        if let Some(logger) = self.entries.get(child) {
            logger.set_parent(parent_logger);
        }
        match parent {
            Some(p) => {
                self.parents.insert(child.to_string(), p.to_string());
            }
            None => {
                self.parents.remove(child);
            }
        }
    }

    fn forget_alias(&mut self, alias: &str) {
        self.pending.retain(|_, aliases| {
            aliases.remove(alias);
            !aliases.is_empty()
        });
    }

    fn create_primary(&mut self, name: &str, logger: Arc<Logger>) {
        self.forget_alias(name);
        self.entries.insert(name.to_string(), Arc::clone(&logger));

        // Descendant primaries whose parent is missing or less specific
        let adopted: Vec<String> = self
            .entries
            .iter()
            .filter(|(key, entry)| entry.name() == key.as_str() && is_descendant(key, name))
            .filter(|(key, _)| match self.parents.get(key.as_str()) {
                None => true,
                Some(current) => is_descendant(name, current),
            })
            .map(|(key, _)| key.clone())
            .collect();
        for child in adopted {
            self.link(&child, Some(name));
        }

        // Remembered aliases below `name` whose master is gone
        let relinked: Vec<(String, String)> = self
            .pending
            .iter()
            .filter(|(master, _)| master.as_str() == name || !self.is_primary(master))
            .flat_map(|(master, aliases)| {
                aliases
                    .iter()
                    .filter(|alias| is_descendant(alias, name))
                    .map(move |alias| (master.clone(), alias.clone()))
            })
            .collect();
        for (master, alias) in relinked {
            if let Some(aliases) = self.pending.get_mut(&master) {
                aliases.remove(&alias);
                if aliases.is_empty() {
                    self.pending.remove(&master);
                }
            }
            if !self.entries.contains_key(&alias) {
                self.entries.insert(alias.clone(), Arc::clone(&logger));
            }
            self.pending
                .entry(name.to_string())
                .or_default()
                .insert(alias);
        }
    }
}

/// Destination of a logger built by [`LoggerRegistry::logger_for`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDevice {
    Stdout,
    Stderr,
    File(PathBuf),
}

impl LogDevice {
    /// Registry name: `STDOUT`, `STDERR` or the file path.
    pub fn name(&self) -> String {
        match self {
            LogDevice::Stdout => "STDOUT".to_string(),
            LogDevice::Stderr => "STDERR".to_string(),
            LogDevice::File(path) => path.display().to_string(),
        }
    }
}

impl From<PathBuf> for LogDevice {
    fn from(path: PathBuf) -> Self {
        LogDevice::File(path)
    }
}

impl From<&str> for LogDevice {
    fn from(text: &str) -> Self {
        match text {
            "STDOUT" | "stdout" | "-" => LogDevice::Stdout,
            "STDERR" | "stderr" => LogDevice::Stderr,
            path => LogDevice::File(PathBuf::from(path)),
        }
    }
}

/// Options for [`LoggerRegistry::logger_for`].
#[derive(Debug, Clone, Default)]
pub struct DeviceOptions {
    pub level: Option<String>,
    pub trace: bool,
    pub pattern: Option<PatternOptions>,
    pub rotation: Option<RotationPolicy>,
}

impl DeviceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_pattern(mut self, pattern: PatternOptions) -> Self {
        self.pattern = Some(pattern);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_rotation(mut self, rotation: RotationPolicy) -> Self {
        self.rotation = Some(rotation);
        self
    }
}

/// Pattern of device loggers: `I, [2025-01-08T10:30:45.123456 #4242]  INFO : ready`
pub fn device_pattern() -> String {
    format!(
        "%.1l, [%d #%p] %{}l : %m\n",
        level_set::global().max_name_len()
    )
}

/// Mapping from logger name to shared [`Logger`].
///
/// # Example
///
/// ```
/// use rust_logger_registry::LoggerRegistry;
/// use std::sync::Arc;
///
/// let registry = LoggerRegistry::new();
/// let deep = registry.resolve("app.db.pool").unwrap();
/// let db = registry.resolve("app.db").unwrap();
///
/// assert!(Arc::ptr_eq(&deep, &registry.resolve("app.db.pool").unwrap()));
/// assert_eq!(registry.parent_of("app.db.pool").as_deref(), Some("app.db"));
/// assert!(Arc::ptr_eq(&deep.parent().unwrap(), &db));
/// ```
#[derive(Default)]
pub struct LoggerRegistry {
    state: Mutex<RegistryState>,
}

impl LoggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static LoggerRegistry {
        GLOBAL.get_or_init(LoggerRegistry::new)
    }

    /// Return the logger registered as `name`, aliasing it to the nearest
    /// registered ancestor or creating it as needed.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`] for a blank name.
    pub fn resolve(&self, name: &str) -> Result<Arc<Logger>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LoggerError::config("LoggerRegistry", "logger name is empty"));
        }

        let mut state = self.state.lock();
        if let Some(logger) = state.entries.get(name) {
            return Ok(Arc::clone(logger));
        }

        if let Some(master) = state.nearest_registered_ancestor(name) {
            let master_name = master.name().to_string();
            state.entries.insert(name.to_string(), Arc::clone(&master));
            state.forget_alias(name);
            state.pending.entry(master_name).or_default().insert(name.to_string());
            return Ok(master);
        }

        let logger = Arc::new(Logger::new(name));
        state.create_primary(name, Arc::clone(&logger));
        Ok(logger)
    }

    /// Logger writing to `device`, built on first request.
    ///
    /// Device loggers are not additive and take no part in the name
    /// hierarchy.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`] or [`LoggerError::Pattern`]
    /// for bad options and an I/O error when a file cannot be opened.
    pub fn logger_for(&self, device: &LogDevice, options: &DeviceOptions) -> Result<Arc<Logger>> {
        let name = device.name();
        let mut state = self.state.lock();
        if let Some(logger) = state.entries.get(&name) {
            return Ok(Arc::clone(logger));
        }

        let pattern = options.pattern.clone().unwrap_or_else(|| {
            PatternOptions::new()
                .with_pattern(device_pattern())
                .with_date_pattern(DEVICE_DATE_PATTERN)
        });
        let formatter = PatternFormatter::new(&pattern)?;

        let appender: Box<dyn Appender> = match device {
            LogDevice::Stdout => Box::new(ConsoleAppender::new().with_formatter(formatter)),
            LogDevice::Stderr => Box::new(
                ConsoleAppender::with_target(ConsoleTarget::Stderr).with_formatter(formatter),
            ),
            LogDevice::File(path) => Box::new(
                RotatingFileAppender::with_policy(path, options.rotation.clone().unwrap_or_default())?
                    .with_formatter(formatter),
            ),
        };

        let mut builder = Logger::builder(name.as_str())
            .trace(options.trace)
            .additive(false)
            .boxed_appender(appender);
        if let Some(level) = &options.level {
            builder = builder.level(level.clone());
        }
        let logger = Arc::new(builder.build()?);

        state.forget_alias(&name);
        state.entries.insert(name, Arc::clone(&logger));
        Ok(logger)
    }

    /// Close `logger`'s appenders and unregister it with all its aliases.
    ///
    /// Children are re-linked to their next registered ancestor; aliases
    /// stay remembered so a later logger above them can adopt them.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::LoggerClosed`] when the logger was already closed,
    /// or the first appender close error.
    pub fn close(&self, logger: &Arc<Logger>) -> Result<()> {
        if logger.is_closed() {
            return Err(LoggerError::closed(logger.name()));
        }

        {
            let mut state = self.state.lock();
            let name = logger.name();
            let registered = state
                .entries
                .get(name)
                .is_some_and(|entry| Arc::ptr_eq(entry, logger));
            state.entries.retain(|_, entry| !Arc::ptr_eq(entry, logger));

            // A newer logger may own the name by now
            if !registered {
                drop(state);
                return logger.close();
            }

            let grandparent = state.parents.remove(name);
            let orphans: Vec<String> = state
                .parents
                .iter()
                .filter(|(_, parent)| parent.as_str() == name)
                .map(|(child, _)| child.clone())
                .collect();
            for child in orphans {
                state.link(&child, grandparent.as_deref());
            }
        }

        logger.close()
    }

    /// Close every registered logger and forget all names.
    pub fn shutdown(&self) {
        let loggers: Vec<Arc<Logger>> = {
            let mut state = self.state.lock();
            let loggers = state
                .entries
                .iter()
                .filter(|(key, logger)| logger.name() == key.as_str())
                .map(|(_, logger)| Arc::clone(logger))
                .collect();
            *state = RegistryState::default();
            loggers
        };

        for logger in loggers {
            if let Err(e) = logger.close() {
                eprintln!("[LOGGER ERROR] shutdown of {} failed: {}", logger.name(), e);
            }
        }
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.state.lock().entries.contains_key(name)
    }

    /// The registered logger, without creating one.
    pub fn get(&self, name: &str) -> Option<Arc<Logger>> {
        self.state.lock().entries.get(name).cloned()
    }

    /// Effective parent: the nearest registered ancestor of a primary logger,
    /// or the master of an alias.
    pub fn parent_of(&self, name: &str) -> Option<String> {
        let state = self.state.lock();
        if state.is_primary(name) {
            state.parents.get(name).cloned()
        } else {
            state.entries.get(name).map(|logger| logger.name().to_string())
        }
    }

    /// Primary loggers whose parent is `name`, sorted.
    pub fn children_of(&self, name: &str) -> Vec<String> {
        let state = self.state.lock();
        let mut children: Vec<String> = state
            .parents
            .iter()
            .filter(|(_, parent)| parent.as_str() == name)
            .map(|(child, _)| child.clone())
            .collect();
        children.sort();
        children
    }

    /// Master of an alias; `None` for primary or unknown names.
    pub fn master_of(&self, alias: &str) -> Option<String> {
        let state = self.state.lock();
        state
            .entries
            .get(alias)
            .filter(|logger| logger.name() != alias)
            .map(|logger| logger.name().to_string())
    }

    /// Aliases remembered under `master`, including those of a closed master.
    pub fn aliases_of(&self, master: &str) -> Vec<String> {
        self.state
            .lock()
            .pending
            .get(master)
            .map(|aliases| aliases.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every registered name, aliases included, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().entries.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }
}

/// Resolve `name` in the process-wide registry.
///
/// # Errors
///
/// See [`LoggerRegistry::resolve`].
pub fn logger(name: &str) -> Result<Arc<Logger>> {
    LoggerRegistry::global().resolve(name)
}
