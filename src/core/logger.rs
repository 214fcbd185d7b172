//! Named logger
//!
//! A [`Logger`] owns a severity threshold, a call-site capture flag and an
//! ordered list of appenders. The threshold is mirrored into a bitmask of
//! enabled severities so that every level check is a single atomic load.

use super::{
    appender::Appender,
    error::{LoggerError, Result},
    level_set::{self, BuiltinLevel, LevelSet},
    log_event::{CallSite, LogEvent},
    metrics::LoggerMetrics,
};
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

pub struct Logger {
    name: Arc<str>,
    levels: &'static LevelSet,
    threshold: AtomicU32,
    /// Bit `n` set when severity `n` passes the threshold
    enabled: AtomicU64,
    trace: AtomicBool,
    additive: AtomicBool,
    closed: AtomicBool,
    appenders: RwLock<Vec<Box<dyn Appender>>>,
    parent: RwLock<Option<Arc<Logger>>>,
    metrics: LoggerMetrics,
}

impl Logger {
    /// Create a logger using the process-wide level set.
    ///
    /// The initial threshold is `info` when that level is defined, otherwise
    /// the least severe level. New loggers keep events to their own appenders;
    /// forwarding to ancestors is opt-in through [`set_additive`](Self::set_additive).
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self::with_levels(name, level_set::global())
    }

    pub fn with_levels(name: impl Into<Arc<str>>, levels: &'static LevelSet) -> Self {
        let threshold = levels.builtin(BuiltinLevel::Info).unwrap_or(0);
        Self {
            name: name.into(),
            levels,
            threshold: AtomicU32::new(threshold),
            enabled: AtomicU64::new(levels.enabled_mask(threshold)),
            trace: AtomicBool::new(false),
            additive: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            appenders: RwLock::new(Vec::new()),
            parent: RwLock::new(None),
            metrics: LoggerMetrics::new(),
        }
    }

    #[must_use]
    pub fn builder(name: impl Into<Arc<str>>) -> LoggerBuilder {
        LoggerBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn levels(&self) -> &'static LevelSet {
        self.levels
    }

    /// Current threshold severity; `levels().len()` means off.
    pub fn threshold(&self) -> u32 {
        self.threshold.load(Ordering::Acquire)
    }

    /// Name of the current threshold, `"off"` when every gated level is disabled.
    pub fn level_name(&self) -> &str {
        self.levels
            .name(self.threshold())
            .unwrap_or(level_set::OFF)
    }

    /// Set the threshold from a level name, `off` or a decimal severity.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`] and keeps the previous
    /// threshold when `level` names no defined severity.
    pub fn set_level(&self, level: &str) -> Result<()> {
        let severity = self.levels.parse_threshold(level)?;
        self.store_threshold(severity);
        Ok(())
    }

    /// Set the threshold to a numeric severity.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`] and keeps the previous
    /// threshold when `severity` is out of range.
    pub fn set_severity(&self, severity: u32) -> Result<()> {
        let severity = self.levels.check_threshold(severity)?;
        self.store_threshold(severity);
        Ok(())
    }

    fn store_threshold(&self, severity: u32) {
        self.threshold.store(severity, Ordering::Release);
        self.enabled
            .store(self.levels.enabled_mask(severity), Ordering::SeqCst);
        // Pairs with the swap in `close`: whichever side stores last, a closed
        // logger ends with an empty mask
        if self.closed.load(Ordering::SeqCst) {
            self.enabled.store(0, Ordering::SeqCst);
        }
    }

    pub fn trace_enabled(&self) -> bool {
        self.trace.load(Ordering::Relaxed)
    }

    /// Capture the caller's position for every emission without an explicit override.
    pub fn set_trace_enabled(&self, enabled: bool) {
        self.trace.store(enabled, Ordering::Relaxed);
    }

    pub fn is_additive(&self) -> bool {
        self.additive.load(Ordering::Relaxed)
    }

    /// Whether events are also handed to the parent's appenders.
    pub fn set_additive(&self, additive: bool) {
        self.additive.store(additive, Ordering::Relaxed);
    }

    /// Nearest registered ancestor, as linked by the registry.
    pub fn parent(&self) -> Option<Arc<Logger>> {
        self.parent.read().clone()
    }

    pub(crate) fn set_parent(&self, parent: Option<Arc<Logger>>) {
        *self.parent.write() = parent;
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_enabled(&self, severity: u32) -> bool {
        severity < 64 && self.enabled.load(Ordering::Acquire) & (1u64 << severity) != 0
    }

    /// Whether the level called `name` would currently be emitted.
    pub fn is_enabled_for(&self, name: &str) -> bool {
        self.levels
            .severity(name)
            .is_some_and(|severity| self.is_enabled(severity))
    }

    #[inline]
    fn is_builtin_enabled(&self, level: BuiltinLevel) -> bool {
        self.levels
            .builtin(level)
            .is_some_and(|severity| self.is_enabled(severity))
    }

    pub fn is_trace_enabled(&self) -> bool {
        self.is_builtin_enabled(BuiltinLevel::Trace)
    }

    pub fn is_debug_enabled(&self) -> bool {
        self.is_builtin_enabled(BuiltinLevel::Debug)
    }

    pub fn is_info_enabled(&self) -> bool {
        self.is_builtin_enabled(BuiltinLevel::Info)
    }

    pub fn is_step_enabled(&self) -> bool {
        self.is_builtin_enabled(BuiltinLevel::Step)
    }

    pub fn is_warn_enabled(&self) -> bool {
        self.is_builtin_enabled(BuiltinLevel::Warn)
    }

    pub fn is_error_enabled(&self) -> bool {
        self.is_builtin_enabled(BuiltinLevel::Error)
    }

    pub fn is_fatal_enabled(&self) -> bool {
        self.is_builtin_enabled(BuiltinLevel::Fatal)
    }

    /// Emit `data` at `level`.
    ///
    /// Returns `false` without touching any appender when the level is
    /// disabled, `true` otherwise (whether or not the appenders succeed).
    /// `trace_override` decides call-site capture, falling back to
    /// [`trace_enabled`](Self::trace_enabled).
    #[track_caller]
    pub fn emit(&self, level: u32, data: impl Into<String>, trace_override: Option<bool>) -> bool {
        if !self.is_enabled(level) {
            return false;
        }
        let call_site = self.call_site(trace_override);
        self.log_event(&LogEvent::new(Arc::clone(&self.name), level, data, call_site));
        true
    }

    /// Like [`emit`](Self::emit), building the message only when the level is enabled.
    #[track_caller]
    pub fn emit_with<F>(&self, level: u32, data: F, trace_override: Option<bool>) -> bool
    where
        F: FnOnce() -> String,
    {
        if !self.is_enabled(level) {
            return false;
        }
        let call_site = self.call_site(trace_override);
        self.log_event(&LogEvent::new(Arc::clone(&self.name), level, data(), call_site));
        true
    }

    /// Emit with an explicit call site, used by wrappers and macros.
    pub fn log_at(&self, level: u32, data: impl Into<String>, call_site: CallSite) -> bool {
        if !self.is_enabled(level) {
            return false;
        }
        self.log_event(&LogEvent::new(
            Arc::clone(&self.name),
            level,
            data,
            Some(call_site),
        ));
        true
    }

    /// Emit at the level called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`] when no level has that name.
    #[track_caller]
    pub fn log_named(&self, name: &str, data: impl Into<String>) -> Result<bool> {
        let severity = self.levels.severity(name).ok_or_else(|| {
            LoggerError::config("Logger", format!("no level named '{}'", name))
        })?;
        Ok(self.emit(severity, data, None))
    }

    #[track_caller]
    #[inline]
    fn emit_builtin(&self, level: BuiltinLevel, data: impl Into<String>) -> bool {
        match self.levels.builtin(level) {
            Some(severity) => self.emit(severity, data, None),
            None => false,
        }
    }

    #[track_caller]
    fn call_site(&self, trace_override: Option<bool>) -> Option<CallSite> {
        if trace_override.unwrap_or_else(|| self.trace_enabled()) {
            Some(CallSite::here())
        } else {
            None
        }
    }

    #[track_caller]
    pub fn trace(&self, data: impl Into<String>) -> bool {
        self.emit_builtin(BuiltinLevel::Trace, data)
    }

    #[track_caller]
    pub fn debug(&self, data: impl Into<String>) -> bool {
        self.emit_builtin(BuiltinLevel::Debug, data)
    }

    #[track_caller]
    pub fn info(&self, data: impl Into<String>) -> bool {
        self.emit_builtin(BuiltinLevel::Info, data)
    }

    #[track_caller]
    pub fn step(&self, data: impl Into<String>) -> bool {
        self.emit_builtin(BuiltinLevel::Step, data)
    }

    #[track_caller]
    pub fn warn(&self, data: impl Into<String>) -> bool {
        self.emit_builtin(BuiltinLevel::Warn, data)
    }

    #[track_caller]
    pub fn error(&self, data: impl Into<String>) -> bool {
        self.emit_builtin(BuiltinLevel::Error, data)
    }

    #[track_caller]
    pub fn fatal(&self, data: impl Into<String>) -> bool {
        self.emit_builtin(BuiltinLevel::Fatal, data)
    }

    /// Emit at the `todo` level, which ignores the threshold.
    ///
    /// No de-duplication happens here; see
    /// [`LogHelper::todo`](crate::helper::LogHelper::todo).
    #[track_caller]
    pub fn todo(&self, data: impl Into<String>) -> bool {
        self.emit_builtin(BuiltinLevel::Todo, data)
    }

    /// Hand an already built event to the appenders, bypassing the threshold.
    ///
    /// Additive loggers pass the event on to each ancestor until one that is
    /// not additive.
    pub fn log_event(&self, event: &LogEvent) {
        self.metrics.record_logged();
        self.dispatch(event);

        let mut current = if self.is_additive() { self.parent() } else { None };
        while let Some(ancestor) = current {
            if ancestor.is_closed() {
                break;
            }
            self.metrics.record_forwarded();
            ancestor.dispatch(event);
            current = if ancestor.is_additive() {
                ancestor.parent()
            } else {
                None
            };
        }
    }

    /// Write to each appender in registration order.
    ///
    /// A failing or panicking appender is reported on stderr and the
    /// remaining appenders still receive the event.
    fn dispatch(&self, event: &LogEvent) {
        let mut appenders = self.appenders.write();
        for (idx, appender) in appenders.iter_mut().enumerate() {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                appender.append(event)
            }));

            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    eprintln!(
                        "[LOGGER ERROR] {}: appender #{} ({}) failed: {}",
                        self.name,
                        idx,
                        appender.name(),
                        e
                    );
                    self.metrics.record_sink_failure();
                }
                Err(panic_info) => {
                    eprintln!(
                        "[LOGGER ERROR] {}: appender #{} ({}) panicked: {}",
                        self.name,
                        idx,
                        appender.name(),
                        panic_message(panic_info.as_ref())
                    );
                    self.metrics.record_sink_failure();
                }
            }
        }
    }

    pub fn add_appender(&self, appender: Box<dyn Appender>) {
        self.appenders.write().push(appender);
    }

    /// Detach the first appender called `name`.
    pub fn remove_appender(&self, name: &str) -> Option<Box<dyn Appender>> {
        let mut appenders = self.appenders.write();
        let idx = appenders.iter().position(|a| a.name() == name)?;
        Some(appenders.remove(idx))
    }

    pub fn appender_names(&self) -> Vec<String> {
        self.appenders
            .read()
            .iter()
            .map(|a| a.name().to_string())
            .collect()
    }

    pub fn appender_count(&self) -> usize {
        self.appenders.read().len()
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    /// Flush every appender, returning the first error after trying them all.
    pub fn flush(&self) -> Result<()> {
        let mut first_error = None;
        for appender in self.appenders.write().iter_mut() {
            if let Err(e) = appender.flush() {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Close and drop every appender; the logger emits nothing afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::LoggerClosed`] when already closed, otherwise the
    /// first appender close error (all appenders are closed regardless).
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(LoggerError::closed(self.name.to_string()));
        }
        self.enabled.store(0, Ordering::SeqCst);
        self.set_parent(None);

        let drained: Vec<Box<dyn Appender>> = self.appenders.write().drain(..).collect();
        let mut first_error = None;
        for mut appender in drained {
            if let Err(e) = appender.close() {
                eprintln!(
                    "[LOGGER ERROR] {}: closing appender {} failed: {}",
                    self.name,
                    appender.name(),
                    e
                );
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &self.level_name())
            .field("trace", &self.trace_enabled())
            .field("additive", &self.is_additive())
            .field("closed", &self.is_closed())
            .field("appenders", &self.appender_names())
            .field("parent", &self.parent().map(|p| p.name().to_string()))
            .finish()
    }
}

/// Builder for standalone [`Logger`]s
///
/// # Example
/// ```
/// use rust_logger_registry::prelude::*;
///
/// let logger = Logger::builder("worker")
///     .level("debug")
///     .trace(true)
///     .additive(false)
///     .appender(ConsoleAppender::new())
///     .build()
///     .unwrap();
/// assert!(logger.is_debug_enabled());
/// ```
pub struct LoggerBuilder {
    name: Arc<str>,
    levels: &'static LevelSet,
    level: Option<String>,
    trace: bool,
    additive: bool,
    appenders: Vec<Box<dyn Appender>>,
}

impl LoggerBuilder {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            levels: level_set::global(),
            level: None,
            trace: false,
            additive: false,
            appenders: Vec::new(),
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn levels(mut self, levels: &'static LevelSet) -> Self {
        self.levels = levels;
        self
    }

    /// Threshold as a level name, `off` or decimal severity; checked by `build`
    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn trace(mut self, enabled: bool) -> Self {
        self.trace = enabled;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn additive(mut self, additive: bool) -> Self {
        self.additive = additive;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn appender<A: Appender + 'static>(mut self, appender: A) -> Self {
        self.appenders.push(Box::new(appender));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn boxed_appender(mut self, appender: Box<dyn Appender>) -> Self {
        self.appenders.push(appender);
        self
    }

    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`] for an unknown level.
    pub fn build(self) -> Result<Logger> {
        let logger = Logger::with_levels(self.name, self.levels);
        if let Some(level) = &self.level {
            logger.set_level(level)?;
        }
        logger.set_trace_enabled(self.trace);
        logger.set_additive(self.additive);
        for appender in self.appenders {
            logger.add_appender(appender);
        }
        Ok(logger)
    }
}
