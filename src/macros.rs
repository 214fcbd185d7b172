//! Logging macros with lazy formatting.
//!
//! The format arguments are only evaluated when the level is enabled. When
//! the logger captures call sites, the macro's own position is recorded
//! together with the enclosing `module_path!()` as the method.
//!
//! # Examples
//!
//! ```
//! use rust_logger_registry::prelude::*;
//! use rust_logger_registry::{info, warn};
//!
//! let logger = Logger::builder("server").level("info").build().unwrap();
//!
//! info!(logger, "Server started");
//!
//! let port = 8080;
//! assert!(info!(logger, "Server listening on port {}", port));
//!
//! logger.set_level("error").unwrap();
//! assert!(!warn!(logger, "never formatted: {}", port));
//! ```

/// Log at a numeric severity.
///
/// Evaluates to `true` when the level passed the threshold.
///
/// # Examples
///
/// ```
/// # use rust_logger_registry::prelude::*;
/// # let logger = Logger::new("macros");
/// use rust_logger_registry::log;
/// let error = logger.levels().severity("error").unwrap();
/// log!(logger, error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let logger: &$crate::Logger = &$logger;
        let level: u32 = $level;
        if !logger.is_enabled(level) {
            false
        } else if logger.trace_enabled() {
            logger.log_at(
                level,
                format!($($arg)+),
                $crate::CallSite::here().with_method(module_path!()),
            )
        } else {
            logger.emit(level, format!($($arg)+), Some(false))
        }
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! log_builtin {
    ($logger:expr, $builtin:expr, $($arg:tt)+) => {{
        let logger: &$crate::Logger = &$logger;
        match logger.levels().builtin($builtin) {
            Some(level) => $crate::log!(logger, level, $($arg)+),
            None => false,
        }
    }};
}

/// Log a trace-level message.
///
/// # Examples
///
/// ```
/// # use rust_logger_registry::prelude::*;
/// # let logger = Logger::new("macros");
/// # logger.set_level("trace").unwrap();
/// use rust_logger_registry::trace;
/// trace!(logger, "Entering function: calculate()");
/// trace!(logger, "Variable value: {}", 42);
/// ```
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_builtin!($logger, $crate::BuiltinLevel::Trace, $($arg)+)
    };
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_builtin!($logger, $crate::BuiltinLevel::Debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_builtin!($logger, $crate::BuiltinLevel::Info, $($arg)+)
    };
}

/// Log a step-level message. Unlike [`LogHelper::log_step`](crate::helper::LogHelper::log_step)
/// no counter is involved.
#[macro_export]
macro_rules! step {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_builtin!($logger, $crate::BuiltinLevel::Step, $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_builtin!($logger, $crate::BuiltinLevel::Warn, $($arg)+)
    };
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_builtin!($logger, $crate::BuiltinLevel::Error, $($arg)+)
    };
}

#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_builtin!($logger, $crate::BuiltinLevel::Fatal, $($arg)+)
    };
}

/// Log at the `todo` level, ignoring the threshold.
///
/// No de-duplication happens; use [`LogHelper::todo`](crate::helper::LogHelper::todo)
/// for once-per-call-site reminders.
#[macro_export]
macro_rules! todo_log {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_builtin!($logger, $crate::BuiltinLevel::Todo, $($arg)+)
    };
}
