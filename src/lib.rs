//! # Rust Logger Registry
//!
//! Named, hierarchical loggers with custom severity levels and colorized
//! pattern layouts.
//!
//! ## Features
//!
//! - **One logger per name**: [`LoggerRegistry`] hands out shared loggers and
//!   links `a.b.c` under `a.b` whenever both exist
//! - **Custom levels**: `step` and `todo` next to the usual ones, with `todo`
//!   always on and logged once per call site through [`helper::LogHelper`]
//! - **Pattern layouts**: `%d %-5l %c %m %C ...` with printf-style modifiers
//!   and named ANSI color schemes
//! - **Call sites**: file, line and module path captured via `#[track_caller]`
//!
//! ## Example
//!
//! ```
//! use rust_logger_registry::prelude::*;
//!
//! let registry = LoggerRegistry::new();
//! let logger = registry.resolve("app.db").unwrap();
//! logger.set_level("warn").unwrap();
//! logger.add_appender(Box::new(
//!     ConsoleAppender::new().with_formatter(PatternFormatter::from_pattern("%l: %m\n").unwrap()),
//! ));
//!
//! assert!(!logger.debug("connection pool warmed"));
//! assert!(logger.warn("slow query"));
//! ```

pub mod appenders;
pub mod core;
pub mod helper;
pub mod macros;

pub mod prelude {
    pub use crate::appenders::{
        ConsoleAppender, IoAppender, PassThroughAppender, RotatingFileAppender,
        RotationPolicy, RotationStrategy,
    };
    pub use crate::core::{
        Appender, BuiltinLevel, CallSite, ColorScheme, DeviceOptions, LevelSet, LogDevice,
        LogEvent, Logger, LoggerBuilder, LoggerError, LoggerMetrics, LoggerRegistry,
        MappedContext, NestedContext, PatternFormatter, PatternOptions, Result, TimestampFormat,
        Token,
    };
    pub use crate::helper::{HasLogger, LogHelper, LoggerOptions};
}

pub use appenders::{ConsoleAppender, IoAppender, RotatingFileAppender};
pub use core::registry::logger;
pub use core::{
    Appender, BuiltinLevel, CallSite, ColorScheme, DeviceOptions, FieldValue, LevelSet, LogDevice,
    LogEvent, Logger, LoggerBuilder, LoggerError, LoggerMetrics, LoggerRegistry, MappedContext,
    NestedContext, PatternFormatter, PatternOptions, Result, TimestampFormat, Token,
};
pub use helper::{HasLogger, LogHelper, LoggerOptions};
