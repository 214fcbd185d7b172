//! Core logger types and traits

pub mod appender;
pub mod color_scheme;
pub mod diagnostic_context;
pub mod error;
pub mod level_set;
pub mod log_event;
pub mod logger;
pub mod metrics;
pub mod pattern;
pub mod registry;
pub mod timestamp;

pub use appender::Appender;
pub use color_scheme::{ColorScheme, Token};
pub use diagnostic_context::{ContextGuard, FieldValue, MappedContext, NestedContext, NestedGuard};
pub use error::{LoggerError, Result};
pub use level_set::{BuiltinLevel, LevelSet};
pub use log_event::{CallSite, LogEvent};
pub use logger::{Logger, LoggerBuilder};
pub use metrics::LoggerMetrics;
pub use pattern::{PatternFormatter, PatternOptions};
pub use registry::{DeviceOptions, LogDevice, LoggerRegistry};
pub use timestamp::{DatePattern, TimestampFormat};
