//! Error types for the logger registry

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Invalid or missing level, unknown color scheme, malformed threshold
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Unknown or malformed directive in a format pattern
    #[error("Invalid pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    /// The real logging backend could not be constructed
    #[error("Logging backend unavailable: {0}")]
    BackendUnavailable(String),

    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON configuration error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// File appender error with path
    #[error("File appender error for '{path}': {message}")]
    FileAppenderError { path: String, message: String },

    /// File rotation error
    #[error("File rotation failed for '{path}': {message}")]
    FileRotationError { path: String, message: String },

    /// Writer error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),

    /// Logger was already closed and removed from its registry
    #[error("Logger '{name}' is already closed")]
    LoggerClosed { name: String },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a pattern error
    pub fn pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Pattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    pub fn backend<S: Into<String>>(msg: S) -> Self {
        LoggerError::BackendUnavailable(msg.into())
    }

    /// Create a file appender error
    pub fn file_appender(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileAppenderError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a file rotation error
    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRotationError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }

    pub fn closed<S: Into<String>>(name: S) -> Self {
        LoggerError::LoggerClosed { name: name.into() }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// Whether the helper may recover from this error with the pass-through fallback.
    ///
    /// Configuration and pattern errors are never recoverable: continuing would
    /// leave a logger with undefined severity or layout semantics.
    #[must_use]
    pub fn is_backend_failure(&self) -> bool {
        !matches!(
            self,
            LoggerError::InvalidConfiguration { .. } | LoggerError::Pattern { .. }
        )
    }
}
