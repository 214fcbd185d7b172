//! Appender implementations

pub mod console;
pub mod io;
pub mod passthrough;
pub mod rotating_file;

pub use console::{ConsoleAppender, ConsoleTarget};
pub use io::IoAppender;
pub use passthrough::PassThroughAppender;
pub use rotating_file::{RotatingFileAppender, RotationAge, RotationPolicy, RotationStrategy};

pub use crate::core::Appender;
