//! Log event structure

use chrono::{DateTime, Local};
use std::cell::RefCell;
use std::panic::Location;
use std::sync::Arc;

// Thread-local caches for thread information to avoid repeated allocations
thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
    static THREAD_NAME_CACHE: RefCell<Option<Option<String>>> = const { RefCell::new(None) };
}

/// Get cached thread ID, computing and caching it on first access
fn get_thread_id() -> String {
    THREAD_ID_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if cache.is_none() {
            let raw = format!("{:?}", std::thread::current().id());
            let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
            *cache = Some(if digits.is_empty() { raw } else { digits });
        }
        cache.as_ref().expect("thread_id cache initialized in previous line").clone()
    })
}

/// Get cached thread name, computing and caching it on first access
fn get_thread_name() -> Option<String> {
    THREAD_NAME_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if cache.is_none() {
            *cache = Some(std::thread::current().name().map(String::from));
        }
        cache.as_ref().expect("thread_name cache initialized in previous line").clone()
    })
}

/// Source position of the code that emitted an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    location: &'static Location<'static>,
    method: &'static str,
}

impl CallSite {
    /// The caller's position; `#[track_caller]` wrappers are skipped.
    #[track_caller]
    #[must_use]
    pub fn here() -> Self {
        Self {
            location: Location::caller(),
            method: "",
        }
    }

    #[must_use]
    pub fn from_location(location: &'static Location<'static>) -> Self {
        Self {
            location,
            method: "",
        }
    }

    /// Attach the enclosing method or module path.
    #[must_use]
    pub fn with_method(mut self, method: &'static str) -> Self {
        self.method = method;
        self
    }

    pub fn file(&self) -> &'static str {
        self.location.file()
    }

    pub fn line(&self) -> u32 {
        self.location.line()
    }

    pub fn method(&self) -> &'static str {
        self.method
    }

    /// Key identifying this call site, `file::line`.
    pub fn key(&self) -> String {
        format!("{}::{}", self.file(), self.line())
    }
}

/// One emitted message. Immutable once built.
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub logger: Arc<str>,
    pub level: u32,
    pub data: String,
    pub time: DateTime<Local>,
    pub call_site: Option<CallSite>,
    pub thread_id: String,
    pub thread_name: Option<String>,
}

impl LogEvent {
    pub fn new(
        logger: impl Into<Arc<str>>,
        level: u32,
        data: impl Into<String>,
        call_site: Option<CallSite>,
    ) -> Self {
        Self {
            logger: logger.into(),
            level,
            data: data.into(),
            time: Local::now(),
            call_site,
            thread_id: get_thread_id(),
            thread_name: get_thread_name(),
        }
    }

    /// Build an event, recording the caller's position when `capture_trace` is set.
    #[track_caller]
    pub fn capture(
        logger: impl Into<Arc<str>>,
        level: u32,
        data: impl Into<String>,
        capture_trace: bool,
    ) -> Self {
        let call_site = if capture_trace {
            Some(CallSite::here())
        } else {
            None
        };
        Self::new(logger, level, data, call_site)
    }

    #[must_use]
    pub fn with_time(mut self, time: DateTime<Local>) -> Self {
        self.time = time;
        self
    }

    /// Source file, empty when no call site was captured.
    pub fn file(&self) -> &str {
        self.call_site.map(|cs| cs.file()).unwrap_or("")
    }

    /// Source line, zero when no call site was captured.
    pub fn line(&self) -> u32 {
        self.call_site.map(|cs| cs.line()).unwrap_or(0)
    }

    pub fn method(&self) -> &str {
        self.call_site.map(|cs| cs.method()).unwrap_or("")
    }
}
