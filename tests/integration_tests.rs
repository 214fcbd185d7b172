//! Integration tests for the logger registry
//!
//! These tests verify:
//! - Name resolution, aliasing and re-parenting
//! - Threshold gating and appender ordering
//! - Once-per-call-site todo logging
//! - Pattern rendering and color schemes
//! - File output through the helper and device loggers

use parking_lot::Mutex;
use rust_logger_registry::appenders::{IoAppender, RotatingFileAppender, RotationPolicy};
use rust_logger_registry::core::color_scheme;
use rust_logger_registry::helper::{LogHelper, LoggerOptions, RotationOptions};
use rust_logger_registry::prelude::*;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

/// Appender that records `<tag>:<message>` into a shared journal.
struct Recorder {
    tag: String,
    journal: Arc<Mutex<Vec<String>>>,
    formatter: PatternFormatter,
}

impl Recorder {
    fn new(tag: &str, journal: &Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            tag: tag.to_string(),
            journal: Arc::clone(journal),
            formatter: PatternFormatter::from_pattern("%m").unwrap(),
        }
    }
}

impl Appender for Recorder {
    fn name(&self) -> &str {
        &self.tag
    }

    fn formatter(&self) -> &PatternFormatter {
        &self.formatter
    }

    fn set_formatter(&mut self, formatter: PatternFormatter) {
        self.formatter = formatter;
    }

    fn write(&mut self, formatted: &str) -> rust_logger_registry::Result<()> {
        self.journal.lock().push(format!("{}:{}", self.tag, formatted));
        Ok(())
    }

    fn flush(&mut self) -> rust_logger_registry::Result<()> {
        Ok(())
    }
}

#[test]
fn test_resolve_twice_then_close() {
    let registry = LoggerRegistry::new();
    let a = registry.resolve("orders").expect("resolve");
    let again = registry.resolve("orders").expect("resolve");
    assert!(Arc::ptr_eq(&a, &again));

    registry.close(&a).expect("close");
    let fresh = registry.resolve("orders").expect("resolve");
    assert!(!Arc::ptr_eq(&a, &fresh));
    assert!(a.is_closed());
    assert!(!fresh.is_closed());
}

#[test]
fn test_late_parent_reparents_lineage() {
    let registry = LoggerRegistry::new();
    let leaf = registry.resolve("a.b.c").expect("resolve leaf");
    assert_eq!(leaf.name(), "a.b.c");
    assert!(leaf.parent().is_none());

    let mid = registry.resolve("a.b").expect("resolve mid");
    assert_eq!(registry.parent_of("a.b.c").as_deref(), Some("a.b"));
    assert!(Arc::ptr_eq(&leaf.parent().expect("parent"), &mid));
}

#[test]
fn test_namespaced_names_use_double_colon() {
    let registry = LoggerRegistry::new();
    let module = registry.resolve("app::net").expect("resolve");
    let alias = registry.resolve("app::net::tcp").expect("resolve");
    assert!(Arc::ptr_eq(&module, &alias));
    assert_eq!(registry.master_of("app::net::tcp").as_deref(), Some("app::net"));
}

#[test]
fn test_warn_threshold_gates_sinks_in_order() {
    let journal = Arc::new(Mutex::new(Vec::new()));
    let logger = Logger::builder("gate")
        .level("warn")
        .appender(Recorder::new("first", &journal))
        .appender(Recorder::new("second", &journal))
        .appender(Recorder::new("third", &journal))
        .build()
        .expect("build");

    assert!(!logger.debug("quiet"));
    assert!(journal.lock().is_empty());

    assert!(logger.warn("loud"));
    assert_eq!(
        *journal.lock(),
        vec!["first:loud", "second:loud", "third:loud"]
    );
}

#[test]
fn test_invalid_threshold_keeps_previous() {
    let logger = Logger::builder("strict").level("error").build().expect("build");
    for bad in ["verbose", "1.5", "-1", "99"] {
        let err = logger.set_level(bad).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }), "{}", bad);
        assert_eq!(logger.level_name(), "error");
    }
    logger.set_level("2").expect("numeric severity");
    assert_eq!(logger.level_name(), "info");
}

#[test]
fn test_todo_dedup_by_call_site() {
    let journal = Arc::new(Mutex::new(Vec::new()));
    let helper = LogHelper::new();
    helper.set_logger(Arc::new(
        Logger::builder("todo")
            .level("off")
            .appender(Recorder::new("r", &journal))
            .build()
            .expect("build"),
    ));

    for _ in 0..2 {
        helper.todo("x");
    }
    assert_eq!(journal.lock().len(), 1);

    helper.todo("x");
    helper.todo("x");
    assert_eq!(journal.lock().len(), 3);
    assert_eq!(helper.todos().len(), 3);
}

#[test]
fn test_level_and_message_pattern() {
    let formatter = PatternFormatter::from_pattern("%l: %m").expect("compile");
    let levels = rust_logger_registry::core::level_set::global();
    let event = LogEvent::new("disk", levels.severity("error").unwrap(), "disk full", None);
    assert_eq!(formatter.format(&event), "ERROR: disk full");

    let err = PatternFormatter::from_pattern("%z").unwrap_err();
    assert!(matches!(err, LoggerError::Pattern { .. }));
}

#[test]
fn test_color_scheme_round_trip_and_rendering() {
    let scheme = ColorScheme::new("integration-scheme")
        .with_level("warn", "yellow")
        .unwrap()
        .with_token(Token::Logger, "\x1b[38;5;89m")
        .unwrap();
    let expected = scheme.clone();
    scheme.register();
    assert_eq!(*color_scheme::lookup("integration-scheme").unwrap(), expected);

    let formatter = PatternFormatter::new(
        &PatternOptions::new()
            .with_pattern("%c %l")
            .with_color_scheme("integration-scheme"),
    )
    .expect("compile");
    let event = LogEvent::new("svc", 4, "ignored", None);
    assert_eq!(
        formatter.format(&event),
        "\x1b[38;5;89msvc\x1b[0m \x1b[33mWARN\x1b[0m"
    );

    let missing = PatternFormatter::new(&PatternOptions::new().with_color_scheme("nope"));
    assert!(matches!(
        missing.unwrap_err(),
        LoggerError::InvalidConfiguration { .. }
    ));
}

#[test]
fn test_call_site_rendering_with_trace() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("trace.log");
    let logger = Logger::builder("traced")
        .level("info")
        .trace(true)
        .appender(
            RotatingFileAppender::new(&path)
                .expect("appender")
                .with_formatter(PatternFormatter::from_pattern("%f:%L %m\n").unwrap()),
        )
        .build()
        .expect("build");

    let line = line!() + 1;
    logger.info("traced");
    logger.emit(2, "untraced", Some(false));
    logger.flush().expect("flush");

    let content = fs::read_to_string(&path).expect("read");
    assert_eq!(
        content,
        format!("integration_tests.rs:{} traced\n: untraced\n", line)
    );
}

#[test]
fn test_helper_writes_console_and_rotating_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let options = LoggerOptions::new()
        .with_name("deploy")
        .with_log_path(temp_dir.path())
        .with_level("info")
        .with_rotation(RotationOptions {
            size: Some(64),
            keep: Some(2),
            ..RotationOptions::default()
        });

    let helper = LogHelper::new();
    let logger = helper.get_logger_from(&options, "integration").expect("logger");
    assert_eq!(logger.appender_count(), 2);

    for i in 0..10 {
        logger.info(format!("line {}", i));
    }
    logger.flush().expect("flush");

    let dir = temp_dir.path();
    assert!(dir.join("deploy.log").exists());
    assert!(dir.join("deploy.log.1").exists());
    assert!(!dir.join("deploy.log.3").exists());

    let current = fs::read_to_string(dir.join("deploy.log")).expect("read");
    assert!(current.contains("integration - "));
    assert!(current.contains(" INFO: line 9"));
    assert!(!current.contains('\x1b'));
}

#[test]
fn test_helper_origin_drops_prefix_for_quiet_levels() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let file = temp_dir.path().join("origin.log");
    let options = LoggerOptions::new()
        .with_log_file(&file)
        .with_level("warn")
        .with_level_origin("--log-level");

    let helper = LogHelper::new();
    let logger = helper.get_logger_from(&options, "ignored").expect("logger");
    logger.warn("careful");
    logger.flush().expect("flush");

    let content = fs::read_to_string(&file).expect("read");
    assert!(!content.contains("ignored"));
    assert!(content.contains(" WARN: careful"));
}

#[test]
fn test_device_logger_writes_severity_prefixed_lines() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("device.log");
    let registry = LoggerRegistry::new();
    let logger = registry
        .logger_for(
            &LogDevice::File(path.clone()),
            &DeviceOptions::new()
                .with_level("debug")
                .with_rotation(RotationPolicy::new().with_max_backups(1)),
        )
        .expect("device logger");

    logger.debug("checking");
    logger.info("ready");
    registry.close(&logger).expect("close");

    let content = fs::read_to_string(&path).expect("read");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("D, ["));
    assert!(lines[0].ends_with("DEBUG : checking"));
    assert!(lines[1].contains(&format!(" #{}]", std::process::id())));
    assert!(lines[1].ends_with(" INFO : ready"));
}

#[test]
fn test_forwarding_to_parent_is_opt_in() {
    let journal = Arc::new(Mutex::new(Vec::new()));
    let registry = LoggerRegistry::new();
    let child = registry.resolve("svc.api").expect("child");
    let parent = registry.resolve("svc").expect("parent");

    parent.add_appender(Box::new(Recorder::new("parent", &journal)));
    child.add_appender(Box::new(Recorder::new("child", &journal)));

    assert!(!child.is_additive());
    child.warn("kept");
    assert_eq!(*journal.lock(), vec!["child:kept"]);

    child.set_additive(true);
    child.warn("bubbled");
    assert_eq!(
        *journal.lock(),
        vec!["child:kept", "child:bubbled", "parent:bubbled"]
    );
}

#[test]
fn test_mdc_and_ndc_in_pattern() {
    let out = Arc::new(Mutex::new(Vec::new()));

    #[derive(Clone)]
    struct Sink(Arc<Mutex<Vec<u8>>>);
    impl std::io::Write for Sink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let logger = Logger::builder("ctx")
        .appender(
            IoAppender::new("mem", Sink(Arc::clone(&out)))
                .with_formatter(PatternFormatter::from_pattern("[%X{request}] %x %m\n").unwrap()),
        )
        .build()
        .expect("build");

    {
        let _request = MappedContext::scoped("request", "r-17");
        let _outer = NestedContext::scoped("outer");
        let _inner = NestedContext::scoped("inner");
        logger.info("handled");
    }
    logger.info("idle");

    assert_eq!(
        String::from_utf8_lossy(&out.lock()),
        "[r-17] outer inner handled\n[]  idle\n"
    );
}
