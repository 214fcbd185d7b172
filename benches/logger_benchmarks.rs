//! Criterion benchmarks for rust_logger_registry

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rust_logger_registry::helper::{default_color_scheme, LogHelper};
use rust_logger_registry::prelude::*;
use std::sync::Arc;

fn sink_logger(name: &str, pattern: &str) -> Logger {
    Logger::builder(name)
        .level("trace")
        .appender(
            IoAppender::new("sink", std::io::sink())
                .with_formatter(PatternFormatter::from_pattern(pattern).unwrap()),
        )
        .build()
        .unwrap()
}

// ============================================================================
// Registry Benchmarks
// ============================================================================

fn bench_registry(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry");
    group.throughput(Throughput::Elements(1));

    let registry = LoggerRegistry::new();
    registry.resolve("app").unwrap();
    registry.resolve("app.db").unwrap();

    group.bench_function("resolve_primary", |b| {
        b.iter(|| black_box(registry.resolve(black_box("app.db")).unwrap()));
    });

    group.bench_function("resolve_alias", |b| {
        b.iter(|| black_box(registry.resolve(black_box("app.db.pool.conn")).unwrap()));
    });

    group.bench_function("resolve_and_close", |b| {
        b.iter(|| {
            let logger = registry.resolve(black_box("scratch.leaf")).unwrap();
            registry.close(&logger).unwrap();
        });
    });

    group.finish();
}

// ============================================================================
// Emission Benchmarks
// ============================================================================

fn bench_emission(c: &mut Criterion) {
    let mut group = c.benchmark_group("emission");
    group.throughput(Throughput::Elements(1));

    let logger = sink_logger("bench", "%m\n");
    group.bench_function("info_plain", |b| {
        b.iter(|| logger.info(black_box("Info message")));
    });

    let layout = sink_logger("bench.layout", "%d %-5l %c [%t] %m\n");
    group.bench_function("info_layout", |b| {
        b.iter(|| layout.info(black_box("Info message")));
    });

    let traced = sink_logger("bench.trace", "%m %C\n");
    traced.set_trace_enabled(true);
    group.bench_function("info_traced", |b| {
        b.iter(|| traced.info(black_box("Info message")));
    });

    let shared = Arc::new(sink_logger("bench.concurrent", "%m\n"));
    group.bench_function("multi_thread_4", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let logger = Arc::clone(&shared);
                    std::thread::spawn(move || {
                        logger.info(black_box("Concurrent message"));
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }
        });
    });

    group.finish();
}

// ============================================================================
// Level Filtering Benchmarks
// ============================================================================

fn bench_level_filtering(c: &mut Criterion) {
    let mut group = c.benchmark_group("level_filtering");

    let logger = sink_logger("bench.filter", "%m\n");
    logger.set_level("error").unwrap();

    group.bench_function("filtered_out", |b| {
        b.iter(|| logger.debug(black_box("Filtered message")));
    });

    group.bench_function("filtered_out_lazy", |b| {
        b.iter(|| {
            logger.emit_with(
                1,
                || format!("expensive {}", black_box(42)),
                None,
            )
        });
    });

    group.bench_function("enabled_check", |b| {
        b.iter(|| black_box(logger.is_enabled(black_box(5))));
    });

    group.bench_function("passed_through", |b| {
        b.iter(|| logger.error(black_box("Error message")));
    });

    group.finish();
}

// ============================================================================
// Pattern Benchmarks
// ============================================================================

fn bench_pattern(c: &mut Criterion) {
    let mut group = c.benchmark_group("pattern");

    group.bench_function("compile", |b| {
        b.iter(|| PatternFormatter::from_pattern(black_box("[%d] %-5l -- %c : %m\n")).unwrap());
    });

    let formatter = PatternFormatter::from_pattern("[%d] %-5l -- %c : %m\n").unwrap();
    let event = LogEvent::new("app.db", 2, "Formatted message", None);
    group.bench_function("render_default", |b| {
        b.iter(|| black_box(formatter.format(black_box(&event))));
    });

    let scheme = default_color_scheme().unwrap();
    let colored = PatternFormatter::new(
        &PatternOptions::new()
            .with_pattern("%d %5l: %m %C\n")
            .with_color_scheme(scheme.name()),
    )
    .unwrap();
    group.bench_function("render_colored", |b| {
        b.iter(|| black_box(colored.format(black_box(&event))));
    });

    group.finish();
}

// ============================================================================
// Helper Benchmarks
// ============================================================================

fn bench_helper(c: &mut Criterion) {
    let mut group = c.benchmark_group("helper");

    let helper = LogHelper::new();
    helper.set_logger(Arc::new(sink_logger("bench.helper", "%m\n")));

    group.bench_function("step", |b| {
        b.iter(|| helper.log_step(black_box("compile")));
    });

    group.bench_function("todo_repeat", |b| {
        b.iter(|| helper.todo(black_box("already logged")));
    });

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(
    benches,
    bench_registry,
    bench_emission,
    bench_level_filtering,
    bench_pattern,
    bench_helper
);

criterion_main!(benches);
