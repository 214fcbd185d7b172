//! Property-based tests for rust_logger_registry using proptest

use proptest::prelude::*;
use rust_logger_registry::core::{color_scheme, level_set, registry::ancestors};
use rust_logger_registry::prelude::*;
use std::sync::Arc;

fn segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,6}"
}

fn dotted_name() -> impl Strategy<Value = String> {
    prop::collection::vec(segment(), 1..5).prop_map(|parts| parts.join("."))
}

fn builtin_level() -> impl Strategy<Value = BuiltinLevel> {
    prop::sample::select(BuiltinLevel::ALL.to_vec())
}

// ============================================================================
// Level Tests
// ============================================================================

proptest! {
    /// Threshold text round-trips through the level name
    #[test]
    fn test_threshold_name_roundtrip(level in builtin_level()) {
        let levels = level_set::global();
        let severity = levels.builtin(level).unwrap();
        let logger = Logger::new("prop-threshold");
        logger.set_level(level.as_str()).unwrap();
        prop_assert_eq!(logger.threshold(), severity);
        prop_assert_eq!(logger.level_name(), level.as_str());
    }

    /// Only levels at or above the threshold are enabled, todo always is
    #[test]
    fn test_enabled_matches_threshold(threshold in 0u32..=8, level in builtin_level()) {
        let logger = Logger::new("prop-enabled");
        logger.set_severity(threshold).unwrap();
        let severity = level_set::global().builtin(level).unwrap();
        let expected = severity >= threshold || level == BuiltinLevel::Todo;
        prop_assert_eq!(logger.is_enabled(severity), expected);
        prop_assert_eq!(logger.is_enabled_for(level.as_str()), expected);
    }

    /// A rejected threshold never changes the current one
    #[test]
    fn test_invalid_threshold_is_rejected(text in "[a-z]{3,10}|[0-9]{2,4}|-[0-9]+") {
        let levels = level_set::global();
        prop_assume!(levels.parse_threshold(&text).is_err());
        let logger = Logger::new("prop-invalid");
        logger.set_level("error").unwrap();
        let before = logger.threshold();
        prop_assert!(logger.set_level(&text).is_err());
        prop_assert_eq!(logger.threshold(), before);
    }
}

// ============================================================================
// Registry Tests
// ============================================================================

proptest! {
    /// Resolving twice yields the same instance; closing gives a fresh one
    #[test]
    fn test_resolve_identity(name in dotted_name()) {
        let registry = LoggerRegistry::new();
        let first = registry.resolve(&name).unwrap();
        prop_assert!(Arc::ptr_eq(&first, &registry.resolve(&name).unwrap()));
        registry.close(&first).unwrap();
        prop_assert!(!Arc::ptr_eq(&first, &registry.resolve(&name).unwrap()));
    }

    /// Any resolution order leaves each primary linked to its nearest
    /// registered primary ancestor
    #[test]
    fn test_parent_index_after_any_order(
        names in prop::collection::vec(
            prop::collection::vec(prop::sample::select(vec!["a", "b", "c"]), 1..5)
                .prop_map(|parts| parts.join(".")),
            1..12,
        )
    ) {
        let registry = LoggerRegistry::new();
        for name in &names {
            registry.resolve(name).unwrap();
        }
        for name in &names {
            let logger = registry.get(name).unwrap();
            if logger.name() == name.as_str() {
                let expected = ancestors(name)
                    .into_iter()
                    .find(|a| registry.get(a).is_some_and(|l| l.name() == *a))
                    .map(str::to_string);
                prop_assert_eq!(
                    logger.parent().map(|p| p.name().to_string()),
                    expected.clone()
                );
                prop_assert_eq!(registry.parent_of(name), expected);
            } else {
                prop_assert!(ancestors(name).contains(&logger.name()));
            }
        }
    }

    /// Ancestors are proper prefixes ending on a separator, nearest first
    #[test]
    fn test_ancestors_are_prefixes(name in dotted_name()) {
        let found = ancestors(&name);
        prop_assert_eq!(found.len(), name.matches('.').count());
        for window in found.windows(2) {
            prop_assert!(window[0].len() > window[1].len());
        }
        for ancestor in found {
            prop_assert!(name.starts_with(ancestor));
            prop_assert_eq!(&name[ancestor.len()..ancestor.len() + 1], ".");
        }
    }
}

// ============================================================================
// Pattern Tests
// ============================================================================

proptest! {
    /// Literal text without directives renders unchanged
    #[test]
    fn test_literal_pattern_unchanged(text in "[a-zA-Z0-9 ,.:;\\[\\]-]{0,40}") {
        let formatter = PatternFormatter::from_pattern(&text).unwrap();
        let event = LogEvent::new("prop", 2, "ignored", None);
        prop_assert_eq!(formatter.format(&event), text);
    }

    /// Messages are rendered verbatim by %m
    #[test]
    fn test_message_verbatim(message in "\\PC{0,80}") {
        let formatter = PatternFormatter::from_pattern("%m").unwrap();
        let event = LogEvent::new("prop", 5, message.clone(), None);
        prop_assert_eq!(formatter.format(&event), message);
    }

    /// Width pads and precision truncates, counting characters
    #[test]
    fn test_width_and_precision(
        message in "[a-z]{0,20}",
        width in 0usize..30,
        precision in 1usize..10,
        left in any::<bool>(),
    ) {
        let pattern = format!("%{}{}.{}m", if left { "-" } else { "" }, width, precision);
        let formatter = PatternFormatter::from_pattern(&pattern).unwrap();
        let rendered = formatter.format(&LogEvent::new("prop", 2, message.clone(), None));

        let kept: String = message.chars().take(precision).collect();
        prop_assert_eq!(rendered.chars().count(), kept.len().max(width));
        prop_assert_eq!(rendered.trim(), kept.as_str());
        if left {
            prop_assert!(rendered.starts_with(&kept));
        } else {
            prop_assert!(rendered.ends_with(&kept));
        }
    }

    /// Letters that are not directives are rejected
    #[test]
    fn test_unknown_directive_rejected(letter in "[a-zA-Z]") {
        let letter = letter.chars().next().unwrap();
        prop_assume!(!"cdFfLlMmprtTCgxX".contains(letter));
        let err = PatternFormatter::from_pattern(&format!("%{}", letter)).unwrap_err();
        prop_assert!(matches!(err, LoggerError::Pattern { .. }), "unexpected error kind");
    }

    /// Registered schemes are found again with the same mapping
    #[test]
    fn test_color_scheme_roundtrip(
        id in "[a-z]{8}",
        colors in prop::collection::btree_map(
            prop::sample::select(vec!["trace", "debug", "info", "warn", "error"]),
            0u8..=255,
            0..5,
        ),
    ) {
        let name = format!("prop-{}", id);
        let mut scheme = ColorScheme::new(name.clone());
        for (level, code) in &colors {
            scheme.set_level(level, &format!("\x1b[38;5;{}m", code)).unwrap();
        }
        let expected = scheme.clone();
        scheme.register();

        let found = color_scheme::lookup(&name).unwrap();
        prop_assert_eq!(&*found, &expected);
        color_scheme::remove(&name);
    }
}
