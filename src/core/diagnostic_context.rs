//! Thread-local diagnostic contexts
//!
//! This module provides:
//! - `MappedContext`: per-thread key-value fields rendered by `%X{key}`
//! - `NestedContext`: per-thread stack of labels rendered by `%x`
//! - `ContextGuard` / `NestedGuard`: RAII guards for scoped context

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

thread_local! {
    static MDC: RefCell<HashMap<String, FieldValue>> = RefCell::new(HashMap::new());
    static NDC: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Value type for mapped context fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Null => write!(f, "null"),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

/// Mapped diagnostic context of the current thread.
///
/// # Example
///
/// ```
/// use rust_logger_registry::core::MappedContext;
///
/// let _guard = MappedContext::scoped("request_id", "abc-123");
/// assert_eq!(MappedContext::get("request_id").unwrap().to_string(), "abc-123");
/// ```
pub struct MappedContext;

impl MappedContext {
    /// Set a field; an existing value is overwritten.
    pub fn insert<K, V>(key: K, value: V)
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        MDC.with(|mdc| {
            mdc.borrow_mut().insert(key.into(), value.into());
        });
    }

    /// Set a field for the lifetime of the returned guard.
    #[must_use = "the field is removed when the guard is dropped"]
    pub fn scoped<K, V>(key: K, value: V) -> ContextGuard
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let key = key.into();
        Self::insert(key.clone(), value);
        ContextGuard { key }
    }

    pub fn get(key: &str) -> Option<FieldValue> {
        MDC.with(|mdc| mdc.borrow().get(key).cloned())
    }

    pub fn remove(key: &str) -> Option<FieldValue> {
        MDC.with(|mdc| mdc.borrow_mut().remove(key))
    }

    pub fn clear() {
        MDC.with(|mdc| mdc.borrow_mut().clear());
    }

    pub fn len() -> usize {
        MDC.with(|mdc| mdc.borrow().len())
    }

    pub fn is_empty() -> bool {
        Self::len() == 0
    }

    /// Format all fields as `key=value` pairs sorted by key
    pub fn format_fields() -> String {
        MDC.with(|mdc| {
            let mdc = mdc.borrow();
            let mut pairs: Vec<_> = mdc.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            pairs.sort();
            pairs.join(" ")
        })
    }
}

/// RAII guard for a scoped mapped context field
///
/// When dropped, removes the field from the current thread's context.
pub struct ContextGuard {
    key: String,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        MappedContext::remove(&self.key);
    }
}

/// Nested diagnostic context of the current thread.
pub struct NestedContext;

impl NestedContext {
    pub fn push(label: impl Into<String>) {
        NDC.with(|ndc| ndc.borrow_mut().push(label.into()));
    }

    /// Push a label for the lifetime of the returned guard.
    #[must_use = "the label is popped when the guard is dropped"]
    pub fn scoped(label: impl Into<String>) -> NestedGuard {
        Self::push(label);
        NestedGuard { _private: () }
    }

    pub fn pop() -> Option<String> {
        NDC.with(|ndc| ndc.borrow_mut().pop())
    }

    pub fn clear() {
        NDC.with(|ndc| ndc.borrow_mut().clear());
    }

    pub fn depth() -> usize {
        NDC.with(|ndc| ndc.borrow().len())
    }

    /// Labels joined with single spaces, outermost first.
    pub fn render() -> String {
        NDC.with(|ndc| ndc.borrow().join(" "))
    }
}

pub struct NestedGuard {
    _private: (),
}

impl Drop for NestedGuard {
    fn drop(&mut self) {
        NestedContext::pop();
    }
}
