//! Options threaded through every value validation
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::validation::formats::FormatRegistry;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Which side of an exchange a value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Neither read-only nor write-only rules apply
    #[default]
    Any,
    /// Read-only properties must be absent and are not required
    Request,
    /// Write-only properties must be absent and are not required
    Response,
}

/// What to do with a pattern the regex engine cannot compile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatternPolicy {
    /// Report `ValidationError::Pattern`
    #[default]
    Error,
    /// Treat the pattern as matching
    Ignore,
}

/// Validation engine selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Engine {
    /// The built-in validator
    #[default]
    BuiltIn,
    /// Translate to JSON Schema 2020-12 and use the `jsonschema` crate
    Conformant,
}

/// Returns `true` when all items are distinct
pub type UniqueItemsComparator = Arc<dyn Fn(&[Value]) -> bool + Send + Sync>;

/// Settings for value validation. Built once, then passed by reference.
#[derive(Clone)]
pub struct ValidationSettings {
    fail_fast: bool,
    multi_errors: bool,
    mode: ValidationMode,
    format_validation: bool,
    strict_formats: bool,
    pattern_validation: bool,
    pattern_policy: PatternPolicy,
    read_only_validation: bool,
    write_only_validation: bool,
    defaults_satisfy_required: bool,
    unique_items: Option<UniqueItemsComparator>,
    error_details: bool,
    engine: Engine,
    formats: Arc<FormatRegistry>,
    max_depth: usize,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            fail_fast: false,
            multi_errors: false,
            mode: ValidationMode::Any,
            format_validation: true,
            strict_formats: false,
            pattern_validation: true,
            pattern_policy: PatternPolicy::Error,
            read_only_validation: true,
            write_only_validation: true,
            defaults_satisfy_required: false,
            unique_items: None,
            error_details: true,
            engine: Engine::BuiltIn,
            formats: Arc::new(FormatRegistry::new()),
            max_depth: 256,
        }
    }
}

impl fmt::Debug for ValidationSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationSettings")
            .field("fail_fast", &self.fail_fast)
            .field("multi_errors", &self.multi_errors)
            .field("mode", &self.mode)
            .field("format_validation", &self.format_validation)
            .field("strict_formats", &self.strict_formats)
            .field("pattern_validation", &self.pattern_validation)
            .field("pattern_policy", &self.pattern_policy)
            .field("read_only_validation", &self.read_only_validation)
            .field("write_only_validation", &self.write_only_validation)
            .field("defaults_satisfy_required", &self.defaults_satisfy_required)
            .field("custom_unique_items", &self.unique_items.is_some())
            .field("error_details", &self.error_details)
            .field("engine", &self.engine)
            .field("formats", &self.formats)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl ValidationSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop at the first failure and report only `ValidationError::FailFast`
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Keep going after a failure and report every error
    pub fn with_multi_errors(mut self, multi_errors: bool) -> Self {
        self.multi_errors = multi_errors;
        self
    }

    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Shorthand for `with_mode(ValidationMode::Request)`
    pub fn for_request(self) -> Self {
        self.with_mode(ValidationMode::Request)
    }

    /// Shorthand for `with_mode(ValidationMode::Response)`
    pub fn for_response(self) -> Self {
        self.with_mode(ValidationMode::Response)
    }

    pub fn with_format_validation(mut self, enabled: bool) -> Self {
        self.format_validation = enabled;
        self
    }

    /// Reject formats missing from the registry
    pub fn with_strict_formats(mut self, strict: bool) -> Self {
        self.strict_formats = strict;
        self
    }

    pub fn with_pattern_validation(mut self, enabled: bool) -> Self {
        self.pattern_validation = enabled;
        self
    }

    pub fn with_pattern_policy(mut self, policy: PatternPolicy) -> Self {
        self.pattern_policy = policy;
        self
    }

    pub fn with_read_only_validation(mut self, enabled: bool) -> Self {
        self.read_only_validation = enabled;
        self
    }

    pub fn with_write_only_validation(mut self, enabled: bool) -> Self {
        self.write_only_validation = enabled;
        self
    }

    /// Let a property's `default` satisfy `required`
    pub fn with_defaults_satisfy_required(mut self, enabled: bool) -> Self {
        self.defaults_satisfy_required = enabled;
        self
    }

    /// Replace the `uniqueItems` check
    pub fn with_unique_items_comparator<F>(mut self, comparator: F) -> Self
    where
        F: Fn(&[Value]) -> bool + Send + Sync + 'static,
    {
        self.unique_items = Some(Arc::new(comparator));
        self
    }

    /// Include schema and value dumps in error messages
    pub fn with_error_details(mut self, enabled: bool) -> Self {
        self.error_details = enabled;
        self
    }

    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_formats(mut self, formats: FormatRegistry) -> Self {
        self.formats = Arc::new(formats);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn fail_fast(&self) -> bool {
        self.fail_fast
    }

    pub fn multi_errors(&self) -> bool {
        self.multi_errors && !self.fail_fast
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    pub fn format_validation(&self) -> bool {
        self.format_validation
    }

    pub fn strict_formats(&self) -> bool {
        self.strict_formats
    }

    pub fn pattern_validation(&self) -> bool {
        self.pattern_validation
    }

    pub fn pattern_policy(&self) -> PatternPolicy {
        self.pattern_policy
    }

    /// Whether a present read-only property is an error
    pub fn rejects_read_only(&self) -> bool {
        self.mode == ValidationMode::Request && self.read_only_validation
    }

    /// Whether a present write-only property is an error
    pub fn rejects_write_only(&self) -> bool {
        self.mode == ValidationMode::Response && self.write_only_validation
    }

    pub fn defaults_satisfy_required(&self) -> bool {
        self.defaults_satisfy_required
    }

    pub fn error_details(&self) -> bool {
        self.error_details
    }

    pub fn engine(&self) -> Engine {
        self.engine
    }

    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Whether all items are distinct, using the configured comparator
    pub fn items_are_unique(&self, items: &[Value]) -> bool {
        match &self.unique_items {
            Some(comparator) => comparator(items),
            None => items
                .iter()
                .enumerate()
                .all(|(i, a)| items[i + 1..].iter().all(|b| !json_equal(a, b))),
        }
    }
}

/// Structural equality where numbers compare by value (`1` equals `1.0`)
pub fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => match (x.as_u64(), y.as_u64()) {
                (Some(x), Some(y)) => x == y,
                _ => x.as_f64() == y.as_f64(),
            },
        },
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| json_equal(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter().all(|(key, a)| y.get(key).is_some_and(|b| json_equal(a, b)))
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let settings = ValidationSettings::default();
        assert!(settings.format_validation());
        assert!(settings.error_details());
        assert!(!settings.multi_errors());
        assert_eq!(settings.engine(), Engine::BuiltIn);
        assert_eq!(settings.mode(), ValidationMode::Any);
    }

    #[test]
    fn test_fail_fast_overrides_multi_errors() {
        let settings = ValidationSettings::new().with_multi_errors(true).with_fail_fast(true);
        assert!(settings.fail_fast());
        assert!(!settings.multi_errors());
    }

    #[test]
    fn test_mode_rules() {
        let request = ValidationSettings::new().for_request();
        assert!(request.rejects_read_only());
        assert!(!request.rejects_write_only());

        let relaxed = ValidationSettings::new().for_request().with_read_only_validation(false);
        assert!(!relaxed.rejects_read_only());

        assert!(ValidationSettings::new().for_response().rejects_write_only());
    }

    #[test]
    fn test_json_equal_is_numeric_aware() {
        assert!(json_equal(&json!(1), &json!(1.0)));
        assert!(json_equal(&json!({"a": [1, 2.0]}), &json!({"a": [1.0, 2]})));
        assert!(!json_equal(&json!("1"), &json!(1)));
        assert!(!json_equal(&json!([1]), &json!([1, 1])));
    }

    #[test]
    fn test_unique_items() {
        let settings = ValidationSettings::new();
        assert!(settings.items_are_unique(&[json!(1), json!(2)]));
        assert!(!settings.items_are_unique(&[json!(1), json!(1.0)]));

        let settings = settings.with_unique_items_comparator(|_| true);
        assert!(settings.items_are_unique(&[json!(1), json!(1)]));
    }
}
