//! Value validation error types
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::loader::index::escape_segment;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// A value failed one schema keyword
#[derive(Debug, Clone)]
pub struct SchemaError {
    /// Segments from the validated root to the failing value
    path: Vec<String>,
    /// The keyword that rejected the value, e.g. `"maxLength"`
    pub schema_field: String,
    /// Human-readable reason
    pub reason: String,
    /// Error that caused this one, e.g. the branch failures of `oneOf`
    pub origin: Option<Box<ValidationError>>,
    /// Dump of the failing schema, absent when details are disabled
    pub schema: Option<Value>,
    /// Dump of the failing value, absent when details are disabled
    pub value: Option<Value>,
}

impl SchemaError {
    /// Create a new error at the root path
    pub fn new<F, R>(schema_field: F, reason: R) -> Self
    where
        F: Into<String>,
        R: Into<String>,
    {
        Self {
            path: Vec::new(),
            schema_field: schema_field.into(),
            reason: reason.into(),
            origin: None,
            schema: None,
            value: None,
        }
    }

    pub fn with_origin(mut self, origin: ValidationError) -> Self {
        self.origin = Some(Box::new(origin));
        self
    }

    /// Attach schema and value dumps
    pub fn with_details(mut self, schema: Value, value: Value) -> Self {
        self.schema = Some(schema);
        self.value = Some(value);
        self
    }

    /// Replace the whole path
    pub fn with_path<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path = path.into_iter().map(Into::into).collect();
        self
    }

    /// Path segments from the root to the failing value
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// The path as a JSON pointer, `""` at the root
    pub fn json_pointer(&self) -> String {
        self.path
            .iter()
            .map(|segment| format!("/{}", escape_segment(segment)))
            .collect()
    }

    fn prepend(&mut self, segment: &str) {
        self.path.insert(0, segment.to_string());
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.path.is_empty() {
            write!(f, "Error at {:?}: ", self.json_pointer())?;
        }
        write!(f, "{}", self.reason)?;

        if let Some(schema) = &self.schema {
            write!(f, "\nSchema:\n  {}\n", pretty(schema))?;
        }
        if let Some(value) = &self.value {
            write!(f, "\nValue:\n  {}\n", pretty(value))?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.origin
            .as_deref()
            .map(|origin| origin as &(dyn std::error::Error + 'static))
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|_| value.to_string())
        .replace('\n', "\n  ")
}

/// Every error found in multi-error mode
#[derive(Debug, Clone, Default)]
pub struct MultiError {
    pub errors: Vec<ValidationError>,
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        write!(f, "{}", messages.join(" | "))
    }
}

impl std::error::Error for MultiError {}

impl MultiError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an error, flattening nested aggregates
    pub fn add(&mut self, error: ValidationError) {
        match error {
            ValidationError::Multi(multi) => self.errors.extend(multi.errors),
            other => self.errors.push(other),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    /// Ok when nothing was collected
    pub fn into_result(self) -> ValidationResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Multi(self))
        }
    }
}

impl From<Vec<ValidationError>> for MultiError {
    fn from(errors: Vec<ValidationError>) -> Self {
        let mut multi = Self::new();
        for error in errors {
            multi.add(error);
        }
        multi
    }
}

/// Failure of a value validation
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("{0}")]
    Schema(Box<SchemaError>),

    #[error("{0}")]
    Multi(MultiError),

    /// Returned instead of details when fail-fast is enabled
    #[error("value does not match the schema")]
    FailFast,

    #[error("found unresolved ref: {reference:?}")]
    UnresolvedRef { reference: String },

    #[error("unsupported pattern {pattern:?}: {reason}")]
    Pattern { pattern: String, reason: String },

    #[error("maximum validation depth of {max_depth} exceeded")]
    DepthExceeded { max_depth: usize },

    /// Origin of a `oneOf` failure matching several branches
    #[error("input matches more than one oneOf schemas (indices {indices:?})")]
    Ambiguous { indices: Vec<usize> },
}

impl From<SchemaError> for ValidationError {
    fn from(error: SchemaError) -> Self {
        ValidationError::Schema(Box::new(error))
    }
}

impl From<MultiError> for ValidationError {
    fn from(error: MultiError) -> Self {
        ValidationError::Multi(error)
    }
}

impl ValidationError {
    pub fn unresolved_ref<S: Into<String>>(reference: S) -> Self {
        ValidationError::UnresolvedRef {
            reference: reference.into(),
        }
    }

    pub fn pattern<P: Into<String>, R: Into<String>>(pattern: P, reason: R) -> Self {
        ValidationError::Pattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Prefix the path of every contained schema error with one segment
    pub fn at(mut self, segment: &str) -> Self {
        match &mut self {
            ValidationError::Schema(error) => error.prepend(segment),
            ValidationError::Multi(multi) => {
                multi.errors = std::mem::take(&mut multi.errors)
                    .into_iter()
                    .map(|error| error.at(segment))
                    .collect();
            }
            _ => {}
        }
        self
    }

    /// The first schema error, looking into aggregates
    pub fn as_schema_error(&self) -> Option<&SchemaError> {
        match self {
            ValidationError::Schema(error) => Some(error.as_ref()),
            ValidationError::Multi(multi) => multi.errors.iter().find_map(Self::as_schema_error),
            _ => None,
        }
    }

    /// All schema errors, flattened
    pub fn schema_errors(&self) -> Vec<&SchemaError> {
        match self {
            ValidationError::Schema(error) => vec![error.as_ref()],
            ValidationError::Multi(multi) => multi.errors.iter().flat_map(Self::schema_errors).collect(),
            _ => Vec::new(),
        }
    }

    pub fn is_fail_fast(&self) -> bool {
        matches!(self, ValidationError::FailFast)
    }
}

/// Result type for value validation
pub type ValidationResult<T> = Result<T, ValidationError>;
