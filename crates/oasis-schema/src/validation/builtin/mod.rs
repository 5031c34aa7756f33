//! Built-in value validator
//!
//! Checks run in a fixed order: combinators, `enum`, the null rule, the
//! type check, then the keywords of the value's own kind. In multi-error
//! mode every failing check is collected; otherwise the first one wins.
//! Configuration problems (unresolved references, unsupported patterns,
//! excessive depth) always abort immediately.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

mod array;
mod combinators;
mod number;
mod object;
mod string;

use crate::model::{NullStyle, Ref, Schema, SchemaType};
use crate::validation::engine::ValidationEngine;
use crate::validation::error::{MultiError, SchemaError, ValidationError, ValidationResult};
use crate::validation::settings::{json_equal, ValidationSettings};
use serde_json::Value;

/// The built-in engine
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltInEngine;

impl ValidationEngine for BuiltInEngine {
    fn name(&self) -> &'static str {
        "built-in"
    }

    fn validate(&self, schema: &Schema, value: &Value, settings: &ValidationSettings) -> ValidationResult<()> {
        Validator::new(settings).visit(schema, value, 0)
    }
}

/// Walks a value and a schema graph together
pub(crate) struct Validator<'s> {
    settings: &'s ValidationSettings,
}

impl<'s> Validator<'s> {
    pub(crate) fn new(settings: &'s ValidationSettings) -> Self {
        Self { settings }
    }

    pub(crate) fn settings(&self) -> &'s ValidationSettings {
        self.settings
    }

    pub(crate) fn visit(&self, schema: &Schema, value: &Value, depth: usize) -> ValidationResult<()> {
        if depth > self.settings.max_depth() {
            return Err(ValidationError::DepthExceeded {
                max_depth: self.settings.max_depth(),
            });
        }
        let mut outcome = self.outcome();

        let combined = combinators::visit(self, schema, value, depth);
        let combinators_matched = combined.is_ok();
        outcome.record(combined)?;

        if let Some(allowed) = &schema.enum_values {
            if !allowed.iter().any(|candidate| json_equal(candidate, value)) {
                outcome.fail(self.error(
                    schema,
                    value,
                    "enum",
                    format!("value is not one of the allowed values {}", Value::Array(allowed.clone())),
                ))?;
            }
        }

        if value.is_null() {
            let untyped_combination = schema.types.is_empty()
                && (schema.has_combinators() || schema.not.is_some())
                && combinators_matched;
            if !schema.types.permits_null() && !untyped_combination {
                outcome.fail(self.error(schema, value, "nullable", "Value is not nullable"))?;
            }
            return outcome.finish();
        }

        if let Some(reason) = type_mismatch(schema, value) {
            outcome.fail(self.error(schema, value, "type", reason))?;
            return outcome.finish();
        }

        let checked = match value {
            Value::Number(number) => number::visit(self, schema, number, value),
            Value::String(text) => string::visit(self, schema, text, value),
            Value::Array(items) => array::visit(self, schema, items, value, depth),
            Value::Object(properties) => object::visit(self, schema, properties, value, depth),
            Value::Bool(_) | Value::Null => Ok(()),
        };
        outcome.record(checked)?;
        outcome.finish()
    }

    /// Validate against a referenced schema one level deeper
    pub(crate) fn visit_ref(&self, node: &Ref<Schema>, value: &Value, depth: usize) -> ValidationResult<()> {
        self.visit(self.resolve(node)?, value, depth + 1)
    }

    pub(crate) fn resolve<'n>(&self, node: &'n Ref<Schema>) -> ValidationResult<&'n Schema> {
        node.value()
            .ok_or_else(|| ValidationError::unresolved_ref(node.reference().unwrap_or_default()))
    }

    /// An error for `schema` rejecting `value`, or the fail-fast sentinel
    pub(crate) fn error<R: Into<String>>(
        &self,
        schema: &Schema,
        value: &Value,
        field: &str,
        reason: R,
    ) -> ValidationError {
        self.error_with_origin(schema, value, field, reason, None)
    }

    pub(crate) fn error_with_origin<R: Into<String>>(
        &self,
        schema: &Schema,
        value: &Value,
        field: &str,
        reason: R,
        origin: Option<ValidationError>,
    ) -> ValidationError {
        if self.settings.fail_fast() {
            return ValidationError::FailFast;
        }
        let mut error = SchemaError::new(field, reason);
        if let Some(origin) = origin {
            error = error.with_origin(origin);
        }
        if self.settings.error_details() {
            let dump = serde_json::to_value(schema).unwrap_or(Value::Null);
            error = error.with_details(dump, value.clone());
        }
        error.into()
    }

    pub(crate) fn outcome(&self) -> Outcome {
        Outcome {
            collect: self.settings.multi_errors(),
            errors: MultiError::new(),
        }
    }
}

/// Errors of one schema level
pub(crate) struct Outcome {
    collect: bool,
    errors: MultiError,
}

impl Outcome {
    /// Keep a value failure when collecting; anything else is returned
    pub(crate) fn record(&mut self, result: ValidationResult<()>) -> ValidationResult<()> {
        match result {
            Ok(()) => Ok(()),
            Err(error) if self.collect && is_value_failure(&error) => {
                self.errors.add(error);
                Ok(())
            }
            Err(error) => Err(error),
        }
    }

    pub(crate) fn fail(&mut self, error: ValidationError) -> ValidationResult<()> {
        self.record(Err(error))
    }

    pub(crate) fn finish(self) -> ValidationResult<()> {
        self.errors.into_result()
    }
}

/// Whether an error says the value is wrong rather than the schema
pub(crate) fn is_value_failure(error: &ValidationError) -> bool {
    matches!(
        error,
        ValidationError::Schema(_) | ValidationError::Multi(_) | ValidationError::FailFast
    )
}

/// The kind of a non-null value; integral numbers are integers
fn value_kind(value: &Value) -> Option<SchemaType> {
    match value {
        Value::Null => None,
        Value::Bool(_) => Some(SchemaType::Boolean),
        Value::Number(number) => {
            let integral = number.is_i64()
                || number.is_u64()
                || number.as_f64().is_some_and(|n| n.fract() == 0.0);
            Some(if integral { SchemaType::Integer } else { SchemaType::Number })
        }
        Value::String(_) => Some(SchemaType::String),
        Value::Array(_) => Some(SchemaType::Array),
        Value::Object(_) => Some(SchemaType::Object),
    }
}

fn type_mismatch(schema: &Schema, value: &Value) -> Option<String> {
    let types = &schema.types;
    let kind = value_kind(value)?;
    if types.is_unconstrained() {
        // `type: "null"` alone admits nothing else
        return (types.null_style() == Some(NullStyle::TypeEntry)).then(|| "value must be null".to_string());
    }
    if types.permits(kind) {
        return None;
    }
    Some(match types.single_kind() {
        Some(expected) => format!("value must be {} {}", article(expected), expected),
        None => {
            let names: Vec<&str> = types.kinds().iter().map(SchemaType::as_str).collect();
            format!("value must be one of {}", names.join(", "))
        }
    })
}

fn article(kind: SchemaType) -> &'static str {
    match kind {
        SchemaType::Integer | SchemaType::Object | SchemaType::Array => "an",
        _ => "a",
    }
}
