//! Numeric keywords
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use super::Validator;
use crate::model::{Bound, Schema};
use crate::validation::error::ValidationResult;
use serde_json::{Number, Value};

pub(super) fn visit(v: &Validator<'_>, schema: &Schema, number: &Number, value: &Value) -> ValidationResult<()> {
    let Some(n) = number.as_f64() else {
        return Ok(());
    };
    let mut outcome = v.outcome();

    if v.settings().format_validation() {
        if let Some(reason) = schema.format.as_deref().and_then(|format| format_violation(format, number, n)) {
            outcome.fail(v.error(schema, value, "format", reason))?;
        }
    }

    match schema.minimum {
        Some(Bound::Inclusive(min)) if n < min => {
            outcome.fail(v.error(schema, value, "minimum", format!("number must be at least {}", min)))?;
        }
        Some(bound) if bound.is_exclusive() && n <= bound.value() => {
            outcome.fail(v.error(
                schema,
                value,
                "exclusiveMinimum",
                format!("number must be more than {}", bound.value()),
            ))?;
        }
        _ => {}
    }

    match schema.maximum {
        Some(Bound::Inclusive(max)) if n > max => {
            outcome.fail(v.error(schema, value, "maximum", format!("number must be at most {}", max)))?;
        }
        Some(bound) if bound.is_exclusive() && n >= bound.value() => {
            outcome.fail(v.error(
                schema,
                value,
                "exclusiveMaximum",
                format!("number must be less than {}", bound.value()),
            ))?;
        }
        _ => {}
    }

    if let Some(divisor) = schema.multiple_of {
        // exact integer quotient in f64, so 0.3 is not a multiple of 0.1
        if divisor != 0.0 && (n / divisor).fract() != 0.0 {
            outcome.fail(v.error(
                schema,
                value,
                "multipleOf",
                format!("number must be a multiple of {}", divisor),
            ))?;
        }
    }

    outcome.finish()
}

/// 2^63; `i64::MAX as f64` rounds up to this value
const INT64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

fn format_violation(format: &str, number: &Number, n: f64) -> Option<String> {
    let (fits, expected) = match format {
        "int32" => (n >= f64::from(i32::MIN) && n <= f64::from(i32::MAX), "an int32"),
        "int64" => (
            number.is_i64() || (!number.is_u64() && n >= -INT64_LIMIT && n < INT64_LIMIT),
            "an int64",
        ),
        "float" => (n.is_finite() && n.abs() <= f64::from(f32::MAX), "a float"),
        _ => return None,
    };
    (!fits).then(|| format!("number must be {}", expected))
}

#[cfg(test)]
mod tests {
    use crate::model::Schema;
    use crate::validation::{BuiltInEngine, ValidationEngine, ValidationError, ValidationSettings};
    use serde_json::json;

    fn reasons(schema: &Schema, value: serde_json::Value) -> Vec<String> {
        let settings = ValidationSettings::new().with_multi_errors(true);
        match BuiltInEngine.validate(schema, &value, &settings) {
            Ok(()) => Vec::new(),
            Err(err) => err.schema_errors().iter().map(|e| e.reason.clone()).collect(),
        }
    }

    #[test]
    fn test_inclusive_and_exclusive_bounds() {
        let inclusive = Schema::new_float64().with_min(1.0).with_max(3.0);
        assert!(reasons(&inclusive, json!(1)).is_empty());
        assert!(reasons(&inclusive, json!(3)).is_empty());
        assert_eq!(reasons(&inclusive, json!(0.5)), vec!["number must be at least 1"]);

        let exclusive = Schema::new_float64().with_exclusive_min(1.0).with_exclusive_max(3.0);
        assert_eq!(reasons(&exclusive, json!(1)), vec!["number must be more than 1"]);
        assert_eq!(reasons(&exclusive, json!(3)), vec!["number must be less than 3"]);
        assert!(reasons(&exclusive, json!(2)).is_empty());
    }

    #[test]
    fn test_multiple_of_uses_f64_quotient() {
        let schema = Schema::new_float64().with_multiple_of(0.5);
        assert!(reasons(&schema, json!(2.5)).is_empty());
        assert_eq!(reasons(&schema, json!(2.2)), vec!["number must be a multiple of 0.5"]);

        let tenth = Schema::new_float64().with_multiple_of(0.1);
        assert!(!reasons(&tenth, json!(0.3)).is_empty());
    }

    #[test]
    fn test_numeric_formats() {
        let int32 = Schema::new_int32();
        assert!(reasons(&int32, json!(2147483647)).is_empty());
        assert_eq!(reasons(&int32, json!(2147483648_i64)), vec!["number must be an int32"]);

        let int64 = Schema::new_int64();
        assert!(reasons(&int64, json!(i64::MAX)).is_empty());
        assert!(reasons(&int64, json!(i64::MIN)).is_empty());
        assert_eq!(reasons(&int64, json!(9_223_372_036_854_775_808_u64)), vec!["number must be an int64"]);
        assert_eq!(reasons(&int64, json!(9.223372036854775808e18)), vec!["number must be an int64"]);

        let float = Schema::new_float64().with_format("float");
        assert_eq!(reasons(&float, json!(1e300)), vec!["number must be a float"]);

        let settings = ValidationSettings::new().with_format_validation(false);
        assert!(BuiltInEngine.validate(&int32, &json!(2147483648_i64), &settings).is_ok());
    }

    #[test]
    fn test_multi_errors_collects_every_bound() {
        let schema = Schema::new_float64().with_min(10.0).with_multiple_of(3.0);
        let err = BuiltInEngine
            .validate(&schema, &json!(4), &ValidationSettings::new().with_multi_errors(true))
            .unwrap_err();
        assert!(matches!(&err, ValidationError::Multi(multi) if multi.len() == 2));
    }
}
