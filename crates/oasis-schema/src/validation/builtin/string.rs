//! String keywords
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use super::Validator;
use crate::model::Schema;
use crate::validation::error::{ValidationError, ValidationResult};
use crate::validation::formats::is_numeric_format;
use crate::validation::settings::PatternPolicy;
use serde_json::Value;

pub(super) fn visit(v: &Validator<'_>, schema: &Schema, text: &str, value: &Value) -> ValidationResult<()> {
    let settings = v.settings();
    let mut outcome = v.outcome();

    // lengths count UTF-16 code units
    let length = text.encode_utf16().count() as u64;
    if length < schema.min_length {
        outcome.fail(v.error(
            schema,
            value,
            "minLength",
            format!("minimum string length is {}", schema.min_length),
        ))?;
    }
    if let Some(max) = schema.max_length {
        if length > max {
            outcome.fail(v.error(schema, value, "maxLength", format!("maximum string length is {}", max)))?;
        }
    }

    if settings.pattern_validation() {
        match schema.compiled_pattern() {
            Some(Ok(regex)) if !regex.is_match(text) => {
                outcome.fail(v.error(
                    schema,
                    value,
                    "pattern",
                    format!("string doesn't match the regular expression {:?}", regex.as_str()),
                ))?;
            }
            Some(Err(reason)) if settings.pattern_policy() == PatternPolicy::Error => {
                return Err(ValidationError::pattern(schema.pattern().unwrap_or_default(), reason));
            }
            _ => {}
        }
    }

    if settings.format_validation() {
        if let Some(format) = schema.format.as_deref() {
            match settings.formats().check(format, text) {
                Some(Ok(())) => {}
                Some(Err(reason)) => {
                    outcome.fail(v.error(
                        schema,
                        value,
                        "format",
                        format!("string doesn't match the format {:?} ({})", format, reason),
                    ))?;
                }
                None if settings.strict_formats() && !is_numeric_format(format) => {
                    outcome.fail(v.error(
                        schema,
                        value,
                        "format",
                        format!("unsupported 'format' value {:?}", format),
                    ))?;
                }
                None => {}
            }
        }
    }

    outcome.finish()
}

#[cfg(test)]
mod tests {
    use crate::model::Schema;
    use crate::validation::{
        BuiltInEngine, FormatRegistry, PatternPolicy, ValidationEngine, ValidationError, ValidationResult,
        ValidationSettings,
    };
    use serde_json::json;

    fn check(schema: &Schema, text: &str, settings: &ValidationSettings) -> ValidationResult<()> {
        BuiltInEngine.validate(schema, &json!(text), settings)
    }

    #[test]
    fn test_length_counts_utf16_units() {
        let settings = ValidationSettings::new();
        let schema = Schema::new_string().with_min_length(2).with_max_length(2);
        // one astral code point is two UTF-16 code units
        assert!(check(&schema, "😀", &settings).is_ok());
        assert!(check(&schema, "é", &settings).is_err());
        let err = check(&schema, "abc", &settings).unwrap_err();
        assert_eq!(err.as_schema_error().unwrap().reason, "maximum string length is 2");
    }

    #[test]
    fn test_pattern() {
        let settings = ValidationSettings::new();
        let schema = Schema::new_string().with_pattern("^[a-z]+$");
        assert!(check(&schema, "abc", &settings).is_ok());
        let err = check(&schema, "ABC", &settings).unwrap_err();
        assert_eq!(err.as_schema_error().unwrap().schema_field, "pattern");

        let disabled = ValidationSettings::new().with_pattern_validation(false);
        assert!(check(&schema, "ABC", &disabled).is_ok());
    }

    #[test]
    fn test_unsupported_pattern_policy() {
        let schema = Schema::new_string().with_pattern("(?=a)b");
        let err = check(&schema, "b", &ValidationSettings::new()).unwrap_err();
        assert!(matches!(err, ValidationError::Pattern { ref pattern, .. } if pattern == "(?=a)b"));

        let lenient = ValidationSettings::new().with_pattern_policy(PatternPolicy::Ignore);
        assert!(check(&schema, "b", &lenient).is_ok());
    }

    #[test]
    fn test_formats() {
        let settings = ValidationSettings::new();
        let date = Schema::new_string().with_format("date");
        assert!(check(&date, "2024-05-01", &settings).is_ok());
        assert!(check(&date, "05/01/2024", &settings).is_err());

        let unknown = Schema::new_string().with_format("hostname");
        assert!(check(&unknown, "anything", &settings).is_ok());
        let strict = ValidationSettings::new().with_strict_formats(true);
        let err = check(&unknown, "anything", &strict).unwrap_err();
        assert_eq!(err.as_schema_error().unwrap().reason, "unsupported 'format' value \"hostname\"");

        let mut formats = FormatRegistry::new();
        formats.define("hostname", r"^[a-z.]+$").unwrap();
        let custom = ValidationSettings::new().with_formats(formats);
        assert!(check(&unknown, "example.com", &custom).is_ok());
        assert!(check(&unknown, "EXAMPLE", &custom).is_err());
    }
}
