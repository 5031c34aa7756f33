//! Object keywords
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use super::Validator;
use crate::model::{Ref, Schema};
use crate::validation::error::ValidationResult;
use crate::validation::settings::ValidationMode;
use serde_json::{Map, Value};

pub(super) fn visit(
    v: &Validator<'_>,
    schema: &Schema,
    properties: &Map<String, Value>,
    value: &Value,
    depth: usize,
) -> ValidationResult<()> {
    let settings = v.settings();
    let mut outcome = v.outcome();
    let count = properties.len() as u64;

    if count < schema.min_properties {
        outcome.fail(v.error(
            schema,
            value,
            "minProperties",
            format!("there must be at least {} properties", schema.min_properties),
        ))?;
    }
    if let Some(max) = schema.max_properties {
        if count > max {
            outcome.fail(v.error(
                schema,
                value,
                "maxProperties",
                format!("there must be at most {} properties", max),
            ))?;
        }
    }

    for (name, item) in properties {
        if let Some(declared) = schema.properties.get(name) {
            let property = v.resolve(declared)?;
            if property.read_only && settings.rejects_read_only() {
                let error = v.error(schema, value, "readOnly", format!("readOnly property {:?} in request", name));
                outcome.fail(error.at(name))?;
                continue;
            }
            if property.write_only && settings.rejects_write_only() {
                let error = v.error(schema, value, "writeOnly", format!("writeOnly property {:?} in response", name));
                outcome.fail(error.at(name))?;
                continue;
            }
            outcome.record(v.visit(property, item, depth + 1).map_err(|err| err.at(name)))?;
        } else if let Some(additional) = schema.additional_properties_schema() {
            outcome.record(v.visit_ref(additional, item, depth).map_err(|err| err.at(name)))?;
        } else if schema.disallows_additional_properties() {
            let error = v.error(
                schema,
                value,
                "additionalProperties",
                format!("property {:?} is unsupported", name),
            );
            outcome.fail(error.at(name))?;
        }
    }

    for name in &schema.required {
        if properties.contains_key(name) || is_exempt(v, schema, name) {
            continue;
        }
        let error = v.error(schema, value, "required", format!("property {:?} is missing", name));
        outcome.fail(error.at(name))?;
    }

    outcome.finish()
}

/// Whether a missing required property is excused by the mode or its default
fn is_exempt(v: &Validator<'_>, schema: &Schema, name: &str) -> bool {
    let Some(property) = schema.properties.get(name).and_then(Ref::value) else {
        return false;
    };
    let settings = v.settings();
    match settings.mode() {
        ValidationMode::Request if property.read_only => return true,
        ValidationMode::Response if property.write_only => return true,
        _ => {}
    }
    settings.defaults_satisfy_required() && property.default.is_some()
}

#[cfg(test)]
mod tests {
    use crate::model::Schema;
    use crate::validation::{BuiltInEngine, ValidationEngine, ValidationResult, ValidationSettings};
    use serde_json::{json, Value};

    fn user() -> Schema {
        Schema::new_object()
            .with_property("id", Schema::new_integer().with_read_only(true))
            .with_property("password", Schema::new_string().with_write_only(true))
            .with_property("name", Schema::new_string())
            .with_required(["id", "password", "name"])
    }

    fn check(schema: &Schema, value: Value, settings: &ValidationSettings) -> ValidationResult<()> {
        BuiltInEngine.validate(schema, &value, settings)
    }

    #[test]
    fn test_required_and_paths() {
        let settings = ValidationSettings::new();
        let err = check(&user(), json!({"id": 1, "password": "x"}), &settings).unwrap_err();
        let error = err.as_schema_error().unwrap();
        assert_eq!(error.reason, "property \"name\" is missing");
        assert_eq!(error.json_pointer(), "/name");

        let err = check(&user(), json!({"id": "1", "password": "x", "name": "n"}), &settings).unwrap_err();
        assert_eq!(err.as_schema_error().unwrap().json_pointer(), "/id");
    }

    #[test]
    fn test_request_mode() {
        let request = ValidationSettings::new().for_request();
        assert!(check(&user(), json!({"password": "x", "name": "n"}), &request).is_ok());

        let err = check(&user(), json!({"id": 1, "password": "x", "name": "n"}), &request).unwrap_err();
        assert_eq!(err.as_schema_error().unwrap().reason, "readOnly property \"id\" in request");

        let relaxed = ValidationSettings::new().for_request().with_read_only_validation(false);
        assert!(check(&user(), json!({"id": 1, "password": "x", "name": "n"}), &relaxed).is_ok());
    }

    #[test]
    fn test_response_mode() {
        let response = ValidationSettings::new().for_response();
        assert!(check(&user(), json!({"id": 1, "name": "n"}), &response).is_ok());

        let err = check(&user(), json!({"id": 1, "password": "x", "name": "n"}), &response).unwrap_err();
        assert_eq!(err.as_schema_error().unwrap().reason, "writeOnly property \"password\" in response");
    }

    #[test]
    fn test_default_satisfies_required_when_enabled() {
        let schema = Schema::new_object()
            .with_property("kind", Schema::new_string().with_default(json!("basic")))
            .with_required(["kind"]);
        assert!(check(&schema, json!({}), &ValidationSettings::new()).is_err());
        let settings = ValidationSettings::new().with_defaults_satisfy_required(true);
        assert!(check(&schema, json!({}), &settings).is_ok());
    }

    #[test]
    fn test_additional_properties() {
        let settings = ValidationSettings::new();
        let closed = Schema::new_object()
            .with_property("a", Schema::new_string())
            .without_additional_properties();
        let err = check(&closed, json!({"a": "x", "b": 1}), &settings).unwrap_err();
        assert!(err.to_string().contains("property \"b\" is unsupported"));

        let typed = Schema::new_object().with_additional_properties(Schema::new_integer());
        assert!(check(&typed, json!({"x": 1, "y": 2}), &settings).is_ok());
        let err = check(&typed, json!({"x": "1"}), &settings).unwrap_err();
        assert_eq!(err.as_schema_error().unwrap().json_pointer(), "/x");

        assert!(check(&Schema::new_object(), json!({"free": true}), &settings).is_ok());
    }

    #[test]
    fn test_property_counts() {
        let schema = Schema::new_object().with_min_properties(1).with_max_properties(1);
        let settings = ValidationSettings::new();
        assert!(check(&schema, json!({"a": 1}), &settings).is_ok());
        let err = check(&schema, json!({}), &settings).unwrap_err();
        assert_eq!(err.as_schema_error().unwrap().reason, "there must be at least 1 properties");
    }
}
