//! `not`, `oneOf`, `anyOf` and `allOf`
//!
//! Branch failures never abort the walk; they are kept as the origin of the
//! combinator's own error. Configuration errors inside a branch do abort.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use super::{is_value_failure, Validator};
use crate::model::{Discriminator, Schema};
use crate::validation::error::{MultiError, ValidationError, ValidationResult};
use serde_json::Value;

pub(super) fn visit(v: &Validator<'_>, schema: &Schema, value: &Value, depth: usize) -> ValidationResult<()> {
    let mut outcome = v.outcome();

    if let Some(negated) = &schema.not {
        match v.visit_ref(negated, value, depth) {
            Ok(()) => outcome.fail(v.error(schema, value, "not", "value must not match the \"not\" schema"))?,
            Err(err) if !is_value_failure(&err) => return Err(err),
            Err(_) => {}
        }
    }

    if !schema.one_of.is_empty() {
        outcome.record(one_of(v, schema, value, depth))?;
    }

    if !schema.any_of.is_empty() {
        let mut failures = MultiError::new();
        let mut matched = false;
        for branch in &schema.any_of {
            match v.visit_ref(branch, value, depth) {
                Ok(()) => {
                    matched = true;
                    break;
                }
                Err(err) if !is_value_failure(&err) => return Err(err),
                Err(err) => failures.add(err),
            }
        }
        if !matched {
            outcome.fail(v.error_with_origin(
                schema,
                value,
                "anyOf",
                "value doesn't match any schema from \"anyOf\"",
                Some(failures.into()),
            ))?;
        }
    }

    if !schema.all_of.is_empty() {
        let mut failures = MultiError::new();
        for branch in &schema.all_of {
            match v.visit_ref(branch, value, depth) {
                Ok(()) => {}
                Err(err) if !is_value_failure(&err) => return Err(err),
                Err(err) => {
                    failures.add(err);
                    if !v.settings().multi_errors() {
                        break;
                    }
                }
            }
        }
        if !failures.is_empty() {
            let origin = if failures.len() == 1 {
                failures.errors.remove(0)
            } else {
                failures.into()
            };
            outcome.fail(v.error_with_origin(
                schema,
                value,
                "allOf",
                "value doesn't match all schemas from \"allOf\"",
                Some(origin),
            ))?;
        }
    }

    outcome.finish()
}

fn one_of(v: &Validator<'_>, schema: &Schema, value: &Value, depth: usize) -> ValidationResult<()> {
    let selected = match (&schema.discriminator, value) {
        (Some(discriminator), Value::Object(properties)) => {
            match properties.get(&discriminator.property_name).and_then(Value::as_str) {
                Some(tag) => Some(mapped_reference(discriminator, tag)),
                None => return Err(no_valid_discriminator(v, schema, value)),
            }
        }
        _ => None,
    };

    // a branch naming the target's own document wins over a same-named local one
    let exact = selected.as_deref().is_some_and(|target| {
        schema
            .one_of
            .iter()
            .any(|branch| branch.reference().is_some_and(|reference| selects(reference, target, true)))
    });

    let mut matched = Vec::new();
    let mut failures = MultiError::new();
    let mut considered = 0;
    for (index, branch) in schema.one_of.iter().enumerate() {
        if let Some(target) = &selected {
            if !branch.reference().is_some_and(|reference| selects(reference, target, exact)) {
                continue;
            }
        }
        considered += 1;
        match v.visit_ref(branch, value, depth) {
            Ok(()) => matched.push(index),
            Err(err) if !is_value_failure(&err) => return Err(err),
            Err(err) => failures.add(err),
        }
    }

    if selected.is_some() && considered == 0 {
        return Err(no_valid_discriminator(v, schema, value));
    }

    match matched.len() {
        1 => Ok(()),
        0 => Err(v.error_with_origin(
            schema,
            value,
            "oneOf",
            "value doesn't match any schema from \"oneOf\"",
            Some(failures.into()),
        )),
        _ => Err(v.error_with_origin(
            schema,
            value,
            "oneOf",
            format!(
                "value matches more than one schema from \"oneOf\" (matches schemas at indices {:?})",
                matched
            ),
            Some(ValidationError::Ambiguous { indices: matched }),
        )),
    }
}

fn no_valid_discriminator(v: &Validator<'_>, schema: &Schema, value: &Value) -> ValidationError {
    v.error(schema, value, "discriminator", "no valid discriminator value")
}

/// The reference a discriminator value selects: the explicit mapping, else
/// the component schema named after the value
fn mapped_reference(discriminator: &Discriminator, tag: &str) -> String {
    match discriminator.mapping.get(tag) {
        Some(reference) if reference.contains('#') || reference.contains('/') => reference.clone(),
        Some(name) => format!("#/components/schemas/{}", name),
        None => format!("#/components/schemas/{}", tag),
    }
}

/// Whether a branch reference names the discriminator target.
/// Documents must agree when `exact`; otherwise a local target (`#/...`) also
/// selects a branch in another document with the same fragment, which is how
/// merged external components are reached.
fn selects(reference: &str, target: &str, exact: bool) -> bool {
    fn split(reference: &str) -> (&str, &str) {
        let (document, fragment) = reference.split_once('#').unwrap_or((reference, ""));
        (document.trim_start_matches("./"), fragment)
    }
    let (document, fragment) = split(reference);
    let (target_document, target_fragment) = split(target);
    fragment == target_fragment && (document == target_document || (!exact && target_document.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Ref, SchemaType};
    use crate::validation::{BuiltInEngine, ValidationEngine, ValidationSettings};
    use serde_json::json;
    use std::sync::Arc;

    fn check(schema: &Schema, value: Value) -> ValidationResult<()> {
        BuiltInEngine.validate(schema, &value, &ValidationSettings::new())
    }

    fn component(reference: &str, schema: Schema) -> Ref<Schema> {
        Ref::resolved(reference, Arc::new(schema))
    }

    fn pets() -> Schema {
        let cat = Schema::new_object()
            .with_property("kind", Schema::new_string())
            .with_property("lives", Schema::new_integer())
            .with_required(["lives"]);
        let dog = Schema::new_object()
            .with_property("kind", Schema::new_string())
            .with_property("bark", Schema::new_bool())
            .with_required(["bark"]);
        let mut pet = Schema::new().with_discriminator(Discriminator::new("kind").with_mapping("kitty", "Cat"));
        pet.one_of = vec![
            component("#/components/schemas/Cat", cat),
            component("#/components/schemas/Dog", dog),
        ];
        pet
    }

    #[test]
    fn test_one_of_exactness() {
        let schema = Schema::new_one_of([Schema::new_integer(), Schema::new_string()]);
        assert!(check(&schema, json!(1)).is_ok());

        let overlapping = Schema::new_one_of([Schema::new_integer(), Schema::new_float64()]);
        let err = check(&overlapping, json!(1)).unwrap_err();
        let error = err.as_schema_error().unwrap();
        assert!(error.reason.contains("value matches more than one schema from \"oneOf\""));
        assert!(matches!(error.origin.as_deref(), Some(ValidationError::Ambiguous { indices }) if indices == &[0, 1]));

        let err = check(&schema, json!(true)).unwrap_err();
        let error = err.as_schema_error().unwrap();
        assert_eq!(error.reason, "value doesn't match any schema from \"oneOf\"");
        assert!(matches!(error.origin.as_deref(), Some(ValidationError::Multi(failures)) if failures.len() == 2));
    }

    #[test]
    fn test_discriminator_dispatch() {
        let schema = pets();
        assert!(check(&schema, json!({"kind": "Dog", "bark": true})).is_ok());
        assert!(check(&schema, json!({"kind": "kitty", "lives": 9})).is_ok());

        // only the selected branch is evaluated
        let err = check(&schema, json!({"kind": "Dog", "lives": 9})).unwrap_err();
        assert_eq!(err.as_schema_error().unwrap().reason, "value doesn't match any schema from \"oneOf\"");

        for value in [json!({"kind": "Fish"}), json!({"bark": true}), json!({"kind": 3})] {
            let err = check(&schema, value).unwrap_err();
            assert_eq!(err.as_schema_error().unwrap().reason, "no valid discriminator value");
        }
    }

    #[test]
    fn test_any_of_and_all_of() {
        let any = Schema::new_any_of([Schema::new_string(), Schema::new_integer()]);
        assert!(check(&any, json!("x")).is_ok());
        let err = check(&any, json!([])).unwrap_err();
        assert_eq!(err.as_schema_error().unwrap().schema_field, "anyOf");

        let all = Schema::new_all_of([
            Schema::new().with_types(crate::model::Types::single(SchemaType::Number)).with_min(1.0),
            Schema::new_float64().with_max(5.0),
        ]);
        assert!(check(&all, json!(3)).is_ok());
        let err = check(&all, json!(9)).unwrap_err();
        let error = err.as_schema_error().unwrap();
        assert_eq!(error.reason, "value doesn't match all schemas from \"allOf\"");
        assert!(error.origin.is_some());
    }

    #[test]
    fn test_all_of_keeps_every_failure_in_multi_mode() {
        let all = Schema::new_all_of([Schema::new_float64().with_min(10.0), Schema::new_float64().with_max(0.0)]);
        let settings = ValidationSettings::new().with_multi_errors(true);
        let err = BuiltInEngine.validate(&all, &json!(5), &settings).unwrap_err();
        let error = err.as_schema_error().unwrap();
        assert!(matches!(error.origin.as_deref(), Some(ValidationError::Multi(failures)) if failures.len() == 2));
    }

    #[test]
    fn test_not() {
        let mut schema = Schema::new();
        schema.not = Some(Ref::new(Schema::new_string()));
        assert!(check(&schema, json!(1)).is_ok());
        let err = check(&schema, json!("x")).unwrap_err();
        assert_eq!(err.as_schema_error().unwrap().schema_field, "not");
    }

    #[test]
    fn test_selects() {
        assert!(selects("#/components/schemas/Cat", "#/components/schemas/Cat", true));
        assert!(selects("./pets.yaml#/components/schemas/Cat", "pets.yaml#/components/schemas/Cat", true));
        assert!(selects("pets.yaml#/components/schemas/Cat", "#/components/schemas/Cat", false));
        assert!(!selects("pets.yaml#/components/schemas/Cat", "#/components/schemas/Cat", true));
        assert!(!selects("#/components/schemas/Cat", "pets.yaml#/components/schemas/Cat", false));
        assert!(!selects("#/components/schemas/Cat", "#/components/schemas/Dog", false));
    }

    #[test]
    fn test_discriminator_mapping_to_another_document() {
        let local = Schema::new_object()
            .with_property("kind", Schema::new_string())
            .with_property("bark", Schema::new_bool())
            .with_required(["bark"]);
        let remote = Schema::new_object()
            .with_property("kind", Schema::new_string())
            .with_property("howl", Schema::new_bool())
            .with_required(["howl"]);
        let mut pet = Schema::new().with_discriminator(
            Discriminator::new("kind").with_mapping("wolf", "wild.yaml#/components/schemas/Dog"),
        );
        pet.one_of = vec![
            component("#/components/schemas/Dog", local),
            component("wild.yaml#/components/schemas/Dog", remote),
        ];

        assert!(check(&pet, json!({"kind": "wolf", "howl": true})).is_ok());
        // the local Dog is not selected by the mapping
        assert!(check(&pet, json!({"kind": "wolf", "bark": true})).is_err());
        assert!(check(&pet, json!({"kind": "Dog", "bark": true})).is_ok());
    }

    #[test]
    fn test_local_target_reaches_merged_component() {
        let cat = Schema::new_object().with_property("lives", Schema::new_integer()).with_required(["lives"]);
        let mut pet = Schema::new().with_discriminator(Discriminator::new("kind"));
        pet.one_of = vec![component("common.yaml#/components/schemas/Cat", cat)];
        assert!(check(&pet, json!({"kind": "Cat", "lives": 9})).is_ok());
    }
}
