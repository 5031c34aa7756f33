//! Conformant engine: JSON Schema 2020-12 through the `jsonschema` crate
//!
//! A schema graph is translated into a plain 2020-12 document per call.
//! Pointer targets become `$defs` entries keyed by node identity, so a
//! cyclic graph yields a finite document. Keywords the target dialect does
//! not know (`discriminator`, `xml`, `externalDocs`, `example`,
//! `allowEmptyValue`, extensions) are dropped, and the request/response
//! mode is folded into `required` and the property schemas.
//!
//! When a graph cannot be translated or compiled, validation falls back to
//! the built-in engine.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::loader::index::unescape_segment;
use crate::model::reference::node_id;
use crate::model::{AdditionalProperties, Bound, NullStyle, Ref, Schema};
use crate::validation::builtin::BuiltInEngine;
use crate::validation::engine::ValidationEngine;
use crate::validation::error::{MultiError, SchemaError, ValidationError, ValidationResult};
use crate::validation::settings::{ValidationMode, ValidationSettings};
use jsonschema::error::ValidationErrorKind;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tracing::warn;

const DIALECT: &str = "https://json-schema.org/draft/2020-12/schema";

/// The engine backed by the `jsonschema` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct ConformantEngine;

impl ValidationEngine for ConformantEngine {
    fn name(&self) -> &'static str {
        "conformant"
    }

    fn validate(&self, schema: &Schema, value: &Value, settings: &ValidationSettings) -> ValidationResult<()> {
        let tree = match translate(schema, settings) {
            Ok(tree) => tree,
            Err(reason) => return fall_back(schema, value, settings, &reason),
        };
        let validator = match compile(&tree, settings) {
            Ok(validator) => validator,
            Err(reason) => return fall_back(schema, value, settings, &reason),
        };

        if settings.fail_fast() {
            return if validator.is_valid(value) {
                Ok(())
            } else {
                Err(ValidationError::FailFast)
            };
        }

        let mut errors = validator
            .iter_errors(value)
            .map(|err| host_error(&tree, value, settings, &err, ""));
        if settings.multi_errors() {
            let mut flat = Vec::new();
            for error in errors {
                flatten(error, &mut flat);
            }
            MultiError::from(flat).into_result()
        } else {
            errors.next().map_or(Ok(()), |error| Err(error.into()))
        }
    }
}

/// Push an error followed by every branch error nested under it
fn flatten(error: SchemaError, out: &mut Vec<ValidationError>) {
    let causes: Vec<SchemaError> = error
        .origin
        .as_deref()
        .map(|origin| origin.schema_errors().into_iter().cloned().collect())
        .unwrap_or_default();
    out.push(error.into());
    for cause in causes {
        flatten(cause, out);
    }
}

fn fall_back(schema: &Schema, value: &Value, settings: &ValidationSettings, reason: &str) -> ValidationResult<()> {
    warn!(reason, "conformant engine cannot use schema, falling back to the built-in engine");
    BuiltInEngine.validate(schema, value, settings)
}

/// Translate a schema graph into a JSON Schema 2020-12 document
pub fn translate(schema: &Schema, settings: &ValidationSettings) -> Result<Value, String> {
    let mut translator = Translator {
        settings,
        definitions: Map::new(),
        names: HashMap::new(),
    };
    let mut root = translator.schema(schema, 0)?;
    if let Value::Object(object) = &mut root {
        object.insert("$schema".to_string(), json!(DIALECT));
        if !translator.definitions.is_empty() {
            object.insert("$defs".to_string(), Value::Object(translator.definitions));
        }
    }
    Ok(root)
}

fn compile(tree: &Value, settings: &ValidationSettings) -> Result<jsonschema::Validator, String> {
    let mut options = jsonschema::options()
        .with_draft(jsonschema::Draft::Draft202012)
        .should_validate_formats(settings.format_validation())
        .should_ignore_unknown_formats(!settings.strict_formats());
    for (name, format) in settings.formats().iter() {
        let format = format.clone();
        options = options.with_format(name.to_string(), move |text: &str| format.check(text).is_ok());
    }
    options.build(tree).map_err(|e| e.to_string())
}

/// Map one engine error onto the host error shape. The branch errors of
/// `oneOf` and `anyOf` become its origin, their paths under `prefix`.
fn host_error(
    tree: &Value,
    value: &Value,
    settings: &ValidationSettings,
    err: &jsonschema::ValidationError<'_>,
    prefix: &str,
) -> SchemaError {
    let instance_path = under(prefix, &err.instance_path.to_string());
    let schema_path = err.schema_path.to_string();
    let keyword = schema_path
        .rsplit('/')
        .find(|segment| !segment.is_empty() && !segment.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or_default();

    let segments = instance_path
        .split('/')
        .skip(1)
        .map(unescape_segment)
        .collect::<Vec<_>>();
    let mut error = SchemaError::new(keyword, err.to_string()).with_path(segments);

    if settings.error_details() {
        let parent = schema_path
            .rsplit_once('/')
            .map_or("", |(parent, _)| parent);
        let schema_dump = tree.pointer(parent).cloned().unwrap_or(Value::Null);
        let value_dump = value.pointer(&instance_path).cloned().unwrap_or(Value::Null);
        error = error.with_details(schema_dump, value_dump);
    }

    let causes: Vec<ValidationError> = branch_errors(err)
        .map(|cause| host_error(tree, value, settings, cause, &instance_path).into())
        .collect();
    if !causes.is_empty() {
        error = error.with_origin(MultiError::from(causes).into());
    }
    error
}

fn branch_errors<'e>(
    err: &'e jsonschema::ValidationError<'_>,
) -> impl Iterator<Item = &'e jsonschema::ValidationError<'static>> {
    let context: &[Vec<jsonschema::ValidationError<'static>>] = match &err.kind {
        ValidationErrorKind::AnyOf { context } | ValidationErrorKind::OneOfNotValid { context } => context,
        _ => &[],
    };
    context.iter().flatten()
}

/// An instance path below `prefix`; nested paths already carrying it are kept
fn under(prefix: &str, path: &str) -> String {
    if path.starts_with(prefix) {
        path.to_string()
    } else {
        format!("{}{}", prefix, path)
    }
}

struct Translator<'s> {
    settings: &'s ValidationSettings,
    definitions: Map<String, Value>,
    /// Node identity to `$defs` name
    names: HashMap<usize, String>,
}

impl Translator<'_> {
    fn node(&mut self, node: &Ref<Schema>, depth: usize) -> Result<Value, String> {
        match node {
            Ref::Value(schema) => self.schema(schema, depth + 1),
            Ref::Pointer(pointer) => {
                let target = pointer
                    .target()
                    .ok_or_else(|| format!("found unresolved ref: {:?}", pointer.reference()))?;
                let id = node_id(target.as_ref());
                if let Some(name) = self.names.get(&id) {
                    return Ok(json!({ "$ref": format!("#/$defs/{}", name) }));
                }

                let name = format!("n{}", self.names.len());
                self.names.insert(id, name.clone());
                let translated = self.schema(target, depth + 1)?;
                self.definitions.insert(name.clone(), translated);
                Ok(json!({ "$ref": format!("#/$defs/{}", name) }))
            }
        }
    }

    fn nodes(&mut self, nodes: &[Ref<Schema>], depth: usize) -> Result<Value, String> {
        nodes
            .iter()
            .map(|node| self.node(node, depth))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }

    fn schema(&mut self, schema: &Schema, depth: usize) -> Result<Value, String> {
        if depth > self.settings.max_depth() {
            return Err(format!("schema nesting deeper than {}", self.settings.max_depth()));
        }
        let mut out = Map::new();

        if let Some(types) = type_keyword(schema) {
            out.insert("type".to_string(), types);
        }
        for (keyword, annotation) in [
            ("title", schema.title.as_ref().map(|s| json!(s))),
            ("description", schema.description.as_ref().map(|s| json!(s))),
            ("format", schema.format.as_ref().map(|s| json!(s))),
            ("default", schema.default.clone()),
            ("const", schema.const_value.clone()),
            ("enum", schema.enum_values.clone().map(Value::Array)),
        ] {
            if let Some(annotation) = annotation {
                out.insert(keyword.to_string(), annotation);
            }
        }
        if !schema.examples.is_empty() {
            out.insert("examples".to_string(), Value::Array(schema.examples.clone()));
        }
        for (keyword, flag) in [
            ("deprecated", schema.deprecated),
            ("readOnly", schema.read_only),
            ("writeOnly", schema.write_only),
            ("uniqueItems", schema.unique_items),
        ] {
            if flag {
                out.insert(keyword.to_string(), json!(true));
            }
        }

        // numbers
        if let Some(bound) = schema.minimum {
            let keyword = if bound.is_exclusive() { "exclusiveMinimum" } else { "minimum" };
            out.insert(keyword.to_string(), number(bound));
        }
        if let Some(bound) = schema.maximum {
            let keyword = if bound.is_exclusive() { "exclusiveMaximum" } else { "maximum" };
            out.insert(keyword.to_string(), number(bound));
        }
        if let Some(divisor) = schema.multiple_of {
            out.insert("multipleOf".to_string(), json!(divisor));
        }

        // strings
        if schema.min_length > 0 {
            out.insert("minLength".to_string(), json!(schema.min_length));
        }
        if let Some(max) = schema.max_length {
            out.insert("maxLength".to_string(), json!(max));
        }
        if let Some(pattern) = schema.pattern() {
            if self.settings.pattern_validation() {
                out.insert("pattern".to_string(), json!(pattern));
            }
        }

        // arrays
        if schema.min_items > 0 {
            out.insert("minItems".to_string(), json!(schema.min_items));
        }
        if let Some(max) = schema.max_items {
            out.insert("maxItems".to_string(), json!(max));
        }
        if !schema.prefix_items.is_empty() {
            let prefix = self.nodes(&schema.prefix_items, depth)?;
            out.insert("prefixItems".to_string(), prefix);
        }
        if let Some(items) = &schema.items {
            let items = self.node(items, depth)?;
            out.insert("items".to_string(), items);
        }
        if let Some(contains) = &schema.contains {
            let contains = self.node(contains, depth)?;
            out.insert("contains".to_string(), contains);
        }
        if let Some(min) = schema.min_contains {
            out.insert("minContains".to_string(), json!(min));
        }
        if let Some(max) = schema.max_contains {
            out.insert("maxContains".to_string(), json!(max));
        }

        // objects
        self.object(schema, depth, &mut out)?;

        // combinators
        for (keyword, branches) in [("oneOf", &schema.one_of), ("anyOf", &schema.any_of), ("allOf", &schema.all_of)] {
            if !branches.is_empty() {
                let translated = self.nodes(branches, depth)?;
                out.insert(keyword.to_string(), translated);
            }
        }
        if let Some(not) = &schema.not {
            let translated = self.node(not, depth)?;
            out.insert("not".to_string(), translated);
        }

        Ok(Value::Object(out))
    }

    fn object(&mut self, schema: &Schema, depth: usize, out: &mut Map<String, Value>) -> Result<(), String> {
        let mode = self.settings.mode();

        if !schema.properties.is_empty() {
            let mut properties = Map::new();
            for (name, node) in &schema.properties {
                let property = node.value();
                let forbidden = property.is_some_and(|p| {
                    (p.read_only && self.settings.rejects_read_only())
                        || (p.write_only && self.settings.rejects_write_only())
                });
                let translated = if forbidden {
                    Value::Bool(false)
                } else {
                    self.node(node, depth)?
                };
                properties.insert(name.clone(), translated);
            }
            out.insert("properties".to_string(), Value::Object(properties));
        }

        let required: Vec<&String> = schema
            .required
            .iter()
            .filter(|name| {
                let Some(property) = schema.properties.get(*name).and_then(Ref::value) else {
                    return true;
                };
                let exempt = (mode == ValidationMode::Request && property.read_only)
                    || (mode == ValidationMode::Response && property.write_only)
                    || (self.settings.defaults_satisfy_required() && property.default.is_some());
                !exempt
            })
            .collect();
        if !required.is_empty() {
            out.insert("required".to_string(), json!(required));
        }

        if schema.min_properties > 0 {
            out.insert("minProperties".to_string(), json!(schema.min_properties));
        }
        if let Some(max) = schema.max_properties {
            out.insert("maxProperties".to_string(), json!(max));
        }
        match &schema.additional_properties {
            Some(AdditionalProperties::Allowed(allowed)) => {
                out.insert("additionalProperties".to_string(), json!(allowed));
            }
            Some(AdditionalProperties::Schema(node)) => {
                let translated = self.node(node, depth)?;
                out.insert("additionalProperties".to_string(), translated);
            }
            None => {}
        }
        if let Some(names) = &schema.property_names {
            let translated = self.node(names, depth)?;
            out.insert("propertyNames".to_string(), translated);
        }
        Ok(())
    }
}

/// The 2020-12 `type` keyword: null joins the type array
fn type_keyword(schema: &Schema) -> Option<Value> {
    let types = &schema.types;
    let mut names: Vec<&str> = types.kinds().iter().map(|kind| kind.as_str()).collect();
    match types.null_style() {
        // nullable without a type constrains nothing
        Some(NullStyle::Nullable) if names.is_empty() => return None,
        Some(_) => names.push("null"),
        None => {}
    }
    match names.as_slice() {
        [] => None,
        [single] => Some(json!(single)),
        _ => Some(json!(names)),
    }
}

fn number(bound: Bound) -> Value {
    json!(bound.value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SchemaType;
    use std::sync::Arc;

    fn settings() -> ValidationSettings {
        ValidationSettings::new().with_engine(crate::validation::Engine::Conformant)
    }

    #[test]
    fn test_translate_dialect_keywords() {
        let schema = Schema::new_integer()
            .with_nullable()
            .with_exclusive_min(0.0)
            .with_max(10.0)
            .with_discriminator(crate::model::Discriminator::new("kind"));
        let tree = translate(&schema, &settings()).unwrap();
        assert_eq!(tree["type"], json!(["integer", "null"]));
        assert_eq!(tree["exclusiveMinimum"], json!(0.0));
        assert_eq!(tree["maximum"], json!(10.0));
        assert!(tree.get("discriminator").is_none());
        assert!(tree.get("nullable").is_none());
        assert_eq!(tree["$schema"], json!(DIALECT));
    }

    #[test]
    fn test_translate_mode() {
        let schema = Schema::new_object()
            .with_property("id", Schema::new_integer().with_read_only(true))
            .with_property("name", Schema::new_string())
            .with_required(["id", "name"]);
        let tree = translate(&schema, &settings().for_request()).unwrap();
        assert_eq!(tree["properties"]["id"], json!(false));
        assert_eq!(tree["required"], json!(["name"]));

        let tree = translate(&schema, &settings()).unwrap();
        assert_eq!(tree["required"], json!(["id", "name"]));
    }

    #[test]
    fn test_cyclic_graph_translates_finitely() {
        // Node -> next -> Node
        let pointer: Ref<Schema> = Ref::pointer("#/components/schemas/Node");
        let node = Arc::new(
            Schema::new_object()
                .with_property("value", Schema::new_integer())
                .with_property_ref("next", pointer.clone()),
        );
        if let Ref::Pointer(slot) = &pointer {
            slot.set_target(Arc::clone(&node));
        }

        let tree = translate(&node, &settings()).unwrap();
        assert_eq!(tree["properties"]["next"], json!({"$ref": "#/$defs/n0"}));
        assert_eq!(tree["$defs"]["n0"]["properties"]["next"], json!({"$ref": "#/$defs/n0"}));

        let list = json!({"value": 1, "next": {"value": 2, "next": {"value": 3}}});
        assert!(ConformantEngine.validate(&node, &list, &settings()).is_ok());
        let broken = json!({"value": 1, "next": {"value": "two"}});
        let err = ConformantEngine.validate(&node, &broken, &settings()).unwrap_err();
        assert_eq!(err.as_schema_error().unwrap().json_pointer(), "/next/value");
    }

    #[test]
    fn test_error_mapping() {
        let schema = Schema::new_object().with_property("n", Schema::new_integer().with_max(3.0));
        let err = ConformantEngine
            .validate(&schema, &json!({"n": 5}), &settings())
            .unwrap_err();
        let error = err.as_schema_error().unwrap();
        assert_eq!(error.schema_field, "maximum");
        assert_eq!(error.path(), ["n"]);
        assert_eq!(error.value, Some(json!(5)));
    }

    #[test]
    fn test_unresolved_pointer_falls_back() {
        let schema = Schema::new_array().with_items_ref(Ref::pointer("#/components/schemas/Gone"));
        let err = ConformantEngine.validate(&schema, &json!([1]), &settings()).unwrap_err();
        assert!(matches!(err, ValidationError::UnresolvedRef { .. }));
    }

    #[test]
    fn test_keywords_beyond_built_in() {
        let mut schema = Schema::new_array();
        schema.contains = Some(Ref::new(Schema::new().with_types(crate::model::Types::single(SchemaType::String))));
        assert!(ConformantEngine.validate(&schema, &json!([1, "a"]), &settings()).is_ok());
        assert!(ConformantEngine.validate(&schema, &json!([1, 2]), &settings()).is_err());

        let mut constant = Schema::new();
        constant.const_value = Some(json!("fixed"));
        assert!(ConformantEngine.validate(&constant, &json!("other"), &settings()).is_err());
    }

    #[test]
    fn test_fail_fast_and_multi_errors() {
        let schema = Schema::new_object()
            .with_property("a", Schema::new_string())
            .with_property("b", Schema::new_string());
        let value = json!({"a": 1, "b": 2});

        let err = ConformantEngine
            .validate(&schema, &value, &settings().with_fail_fast(true))
            .unwrap_err();
        assert!(err.is_fail_fast());

        let err = ConformantEngine
            .validate(&schema, &value, &settings().with_multi_errors(true))
            .unwrap_err();
        assert_eq!(err.schema_errors().len(), 2);
    }
}
