//! Flattening of `allOf` compositions
//!
//! [`merge`] folds every `allOf` branch into the schema that carries it,
//! recursively, producing a schema without `allOf`. The result is a
//! best-effort approximation: it accepts every value the composition
//! accepts for the keywords handled below, but a few combinations (patterns,
//! `oneOf` products) only approximate the original intersection.
//!
//! Pointers listed directly in `allOf` are followed; pointers anywhere else
//! are kept as pointers.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::model::reference::node_id;
use crate::model::{AdditionalProperties, Bound, Ref, Schema, SchemaType, Types};
use crate::validation::json_equal;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Largest power of ten tried when scaling `multipleOf` values to integers
const MAX_DECIMAL_PLACES: i32 = 12;

/// Why two schemas could not be merged
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MergeError {
    #[error("unable to merge {keyword}: {left} conflicts with {right}")]
    Conflict {
        keyword: &'static str,
        left: String,
        right: String,
    },

    #[error("found unresolved ref: {reference:?}")]
    UnresolvedRef { reference: String },

    #[error("circular reference in allOf: {reference:?}")]
    Circular { reference: String },

    #[error("unable to merge multipleOf {value}: {reason}")]
    MultipleOf { value: f64, reason: String },
}

impl MergeError {
    fn conflict<L: ToString, R: ToString>(keyword: &'static str, left: L, right: R) -> Self {
        MergeError::Conflict {
            keyword,
            left: left.to_string(),
            right: right.to_string(),
        }
    }
}

pub type MergeResult<T> = Result<T, MergeError>;

/// Flatten every `allOf` reachable through inline nodes of `schema`
pub fn merge(schema: &Schema) -> MergeResult<Schema> {
    Merger::default().schema(schema)
}

#[derive(Default)]
struct Merger {
    /// Nodes whose `allOf` is currently being merged
    active: HashSet<usize>,
}

impl Merger {
    fn schema(&mut self, schema: &Schema) -> MergeResult<Schema> {
        let id = node_id(schema);
        self.active.insert(id);
        let merged = self.flatten(schema);
        self.active.remove(&id);
        merged
    }

    fn flatten(&mut self, schema: &Schema) -> MergeResult<Schema> {
        let own = self.children(schema)?;
        if schema.all_of.is_empty() {
            return Ok(own);
        }

        let mut parts = vec![own];
        for branch in &schema.all_of {
            parts.push(self.branch(branch)?);
        }
        self.combine(&parts)
    }

    /// Merge an `allOf` entry, following pointers
    fn branch(&mut self, node: &Ref<Schema>) -> MergeResult<Schema> {
        let reference = node.reference().unwrap_or_default();
        let target = node.value().ok_or_else(|| MergeError::UnresolvedRef {
            reference: reference.to_string(),
        })?;
        if self.active.contains(&node_id(target)) {
            return Err(MergeError::Circular {
                reference: reference.to_string(),
            });
        }
        self.schema(target)
    }

    /// A copy of `schema` without `allOf` whose inline children are merged
    fn children(&mut self, schema: &Schema) -> MergeResult<Schema> {
        let mut copy = schema.clone();
        copy.all_of.clear();
        copy.one_of = self.inline_list(&schema.one_of)?;
        copy.any_of = self.inline_list(&schema.any_of)?;
        copy.not = self.inline_option(&schema.not)?;
        copy.items = self.inline_option(&schema.items)?;
        copy.prefix_items = self.inline_list(&schema.prefix_items)?;
        copy.contains = self.inline_option(&schema.contains)?;
        copy.property_names = self.inline_option(&schema.property_names)?;
        copy.properties = schema
            .properties
            .iter()
            .map(|(name, node)| Ok((name.clone(), self.inline(node)?)))
            .collect::<MergeResult<_>>()?;
        if let Some(AdditionalProperties::Schema(node)) = &schema.additional_properties {
            copy.additional_properties = Some(AdditionalProperties::Schema(self.inline(node)?));
        }
        Ok(copy)
    }

    fn inline(&mut self, node: &Ref<Schema>) -> MergeResult<Ref<Schema>> {
        match node {
            Ref::Value(value) => Ok(Ref::new(self.schema(value)?)),
            Ref::Pointer(_) => Ok(node.clone()),
        }
    }

    fn inline_option(&mut self, node: &Option<Ref<Schema>>) -> MergeResult<Option<Ref<Schema>>> {
        node.as_ref().map(|node| self.inline(node)).transpose()
    }

    fn inline_list(&mut self, nodes: &[Ref<Schema>]) -> MergeResult<Vec<Ref<Schema>>> {
        nodes.iter().map(|node| self.inline(node)).collect()
    }

    /// Merge a group of nodes as if they were the branches of one `allOf`
    fn all_of(&mut self, nodes: Vec<Ref<Schema>>) -> MergeResult<Ref<Schema>> {
        match <[Ref<Schema>; 1]>::try_from(nodes) {
            Ok([single]) => Ok(single),
            Err(nodes) => {
                let mut composition = Schema::new();
                composition.all_of = nodes;
                Ok(Ref::new(self.schema(&composition)?))
            }
        }
    }

    /// Combine already flattened schemas into one
    fn combine(&mut self, parts: &[Schema]) -> MergeResult<Schema> {
        let mut merged = Schema::new();

        merged.title = first(parts, |s| s.title.as_ref());
        merged.description = first(parts, |s| s.description.as_ref());
        merged.default = first(parts, |s| s.default.as_ref());
        merged.example = first(parts, |s| s.example.as_ref());
        merged.external_docs = first(parts, |s| s.external_docs.as_ref());
        merged.xml = first(parts, |s| s.xml.as_ref());
        merged.discriminator = first(parts, |s| s.discriminator.as_ref());
        merged.examples = parts
            .iter()
            .map(|s| &s.examples)
            .find(|examples| !examples.is_empty())
            .cloned()
            .unwrap_or_default();
        for part in parts {
            for (key, value) in &part.extensions {
                merged.extensions.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }

        merged.types = merge_types(parts)?;
        merged.format = same(parts, "format", |s| s.format.as_ref())?;
        merged.const_value = agreed_const(parts)?;
        merged.enum_values = intersect_enums(parts);

        merged.unique_items = parts.iter().any(|s| s.unique_items);
        merged.read_only = parts.iter().any(|s| s.read_only);
        merged.write_only = parts.iter().any(|s| s.write_only);
        merged.deprecated = parts.iter().any(|s| s.deprecated);
        merged.allow_empty_value = parts.iter().any(|s| s.allow_empty_value);

        merged.minimum = tightest(parts.iter().filter_map(|s| s.minimum), |candidate, best| {
            candidate > best
        });
        merged.maximum = tightest(parts.iter().filter_map(|s| s.maximum), |candidate, best| {
            candidate < best
        });
        merged.multiple_of = multiple_of(parts)?;

        merged.min_length = parts.iter().map(|s| s.min_length).max().unwrap_or(0);
        merged.max_length = parts.iter().filter_map(|s| s.max_length).min();
        merged.set_pattern(combine_patterns(parts));

        merged.min_items = parts.iter().map(|s| s.min_items).max().unwrap_or(0);
        merged.max_items = parts.iter().filter_map(|s| s.max_items).min();
        merged.min_contains = parts.iter().filter_map(|s| s.min_contains).max();
        merged.max_contains = parts.iter().filter_map(|s| s.max_contains).min();
        merged.prefix_items = parts
            .iter()
            .map(|s| &s.prefix_items)
            .find(|items| !items.is_empty())
            .cloned()
            .unwrap_or_default();
        merged.contains = first(parts, |s| s.contains.as_ref());
        merged.property_names = first(parts, |s| s.property_names.as_ref());
        let items: Vec<Ref<Schema>> = parts.iter().filter_map(|s| s.items.clone()).collect();
        if !items.is_empty() {
            merged.items = Some(self.all_of(items)?);
        }

        merged.min_properties = parts.iter().map(|s| s.min_properties).max().unwrap_or(0);
        merged.max_properties = parts.iter().filter_map(|s| s.max_properties).min();
        for part in parts {
            for name in &part.required {
                if !merged.required.contains(name) {
                    merged.required.push(name.clone());
                }
            }
        }
        self.merge_properties(parts, &mut merged)?;

        let nots: Vec<Ref<Schema>> = parts.iter().filter_map(|s| s.not.clone()).collect();
        merged.not = match <[Ref<Schema>; 1]>::try_from(nots) {
            Ok([single]) => Some(single),
            Err(nots) if nots.is_empty() => None,
            Err(nots) => {
                let mut any = Schema::new();
                any.any_of = nots;
                Some(Ref::new(any))
            }
        };
        merged.one_of = self.alternatives(parts.iter().map(|s| &s.one_of))?;
        merged.any_of = self.alternatives(parts.iter().map(|s| &s.any_of))?;

        Ok(merged)
    }

    /// Properties merged by name, then `additionalProperties` applied
    fn merge_properties(&mut self, parts: &[Schema], merged: &mut Schema) -> MergeResult<()> {
        let mut properties: BTreeMap<&str, Vec<Ref<Schema>>> = BTreeMap::new();
        for part in parts {
            for (name, node) in &part.properties {
                properties.entry(name.as_str()).or_default().push(node.clone());
            }
        }

        let mut additional = Vec::new();
        for part in parts {
            if let Some(schema) = part.additional_properties_schema() {
                for (name, nodes) in properties.iter_mut() {
                    if !part.properties.contains_key(*name) {
                        nodes.push(schema.clone());
                    }
                }
                additional.push(schema.clone());
            }
        }

        let closed: Vec<&Schema> = parts.iter().filter(|s| s.disallows_additional_properties()).collect();
        properties.retain(|name, _| closed.iter().all(|part| part.properties.contains_key(*name)));

        for (name, nodes) in properties {
            merged.properties.insert(name.to_string(), self.all_of(nodes)?);
        }

        merged.additional_properties = if !closed.is_empty() {
            Some(AdditionalProperties::Allowed(false))
        } else if !additional.is_empty() {
            Some(AdditionalProperties::Schema(self.all_of(additional)?))
        } else if parts
            .iter()
            .any(|s| s.additional_properties == Some(AdditionalProperties::Allowed(true)))
        {
            Some(AdditionalProperties::Allowed(true))
        } else {
            None
        };
        Ok(())
    }

    /// The Cartesian product of several `oneOf` or `anyOf` lists.
    /// Combinations that cannot be merged are unsatisfiable and dropped.
    fn alternatives<'a, I>(&mut self, lists: I) -> MergeResult<Vec<Ref<Schema>>>
    where
        I: Iterator<Item = &'a Vec<Ref<Schema>>>,
    {
        let lists: Vec<&Vec<Ref<Schema>>> = lists.filter(|list| !list.is_empty()).collect();
        match lists.as_slice() {
            [] => return Ok(Vec::new()),
            [single] => return Ok((*single).clone()),
            _ => {}
        }

        let mut combinations: Vec<Vec<Ref<Schema>>> = vec![Vec::new()];
        for list in &lists {
            combinations = combinations
                .into_iter()
                .flat_map(|prefix| {
                    list.iter().map(move |node| {
                        let mut combination = prefix.clone();
                        combination.push(node.clone());
                        combination
                    })
                })
                .collect();
        }

        let mut merged = Vec::new();
        let mut last_error = None;
        for combination in combinations {
            match self.all_of(combination) {
                Ok(node) => merged.push(node),
                Err(error @ MergeError::Conflict { .. }) => last_error = Some(error),
                Err(error) => return Err(error),
            }
        }
        match last_error {
            Some(error) if merged.is_empty() => Err(error),
            _ => Ok(merged),
        }
    }
}

fn first<T: Clone>(parts: &[Schema], field: impl Fn(&Schema) -> Option<&T>) -> Option<T> {
    parts.iter().find_map(field).cloned()
}

/// The value every part that sets it agrees on
fn same<T>(parts: &[Schema], keyword: &'static str, field: impl Fn(&Schema) -> Option<&T>) -> MergeResult<Option<T>>
where
    T: Clone + PartialEq + std::fmt::Debug,
{
    let mut chosen: Option<&T> = None;
    for value in parts.iter().filter_map(field) {
        match chosen {
            Some(existing) if existing != value => {
                return Err(MergeError::conflict(keyword, format!("{:?}", existing), format!("{:?}", value)));
            }
            Some(_) => {}
            None => chosen = Some(value),
        }
    }
    Ok(chosen.cloned())
}

fn merge_types(parts: &[Schema]) -> MergeResult<Types> {
    let mut kinds: Option<&[SchemaType]> = None;
    for part in parts.iter().filter(|s| !s.types.is_unconstrained()) {
        let candidate = part.types.kinds();
        match kinds {
            Some(existing) if !same_kinds(existing, candidate) => {
                return Err(MergeError::conflict("type", &part_types(existing), &part_types(candidate)));
            }
            Some(_) => {}
            None => kinds = Some(candidate),
        }
    }

    let mut types = Types::of(kinds.unwrap_or_default().iter().copied());
    let typed: Vec<&Types> = parts.iter().map(|s| &s.types).filter(|t| !t.is_empty()).collect();
    if !typed.is_empty() && typed.iter().all(|t| t.permits_null()) {
        types.set_null(typed[0].null_style());
    }
    Ok(types)
}

fn same_kinds(a: &[SchemaType], b: &[SchemaType]) -> bool {
    a.len() == b.len() && a.iter().all(|kind| b.contains(kind))
}

fn part_types(kinds: &[SchemaType]) -> String {
    Types::of(kinds.iter().copied()).to_string()
}

fn agreed_const(parts: &[Schema]) -> MergeResult<Option<Value>> {
    let mut chosen: Option<&Value> = None;
    for value in parts.iter().filter_map(|s| s.const_value.as_ref()) {
        match chosen {
            Some(existing) if !json_equal(existing, value) => {
                return Err(MergeError::conflict("const", existing, value));
            }
            Some(_) => {}
            None => chosen = Some(value),
        }
    }
    Ok(chosen.cloned())
}

fn intersect_enums(parts: &[Schema]) -> Option<Vec<Value>> {
    let mut lists = parts.iter().filter_map(|s| s.enum_values.as_ref());
    let mut values = lists.next()?.clone();
    for list in lists {
        values.retain(|value| list.iter().any(|other| json_equal(value, other)));
    }
    Some(values)
}

/// The bound `better` prefers; on equal values the exclusive bound wins
fn tightest<I>(bounds: I, better: impl Fn(f64, f64) -> bool) -> Option<Bound>
where
    I: Iterator<Item = Bound>,
{
    bounds.fold(None, |best: Option<Bound>, candidate| match best {
        None => Some(candidate),
        Some(current) if better(candidate.value(), current.value()) => Some(candidate),
        Some(current) if candidate.value() == current.value() && candidate.is_exclusive() && !current.is_exclusive() => {
            Some(candidate)
        }
        Some(current) => Some(current),
    })
}

fn combine_patterns(parts: &[Schema]) -> Option<String> {
    let mut patterns: Vec<&str> = Vec::new();
    for pattern in parts.iter().filter_map(Schema::pattern) {
        if !patterns.contains(&pattern) {
            patterns.push(pattern);
        }
    }
    match patterns.as_slice() {
        [] => None,
        [single] => Some(single.to_string()),
        many => Some(many.iter().map(|p| format!("(?={})", p)).collect()),
    }
}

fn multiple_of(parts: &[Schema]) -> MergeResult<Option<f64>> {
    let values: Vec<f64> = parts.iter().filter_map(|s| s.multiple_of).collect();
    match values.as_slice() {
        [] => Ok(None),
        [single] => Ok(Some(*single)),
        many => lcm_of_decimals(many).map(Some),
    }
}

/// Least common multiple of positive decimals: scale to integers, take the
/// integer LCM, scale back
fn lcm_of_decimals(values: &[f64]) -> MergeResult<f64> {
    for value in values {
        if !value.is_finite() || *value <= 0.0 {
            return Err(MergeError::MultipleOf {
                value: *value,
                reason: "must be a positive number".to_string(),
            });
        }
    }

    let places = (0..=MAX_DECIMAL_PLACES)
        .find(|places| values.iter().all(|value| is_integral(value * 10f64.powi(*places))))
        .ok_or_else(|| MergeError::MultipleOf {
            value: values[0],
            reason: format!("more than {} decimal places", MAX_DECIMAL_PLACES),
        })?;
    let scale = 10f64.powi(places);

    let mut lcm: u128 = 1;
    for value in values {
        let scaled = (value * scale).round() as u128;
        let divisor = gcd(lcm, scaled);
        lcm = (lcm / divisor).checked_mul(scaled).ok_or_else(|| MergeError::MultipleOf {
            value: *value,
            reason: "least common multiple overflows".to_string(),
        })?;
    }
    Ok(lcm as f64 / scale)
}

fn is_integral(x: f64) -> bool {
    (x - x.round()).abs() <= 1e-9 * x.abs().max(1.0)
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NullStyle;
    use serde_json::json;
    use std::sync::Arc;

    fn merged(value: Value) -> Schema {
        let schema: Schema = serde_json::from_value(value).unwrap();
        merge(&schema).unwrap()
    }

    #[test]
    fn test_without_all_of_is_unchanged() {
        let schema = Schema::new_string().with_min_length(2);
        assert_eq!(merge(&schema).unwrap(), schema);
    }

    #[test]
    fn test_idempotent() {
        let schema = merged(json!({
            "allOf": [
                {"type": "object", "properties": {"a": {"type": "string", "maxLength": 5}}, "required": ["a"]},
                {"properties": {"a": {"minLength": 1}, "b": {"type": "integer"}}, "required": ["b"]}
            ]
        }));
        assert!(schema.all_of.is_empty());
        assert_eq!(merge(&schema).unwrap(), schema);

        let wrapped = Schema::new_all_of([schema.clone()]);
        assert_eq!(merge(&wrapped).unwrap(), schema);
    }

    #[test]
    fn test_annotations_and_type() {
        let schema = merged(json!({
            "allOf": [
                {"type": "string", "description": "first"},
                {"type": "string", "format": "uuid", "title": "Id", "description": "second"}
            ]
        }));
        assert_eq!(schema.description.as_deref(), Some("first"));
        assert_eq!(schema.title.as_deref(), Some("Id"));
        assert_eq!(schema.format.as_deref(), Some("uuid"));
        assert_eq!(schema.types, Types::single(SchemaType::String));

        let conflict: Schema = serde_json::from_value(json!({"allOf": [{"type": "string"}, {"type": "integer"}]})).unwrap();
        let err = merge(&conflict).unwrap_err();
        assert!(matches!(err, MergeError::Conflict { keyword: "type", .. }));

        let formats: Schema =
            serde_json::from_value(json!({"allOf": [{"format": "int32"}, {"format": "int64"}]})).unwrap();
        assert!(matches!(merge(&formats).unwrap_err(), MergeError::Conflict { keyword: "format", .. }));
    }

    #[test]
    fn test_null_needs_every_typed_branch() {
        let both = Schema::new_all_of([Schema::new_string().with_nullable(), Schema::new_string().with_nullable()]);
        assert_eq!(merge(&both).unwrap().types.null_style(), Some(NullStyle::Nullable));

        let one = Schema::new_all_of([Schema::new_string().with_nullable(), Schema::new_string()]);
        assert!(!merge(&one).unwrap().types.permits_null());

        let untyped = Schema::new_all_of([Schema::new_string().with_nullable(), Schema::new().with_min_length(1)]);
        assert!(merge(&untyped).unwrap().types.permits_null());
    }

    #[test]
    fn test_tightest_bounds() {
        let schema = merged(json!({
            "allOf": [
                {"minimum": 1, "maximum": 10, "minLength": 2, "maxItems": 4},
                {"minimum": 1, "exclusiveMinimum": true, "maximum": 8, "minLength": 1, "maxItems": 6},
                {"exclusiveMaximum": 9}
            ]
        }));
        assert_eq!(schema.minimum, Some(Bound::Exclusive(1.0)));
        assert_eq!(schema.maximum, Some(Bound::Inclusive(8.0)));
        assert_eq!(schema.min_length, 2);
        assert_eq!(schema.max_items, Some(4));
    }

    #[test]
    fn test_multiple_of_lcm() {
        let schema = merged(json!({"allOf": [{"multipleOf": 4}, {"multipleOf": 6}]}));
        assert_eq!(schema.multiple_of, Some(12.0));

        let schema = merged(json!({"allOf": [{"multipleOf": 0.5}, {"multipleOf": 0.2}]}));
        assert_eq!(schema.multiple_of, Some(1.0));

        let schema = merged(json!({"allOf": [{"multipleOf": 0.25}, {"multipleOf": 0.1}]}));
        assert_eq!(schema.multiple_of, Some(0.5));
    }

    #[test]
    fn test_patterns_enum_const_required() {
        let schema = merged(json!({
            "allOf": [
                {"pattern": "^a", "enum": ["ab", "ac", 1], "const": "ab", "required": ["x"]},
                {"pattern": "b$", "enum": ["ab", 1.0], "const": "ab", "required": ["y", "x"]}
            ]
        }));
        assert_eq!(schema.pattern(), Some("(?=^a)(?=b$)"));
        assert_eq!(schema.enum_values, Some(vec![json!("ab"), json!(1)]));
        assert_eq!(schema.const_value, Some(json!("ab")));
        assert_eq!(schema.required, vec!["x", "y"]);

        let conflict: Schema =
            serde_json::from_value(json!({"allOf": [{"const": 1}, {"const": 2}]})).unwrap();
        assert!(matches!(merge(&conflict).unwrap_err(), MergeError::Conflict { keyword: "const", .. }));
    }

    #[test]
    fn test_additional_properties_false_prunes() {
        let schema = merged(json!({
            "allOf": [
                {"properties": {"a": {"type": "string"}, "b": {"type": "string"}}},
                {"properties": {"a": {"maxLength": 3}}, "additionalProperties": false}
            ]
        }));
        assert_eq!(schema.properties.keys().collect::<Vec<_>>(), vec!["a"]);
        assert!(schema.disallows_additional_properties());
        let a = schema.properties["a"].value().unwrap();
        assert_eq!(a.max_length, Some(3));
        assert_eq!(a.types, Types::single(SchemaType::String));
    }

    #[test]
    fn test_additional_properties_schema_applies_to_undeclared() {
        let schema = merged(json!({
            "allOf": [
                {"properties": {"a": {"type": "string"}}},
                {"properties": {"b": {"type": "string"}}, "additionalProperties": {"maxLength": 2}}
            ]
        }));
        assert_eq!(schema.properties["a"].value().unwrap().max_length, Some(2));
        assert_eq!(schema.properties["b"].value().unwrap().max_length, None);
        let additional = schema.additional_properties_schema().unwrap().value().unwrap();
        assert_eq!(additional.max_length, Some(2));
    }

    #[test]
    fn test_flags_items_and_not() {
        let schema = merged(json!({
            "allOf": [
                {"readOnly": true, "items": {"type": "string"}, "not": {"type": "integer"}},
                {"uniqueItems": true, "items": {"maxLength": 4}, "not": {"type": "boolean"}}
            ]
        }));
        assert!(schema.read_only && schema.unique_items);
        assert!(!schema.write_only);
        let items = schema.items.as_ref().unwrap().value().unwrap();
        assert_eq!(items.max_length, Some(4));
        let not = schema.not.as_ref().unwrap().value().unwrap();
        assert_eq!(not.any_of.len(), 2);
    }

    #[test]
    fn test_one_of_cartesian_product() {
        let schema = merged(json!({
            "allOf": [
                {"oneOf": [{"type": "string"}, {"type": "integer"}]},
                {"oneOf": [{"minLength": 1}, {"maxLength": 9}, {"type": "integer", "minimum": 0}]}
            ]
        }));
        // string with integer is unsatisfiable and dropped
        assert_eq!(schema.one_of.len(), 5);

        let narrowed = merged(json!({
            "allOf": [
                {"anyOf": [{"type": "string"}, {"type": "integer"}]},
                {"anyOf": [{"type": "string", "minLength": 1}]}
            ]
        }));
        assert_eq!(narrowed.any_of.len(), 1);
        assert_eq!(narrowed.any_of[0].value().unwrap().min_length, 1);
    }

    #[test]
    fn test_follows_pointers_in_all_of() {
        let base = Arc::new(Schema::new_object().with_property("id", Schema::new_int64()).with_required(["id"]));
        let mut schema = Schema::new().with_property("name", Schema::new_string());
        schema.all_of.push(Ref::resolved("#/components/schemas/Base", base));
        let schema = merge(&schema).unwrap();
        assert!(schema.properties.contains_key("id"));
        assert!(schema.properties.contains_key("name"));
        assert_eq!(schema.required, vec!["id"]);

        let mut unresolved = Schema::new();
        unresolved.all_of.push(Ref::pointer("#/components/schemas/Missing"));
        assert!(matches!(merge(&unresolved).unwrap_err(), MergeError::UnresolvedRef { .. }));
    }

    #[test]
    fn test_keeps_pointers_outside_all_of() {
        let target = Arc::new(Schema::new_string());
        let schema = Schema::new_all_of([
            Schema::new_object().with_property_ref("a", Ref::resolved("#/components/schemas/A", target))
        ]);
        let schema = merge(&schema).unwrap();
        assert_eq!(schema.properties["a"].reference(), Some("#/components/schemas/A"));
    }

    #[test]
    fn test_circular_all_of() {
        let json = json!({
            "openapi": "3.1.0",
            "info": {"title": "t", "version": "1"},
            "components": {"schemas": {
                "A": {"allOf": [{"$ref": "#/components/schemas/B"}]},
                "B": {"allOf": [{"$ref": "#/components/schemas/A"}]}
            }}
        });
        let loader = crate::loader::Loader::default();
        let document = loader.load_from_data(json.to_string().as_bytes()).unwrap();
        let err = merge(document.schema("A").unwrap()).unwrap_err();
        assert!(matches!(err, MergeError::Circular { .. }));
    }
}
