//! Wire form of [`Schema`]
//!
//! The schema keeps one canonical type set and one `Bound` per side; this
//! flat struct holds the keywords as they appear in the document and
//! converts in both directions.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::model::document::ExternalDocs;
use crate::model::reference::Ref;
use crate::model::schema::{
    AdditionalProperties, Bound, Discriminator, NullStyle, Schema, SchemaType, Types,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

fn is_false(value: &bool) -> bool {
    !*value
}

/// `type: "string"` or `type: ["string", "null"]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum TypeField {
    One(String),
    Many(Vec<String>),
}

/// `exclusiveMinimum: true` (3.0) or `exclusiveMinimum: 5` (3.1)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum ExclusiveField {
    Flag(bool),
    Value(f64),
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SchemaRepr {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    one_of: Vec<Ref<Schema>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    any_of: Vec<Ref<Schema>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    all_of: Vec<Ref<Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    not: Option<Ref<Schema>>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    type_field: Option<TypeField>,
    #[serde(default, skip_serializing_if = "is_false")]
    nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    enum_values: Option<Vec<Value>>,
    #[serde(rename = "const", default, skip_serializing_if = "Option::is_none")]
    const_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    example: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    examples: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    external_docs: Option<ExternalDocs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    xml: Option<Value>,

    #[serde(default, skip_serializing_if = "is_false")]
    unique_items: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    read_only: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    write_only: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    allow_empty_value: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    deprecated: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exclusive_minimum: Option<ExclusiveField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exclusive_maximum: Option<ExclusiveField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    multiple_of: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    min_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    min_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    items: Option<Ref<Schema>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    prefix_items: Vec<Ref<Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    contains: Option<Ref<Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min_contains: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_contains: Option<u64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    required: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    properties: BTreeMap<String, Ref<Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min_properties: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_properties: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    additional_properties: Option<AdditionalProperties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    property_names: Option<Ref<Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    discriminator: Option<Discriminator>,

    #[serde(flatten)]
    extensions: BTreeMap<String, Value>,
}

fn parse_types(field: Option<TypeField>, nullable: bool) -> Result<Types, String> {
    let names = match field {
        None => Vec::new(),
        Some(TypeField::One(name)) => vec![name],
        Some(TypeField::Many(names)) => names,
    };

    let mut types = Types::any();
    for name in &names {
        if name == "null" {
            types.set_null(Some(NullStyle::TypeEntry));
            continue;
        }
        let kind = SchemaType::from_name(name).ok_or_else(|| format!("unknown type \"{}\"", name))?;
        types.insert(kind);
    }
    if nullable && !types.permits_null() {
        types.set_null(Some(NullStyle::Nullable));
    }
    Ok(types)
}

fn write_types(types: &Types) -> (Option<TypeField>, bool) {
    let mut names: Vec<String> = types.kinds().iter().map(|k| k.as_str().to_string()).collect();
    match types.null_style() {
        Some(NullStyle::TypeEntry) => {
            names.push("null".to_string());
            if names.len() == 1 {
                (Some(TypeField::One(names.remove(0))), false)
            } else {
                (Some(TypeField::Many(names)), false)
            }
        }
        style => {
            let nullable = style == Some(NullStyle::Nullable);
            let field = match names.len() {
                0 => None,
                1 => Some(TypeField::One(names.remove(0))),
                _ => Some(TypeField::Many(names)),
            };
            (field, nullable)
        }
    }
}

/// Combine the inclusive keyword with its exclusive companion.
/// `tighter(m, e)` says whether the inclusive value `m` already implies `> e`.
fn parse_bound(
    inclusive: Option<f64>,
    exclusive: Option<ExclusiveField>,
    tighter: fn(f64, f64) -> bool,
) -> Option<Bound> {
    match (inclusive, exclusive) {
        (Some(m), Some(ExclusiveField::Flag(flag))) => Some(Bound::new(m, flag)),
        (Some(m), None) => Some(Bound::Inclusive(m)),
        (None, Some(ExclusiveField::Flag(_))) | (None, None) => None,
        (None, Some(ExclusiveField::Value(e))) => Some(Bound::ExclusiveValue(e)),
        (Some(m), Some(ExclusiveField::Value(e))) => {
            if tighter(m, e) {
                Some(Bound::Inclusive(m))
            } else {
                Some(Bound::ExclusiveValue(e))
            }
        }
    }
}

fn write_bound(bound: Option<Bound>) -> (Option<f64>, Option<ExclusiveField>) {
    match bound {
        None => (None, None),
        Some(Bound::Inclusive(v)) => (Some(v), None),
        Some(Bound::Exclusive(v)) => (Some(v), Some(ExclusiveField::Flag(true))),
        Some(Bound::ExclusiveValue(v)) => (None, Some(ExclusiveField::Value(v))),
    }
}

/// An exclusivity flag without its bound has no meaning, but is kept verbatim
fn keep_bare_flag(
    extensions: &mut BTreeMap<String, Value>,
    keyword: &str,
    bound: Option<f64>,
    exclusive: Option<ExclusiveField>,
) {
    if let (None, Some(ExclusiveField::Flag(flag))) = (bound, exclusive) {
        extensions.insert(keyword.to_string(), Value::Bool(flag));
    }
}

impl TryFrom<SchemaRepr> for Schema {
    type Error = String;

    fn try_from(repr: SchemaRepr) -> Result<Self, Self::Error> {
        let mut extensions = repr.extensions;
        keep_bare_flag(&mut extensions, "exclusiveMinimum", repr.minimum, repr.exclusive_minimum);
        keep_bare_flag(&mut extensions, "exclusiveMaximum", repr.maximum, repr.exclusive_maximum);

        let mut schema = Schema {
            extensions,
            one_of: repr.one_of,
            any_of: repr.any_of,
            all_of: repr.all_of,
            not: repr.not,
            types: parse_types(repr.type_field, repr.nullable)?,
            title: repr.title,
            format: repr.format,
            description: repr.description,
            enum_values: repr.enum_values,
            const_value: repr.const_value,
            default: repr.default,
            example: repr.example,
            examples: repr.examples,
            external_docs: repr.external_docs,
            xml: repr.xml,
            unique_items: repr.unique_items,
            read_only: repr.read_only,
            write_only: repr.write_only,
            allow_empty_value: repr.allow_empty_value,
            deprecated: repr.deprecated,
            minimum: parse_bound(repr.minimum, repr.exclusive_minimum, |m, e| m > e),
            maximum: parse_bound(repr.maximum, repr.exclusive_maximum, |m, e| m < e),
            multiple_of: repr.multiple_of,
            min_length: repr.min_length.unwrap_or(0),
            max_length: repr.max_length,
            min_items: repr.min_items.unwrap_or(0),
            max_items: repr.max_items,
            items: repr.items,
            prefix_items: repr.prefix_items,
            contains: repr.contains,
            min_contains: repr.min_contains,
            max_contains: repr.max_contains,
            required: repr.required,
            properties: repr.properties,
            min_properties: repr.min_properties.unwrap_or(0),
            max_properties: repr.max_properties,
            additional_properties: repr.additional_properties,
            property_names: repr.property_names,
            discriminator: repr.discriminator,
            ..Default::default()
        };
        schema.set_pattern(repr.pattern);
        Ok(schema)
    }
}

impl From<Schema> for SchemaRepr {
    fn from(schema: Schema) -> Self {
        let (type_field, nullable) = write_types(&schema.types);
        let (minimum, exclusive_minimum) = write_bound(schema.minimum);
        let (maximum, exclusive_maximum) = write_bound(schema.maximum);
        let pattern = schema.pattern().map(str::to_string);
        let mut extensions = schema.extensions;
        if minimum.is_some() || exclusive_minimum.is_some() {
            extensions.remove("exclusiveMinimum");
        }
        if maximum.is_some() || exclusive_maximum.is_some() {
            extensions.remove("exclusiveMaximum");
        }
        let nonzero = |n: u64| if n == 0 { None } else { Some(n) };

        SchemaRepr {
            one_of: schema.one_of,
            any_of: schema.any_of,
            all_of: schema.all_of,
            not: schema.not,
            type_field,
            nullable,
            title: schema.title,
            format: schema.format,
            description: schema.description,
            enum_values: schema.enum_values,
            const_value: schema.const_value,
            default: schema.default,
            example: schema.example,
            examples: schema.examples,
            external_docs: schema.external_docs,
            xml: schema.xml,
            unique_items: schema.unique_items,
            read_only: schema.read_only,
            write_only: schema.write_only,
            allow_empty_value: schema.allow_empty_value,
            deprecated: schema.deprecated,
            minimum,
            exclusive_minimum,
            maximum,
            exclusive_maximum,
            multiple_of: schema.multiple_of,
            min_length: nonzero(schema.min_length),
            max_length: schema.max_length,
            pattern,
            min_items: nonzero(schema.min_items),
            max_items: schema.max_items,
            items: schema.items,
            prefix_items: schema.prefix_items,
            contains: schema.contains,
            min_contains: schema.min_contains,
            max_contains: schema.max_contains,
            required: schema.required,
            properties: schema.properties,
            min_properties: nonzero(schema.min_properties),
            max_properties: schema.max_properties,
            additional_properties: schema.additional_properties,
            property_names: schema.property_names,
            discriminator: schema.discriminator,
            extensions,
        }
    }
}
