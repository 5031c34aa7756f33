//! The schema node: every JSON-Schema-like keyword of the document format
//!
//! One `Schema` models both dialects the format allows. The type designator
//! is a single canonical [`Types`] set; the OpenAPI 3.0 spelling
//! (`nullable: true`, boolean `exclusiveMinimum`) and the 3.1 spelling
//! (`"null"` in a type array, numeric `exclusiveMinimum`) are only
//! remembered so that serialization writes back what was read.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::model::document::ExternalDocs;
use crate::model::reference::Ref;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

/// Primitive (non-null) type names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    Boolean,
    Object,
    Array,
    Number,
    String,
    Integer,
}

impl SchemaType {
    /// The keyword spelling of this type
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::Boolean => "boolean",
            SchemaType::Object => "object",
            SchemaType::Array => "array",
            SchemaType::Number => "number",
            SchemaType::String => "string",
            SchemaType::Integer => "integer",
        }
    }

    /// Parse a type name; `"null"` is not a primitive type and yields `None`
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "boolean" => Some(SchemaType::Boolean),
            "object" => Some(SchemaType::Object),
            "array" => Some(SchemaType::Array),
            "number" => Some(SchemaType::Number),
            "string" => Some(SchemaType::String),
            "integer" => Some(SchemaType::Integer),
            _ => None,
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a schema spelled its permission for `null`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullStyle {
    /// `nullable: true` (OpenAPI 3.0)
    Nullable,
    /// `"null"` inside the type array (OpenAPI 3.1 / JSON Schema 2020-12)
    TypeEntry,
}

/// The canonical set of permitted types
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Types {
    kinds: Vec<SchemaType>,
    null: Option<NullStyle>,
}

impl Types {
    /// No type constraint at all
    pub fn any() -> Self {
        Self::default()
    }

    /// Exactly one primitive type
    pub fn single(kind: SchemaType) -> Self {
        Self {
            kinds: vec![kind],
            null: None,
        }
    }

    /// A set of primitive types, in the given order, without duplicates
    pub fn of<I: IntoIterator<Item = SchemaType>>(kinds: I) -> Self {
        let mut types = Self::default();
        for kind in kinds {
            types.insert(kind);
        }
        types
    }

    /// Permit `null` using the given spelling
    pub fn with_null(mut self, style: NullStyle) -> Self {
        self.null = Some(style);
        self
    }

    /// Add a primitive type
    pub fn insert(&mut self, kind: SchemaType) {
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
    }

    /// Set or clear the `null` permission
    pub fn set_null(&mut self, style: Option<NullStyle>) {
        self.null = style;
    }

    /// The permitted primitive types (empty means "any")
    pub fn kinds(&self) -> &[SchemaType] {
        &self.kinds
    }

    /// Whether no primitive type is named
    pub fn is_unconstrained(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Whether neither a primitive type nor `null` is named
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty() && self.null.is_none()
    }

    /// Whether the exact primitive type is named
    pub fn includes(&self, kind: SchemaType) -> bool {
        self.kinds.contains(&kind)
    }

    /// Whether a value of the given kind passes the type check.
    /// An integer is also a number.
    pub fn permits(&self, kind: SchemaType) -> bool {
        self.kinds.is_empty()
            || self.kinds.contains(&kind)
            || (kind == SchemaType::Integer && self.kinds.contains(&SchemaType::Number))
    }

    /// Whether `null` is permitted, whichever dialect spelled it
    pub fn permits_null(&self) -> bool {
        self.null.is_some()
    }

    /// The spelling of the `null` permission, if any
    pub fn null_style(&self) -> Option<NullStyle> {
        self.null
    }

    /// The single primitive type, when exactly one is named
    pub fn single_kind(&self) -> Option<SchemaType> {
        match self.kinds.as_slice() {
            [kind] => Some(*kind),
            _ => None,
        }
    }
}

impl fmt::Display for Types {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.kinds.iter().map(SchemaType::as_str).collect();
        if self.permits_null() {
            names.push("null");
        }
        write!(f, "{}", names.join(", "))
    }
}

/// A numeric lower or upper bound
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// `minimum: v`
    Inclusive(f64),
    /// `minimum: v` with `exclusiveMinimum: true` (OpenAPI 3.0)
    Exclusive(f64),
    /// `exclusiveMinimum: v` (OpenAPI 3.1 / JSON Schema 2020-12)
    ExclusiveValue(f64),
}

impl Bound {
    /// Build a bound from a value and an exclusivity flag
    pub fn new(value: f64, exclusive: bool) -> Self {
        if exclusive {
            Bound::Exclusive(value)
        } else {
            Bound::Inclusive(value)
        }
    }

    /// The bounding value
    pub fn value(&self) -> f64 {
        match self {
            Bound::Inclusive(v) | Bound::Exclusive(v) | Bound::ExclusiveValue(v) => *v,
        }
    }

    /// Whether the bounding value itself is rejected
    pub fn is_exclusive(&self) -> bool {
        !matches!(self, Bound::Inclusive(_))
    }
}

/// The `additionalProperties` keyword
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    /// `true` or `false`
    Allowed(bool),
    /// A schema every undeclared property must match
    Schema(Ref<Schema>),
}

/// The `discriminator` keyword
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discriminator {
    pub property_name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub mapping: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

impl Discriminator {
    /// A discriminator on the given property without explicit mapping
    pub fn new<S: Into<String>>(property_name: S) -> Self {
        Self {
            property_name: property_name.into(),
            ..Default::default()
        }
    }

    /// Add an explicit `value -> reference` mapping entry
    pub fn with_mapping<V: Into<String>, R: Into<String>>(mut self, value: V, reference: R) -> Self {
        self.mapping.insert(value.into(), reference.into());
        self
    }
}

/// Lazily compiled companion of `Schema::pattern`
#[derive(Default)]
pub(super) struct CompiledPattern(OnceLock<Result<Regex, String>>);

impl Clone for CompiledPattern {
    fn clone(&self) -> Self {
        let copy = OnceLock::new();
        if let Some(compiled) = self.0.get() {
            let _ = copy.set(compiled.clone());
        }
        Self(copy)
    }
}

impl fmt::Debug for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0.get().is_some() { "compiled" } else { "pending" })
    }
}

impl PartialEq for CompiledPattern {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

/// A schema node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "crate::model::schema_repr::SchemaRepr", into = "crate::model::schema_repr::SchemaRepr")]
pub struct Schema {
    pub extensions: BTreeMap<String, Value>,

    pub one_of: Vec<Ref<Schema>>,
    pub any_of: Vec<Ref<Schema>>,
    pub all_of: Vec<Ref<Schema>>,
    pub not: Option<Ref<Schema>>,

    pub types: Types,
    pub title: Option<String>,
    pub format: Option<String>,
    pub description: Option<String>,
    pub enum_values: Option<Vec<Value>>,
    pub const_value: Option<Value>,
    pub default: Option<Value>,
    pub example: Option<Value>,
    pub examples: Vec<Value>,
    pub external_docs: Option<ExternalDocs>,
    pub xml: Option<Value>,

    pub unique_items: bool,
    pub read_only: bool,
    pub write_only: bool,
    pub allow_empty_value: bool,
    pub deprecated: bool,

    // Number
    pub minimum: Option<Bound>,
    pub maximum: Option<Bound>,
    pub multiple_of: Option<f64>,

    // String
    pub min_length: u64,
    pub max_length: Option<u64>,
    pub(super) pattern: Option<String>,
    pub(super) compiled_pattern: CompiledPattern,

    // Array
    pub min_items: u64,
    pub max_items: Option<u64>,
    pub items: Option<Ref<Schema>>,
    pub prefix_items: Vec<Ref<Schema>>,
    pub contains: Option<Ref<Schema>>,
    pub min_contains: Option<u64>,
    pub max_contains: Option<u64>,

    // Object
    pub required: Vec<String>,
    pub properties: BTreeMap<String, Ref<Schema>>,
    pub min_properties: u64,
    pub max_properties: Option<u64>,
    pub additional_properties: Option<AdditionalProperties>,
    pub property_names: Option<Ref<Schema>>,
    pub discriminator: Option<Discriminator>,
}

impl Schema {
    /// An empty schema that accepts anything but `null`
    pub fn new() -> Self {
        Self::default()
    }

    fn of_type(kind: SchemaType) -> Self {
        Self {
            types: Types::single(kind),
            ..Default::default()
        }
    }

    pub fn new_bool() -> Self {
        Self::of_type(SchemaType::Boolean)
    }

    pub fn new_float64() -> Self {
        Self::of_type(SchemaType::Number)
    }

    pub fn new_integer() -> Self {
        Self::of_type(SchemaType::Integer)
    }

    pub fn new_int32() -> Self {
        Self::new_integer().with_format("int32")
    }

    pub fn new_int64() -> Self {
        Self::new_integer().with_format("int64")
    }

    pub fn new_string() -> Self {
        Self::of_type(SchemaType::String)
    }

    pub fn new_date_time() -> Self {
        Self::new_string().with_format("date-time")
    }

    pub fn new_uuid() -> Self {
        Self::new_string().with_format("uuid")
    }

    pub fn new_bytes() -> Self {
        Self::new_string().with_format("byte")
    }

    pub fn new_array() -> Self {
        Self::of_type(SchemaType::Array)
    }

    pub fn new_object() -> Self {
        Self::of_type(SchemaType::Object)
    }

    /// `{oneOf: [...]}`
    pub fn new_one_of<I: IntoIterator<Item = Schema>>(schemas: I) -> Self {
        Self {
            one_of: schemas.into_iter().map(Ref::new).collect(),
            ..Default::default()
        }
    }

    /// `{anyOf: [...]}`
    pub fn new_any_of<I: IntoIterator<Item = Schema>>(schemas: I) -> Self {
        Self {
            any_of: schemas.into_iter().map(Ref::new).collect(),
            ..Default::default()
        }
    }

    /// `{allOf: [...]}`
    pub fn new_all_of<I: IntoIterator<Item = Schema>>(schemas: I) -> Self {
        Self {
            all_of: schemas.into_iter().map(Ref::new).collect(),
            ..Default::default()
        }
    }

    /// Permit `null` with the OpenAPI 3.0 `nullable` flag
    pub fn with_nullable(mut self) -> Self {
        self.types.set_null(Some(NullStyle::Nullable));
        self
    }

    /// Replace the type set
    pub fn with_types(mut self, types: Types) -> Self {
        self.types = types;
        self
    }

    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_format<S: Into<String>>(mut self, format: S) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_enum<I: IntoIterator<Item = Value>>(mut self, values: I) -> Self {
        self.enum_values = Some(values.into_iter().collect());
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_min(mut self, value: f64) -> Self {
        self.minimum = Some(Bound::Inclusive(value));
        self
    }

    pub fn with_max(mut self, value: f64) -> Self {
        self.maximum = Some(Bound::Inclusive(value));
        self
    }

    /// `minimum: value` with `exclusiveMinimum: true`
    pub fn with_exclusive_min(mut self, value: f64) -> Self {
        self.minimum = Some(Bound::Exclusive(value));
        self
    }

    /// `maximum: value` with `exclusiveMaximum: true`
    pub fn with_exclusive_max(mut self, value: f64) -> Self {
        self.maximum = Some(Bound::Exclusive(value));
        self
    }

    pub fn with_multiple_of(mut self, value: f64) -> Self {
        self.multiple_of = Some(value);
        self
    }

    pub fn with_min_length(mut self, n: u64) -> Self {
        self.min_length = n;
        self
    }

    pub fn with_max_length(mut self, n: u64) -> Self {
        self.max_length = Some(n);
        self
    }

    pub fn with_pattern<S: Into<String>>(mut self, pattern: S) -> Self {
        self.set_pattern(Some(pattern.into()));
        self
    }

    pub fn with_items(mut self, items: Schema) -> Self {
        self.items = Some(Ref::new(items));
        self
    }

    pub fn with_items_ref(mut self, items: Ref<Schema>) -> Self {
        self.items = Some(items);
        self
    }

    pub fn with_min_items(mut self, n: u64) -> Self {
        self.min_items = n;
        self
    }

    pub fn with_max_items(mut self, n: u64) -> Self {
        self.max_items = Some(n);
        self
    }

    pub fn with_unique_items(mut self, unique: bool) -> Self {
        self.unique_items = unique;
        self
    }

    pub fn with_property<S: Into<String>>(self, name: S, schema: Schema) -> Self {
        self.with_property_ref(name, Ref::new(schema))
    }

    pub fn with_property_ref<S: Into<String>>(mut self, name: S, schema: Ref<Schema>) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    pub fn with_properties<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = (S, Schema)>,
        S: Into<String>,
    {
        for (name, schema) in properties {
            self.properties.insert(name.into(), Ref::new(schema));
        }
        self
    }

    pub fn with_required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_min_properties(mut self, n: u64) -> Self {
        self.min_properties = n;
        self
    }

    pub fn with_max_properties(mut self, n: u64) -> Self {
        self.max_properties = Some(n);
        self
    }

    /// `additionalProperties: true`
    pub fn with_any_additional_properties(mut self) -> Self {
        self.additional_properties = Some(AdditionalProperties::Allowed(true));
        self
    }

    /// `additionalProperties: false`
    pub fn without_additional_properties(mut self) -> Self {
        self.additional_properties = Some(AdditionalProperties::Allowed(false));
        self
    }

    /// `additionalProperties: {schema}`
    pub fn with_additional_properties(mut self, schema: Schema) -> Self {
        self.additional_properties = Some(AdditionalProperties::Schema(Ref::new(schema)));
        self
    }

    pub fn with_discriminator(mut self, discriminator: Discriminator) -> Self {
        self.discriminator = Some(discriminator);
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn with_write_only(mut self, write_only: bool) -> Self {
        self.write_only = write_only;
        self
    }

    /// The regular expression strings must match
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    /// Replace the pattern; the compiled companion is discarded
    pub fn set_pattern(&mut self, pattern: Option<String>) {
        self.pattern = pattern;
        self.compiled_pattern = CompiledPattern::default();
    }

    /// The compiled pattern, compiling it on first use.
    /// `Err` carries the compiler's message for unsupported syntax.
    pub fn compiled_pattern(&self) -> Option<Result<&Regex, &str>> {
        let pattern = self.pattern.as_deref()?;
        let compiled = self
            .compiled_pattern
            .0
            .get_or_init(|| Regex::new(pattern).map_err(|e| e.to_string()));
        Some(compiled.as_ref().map_err(String::as_str))
    }

    /// Whether the schema carries no keyword at all
    pub fn is_empty(&self) -> bool {
        self == &Schema::default()
    }

    /// Whether any of `oneOf`, `anyOf`, `allOf` is present
    pub fn has_combinators(&self) -> bool {
        !self.one_of.is_empty() || !self.any_of.is_empty() || !self.all_of.is_empty()
    }

    /// The additional-properties schema, if one is configured
    pub fn additional_properties_schema(&self) -> Option<&Ref<Schema>> {
        match &self.additional_properties {
            Some(AdditionalProperties::Schema(schema)) => Some(schema),
            _ => None,
        }
    }

    /// Whether undeclared properties are explicitly forbidden
    pub fn disallows_additional_properties(&self) -> bool {
        matches!(self.additional_properties, Some(AdditionalProperties::Allowed(false)))
    }
}
