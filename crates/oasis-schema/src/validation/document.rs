//! Structural validation of documents and schema nodes
//!
//! Checks the document itself rather than a value: identifiers, path
//! templates, parameter locations, schema keyword combinations, and that
//! `default` and `example` values match their own schema. Errors are
//! wrapped with the section they were found in, so a failure reads like
//! `invalid components: schema "Pet": ...`.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::model::reference::node_id;
use crate::model::{
    Component, Document, Header, MediaType, Operation, Parameter, Ref, RequestBody, Response, Schema,
    SchemaType,
};
use crate::validation::error::ValidationError;
use crate::validation::formats::is_numeric_format;
use crate::validation::settings::ValidationSettings;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Characters allowed in component keys
pub const IDENTIFIER_PATTERN: &str = "^[a-zA-Z0-9._-]+$";
/// Characters allowed in component keys when brackets are enabled
pub const IDENTIFIER_PATTERN_WITH_BRACKETS: &str = r"^[a-zA-Z0-9.\[\]_-]+$";

const PARAMETER_LOCATIONS: [&str; 4] = ["query", "header", "path", "cookie"];

/// A document or schema node that breaks a structural rule
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("{0}")]
    Invalid(String),

    #[error("identifier {identifier:?} is not supported (expected pattern {pattern:?})")]
    Identifier { identifier: String, pattern: String },

    #[error("found unresolved ref: {reference:?}")]
    UnresolvedRef { reference: String },

    #[error("invalid {section}: {source}")]
    Section {
        section: String,
        #[source]
        source: Box<DocumentError>,
    },

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<DocumentError>,
    },

    #[error("invalid {what}: {source}")]
    Value {
        what: String,
        #[source]
        source: ValidationError,
    },
}

impl DocumentError {
    pub fn invalid<S: Into<String>>(message: S) -> Self {
        DocumentError::Invalid(message.into())
    }

    /// Wrap with a `invalid <section>:` prefix
    pub fn in_section<S: Into<String>>(self, section: S) -> Self {
        DocumentError::Section {
            section: section.into(),
            source: Box::new(self),
        }
    }

    /// Wrap with a `<context>:` prefix
    pub fn within<S: Into<String>>(self, context: S) -> Self {
        DocumentError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error
    pub fn root_cause(&self) -> &DocumentError {
        match self {
            DocumentError::Section { source, .. } | DocumentError::Context { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

pub type DocumentResult<T> = Result<T, DocumentError>;

/// Options for structural validation
#[derive(Debug, Clone)]
pub struct DocumentValidationOptions {
    /// Check `default` values against their schema
    pub validate_defaults: bool,
    /// Check `example` values against their schema
    pub validate_examples: bool,
    /// Require every `pattern` to compile
    pub validate_patterns: bool,
    /// Reject formats the registry does not know
    pub strict_formats: bool,
    /// Allow `[` and `]` in component keys
    pub identifier_brackets: bool,
    /// Settings used when checking defaults and examples
    pub value_settings: ValidationSettings,
}

impl Default for DocumentValidationOptions {
    fn default() -> Self {
        Self {
            validate_defaults: true,
            validate_examples: true,
            validate_patterns: true,
            strict_formats: false,
            identifier_brackets: false,
            value_settings: ValidationSettings::default(),
        }
    }
}

impl DocumentValidationOptions {
    pub fn with_defaults_validation(mut self, enabled: bool) -> Self {
        self.validate_defaults = enabled;
        self
    }

    pub fn with_examples_validation(mut self, enabled: bool) -> Self {
        self.validate_examples = enabled;
        self
    }

    pub fn with_pattern_validation(mut self, enabled: bool) -> Self {
        self.validate_patterns = enabled;
        self
    }

    pub fn with_strict_formats(mut self, strict: bool) -> Self {
        self.strict_formats = strict;
        self
    }

    pub fn with_identifier_brackets(mut self, allowed: bool) -> Self {
        self.identifier_brackets = allowed;
        self
    }

    pub fn with_value_settings(mut self, settings: ValidationSettings) -> Self {
        self.value_settings = settings;
        self
    }

    fn identifier_pattern(&self) -> &'static str {
        if self.identifier_brackets {
            IDENTIFIER_PATTERN_WITH_BRACKETS
        } else {
            IDENTIFIER_PATTERN
        }
    }
}

/// Check a component key against the identifier character class
pub fn validate_identifier(identifier: &str, options: &DocumentValidationOptions) -> DocumentResult<()> {
    let allowed = |c: char| {
        c.is_ascii_alphanumeric()
            || matches!(c, '.' | '_' | '-')
            || (options.identifier_brackets && matches!(c, '[' | ']'))
    };
    if !identifier.is_empty() && identifier.chars().all(allowed) {
        Ok(())
    } else {
        Err(DocumentError::Identifier {
            identifier: identifier.to_string(),
            pattern: options.identifier_pattern().to_string(),
        })
    }
}

impl Document {
    /// Check the document's structure, stopping at the first problem
    pub fn validate(&self, options: &DocumentValidationOptions) -> DocumentResult<()> {
        if self.openapi.is_empty() {
            return Err(DocumentError::invalid("value of openapi must be a non-empty string"));
        }

        let mut checker = Checker::new(options);
        checker.info(self).map_err(|e| e.in_section("info"))?;
        checker.components(self).map_err(|e| e.in_section("components"))?;
        checker.paths(self).map_err(|e| e.in_section("paths"))?;
        Ok(())
    }
}

impl Schema {
    /// Check the schema's keywords, following references into the graph
    pub fn validate(&self, options: &DocumentValidationOptions) -> DocumentResult<()> {
        Checker::new(options).schema(self)
    }
}

/// One structural validation pass; shared nodes are checked once
struct Checker<'o> {
    options: &'o DocumentValidationOptions,
    visited: HashSet<usize>,
}

impl<'o> Checker<'o> {
    fn new(options: &'o DocumentValidationOptions) -> Self {
        Self {
            options,
            visited: HashSet::new(),
        }
    }

    fn info(&mut self, document: &Document) -> DocumentResult<()> {
        if document.info.title.is_empty() {
            return Err(DocumentError::invalid("value of title must be a non-empty string"));
        }
        if document.info.version.is_empty() {
            return Err(DocumentError::invalid("value of version must be a non-empty string"));
        }
        Ok(())
    }

    fn components(&mut self, document: &Document) -> DocumentResult<()> {
        let components = &document.components;
        for (_, key) in components.keys() {
            validate_identifier(key, self.options)?;
        }

        self.collection(&components.schemas, |checker, schema: &Schema| checker.schema(schema))?;
        self.collection(&components.parameters, Self::parameter)?;
        self.collection(&components.headers, Self::header)?;
        self.collection(&components.request_bodies, Self::request_body)?;
        self.collection(&components.responses, Self::response)?;
        Ok(())
    }

    fn collection<T, F>(&mut self, entries: &BTreeMap<String, Ref<T>>, mut check: F) -> DocumentResult<()>
    where
        T: Component,
        F: FnMut(&mut Self, &T) -> DocumentResult<()>,
    {
        for (name, node) in entries {
            let component = resolved(node)?;
            check(self, component).map_err(|e| e.within(format!("{} {:?}", singular(T::KIND), name)))?;
        }
        Ok(())
    }

    fn paths(&mut self, document: &Document) -> DocumentResult<()> {
        for (path, item) in &document.paths {
            if !path.starts_with('/') {
                return Err(DocumentError::invalid(format!(
                    "path {:?} does not start with a forward slash (/)",
                    path
                )));
            }
            let shared: Vec<&Parameter> = item.parameters.iter().map(resolved).collect::<Result<_, _>>()?;
            for parameter in &shared {
                self.parameter(parameter)
                    .map_err(|e| e.within(format!("path {:?}", path)))?;
            }
            for (method, operation) in item.operations() {
                self.operation(operation)
                    .map_err(|e| e.within(format!("operation {} {}", method.to_uppercase(), path)))?;
            }
        }
        Ok(())
    }

    fn operation(&mut self, operation: &Operation) -> DocumentResult<()> {
        for node in &operation.parameters {
            let parameter = resolved(node)?;
            self.parameter(parameter)?;
        }
        if let Some(body) = &operation.request_body {
            let body = resolved(body)?;
            self.request_body(body).map_err(|e| e.within("request body"))?;
        }
        if operation.responses.is_empty() {
            return Err(DocumentError::invalid(
                "the responses object must contain at least one response code",
            ));
        }
        for (status, node) in &operation.responses {
            let response = resolved(node)?;
            self.response(response)
                .map_err(|e| e.within(format!("response {:?}", status)))?;
        }
        Ok(())
    }

    fn parameter(&mut self, parameter: &Parameter) -> DocumentResult<()> {
        let context = format!("parameter {:?}", parameter.name);
        let result = (|| {
            if parameter.name.is_empty() {
                return Err(DocumentError::invalid("parameter name can't be blank"));
            }
            if !PARAMETER_LOCATIONS.contains(&parameter.location.as_str()) {
                return Err(DocumentError::invalid(format!(
                    "parameter can't have 'in' value {:?}",
                    parameter.location
                )));
            }
            if parameter.location == "path" && !parameter.required {
                return Err(DocumentError::invalid("path parameters must be required"));
            }
            if parameter.schema.is_some() == !parameter.content.is_empty() {
                return Err(DocumentError::invalid(
                    "parameter must contain exactly one of content and schema",
                ));
            }
            Ok(())
        })();
        result.map_err(|e| e.within(context.clone()))?;

        if let Some(node) = &parameter.schema {
            let schema = resolved(node)?;
            self.schema(schema).map_err(|e| e.within(context.clone()))?;
            self.example(schema, parameter.example.as_ref())
                .map_err(|e| e.within(context.clone()))?;
        }
        self.content(&parameter.content).map_err(|e| e.within(context))
    }

    fn header(&mut self, header: &Header) -> DocumentResult<()> {
        if let Some(node) = &header.schema {
            let schema = resolved(node)?;
            self.schema(schema)?;
            self.example(schema, header.example.as_ref())?;
        }
        self.content(&header.content)
    }

    fn request_body(&mut self, body: &RequestBody) -> DocumentResult<()> {
        if body.content.is_empty() {
            return Err(DocumentError::invalid("content of the request body is required"));
        }
        self.content(&body.content)
    }

    fn response(&mut self, response: &Response) -> DocumentResult<()> {
        if response.description.is_empty() {
            return Err(DocumentError::invalid("a short description of the response is required"));
        }
        for (name, node) in &response.headers {
            let header = resolved(node)?;
            self.header(header).map_err(|e| e.within(format!("header {:?}", name)))?;
        }
        self.content(&response.content)
    }

    fn content(&mut self, content: &BTreeMap<String, MediaType>) -> DocumentResult<()> {
        for (media_type, entry) in content {
            if let Some(node) = &entry.schema {
                let schema = resolved(node)?;
                let context = format!("media type {:?}", media_type);
                self.schema(schema).map_err(|e| e.within(context.clone()))?;
                self.example(schema, entry.example.as_ref()).map_err(|e| e.within(context))?;
            }
        }
        Ok(())
    }

    fn example(&self, schema: &Schema, example: Option<&Value>) -> DocumentResult<()> {
        match example {
            Some(example) if self.options.validate_examples => schema
                .validate_value(example, &self.options.value_settings)
                .map_err(|source| DocumentError::Value {
                    what: "example".to_string(),
                    source,
                }),
            _ => Ok(()),
        }
    }

    fn schema_ref(&mut self, node: &Ref<Schema>) -> DocumentResult<()> {
        let schema = resolved(node)?;
        self.schema(schema)
    }

    fn schema(&mut self, schema: &Schema) -> DocumentResult<()> {
        if !self.visited.insert(node_id(schema)) {
            return Ok(());
        }

        for (keyword, branches) in [("oneOf", &schema.one_of), ("anyOf", &schema.any_of), ("allOf", &schema.all_of)] {
            for (index, branch) in branches.iter().enumerate() {
                self.schema_ref(branch)
                    .map_err(|e| e.within(format!("{}[{}]", keyword, index)))?;
            }
        }
        if let Some(not) = &schema.not {
            self.schema_ref(not).map_err(|e| e.within("not"))?;
        }

        for kind in schema.types.kinds() {
            self.kind_rules(schema, *kind)?;
        }

        if schema.read_only && schema.write_only {
            return Err(DocumentError::invalid(
                "a property must not be marked as both readOnly and writeOnly",
            ));
        }
        if self.options.validate_patterns {
            if let (Some(pattern), Some(Err(reason))) = (schema.pattern(), schema.compiled_pattern()) {
                return Err(DocumentError::invalid(format!(
                    "cannot compile pattern {:?}: {}",
                    pattern, reason
                )));
            }
        }

        if let Some(items) = &schema.items {
            self.schema_ref(items).map_err(|e| e.within("items"))?;
        }
        for (index, item) in schema.prefix_items.iter().enumerate() {
            self.schema_ref(item)
                .map_err(|e| e.within(format!("prefixItems[{}]", index)))?;
        }
        if let Some(contains) = &schema.contains {
            self.schema_ref(contains).map_err(|e| e.within("contains"))?;
        }
        for (name, property) in &schema.properties {
            self.schema_ref(property)
                .map_err(|e| e.within(format!("property {:?}", name)))?;
        }
        if let Some(additional) = schema.additional_properties_schema() {
            self.schema_ref(additional)
                .map_err(|e| e.within("additionalProperties"))?;
        }
        if let Some(names) = &schema.property_names {
            self.schema_ref(names).map_err(|e| e.within("propertyNames"))?;
        }

        if self.options.validate_defaults {
            if let Some(default) = &schema.default {
                schema
                    .validate_value(default, &self.options.value_settings)
                    .map_err(|source| DocumentError::Value {
                        what: "default".to_string(),
                        source,
                    })?;
            }
        }
        self.example(schema, schema.example.as_ref())
    }

    fn kind_rules(&self, schema: &Schema, kind: SchemaType) -> DocumentResult<()> {
        let format = schema.format.as_deref();
        match kind {
            SchemaType::Array if schema.items.is_none() && schema.prefix_items.is_empty() => {
                Err(DocumentError::invalid("schema of type array requires \"items\""))
            }
            SchemaType::Integer | SchemaType::Number => match format {
                Some(format) if self.options.strict_formats && !is_numeric_format(format) => Err(
                    DocumentError::invalid(format!("unsupported 'format' value {:?}", format)),
                ),
                _ => Ok(()),
            },
            SchemaType::String => match format {
                Some(format)
                    if self.options.strict_formats
                        && !self.options.value_settings.formats().contains(format) =>
                {
                    Err(DocumentError::invalid(format!("unsupported 'format' value {:?}", format)))
                }
                _ => Ok(()),
            },
            _ => Ok(()),
        }
    }
}

fn singular(kind: &str) -> &str {
    match kind {
        "schemas" => "schema",
        "parameters" => "parameter",
        "headers" => "header",
        "requestBodies" => "request body",
        "responses" => "response",
        other => other,
    }
}

fn resolved<T>(node: &Ref<T>) -> DocumentResult<&T> {
    node.value().ok_or_else(|| DocumentError::UnresolvedRef {
        reference: node.reference().unwrap_or_default().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options() -> DocumentValidationOptions {
        DocumentValidationOptions::default()
    }

    fn document(value: Value) -> Document {
        serde_json::from_value(value).unwrap()
    }

    fn minimal() -> Value {
        json!({
            "openapi": "3.0.3",
            "info": {"title": "Pets", "version": "1.0"},
            "paths": {
                "/pets/{id}": {
                    "get": {
                        "parameters": [{"name": "id", "in": "path", "required": true, "schema": {"type": "string"}}],
                        "responses": {"200": {"description": "ok"}}
                    }
                }
            }
        })
    }

    #[test]
    fn test_identifier_validation() {
        assert!(validate_identifier("User-12_3.4", &options()).is_ok());
        let err = validate_identifier("User Admin", &options()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("\"User Admin\""));
        assert!(message.contains(IDENTIFIER_PATTERN));

        assert!(validate_identifier("Page[User]", &options()).is_err());
        assert!(validate_identifier("Page[User]", &options().with_identifier_brackets(true)).is_ok());
    }

    #[test]
    fn test_valid_document() {
        assert!(document(minimal()).validate(&options()).is_ok());
    }

    #[test]
    fn test_section_prefixes() {
        let mut value = minimal();
        value["info"]["title"] = json!("");
        let err = document(value).validate(&options()).unwrap_err();
        assert_eq!(err.to_string(), "invalid info: value of title must be a non-empty string");

        let mut value = minimal();
        value["components"] = json!({"schemas": {"User Admin": {"type": "object"}}});
        let err = document(value).validate(&options()).unwrap_err();
        assert!(err.to_string().starts_with("invalid components: identifier \"User Admin\""));

        let mut value = minimal();
        value["paths"]["pets"] = json!({});
        let err = document(value).validate(&options()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid paths: path \"pets\" does not start with a forward slash (/)"
        );
    }

    #[test]
    fn test_path_parameter_must_be_required() {
        let mut value = minimal();
        value["paths"]["/pets/{id}"]["get"]["parameters"][0]["required"] = json!(false);
        let err = document(value).validate(&options()).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("invalid paths: operation GET /pets/{id}: parameter \"id\""));
        assert!(message.ends_with("path parameters must be required"));
    }

    #[test]
    fn test_responses_required() {
        let mut value = minimal();
        value["paths"]["/pets/{id}"]["get"]["responses"] = json!({});
        let err = document(value).validate(&options()).unwrap_err();
        assert!(err.to_string().contains("at least one response code"));
    }

    #[test]
    fn test_schema_rules() {
        let array = Schema::new_array();
        assert!(array.validate(&options()).is_err());
        assert!(Schema::new_array().with_items(Schema::new_string()).validate(&options()).is_ok());

        let both = Schema::new_string().with_read_only(true).with_write_only(true);
        assert!(both.validate(&options()).is_err());

        let pattern = Schema::new_string().with_pattern("(?=a)");
        assert!(pattern.validate(&options()).is_err());
        assert!(pattern.validate(&options().with_pattern_validation(false)).is_ok());

        let unknown = Schema::new_string().with_format("hostname");
        assert!(unknown.validate(&options()).is_ok());
        assert!(unknown.validate(&options().with_strict_formats(true)).is_err());
        assert!(Schema::new_int32().validate(&options().with_strict_formats(true)).is_ok());
    }

    #[test]
    fn test_default_must_match_schema() {
        let schema = Schema::new_integer().with_default(json!("seven"));
        let err = schema.validate(&options()).unwrap_err();
        assert!(matches!(err, DocumentError::Value { ref what, .. } if what == "default"));
        assert!(err.to_string().starts_with("invalid default: value must be an integer"));
        assert!(schema.validate(&options().with_defaults_validation(false)).is_ok());
    }

    #[test]
    fn test_component_context() {
        let mut value = minimal();
        value["components"] = json!({
            "schemas": {"Pet": {"type": "object", "properties": {"tags": {"type": "array"}}}}
        });
        let err = document(value).validate(&options()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid components: schema \"Pet\": property \"tags\": schema of type array requires \"items\""
        );
        assert!(matches!(err.root_cause(), DocumentError::Invalid(_)));
    }

    #[test]
    fn test_unresolved_ref() {
        let mut value = minimal();
        value["components"] = json!({"schemas": {"A": {"$ref": "#/components/schemas/B"}}});
        let err = document(value).validate(&options()).unwrap_err();
        assert!(matches!(err.root_cause(), DocumentError::UnresolvedRef { reference } if reference == "#/components/schemas/B"));
    }
}
