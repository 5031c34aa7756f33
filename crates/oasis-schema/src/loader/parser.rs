//! Document parsing: JSON first, YAML as fallback
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::loader::error::{LoaderError, LoaderResult};
use crate::model::Document;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;

/// Textual formats a document may be written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// YAML format (.yaml, .yml)
    Yaml,
    /// JSON format (.json)
    Json,
}

impl Format {
    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension().and_then(|ext| ext.to_str())?;
        match extension.to_lowercase().as_str() {
            "yaml" | "yml" => Some(Format::Yaml),
            "json" => Some(Format::Json),
            _ => None,
        }
    }

    /// Get the primary file extension for this format
    pub fn primary_extension(&self) -> &'static str {
        match self {
            Format::Yaml => "yaml",
            Format::Json => "json",
        }
    }
}

/// Turns raw bytes into the JSON data model
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentParser;

impl DocumentParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse bytes, trying JSON first and YAML second.
    /// When both fail, the YAML error is reported since YAML accepts more.
    pub fn parse(&self, data: &[u8], location: &str) -> LoaderResult<(Value, Format)> {
        match self.parse_json(data, location) {
            Ok(value) => Ok((value, Format::Json)),
            Err(_) => self.parse_yaml(data, location).map(|value| (value, Format::Yaml)),
        }
    }

    /// Parse JSON content
    pub fn parse_json(&self, data: &[u8], location: &str) -> LoaderResult<Value> {
        serde_json::from_slice(data).map_err(|e| LoaderError::json_parse_error(location, e))
    }

    /// Parse YAML content
    pub fn parse_yaml(&self, data: &[u8], location: &str) -> LoaderResult<Value> {
        // YAML keys such as response codes may be integers; go through the
        // YAML value so they are stringified on conversion.
        let yaml_value: serde_yaml::Value =
            serde_yaml::from_slice(data).map_err(|e| LoaderError::yaml_parse_error(location, e))?;

        serde_json::to_value(yaml_value).map_err(|e| LoaderError::json_parse_error(location, e))
    }

    /// Parse bytes into a typed document
    pub fn parse_document(&self, data: &[u8], location: &str) -> LoaderResult<Document> {
        let (value, _) = self.parse(data, location)?;
        self.unmarshal("document", value, location)
    }

    /// Convert a parsed value into a model type
    pub fn unmarshal<T: DeserializeOwned>(&self, what: &str, value: Value, location: &str) -> LoaderResult<T> {
        serde_json::from_value(value).map_err(|e| LoaderError::unmarshal_error(what, location, e))
    }

    /// Serialize a value back to text
    pub fn serialize(&self, value: &Value, format: Format) -> LoaderResult<String> {
        match format {
            Format::Json => serde_json::to_string_pretty(value)
                .map_err(|e| LoaderError::json_parse_error("<output>", e)),
            Format::Yaml => serde_yaml::to_string(value)
                .map_err(|e| LoaderError::yaml_parse_error("<output>", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(Format::from_path(Path::new("api.yaml")), Some(Format::Yaml));
        assert_eq!(Format::from_path(Path::new("api.YML")), Some(Format::Yaml));
        assert_eq!(Format::from_path(Path::new("api.json")), Some(Format::Json));
        assert_eq!(Format::from_path(Path::new("api.txt")), None);
        assert_eq!(Format::Yaml.primary_extension(), "yaml");
    }

    #[test]
    fn test_fallback_parsing() -> LoaderResult<()> {
        let parser = DocumentParser::new();

        let (value, format) = parser.parse(br#"{"openapi": "3.0.0"}"#, "mem")?;
        assert_eq!(format, Format::Json);
        assert_eq!(value["openapi"], "3.0.0");

        let (value, format) = parser.parse(b"openapi: 3.1.0\ninfo:\n  title: t\n", "mem")?;
        assert_eq!(format, Format::Yaml);
        assert_eq!(value["info"]["title"], "t");

        Ok(())
    }

    #[test]
    fn test_yaml_integer_keys_become_strings() -> LoaderResult<()> {
        let parser = DocumentParser::new();
        let (value, _) = parser.parse(b"responses:\n  200:\n    description: ok\n", "mem")?;
        assert_eq!(value["responses"]["200"]["description"], "ok");
        Ok(())
    }

    #[test]
    fn test_invalid_content_reports_yaml_error() {
        let parser = DocumentParser::new();
        let err = parser.parse(b"{ unclosed: [", "broken.yaml").unwrap_err();
        assert!(matches!(err, LoaderError::YamlParseError { .. }));
    }

    #[test]
    fn test_parse_document() -> LoaderResult<()> {
        let parser = DocumentParser::new();
        let document = parser.parse_document(
            b"openapi: 3.0.3\ninfo:\n  title: Pets\n  version: '1'\ncomponents:\n  schemas:\n    Pet:\n      type: object\n",
            "mem",
        )?;
        assert_eq!(document.openapi, "3.0.3");
        assert!(document.schema("Pet").is_some());
        Ok(())
    }

    #[test]
    fn test_unmarshal_error() {
        let parser = DocumentParser::new();
        let err = parser
            .parse_document(br#"{"components": {"schemas": {"A": {"type": "bogus"}}}}"#, "mem")
            .unwrap_err();
        assert!(matches!(err, LoaderError::UnmarshalError { .. }));
    }

    #[test]
    fn test_serialization() -> LoaderResult<()> {
        let parser = DocumentParser::new();
        let value = serde_json::json!({"openapi": "3.1.0", "numbers": [1, 2]});
        assert!(parser.serialize(&value, Format::Json)?.contains("\"openapi\": \"3.1.0\""));
        assert!(parser.serialize(&value, Format::Yaml)?.contains("openapi: 3.1.0"));
        Ok(())
    }
}
