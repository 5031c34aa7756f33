//! Error types for document loading and reference resolution
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use std::path::PathBuf;
use thiserror::Error;

/// Result type for loader operations
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Errors raised while loading a document or resolving its references
#[derive(Error, Debug)]
pub enum LoaderError {
    /// File I/O errors
    #[error("Failed to read file '{path}': {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The read function failed for a location
    #[error("Failed to fetch '{location}': {source}")]
    FetchError {
        location: String,
        #[source]
        source: anyhow::Error,
    },

    /// JSON parsing errors
    #[error("Failed to parse JSON from '{location}': {source}")]
    JsonParseError {
        location: String,
        source: serde_json::Error,
    },

    /// YAML parsing errors
    #[error("Failed to parse YAML from '{location}': {source}")]
    YamlParseError {
        location: String,
        source: serde_yaml::Error,
    },

    /// Parsed content does not fit the object model
    #[error("Failed to unmarshal {what} from '{location}': {source}")]
    UnmarshalError {
        what: String,
        location: String,
        source: serde_json::Error,
    },

    /// A reference that cannot be resolved
    #[error("Failed to resolve reference '{reference}' in '{location}': {reason}")]
    UnresolvedRef {
        reference: String,
        location: String,
        reason: String,
    },

    /// An external reference met a loader that does not allow them
    #[error("Encountered disallowed external reference '{reference}'")]
    ExternalRefDisallowed { reference: String },

    /// A reference string that is not a valid URI reference
    #[error("Invalid reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },

    /// An alias chain that keeps re-entering the same location
    #[error("Circular reference detected: {chain}")]
    CircularReference { chain: String },

    /// Too many nested pointer hops
    #[error("Reference '{reference}' exceeds maximum resolution depth {max_depth}")]
    DepthExceeded { reference: String, max_depth: usize },

    /// An external document brings a component whose name is already taken
    #[error("Component '{name}' in '{kind}' from '{location}' collides with an existing definition")]
    ComponentCollision {
        kind: String,
        name: String,
        location: String,
    },

    /// Rewriting external references into components failed
    #[error("Failed to internalize reference '{reference}': {reason}")]
    InternalizeError { reference: String, reason: String },
}

impl From<std::io::Error> for LoaderError {
    fn from(error: std::io::Error) -> Self {
        Self::IoError {
            path: PathBuf::from("<unknown>"),
            source: error,
        }
    }
}

impl LoaderError {
    /// Create an I/O error with path context
    pub fn io_error(path: PathBuf, error: std::io::Error) -> Self {
        Self::IoError {
            path,
            source: error,
        }
    }

    /// Create a fetch error for a location
    pub fn fetch_error(location: impl Into<String>, error: anyhow::Error) -> Self {
        Self::FetchError {
            location: location.into(),
            source: error,
        }
    }

    /// Create a JSON parsing error with location context
    pub fn json_parse_error(location: impl Into<String>, error: serde_json::Error) -> Self {
        Self::JsonParseError {
            location: location.into(),
            source: error,
        }
    }

    /// Create a YAML parsing error with location context
    pub fn yaml_parse_error(location: impl Into<String>, error: serde_yaml::Error) -> Self {
        Self::YamlParseError {
            location: location.into(),
            source: error,
        }
    }

    /// Create an unmarshal error
    pub fn unmarshal_error(
        what: impl Into<String>,
        location: impl Into<String>,
        error: serde_json::Error,
    ) -> Self {
        Self::UnmarshalError {
            what: what.into(),
            location: location.into(),
            source: error,
        }
    }

    /// Create an unresolved reference error
    pub fn unresolved(
        reference: impl Into<String>,
        location: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::UnresolvedRef {
            reference: reference.into(),
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Create a disallowed external reference error
    pub fn external_disallowed(reference: impl Into<String>) -> Self {
        Self::ExternalRefDisallowed {
            reference: reference.into(),
        }
    }

    /// Create an invalid reference error
    pub fn invalid_reference(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidReference {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    /// Create a circular reference error from the chain of references
    pub fn circular_reference<S: AsRef<str>>(chain: &[S]) -> Self {
        let chain = chain
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join(" -> ");
        Self::CircularReference { chain }
    }

    /// Create a depth exceeded error
    pub fn depth_exceeded(reference: impl Into<String>, max_depth: usize) -> Self {
        Self::DepthExceeded {
            reference: reference.into(),
            max_depth,
        }
    }

    /// Create a component collision error
    pub fn collision(kind: impl Into<String>, name: impl Into<String>, location: impl Into<String>) -> Self {
        Self::ComponentCollision {
            kind: kind.into(),
            name: name.into(),
            location: location.into(),
        }
    }

    /// Create an internalization error
    pub fn internalize_error(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InternalizeError {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    /// The reference string this error is about, if any
    pub fn reference(&self) -> Option<&str> {
        match self {
            Self::UnresolvedRef { reference, .. }
            | Self::ExternalRefDisallowed { reference }
            | Self::InvalidReference { reference, .. }
            | Self::DepthExceeded { reference, .. }
            | Self::InternalizeError { reference, .. } => Some(reference),
            Self::FetchError { location, .. } => Some(location),
            _ => None,
        }
    }

    /// Check if this error comes from the content rather than from resolution
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::JsonParseError { .. } | Self::YamlParseError { .. } | Self::UnmarshalError { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let path = PathBuf::from("api.yaml");

        let io_err = LoaderError::io_error(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "File not found"),
        );
        assert!(matches!(io_err, LoaderError::IoError { .. }));

        let circular_err = LoaderError::circular_reference(&["#/a", "#/b", "#/a"]);
        assert_eq!(
            circular_err.to_string(),
            "Circular reference detected: #/a -> #/b -> #/a"
        );
    }

    #[test]
    fn test_errors_embed_reference() {
        let err = LoaderError::unresolved("#/components/schemas/Missing", "file:///api.yaml", "not found");
        assert_eq!(err.reference(), Some("#/components/schemas/Missing"));
        assert!(err.to_string().contains("#/components/schemas/Missing"));

        let err = LoaderError::external_disallowed("other.yaml#/Pet");
        assert!(err.to_string().contains("other.yaml#/Pet"));

        let err = LoaderError::fetch_error("http://example.com/a.yaml", anyhow::anyhow!("status 404"));
        assert!(err.to_string().contains("status 404"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_parse_error_classification() {
        let parse_err = LoaderError::yaml_parse_error(
            "api.yaml",
            serde_yaml::from_str::<serde_yaml::Value>("{").unwrap_err(),
        );
        assert!(parse_err.is_parse_error());
        assert!(!LoaderError::depth_exceeded("#/a", 3).is_parse_error());
    }
}
