//! Document loader: parsing plus reference resolution
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::loader::cache::{CacheConfig, CacheStats, DocumentCache};
use crate::loader::error::{LoaderError, LoaderResult};
use crate::loader::fetch::{read_from_uris, ReadFromUri};
use crate::loader::parser::DocumentParser;
use crate::loader::resolver::{merge_external_components, ResolveState};
use crate::model::Document;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Configuration for document loader behavior
#[derive(Clone)]
pub struct LoaderConfig {
    /// Whether references into other documents are followed
    pub allow_external_refs: bool,
    /// How often one location may re-enter a chain of pointer hops
    pub circular_reference_counter: usize,
    /// Maximum number of nested pointer hops for one reference
    pub max_resolution_depth: usize,
    /// Whether components of external full documents are merged into the root
    pub merge_external_components: bool,
    /// Function used to fetch external documents
    pub read_from_uri: ReadFromUri,
    /// Cache configuration for fetched documents
    pub cache: CacheConfig,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            allow_external_refs: false,
            circular_reference_counter: 3,
            max_resolution_depth: 128,
            merge_external_components: true,
            read_from_uri: read_from_uris(),
            cache: CacheConfig::default(),
        }
    }
}

impl fmt::Debug for LoaderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderConfig")
            .field("allow_external_refs", &self.allow_external_refs)
            .field("circular_reference_counter", &self.circular_reference_counter)
            .field("max_resolution_depth", &self.max_resolution_depth)
            .field("merge_external_components", &self.merge_external_components)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl LoaderConfig {
    pub fn with_external_refs(mut self, allow: bool) -> Self {
        self.allow_external_refs = allow;
        self
    }

    pub fn with_circular_reference_counter(mut self, counter: usize) -> Self {
        self.circular_reference_counter = counter;
        self
    }

    pub fn with_max_resolution_depth(mut self, depth: usize) -> Self {
        self.max_resolution_depth = depth;
        self
    }

    pub fn with_merge_external_components(mut self, merge: bool) -> Self {
        self.merge_external_components = merge;
        self
    }

    pub fn with_read_from_uri(mut self, read: ReadFromUri) -> Self {
        self.read_from_uri = read;
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }
}

/// Loads documents and resolves their references.
/// All methods take `&self`; one loader may be shared across threads.
#[derive(Debug)]
pub struct Loader {
    config: LoaderConfig,
    cache: DocumentCache,
    parser: DocumentParser,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    /// Create a new loader with default configuration
    pub fn new() -> Self {
        Self::with_config(LoaderConfig::default())
    }

    /// Create a new loader with custom configuration
    pub fn with_config(config: LoaderConfig) -> Self {
        Self {
            cache: DocumentCache::with_config(config.cache.clone()),
            parser: DocumentParser::new(),
            config,
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub(crate) fn parser(&self) -> &DocumentParser {
        &self.parser
    }

    /// Get statistics of the fetched-document cache
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Forget every fetched document
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Load a document from a file and resolve its references
    pub fn load_from_file(&self, path: &Path) -> LoaderResult<Document> {
        let data = std::fs::read(path).map_err(|e| LoaderError::io_error(path.to_path_buf(), e))?;
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|e| LoaderError::io_error(path.to_path_buf(), e))?
                .join(path)
        };
        let location = Url::from_file_path(&absolute).map_err(|_| {
            LoaderError::invalid_reference(absolute.display().to_string(), "not an absolute file path")
        })?;
        self.load_from_data_with_location(&data, &location)
    }

    /// Load a document from bytes, relative references resolve against the working directory
    pub fn load_from_data(&self, data: &[u8]) -> LoaderResult<Document> {
        let mut document = self.parser.parse_document(data, "<data>")?;
        self.resolve_refs_in(&mut document, None)?;
        Ok(document)
    }

    /// Load a document from bytes that live at `location`
    pub fn load_from_data_with_location(&self, data: &[u8], location: &Url) -> LoaderResult<Document> {
        let mut document = self.parser.parse_document(data, location.as_str())?;
        self.resolve_refs_in(&mut document, Some(location))?;
        Ok(document)
    }

    /// Fetch a document with the read function and resolve its references
    pub fn load_from_uri(&self, location: &Url) -> LoaderResult<Document> {
        let data = (self.config.read_from_uri)(location)
            .map_err(|e| LoaderError::fetch_error(location.as_str(), e))?;
        self.load_from_data_with_location(&data, location)
    }

    /// Resolve every reference of a document in place.
    ///
    /// The base location is `location`, else the document's own location,
    /// else the working directory. Components of external full documents
    /// are merged into the document when configured.
    pub fn resolve_refs_in(&self, document: &mut Document, location: Option<&Url>) -> LoaderResult<()> {
        let base = match location.or(document.location.as_ref()) {
            Some(location) => location.clone(),
            None => default_base()?,
        };

        let external = {
            let mut state = ResolveState::new(self, document, &base);
            state.run(&base)?;
            state.into_external_documents()
        };

        if self.config.merge_external_components && !external.is_empty() {
            debug!(documents = external.len(), "merging external components");
            merge_external_components(&mut document.components, &external)?;
        }
        document.location = Some(base);
        Ok(())
    }

    /// Fetch and parse an external document, going through the cache
    pub(crate) fn fetch(&self, location: &Url) -> LoaderResult<Arc<Value>> {
        if let Some(cached) = self.cache.get(location) {
            return Ok(cached);
        }
        let data = (self.config.read_from_uri)(location)
            .map_err(|e| LoaderError::fetch_error(location.as_str(), e))?;
        let (value, format) = self.parser.parse(&data, location.as_str())?;
        debug!(location = %location, ?format, "parsed external document");

        let value = Arc::new(value);
        self.cache.put(location, Arc::clone(&value));
        Ok(value)
    }
}

/// The working directory as a directory URL, or `file:///`
pub fn default_base() -> LoaderResult<Url> {
    if let Some(base) = std::env::current_dir()
        .ok()
        .and_then(|dir| Url::from_directory_path(dir).ok())
    {
        return Ok(base);
    }
    Url::parse("file:///").map_err(|e| LoaderError::invalid_reference("file:///", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::fetch::read_from_memory;

    #[test]
    fn test_loader_config_builders() {
        let config = LoaderConfig::default()
            .with_external_refs(true)
            .with_circular_reference_counter(5)
            .with_max_resolution_depth(16);
        assert!(config.allow_external_refs);
        assert_eq!(config.circular_reference_counter, 5);
        assert_eq!(config.max_resolution_depth, 16);
        assert!(config.merge_external_components);

        let rendered = format!("{:?}", config);
        assert!(rendered.contains("circular_reference_counter: 5"));
    }

    #[test]
    fn test_internal_refs_resolve() -> LoaderResult<()> {
        let loader = Loader::new();
        let document = loader.load_from_data(
            br##"{
                "openapi": "3.0.3",
                "components": {
                    "schemas": {
                        "Pet": {"type": "object", "properties": {"tag": {"$ref": "#/components/schemas/Tag"}}},
                        "Tag": {"type": "string"}
                    }
                }
            }"##,
        )?;
        let pet = document.schema("Pet").unwrap();
        let tag = pet.properties["tag"].value().unwrap();
        assert!(Arc::ptr_eq(
            pet.properties["tag"].arc().unwrap(),
            document.components.schemas["Tag"].arc().unwrap()
        ));
        assert_eq!(tag.types.single_kind(), Some(crate::model::SchemaType::String));
        Ok(())
    }

    #[test]
    fn test_missing_ref_names_reference() {
        let loader = Loader::new();
        let err = loader
            .load_from_data(br##"{"components": {"schemas": {"A": {"$ref": "#/components/schemas/Nope"}}}}"##)
            .unwrap_err();
        assert!(matches!(err, LoaderError::UnresolvedRef { .. }));
        assert!(err.to_string().contains("#/components/schemas/Nope"));
    }

    #[test]
    fn test_fetch_uses_cache() -> LoaderResult<()> {
        let loader = Loader::with_config(
            LoaderConfig::default().with_read_from_uri(read_from_memory([("file:///a.yaml", "x: 1")])),
        );
        let location = Url::parse("file:///a.yaml").unwrap();
        loader.fetch(&location)?;
        loader.fetch(&location)?;
        let stats = loader.cache_stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.total_entries, 1);
        Ok(())
    }
}
