//! Document loading and reference resolution
//!
//! This module provides:
//! - JSON parsing with YAML fallback
//! - Internal and external `$ref` resolution into a shared node graph
//! - Pluggable read functions (files, memory, HTTP)
//! - A thread-safe cache of fetched documents
//! - Internalization of external references into components
//!
//! # Example Usage
//!
//! ```rust
//! use oasis_schema::loader::{Loader, LoaderConfig};
//!
//! let loader = Loader::with_config(LoaderConfig::default().with_external_refs(false));
//! let document = loader.load_from_data(br##"{
//!     "openapi": "3.1.0",
//!     "components": {"schemas": {
//!         "Node": {"type": "object", "properties": {"next": {"$ref": "#/components/schemas/Node"}}}
//!     }}
//! }"##)?;
//! assert!(document.schema("Node").is_some());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

pub mod cache;
pub mod document_loader;
pub mod error;
pub mod fetch;
pub mod index;
pub mod internalize;
pub mod parser;
pub(crate) mod resolver;

pub use cache::{CacheConfig, CacheStats, DocumentCache};
pub use document_loader::{default_base, Loader, LoaderConfig};
pub use error::{LoaderError, LoaderResult};
#[cfg(feature = "http")]
pub use fetch::{read_from_http, HttpReaderConfig};
pub use fetch::{read_from_files, read_from_memory, read_from_uris, ReadFromUri};
pub use index::apply_json_pointer;
pub use internalize::default_ref_name;
pub use parser::{DocumentParser, Format};
