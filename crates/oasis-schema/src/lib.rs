//! Oasis Schema - OpenAPI-style document model, `$ref` resolver and validator
//!
//! This crate parses interface description documents (JSON, with a YAML
//! fallback) into an object graph, resolves internal and external `$ref`
//! pointers into that graph, and validates JSON values against its schemas.
//!
//! ## Features
//!
//! - **Two dialects, one model**: OpenAPI 3.0 `nullable` and boolean exclusive
//!   bounds, and OpenAPI 3.1 / JSON Schema 2020-12 type arrays and numeric
//!   exclusive bounds
//! - **Reference resolution**: local, file and (feature `http`) network
//!   references, circular references included
//! - **Internalization**: rewrite external references into components
//! - **Two validation engines**: a built-in validator and a JSON Schema
//!   2020-12 conformant one, selected per call
//! - **Schema merge**: flatten `allOf` compositions
//! - **Structural validation**: check the document itself
//!
//! ## Quick Start
//!
//! ```rust
//! use oasis_schema::{Loader, ValidationSettings};
//! use serde_json::json;
//!
//! let document = Loader::new().load_from_data(br##"
//! openapi: 3.0.3
//! info: {title: Pets, version: "1.0"}
//! paths: {}
//! components:
//!   schemas:
//!     Pet:
//!       type: object
//!       required: [name]
//!       properties:
//!         name: {type: string}
//!         tag: {type: string, nullable: true}
//! "##)?;
//!
//! let pet = document.schema("Pet").expect("declared above");
//! let settings = ValidationSettings::default();
//! assert!(pet.validate_value(&json!({"name": "Rex", "tag": null}), &settings).is_ok());
//!
//! match pet.validate_value(&json!({"tag": "dog"}), &settings) {
//!     Ok(_) => println!("valid pet"),
//!     Err(e) => println!("validation error: {}", e),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

pub mod loader;
pub mod merge;
pub mod model;
pub mod validation;

// Re-export commonly used types for convenience
pub use loader::{Loader, LoaderConfig, LoaderError, LoaderResult};
pub use merge::{merge, MergeError};
pub use model::{Document, Ref, Schema, SchemaType, Types};
pub use validation::{
    validate, DocumentError, DocumentValidationOptions, Engine, FormatRegistry, ValidationError,
    ValidationMode, ValidationResult, ValidationSettings,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
