//! Value and document validation
//!
//! Values are validated against a schema node by one of two engines:
//!
//! - **Built-in**: walks the schema graph directly, supports both dialects
//!   and produces the richest error messages
//! - **Conformant**: translates the node into a JSON Schema 2020-12 tree and
//!   delegates to the `jsonschema` crate, falling back to the built-in engine
//!   when translation or compilation fails
//!
//! The engine is selected through [`ValidationSettings`]. Structural checks of
//! the document itself live in [`document`].
//!
//! # Example Usage
//!
//! ```rust
//! use oasis_schema::model::Schema;
//! use oasis_schema::validation::{ValidationMode, ValidationSettings};
//! use serde_json::json;
//!
//! let user = Schema::new_object()
//!     .with_property("id", Schema::new_int64().with_read_only(true))
//!     .with_property("name", Schema::new_string().with_min_length(1))
//!     .with_required(["id", "name"]);
//!
//! let request = ValidationSettings::new().with_mode(ValidationMode::Request);
//! assert!(user.validate_value(&json!({"name": "Ada"}), &request).is_ok());
//! assert!(user.validate_value(&json!({"id": 1, "name": "Ada"}), &request).is_err());
//! ```
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

pub mod builtin;
pub mod conformant;
pub mod document;
pub mod engine;
pub mod error;
pub mod formats;
pub mod settings;

pub use builtin::BuiltInEngine;
pub use conformant::{translate, ConformantEngine};
pub use document::{DocumentError, DocumentResult, DocumentValidationOptions};
pub use engine::{engine_for, validate, ValidationEngine};
pub use error::{MultiError, SchemaError, ValidationError, ValidationResult};
pub use formats::{FormatCallback, FormatRegistry, StringFormat};
pub use settings::{json_equal, Engine, PatternPolicy, UniqueItemsComparator, ValidationMode, ValidationSettings};
