//! Object model of a document: schema nodes, reference nodes and containers
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

pub mod components;
pub mod document;
pub mod reference;
pub mod schema;
mod schema_repr;
pub mod traverse;

pub use components::Components;
pub use document::{
    Document, Example, ExternalDocs, Header, Info, MediaType, Operation, Parameter, PathItem,
    RequestBody, Response,
};
pub use reference::{Pointer, Ref};
pub use schema::{
    AdditionalProperties, Bound, Discriminator, NullStyle, Schema, SchemaType, Types,
};
pub use traverse::{Component, RefRewriter, RefVisitor, RewriteRefs, Traverse};
