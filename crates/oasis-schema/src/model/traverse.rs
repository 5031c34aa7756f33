//! Generic walks over reference slots
//!
//! Every type that owns reference nodes implements [`Traverse`] (read-only
//! visit of its direct `Ref` slots) and [`RewriteRefs`] (copy with rewritten
//! slots). Visitors decide whether to descend into a slot's value, which
//! keeps cycle handling in one place per walk instead of per type.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::model::components::Components;
use crate::model::document::{
    Document, Example, Header, MediaType, Operation, Parameter, PathItem, RequestBody, Response,
};
use crate::model::reference::Ref;
use crate::model::schema::{AdditionalProperties, Schema};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A kind of node that may live under `#/components/<KIND>/<name>`
pub trait Component:
    Traverse + RewriteRefs + Serialize + DeserializeOwned + Clone + PartialEq + fmt::Debug + Send + Sync + 'static
{
    /// Section name under `#/components/`
    const KIND: &'static str;

    fn collection(components: &Components) -> &BTreeMap<String, Ref<Self>>;

    fn collection_mut(components: &mut Components) -> &mut BTreeMap<String, Ref<Self>>;
}

/// Read-only walk over the direct reference slots of a node
pub trait Traverse {
    fn traverse<V: RefVisitor>(&self, visitor: &mut V) -> Result<(), V::Error>;
}

/// Receives each reference slot together with its JSON-pointer segments
/// relative to the node being traversed
pub trait RefVisitor {
    type Error;

    fn visit<T: Component>(&mut self, segments: &[&str], node: &Ref<T>) -> Result<(), Self::Error>;
}

/// Copy a node, replacing each of its direct reference slots
pub trait RewriteRefs: Sized {
    fn rewrite_refs<R: RefRewriter>(&self, rewriter: &mut R) -> Result<Self, R::Error>;
}

/// Produces the replacement for one reference slot
pub trait RefRewriter {
    type Error;

    fn rewrite<T: Component>(&mut self, node: &Ref<T>) -> Result<Ref<T>, Self::Error>;
}

/// Forwards visits with a fixed prefix prepended to the segments
struct Prefixed<'p, 'v, V> {
    prefix: &'p [&'p str],
    inner: &'v mut V,
}

impl<V: RefVisitor> RefVisitor for Prefixed<'_, '_, V> {
    type Error = V::Error;

    fn visit<T: Component>(&mut self, segments: &[&str], node: &Ref<T>) -> Result<(), Self::Error> {
        let mut full: Vec<&str> = self.prefix.to_vec();
        full.extend_from_slice(segments);
        self.inner.visit(&full, node)
    }
}

fn visit_at<T: Component, V: RefVisitor>(
    visitor: &mut V,
    prefix: &[&str],
    key: &str,
    node: &Ref<T>,
) -> Result<(), V::Error> {
    let mut segments: Vec<&str> = prefix.to_vec();
    segments.push(key);
    visitor.visit(&segments, node)
}

fn visit_list<T: Component, V: RefVisitor>(
    visitor: &mut V,
    prefix: &[&str],
    nodes: &[Ref<T>],
) -> Result<(), V::Error> {
    for (index, node) in nodes.iter().enumerate() {
        visit_at(visitor, prefix, &index.to_string(), node)?;
    }
    Ok(())
}

fn visit_map<T: Component, V: RefVisitor>(
    visitor: &mut V,
    prefix: &[&str],
    nodes: &BTreeMap<String, Ref<T>>,
) -> Result<(), V::Error> {
    for (key, node) in nodes {
        visit_at(visitor, prefix, key, node)?;
    }
    Ok(())
}

fn visit_content<V: RefVisitor>(
    visitor: &mut V,
    key: &str,
    content: &BTreeMap<String, MediaType>,
) -> Result<(), V::Error> {
    for (media_type, media) in content {
        let prefix = [key, media_type.as_str()];
        media.traverse(&mut Prefixed {
            prefix: &prefix,
            inner: &mut *visitor,
        })?;
    }
    Ok(())
}

fn rewrite_list<T: Component, R: RefRewriter>(
    rewriter: &mut R,
    nodes: &[Ref<T>],
) -> Result<Vec<Ref<T>>, R::Error> {
    nodes.iter().map(|node| rewriter.rewrite(node)).collect()
}

fn rewrite_map<T: Component, R: RefRewriter>(
    rewriter: &mut R,
    nodes: &BTreeMap<String, Ref<T>>,
) -> Result<BTreeMap<String, Ref<T>>, R::Error> {
    nodes
        .iter()
        .map(|(key, node)| Ok((key.clone(), rewriter.rewrite(node)?)))
        .collect()
}

fn rewrite_option<T: Component, R: RefRewriter>(
    rewriter: &mut R,
    node: &Option<Ref<T>>,
) -> Result<Option<Ref<T>>, R::Error> {
    node.as_ref().map(|node| rewriter.rewrite(node)).transpose()
}

fn rewrite_content<R: RefRewriter>(
    rewriter: &mut R,
    content: &BTreeMap<String, MediaType>,
) -> Result<BTreeMap<String, MediaType>, R::Error> {
    content
        .iter()
        .map(|(key, media)| Ok((key.clone(), media.rewrite_refs(rewriter)?)))
        .collect()
}

macro_rules! component {
    ($ty:ty, $kind:literal, $field:ident) => {
        impl Component for $ty {
            const KIND: &'static str = $kind;

            fn collection(components: &Components) -> &BTreeMap<String, Ref<Self>> {
                &components.$field
            }

            fn collection_mut(components: &mut Components) -> &mut BTreeMap<String, Ref<Self>> {
                &mut components.$field
            }
        }
    };
}

component!(Schema, "schemas", schemas);
component!(Parameter, "parameters", parameters);
component!(Header, "headers", headers);
component!(RequestBody, "requestBodies", request_bodies);
component!(Response, "responses", responses);
component!(Example, "examples", examples);

impl Traverse for Schema {
    fn traverse<V: RefVisitor>(&self, visitor: &mut V) -> Result<(), V::Error> {
        visit_list(visitor, &["oneOf"], &self.one_of)?;
        visit_list(visitor, &["anyOf"], &self.any_of)?;
        visit_list(visitor, &["allOf"], &self.all_of)?;
        if let Some(not) = &self.not {
            visitor.visit(&["not"], not)?;
        }
        if let Some(items) = &self.items {
            visitor.visit(&["items"], items)?;
        }
        visit_list(visitor, &["prefixItems"], &self.prefix_items)?;
        if let Some(contains) = &self.contains {
            visitor.visit(&["contains"], contains)?;
        }
        visit_map(visitor, &["properties"], &self.properties)?;
        if let Some(AdditionalProperties::Schema(schema)) = &self.additional_properties {
            visitor.visit(&["additionalProperties"], schema)?;
        }
        if let Some(names) = &self.property_names {
            visitor.visit(&["propertyNames"], names)?;
        }
        Ok(())
    }
}

impl RewriteRefs for Schema {
    fn rewrite_refs<R: RefRewriter>(&self, rewriter: &mut R) -> Result<Self, R::Error> {
        let mut schema = self.clone();
        schema.one_of = rewrite_list(rewriter, &self.one_of)?;
        schema.any_of = rewrite_list(rewriter, &self.any_of)?;
        schema.all_of = rewrite_list(rewriter, &self.all_of)?;
        schema.not = rewrite_option(rewriter, &self.not)?;
        schema.items = rewrite_option(rewriter, &self.items)?;
        schema.prefix_items = rewrite_list(rewriter, &self.prefix_items)?;
        schema.contains = rewrite_option(rewriter, &self.contains)?;
        schema.properties = rewrite_map(rewriter, &self.properties)?;
        if let Some(AdditionalProperties::Schema(node)) = &self.additional_properties {
            schema.additional_properties = Some(AdditionalProperties::Schema(rewriter.rewrite(node)?));
        }
        schema.property_names = rewrite_option(rewriter, &self.property_names)?;
        Ok(schema)
    }
}

impl Traverse for MediaType {
    fn traverse<V: RefVisitor>(&self, visitor: &mut V) -> Result<(), V::Error> {
        if let Some(schema) = &self.schema {
            visitor.visit(&["schema"], schema)?;
        }
        visit_map(visitor, &["examples"], &self.examples)
    }
}

impl RewriteRefs for MediaType {
    fn rewrite_refs<R: RefRewriter>(&self, rewriter: &mut R) -> Result<Self, R::Error> {
        let mut media = self.clone();
        media.schema = rewrite_option(rewriter, &self.schema)?;
        media.examples = rewrite_map(rewriter, &self.examples)?;
        Ok(media)
    }
}

impl Traverse for Parameter {
    fn traverse<V: RefVisitor>(&self, visitor: &mut V) -> Result<(), V::Error> {
        if let Some(schema) = &self.schema {
            visitor.visit(&["schema"], schema)?;
        }
        visit_map(visitor, &["examples"], &self.examples)?;
        visit_content(visitor, "content", &self.content)
    }
}

impl RewriteRefs for Parameter {
    fn rewrite_refs<R: RefRewriter>(&self, rewriter: &mut R) -> Result<Self, R::Error> {
        let mut parameter = self.clone();
        parameter.schema = rewrite_option(rewriter, &self.schema)?;
        parameter.examples = rewrite_map(rewriter, &self.examples)?;
        parameter.content = rewrite_content(rewriter, &self.content)?;
        Ok(parameter)
    }
}

impl Traverse for Header {
    fn traverse<V: RefVisitor>(&self, visitor: &mut V) -> Result<(), V::Error> {
        if let Some(schema) = &self.schema {
            visitor.visit(&["schema"], schema)?;
        }
        visit_map(visitor, &["examples"], &self.examples)?;
        visit_content(visitor, "content", &self.content)
    }
}

impl RewriteRefs for Header {
    fn rewrite_refs<R: RefRewriter>(&self, rewriter: &mut R) -> Result<Self, R::Error> {
        let mut header = self.clone();
        header.schema = rewrite_option(rewriter, &self.schema)?;
        header.examples = rewrite_map(rewriter, &self.examples)?;
        header.content = rewrite_content(rewriter, &self.content)?;
        Ok(header)
    }
}

impl Traverse for RequestBody {
    fn traverse<V: RefVisitor>(&self, visitor: &mut V) -> Result<(), V::Error> {
        visit_content(visitor, "content", &self.content)
    }
}

impl RewriteRefs for RequestBody {
    fn rewrite_refs<R: RefRewriter>(&self, rewriter: &mut R) -> Result<Self, R::Error> {
        let mut body = self.clone();
        body.content = rewrite_content(rewriter, &self.content)?;
        Ok(body)
    }
}

impl Traverse for Response {
    fn traverse<V: RefVisitor>(&self, visitor: &mut V) -> Result<(), V::Error> {
        visit_map(visitor, &["headers"], &self.headers)?;
        visit_content(visitor, "content", &self.content)
    }
}

impl RewriteRefs for Response {
    fn rewrite_refs<R: RefRewriter>(&self, rewriter: &mut R) -> Result<Self, R::Error> {
        let mut response = self.clone();
        response.headers = rewrite_map(rewriter, &self.headers)?;
        response.content = rewrite_content(rewriter, &self.content)?;
        Ok(response)
    }
}

impl Traverse for Example {
    fn traverse<V: RefVisitor>(&self, _visitor: &mut V) -> Result<(), V::Error> {
        Ok(())
    }
}

impl RewriteRefs for Example {
    fn rewrite_refs<R: RefRewriter>(&self, _rewriter: &mut R) -> Result<Self, R::Error> {
        Ok(self.clone())
    }
}

impl Traverse for Operation {
    fn traverse<V: RefVisitor>(&self, visitor: &mut V) -> Result<(), V::Error> {
        visit_list(visitor, &["parameters"], &self.parameters)?;
        if let Some(body) = &self.request_body {
            visitor.visit(&["requestBody"], body)?;
        }
        visit_map(visitor, &["responses"], &self.responses)
    }
}

impl RewriteRefs for Operation {
    fn rewrite_refs<R: RefRewriter>(&self, rewriter: &mut R) -> Result<Self, R::Error> {
        let mut operation = self.clone();
        operation.parameters = rewrite_list(rewriter, &self.parameters)?;
        operation.request_body = rewrite_option(rewriter, &self.request_body)?;
        operation.responses = rewrite_map(rewriter, &self.responses)?;
        Ok(operation)
    }
}

impl Traverse for PathItem {
    fn traverse<V: RefVisitor>(&self, visitor: &mut V) -> Result<(), V::Error> {
        visit_list(visitor, &["parameters"], &self.parameters)?;
        for (method, operation) in self.operations() {
            let prefix = [method];
            operation.traverse(&mut Prefixed {
                prefix: &prefix,
                inner: &mut *visitor,
            })?;
        }
        Ok(())
    }
}

impl RewriteRefs for PathItem {
    fn rewrite_refs<R: RefRewriter>(&self, rewriter: &mut R) -> Result<Self, R::Error> {
        let mut item = self.clone();
        item.parameters = rewrite_list(rewriter, &self.parameters)?;
        for operation in item.operations_mut() {
            *operation = operation.rewrite_refs(rewriter)?;
        }
        Ok(item)
    }
}

impl Traverse for Components {
    fn traverse<V: RefVisitor>(&self, visitor: &mut V) -> Result<(), V::Error> {
        visit_map(visitor, &[Schema::KIND], &self.schemas)?;
        visit_map(visitor, &[Parameter::KIND], &self.parameters)?;
        visit_map(visitor, &[Header::KIND], &self.headers)?;
        visit_map(visitor, &[RequestBody::KIND], &self.request_bodies)?;
        visit_map(visitor, &[Response::KIND], &self.responses)?;
        visit_map(visitor, &[Example::KIND], &self.examples)
    }
}

impl RewriteRefs for Components {
    fn rewrite_refs<R: RefRewriter>(&self, rewriter: &mut R) -> Result<Self, R::Error> {
        let mut components = self.clone();
        components.schemas = rewrite_map(rewriter, &self.schemas)?;
        components.parameters = rewrite_map(rewriter, &self.parameters)?;
        components.headers = rewrite_map(rewriter, &self.headers)?;
        components.request_bodies = rewrite_map(rewriter, &self.request_bodies)?;
        components.responses = rewrite_map(rewriter, &self.responses)?;
        components.examples = rewrite_map(rewriter, &self.examples)?;
        Ok(components)
    }
}

impl Traverse for Document {
    fn traverse<V: RefVisitor>(&self, visitor: &mut V) -> Result<(), V::Error> {
        for (path, item) in &self.paths {
            let prefix = ["paths", path.as_str()];
            item.traverse(&mut Prefixed {
                prefix: &prefix,
                inner: &mut *visitor,
            })?;
        }
        let prefix = ["components"];
        self.components.traverse(&mut Prefixed {
            prefix: &prefix,
            inner: visitor,
        })
    }
}

impl RewriteRefs for Document {
    fn rewrite_refs<R: RefRewriter>(&self, rewriter: &mut R) -> Result<Self, R::Error> {
        let mut document = self.clone();
        for item in document.paths.values_mut() {
            *item = item.rewrite_refs(rewriter)?;
        }
        document.components = self.components.rewrite_refs(rewriter)?;
        Ok(document)
    }
}
