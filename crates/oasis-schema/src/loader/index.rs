//! Location index of typed nodes
//!
//! Every reference slot of every loaded document is registered under its
//! absolute location (`<document url>#<json pointer>`). Inline slots map to
//! the shared node; pointer slots map to an alias that is followed on lookup.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::model::reference::node_id;
use crate::model::{Component, Ref, RefVisitor};
use serde_json::Value;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use url::Url;

/// Escape one JSON pointer segment
pub fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Decode one JSON pointer segment
pub fn unescape_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

/// Append escaped segments to a JSON pointer
pub fn join_pointer(pointer: &str, segments: &[&str]) -> String {
    let mut joined = pointer.to_string();
    for segment in segments {
        joined.push('/');
        joined.push_str(&escape_segment(segment));
    }
    joined
}

/// Absolute location of a JSON pointer inside a document
pub fn location_key(document: &str, pointer: &str) -> String {
    format!("{}#{}", document, pointer)
}

/// Apply a JSON pointer to extract a specific part of a document
pub fn apply_json_pointer<'v>(document: &'v Value, pointer: &str) -> Result<&'v Value, String> {
    if pointer.is_empty() {
        return Ok(document);
    }
    if !pointer.starts_with('/') {
        return Err(format!("'{}' is not a JSON pointer", pointer));
    }

    let mut current = document;
    for segment in pointer.split('/').skip(1) {
        let decoded_segment = unescape_segment(segment);
        current = match current {
            Value::Object(obj) => obj
                .get(&decoded_segment)
                .ok_or_else(|| format!("Property '{}' not found", decoded_segment))?,
            Value::Array(arr) => {
                let index = decoded_segment
                    .parse::<usize>()
                    .map_err(|_| format!("Invalid array index '{}'", decoded_segment))?;
                arr.get(index)
                    .ok_or_else(|| format!("Array index {} out of bounds", index))?
            }
            _ => {
                return Err(format!(
                    "Cannot access property '{}' on non-object/array",
                    decoded_segment
                ))
            }
        };
    }
    Ok(current)
}

/// What a location holds
#[derive(Clone)]
pub(crate) enum IndexEntry {
    /// A shared typed node
    Node(Arc<dyn Any + Send + Sync>),
    /// A pointer slot, resolved against the base of the document it sits in
    Alias { reference: String, base: Url },
}

/// Absolute location to node map shared by one resolution pass
#[derive(Default)]
pub(crate) struct NodeIndex {
    entries: HashMap<String, IndexEntry>,
}

impl NodeIndex {
    pub(crate) fn get(&self, key: &str) -> Option<&IndexEntry> {
        self.entries.get(key)
    }

    /// Register an entry; the first registration of a location wins
    pub(crate) fn insert(&mut self, key: String, entry: IndexEntry) {
        self.entries.entry(key).or_insert(entry);
    }

    pub(crate) fn insert_node<T: Component>(&mut self, key: String, node: &Arc<T>) {
        let erased: Arc<dyn Any + Send + Sync> = Arc::clone(node) as Arc<dyn Any + Send + Sync>;
        self.insert(key, IndexEntry::Node(erased));
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Registers every reference slot below a starting location
pub(crate) struct Indexer<'i> {
    index: &'i mut NodeIndex,
    document: String,
    base: Url,
    pointer: String,
    visited: HashSet<usize>,
}

impl<'i> Indexer<'i> {
    /// Index slots of the document at `base`, starting at JSON pointer `pointer`
    pub(crate) fn new(index: &'i mut NodeIndex, base: &Url, pointer: &str) -> Self {
        let mut document = base.clone();
        document.set_fragment(None);
        Self {
            index,
            document: document.to_string(),
            base: base.clone(),
            pointer: pointer.to_string(),
            visited: HashSet::new(),
        }
    }

    /// Register a node found at the starting location together with its slots
    pub(crate) fn index_node<T: Component>(&mut self, node: &Arc<T>) {
        self.index
            .insert_node(location_key(&self.document, &self.pointer), node);
        if self.visited.insert(node_id(node.as_ref())) {
            let _ = node.traverse(self);
        }
    }
}

impl RefVisitor for Indexer<'_> {
    type Error = std::convert::Infallible;

    fn visit<T: Component>(&mut self, segments: &[&str], node: &Ref<T>) -> Result<(), Self::Error> {
        let pointer = join_pointer(&self.pointer, segments);
        let key = location_key(&self.document, &pointer);
        match node {
            Ref::Pointer(slot) => self.index.insert(
                key,
                IndexEntry::Alias {
                    reference: slot.reference().to_string(),
                    base: self.base.clone(),
                },
            ),
            Ref::Value(value) => {
                self.index.insert_node(key, value);
                if self.visited.insert(node_id(value.as_ref())) {
                    let parent = std::mem::replace(&mut self.pointer, pointer);
                    let result = value.traverse(self);
                    self.pointer = parent;
                    result?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Document, Schema, Traverse};
    use serde_json::json;

    #[test]
    fn test_json_pointer() {
        let document = json!({
            "paths": {"/pets": {"get": {"tags": ["a", "b"]}}},
            "a~b": 1
        });
        assert_eq!(
            apply_json_pointer(&document, "/paths/~1pets/get/tags/1").unwrap(),
            &json!("b")
        );
        assert_eq!(apply_json_pointer(&document, "/a~0b").unwrap(), &json!(1));
        assert_eq!(apply_json_pointer(&document, "").unwrap(), &document);

        let err = apply_json_pointer(&document, "/paths/missing").unwrap_err();
        assert!(err.contains("'missing' not found"));
        assert!(apply_json_pointer(&document, "/paths/~1pets/get/tags/7").is_err());
        assert!(apply_json_pointer(&document, "nope").is_err());
    }

    #[test]
    fn test_segment_escaping() {
        assert_eq!(join_pointer("", &["paths", "/a/{id}", "get"]), "/paths/~1a~1{id}/get");
        assert_eq!(escape_segment("a~/b"), "a~0~1b");
        assert_eq!(unescape_segment("a~0~1b"), "a~/b");
    }

    #[test]
    fn test_indexer_registers_slots() {
        let document: Document = serde_json::from_value(json!({
            "components": {
                "schemas": {
                    "Pet": {"properties": {"tag": {"$ref": "#/components/schemas/Tag"}, "name": {"type": "string"}}},
                    "Tag": {"type": "string"}
                }
            }
        }))
        .unwrap();
        let base = Url::parse("file:///api.yaml").unwrap();
        let mut index = NodeIndex::default();
        document.traverse(&mut Indexer::new(&mut index, &base, "")).unwrap();

        assert!(matches!(
            index.get("file:///api.yaml#/components/schemas/Pet"),
            Some(IndexEntry::Node(_))
        ));
        assert!(matches!(
            index.get("file:///api.yaml#/components/schemas/Pet/properties/tag"),
            Some(IndexEntry::Alias { reference, .. }) if reference == "#/components/schemas/Tag"
        ));
        match index.get("file:///api.yaml#/components/schemas/Pet/properties/name") {
            Some(IndexEntry::Node(node)) => assert!(node.clone().downcast::<Schema>().is_ok()),
            _ => panic!("name should be indexed as a node"),
        }
        assert_eq!(index.len(), 4);
    }
}
