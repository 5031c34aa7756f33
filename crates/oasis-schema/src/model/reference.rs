//! Reference nodes: either a `$ref` pointer or an inline value
//!
//! Every place a document embeds a schema, parameter, response, header,
//! request body or example holds a [`Ref`]. A pointer carries a write-once
//! target slot that the resolver fills with a shared node, so cyclic
//! documents alias their targets instead of copying them.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use serde::de::{DeserializeOwned, Error as _};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// A `$ref` pointer together with its resolved target
pub struct Pointer<T> {
    reference: String,
    target: OnceLock<Arc<T>>,
}

impl<T> Pointer<T> {
    /// Create an unresolved pointer
    pub fn new<S: Into<String>>(reference: S) -> Self {
        Self {
            reference: reference.into(),
            target: OnceLock::new(),
        }
    }

    /// The reference string exactly as written in the document
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// The resolved target, if resolution has reached this pointer
    pub fn target(&self) -> Option<&Arc<T>> {
        self.target.get()
    }

    /// Attach a resolved target. The first target wins; later calls are ignored.
    pub(crate) fn set_target(&self, target: Arc<T>) {
        let _ = self.target.set(target);
    }

    /// Whether the reference points into another document
    pub fn is_external(&self) -> bool {
        !self.reference.starts_with('#')
    }
}

impl<T> Clone for Pointer<T> {
    fn clone(&self) -> Self {
        let target = OnceLock::new();
        if let Some(resolved) = self.target.get() {
            let _ = target.set(Arc::clone(resolved));
        }
        Self {
            reference: self.reference.clone(),
            target,
        }
    }
}

/// A reference-or-value node
pub enum Ref<T> {
    /// `{"$ref": "..."}`
    Pointer(Pointer<T>),
    /// An inline value
    Value(Arc<T>),
}

impl<T> Ref<T> {
    /// Create an unresolved pointer node
    pub fn pointer<S: Into<String>>(reference: S) -> Self {
        Ref::Pointer(Pointer::new(reference))
    }

    /// Create an inline node
    pub fn new(value: T) -> Self {
        Ref::Value(Arc::new(value))
    }

    /// Create a pointer node whose target is already known
    pub fn resolved<S: Into<String>>(reference: S, target: Arc<T>) -> Self {
        let pointer = Pointer::new(reference);
        pointer.set_target(target);
        Ref::Pointer(pointer)
    }

    /// The reference string when this node is a pointer
    pub fn reference(&self) -> Option<&str> {
        match self {
            Ref::Pointer(pointer) => Some(pointer.reference()),
            Ref::Value(_) => None,
        }
    }

    /// The shared node behind this reference: the inline value or the resolved target
    pub fn arc(&self) -> Option<&Arc<T>> {
        match self {
            Ref::Pointer(pointer) => pointer.target(),
            Ref::Value(value) => Some(value),
        }
    }

    /// The value behind this reference, if available
    pub fn value(&self) -> Option<&T> {
        self.arc().map(|arc| arc.as_ref())
    }

    /// Whether the value is available (inline, or a resolved pointer)
    pub fn is_resolved(&self) -> bool {
        self.arc().is_some()
    }

    /// Whether this node is a pointer into another document
    pub fn is_external(&self) -> bool {
        matches!(self, Ref::Pointer(pointer) if pointer.is_external())
    }
}

/// Identity of a shared node, used by every graph walk to detect revisits
pub(crate) fn node_id<T>(node: &T) -> usize {
    node as *const T as usize
}

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        match self {
            Ref::Pointer(pointer) => Ref::Pointer(pointer.clone()),
            Ref::Value(value) => Ref::Value(Arc::clone(value)),
        }
    }
}

impl<T> From<T> for Ref<T> {
    fn from(value: T) -> Self {
        Ref::new(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Never print the target: it may lead back to an ancestor.
            Ref::Pointer(pointer) => f
                .debug_struct("Pointer")
                .field("reference", &pointer.reference)
                .field("resolved", &pointer.target.get().is_some())
                .finish(),
            Ref::Value(value) => value.as_ref().fmt(f),
        }
    }
}

impl<T: PartialEq> PartialEq for Ref<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Ref::Pointer(a), Ref::Pointer(b)) => a.reference == b.reference,
            (Ref::Value(a), Ref::Value(b)) => Arc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }
}

impl<T: Serialize> Serialize for Ref<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Ref::Pointer(pointer) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("$ref", &pointer.reference)?;
                map.end()
            }
            Ref::Value(value) => value.as_ref().serialize(serializer),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Ref<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        if let Some(reference) = raw.get("$ref").and_then(Value::as_str) {
            return Ok(Ref::pointer(reference));
        }
        serde_json::from_value(raw)
            .map(Ref::new)
            .map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Leaf {
        name: String,
    }

    #[test]
    fn test_pointer_round_trip() {
        let parsed: Ref<Leaf> = serde_json::from_value(json!({"$ref": "#/components/schemas/Leaf"})).unwrap();
        assert_eq!(parsed.reference(), Some("#/components/schemas/Leaf"));
        assert!(!parsed.is_resolved());
        assert_eq!(
            serde_json::to_value(&parsed).unwrap(),
            json!({"$ref": "#/components/schemas/Leaf"})
        );
    }

    #[test]
    fn test_inline_value() {
        let parsed: Ref<Leaf> = serde_json::from_value(json!({"name": "a"})).unwrap();
        assert_eq!(parsed.value(), Some(&Leaf { name: "a".to_string() }));
        assert_eq!(parsed.reference(), None);
    }

    #[test]
    fn test_target_is_write_once_and_shared() {
        let target = Arc::new(Leaf { name: "x".to_string() });
        let node: Ref<Leaf> = Ref::pointer("other.yaml#/Leaf");
        assert!(node.is_external());
        if let Ref::Pointer(pointer) = &node {
            pointer.set_target(Arc::clone(&target));
            pointer.set_target(Arc::new(Leaf { name: "y".to_string() }));
        }
        assert!(Arc::ptr_eq(node.arc().unwrap(), &target));

        let copy = node.clone();
        assert!(Arc::ptr_eq(copy.arc().unwrap(), &target));
    }

    #[test]
    fn test_debug_does_not_follow_targets() {
        let node: Ref<Leaf> = Ref::resolved("#/a", Arc::new(Leaf { name: "deep".to_string() }));
        let rendered = format!("{:?}", node);
        assert!(rendered.contains("#/a"));
        assert!(!rendered.contains("deep"));
    }
}
