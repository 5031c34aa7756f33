//! Rewriting external references into local components
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::loader::document_loader::Loader;
use crate::loader::error::{LoaderError, LoaderResult};
use crate::loader::index::escape_segment;
use crate::model::reference::node_id;
use crate::model::{Component, Components, Document, Ref, RefRewriter, RewriteRefs};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Component name derived from a reference: the last fragment segment,
/// else the file stem, restricted to `[a-zA-Z0-9._-]`
pub fn default_ref_name(reference: &str) -> String {
    let (document, fragment) = reference.split_once('#').unwrap_or((reference, ""));
    let raw = match fragment.rsplit('/').next().filter(|last| !last.is_empty()) {
        Some(last) => last.replace("~1", "/").replace("~0", "~"),
        None => {
            let file = document.rsplit('/').next().unwrap_or(document);
            file.split('.').next().unwrap_or(file).to_string()
        }
    };

    let sanitized: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.is_empty() {
        "ref".to_string()
    } else {
        sanitized
    }
}

impl Loader {
    /// Copy a resolved document, turning every external reference into a
    /// `#/components/<kind>/<name>` entry, then resolve the copy.
    ///
    /// External targets already present among the components (by identity or
    /// by serialized form) are reused; other name clashes get a numeric suffix.
    pub fn internalize_refs<F>(&self, document: &Document, name_fn: F) -> LoaderResult<Document>
    where
        F: Fn(&str) -> String,
    {
        let mut internalizer = Internalizer {
            existing: &document.components,
            additions: Components::default(),
            names: HashMap::new(),
            name_fn: &name_fn,
            external_depth: 0,
            max_depth: self.config().max_resolution_depth,
        };
        internalizer.seed_existing();

        let mut internalized = document.rewrite_refs(&mut internalizer)?;
        let additions = internalizer.additions;
        debug!(
            schemas = additions.schemas.len(),
            parameters = additions.parameters.len(),
            responses = additions.responses.len(),
            "internalized external references"
        );
        merge_additions(&mut internalized.components, additions);

        let location = document.location.clone();
        self.resolve_refs_in(&mut internalized, location.as_ref())?;
        Ok(internalized)
    }
}

fn merge_additions(components: &mut Components, additions: Components) {
    components.schemas.extend(additions.schemas);
    components.parameters.extend(additions.parameters);
    components.headers.extend(additions.headers);
    components.request_bodies.extend(additions.request_bodies);
    components.responses.extend(additions.responses);
    components.examples.extend(additions.examples);
}

struct Internalizer<'d, F> {
    existing: &'d Components,
    additions: Components,
    /// Node identity to the local reference that now names it
    names: HashMap<usize, String>,
    name_fn: &'d F,
    /// Greater than zero while rewriting the inside of an external target
    external_depth: usize,
    max_depth: usize,
}

fn component_ref(kind: &str, name: &str) -> String {
    format!("#/components/{}/{}", kind, escape_segment(name))
}

impl<F: Fn(&str) -> String> Internalizer<'_, F> {
    fn seed_existing(&mut self) {
        self.seed::<crate::model::Schema>();
        self.seed::<crate::model::Parameter>();
        self.seed::<crate::model::Header>();
        self.seed::<crate::model::RequestBody>();
        self.seed::<crate::model::Response>();
        self.seed::<crate::model::Example>();
    }

    fn seed<T: Component>(&mut self) {
        for (name, node) in T::collection(self.existing) {
            if let Ref::Value(value) = node {
                self.names
                    .insert(node_id(value.as_ref()), component_ref(T::KIND, name));
            }
        }
    }

    fn is_taken<T: Component>(&self, name: &str) -> bool {
        T::collection(self.existing).contains_key(name) || T::collection(&self.additions).contains_key(name)
    }

    /// A component with the same serialized form, if one exists
    fn find_equal<T: Component>(&self, target: &T) -> Option<String> {
        let wanted = serde_json::to_value(target).ok()?;
        T::collection(self.existing)
            .iter()
            .chain(T::collection(&self.additions).iter())
            .find(|(_, node)| {
                node.value()
                    .and_then(|value| serde_json::to_value(value).ok())
                    .is_some_and(|value| value == wanted)
            })
            .map(|(name, _)| name.clone())
    }

    fn unique_name<T: Component>(&self, base: &str) -> String {
        if !self.is_taken::<T>(base) {
            return base.to_string();
        }
        (1..)
            .map(|suffix| format!("{}{}", base, suffix))
            .find(|candidate| !self.is_taken::<T>(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    fn internalize<T: Component>(&mut self, reference: &str, target: &Arc<T>) -> LoaderResult<Ref<T>> {
        let id = node_id(target.as_ref());
        if let Some(local) = self.names.get(&id) {
            return Ok(Ref::pointer(local.clone()));
        }

        if let Some(name) = self.find_equal::<T>(target) {
            let local = component_ref(T::KIND, &name);
            self.names.insert(id, local.clone());
            return Ok(Ref::pointer(local));
        }

        if self.external_depth >= self.max_depth {
            return Err(LoaderError::internalize_error(reference, "maximum nesting depth exceeded"));
        }

        let name = self.unique_name::<T>(&default_or((self.name_fn)(reference)));
        let local = component_ref(T::KIND, &name);
        self.names.insert(id, local.clone());
        // Reserve the name before descending so nested clashes see it.
        T::collection_mut(&mut self.additions).insert(name.clone(), Ref::pointer(local.clone()));

        self.external_depth += 1;
        let rewritten = target.rewrite_refs(self);
        self.external_depth -= 1;

        T::collection_mut(&mut self.additions).insert(name, Ref::new(rewritten?));
        Ok(Ref::pointer(local))
    }
}

fn default_or(name: String) -> String {
    if name.is_empty() {
        "ref".to_string()
    } else {
        name
    }
}

impl<F: Fn(&str) -> String> RefRewriter for Internalizer<'_, F> {
    type Error = LoaderError;

    fn rewrite<T: Component>(&mut self, node: &Ref<T>) -> LoaderResult<Ref<T>> {
        match node {
            Ref::Value(value) => Ok(Ref::new(value.rewrite_refs(self)?)),
            Ref::Pointer(pointer) if !pointer.is_external() && self.external_depth == 0 => {
                Ok(Ref::pointer(pointer.reference()))
            }
            Ref::Pointer(pointer) => {
                let target = pointer.target().ok_or_else(|| {
                    LoaderError::internalize_error(pointer.reference(), "reference is not resolved")
                })?;
                self.internalize(pointer.reference(), target)
            }
        }
    }
}
