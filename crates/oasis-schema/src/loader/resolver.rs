//! Reference resolution pass
//!
//! A pass indexes the root document, then walks every reference slot and
//! fills the target of each pointer. Targets are looked up in the index
//! first; locations that are not reference slots are materialized from the
//! raw JSON of their document. External documents are fetched once per
//! pass (and cached across passes by the loader); full documents among
//! them are indexed, resolved and queued for component merging.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::loader::cache::DocumentCache;
use crate::loader::document_loader::Loader;
use crate::loader::error::{LoaderError, LoaderResult};
use crate::loader::index::{apply_json_pointer, location_key, IndexEntry, Indexer, NodeIndex};
use crate::model::reference::node_id;
use crate::model::{Component, Components, Document, Ref, RefVisitor, Traverse};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, trace};
use url::Url;

/// State of one resolution pass
pub(crate) struct ResolveState<'a> {
    loader: &'a Loader,
    root: &'a Document,
    root_key: String,
    documents: HashMap<String, Arc<Value>>,
    external: Vec<Document>,
    index: NodeIndex,
    visited: HashSet<usize>,
    chain: Vec<String>,
}

impl<'a> ResolveState<'a> {
    /// Prepare a pass over `root`, located at `base`
    pub(crate) fn new(loader: &'a Loader, root: &'a Document, base: &Url) -> Self {
        let mut index = NodeIndex::default();
        let _ = root.traverse(&mut Indexer::new(&mut index, base, ""));
        Self {
            loader,
            root,
            root_key: DocumentCache::key(base),
            documents: HashMap::new(),
            external: Vec::new(),
            index,
            visited: HashSet::new(),
            chain: Vec::new(),
        }
    }

    /// Resolve every reachable pointer of the root document
    pub(crate) fn run(&mut self, base: &Url) -> LoaderResult<()> {
        let root = self.root;
        root.traverse(&mut Resolve {
            state: self,
            base: base.clone(),
        })
    }

    /// Full documents fetched during the pass, in the order they finished
    pub(crate) fn into_external_documents(self) -> Vec<Document> {
        self.external
    }

    /// Resolve a reference string against a base location
    fn resolve<T: Component>(&mut self, reference: &str, base: &Url) -> LoaderResult<Arc<T>> {
        let loader = self.loader;
        let config = loader.config();
        if self.chain.len() >= config.max_resolution_depth {
            return Err(LoaderError::depth_exceeded(reference, config.max_resolution_depth));
        }

        let (document, fragment) = self.locate(reference, base)?;
        let key = location_key(&DocumentCache::key(&document), fragment);

        let reentries = self.chain.iter().filter(|seen| **seen == key).count();
        if reentries > config.circular_reference_counter {
            let mut chain = self.chain.clone();
            chain.push(key);
            return Err(LoaderError::circular_reference(&chain));
        }

        self.chain.push(key.clone());
        let result = self.lookup::<T>(reference, &document, fragment, &key);
        self.chain.pop();

        if result.is_ok() {
            trace!(reference, location = %key, kind = T::KIND, "resolved reference");
        }
        result
    }

    /// Split a reference into the absolute document location and the fragment
    fn locate<'r>(&self, reference: &'r str, base: &Url) -> LoaderResult<(Url, &'r str)> {
        let (document_part, fragment) = reference.split_once('#').unwrap_or((reference, ""));
        if !fragment.is_empty() && !fragment.starts_with('/') {
            return Err(LoaderError::invalid_reference(
                reference,
                "only JSON pointer fragments are supported",
            ));
        }

        let mut document = if document_part.is_empty() {
            base.clone()
        } else {
            if !self.loader.config().allow_external_refs {
                return Err(LoaderError::external_disallowed(reference));
            }
            base.join(document_part)
                .map_err(|e| LoaderError::invalid_reference(reference, e.to_string()))?
        };
        document.set_fragment(None);
        Ok((document, fragment))
    }

    fn lookup<T: Component>(
        &mut self,
        reference: &str,
        document: &Url,
        fragment: &str,
        key: &str,
    ) -> LoaderResult<Arc<T>> {
        let raw = self.document(document)?;
        match self.index.get(key).cloned() {
            Some(IndexEntry::Node(node)) => node.downcast::<T>().map_err(|_| {
                LoaderError::unresolved(
                    reference,
                    document.as_str(),
                    format!("target is not one of {}", T::KIND),
                )
            }),
            Some(IndexEntry::Alias { reference: next, base }) => self.resolve::<T>(&next, &base),
            None => self.materialize::<T>(reference, document, fragment, key, &raw),
        }
    }

    /// Build a node from the raw JSON at a location that is not a reference slot
    fn materialize<T: Component>(
        &mut self,
        reference: &str,
        document: &Url,
        fragment: &str,
        key: &str,
        raw: &Value,
    ) -> LoaderResult<Arc<T>> {
        let value = apply_json_pointer(raw, fragment)
            .map_err(|reason| LoaderError::unresolved(reference, document.as_str(), reason))?;

        if let Some(next) = value.get("$ref").and_then(Value::as_str) {
            self.index.insert(
                key.to_string(),
                IndexEntry::Alias {
                    reference: next.to_string(),
                    base: document.clone(),
                },
            );
            return self.resolve::<T>(next, document);
        }

        let node: Arc<T> = Arc::new(
            serde_json::from_value(value.clone())
                .map_err(|e| LoaderError::unmarshal_error(T::KIND, reference, e))?,
        );
        Indexer::new(&mut self.index, document, fragment).index_node(&node);

        self.visited.insert(node_id(node.as_ref()));
        let chain = std::mem::take(&mut self.chain);
        let result = node.traverse(&mut Resolve {
            state: self,
            base: document.clone(),
        });
        self.chain = chain;
        result?;
        Ok(node)
    }

    /// The raw JSON of a document, fetching and preparing it on first use
    fn document(&mut self, location: &Url) -> LoaderResult<Arc<Value>> {
        let key = DocumentCache::key(location);
        if let Some(raw) = self.documents.get(&key) {
            return Ok(Arc::clone(raw));
        }

        if key == self.root_key {
            let raw = serde_json::to_value(self.root)
                .map_err(|e| LoaderError::unmarshal_error("document", key.as_str(), e))?;
            let raw = Arc::new(raw);
            self.documents.insert(key, Arc::clone(&raw));
            return Ok(raw);
        }

        debug!(location = %location, "loading external document");
        let raw = self.loader.fetch(location)?;
        self.documents.insert(key.clone(), Arc::clone(&raw));

        if raw.get("openapi").is_some() {
            let mut document: Document = self.loader.parser().unmarshal("document", (*raw).clone(), &key)?;
            document.location = Some(location.clone());
            let _ = document.traverse(&mut Indexer::new(&mut self.index, location, ""));

            let chain = std::mem::take(&mut self.chain);
            let result = document.traverse(&mut Resolve {
                state: self,
                base: location.clone(),
            });
            self.chain = chain;
            result?;

            self.external.push(document);
        }
        Ok(raw)
    }
}

/// Visitor filling pointer targets below one document
struct Resolve<'s, 'a> {
    state: &'s mut ResolveState<'a>,
    base: Url,
}

impl RefVisitor for Resolve<'_, '_> {
    type Error = LoaderError;

    fn visit<T: Component>(&mut self, _segments: &[&str], node: &Ref<T>) -> LoaderResult<()> {
        match node {
            Ref::Pointer(pointer) => {
                if pointer.target().is_none() {
                    let target = self.state.resolve::<T>(pointer.reference(), &self.base)?;
                    pointer.set_target(target);
                }
            }
            Ref::Value(value) => {
                if self.state.visited.insert(node_id(value.as_ref())) {
                    value.traverse(self)?;
                }
            }
        }
        Ok(())
    }
}

/// Merge the component collections of external documents into the root
pub(crate) fn merge_external_components(root: &mut Components, external: &[Document]) -> LoaderResult<()> {
    for document in external {
        let location = document
            .location
            .as_ref()
            .map(Url::to_string)
            .unwrap_or_default();
        let incoming = &document.components;

        merge_collection::<crate::model::Schema>(root, incoming, &location)?;
        merge_collection::<crate::model::Parameter>(root, incoming, &location)?;
        merge_collection::<crate::model::Header>(root, incoming, &location)?;
        merge_collection::<crate::model::RequestBody>(root, incoming, &location)?;
        merge_collection::<crate::model::Response>(root, incoming, &location)?;
        merge_collection::<crate::model::Example>(root, incoming, &location)?;
        merge_raw(&mut root.security_schemes, &incoming.security_schemes, "securitySchemes", &location)?;
        merge_raw(&mut root.links, &incoming.links, "links", &location)?;
        merge_raw(&mut root.callbacks, &incoming.callbacks, "callbacks", &location)?;
    }
    Ok(())
}

fn merge_collection<T: Component>(root: &mut Components, incoming: &Components, location: &str) -> LoaderResult<()> {
    let target = T::collection_mut(root);
    for (name, node) in T::collection(incoming) {
        match target.get(name) {
            None => {
                debug!(kind = T::KIND, name = %name, from = location, "merging external component");
                target.insert(name.clone(), node.clone());
            }
            Some(existing) if same_component(existing, node) => {}
            Some(_) => return Err(LoaderError::collision(T::KIND, name.as_str(), location)),
        }
    }
    Ok(())
}

fn merge_raw(
    root: &mut BTreeMap<String, Value>,
    incoming: &BTreeMap<String, Value>,
    kind: &str,
    location: &str,
) -> LoaderResult<()> {
    for (name, value) in incoming {
        match root.get(name) {
            None => {
                root.insert(name.clone(), value.clone());
            }
            Some(existing) if existing == value => {}
            Some(_) => return Err(LoaderError::collision(kind, name.as_str(), location)),
        }
    }
    Ok(())
}

/// Same node by identity, or the same serialized form
fn same_component<T: Component>(existing: &Ref<T>, incoming: &Ref<T>) -> bool {
    if let (Some(a), Some(b)) = (existing.arc(), incoming.arc()) {
        if Arc::ptr_eq(a, b) {
            return true;
        }
    }
    match (serde_json::to_value(existing), serde_json::to_value(incoming)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
