//! Named, reusable components of a document
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::model::document::{Example, Header, Parameter, RequestBody, Response};
use crate::model::reference::Ref;
use crate::model::schema::Schema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schemas: BTreeMap<String, Ref<Schema>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Ref<Parameter>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, Ref<Header>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub request_bodies: BTreeMap<String, Ref<RequestBody>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub responses: BTreeMap<String, Ref<Response>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub examples: BTreeMap<String, Ref<Example>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub security_schemes: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub callbacks: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

impl Components {
    pub fn is_empty(&self) -> bool {
        self == &Components::default()
    }

    /// Register a schema under the given name
    pub fn with_schema<S: Into<String>>(mut self, name: S, schema: Schema) -> Self {
        self.schemas.insert(name.into(), Ref::new(schema));
        self
    }

    /// Every component key, grouped by section, in document order
    pub fn keys(&self) -> impl Iterator<Item = (&'static str, &str)> {
        fn names<'a, V>(
            section: &'static str,
            map: &'a BTreeMap<String, V>,
        ) -> impl Iterator<Item = (&'static str, &'a str)> {
            map.keys().map(move |key| (section, key.as_str()))
        }

        names("schemas", &self.schemas)
            .chain(names("parameters", &self.parameters))
            .chain(names("headers", &self.headers))
            .chain(names("requestBodies", &self.request_bodies))
            .chain(names("responses", &self.responses))
            .chain(names("examples", &self.examples))
            .chain(names("securitySchemes", &self.security_schemes))
            .chain(names("links", &self.links))
            .chain(names("callbacks", &self.callbacks))
    }
}
