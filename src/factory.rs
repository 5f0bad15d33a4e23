// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Document factories
//!
//! A [`Factory`] holds a named object template and builds documents from it.
//! Each build wraps its own copy of the template, so documents never share
//! cached state; only closures captured by deferred values (such as sequence
//! counters) are shared between builds.

use indexmap::IndexMap;
use serde_json::Value;

use crate::config::ResolverConfig;
use crate::error::{FixtureError, Result};
use crate::node::CompositeNode;
use crate::template::Template;

/// Named object template that builds fixture documents
#[derive(Debug, Clone)]
pub struct Factory {
    name: String,
    template: IndexMap<String, Template>,
    config: ResolverConfig,
}

impl Factory {
    /// Create a factory with an empty template
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: IndexMap::new(),
            config: ResolverConfig::default(),
        }
    }

    /// Create a factory from an object template
    pub fn from_template(name: impl Into<String>, template: impl Into<Template>) -> Result<Self> {
        match template.into() {
            Template::Object(map) => Ok(Self {
                name: name.into(),
                template: map,
                config: ResolverConfig::default(),
            }),
            Template::Scalar(value @ Value::Object(_)) => {
                Self::from_template(name, Template::from(value))
            }
            other => Err(FixtureError::invalid_template("object", other.type_name())),
        }
    }

    /// Add or replace one attribute
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<Template>) -> Self {
        self.template.insert(key.into(), value.into());
        self
    }

    /// Use explicit resolver limits for built documents
    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &IndexMap<String, Template> {
        &self.template
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Wrap a fresh copy of the template without resolving anything
    pub fn build_node(&self) -> CompositeNode {
        log::debug!("Wrapping new '{}' document", self.name);
        CompositeNode::wrap_with_config(self.template.clone(), self.config.clone())
    }

    /// Build one fully materialized document
    pub fn build(&self) -> Result<Value> {
        self.build_node().resolve()
    }

    /// Build one document with some top-level attributes replaced or added
    pub fn build_with<I, K, V>(&self, overrides: I) -> Result<Value>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Template>,
    {
        let mut template = self.template.clone();
        for (key, value) in overrides {
            template.insert(key.into(), value.into());
        }
        log::debug!("Building '{}' document with overrides", self.name);
        CompositeNode::wrap_with_config(template, self.config.clone()).resolve()
    }

    /// Build `count` documents in order
    pub fn build_many(&self, count: usize) -> Result<Vec<Value>> {
        (0..count).map(|_| self.build()).collect()
    }
}
