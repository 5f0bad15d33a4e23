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

//! Fixture templates
//!
//! A [`Template`] is the declarative description of a document: JSON scalars,
//! objects and arrays, where any position may instead hold a [`Deferred`]
//! computation that produces its value when first read.

use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::node::Node;

/// Signature of a deferred computation
///
/// The argument is the node that directly contains the computation.
pub type DeferredFn = dyn Fn(&Node) -> Result<Template> + Send + Sync;

/// A computation standing in for a value until the position is read
///
/// Cloning is cheap and clones share the same underlying closure, including
/// any state it captured (such as a sequence counter).
#[derive(Clone)]
pub struct Deferred {
    func: Arc<DeferredFn>,
}

impl Deferred {
    /// Wrap a closure as a deferred computation
    pub fn new<F, T>(func: F) -> Self
    where
        F: Fn(&Node) -> Result<T> + Send + Sync + 'static,
        T: Into<Template>,
    {
        Self {
            func: Arc::new(move |node: &Node| -> Result<Template> { func(node).map(Into::into) }),
        }
    }

    /// Run the computation against its containing node
    pub fn invoke(&self, context: &Node) -> Result<Template> {
        (self.func)(context)
    }

    /// Whether two handles share the same closure
    pub fn ptr_eq(&self, other: &Deferred) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Deferred({:p})", Arc::as_ptr(&self.func))
    }
}

/// Declarative document tree
#[derive(Clone, Debug)]
pub enum Template {
    /// Terminal JSON value
    ///
    /// A JSON object or array stored here is treated exactly like the
    /// equivalent [`Template::Object`] / [`Template::Array`].
    Scalar(Value),

    /// Keyed mapping, insertion order preserved
    Object(IndexMap<String, Template>),

    /// Ordered sequence
    Array(Vec<Template>),

    /// Value computed on first access
    Deferred(Deferred),
}

impl Template {
    /// JSON `null`
    pub fn null() -> Self {
        Self::Scalar(Value::Null)
    }

    /// Build an object template from key/value pairs
    pub fn object<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Template>,
    {
        Self::Object(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// Build an array template from items
    pub fn array<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Template>,
    {
        Self::Array(items.into_iter().map(Into::into).collect())
    }

    /// Build a deferred template from a closure over the containing node
    pub fn deferred<F, T>(func: F) -> Self
    where
        F: Fn(&Node) -> Result<T> + Send + Sync + 'static,
        T: Into<Template>,
    {
        Self::Deferred(Deferred::new(func))
    }

    /// True for deferred computations
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }

    /// True for objects, arrays, and JSON containers held as scalars
    pub fn is_container(&self) -> bool {
        match self {
            Self::Object(_) | Self::Array(_) => true,
            Self::Scalar(value) => value.is_object() || value.is_array(),
            Self::Deferred(_) => false,
        }
    }

    /// Type name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Scalar(Value::Object(_)) | Self::Object(_) => "object",
            Self::Scalar(Value::Array(_)) | Self::Array(_) => "array",
            Self::Scalar(_) => "scalar",
            Self::Deferred(_) => "deferred",
        }
    }
}

impl Default for Template {
    fn default() -> Self {
        Self::null()
    }
}

impl From<Value> for Template {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Object(
                map.into_iter()
                    .map(|(key, value)| (key, Template::from(value)))
                    .collect(),
            ),
            Value::Array(items) => Self::Array(items.into_iter().map(Template::from).collect()),
            scalar => Self::Scalar(scalar),
        }
    }
}

impl From<Deferred> for Template {
    fn from(deferred: Deferred) -> Self {
        Self::Deferred(deferred)
    }
}

impl From<IndexMap<String, Template>> for Template {
    fn from(map: IndexMap<String, Template>) -> Self {
        Self::Object(map)
    }
}

impl From<Vec<Template>> for Template {
    fn from(items: Vec<Template>) -> Self {
        Self::Array(items)
    }
}

impl<T: Into<Template>> From<Option<T>> for Template {
    fn from(value: Option<T>) -> Self {
        value.map_or_else(Template::null, Into::into)
    }
}

macro_rules! scalar_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Template {
                fn from(value: $ty) -> Self {
                    Self::Scalar(Value::from(value))
                }
            }
        )*
    };
}

scalar_from!(&str, String, bool, i32, i64, u32, u64, usize, f64);
