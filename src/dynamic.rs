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

//! Helpers for declaring dynamic values inline with a template
//!
//! [`sequence`] produces values from an incrementing counter, one number per
//! document built. [`dependent`] produces values from other parts of the
//! document being built.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::Result;
use crate::node::Node;
use crate::template::Template;

/// Monotonic counter backing a sequential value
///
/// Starts at zero; the first call to [`next_number`](Self::next_number)
/// returns 1. Increments are atomic so one template may be built from several
/// threads, each building its own document tree.
#[derive(Debug, Default)]
pub struct Sequence {
    seq_num: AtomicU64,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance and return the new value
    pub fn next_number(&self) -> u64 {
        self.seq_num.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Last value handed out, 0 if none yet
    pub fn current(&self) -> u64 {
        self.seq_num.load(Ordering::Relaxed)
    }
}

/// Declare a sequential value
///
/// Every time the position is resolved (once per built document), `func` is
/// called with the next number of a counter owned by the returned template.
/// Clones of the template share that counter.
///
/// ```
/// use octofhir_fixtures::{Template, sequence, wrap};
///
/// let id = sequence(|n| format!("patient-{n}"));
/// let first = wrap(Template::object([("id", id.clone())])).unwrap();
/// let second = wrap(Template::object([("id", id)])).unwrap();
///
/// assert_eq!(first.get("id").unwrap(), "patient-1");
/// assert_eq!(second.get("id").unwrap(), "patient-2");
/// ```
pub fn sequence<F, T>(func: F) -> Template
where
    F: Fn(u64) -> T + Send + Sync + 'static,
    T: Into<Template>,
{
    sequence_from(Arc::new(Sequence::new()), func)
}

/// Declare a sequential value driven by a caller-held counter
pub fn sequence_from<F, T>(counter: Arc<Sequence>, func: F) -> Template
where
    F: Fn(u64) -> T + Send + Sync + 'static,
    T: Into<Template>,
{
    Template::deferred(move |_: &Node| Ok(func(counter.next_number())))
}

/// Declare a value computed from the document it lives in
///
/// `func` receives the node that directly contains the value; the document
/// root is available through [`Node::head`].
///
/// ```
/// use octofhir_fixtures::{Template, dependent, wrap};
///
/// let doc = wrap(Template::object([
///     ("given", Template::from("Ada")),
///     (
///         "greeting",
///         dependent(|this| {
///             let given = this.get("given")?;
///             Ok(format!("Hello, {}", given.as_str().unwrap_or_default()))
///         }),
///     ),
/// ]))
/// .unwrap();
///
/// assert_eq!(doc.get("greeting").unwrap(), "Hello, Ada");
/// ```
pub fn dependent<F, T>(func: F) -> Template
where
    F: Fn(&Node) -> Result<T> + Send + Sync + 'static,
    T: Into<Template>,
{
    Template::deferred(func)
}
