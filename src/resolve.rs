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

//! Resolution of template values
//!
//! One decision procedure serves both lazy single-position reads and eager
//! materialization of a whole tree.

use serde_json::{Map, Value};

use crate::error::{FixtureError, Result};
use crate::node::{CompositeNode, DynamicValue, Node, Position, SequenceNode};
use crate::template::Template;

/// Turn a pending template into the value stored for its position
///
/// `context` is the node that directly contains the position. Deferred
/// computations are invoked with it, and whatever they return goes through
/// the same procedure again; containers are wrapped as children of it.
pub(crate) fn resolve_template(template: Template, context: &Node) -> Result<DynamicValue> {
    let limit = context.config().max_deferred_chain;
    let mut invocations = 0;
    let mut current = template;

    loop {
        current = match current {
            Template::Deferred(deferred) => {
                if invocations >= limit {
                    return Err(FixtureError::DeferredChainTooDeep { limit });
                }
                invocations += 1;
                log::trace!(
                    "Invoking deferred computation in {} node at depth {}",
                    context.kind(),
                    context.depth()
                );
                deferred.invoke(context)?
            }
            Template::Object(map) => {
                return CompositeNode::child(map, context).map(DynamicValue::Composite);
            }
            Template::Array(items) => {
                return SequenceNode::child(items, context).map(DynamicValue::Sequence);
            }
            Template::Scalar(value @ (Value::Object(_) | Value::Array(_))) => Template::from(value),
            Template::Scalar(value) => return Ok(DynamicValue::Scalar(value)),
        };
    }
}

/// Materialize any resolved value into plain JSON
pub(crate) fn materialize(value: &DynamicValue) -> Result<Value> {
    match value {
        DynamicValue::Scalar(value) => Ok(value.clone()),
        DynamicValue::Composite(node) => materialize_composite(node),
        DynamicValue::Sequence(node) => materialize_sequence(node),
    }
}

/// Resolve every key depth-first, in template order
pub(crate) fn materialize_composite(node: &CompositeNode) -> Result<Value> {
    log::debug!(
        "Materializing composite node with {} keys at depth {}",
        node.len(),
        node.depth()
    );
    let keys = node.keys();
    let mut object = Map::new();
    for key in keys {
        let value = node.get(&key)?;
        object.insert(key, materialize(&value)?);
    }
    Ok(Value::Object(object))
}

/// Resolve every index depth-first, in order
pub(crate) fn materialize_sequence(node: &SequenceNode) -> Result<Value> {
    log::debug!(
        "Materializing sequence node with {} items at depth {}",
        node.len(),
        node.depth()
    );
    let items = (0..node.len())
        .map(|index| node.get(index).and_then(|value| materialize(&value)))
        .collect::<Result<Vec<_>>>()?;
    Ok(Value::Array(items))
}

/// Equality against plain JSON after full materialization
pub(crate) fn materialized_eq(resolved: Result<Value>, expected: &Value) -> bool {
    match resolved {
        Ok(value) => &value == expected,
        Err(err) => {
            log::debug!("Materialization failed during comparison: {err}");
            false
        }
    }
}

/// Follow a `/`-separated pointer from `start`
///
/// Tokens use the JSON Pointer escapes (`~1` for `/`, `~0` for `~`). The empty
/// pointer refers to `start` itself.
pub(crate) fn navigate(start: DynamicValue, pointer: &str) -> Result<DynamicValue> {
    if pointer.is_empty() {
        return Ok(start);
    }
    let Some(path) = pointer.strip_prefix('/') else {
        return Err(FixtureError::invalid_pointer(pointer, "must start with '/'"));
    };

    let mut current = start;
    for token in path.split('/') {
        let token = token.replace("~1", "/").replace("~0", "~");
        current = match &current {
            DynamicValue::Composite(node) => node.get(&token)?,
            DynamicValue::Sequence(node) => {
                let index = parse_index(&token).ok_or_else(|| {
                    FixtureError::invalid_pointer(pointer, format!("'{token}' is not an index"))
                })?;
                node.get(index)?
            }
            DynamicValue::Scalar(_) => {
                return Err(FixtureError::not_a_container(Position::Key(token)));
            }
        };
    }
    Ok(current)
}

/// Array index token: ASCII digits, no leading zero except for "0" itself
fn parse_index(token: &str) -> Option<usize> {
    let digits_only = !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit());
    if !digits_only || (token.len() > 1 && token.starts_with('0')) {
        return None;
    }
    token.parse().ok()
}
