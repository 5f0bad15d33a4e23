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

//! Wrapped nodes over a fixture template
//!
//! A [`CompositeNode`] wraps an object template and a [`SequenceNode`] wraps an
//! array template. Reading a position resolves it on first access and caches
//! the result in place: deferred computations run once, and nested containers
//! are replaced by their own wrapped nodes. Every node of a tree can reach the
//! root through [`head`](CompositeNode::head).
//!
//! Nodes are `Rc` handles and stay on the thread that created them. Descendants
//! refer to the root through a `Weak`, so the root owns the whole tree and
//! nothing owns the root.

use indexmap::IndexMap;
use serde_json::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::config::ResolverConfig;
use crate::error::{FixtureError, Result};
use crate::resolve;
use crate::template::Template;

/// Storage cell for one position of a node
pub(crate) enum Slot {
    /// Not read yet: a deferred computation or an unwrapped container
    Pending(Template),
    /// Read at least once; returned as-is from now on
    Resolved(DynamicValue),
}

impl From<Template> for Slot {
    fn from(template: Template) -> Self {
        match template {
            Template::Scalar(value) if !(value.is_object() || value.is_array()) => {
                Slot::Resolved(DynamicValue::Scalar(value))
            }
            pending => Slot::Pending(pending),
        }
    }
}

/// Positional access shared by keyed and indexed storage
pub(crate) trait Slots {
    type Key: ?Sized + fmt::Display;

    const KIND: &'static str;

    fn len(&self) -> usize;

    fn slot(&self, key: &Self::Key) -> Option<&Slot>;

    fn slot_mut(&mut self, key: &Self::Key) -> Option<&mut Slot>;

    fn missing(key: &Self::Key, len: usize) -> FixtureError;
}

pub(crate) type ObjectSlots = IndexMap<String, Slot>;
pub(crate) type ArraySlots = Vec<Slot>;

impl Slots for ObjectSlots {
    type Key = str;

    const KIND: &'static str = "composite";

    fn len(&self) -> usize {
        IndexMap::len(self)
    }

    fn slot(&self, key: &str) -> Option<&Slot> {
        self.get(key)
    }

    fn slot_mut(&mut self, key: &str) -> Option<&mut Slot> {
        self.get_mut(key)
    }

    fn missing(key: &str, _len: usize) -> FixtureError {
        FixtureError::key_not_found(key)
    }
}

impl Slots for ArraySlots {
    type Key = usize;

    const KIND: &'static str = "sequence";

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn slot(&self, index: &usize) -> Option<&Slot> {
        self.get(*index)
    }

    fn slot_mut(&mut self, index: &usize) -> Option<&mut Slot> {
        self.get_mut(*index)
    }

    fn missing(index: &usize, len: usize) -> FixtureError {
        FixtureError::index_out_of_range(*index, len)
    }
}

/// Shared state behind a node handle
pub(crate) struct NodeCell<C> {
    raw: RefCell<C>,
    head: WeakNode,
    depth: usize,
    config: Rc<ResolverConfig>,
}

impl<C: Slots> NodeCell<C> {
    /// Resolve one position, caching the result
    ///
    /// No borrow of `raw` is held while client code runs, so a computation
    /// may freely read sibling positions of the node it lives in.
    fn get(&self, this: &Node, key: &C::Key) -> Result<DynamicValue> {
        let pending = {
            let mut raw = self.raw.borrow_mut();
            let len = raw.len();
            match raw.slot_mut(key) {
                None => return Err(C::missing(key, len)),
                Some(Slot::Resolved(value)) => return Ok(value.clone()),
                Some(Slot::Pending(Template::Deferred(deferred))) => {
                    Template::Deferred(deferred.clone())
                }
                Some(Slot::Pending(template)) => {
                    // wrapping a container only fails on the depth limit, so the
                    // slot is emptied only once that check has passed
                    this.lineage().check()?;
                    std::mem::take(template)
                }
            }
        };

        log::trace!(
            "Resolving {} '{}' in {} node at depth {}",
            pending.type_name(),
            key,
            C::KIND,
            self.depth
        );
        let value = resolve::resolve_template(pending, this)?;

        if let Some(slot) = self.raw.borrow_mut().slot_mut(key) {
            *slot = Slot::Resolved(value.clone());
        }
        Ok(value)
    }

    fn is_resolved(&self, key: &C::Key) -> bool {
        matches!(self.raw.borrow().slot(key), Some(Slot::Resolved(_)))
    }

    fn len(&self) -> usize {
        self.raw.borrow().len()
    }
}

fn object_slots(map: IndexMap<String, Template>) -> ObjectSlots {
    map.into_iter()
        .map(|(key, template)| (key, Slot::from(template)))
        .collect()
}

fn array_slots(items: Vec<Template>) -> ArraySlots {
    items.into_iter().map(Slot::from).collect()
}

/// Non-owning handle to a head node
#[derive(Clone)]
enum WeakNode {
    Composite(Weak<NodeCell<ObjectSlots>>),
    Sequence(Weak<NodeCell<ArraySlots>>),
}

impl WeakNode {
    fn upgrade(&self) -> Option<Node> {
        match self {
            WeakNode::Composite(weak) => weak
                .upgrade()
                .map(|inner| Node::Composite(CompositeNode { inner })),
            WeakNode::Sequence(weak) => weak
                .upgrade()
                .map(|inner| Node::Sequence(SequenceNode { inner })),
        }
    }
}

/// Lineage handed from a node to the children it wraps
struct Lineage {
    head: WeakNode,
    depth: usize,
    config: Rc<ResolverConfig>,
}

impl Lineage {
    fn check(&self) -> Result<()> {
        if self.depth > self.config.max_depth {
            return Err(FixtureError::MaxDepthExceeded {
                limit: self.config.max_depth,
            });
        }
        Ok(())
    }

    fn cell<C>(self, raw: C) -> Result<Rc<NodeCell<C>>> {
        self.check()?;
        Ok(Rc::new(NodeCell {
            raw: RefCell::new(raw),
            head: self.head,
            depth: self.depth,
            config: self.config,
        }))
    }
}

/// Stable identity of a node, usable outside the node's thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Address of one position inside a node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Position {
    /// Key of a composite node
    Key(String),
    /// Index of a sequence node
    Index(usize),
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Key(key) => write!(f, "key '{key}'"),
            Position::Index(index) => write!(f, "index {index}"),
        }
    }
}

impl From<&str> for Position {
    fn from(key: &str) -> Self {
        Position::Key(key.to_string())
    }
}

impl From<&String> for Position {
    fn from(key: &String) -> Self {
        Position::Key(key.clone())
    }
}

impl From<String> for Position {
    fn from(key: String) -> Self {
        Position::Key(key)
    }
}

impl From<usize> for Position {
    fn from(index: usize) -> Self {
        Position::Index(index)
    }
}

/// Lazily resolved view over an object template
#[derive(Clone)]
pub struct CompositeNode {
    inner: Rc<NodeCell<ObjectSlots>>,
}

impl CompositeNode {
    /// Wrap an object template as the root of a new tree
    pub fn wrap(map: IndexMap<String, Template>) -> Self {
        Self::wrap_with_config(map, ResolverConfig::default())
    }

    /// Wrap an object template as the root of a new tree with explicit limits
    pub fn wrap_with_config(map: IndexMap<String, Template>, config: ResolverConfig) -> Self {
        let raw = RefCell::new(object_slots(map));
        let config = Rc::new(config);
        let inner = Rc::new_cyclic(|weak| NodeCell {
            raw,
            head: WeakNode::Composite(weak.clone()),
            depth: 0,
            config,
        });
        Self { inner }
    }

    /// Wrap an object template whose head is an existing node
    ///
    /// The new node shares `head`'s limits and sits one level below it.
    pub fn wrap_with_head(map: IndexMap<String, Template>, head: &Node) -> Result<Self> {
        let lineage = Lineage {
            head: head.downgrade(),
            depth: head.depth() + 1,
            config: head.shared_config(),
        };
        lineage.cell(object_slots(map)).map(|inner| Self { inner })
    }

    pub(crate) fn child(map: IndexMap<String, Template>, parent: &Node) -> Result<Self> {
        parent
            .lineage()
            .cell(object_slots(map))
            .map(|inner| Self { inner })
    }

    /// Read one key, resolving and caching it on first access
    pub fn get(&self, key: &str) -> Result<DynamicValue> {
        self.inner.get(&self.as_node(), key)
    }

    /// Navigate with a `/`-separated pointer, resolving lazily along the way
    pub fn pointer(&self, pointer: &str) -> Result<DynamicValue> {
        resolve::navigate(DynamicValue::Composite(self.clone()), pointer)
    }

    /// Fully materialize this subtree into plain JSON
    pub fn resolve(&self) -> Result<Value> {
        resolve::materialize_composite(self)
    }

    /// Keys in template order
    pub fn keys(&self) -> Vec<String> {
        self.inner.raw.borrow().keys().cloned().collect()
    }

    /// Whether the key exists (resolved or not)
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.raw.borrow().contains_key(key)
    }

    /// Whether the key has already been resolved and cached
    pub fn is_resolved(&self, key: &str) -> bool {
        self.inner.is_resolved(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Root node of the tree this node belongs to
    pub fn head(&self) -> Result<Node> {
        self.inner.head.upgrade().ok_or(FixtureError::HeadDropped)
    }

    /// Nesting depth below the head
    pub fn depth(&self) -> usize {
        self.inner.depth
    }

    pub fn id(&self) -> NodeId {
        NodeId(Rc::as_ptr(&self.inner) as *const () as usize)
    }

    /// Whether both handles refer to the same node
    pub fn ptr_eq(&self, other: &CompositeNode) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// This node as a context handle
    pub fn as_node(&self) -> Node {
        Node::Composite(self.clone())
    }
}

impl fmt::Debug for CompositeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeNode")
            .field("keys", &self.keys())
            .field("depth", &self.depth())
            .finish()
    }
}

impl PartialEq for CompositeNode {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl PartialEq<Value> for CompositeNode {
    fn eq(&self, other: &Value) -> bool {
        resolve::materialized_eq(self.resolve(), other)
    }
}

/// Lazily resolved view over an array template
#[derive(Clone)]
pub struct SequenceNode {
    inner: Rc<NodeCell<ArraySlots>>,
}

impl SequenceNode {
    /// Wrap an array template as the root of a new tree
    pub fn wrap(items: Vec<Template>) -> Self {
        Self::wrap_with_config(items, ResolverConfig::default())
    }

    /// Wrap an array template as the root of a new tree with explicit limits
    pub fn wrap_with_config(items: Vec<Template>, config: ResolverConfig) -> Self {
        let raw = RefCell::new(array_slots(items));
        let config = Rc::new(config);
        let inner = Rc::new_cyclic(|weak| NodeCell {
            raw,
            head: WeakNode::Sequence(weak.clone()),
            depth: 0,
            config,
        });
        Self { inner }
    }

    /// Wrap an array template whose head is an existing node
    pub fn wrap_with_head(items: Vec<Template>, head: &Node) -> Result<Self> {
        let lineage = Lineage {
            head: head.downgrade(),
            depth: head.depth() + 1,
            config: head.shared_config(),
        };
        lineage.cell(array_slots(items)).map(|inner| Self { inner })
    }

    pub(crate) fn child(items: Vec<Template>, parent: &Node) -> Result<Self> {
        parent
            .lineage()
            .cell(array_slots(items))
            .map(|inner| Self { inner })
    }

    /// Read one index, resolving and caching it on first access
    pub fn get(&self, index: usize) -> Result<DynamicValue> {
        self.inner.get(&self.as_node(), &index)
    }

    /// Navigate with a `/`-separated pointer, resolving lazily along the way
    pub fn pointer(&self, pointer: &str) -> Result<DynamicValue> {
        resolve::navigate(DynamicValue::Sequence(self.clone()), pointer)
    }

    /// Fully materialize this subtree into plain JSON
    pub fn resolve(&self) -> Result<Value> {
        resolve::materialize_sequence(self)
    }

    /// Whether the index has already been resolved and cached
    pub fn is_resolved(&self, index: usize) -> bool {
        self.inner.is_resolved(&index)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Root node of the tree this node belongs to
    pub fn head(&self) -> Result<Node> {
        self.inner.head.upgrade().ok_or(FixtureError::HeadDropped)
    }

    /// Nesting depth below the head
    pub fn depth(&self) -> usize {
        self.inner.depth
    }

    pub fn id(&self) -> NodeId {
        NodeId(Rc::as_ptr(&self.inner) as *const () as usize)
    }

    /// Whether both handles refer to the same node
    pub fn ptr_eq(&self, other: &SequenceNode) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// This node as a context handle
    pub fn as_node(&self) -> Node {
        Node::Sequence(self.clone())
    }
}

impl fmt::Debug for SequenceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceNode")
            .field("len", &self.len())
            .field("depth", &self.depth())
            .finish()
    }
}

impl PartialEq for SequenceNode {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl PartialEq<Value> for SequenceNode {
    fn eq(&self, other: &Value) -> bool {
        resolve::materialized_eq(self.resolve(), other)
    }
}

/// Either kind of wrapped node
///
/// This is the context handed to deferred computations: the node that
/// directly contains the computation, with the root reachable via `head()`.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// Keyed node
    Composite(CompositeNode),
    /// Indexed node
    Sequence(SequenceNode),
}

impl Node {
    /// Read one position
    ///
    /// Keys address composite nodes and indices address sequence nodes;
    /// any other combination fails with `PositionMismatch`.
    pub fn get(&self, position: impl Into<Position>) -> Result<DynamicValue> {
        match (self, position.into()) {
            (Node::Composite(node), Position::Key(key)) => node.get(&key),
            (Node::Sequence(node), Position::Index(index)) => node.get(index),
            (node, position) => Err(FixtureError::position_mismatch(position, node.kind())),
        }
    }

    /// Navigate with a `/`-separated pointer
    pub fn pointer(&self, pointer: &str) -> Result<DynamicValue> {
        resolve::navigate(self.clone().into(), pointer)
    }

    /// Fully materialize this subtree into plain JSON
    pub fn resolve(&self) -> Result<Value> {
        match self {
            Node::Composite(node) => node.resolve(),
            Node::Sequence(node) => node.resolve(),
        }
    }

    /// Whether the position has already been resolved and cached
    pub fn is_resolved(&self, position: impl Into<Position>) -> bool {
        match (self, position.into()) {
            (Node::Composite(node), Position::Key(key)) => node.is_resolved(&key),
            (Node::Sequence(node), Position::Index(index)) => node.is_resolved(index),
            _ => false,
        }
    }

    /// Root node of the tree
    pub fn head(&self) -> Result<Node> {
        match self {
            Node::Composite(node) => node.head(),
            Node::Sequence(node) => node.head(),
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            Node::Composite(node) => node.depth(),
            Node::Sequence(node) => node.depth(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Node::Composite(node) => node.len(),
            Node::Sequence(node) => node.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn id(&self) -> NodeId {
        match self {
            Node::Composite(node) => node.id(),
            Node::Sequence(node) => node.id(),
        }
    }

    /// Whether both handles refer to the same node
    pub fn ptr_eq(&self, other: &Node) -> bool {
        self.id() == other.id()
    }

    /// `"composite"` or `"sequence"`
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Composite(_) => ObjectSlots::KIND,
            Node::Sequence(_) => ArraySlots::KIND,
        }
    }

    pub fn as_composite(&self) -> Option<&CompositeNode> {
        match self {
            Node::Composite(node) => Some(node),
            Node::Sequence(_) => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&SequenceNode> {
        match self {
            Node::Sequence(node) => Some(node),
            Node::Composite(_) => None,
        }
    }

    fn downgrade(&self) -> WeakNode {
        match self {
            Node::Composite(node) => WeakNode::Composite(Rc::downgrade(&node.inner)),
            Node::Sequence(node) => WeakNode::Sequence(Rc::downgrade(&node.inner)),
        }
    }

    fn shared_config(&self) -> Rc<ResolverConfig> {
        match self {
            Node::Composite(node) => Rc::clone(&node.inner.config),
            Node::Sequence(node) => Rc::clone(&node.inner.config),
        }
    }

    pub(crate) fn config(&self) -> &ResolverConfig {
        match self {
            Node::Composite(node) => &node.inner.config,
            Node::Sequence(node) => &node.inner.config,
        }
    }

    fn lineage(&self) -> Lineage {
        let (head, depth) = match self {
            Node::Composite(node) => (node.inner.head.clone(), node.inner.depth),
            Node::Sequence(node) => (node.inner.head.clone(), node.inner.depth),
        };
        Lineage {
            head,
            depth: depth + 1,
            config: self.shared_config(),
        }
    }
}

impl From<CompositeNode> for Node {
    fn from(node: CompositeNode) -> Self {
        Node::Composite(node)
    }
}

impl From<SequenceNode> for Node {
    fn from(node: SequenceNode) -> Self {
        Node::Sequence(node)
    }
}

impl PartialEq<Value> for Node {
    fn eq(&self, other: &Value) -> bool {
        resolve::materialized_eq(self.resolve(), other)
    }
}

/// Value returned from reading a position
///
/// Container results are the cached node handles themselves, so repeated
/// reads of the same position return the same node.
#[derive(Clone, Debug)]
pub enum DynamicValue {
    /// Terminal JSON value
    Scalar(Value),
    /// Wrapped object
    Composite(CompositeNode),
    /// Wrapped array
    Sequence(SequenceNode),
}

impl DynamicValue {
    /// Read a nested position
    pub fn get(&self, position: impl Into<Position>) -> Result<DynamicValue> {
        match self {
            DynamicValue::Scalar(_) => Err(FixtureError::not_a_container(position.into())),
            DynamicValue::Composite(node) => node.as_node().get(position),
            DynamicValue::Sequence(node) => node.as_node().get(position),
        }
    }

    /// Navigate with a `/`-separated pointer
    pub fn pointer(&self, pointer: &str) -> Result<DynamicValue> {
        resolve::navigate(self.clone(), pointer)
    }

    /// Fully materialize into plain JSON
    pub fn resolve(&self) -> Result<Value> {
        resolve::materialize(self)
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            DynamicValue::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(Value::as_str)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_scalar().and_then(Value::as_i64)
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_scalar().and_then(Value::as_u64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_scalar().and_then(Value::as_bool)
    }

    pub fn as_composite(&self) -> Option<&CompositeNode> {
        match self {
            DynamicValue::Composite(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&SequenceNode> {
        match self {
            DynamicValue::Sequence(node) => Some(node),
            _ => None,
        }
    }

    /// The wrapped node, if this is a container
    pub fn as_node(&self) -> Option<Node> {
        match self {
            DynamicValue::Scalar(_) => None,
            DynamicValue::Composite(node) => Some(node.as_node()),
            DynamicValue::Sequence(node) => Some(node.as_node()),
        }
    }
}

impl From<Node> for DynamicValue {
    fn from(node: Node) -> Self {
        match node {
            Node::Composite(node) => DynamicValue::Composite(node),
            Node::Sequence(node) => DynamicValue::Sequence(node),
        }
    }
}

/// Scalars compare by value, nodes by identity
impl PartialEq for DynamicValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DynamicValue::Scalar(left), DynamicValue::Scalar(right)) => left == right,
            (DynamicValue::Composite(left), DynamicValue::Composite(right)) => left.ptr_eq(right),
            (DynamicValue::Sequence(left), DynamicValue::Sequence(right)) => left.ptr_eq(right),
            _ => false,
        }
    }
}

impl PartialEq<Value> for DynamicValue {
    fn eq(&self, other: &Value) -> bool {
        match self {
            DynamicValue::Scalar(value) => value == other,
            _ => resolve::materialized_eq(self.resolve(), other),
        }
    }
}

impl PartialEq<&str> for DynamicValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

/// Wrap a template as the root of a new tree
///
/// Objects become a [`CompositeNode`], arrays a [`SequenceNode`], and scalars
/// are returned unchanged. A deferred computation cannot be a root since it
/// has no containing node to receive.
pub fn wrap(template: impl Into<Template>) -> Result<DynamicValue> {
    wrap_with_config(template, ResolverConfig::default())
}

/// [`wrap`] with explicit limits
pub fn wrap_with_config(
    template: impl Into<Template>,
    config: ResolverConfig,
) -> Result<DynamicValue> {
    match template.into() {
        Template::Object(map) => Ok(DynamicValue::Composite(CompositeNode::wrap_with_config(
            map, config,
        ))),
        Template::Array(items) => Ok(DynamicValue::Sequence(SequenceNode::wrap_with_config(
            items, config,
        ))),
        Template::Scalar(value) if value.is_object() || value.is_array() => {
            wrap_with_config(Template::from(value), config)
        }
        Template::Scalar(value) => Ok(DynamicValue::Scalar(value)),
        Template::Deferred(_) => Err(FixtureError::invalid_template("object or array", "deferred")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> IndexMap<String, Template> {
        match Template::from(value) {
            Template::Object(map) => map,
            other => panic!("Expected object template, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_root_is_its_own_head() {
        let root = CompositeNode::wrap(object(json!({"a": 1})));
        let head = root.head().unwrap();
        assert_eq!(head.id(), root.id());
        assert_eq!(root.depth(), 0);
    }

    #[test]
    fn test_nested_nodes_share_head_and_track_depth() {
        let root = CompositeNode::wrap(object(json!({"b": {"c": [{"d": 1}]}})));
        let inner = root.pointer("/b/c/0").unwrap();
        let inner = inner.as_composite().unwrap();

        assert_eq!(inner.depth(), 3);
        assert_eq!(inner.head().unwrap().id(), root.id());
    }

    #[test]
    fn test_nested_container_cached_as_same_node() {
        let root = CompositeNode::wrap(object(json!({"sub": {"x": 1}})));
        assert!(!root.is_resolved("sub"));

        let first = root.get("sub").unwrap();
        let second = root.get("sub").unwrap();
        assert!(root.is_resolved("sub"));
        assert_eq!(first, second);
    }

    #[test]
    fn test_scalars_are_resolved_at_wrap_time() {
        let root = SequenceNode::wrap(vec![Template::from(1), Template::from("two")]);
        assert!(root.is_resolved(0));
        assert_eq!(root.get(1).unwrap(), "two");
    }

    #[test]
    fn test_position_mismatch() {
        let root = CompositeNode::wrap(object(json!({"a": [1]}))).as_node();
        let err = root.get(0usize).unwrap_err();
        assert!(matches!(err, FixtureError::PositionMismatch { node_kind: "composite", .. }));

        let seq = root.get("a").unwrap().as_node().unwrap();
        let err = seq.get("x").unwrap_err();
        assert!(matches!(err, FixtureError::PositionMismatch { node_kind: "sequence", .. }));
    }

    #[test]
    fn test_head_dropped() {
        let root = CompositeNode::wrap(object(json!({"sub": {"x": 1}})));
        let sub = root.get("sub").unwrap();
        drop(root);

        let sub = sub.as_composite().unwrap();
        assert!(matches!(sub.head(), Err(FixtureError::HeadDropped)));
        assert_eq!(sub.get("x").unwrap(), json!(1));
    }

    #[test]
    fn test_wrap_with_head() {
        let root = CompositeNode::wrap(object(json!({"name": "root"})));
        let extra = CompositeNode::wrap_with_head(
            object(json!({"name": Value::Null})),
            &root.as_node(),
        )
        .unwrap();

        assert_eq!(extra.head().unwrap().id(), root.id());
        assert_eq!(extra.depth(), 1);
    }

    #[test]
    fn test_max_depth() {
        let config = ResolverConfig::new().with_max_depth(1);
        let root = CompositeNode::wrap_with_config(object(json!({"a": {"b": {"c": 1}}})), config);

        let a = root.get("a").unwrap();
        let err = a.get("b").unwrap_err();
        assert!(matches!(err, FixtureError::MaxDepthExceeded { limit: 1 }));
        assert!(!a.as_composite().unwrap().is_resolved("b"));
    }

    #[test]
    fn test_max_depth_failure_leaves_slot_pending() {
        let config = ResolverConfig::new().with_max_depth(1);
        let root = CompositeNode::wrap_with_config(object(json!({"a": {"b": {"c": 1}}})), config);
        let a = root.get("a").unwrap();

        for _ in 0..2 {
            assert!(matches!(
                a.get("b").unwrap_err(),
                FixtureError::MaxDepthExceeded { limit: 1 }
            ));
        }
    }

    #[test]
    fn test_nested_containers_are_moved_not_copied() {
        let leaf = "x".repeat(1024);
        let leaf_ptr = leaf.as_ptr();
        let inner: IndexMap<String, Template> =
            [("leaf".to_string(), Template::Scalar(Value::String(leaf)))].into();
        let middle: IndexMap<String, Template> =
            [("inner".to_string(), Template::Object(inner))].into();
        let root = CompositeNode::wrap([("middle".to_string(), Template::Object(middle))].into());

        let node = root.pointer("/middle/inner").unwrap();
        let node = node.as_composite().unwrap();
        let raw = node.inner.raw.borrow();
        let Some(Slot::Resolved(DynamicValue::Scalar(Value::String(stored)))) = raw.get("leaf")
        else {
            panic!("Expected resolved string leaf");
        };
        assert_eq!(stored.as_ptr(), leaf_ptr);
    }

    #[test]
    fn test_wrap_dispatch() {
        assert!(matches!(wrap(json!({"a": 1})), Ok(DynamicValue::Composite(_))));
        assert!(matches!(wrap(json!([1])), Ok(DynamicValue::Sequence(_))));
        assert_eq!(wrap(json!(5)).unwrap(), json!(5));
        assert!(matches!(
            wrap(Template::deferred(|_| Ok(1))),
            Err(FixtureError::InvalidTemplate { .. })
        ));
    }

    #[test]
    fn test_debug_output() {
        let root = CompositeNode::wrap(object(json!({"a": 1, "b": 2})));
        assert_eq!(
            format!("{root:?}"),
            r#"CompositeNode { keys: ["a", "b"], depth: 0 }"#
        );
    }
}
