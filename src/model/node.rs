//! Typed node identities: users, items and properties.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use super::Value;

/// Which role a node plays in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    User,
    Item,
    Property,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::User => write!(f, "user"),
            NodeKind::Item => write!(f, "item"),
            NodeKind::Property => write!(f, "property"),
        }
    }
}

/// A node in the recommendation graph.
///
/// Identity is the pair `(kind, value)`: `Node::user("u1")` and
/// `Node::item("u1")` are two different nodes that can live in the same
/// graph. Comparing a node against a raw [`Value`] (or `str`) only looks at
/// the value, which is what lets callers query the graph with plain ids.
///
/// Ordering follows the wrapped value; the kind only breaks ties so that
/// `Ord` stays consistent with `Eq`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    kind: NodeKind,
    value: Value,
}

impl Node {
    /// Wrap `value` as a node of the given kind.
    ///
    /// Wrapping a `Value::Node` keeps only the inner value: the new kind wins.
    pub fn new(kind: NodeKind, value: impl Into<Value>) -> Self {
        let value = match value.into() {
            Value::Node(inner) => inner.value,
            other => other,
        };
        Self { kind, value }
    }

    pub fn user(value: impl Into<Value>) -> Self {
        Self::new(NodeKind::User, value)
    }

    pub fn item(value: impl Into<Value>) -> Self {
        Self::new(NodeKind::Item, value)
    }

    pub fn property(value: impl Into<Value>) -> Self {
        Self::new(NodeKind::Property, value)
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn is_user(&self) -> bool { self.kind == NodeKind::User }
    pub fn is_item(&self) -> bool { self.kind == NodeKind::Item }
    pub fn is_property(&self) -> bool { self.kind == NodeKind::Property }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value).then(self.kind.cmp(&other.kind))
    }
}

impl PartialEq<Value> for Node {
    fn eq(&self, other: &Value) -> bool {
        match other {
            Value::Node(n) => self == n.as_ref(),
            raw => &self.value == raw,
        }
    }
}

impl PartialEq<str> for Node {
    fn eq(&self, other: &str) -> bool {
        self.value.as_str() == Some(other)
    }
}

impl PartialEq<&str> for Node {
    fn eq(&self, other: &&str) -> bool {
        <Node as PartialEq<str>>::eq(self, other)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

// ============================================================================
// NodeRef: how callers name a node
// ============================================================================

/// A reference to a node in a query.
///
/// `Exact` names one `(kind, value)` node. `Raw` names a value and resolves
/// to the earliest-inserted node that carries it, whatever its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Exact(Node),
    Raw(Value),
}

impl NodeRef {
    pub fn value(&self) -> &Value {
        match self {
            NodeRef::Exact(n) => n.value(),
            NodeRef::Raw(v) => v,
        }
    }

    /// The node this reference names when interpreted as `kind`.
    ///
    /// An exact reference of another kind yields `None`.
    pub fn as_kind(&self, kind: NodeKind) -> Option<Node> {
        match self {
            NodeRef::Exact(n) if n.kind() == kind => Some(n.clone()),
            NodeRef::Exact(_) => None,
            NodeRef::Raw(v) => Some(Node::new(kind, v.clone())),
        }
    }
}

impl From<Node> for NodeRef { fn from(n: Node) -> Self { NodeRef::Exact(n) } }
impl From<&Node> for NodeRef { fn from(n: &Node) -> Self { NodeRef::Exact(n.clone()) } }
impl From<Value> for NodeRef {
    fn from(v: Value) -> Self {
        match v {
            Value::Node(n) => NodeRef::Exact(*n),
            raw => NodeRef::Raw(raw),
        }
    }
}
impl From<&Value> for NodeRef { fn from(v: &Value) -> Self { NodeRef::from(v.clone()) } }
impl From<&str> for NodeRef { fn from(v: &str) -> Self { NodeRef::Raw(Value::from(v)) } }
impl From<String> for NodeRef { fn from(v: String) -> Self { NodeRef::Raw(Value::from(v)) } }
impl From<&String> for NodeRef { fn from(v: &String) -> Self { NodeRef::Raw(Value::from(v)) } }
impl From<i64> for NodeRef { fn from(v: i64) -> Self { NodeRef::Raw(Value::Int(v)) } }
