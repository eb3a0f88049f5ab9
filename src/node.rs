//! Tree node model shared by every visitor.
//!
//! A parsed document is a tree of [`Node`]s. Scalars, sequences and mappings come from
//! the YAML source; [`Node::Object`] only appears after a construction stage replaced a
//! `class` mapping with a live value. Objects classify as scalars, so visitors that are
//! not interested in them simply pass them through.

use std::fmt;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::factory::{Built, Factory, Instance};

/// Keyed children of a mapping node. Iteration follows document order, equality does not.
pub type Mapping = IndexMap<String, Node>;

/// A leaf value.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// One element of a configuration tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Scalar(Scalar),
    Sequence(Vec<Node>),
    Mapping(Mapping),
    /// A constructed instance or a deferred factory.
    Object(Built),
}

/// Result of [`Node::kind`]. Objects are reported as [`NodeKind::Scalar`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Scalar,
    Sequence,
    Mapping,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeKind::Scalar => "scalar",
            NodeKind::Sequence => "sequence",
            NodeKind::Mapping => "mapping",
        })
    }
}

impl Scalar {
    /// Falsy values are null, `false`, zero, NaN and the empty string.
    pub fn is_truthy(&self) -> bool {
        match self {
            Scalar::Null => false,
            Scalar::Bool(b) => *b,
            Scalar::Int(i) => *i != 0,
            Scalar::Float(x) => *x != 0.0 && !x.is_nan(),
            Scalar::String(s) => !s.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(x) if x.is_nan() => f.write_str(".nan"),
            Scalar::Float(x) if x.is_infinite() => {
                f.write_str(if *x > 0.0 { ".inf" } else { "-.inf" })
            }
            Scalar::Float(x) => write!(f, "{x:?}"),
            Scalar::String(s) => f.write_str(s),
        }
    }
}

impl Node {
    pub const NULL: Node = Node::Scalar(Scalar::Null);

    /// The single classification point used for dispatch and diagnostics.
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Scalar(_) | Node::Object(_) => NodeKind::Scalar,
            Node::Sequence(_) => NodeKind::Sequence,
            Node::Mapping(_) => NodeKind::Mapping,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Scalar(Scalar::Null))
    }

    /// Truthiness used for the `builder` and `class` markers. Empty containers are falsy,
    /// objects are always truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Node::Scalar(s) => s.is_truthy(),
            Node::Sequence(items) => !items.is_empty(),
            Node::Mapping(map) => !map.is_empty(),
            Node::Object(_) => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(s) => s.as_str(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Node::Scalar(Scalar::Int(i)) => Some(*i),
            _ => None,
        }
    }

    /// Integers widen to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Node::Scalar(Scalar::Float(x)) => Some(*x),
            Node::Scalar(Scalar::Int(i)) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Node]> {
        match self {
            Node::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            Node::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up `key` when this node is a mapping.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Node::Object(Built::Instance(instance)) => Some(instance),
            _ => None,
        }
    }

    pub fn as_factory(&self) -> Option<&Factory> {
        match self {
            Node::Object(Built::Factory(factory)) => Some(factory),
            _ => None,
        }
    }

    pub fn as_factory_mut(&mut self) -> Option<&mut Factory> {
        match self {
            Node::Object(Built::Factory(factory)) => Some(factory),
            _ => None,
        }
    }

    /// Borrows the constructed value when this node is an instance of `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.as_instance().and_then(Instance::downcast_ref)
    }

    /// Number of nodes in this subtree, the node itself included.
    pub fn node_count(&self) -> usize {
        match self {
            Node::Scalar(_) | Node::Object(_) => 1,
            Node::Sequence(items) => 1 + items.iter().map(Node::node_count).sum::<usize>(),
            Node::Mapping(map) => 1 + map.values().map(Node::node_count).sum::<usize>(),
        }
    }
}

impl fmt::Display for Node {
    /// Flow-style rendering: `{a: [1, 2], b: ok}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Scalar(s) => write!(f, "{s}"),
            Node::Sequence(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Node::Mapping(map) => {
                f.write_str("{")?;
                for (idx, (key, value)) in map.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Node::Object(built) => write!(f, "{built}"),
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Scalar(Scalar::Null) => serializer.serialize_unit(),
            Node::Scalar(Scalar::Bool(b)) => serializer.serialize_bool(*b),
            Node::Scalar(Scalar::Int(i)) => serializer.serialize_i64(*i),
            Node::Scalar(Scalar::Float(x)) => serializer.serialize_f64(*x),
            Node::Scalar(Scalar::String(s)) => serializer.serialize_str(s),
            Node::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Node::Mapping(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
            // Live objects have no data form; they serialize as their display text.
            Node::Object(built) => serializer.collect_str(built),
        }
    }
}

impl From<Scalar> for Node {
    fn from(value: Scalar) -> Self {
        Node::Scalar(value)
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::Scalar(Scalar::String(value.to_owned()))
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::Scalar(Scalar::String(value))
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Node::Scalar(Scalar::Bool(value))
    }
}

impl From<i64> for Node {
    fn from(value: i64) -> Self {
        Node::Scalar(Scalar::Int(value))
    }
}

impl From<i32> for Node {
    fn from(value: i32) -> Self {
        Node::Scalar(Scalar::Int(value.into()))
    }
}

impl From<f64> for Node {
    fn from(value: f64) -> Self {
        Node::Scalar(Scalar::Float(value))
    }
}

impl From<Vec<Node>> for Node {
    fn from(value: Vec<Node>) -> Self {
        Node::Sequence(value)
    }
}

impl From<Mapping> for Node {
    fn from(value: Mapping) -> Self {
        Node::Mapping(value)
    }
}

impl From<Built> for Node {
    fn from(value: Built) -> Self {
        Node::Object(value)
    }
}

impl From<Instance> for Node {
    fn from(value: Instance) -> Self {
        Node::Object(Built::Instance(value))
    }
}

impl From<Factory> for Node {
    fn from(value: Factory) -> Self {
        Node::Object(Built::Factory(value))
    }
}

impl<K: Into<String>, V: Into<Node>> FromIterator<(K, V)> for Node {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Node::Mapping(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
