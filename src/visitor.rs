//! The visitor contract every tree transform implements.
//!
//! [`Visitor::visit`] dispatches on [`Node`] shape. Every hook receives borrowed input
//! and produces a fresh node, so a transform can never mutate the tree it reads. The
//! defaults rebuild containers from their visited children and clone leaves, which makes
//! an implementation that overrides nothing an identity transform.
//!
//! Overriding hooks can fall back to the default traversal with [`walk_sequence`] and
//! [`walk_mapping`].

use crate::error::Error;
use crate::factory::Built;
use crate::node::{Mapping, Node, Scalar};

pub trait Visitor {
    /// Entry point. Dispatches to the hook for the node's shape.
    fn visit(&mut self, node: &Node) -> Result<Node, Error> {
        match node {
            Node::Scalar(scalar) => self.visit_scalar(scalar),
            Node::Sequence(items) => self.visit_sequence(items),
            Node::Mapping(map) => self.visit_mapping(map),
            Node::Object(built) => self.visit_object(built),
        }
    }

    fn visit_scalar(&mut self, scalar: &Scalar) -> Result<Node, Error> {
        Ok(Node::Scalar(scalar.clone()))
    }

    fn visit_sequence(&mut self, items: &[Node]) -> Result<Node, Error> {
        walk_sequence(self, items)
    }

    fn visit_mapping(&mut self, map: &Mapping) -> Result<Node, Error> {
        walk_mapping(self, map)
    }

    /// Constructed values produced by an earlier stage pass through unchanged.
    fn visit_object(&mut self, built: &Built) -> Result<Node, Error> {
        Ok(Node::Object(built.clone()))
    }
}

/// Visits every item in order and collects the results into a new sequence.
pub fn walk_sequence<V: Visitor + ?Sized>(visitor: &mut V, items: &[Node]) -> Result<Node, Error> {
    items
        .iter()
        .map(|item| visitor.visit(item))
        .collect::<Result<Vec<_>, _>>()
        .map(Node::Sequence)
}

/// Visits every value in document order; keys are kept as they are.
pub fn walk_mapping<V: Visitor + ?Sized>(visitor: &mut V, map: &Mapping) -> Result<Node, Error> {
    let mut out = Mapping::with_capacity(map.len());
    for (key, value) in map {
        out.insert(key.clone(), visitor.visit(value)?);
    }
    Ok(Node::Mapping(out))
}

/// The transform that overrides nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl Visitor for Identity {}

impl<V: Visitor + ?Sized> Visitor for Box<V> {
    fn visit(&mut self, node: &Node) -> Result<Node, Error> {
        (**self).visit(node)
    }
}

impl<V: Visitor + ?Sized> Visitor for &mut V {
    fn visit(&mut self, node: &Node) -> Result<Node, Error> {
        (**self).visit(node)
    }
}
