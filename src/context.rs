//! Path tracking for visitors that need to know where they are in the tree.
//!
//! A [`ContextVisitor`] owns a [`VisitPath`]. The helpers in this module push a segment
//! before descending into a child and pop it right after, whether the child succeeded
//! or not, so one visitor value can run any number of traversals back to back.

use std::fmt;

use smallvec::SmallVec;

use crate::error::Error;
use crate::node::{Mapping, Node};
use crate::visitor::Visitor;

/// One step from a container to a child.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Address of the node currently under traversal, rendered as `a.b[1]`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisitPath {
    segments: SmallVec<[PathSegment; 8]>,
}

impl VisitPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    pub fn pop(&mut self) -> Option<PathSegment> {
        self.segments.pop()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }
}

impl fmt::Display for VisitPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if idx == 0 => f.write_str(key)?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(i) => write!(f, "[{i}]")?,
            }
        }
        Ok(())
    }
}

/// A visitor that records the path of the node it is visiting.
///
/// Implementors store a [`VisitPath`] and route their container hooks through
/// [`walk_sequence_in_context`] and [`walk_mapping_in_context`] (or [`visit_child`]
/// for custom traversals).
pub trait ContextVisitor: Visitor {
    fn visit_path(&self) -> &VisitPath;

    fn visit_path_mut(&mut self) -> &mut VisitPath;

    /// The current path, `""` at the root.
    fn get_path(&self) -> String {
        self.visit_path().to_string()
    }
}

/// Visits `node` with `segment` pushed onto the path.
///
/// A failing child has the deepest path attached before the segment is popped.
pub fn visit_child<V: ContextVisitor + ?Sized>(
    visitor: &mut V,
    segment: PathSegment,
    node: &Node,
) -> Result<Node, Error> {
    visitor.visit_path_mut().push(segment);
    let result = visitor
        .visit(node)
        .map_err(|err| err.with_path(visitor.visit_path()));
    visitor.visit_path_mut().pop();
    result
}

pub fn walk_sequence_in_context<V: ContextVisitor + ?Sized>(
    visitor: &mut V,
    items: &[Node],
) -> Result<Vec<Node>, Error> {
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| visit_child(visitor, PathSegment::Index(idx), item))
        .collect()
}

pub fn walk_mapping_in_context<V: ContextVisitor + ?Sized>(
    visitor: &mut V,
    map: &Mapping,
) -> Result<Mapping, Error> {
    let mut out = Mapping::with_capacity(map.len());
    for (key, value) in map {
        let visited = visit_child(visitor, PathSegment::Key(key.clone()), value)?;
        out.insert(key.clone(), visited);
    }
    Ok(out)
}

/// Path-tracking identity transform that reports every leaf to a callback.
pub struct Tracked<F> {
    path: VisitPath,
    on_scalar: F,
}

impl<F> Tracked<F>
where
    F: FnMut(&VisitPath, &Node) -> Result<(), Error>,
{
    /// `on_scalar` observes every scalar and object together with its path.
    pub fn new(on_scalar: F) -> Self {
        Self {
            path: VisitPath::new(),
            on_scalar,
        }
    }
}

impl<F> Visitor for Tracked<F>
where
    F: FnMut(&VisitPath, &Node) -> Result<(), Error>,
{
    fn visit(&mut self, node: &Node) -> Result<Node, Error> {
        match node {
            Node::Sequence(items) => walk_sequence_in_context(self, items).map(Node::Sequence),
            Node::Mapping(map) => walk_mapping_in_context(self, map).map(Node::Mapping),
            leaf => {
                (self.on_scalar)(&self.path, leaf)?;
                Ok(leaf.clone())
            }
        }
    }
}

impl<F> ContextVisitor for Tracked<F>
where
    F: FnMut(&VisitPath, &Node) -> Result<(), Error>,
{
    fn visit_path(&self) -> &VisitPath {
        &self.path
    }

    fn visit_path_mut(&mut self) -> &mut VisitPath {
        &mut self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_keys_and_indices() {
        let mut path = VisitPath::new();
        path.push(PathSegment::Key("a".into()));
        path.push(PathSegment::Key("b".into()));
        path.push(PathSegment::Index(1));
        assert_eq!(path.to_string(), "a.b[1]");
    }

    #[test]
    fn leading_index_has_no_dot() {
        let mut path = VisitPath::new();
        path.push(PathSegment::Index(0));
        path.push(PathSegment::Key("name".into()));
        assert_eq!(path.to_string(), "[0].name");
    }

    #[test]
    fn path_is_empty_again_after_a_failed_walk() {
        let input: Node = [("a", Node::Sequence(vec![Node::from(1), Node::from("bad")]))]
            .into_iter()
            .collect();
        let mut seen = Vec::new();
        let mut visitor = Tracked::new(|path: &VisitPath, node: &Node| {
            seen.push(path.to_string());
            if node.as_str() == Some("bad") {
                return Err(Error::construction_msg("bad leaf"));
            }
            Ok(())
        });
        let err = visitor.visit(&input).unwrap_err();
        assert_eq!(err.path(), Some("a[1]"));
        assert!(visitor.visit_path().is_empty());

        visitor.visit(&Node::from(3)).unwrap();
        drop(visitor);
        assert_eq!(seen, ["a[0]", "a[1]", ""]);
    }
}
