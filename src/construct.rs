//! Turns `class` mappings into live objects.
//!
//! A mapping is a construction spec when its `class` entry is truthy:
//!
//! ```yaml
//! encoder:
//!   class: models.Encoder
//!   args:
//!     layers: 4
//!     activation: {class: layers.Relu}
//!   builder: false
//! ```
//!
//! `args` is resolved first, so nested specs are built bottom-up. The spec is then
//! replaced with the constructed [`Instance`](crate::Instance), or with the
//! [`Factory`] itself when `builder` is truthy. A generator class is replaced with the
//! sequence of items it yields. Keys other than `class`, `args` and
//! `builder` are ignored.

use crate::context::{
    visit_child, walk_mapping_in_context, walk_sequence_in_context, ContextVisitor, PathSegment,
    VisitPath,
};
use crate::error::Error;
use crate::factory::{Args, Built, Factory, Registry};
use crate::node::{Mapping, Node};
use crate::visitor::Visitor;

pub const CLASS_KEY: &str = "class";
pub const ARGS_KEY: &str = "args";
pub const BUILDER_KEY: &str = "builder";

/// The marker entries of a construction spec, borrowed from its mapping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstructionSpec<'n> {
    pub class: &'n str,
    pub args: Option<&'n Node>,
    pub builder: bool,
}

impl<'n> ConstructionSpec<'n> {
    /// `Ok(None)` when the mapping carries no truthy `class`. A truthy `class` that is
    /// not a string cannot name anything and is a resolution error.
    pub fn parse(map: &'n Mapping) -> Result<Option<Self>, Error> {
        let Some(class) = map.get(CLASS_KEY).filter(|class| class.is_truthy()) else {
            return Ok(None);
        };
        let class = class
            .as_str()
            .ok_or_else(|| Error::resolution(&class.to_string()))?;
        Ok(Some(Self {
            class,
            args: map.get(ARGS_KEY),
            builder: map.get(BUILDER_KEY).is_some_and(Node::is_truthy),
        }))
    }
}

/// Replaces every construction spec in a tree with what it builds.
#[derive(Debug)]
pub struct ConstructVisitor<'r> {
    registry: &'r Registry,
    path: VisitPath,
}

impl<'r> ConstructVisitor<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            path: VisitPath::new(),
        }
    }

    fn construct(&mut self, spec: ConstructionSpec<'_>) -> Result<Node, Error> {
        let args = match spec.args {
            Some(args) => Some(visit_child(self, PathSegment::Key(ARGS_KEY.into()), args)?),
            None => None,
        };
        let factory = Factory::new(self.registry, spec.class, Args::from_node(args))?;
        tracing::debug!(
            class = spec.class,
            path = %self.path,
            builder = spec.builder,
            "construction spec"
        );
        if spec.builder {
            Ok(Node::Object(Built::Factory(factory)))
        } else {
            factory.produce()
        }
    }
}

impl Visitor for ConstructVisitor<'_> {
    fn visit_sequence(&mut self, items: &[Node]) -> Result<Node, Error> {
        walk_sequence_in_context(self, items).map(Node::Sequence)
    }

    fn visit_mapping(&mut self, map: &Mapping) -> Result<Node, Error> {
        let result = match ConstructionSpec::parse(map) {
            Ok(Some(spec)) => self.construct(spec),
            Ok(None) => walk_mapping_in_context(self, map).map(Node::Mapping),
            Err(err) => Err(err),
        };
        result.map_err(|err| err.with_path(&self.path))
    }
}

impl ContextVisitor for ConstructVisitor<'_> {
    fn visit_path(&self) -> &VisitPath {
        &self.path
    }

    fn visit_path_mut(&mut self) -> &mut VisitPath {
        &mut self.path
    }
}

/// Builds every construction spec in `node` with `registry`.
pub fn construct(registry: &Registry, node: &Node) -> Result<Node, Error> {
    ConstructVisitor::new(registry).visit(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(node: Node) -> Mapping {
        match node {
            Node::Mapping(map) => map,
            other => panic!("not a mapping: {other}"),
        }
    }

    #[test]
    fn falsy_class_is_plain_data() {
        let map = mapping([("class", ""), ("args", "x")].into_iter().collect());
        assert_eq!(ConstructionSpec::parse(&map).unwrap(), None);
    }

    #[test]
    fn spec_markers_are_read() {
        let map = mapping(
            [
                ("class", Node::from("pkg.Point")),
                ("args", Node::Sequence(vec![Node::from(1)])),
                ("builder", Node::from(true)),
                ("comment", Node::from("ignored")),
            ]
            .into_iter()
            .collect(),
        );
        let spec = ConstructionSpec::parse(&map).unwrap().unwrap();
        assert_eq!(spec.class, "pkg.Point");
        assert!(spec.builder);
        assert_eq!(spec.args.and_then(Node::as_sequence).map(<[Node]>::len), Some(1));
    }

    #[test]
    fn non_string_class_is_a_resolution_error() {
        let map = mapping([("class", 7)].into_iter().collect());
        let err = ConstructionSpec::parse(&map).unwrap_err();
        assert!(matches!(err, Error::Resolution { ref class, .. } if class == "7"));
    }

    #[test]
    fn unknown_class_reports_its_path() {
        let registry = Registry::new();
        let input: Node = [(
            "model",
            Node::Sequence(vec![[("class", "nowhere.Thing")].into_iter().collect()]),
        )]
        .into_iter()
        .collect();
        let err = construct(&registry, &input).unwrap_err();
        assert_eq!(err.path(), Some("model[0]"));
        assert_eq!(
            err.to_string(),
            "cannot resolve class `nowhere.Thing` at `model[0]`"
        );
    }
}
