//! Observation visitors: printing a stage's output and flattening a tree to a
//! `path, value` table.

use std::io::{self, Write};

use crate::context::{walk_mapping_in_context, walk_sequence_in_context, ContextVisitor, VisitPath};
use crate::error::Error;
use crate::node::{Node, Scalar};
use crate::visitor::Visitor;

/// Writes each visited tree in flow style, one line per [`Visitor::visit`] call, and
/// returns it unchanged.
#[derive(Debug)]
pub struct PrintVisitor<W = io::Stdout> {
    out: W,
}

impl PrintVisitor {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for PrintVisitor {
    fn default() -> Self {
        Self::stdout()
    }
}

impl<W: Write> PrintVisitor<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Visitor for PrintVisitor<W> {
    fn visit(&mut self, node: &Node) -> Result<Node, Error> {
        tracing::debug!(kind = %node.kind(), "{node}");
        writeln!(self.out, "{node}").map_err(|cause| Error::Io { path: None, cause })?;
        Ok(node.clone())
    }
}

/// Flattens a tree into lines of `<path>, <value>`.
///
/// ```rust
/// use saphyr_wire::PathTable;
///
/// let node = saphyr_wire::from_str("a:\n  b: [10, 20]\n").unwrap();
/// assert_eq!(PathTable::new().render(&node).unwrap(), "a.b[0], 10\na.b[1], 20\n");
/// ```
#[derive(Debug, Default)]
pub struct PathTable {
    path: VisitPath,
}

impl PathTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The table for the whole tree.
    pub fn render(&mut self, node: &Node) -> Result<String, Error> {
        match self.visit(node)? {
            Node::Scalar(Scalar::String(table)) => Ok(table),
            other => Ok(other.to_string()),
        }
    }
}

fn concat(parts: Vec<Node>) -> Node {
    let mut table = String::new();
    for part in &parts {
        if let Some(text) = part.as_str() {
            table.push_str(text);
        }
    }
    Node::from(table)
}

impl Visitor for PathTable {
    fn visit(&mut self, node: &Node) -> Result<Node, Error> {
        match node {
            Node::Sequence(items) => walk_sequence_in_context(self, items).map(concat),
            Node::Mapping(map) => walk_mapping_in_context(self, map)
                .map(|rows| concat(rows.into_values().collect())),
            leaf => Ok(Node::from(format!("{}, {leaf}\n", self.path))),
        }
    }
}

impl ContextVisitor for PathTable {
    fn visit_path(&self) -> &VisitPath {
        &self.path
    }

    fn visit_path_mut(&mut self) -> &mut VisitPath {
        &mut self.path
    }
}
