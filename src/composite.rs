use crate::error::Error;
use crate::node::Node;
use crate::visitor::Visitor;

/// Runs visitors one after another, feeding each the whole output of the previous one.
///
/// ```rust
/// use saphyr_wire::{Composite, Identity, Node, Visitor};
///
/// let mut pipeline = Composite::new().then(Identity).then(Identity);
/// assert_eq!(pipeline.visit(&Node::from(1)).unwrap(), Node::from(1));
/// ```
#[derive(Default)]
pub struct Composite<'a> {
    stages: Vec<Box<dyn Visitor + 'a>>,
}

impl<'a> Composite<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage and returns the pipeline.
    pub fn then<V: Visitor + 'a>(mut self, stage: V) -> Self {
        self.push(stage);
        self
    }

    pub fn push<V: Visitor + 'a>(&mut self, stage: V) {
        self.stages.push(Box::new(stage));
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl Visitor for Composite<'_> {
    fn visit(&mut self, node: &Node) -> Result<Node, Error> {
        let Some((first, rest)) = self.stages.split_first_mut() else {
            return Ok(node.clone());
        };
        tracing::trace!(stage = 0, "composite stage");
        let mut current = first.visit(node)?;
        for (idx, stage) in rest.iter_mut().enumerate() {
            tracing::trace!(stage = idx + 1, "composite stage");
            current = stage.visit(&current)?;
        }
        Ok(current)
    }
}

impl std::fmt::Debug for Composite<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composite")
            .field("stages", &self.stages.len())
            .finish()
    }
}
